//! fleetsync CLI
//!
//! Command-line interface for the fleetsync reconciliation tool: syncs
//! fleet telemetry odometer readings and terminal zone assignments into
//! the asset directory.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod config;

use config::{AppConfig, MOTIVE_KEY_VAR, PRODUCTION_KEY_VAR, SANDBOX_KEY_VAR};
use fleetsync_connectors::{
    AccelixConfig, AccelixDirectory, AssetDirectory, MotiveConfig, MotiveTelemetry,
    TelemetrySource,
};
use fleetsync_core::{
    Matcher, ReconciliationEngine, ReconcileSummary, ShortCodeMatcher, ZoneClassifier,
    ZoneSummary,
};
use fleetsync_observability::{init_logging_with_config, LoggingConfig};
use tracing::Level;

#[derive(Parser)]
#[command(name = "fleetsync")]
#[command(version)]
#[command(about = "Reconciles fleet telemetry against the asset directory", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync odometer readings into asset meters
    Odometers,

    /// Assign each asset to its nearest terminal zone
    Zones,

    /// Run both sync passes, odometers first
    Run,

    /// Show the effective configuration and credential status
    Config,
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path),
        None => Ok(AppConfig::default()),
    }
}

fn build_directory(config: &AppConfig) -> Result<AccelixDirectory> {
    let connector = config.directory_connector()?;
    AccelixDirectory::new(AccelixConfig::new(connector, config.directory.site.clone()))
        .context("Failed to initialize directory connector")
}

fn build_telemetry(config: &AppConfig) -> Result<MotiveTelemetry> {
    let connector = config.telemetry_connector()?;
    MotiveTelemetry::new(MotiveConfig::new(connector))
        .context("Failed to initialize telemetry connector")
}

/// Runs the odometer reconciliation pass.
///
/// Either initial listing fetch failing is fatal for the run; everything
/// after that is per-asset log-and-continue.
async fn run_odometers(config: &AppConfig) -> Result<ReconcileSummary> {
    let telemetry = build_telemetry(config)?;
    let directory = build_directory(config)?;

    let positions = telemetry
        .fetch_positions()
        .await
        .context("Telemetry listing fetch failed")?;
    let assets = directory
        .list_assets(&config.asset_type)
        .await
        .context("Asset listing fetch failed")?;

    let pairs = ShortCodeMatcher.pair(&positions, &assets);
    let engine = ReconciliationEngine::new(&directory);
    Ok(engine.run(&pairs).await)
}

/// Runs the terminal zone assignment pass.
async fn run_zones(config: &AppConfig) -> Result<ZoneSummary> {
    let directory = build_directory(config)?;

    let assets = directory
        .list_assets(&config.asset_type)
        .await
        .context("Asset listing fetch failed")?;

    let classifier = ZoneClassifier::new(&directory);
    Ok(classifier.run(&assets).await)
}

fn print_reconcile_summary(summary: &ReconcileSummary) {
    println!("{}", "Odometer sync".bold());
    println!("  matched:          {}", summary.matched);
    println!("  skipped:          {}", summary.skipped);
    println!("  readings added:   {}", summary.readings_appended);
    println!("  meters created:   {}", summary.meters_created);
    if summary.is_clean() {
        println!("  {}", "clean run".green());
    } else {
        println!(
            "  {}",
            format!(
                "{} fetch error(s), {} write error(s)",
                summary.fetch_errors, summary.write_errors
            )
            .yellow()
        );
    }
}

fn print_zone_summary(summary: &ZoneSummary) {
    println!("{}", "Terminal zone sync".bold());
    println!("  assigned:      {}", summary.assigned);
    println!("  unclassified:  {}", summary.unclassified);
    if summary.is_clean() {
        println!("  {}", "clean run".green());
    } else {
        println!(
            "  {}",
            format!("{} write error(s)", summary.write_errors).yellow()
        );
    }
}

fn print_config(config: &AppConfig) -> Result<()> {
    print!("{}", serde_yaml::to_string(config)?);

    println!("{}", "credentials".bold());
    for var in [SANDBOX_KEY_VAR, PRODUCTION_KEY_VAR, MOTIVE_KEY_VAR] {
        let status = if std::env::var(var).is_ok() {
            "set".green()
        } else {
            "missing".red()
        };
        println!("  {}: {}", var, status);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref())?;

    let mut logging = if config.logging.json {
        LoggingConfig::production()
    } else {
        LoggingConfig::default()
    };
    if cli.verbose {
        logging.level = Level::DEBUG;
    } else if let Ok(level) = config.logging.level.parse() {
        logging.level = level;
    }
    init_logging_with_config(logging);

    match cli.command {
        Commands::Odometers => {
            let summary = run_odometers(&config).await?;
            print_reconcile_summary(&summary);
        }
        Commands::Zones => {
            let summary = run_zones(&config).await?;
            print_zone_summary(&summary);
        }
        Commands::Run => {
            let summary = run_odometers(&config).await?;
            print_reconcile_summary(&summary);
            let summary = run_zones(&config).await?;
            print_zone_summary(&summary);
        }
        Commands::Config => {
            print_config(&config)?;
        }
    }

    Ok(())
}
