//! Structured logging setup.
//!
//! Console output is advisory only, never machine-parsed; the per-asset
//! status lines the run loops emit all flow through here.

use tracing::Level;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level.
    pub level: Level,
    /// Whether to use JSON format.
    pub json_format: bool,
    /// Whether to include target (module path).
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            include_target: false,
        }
    }
}

impl LoggingConfig {
    /// Verbose configuration for development runs.
    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            json_format: false,
            include_target: true,
        }
    }

    /// JSON output for scheduled production runs.
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            json_format: true,
            include_target: true,
        }
    }
}

/// Initializes the logging system with default configuration.
pub fn init_logging() {
    init_logging_with_config(LoggingConfig::default());
}

/// Initializes the logging system with the given configuration.
///
/// `RUST_LOG` takes precedence over the configured level when set.
pub fn init_logging_with_config(config: LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "fleetsync_core={},fleetsync_connectors={},fleetsync_cli={}",
            config.level, config.level, config.level
        ))
    });

    if config.json_format {
        let fmt_layer = fmt::layer().json().with_target(config.include_target);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    } else {
        let fmt_layer = fmt::layer().with_target(config.include_target);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(!config.json_format);
    }

    #[test]
    fn test_production_config_uses_json() {
        let config = LoggingConfig::production();
        assert!(config.json_format);
    }

    #[test]
    fn test_development_config_is_verbose() {
        let config = LoggingConfig::development();
        assert_eq!(config.level, Level::DEBUG);
    }
}
