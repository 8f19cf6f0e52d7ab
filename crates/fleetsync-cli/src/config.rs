//! Configuration loading for the fleetsync CLI.
//!
//! Non-secret settings live in a YAML file; credentials come exclusively
//! from the environment (`SANDBOX_KEY`, `PRODUCTION_KEY`, `MOTIVE_KEY`).
//! The environment toggle selects both the directory credential and the
//! tenant hostname, so a sandbox run can never write to production.

use anyhow::{Context, Result};
use fleetsync_connectors::{AuthConfig, ConnectorConfig, SecureString};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Environment variable holding the sandbox directory token.
pub const SANDBOX_KEY_VAR: &str = "SANDBOX_KEY";
/// Environment variable holding the production directory token.
pub const PRODUCTION_KEY_VAR: &str = "PRODUCTION_KEY";
/// Environment variable holding the telemetry API key.
pub const MOTIVE_KEY_VAR: &str = "MOTIVE_KEY";

/// Which deployment of the asset directory to target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Sandbox,
    Production,
}

impl Environment {
    fn credential_var(self) -> &'static str {
        match self {
            Environment::Sandbox => SANDBOX_KEY_VAR,
            Environment::Production => PRODUCTION_KEY_VAR,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Target environment for the asset directory.
    #[serde(default = "default_environment")]
    pub environment: Environment,

    /// Asset directory settings.
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Telemetry provider settings.
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Asset type filter for listing fetches (e.g., "Freightliner").
    #[serde(default = "default_asset_type")]
    pub asset_type: String,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,
}

fn default_environment() -> Environment {
    Environment::Sandbox
}

fn default_asset_type() -> String {
    "Freightliner".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            directory: DirectoryConfig::default(),
            telemetry: TelemetryConfig::default(),
            asset_type: default_asset_type(),
            logging: LoggingSection::default(),
        }
    }
}

/// Asset directory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Tenant hostname for sandbox runs.
    #[serde(default = "default_sandbox_tenant")]
    pub sandbox_tenant: String,

    /// Tenant hostname for production runs.
    #[serde(default = "default_production_tenant")]
    pub production_tenant: String,

    /// Site identifier within the tenant.
    #[serde(default = "default_site")]
    pub site: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_sandbox_tenant() -> String {
    "torcroboticssb.us.accelix.com".to_string()
}

fn default_production_tenant() -> String {
    "torcrobotics.us.accelix.com".to_string()
}

fn default_site() -> String {
    "def".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            sandbox_tenant: default_sandbox_tenant(),
            production_tenant: default_production_tenant(),
            site: default_site(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Telemetry provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Base URL of the telemetry API.
    #[serde(default = "default_telemetry_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_telemetry_url() -> String {
    "https://api.gomotive.com".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            base_url: default_telemetry_url(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// The tenant hostname for the configured environment.
    pub fn tenant(&self) -> &str {
        match self.environment {
            Environment::Sandbox => &self.directory.sandbox_tenant,
            Environment::Production => &self.directory.production_tenant,
        }
    }

    /// Builds the directory connector config, pulling the credential for
    /// the configured environment from the environment.
    pub fn directory_connector(&self) -> Result<ConnectorConfig> {
        let var = self.environment.credential_var();
        let token = std::env::var(var)
            .with_context(|| format!("Missing directory credential: set {}", var))?;

        Ok(ConnectorConfig {
            name: "accelix".to_string(),
            base_url: format!("https://{}", self.tenant()),
            auth: AuthConfig::Cookie {
                value: SecureString::new(token),
            },
            timeout_secs: self.directory.timeout_secs,
            headers: HashMap::new(),
        })
    }

    /// Builds the telemetry connector config from `MOTIVE_KEY`.
    pub fn telemetry_connector(&self) -> Result<ConnectorConfig> {
        let key = std::env::var(MOTIVE_KEY_VAR)
            .with_context(|| format!("Missing telemetry API key: set {}", MOTIVE_KEY_VAR))?;

        Ok(ConnectorConfig {
            name: "motive".to_string(),
            base_url: self.telemetry.base_url.clone(),
            auth: AuthConfig::ApiKey {
                key: SecureString::new(key),
                header_name: "X-Api-Key".to_string(),
            },
            timeout_secs: self.telemetry.timeout_secs,
            headers: HashMap::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_targets_sandbox() {
        let config = AppConfig::default();
        assert_eq!(config.environment, Environment::Sandbox);
        assert_eq!(config.tenant(), "torcroboticssb.us.accelix.com");
        assert_eq!(config.asset_type, "Freightliner");
    }

    #[test]
    fn test_environment_selects_tenant() {
        let mut config = AppConfig::default();
        config.environment = Environment::Production;
        assert_eq!(config.tenant(), "torcrobotics.us.accelix.com");
    }

    #[test]
    fn test_load_partial_yaml_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleetsync.yaml");
        std::fs::write(&path, "environment: production\nasset_type: Trailer\n").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.asset_type, "Trailer");
        assert_eq!(config.directory.site, "def");
        assert_eq!(config.telemetry.base_url, "https://api.gomotive.com");
    }

    #[test]
    fn test_load_missing_file_errors() {
        assert!(AppConfig::load(Path::new("/nonexistent/fleetsync.yaml")).is_err());
    }

    #[test]
    fn test_environment_serde_names() {
        let env: Environment = serde_yaml::from_str("sandbox").unwrap();
        assert_eq!(env, Environment::Sandbox);
        let env: Environment = serde_yaml::from_str("production").unwrap();
        assert_eq!(env, Environment::Production);
    }
}
