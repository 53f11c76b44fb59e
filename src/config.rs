use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::routing::{AssigneeRouter, MirrorRule};
use crate::store::google::SpreadsheetRef;
use crate::store::WorksheetSelector;
use crate::validation::InputValidator;

/// Environment variable naming the service-account key file
pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";
/// Environment variable naming the listen port
pub const PORT_ENV: &str = "PORT";

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP listener
    pub server: ServerConfig,
    /// Spreadsheet access
    pub sheets: SheetsConfig,
    /// Assignee worksheet copies
    pub routing: RoutingConfig,
    /// Log output
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
}

/// Spreadsheet settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    /// Service-account JSON key
    pub credentials_path: PathBuf,
    /// Spreadsheet title, looked up through Drive
    pub spreadsheet_name: String,
    /// Spreadsheet id; skips the title lookup when set
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    /// Primary worksheet title; the first worksheet when unset
    #[serde(default)]
    pub primary_worksheet: Option<String>,
    /// Per-request timeout for Google APIs
    pub request_timeout_secs: u64,
}

/// Assignee routing settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Ordered rules; the first matching one wins
    #[serde(default)]
    pub mirrors: Vec<MirrorRule>,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    /// Optional daily-rolling JSON log file
    #[serde(default)]
    pub file_path: Option<PathBuf>,
    /// "json" or "text"
    pub format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            sheets: SheetsConfig {
                credentials_path: PathBuf::from("creds.json"),
                spreadsheet_name: "Incorp Genius – Lead Qualification & Conversion Tracker".to_string(),
                spreadsheet_id: None,
                primary_worksheet: None,
                request_timeout_secs: 30,
            },
            routing: RoutingConfig {
                mirrors: vec![MirrorRule::new("Dattu", "Dattu's leads")],
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    ///
    /// Defaults, then `config/default.*`, `config/local.*`, the explicit
    /// `path` if given, `LEAD_INTAKE__SECTION__KEY` variables, and finally
    /// the `GOOGLE_APPLICATION_CREDENTIALS` and `PORT` variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&Self::default()).context("Failed to serialize default configuration")?)
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("LEAD_INTAKE")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        let mut app_config: Self = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {}", e))?;

        app_config.apply_overrides(|key| std::env::var(key).ok())?;

        // Validate configuration
        app_config.validate()?;

        Ok(app_config)
    }

    /// Apply the deployment-level variables that predate the prefixed ones
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(path) = lookup(CREDENTIALS_ENV).filter(|p| !p.trim().is_empty()) {
            self.sheets.credentials_path = PathBuf::from(path);
        }

        if let Some(port) = lookup(PORT_ENV) {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("{PORT_ENV} is not a valid port: {port}"))?;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("server.port must be greater than 0"));
        }

        if self.sheets.spreadsheet_id.is_none() && self.sheets.spreadsheet_name.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "sheets.spreadsheet_name is required when sheets.spreadsheet_id is not set"
            ));
        }
        if self.sheets.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("sheets.request_timeout_secs must be greater than 0"));
        }
        if let Some(title) = &self.sheets.primary_worksheet {
            InputValidator::validate_worksheet_title(title).context("sheets.primary_worksheet")?;
        }

        let mut seen = HashSet::new();
        for rule in &self.routing.mirrors {
            InputValidator::validate_assignee(&rule.assignee).context("routing.mirrors")?;
            InputValidator::validate_worksheet_title(&rule.worksheet).context("routing.mirrors")?;
            if !seen.insert(rule.assignee.trim().to_lowercase()) {
                return Err(anyhow::anyhow!("Duplicate mirror rule for assignee: {}", rule.assignee));
            }
        }

        InputValidator::validate_log_level(&self.logging.level)?;

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            ));
        }

        Ok(())
    }

    /// Listen address as "host:port"
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// How the Google store finds the spreadsheet
    #[must_use]
    pub fn spreadsheet_ref(&self) -> SpreadsheetRef {
        self.sheets.spreadsheet_id.as_ref().map_or_else(
            || SpreadsheetRef::Name(self.sheets.spreadsheet_name.clone()),
            |id| SpreadsheetRef::Id(id.clone()),
        )
    }

    /// Selector for the primary worksheet
    #[must_use]
    pub fn primary_selector(&self) -> WorksheetSelector {
        WorksheetSelector::from_title(self.sheets.primary_worksheet.as_deref())
    }

    /// Router built from the configured mirror rules
    #[must_use]
    pub fn router(&self) -> AssigneeRouter {
        AssigneeRouter::new(self.routing.mirrors.clone())
    }

    /// Google API request timeout
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.sheets.request_timeout_secs)
    }

    /// True when console logs should be JSON
    #[must_use]
    pub fn json_logs(&self) -> bool {
        self.logging.format == "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.sheets.credentials_path, PathBuf::from("creds.json"));
        assert_eq!(config.routing.mirrors.len(), 1);
        assert!(matches!(config.spreadsheet_ref(), SpreadsheetRef::Name(_)));
        assert_eq!(config.primary_selector(), WorksheetSelector::First);
    }

    #[test]
    fn test_config_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.sheets.request_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.routing.mirrors.push(MirrorRule::new("dattu", "Other"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(|key| match key {
                "GOOGLE_APPLICATION_CREDENTIALS" => Some("/secrets/sa.json".to_string()),
                "PORT" => Some("8080".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.sheets.credentials_path, PathBuf::from("/secrets/sa.json"));
        assert_eq!(config.bind_address(), "0.0.0.0:8080");

        assert!(config.apply_overrides(|_| Some("eighty".to_string())).is_err());
    }
}
