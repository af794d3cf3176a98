//! Settings file for netfetch
//!
//! Optional TOML file; every key has a default:
//!
//! ```toml
//! timeout_secs = 30
//! connect_timeout_secs = 10
//! user_agent = "netfetch"
//! max_redirects = 10
//! decimal_units = false
//! precision = 1
//! ```

use netaction::{ClientConfig, UnitSystem};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Largest precision accepted for the size rounding test
pub const MAX_PRECISION: i32 = 6;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Overrides the transport's default user agent
    pub user_agent: Option<String>,
    pub max_redirects: usize,
    /// Report sizes in kB/MB instead of kiB/MiB
    pub decimal_units: bool,
    pub precision: i32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: None,
            max_redirects: 10,
            decimal_units: false,
            precision: netaction::size::DEFAULT_PRECISION,
        }
    }
}

impl FetchConfig {
    /// Loads and validates a config file. Unlike a missing `--config` flag, a
    /// missing file is an error.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: FetchConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "connect_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if !(0..=MAX_PRECISION).contains(&self.precision) {
            return Err(ConfigError::ValidationError(format!(
                "precision must be between 0 and {}, got {}",
                MAX_PRECISION, self.precision
            )));
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
            max_redirects: self.max_redirects,
        }
    }

    pub fn unit_system(&self) -> UnitSystem {
        if self.decimal_units {
            UnitSystem::Decimal
        } else {
            UnitSystem::Binary
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = FetchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.unit_system(), UnitSystem::Binary);
        assert_eq!(config.client_config().timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_load_partial_file() {
        let file = write_config("timeout_secs = 5\ndecimal_units = true\n");
        let config = FetchConfig::load(file.path()).unwrap();

        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.unit_system(), UnitSystem::Decimal);
        assert_eq!(config.max_redirects, 10);
    }

    #[test]
    fn test_user_agent_override() {
        let file = write_config("user_agent = \"netfetch-test\"\n");
        let config = FetchConfig::load(file.path()).unwrap();
        assert_eq!(config.client_config().user_agent, "netfetch-test");
    }

    #[test]
    fn test_missing_file() {
        let result = FetchConfig::load(Path::new("/nonexistent/netfetch.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_parse_error() {
        let file = write_config("timeout_secs = \"soon\"\n");
        let result = FetchConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let file = write_config("timeout_secs = 0\n");
        let result = FetchConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validation_rejects_precision() {
        let config = FetchConfig {
            precision: 9,
            ..FetchConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
