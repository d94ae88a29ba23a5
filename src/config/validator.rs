use thiserror::Error;

use super::parser::Config;
use crate::db::tenant::is_valid_tenant_id;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.data_dir.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "database.data_dir cannot be empty".to_string(),
            ));
        }

        if self.database.filename.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "database.filename cannot be empty".to_string(),
            ));
        }

        if let Some(bad) = self.tenants.iter().find(|id| !is_valid_tenant_id(id)) {
            return Err(ConfigError::InvalidConfig(format!(
                "tenant id {bad:?} must contain only decimal digits"
            )));
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::InvalidConfig(format!(
                "logging.format must be \"pretty\" or \"json\", got {:?}",
                self.logging.format
            )));
        }

        Ok(())
    }
}
