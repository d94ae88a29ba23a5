use super::ConfigError;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub legacy: LegacyConfig,
    #[serde(default, deserialize_with = "deserialize_tenants")]
    pub tenants: Vec<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_db_filename")]
    pub filename: String,
}

impl DatabaseConfig {
    pub fn db_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.filename)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            filename: default_db_filename(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LegacyConfig {
    /// Directory searched for the legacy XML files, then its `data` subdirectory.
    #[serde(default = "default_legacy_root")]
    pub root: String,
    #[serde(default = "default_users_file")]
    pub users_file: String,
    #[serde(default = "default_server_file")]
    pub server_file: String,
}

impl Default for LegacyConfig {
    fn default() -> Self {
        Self {
            root: default_legacy_root(),
            users_file: default_users_file(),
            server_file: default_server_file(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(alias = "console", default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Loads `path` when it exists, otherwise starts from defaults. Env
    /// overrides and validation apply either way.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load_from_file(path);
        }

        info!("no config at {}, using defaults", path.display());
        let mut config = Config::default();
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&content)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("GP_MIGRATE_DATA_DIR") {
            self.database.data_dir = value;
        }
        if let Some(value) = lookup("GP_MIGRATE_LEGACY_ROOT") {
            self.legacy.root = value;
        }
        if let Some(value) = lookup("GP_MIGRATE_TENANTS") {
            self.tenants = value
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect();
        }
    }
}

// Guild ids are often written unquoted in YAML, so accept numbers as well as strings.
fn deserialize_tenants<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTenant {
        Text(String),
        Number(u64),
    }

    let raw = Vec::<RawTenant>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|tenant| match tenant {
            RawTenant::Text(text) => text,
            RawTenant::Number(number) => number.to_string(),
        })
        .collect())
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_db_filename() -> String {
    "ptcgp_unified.db".to_string()
}

fn default_legacy_root() -> String {
    ".".to_string()
}

fn default_users_file() -> String {
    "UserData.xml".to_string()
}

fn default_server_file() -> String {
    "ServerData.xml".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
