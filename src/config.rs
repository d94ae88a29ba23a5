pub use self::parser::{Config, DatabaseConfig, LegacyConfig, LoggingConfig};
pub use self::validator::ConfigError;

mod parser;
mod validator;
