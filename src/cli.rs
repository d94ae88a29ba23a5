use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "gp-migrate",
    version,
    about = "Provision per-guild godpack test tables and migrate legacy XML data into SQLite"
)]
pub struct Cli {
    /// YAML config file; built-in defaults are used when it does not exist.
    #[arg(short, long, env = "CONFIG_PATH", default_value = "config.yaml")]
    pub config: PathBuf,

    /// Overrides logging.level from the config file.
    #[arg(long, env = "GP_MIGRATE_LOG_LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Create the template table, the store tables, and every guild table.
    Provision {
        /// Guild id to provision in addition to those in the config.
        #[arg(long = "tenant", value_name = "GUILD_ID")]
        tenants: Vec<String>,
    },
    /// Check the template table against the required column set.
    Validate,
    /// Move UserData.xml and ServerData.xml into the database.
    Migrate,
    /// List guilds that have a provisioned table.
    Tenants,
    /// Provision, validate, then migrate.
    Run {
        #[arg(long = "tenant", value_name = "GUILD_ID")]
        tenants: Vec<String>,
    },
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Run { tenants: Vec::new() })
    }
}
