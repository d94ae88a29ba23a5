#![forbid(unsafe_code)]

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

mod cli;
mod commands;
mod config;
mod db;
mod legacy;
mod migration;
mod utils;

use cli::{Cli, Command};
use config::Config;
use db::DatabaseManager;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    utils::logging::init_tracing(level, &config.logging.format);
    info!("gp-migrate starting, database at {}", config.database.db_path().display());

    let db = DatabaseManager::new(&config.database);
    let succeeded = match cli.command() {
        Command::Provision { tenants } => {
            commands::provision(&db, &commands::tenant_list(&config, &tenants)).await?
        }
        Command::Validate => commands::validate(&db).await?,
        Command::Migrate => commands::migrate(&db, &config).await?.succeeded(),
        Command::Tenants => {
            commands::list_tenants(&db).await?;
            true
        }
        Command::Run { tenants } => commands::run(&db, &config, &tenants).await?,
    };

    if succeeded {
        info!("done");
        Ok(ExitCode::SUCCESS)
    } else {
        error!("finished with errors");
        Ok(ExitCode::FAILURE)
    }
}
