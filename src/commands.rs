use anyhow::Result;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::db::{DatabaseError, DatabaseManager};
use crate::legacy::LegacyDocumentReader;
use crate::migration::{MigrationEngine, MigrationReport};

/// Config tenants first, then CLI tenants, without repeats.
pub fn tenant_list(config: &Config, extra: &[String]) -> Vec<String> {
    let mut tenants: Vec<String> = Vec::new();
    for tenant in config.tenants.iter().chain(extra) {
        let tenant = tenant.trim().to_string();
        if !tenants.contains(&tenant) {
            tenants.push(tenant);
        }
    }
    tenants
}

/// Prepares storage, the template and store tables, then every listed guild.
/// A rejected guild id is logged and reported; the remaining guilds are
/// still provisioned. Returns `Ok(false)` if any guild was rejected.
pub async fn provision(db: &DatabaseManager, tenants: &[String]) -> Result<bool> {
    db.ensure_storage_ready().await?;
    db.initialize_template_schema().await?;
    db.initialize_store_schema().await?;

    let mut all_provisioned = true;
    for tenant in tenants {
        match db.ensure_tenant_schema(tenant).await {
            Ok(_) => {}
            Err(DatabaseError::InvalidIdentifier(reason)) => {
                error!("skipping guild {:?}: {}", tenant, reason);
                all_provisioned = false;
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!(
        "provisioned template and {} guild table(s) in {}",
        tenants.len(),
        db.db_path()
    );
    Ok(all_provisioned)
}

pub async fn validate(db: &DatabaseManager) -> Result<bool> {
    let report = db.validate_structure().await?;
    if report.is_ok() {
        info!("database structure is valid");
        return Ok(true);
    }
    for issue in &report.issues {
        warn!("schema issue: {}", issue);
        println!("{issue}");
    }
    Ok(false)
}

pub async fn migrate(db: &DatabaseManager, config: &Config) -> Result<MigrationReport> {
    db.ensure_storage_ready().await?;
    db.initialize_store_schema().await?;

    let engine = MigrationEngine::new(
        LegacyDocumentReader::new(&config.legacy),
        db.user_store(),
        db.godpack_store(),
    );
    let report = engine.migrate().await;
    for pass in report.passes() {
        println!("{pass}");
        for skipped in &pass.skipped {
            println!("  skipped {}: {}", skipped.key, skipped.reason);
        }
        for failed in &pass.failed {
            println!("  failed {}: {}", failed.key, failed.error);
        }
    }
    Ok(report)
}

pub async fn list_tenants(db: &DatabaseManager) -> Result<()> {
    for tenant in db.tenant_ids().await? {
        println!("{tenant}");
    }
    Ok(())
}

/// Provision, validate, migrate. Migration still runs after a rejected
/// guild id, but not when the template table fails validation.
pub async fn run(db: &DatabaseManager, config: &Config, extra: &[String]) -> Result<bool> {
    let provisioned = provision(db, &tenant_list(config, extra)).await?;
    if !validate(db).await? {
        return Ok(false);
    }
    let report = migrate(db, config).await?;
    Ok(provisioned && report.succeeded())
}
