use crate::config::DatabaseConfig;
use crate::db::inspect::{self, ValidationReport};
use crate::db::schema::{self, STORE_STATEMENTS};
use crate::db::sqlite::{SqliteGodpackStore, SqliteUserStore, establish_connection};
use crate::db::{DatabaseError, GodpackStore, GuildTable, TenantId, UserStore};
use diesel::prelude::*;
use diesel::sql_types::Integer;
use diesel::sqlite::SqliteConnection;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(QueryableByName)]
struct Probe {
    #[diesel(sql_type = Integer)]
    ok: i32,
}

#[derive(Clone)]
pub struct DatabaseManager {
    data_dir: PathBuf,
    db_path: Arc<String>,
    user_store: Arc<dyn UserStore>,
    godpack_store: Arc<dyn GodpackStore>,
}

impl DatabaseManager {
    pub fn new(config: &DatabaseConfig) -> Self {
        let db_path = Arc::new(config.db_path().to_string_lossy().to_string());

        Self {
            data_dir: PathBuf::from(&config.data_dir),
            user_store: Arc::new(SqliteUserStore::new(db_path.clone())),
            godpack_store: Arc::new(SqliteGodpackStore::new(db_path.clone())),
            db_path,
        }
    }

    async fn with_connection<T, F>(&self, work: F) -> Result<T, DatabaseError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T, DatabaseError> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            work(&mut conn)
        })
        .await
        .map_err(|e| DatabaseError::Migration(format!("database task failed: {e}")))?
    }

    /// Creates the data directory when absent and proves the database file
    /// can be opened and queried.
    #[instrument(name = "db.ensure_storage_ready", skip(self), fields(path = %self.db_path))]
    pub async fn ensure_storage_ready(&self) -> Result<(), DatabaseError> {
        let data_dir = self.data_dir.clone();
        tokio::task::spawn_blocking(move || std::fs::create_dir_all(data_dir))
            .await
            .map_err(|e| DatabaseError::Connection(format!("storage task failed: {e}")))??;

        let probe = self
            .with_connection(|conn| {
                diesel::sql_query("SELECT 1 AS ok")
                    .get_result::<Probe>(conn)
                    .map_err(|e| DatabaseError::Connection(e.to_string()))
            })
            .await?;
        if probe.ok != 1 {
            return Err(DatabaseError::Connection(format!(
                "unexpected probe result {} from {}",
                probe.ok, self.db_path
            )));
        }

        info!("storage ready at {}", self.db_path);
        Ok(())
    }

    #[instrument(name = "db.initialize_template_schema", skip(self))]
    pub async fn initialize_template_schema(&self) -> Result<(), DatabaseError> {
        let statements = schema::guild_table_statements(&GuildTable::Template);
        self.with_connection(move |conn| apply_statements(conn, &statements))
            .await?;
        info!("template table ready");
        Ok(())
    }

    /// Tables backing the user and godpack stores.
    #[instrument(name = "db.initialize_store_schema", skip(self))]
    pub async fn initialize_store_schema(&self) -> Result<(), DatabaseError> {
        let statements: Vec<String> = STORE_STATEMENTS.iter().map(|s| s.to_string()).collect();
        self.with_connection(move |conn| apply_statements(conn, &statements))
            .await?;
        info!("user and godpack tables ready");
        Ok(())
    }

    /// Validates `tenant_id` before anything touches storage, then creates
    /// the guild's table and indexes if they are missing. Repeat calls are
    /// no-ops.
    #[instrument(name = "db.ensure_tenant_schema", skip(self))]
    pub async fn ensure_tenant_schema(&self, tenant_id: &str) -> Result<TenantId, DatabaseError> {
        let tenant = match TenantId::parse(tenant_id) {
            Ok(tenant) => tenant,
            Err(e) => {
                warn!("refusing to provision guild table: {}", e);
                return Err(e);
            }
        };

        let statements = schema::guild_table_statements(&GuildTable::Tenant(tenant.clone()));
        self.with_connection(move |conn| apply_statements(conn, &statements))
            .await?;
        info!("ensured table exists for guild {}", tenant);
        Ok(tenant)
    }

    pub async fn validate_structure(&self) -> Result<ValidationReport, DatabaseError> {
        let db_path = PathBuf::from(self.db_path.as_str());
        tokio::task::spawn_blocking(move || inspect::validate_structure(&db_path))
            .await
            .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    /// Guilds that currently have a provisioned table. An absent database
    /// has none.
    pub async fn tenant_ids(&self) -> Result<Vec<TenantId>, DatabaseError> {
        if !Path::new(self.db_path.as_str()).is_file() {
            return Ok(Vec::new());
        }
        self.with_connection(inspect::list_tenants).await
    }

    pub fn user_store(&self) -> Arc<dyn UserStore> {
        self.user_store.clone()
    }

    pub fn godpack_store(&self) -> Arc<dyn GodpackStore> {
        self.godpack_store.clone()
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }
}

// One transaction per table so a failed statement leaves no half-built table behind.
fn apply_statements(conn: &mut SqliteConnection, statements: &[String]) -> Result<(), DatabaseError> {
    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        for statement in statements {
            diesel::sql_query(statement.as_str()).execute(conn)?;
        }
        Ok(())
    })
    .map_err(|e| DatabaseError::Migration(e.to_string()))
}

#[cfg(test)]
mod tests {
    use diesel::prelude::*;
    use diesel::sql_types::{Integer, Text};
    use tempfile::TempDir;

    use super::DatabaseManager;
    use crate::config::DatabaseConfig;
    use crate::db::sqlite::establish_connection;
    use crate::db::{DatabaseError, SchemaIssue, TenantId};

    #[derive(Debug, QueryableByName, PartialEq, Eq)]
    struct GuildTestRow {
        #[diesel(sql_type = Text)]
        discord_id: String,
        #[diesel(sql_type = Text)]
        gp_id: String,
        #[diesel(sql_type = Integer)]
        open_slots: i32,
        #[diesel(sql_type = Integer)]
        number_friends: i32,
    }

    #[derive(Debug, QueryableByName)]
    struct SchemaSql {
        #[diesel(sql_type = Text)]
        sql: String,
    }

    fn config(dir: &TempDir) -> DatabaseConfig {
        DatabaseConfig {
            data_dir: dir.path().join("data").to_string_lossy().to_string(),
            filename: "gp.db".to_string(),
        }
    }

    fn catalog(manager: &DatabaseManager) -> Vec<String> {
        let mut conn = establish_connection(manager.db_path()).unwrap();
        diesel::sql_query("SELECT sql FROM sqlite_master WHERE sql IS NOT NULL ORDER BY name")
            .load::<SchemaSql>(&mut conn)
            .unwrap()
            .into_iter()
            .map(|row| row.sql)
            .collect()
    }

    #[tokio::test]
    async fn storage_ready_creates_data_dir() {
        let dir = TempDir::new().unwrap();
        let manager = DatabaseManager::new(&config(&dir));

        manager.ensure_storage_ready().await.expect("storage ready");
        assert!(dir.path().join("data").is_dir());
        assert!(dir.path().join("data").join("gp.db").is_file());
    }

    #[tokio::test]
    async fn storage_ready_fails_when_data_dir_is_a_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("data"), b"not a directory").unwrap();
        let manager = DatabaseManager::new(&config(&dir));

        let err = manager.ensure_storage_ready().await.unwrap_err();
        assert!(matches!(err, DatabaseError::Io(_)));
    }

    #[tokio::test]
    async fn provisioned_template_validates() {
        let dir = TempDir::new().unwrap();
        let manager = DatabaseManager::new(&config(&dir));

        let before = manager.validate_structure().await.unwrap();
        assert!(matches!(before.issues.as_slice(), [SchemaIssue::DatabaseMissing(_)]));

        manager.ensure_storage_ready().await.unwrap();
        manager.initialize_template_schema().await.unwrap();
        manager.initialize_template_schema().await.unwrap();

        let after = manager.validate_structure().await.unwrap();
        assert!(after.is_ok(), "unexpected issues: {:?}", after.issues);
    }

    #[tokio::test]
    async fn tenant_schema_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let manager = DatabaseManager::new(&config(&dir));
        manager.ensure_storage_ready().await.unwrap();
        manager.initialize_template_schema().await.unwrap();

        let first = manager.ensure_tenant_schema("111").await.expect("first");
        let snapshot = catalog(&manager);
        let second = manager.ensure_tenant_schema("111").await.expect("second");

        assert_eq!(first, second);
        assert_eq!(catalog(&manager), snapshot);
        assert_eq!(
            snapshot.iter().filter(|sql| sql.contains("gpp_test_111")).count(),
            4
        );
    }

    #[tokio::test]
    async fn invalid_tenant_never_touches_storage() {
        let dir = TempDir::new().unwrap();
        let manager = DatabaseManager::new(&config(&dir));

        for bad in ["", "12a", "1; DROP TABLE users", "gpp"] {
            let err = manager.ensure_tenant_schema(bad).await.unwrap_err();
            assert!(matches!(err, DatabaseError::InvalidIdentifier(_)));
        }
        assert!(!dir.path().join("data").exists());
    }

    #[tokio::test]
    async fn registry_lists_provisioned_tenants_only() {
        let dir = TempDir::new().unwrap();
        let manager = DatabaseManager::new(&config(&dir));
        assert!(manager.tenant_ids().await.unwrap().is_empty());

        manager.ensure_storage_ready().await.unwrap();
        manager.initialize_template_schema().await.unwrap();
        manager.initialize_store_schema().await.unwrap();
        manager.ensure_tenant_schema("222").await.unwrap();
        manager.ensure_tenant_schema("111").await.unwrap();

        let tenants = manager.tenant_ids().await.unwrap();
        let expected: Vec<TenantId> = ["111", "222"]
            .iter()
            .map(|id| TenantId::parse(id).unwrap())
            .collect();
        assert_eq!(tenants, expected);
    }

    #[tokio::test]
    async fn tenant_table_applies_defaults_and_primary_key() {
        let dir = TempDir::new().unwrap();
        let manager = DatabaseManager::new(&config(&dir));
        manager.ensure_storage_ready().await.unwrap();
        let tenant = manager.ensure_tenant_schema("333").await.unwrap();
        let table = tenant.table_name();

        let mut conn = establish_connection(manager.db_path()).unwrap();
        let insert = format!(
            "INSERT INTO {table} (discord_id, timestamp, gp_id, name) VALUES ('1', '2025-01-01 00:00:00', '77', 'tester')"
        );
        diesel::sql_query(insert.as_str()).execute(&mut conn).unwrap();
        assert!(diesel::sql_query(insert.as_str()).execute(&mut conn).is_err());

        let rows = diesel::sql_query(format!(
            "SELECT discord_id, gp_id, open_slots, number_friends FROM {table}"
        ))
        .load::<GuildTestRow>(&mut conn)
        .unwrap();
        assert_eq!(
            rows,
            vec![GuildTestRow {
                discord_id: "1".to_string(),
                gp_id: "77".to_string(),
                open_slots: -1,
                number_friends: -1,
            }]
        );
    }
}
