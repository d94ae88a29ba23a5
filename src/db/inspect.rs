//! Read-only catalog inspection: structural validation of the template
//! table and enumeration of provisioned guild tables.

use std::fmt;
use std::path::{Path, PathBuf};

use diesel::prelude::*;
use diesel::sql_types::Text;
use diesel::sqlite::SqliteConnection;
use tracing::instrument;

use super::DatabaseError;
use super::schema::GUILD_TABLE_COLUMNS;
use super::sqlite::establish_connection;
use super::tenant::{GuildTable, TEMPLATE_TABLE, TenantId};

#[derive(Debug, QueryableByName)]
struct CatalogName {
    #[diesel(sql_type = Text)]
    name: String,
}

/// A structural problem found by [`validate_structure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaIssue {
    DatabaseMissing(PathBuf),
    TemplateTableMissing,
    MissingColumns(Vec<String>),
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaIssue::DatabaseMissing(path) => {
                write!(f, "database file missing: {}", path.display())
            }
            SchemaIssue::TemplateTableMissing => {
                write!(f, "template table {TEMPLATE_TABLE} does not exist")
            }
            SchemaIssue::MissingColumns(columns) => write!(
                f,
                "template table {TEMPLATE_TABLE} is missing columns: {}",
                columns.join(", ")
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub issues: Vec<SchemaIssue>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }
}

pub fn table_exists(conn: &mut SqliteConnection, table: &GuildTable) -> Result<bool, DatabaseError> {
    let found = diesel::sql_query("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
        .bind::<Text, _>(table.name())
        .load::<CatalogName>(conn)
        .map_err(|e| DatabaseError::Query(e.to_string()))?;
    Ok(!found.is_empty())
}

pub fn table_columns(
    conn: &mut SqliteConnection,
    table: &GuildTable,
) -> Result<Vec<String>, DatabaseError> {
    diesel::sql_query("SELECT name FROM pragma_table_info(?) ORDER BY cid")
        .bind::<Text, _>(table.name())
        .load::<CatalogName>(conn)
        .map(|rows| rows.into_iter().map(|row| row.name).collect())
        .map_err(|e| DatabaseError::Query(e.to_string()))
}

/// Every guild with a provisioned table, sorted by table name. The template
/// table is never reported.
#[instrument(name = "inspect.list_tenants", skip(conn))]
pub fn list_tenants(conn: &mut SqliteConnection) -> Result<Vec<TenantId>, DatabaseError> {
    let tables = diesel::sql_query(
        r"SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE 'gpp\_test\_%' ESCAPE '\' ORDER BY name",
    )
    .load::<CatalogName>(conn)
    .map_err(|e| DatabaseError::Query(e.to_string()))?;

    Ok(tables
        .iter()
        .filter_map(|table| TenantId::from_table_name(&table.name))
        .collect())
}

/// Checks that the database exists, has the template table, and that the
/// template carries every required column. Never writes.
#[instrument(name = "inspect.validate_structure", skip(db_path), fields(path = %db_path.display()))]
pub fn validate_structure(db_path: &Path) -> Result<ValidationReport, DatabaseError> {
    let mut report = ValidationReport::default();

    if !db_path.is_file() {
        report
            .issues
            .push(SchemaIssue::DatabaseMissing(db_path.to_path_buf()));
        return Ok(report);
    }

    let mut conn = establish_connection(&db_path.to_string_lossy())?;
    if !table_exists(&mut conn, &GuildTable::Template)? {
        report.issues.push(SchemaIssue::TemplateTableMissing);
        return Ok(report);
    }

    let present = table_columns(&mut conn, &GuildTable::Template)?;
    let missing: Vec<String> = GUILD_TABLE_COLUMNS
        .iter()
        .filter(|required| !present.iter().any(|column| column == *required))
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        report.issues.push(SchemaIssue::MissingColumns(missing));
    }

    Ok(report)
}
