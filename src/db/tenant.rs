//! Guild identifiers and the per-guild test table names derived from them.
//!
//! Table names cannot be bound as query parameters, so every name that ends
//! up in DDL goes through [`GuildTable`], which can only be built from the
//! fixed template name or from a [`TenantId`] that passed [`is_valid_tenant_id`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::DatabaseError;

/// Prefix shared by the template table and every guild table.
pub const TABLE_PREFIX: &str = "gpp_test_";

/// Name of the canonical table every guild table is cloned from.
pub const TEMPLATE_TABLE: &str = "gpp_test_template";

/// A tenant identifier is valid iff it is non-empty and all ASCII digits.
pub fn is_valid_tenant_id(identifier: &str) -> bool {
    !identifier.is_empty() && identifier.bytes().all(|b| b.is_ascii_digit())
}

/// Validated Discord guild id owning one `gpp_test_<id>` table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    pub fn parse(identifier: &str) -> Result<Self, DatabaseError> {
        if is_valid_tenant_id(identifier) {
            Ok(Self(identifier.to_string()))
        } else {
            Err(DatabaseError::InvalidIdentifier(identifier.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn table_name(&self) -> String {
        format!("{TABLE_PREFIX}{}", self.0)
    }

    /// Recovers the tenant id from a catalog table name. The template table
    /// and anything else that is not `gpp_test_<digits>` yields `None`.
    pub fn from_table_name(table_name: &str) -> Option<Self> {
        table_name
            .strip_prefix(TABLE_PREFIX)
            .filter(|suffix| is_valid_tenant_id(suffix))
            .map(|suffix| Self(suffix.to_string()))
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TenantId {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TenantId {
    type Error = DatabaseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TenantId> for String {
    fn from(id: TenantId) -> Self {
        id.0
    }
}

/// A table with the guild test column layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuildTable {
    Template,
    Tenant(TenantId),
}

impl GuildTable {
    pub fn name(&self) -> String {
        match self {
            GuildTable::Template => TEMPLATE_TABLE.to_string(),
            GuildTable::Tenant(id) => id.table_name(),
        }
    }
}

impl fmt::Display for GuildTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
