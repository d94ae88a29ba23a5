pub use self::error::DatabaseError;
pub use self::inspect::{SchemaIssue, ValidationReport};
pub use self::manager::DatabaseManager;
pub use self::models::{GodpackRecord, GpState, UserRecord, UserStatus};
pub use self::stores::{GodpackStore, UserStore};
pub use self::tenant::{GuildTable, TenantId};

pub mod error;
pub mod inspect;
pub mod manager;
pub mod models;
pub mod schema;
pub mod sqlite;
pub mod stores;
pub mod tenant;
