use async_trait::async_trait;

use super::DatabaseError;
use super::models::{GodpackRecord, UserRecord};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts the user, replacing any existing row with the same discord id.
    async fn add_user(&self, user: &UserRecord) -> Result<(), DatabaseError>;
    /// Returns `false` when the status is not a known account state or the
    /// user does not exist.
    async fn update_user_status(&self, discord_id: i64, status: &str)
    -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait GodpackStore: Send + Sync {
    /// Returns the new row id, or `None` when a godpack with the same
    /// message id is already stored.
    async fn add_godpack(&self, godpack: &GodpackRecord) -> Result<Option<i64>, DatabaseError>;
}
