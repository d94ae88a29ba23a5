use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDateTime};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::db::schema::{godpacks, users};

use super::{
    DatabaseError,
    models::{GodpackRecord, UserRecord, UserStatus},
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

// Godpacks expire a few days after the daily 06:00 reset of the day they were found
const RESET_HOUR: u32 = 6;

fn datetime_to_string(dt: &NaiveDateTime) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

fn now_string() -> String {
    datetime_to_string(&Local::now().naive_local())
}

fn expiration_date(timestamp: NaiveDateTime) -> Option<NaiveDateTime> {
    let reset = timestamp.date().and_hms_opt(RESET_HOUR, 0, 0)?;
    let days = if timestamp < reset { 3 } else { 4 };
    Some(reset + Duration::days(days))
}

pub(crate) fn establish_connection(path: &str) -> Result<SqliteConnection, DatabaseError> {
    let mut conn = SqliteConnection::establish(path)
        .map_err(|e| DatabaseError::Connection(e.to_string()))?;
    diesel::sql_query("PRAGMA foreign_keys = ON")
        .execute(&mut conn)
        .map_err(|e| DatabaseError::Connection(e.to_string()))?;
    Ok(conn)
}

#[derive(Insertable)]
#[diesel(table_name = users)]
struct NewUser<'a> {
    discord_id: i64,
    player_id: Option<&'a str>,
    display_name: Option<&'a str>,
    prefix: Option<&'a str>,
    updated_at: String,
}

#[derive(Insertable)]
#[diesel(table_name = godpacks)]
struct NewGodpack<'a> {
    message_id: i64,
    timestamp: String,
    pack_number: i32,
    name: &'a str,
    friend_code: &'a str,
    state: &'a str,
    screenshot_url: &'a str,
    ratio: i32,
    expiration_date: Option<String>,
}

pub struct SqliteUserStore {
    db_path: Arc<String>,
}

impl SqliteUserStore {
    pub fn new(db_path: Arc<String>) -> Self {
        Self { db_path }
    }
}

#[async_trait]
impl super::UserStore for SqliteUserStore {
    async fn add_user(&self, user: &UserRecord) -> Result<(), DatabaseError> {
        let user = user.clone();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            let new_user = NewUser {
                discord_id: user.discord_id,
                player_id: user.player_id.as_deref(),
                display_name: Some(&user.display_name),
                prefix: user.prefix.as_deref(),
                updated_at: now_string(),
            };

            diesel::replace_into(users::table)
                .values(&new_user)
                .execute(&mut conn)
                .map(|_| debug!("added/updated user {}", user.discord_id))
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    async fn update_user_status(
        &self,
        discord_id: i64,
        status: &str,
    ) -> Result<bool, DatabaseError> {
        let Some(status) = UserStatus::parse(status) else {
            warn!("invalid status {:?} for user {}", status, discord_id);
            return Ok(false);
        };

        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            let affected = diesel::update(users::table.filter(users::discord_id.eq(discord_id)))
                .set((
                    users::status.eq(status.as_str()),
                    users::updated_at.eq(now_string()),
                ))
                .execute(&mut conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))?;

            if affected == 0 {
                warn!("user {} not found for status update", discord_id);
            }
            Ok(affected > 0)
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }
}

pub struct SqliteGodpackStore {
    db_path: Arc<String>,
}

impl SqliteGodpackStore {
    pub fn new(db_path: Arc<String>) -> Self {
        Self { db_path }
    }
}

#[async_trait]
impl super::GodpackStore for SqliteGodpackStore {
    async fn add_godpack(&self, godpack: &GodpackRecord) -> Result<Option<i64>, DatabaseError> {
        let godpack = godpack.clone();
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            let new_godpack = NewGodpack {
                message_id: godpack.message_id,
                timestamp: datetime_to_string(&godpack.timestamp),
                pack_number: godpack.pack_number,
                name: &godpack.name,
                friend_code: &godpack.friend_code,
                state: godpack.state.as_str(),
                screenshot_url: &godpack.screenshot_url,
                ratio: godpack.ratio,
                expiration_date: expiration_date(godpack.timestamp).map(|dt| datetime_to_string(&dt)),
            };

            let inserted = conn.transaction::<_, DieselError, _>(|conn| {
                diesel::insert_into(godpacks::table)
                    .values(&new_godpack)
                    .execute(conn)?;
                godpacks::table
                    .filter(godpacks::message_id.eq(new_godpack.message_id))
                    .select(godpacks::id)
                    .first::<i32>(conn)
            });

            match inserted {
                Ok(id) => {
                    debug!("added godpack {}: {}", id, godpack.name);
                    Ok(Some(i64::from(id)))
                }
                Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                    debug!("godpack with message id {} already exists", godpack.message_id);
                    Ok(None)
                }
                Err(e) => Err(DatabaseError::Query(e.to_string())),
            }
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }
}
