// SQLite schema for the unified bot database.
//
// Guild test tables are created from raw DDL because their names are only
// known at runtime; users and godpacks have fixed names and get diesel table
// definitions for the storage port.

use super::tenant::GuildTable;

/// Columns every guild test table must carry, in declaration order.
pub const GUILD_TABLE_COLUMNS: [&str; 7] = [
    "discord_id",
    "timestamp",
    "gp_id",
    "name",
    "open_slots",
    "number_friends",
    "created_at",
];

/// Columns that get a secondary index on every guild test table.
pub const GUILD_TABLE_INDEXED_COLUMNS: [&str; 3] = ["discord_id", "gp_id", "timestamp"];

/// Idempotent DDL for one guild test table: the table itself followed by
/// its three secondary indexes.
pub fn guild_table_statements(table: &GuildTable) -> Vec<String> {
    let name = table.name();
    let mut statements = Vec::with_capacity(1 + GUILD_TABLE_INDEXED_COLUMNS.len());
    statements.push(format!(
        r#"
        CREATE TABLE IF NOT EXISTS {name} (
            discord_id TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            gp_id TEXT NOT NULL,
            name TEXT NOT NULL,
            open_slots INTEGER DEFAULT -1,
            number_friends INTEGER DEFAULT -1,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (discord_id, timestamp, gp_id)
        )
        "#
    ));
    for column in GUILD_TABLE_INDEXED_COLUMNS {
        statements.push(format!(
            "CREATE INDEX IF NOT EXISTS idx_{name}_{column} ON {name}({column})"
        ));
    }
    statements
}

pub const STORE_STATEMENTS: [&str; 5] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        discord_id INTEGER PRIMARY KEY,
        player_id TEXT,
        display_name TEXT,
        prefix TEXT,
        status TEXT NOT NULL DEFAULT 'inactive',
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now'))
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS godpacks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        message_id INTEGER UNIQUE NOT NULL,
        timestamp TEXT NOT NULL,
        pack_number INTEGER NOT NULL,
        name TEXT NOT NULL,
        friend_code TEXT NOT NULL,
        state TEXT NOT NULL,
        screenshot_url TEXT NOT NULL DEFAULT '',
        ratio INTEGER NOT NULL DEFAULT -1,
        expiration_date TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now'))
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_godpacks_state ON godpacks(state)",
    "CREATE INDEX IF NOT EXISTS idx_godpacks_timestamp ON godpacks(timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_godpacks_expiration ON godpacks(expiration_date)",
];

diesel::table! {
    users (discord_id) {
        discord_id -> BigInt,
        player_id -> Nullable<Text>,
        display_name -> Nullable<Text>,
        prefix -> Nullable<Text>,
        status -> Text,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    godpacks (id) {
        id -> Integer,
        message_id -> BigInt,
        timestamp -> Text,
        pack_number -> Integer,
        name -> Text,
        friend_code -> Text,
        state -> Text,
        screenshot_url -> Text,
        ratio -> Integer,
        expiration_date -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(users, godpacks);
