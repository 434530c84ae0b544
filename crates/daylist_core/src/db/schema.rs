//! `kv_entries` schema bootstrap.
//!
//! The key-value backend needs exactly one table. A fresh file gets it
//! created and stamped with [`SCHEMA_VERSION`]; a file that already holds
//! the table but was never stamped is adopted as-is.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, OptionalExtension};

/// Schema version written to `PRAGMA user_version`.
pub const SCHEMA_VERSION: u32 = 1;

const CREATE_KV_ENTRIES: &str = "
CREATE TABLE IF NOT EXISTS kv_entries (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now') * 1000)
);";

/// What [`ensure_schema`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStatus {
    /// Table created on an empty database.
    Created,
    /// Table already present without a version stamp; stamp added.
    Adopted,
    /// Already at [`SCHEMA_VERSION`].
    Current,
}

/// Brings `conn` to [`SCHEMA_VERSION`], refusing files written by a newer build.
pub fn ensure_schema(conn: &mut Connection) -> DbResult<SchemaStatus> {
    let found = stamped_version(conn)?;
    if found > SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            found,
            supported: SCHEMA_VERSION,
        });
    }
    if found == SCHEMA_VERSION {
        return Ok(SchemaStatus::Current);
    }

    let tx = conn.transaction()?;
    let status = if has_kv_table(&tx)? {
        SchemaStatus::Adopted
    } else {
        tx.execute_batch(CREATE_KV_ENTRIES)?;
        SchemaStatus::Created
    };
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;

    info!("event=db_schema module=db status=ok action={status:?} version={SCHEMA_VERSION}");
    Ok(status)
}

fn stamped_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

fn has_kv_table(conn: &Connection) -> DbResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'kv_entries';",
            [],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}
