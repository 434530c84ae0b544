//! Key-value store contract and implementations.
//!
//! # Responsibility
//! - Provide `get`/`set` by key over an external storage engine.
//! - Ship an in-memory backend (tests, ephemeral sessions) and a SQLite
//!   backend (durable, single-statement upserts).
//!
//! # Invariants
//! - `set` replaces the full value for a key atomically.
//! - Locks are never held across an `.await`.

use crate::db::{open_db, open_db_in_memory, DbError};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub type KvResult<T> = Result<T, KvError>;

/// Key-value backend failure.
#[derive(Debug)]
pub enum KvError {
    Db(DbError),
    /// A backend lock was poisoned by a panicking holder.
    Poisoned(&'static str),
    /// Backend refused the operation.
    Unavailable(String),
}

impl Display for KvError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Poisoned(backend) => write!(f, "{backend} key-value lock poisoned"),
            Self::Unavailable(message) => write!(f, "key-value store unavailable: {message}"),
        }
    }
}

impl Error for KvError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Poisoned(_) | Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for KvError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for KvError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage engine contract consumed by the persistence gateway.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` when absent.
    async fn get(&self, key: &str) -> KvResult<Option<String>>;
    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> KvResult<()>;
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> KvResult<()> {
        (**self).set(key, value).await
    }
}

/// In-memory key-value store.
///
/// Clones share the same entries, so a second handle can play the role of a
/// restarted process reading what the first one wrote.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKeyValueStore {
    inner: Arc<InMemoryState>,
}

#[derive(Debug, Default)]
struct InMemoryState {
    entries: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent `get` calls fail with `KvError::Unavailable`.
    pub fn fail_reads(&self, fail: bool) {
        self.inner.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent `set` calls fail with `KvError::Unavailable`.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// Reads a value synchronously, bypassing failure injection.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.inner
            .entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        if self.inner.fail_reads.load(Ordering::SeqCst) {
            return Err(KvError::Unavailable("read rejected".to_string()));
        }
        let entries = self
            .inner
            .entries
            .lock()
            .map_err(|_| KvError::Poisoned("in-memory"))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> KvResult<()> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(KvError::Unavailable("write rejected".to_string()));
        }
        let mut entries = self
            .inner
            .entries
            .lock()
            .map_err(|_| KvError::Poisoned("in-memory"))?;
        entries.insert(key.to_string(), value.to_string());
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// SQLite-backed key-value store over the `kv_entries` table.
#[derive(Debug)]
pub struct SqliteKeyValueStore {
    conn: Mutex<Connection>,
}

impl SqliteKeyValueStore {
    /// Opens the database file at `path`, creating the schema if needed.
    pub fn open(path: impl AsRef<Path>) -> KvResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> KvResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps a connection that already has the `kv_entries` schema.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        let conn = self.conn.lock().map_err(|_| KvError::Poisoned("sqlite"))?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> KvResult<()> {
        let conn = self.conn.lock().map_err(|_| KvError::Poisoned("sqlite"))?;
        conn.execute(
            "INSERT INTO kv_entries (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }
}
