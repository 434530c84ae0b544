//! Task collection persistence gateway.
//!
//! # Responsibility
//! - Load and save the whole task collection as one JSON blob under one key.
//! - Translate backend and codec failures into `PersistenceError`.
//!
//! # Invariants
//! - `save` issues exactly one `set` per call.
//! - Loaded collections never contain two tasks with the same `id`.

use crate::model::task::Task;
use crate::repo::kv_store::{KeyValueStore, KvError};
use log::{info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Key used by earlier clients for the task collection.
pub const DEFAULT_STORAGE_KEY: &str = "tasks";

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Persistence gateway failure.
#[derive(Debug)]
pub enum PersistenceError {
    /// Backend read failed.
    Read(KvError),
    /// Backend write failed.
    Write(KvError),
    /// Stored blob is not a valid task collection.
    Decode(serde_json::Error),
    /// Collection could not be serialized.
    Encode(serde_json::Error),
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read(err) => write!(f, "failed to read tasks: {err}"),
            Self::Write(err) => write!(f, "failed to save tasks: {err}"),
            Self::Decode(err) => write!(f, "stored tasks are malformed: {err}"),
            Self::Encode(err) => write!(f, "failed to serialize tasks: {err}"),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read(err) | Self::Write(err) => Some(err),
            Self::Decode(err) | Self::Encode(err) => Some(err),
        }
    }
}

/// Gateway persisting the task collection through a `KeyValueStore`.
#[derive(Debug)]
pub struct TaskRepository<K: KeyValueStore> {
    kv: K,
    key: String,
}

impl<K: KeyValueStore> TaskRepository<K> {
    /// Creates a repository using [`DEFAULT_STORAGE_KEY`].
    pub fn new(kv: K) -> Self {
        Self::with_key(kv, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(kv: K, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Reads the stored collection.
    ///
    /// Returns `Ok(None)` when nothing has been stored under the key yet.
    /// Duplicate ids are dropped, keeping the first occurrence.
    pub async fn load(&self) -> PersistenceResult<Option<Vec<Task>>> {
        let Some(blob) = self
            .kv
            .get(&self.key)
            .await
            .map_err(PersistenceError::Read)?
        else {
            return Ok(None);
        };

        let decoded: Vec<Task> = serde_json::from_str(&blob).map_err(PersistenceError::Decode)?;
        let total = decoded.len();
        let mut seen = HashSet::with_capacity(total);
        let tasks: Vec<Task> = decoded
            .into_iter()
            .filter(|task| seen.insert(task.id.clone()))
            .collect();

        if tasks.len() != total {
            warn!(
                "event=tasks_load module=repo status=ok duplicates_dropped={}",
                total - tasks.len()
            );
        }
        Ok(Some(tasks))
    }

    /// Writes the whole collection, replacing what was stored.
    pub async fn save(&self, tasks: &[Task]) -> PersistenceResult<()> {
        let blob = serde_json::to_string(tasks).map_err(PersistenceError::Encode)?;
        self.kv
            .set(&self.key, &blob)
            .await
            .map_err(PersistenceError::Write)?;
        info!(
            "event=tasks_save module=repo status=ok count={} bytes={}",
            tasks.len(),
            blob.len()
        );
        Ok(())
    }
}
