//! Persistence gateway and its key-value backends.
//!
//! # Responsibility
//! - Define the key-value contract the core persists through.
//! - Serialize/deserialize the whole task collection as one blob under one key.
//!
//! # Invariants
//! - The collection is written whole, never partially.
//! - Backend failures surface as `PersistenceError`, never as panics.

pub mod kv_store;
pub mod task_repo;
