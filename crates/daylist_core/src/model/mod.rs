//! Task domain model and ordering policy.
//!
//! # Responsibility
//! - Define the canonical task record shared by every presentation layer.
//! - Define the single total order applied to a task collection.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - Reminder state is one variant, never a flag/time pair.

pub mod ordering;
pub mod task;
