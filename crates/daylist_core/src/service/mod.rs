//! Core use-case services.
//!
//! # Responsibility
//! - Own the in-memory task collection and every mutation of it.
//! - Apply reminder rules and run the daily reset.
//! - Keep presentation layers decoupled from storage and notification details.

pub mod daily_reset;
pub mod reminder;
pub mod task_store;
