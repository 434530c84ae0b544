//! Flutter-facing bindings for daylist core.

pub mod api;
mod outbox;
