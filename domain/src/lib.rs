//! Business operations for users, reservations and notifications.
//!
//! Every successful write emits a [`events::DomainEvent`] through the
//! supplied [`events::EventPublisher`] after the row is stored. Consumers of
//! this crate do not need to depend on `entity_api` directly; the entity
//! modules are re-exported here.

// Re-exports from `entity` crate via `entity_api`
pub use entity_api::{notifications, reservations, users, Id};

pub mod error;
pub mod notification;
pub mod reservation;
pub mod user;

use log::*;
use serde::Serialize;
use serde_json::Value;

/// Serialized copy of a model for event payloads. A failure yields `null`.
pub(crate) fn to_event_value<T: Serialize + std::fmt::Debug>(model: &T) -> Value {
    serde_json::to_value(model).unwrap_or_else(|e| {
        warn!("Failed to serialize {model:?} for event payload: {e}");
        Value::Null
    })
}
