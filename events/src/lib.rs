//! Event system infrastructure for the Reservation Platform.
//!
//! This crate decouples the business layer from the realtime layer. Domain
//! operations emit a [`DomainEvent`] once their database write has committed,
//! and every registered [`EventHandler`] decides what to do with it (the
//! realtime crate forwards them to the message broker).
//!
//! # Architecture
//!
//! - **DomainEvent**: Enum representing all business events in the system
//! - **EventHandler**: Trait for implementing event handlers
//! - **EventPublisher**: Publishes events to registered handlers
//!
//! This crate has no dependencies on internal crates (entity, domain, etc.),
//! avoiding circular dependencies. Entity data is carried as serialized JSON values.

use async_trait::async_trait;
use log::*;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// A type alias that represents any Entity's internal id field data type.
/// This matches the definition in the entity crate to maintain compatibility.
pub type Id = Uuid;

/// Domain events that represent business-level changes in the system.
/// These events are emitted only after the corresponding write succeeded.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// A reservation was stored together with its companion notification.
    ReservationCreated {
        user_id: Id,
        /// Complete serialized reservation entity.
        reservation: Value,
        /// Human readable text pushed to realtime clients.
        message: String,
    },
    /// A notification was stored for an existing reservation.
    NotificationCreated {
        user_id: Id,
        reservation_id: Id,
        /// Complete serialized notification entity.
        notification: Value,
        /// Human readable text pushed to realtime clients.
        message: String,
    },
}

impl DomainEvent {
    /// Stable name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::ReservationCreated { .. } => "reservation_created",
            DomainEvent::NotificationCreated { .. } => "notification_created",
        }
    }

    /// The human readable message carried by every event.
    pub fn message(&self) -> &str {
        match self {
            DomainEvent::ReservationCreated { message, .. } => message,
            DomainEvent::NotificationCreated { message, .. } => message,
        }
    }
}

/// Trait for handling domain events.
///
/// Handlers have no way to report failure back to the publisher: the write
/// that produced the event has already committed, so a handler logs its own
/// errors and returns.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent);
}

/// Publishes domain events to registered handlers.
/// Handlers are called sequentially in registration order.
#[derive(Clone)]
pub struct EventPublisher {
    handlers: Arc<Vec<Arc<dyn EventHandler>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a new event handler.
    /// Note: This creates a new publisher instance with the additional handler.
    /// Store the returned publisher in your application state.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Publish an event to all registered handlers, in registration order.
    pub async fn publish(&self, event: DomainEvent) {
        debug!(
            "Publishing domain event {} to {} handler(s)",
            event.name(),
            self.handlers.len()
        );

        for handler in self.handlers.iter() {
            handler.handle(&event).await;
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
