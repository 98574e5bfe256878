//! Publish/subscribe bridge to the external message broker.
//!
//! Producers anywhere in the process call [`Broker::publish`]; the realtime
//! fan-out loop holds a single [`Subscription`] for all [`Topic`]s and relays
//! whatever arrives to connected clients.
//!
//! Delivery guarantees are whatever the backend offers: at-least-once,
//! FIFO within a topic, no ordering across topics. Messages published while
//! nobody is subscribed are dropped.
//!
//! # Implementations
//!
//! - [`RedisBroker`]: Redis `PUBLISH`/`SUBSCRIBE`, for multi-process deployments.
//! - [`InMemoryBroker`]: tokio broadcast channel, for single-process runs and tests.

use async_trait::async_trait;
use std::fmt;

pub mod error;
pub mod in_memory;
pub mod redis_broker;

pub use error::{Error, ErrorKind};
pub use in_memory::InMemoryBroker;
pub use redis_broker::RedisBroker;

pub type Result<T> = std::result::Result<T, Error>;

/// Named broker channel. The set is fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    ReservationNotifications,
    DebugChannel,
}

impl Topic {
    pub const ALL: [Topic; 2] = [Topic::ReservationNotifications, Topic::DebugChannel];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::ReservationNotifications => "reservation-notifications",
            Topic::DebugChannel => "debug-channel",
        }
    }

    /// Resolves a channel name received from the backend.
    pub fn from_name(name: &str) -> Option<Topic> {
        Topic::ALL.into_iter().find(|topic| topic.as_str() == name)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message delivered by a [`Subscription`].
///
/// `topic` is the raw channel name as reported by the backend so that
/// consumers can log and skip channels they do not know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: String,
}

/// Publishing half of the bridge. Safe to share between tasks.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Sends `payload` to `topic`. Fails when the backend is unreachable.
    async fn publish(&self, topic: Topic, payload: &str) -> Result<()>;

    /// Opens a subscription covering every topic in `topics`.
    async fn subscribe(&self, topics: &[Topic]) -> Result<Box<dyn Subscription>>;
}

/// An open, infinite stream of inbound messages.
///
/// A failed `receive` does not poison the subscription; callers retry.
#[async_trait]
pub trait Subscription: Send {
    async fn receive(&mut self) -> Result<InboundMessage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_names_match_the_wire_channels() {
        assert_eq!(
            Topic::ReservationNotifications.as_str(),
            "reservation-notifications"
        );
        assert_eq!(Topic::DebugChannel.to_string(), "debug-channel");
    }

    #[test]
    fn from_name_resolves_known_topics_only() {
        assert_eq!(
            Topic::from_name("debug-channel"),
            Some(Topic::DebugChannel)
        );
        assert_eq!(
            Topic::from_name("reservation-notifications"),
            Some(Topic::ReservationNotifications)
        );
        assert_eq!(Topic::from_name("websocket-channel"), None);
        assert_eq!(Topic::from_name(""), None);
    }
}
