//! In-process broker backed by a tokio broadcast channel.
//!
//! Every subscription gets its own receiver on the shared channel and filters
//! by topic on its side. Ideal for local development and tests without a
//! Redis instance.

use async_trait::async_trait;
use log::*;
use std::collections::HashSet;
use tokio::sync::broadcast;

use crate::{Broker, Error, ErrorKind, InboundMessage, Result, Subscription, Topic};

/// Channel capacity for broadcast.
const CHANNEL_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct InMemoryBroker {
    sender: broadcast::Sender<InboundMessage>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::with_capacity(CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        info!("In-memory broker initialized (capacity {capacity})");
        Self { sender }
    }

    /// Number of open subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Sends a message on an arbitrary channel name, bypassing [`Topic`].
    pub fn publish_raw(&self, topic: &str, payload: &str) {
        let message = InboundMessage {
            topic: topic.to_string(),
            payload: payload.to_string(),
        };

        // An error only means nobody is subscribed; the message is dropped.
        match self.sender.send(message) {
            Ok(receivers) => debug!("Published to {topic} ({receivers} subscriber(s))"),
            Err(_) => debug!("Published to {topic} with no subscribers, message dropped"),
        }
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Broker for InMemoryBroker {
    async fn publish(&self, topic: Topic, payload: &str) -> Result<()> {
        self.publish_raw(topic.as_str(), payload);
        Ok(())
    }

    async fn subscribe(&self, topics: &[Topic]) -> Result<Box<dyn Subscription>> {
        let topics: HashSet<&'static str> = topics.iter().map(Topic::as_str).collect();
        debug!("In-memory subscription opened for {topics:?}");

        Ok(Box::new(InMemorySubscription {
            receiver: self.sender.subscribe(),
            topics,
        }))
    }
}

struct InMemorySubscription {
    receiver: broadcast::Receiver<InboundMessage>,
    topics: HashSet<&'static str>,
}

#[async_trait]
impl Subscription for InMemorySubscription {
    async fn receive(&mut self) -> Result<InboundMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(message) if self.topics.contains(message.topic.as_str()) => return Ok(message),
                Ok(_) => continue,
                Err(e @ broadcast::error::RecvError::Lagged(_)) => {
                    return Err(Error::with_source(ErrorKind::Receive, e));
                }
                Err(e @ broadcast::error::RecvError::Closed) => {
                    return Err(Error::with_source(ErrorKind::Closed, e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_messages_in_publish_order() {
        let broker = InMemoryBroker::new();
        let mut subscription = broker.subscribe(&Topic::ALL).await.unwrap();

        for i in 0..5 {
            broker
                .publish(Topic::ReservationNotifications, &format!("event-{i}"))
                .await
                .unwrap();
        }

        for i in 0..5 {
            let message = subscription.receive().await.unwrap();
            assert_eq!(message.topic, "reservation-notifications");
            assert_eq!(message.payload, format!("event-{i}"));
        }
    }

    #[tokio::test]
    async fn subscriber_only_sees_its_topics() {
        let broker = InMemoryBroker::new();
        let mut subscription = broker.subscribe(&[Topic::DebugChannel]).await.unwrap();

        broker
            .publish(Topic::ReservationNotifications, "ignored")
            .await
            .unwrap();
        broker.publish(Topic::DebugChannel, "ping").await.unwrap();

        let message = subscription.receive().await.unwrap();
        assert_eq!(message.topic, "debug-channel");
        assert_eq!(message.payload, "ping");
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_not_an_error() {
        let broker = InMemoryBroker::new();
        assert_eq!(broker.subscriber_count(), 0);

        assert!(broker.publish(Topic::DebugChannel, "lost").await.is_ok());
    }

    #[tokio::test]
    async fn messages_published_before_subscribing_are_not_replayed() {
        let broker = InMemoryBroker::new();
        broker.publish(Topic::DebugChannel, "early").await.unwrap();

        let mut subscription = broker.subscribe(&Topic::ALL).await.unwrap();
        broker.publish(Topic::DebugChannel, "late").await.unwrap();

        assert_eq!(subscription.receive().await.unwrap().payload, "late");
    }

    #[tokio::test]
    async fn lagging_subscriber_gets_a_transient_error_then_recovers() {
        let broker = InMemoryBroker::with_capacity(2);
        let mut subscription = broker.subscribe(&Topic::ALL).await.unwrap();

        for i in 0..4 {
            broker
                .publish(Topic::DebugChannel, &i.to_string())
                .await
                .unwrap();
        }

        let err = subscription.receive().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Receive);

        // The two newest messages are still buffered.
        assert_eq!(subscription.receive().await.unwrap().payload, "2");
        assert_eq!(subscription.receive().await.unwrap().payload, "3");
    }

    #[tokio::test]
    async fn raw_publish_carries_unknown_channel_names() {
        let broker = InMemoryBroker::new();
        let mut subscription = broker.subscribe(&Topic::ALL).await.unwrap();

        broker.publish_raw("websocket-channel", "dropped by the filter");
        broker.publish(Topic::DebugChannel, "kept").await.unwrap();

        assert_eq!(subscription.receive().await.unwrap().payload, "kept");
    }
}
