use async_trait::async_trait;
use broker::{Broker, Topic};
use events::{DomainEvent, EventHandler};
use log::*;
use std::sync::Arc;

/// Forwards domain events to the broker so that every realtime client,
/// in this process or any other, receives them.
///
/// Only the event's human readable message is published; the fan-out loop
/// wraps it in a `reservation_notification` envelope on the way out.
pub struct BrokerEventHandler {
    broker: Arc<dyn Broker>,
}

impl BrokerEventHandler {
    pub fn new(broker: Arc<dyn Broker>) -> Self {
        Self { broker }
    }
}

#[async_trait]
impl EventHandler for BrokerEventHandler {
    async fn handle(&self, event: &DomainEvent) {
        let topic = Topic::ReservationNotifications;
        debug!("Forwarding {} event to {topic}", event.name());

        // The write behind the event already committed; a lost notification
        // is only logged.
        if let Err(e) = self.broker.publish(topic, event.message()).await {
            warn!("Failed to publish {} event to {topic}: {e}", event.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broker::{Error as BrokerError, ErrorKind as BrokerErrorKind, InMemoryBroker, Subscription};
    use events::EventPublisher;
    use serde_json::json;
    use std::time::Duration;
    use uuid::Uuid;

    struct DownBroker;

    #[async_trait]
    impl Broker for DownBroker {
        async fn publish(&self, _topic: Topic, _payload: &str) -> broker::Result<()> {
            Err(BrokerError::new(BrokerErrorKind::Connection))
        }

        async fn subscribe(&self, _topics: &[Topic]) -> broker::Result<Box<dyn Subscription>> {
            Err(BrokerError::new(BrokerErrorKind::Connection))
        }
    }

    fn reservation_created(user_id: Uuid) -> DomainEvent {
        DomainEvent::ReservationCreated {
            user_id,
            reservation: json!({"num_people": 2}),
            message: format!("New reservation created for user {user_id}"),
        }
    }

    #[tokio::test]
    async fn event_message_is_published_to_reservation_notifications() {
        let broker = Arc::new(InMemoryBroker::new());
        let mut subscription = broker.subscribe(&Topic::ALL).await.unwrap();
        let publisher =
            EventPublisher::new().with_handler(Arc::new(BrokerEventHandler::new(broker.clone())));
        let user_id = Uuid::new_v4();

        publisher.publish(reservation_created(user_id)).await;

        let message = tokio::time::timeout(Duration::from_secs(1), subscription.receive())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message.topic, "reservation-notifications");
        assert_eq!(
            message.payload,
            format!("New reservation created for user {user_id}")
        );
    }

    #[tokio::test]
    async fn broker_failure_does_not_propagate() {
        let handler = BrokerEventHandler::new(Arc::new(DownBroker));

        // Completes without panicking.
        handler.handle(&reservation_created(Uuid::new_v4())).await;
    }
}
