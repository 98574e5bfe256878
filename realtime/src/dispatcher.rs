use crate::connection::ConnectionId;
use crate::message::InboundFrame;
use axum::extract::ws::Message;
use broker::{Broker, Topic};
use futures::{Stream, StreamExt};
use log::*;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// What happened to one inbound client frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Published(Topic),
    Discarded,
    PublishFailed(Topic),
}

/// Routes inbound client frames to the broker.
///
/// Frames are never written back to the sender directly; a client sees its
/// own message only when the fan-out loop delivers it like any other.
#[derive(Clone)]
pub struct Dispatcher {
    broker: Arc<dyn Broker>,
}

impl Dispatcher {
    pub fn new(broker: Arc<dyn Broker>) -> Self {
        Self { broker }
    }

    pub async fn dispatch(&self, text: &str) -> Dispatch {
        let frame = match InboundFrame::decode(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Discarding client message: {e}");
                return Dispatch::Discarded;
            }
        };

        let topic = frame.topic();
        match self.broker.publish(topic, frame.payload()).await {
            Ok(()) => {
                debug!("Published {} message to {topic}", frame.kind().as_str());
                Dispatch::Published(topic)
            }
            Err(e) => {
                error!("Failed to publish client message to {topic}: {e}");
                Dispatch::PublishFailed(topic)
            }
        }
    }

    /// Reads frames from one connection until it ends or `evicted` is
    /// cancelled, dispatching each in arrival order. Returns the number of
    /// frames dispatched.
    pub async fn run<S>(
        &self,
        connection_id: &ConnectionId,
        mut stream: S,
        evicted: &CancellationToken,
    ) -> usize
    where
        S: Stream<Item = Result<Message, axum::Error>> + Unpin,
    {
        let mut dispatched = 0;

        loop {
            let next = tokio::select! {
                biased;
                _ = evicted.cancelled() => {
                    debug!("Connection {connection_id} evicted; no longer reading");
                    break;
                }
                next = stream.next() => next,
            };
            let Some(next) = next else {
                break;
            };

            let text = match next {
                Ok(Message::Text(text)) => text,
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(_) => {
                        warn!("Discarding non UTF-8 frame from connection {connection_id}");
                        continue;
                    }
                },
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
                Ok(Message::Close(_)) => {
                    debug!("Connection {connection_id} sent close frame");
                    break;
                }
                Err(e) => {
                    debug!("Read error on connection {connection_id}: {e}");
                    break;
                }
            };

            self.dispatch(&text).await;
            dispatched += 1;
        }

        dispatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use broker::{Error as BrokerError, ErrorKind as BrokerErrorKind, InMemoryBroker, Subscription};
    use futures::stream;
    use std::time::Duration;

    struct FailingBroker;

    #[async_trait]
    impl Broker for FailingBroker {
        async fn publish(&self, _topic: Topic, _payload: &str) -> broker::Result<()> {
            Err(BrokerError::new(BrokerErrorKind::Publish))
        }

        async fn subscribe(&self, _topics: &[Topic]) -> broker::Result<Box<dyn Subscription>> {
            Err(BrokerError::new(BrokerErrorKind::Connection))
        }
    }

    async fn next_message(subscription: &mut Box<dyn Subscription>) -> broker::InboundMessage {
        tokio::time::timeout(Duration::from_secs(1), subscription.receive())
            .await
            .expect("no message published")
            .unwrap()
    }

    #[tokio::test]
    async fn debug_frame_publishes_its_text() {
        let broker = Arc::new(InMemoryBroker::new());
        let mut subscription = broker.subscribe(&Topic::ALL).await.unwrap();
        let dispatcher = Dispatcher::new(broker.clone());

        let outcome = dispatcher
            .dispatch(r#"{"type":"debug","content":"ping"}"#)
            .await;

        assert_eq!(outcome, Dispatch::Published(Topic::DebugChannel));
        let message = next_message(&mut subscription).await;
        assert_eq!(message.topic, "debug-channel");
        assert_eq!(message.payload, "ping");
    }

    #[tokio::test]
    async fn reservation_frame_publishes_the_whole_envelope() {
        let broker = Arc::new(InMemoryBroker::new());
        let mut subscription = broker.subscribe(&Topic::ALL).await.unwrap();
        let dispatcher = Dispatcher::new(broker.clone());

        let outcome = dispatcher
            .dispatch(r#"{"type":"reservation_notification","content":"table 4"}"#)
            .await;

        assert_eq!(outcome, Dispatch::Published(Topic::ReservationNotifications));
        let message = next_message(&mut subscription).await;
        assert_eq!(message.topic, "reservation-notifications");
        assert!(message.payload.contains("table 4"));
    }

    #[tokio::test]
    async fn bad_frames_are_discarded_without_publishing() {
        let broker = Arc::new(InMemoryBroker::new());
        let mut subscription = broker.subscribe(&Topic::ALL).await.unwrap();
        let dispatcher = Dispatcher::new(broker.clone());

        for text in ["not json", r#"{"type":"chat"}"#, r#"{"type":"debug"}"#] {
            assert_eq!(dispatcher.dispatch(text).await, Dispatch::Discarded);
        }

        let nothing =
            tokio::time::timeout(Duration::from_millis(50), subscription.receive()).await;
        assert!(nothing.is_err());
    }

    #[tokio::test]
    async fn publish_failure_is_reported_not_raised() {
        let dispatcher = Dispatcher::new(Arc::new(FailingBroker));

        let outcome = dispatcher
            .dispatch(r#"{"type":"debug","content":"ping"}"#)
            .await;

        assert_eq!(outcome, Dispatch::PublishFailed(Topic::DebugChannel));
    }

    #[tokio::test]
    async fn run_keeps_going_after_a_bad_frame_and_stops_at_close() {
        let broker = Arc::new(InMemoryBroker::new());
        let mut subscription = broker.subscribe(&Topic::ALL).await.unwrap();
        let dispatcher = Dispatcher::new(broker.clone());

        let frames = stream::iter(vec![
            Ok(Message::Text("garbage".to_string())),
            Ok(Message::Ping(vec![1])),
            Ok(Message::Binary(br#"{"type":"debug","content":"first"}"#.to_vec())),
            Ok(Message::Text(r#"{"type":"debug","content":"second"}"#.to_string())),
            Ok(Message::Close(None)),
            Ok(Message::Text(r#"{"type":"debug","content":"after close"}"#.to_string())),
        ]);

        let dispatched = dispatcher
            .run(&ConnectionId::new(), frames, &CancellationToken::new())
            .await;

        assert_eq!(dispatched, 3);
        assert_eq!(next_message(&mut subscription).await.payload, "first");
        assert_eq!(next_message(&mut subscription).await.payload, "second");
        let nothing =
            tokio::time::timeout(Duration::from_millis(50), subscription.receive()).await;
        assert!(nothing.is_err());
    }

    #[tokio::test]
    async fn run_stops_on_read_error() {
        let dispatcher = Dispatcher::new(Arc::new(InMemoryBroker::new()));
        let frames = stream::iter(vec![
            Err(axum::Error::new(std::io::Error::other("reset"))),
            Ok(Message::Text(r#"{"type":"debug","content":"x"}"#.to_string())),
        ]);

        assert_eq!(
            dispatcher
                .run(&ConnectionId::new(), frames, &CancellationToken::new())
                .await,
            0
        );
    }

    #[tokio::test]
    async fn run_stops_reading_once_evicted() {
        let broker = Arc::new(InMemoryBroker::new());
        let mut subscription = broker.subscribe(&Topic::ALL).await.unwrap();
        let dispatcher = Dispatcher::new(broker.clone());
        let evicted = CancellationToken::new();
        evicted.cancel();

        let frames = stream::iter(vec![Ok(Message::Text(
            r#"{"type":"debug","content":"late"}"#.to_string(),
        ))]);

        assert_eq!(dispatcher.run(&ConnectionId::new(), frames, &evicted).await, 0);
        let nothing =
            tokio::time::timeout(Duration::from_millis(50), subscription.receive()).await;
        assert!(nothing.is_err());
    }
}
