use crate::connection::{BroadcastReport, ConnectionRegistry};
use crate::message::{Envelope, EventKind};
use broker::{Broker, InboundMessage, Subscription, Topic};
use log::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// The single long-running task that relays broker messages to every
/// registered connection.
///
/// Relay is sequential: the next message is not received until the previous
/// broadcast pass has finished, so every client sees messages in the order
/// the broker delivered them.
pub struct FanoutLoop {
    broker: Arc<dyn Broker>,
    registry: Arc<ConnectionRegistry>,
    retry_delay: Duration,
}

impl FanoutLoop {
    pub fn new(
        broker: Arc<dyn Broker>,
        registry: Arc<ConnectionRegistry>,
        retry_delay: Duration,
    ) -> Self {
        Self {
            broker,
            registry,
            retry_delay,
        }
    }

    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }

    /// Runs until `shutdown` is cancelled. Broker errors are logged and
    /// retried after `retry_delay`; they never end the loop.
    pub async fn run(&self, shutdown: CancellationToken) {
        let Some(mut subscription) = self.subscribe(&shutdown).await else {
            info!("Fan-out loop cancelled before subscribing");
            return;
        };
        info!("Fan-out loop subscribed to {:?}", Topic::ALL.map(|t| t.as_str()));

        loop {
            let received = tokio::select! {
                _ = shutdown.cancelled() => break,
                received = subscription.receive() => received,
            };

            match received {
                Ok(message) => {
                    self.relay(&message).await;
                }
                Err(e) => {
                    warn!(
                        "Error receiving broker message: {e}; retrying in {:?}",
                        self.retry_delay
                    );
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.retry_delay) => {}
                    }
                }
            }
        }

        info!("Fan-out loop stopped");
    }

    async fn subscribe(&self, shutdown: &CancellationToken) -> Option<Box<dyn Subscription>> {
        loop {
            let attempt = tokio::select! {
                _ = shutdown.cancelled() => return None,
                attempt = self.broker.subscribe(&Topic::ALL) => attempt,
            };

            match attempt {
                Ok(subscription) => return Some(subscription),
                Err(e) => {
                    error!(
                        "Failed to subscribe to broker: {e}; retrying in {:?}",
                        self.retry_delay
                    );
                    tokio::select! {
                        _ = shutdown.cancelled() => return None,
                        _ = tokio::time::sleep(self.retry_delay) => {}
                    }
                }
            }
        }
    }

    /// Wraps one broker message in an [`Envelope`] and broadcasts it.
    /// Messages on channels outside [`Topic::ALL`] are skipped.
    pub async fn relay(&self, message: &InboundMessage) -> Option<BroadcastReport> {
        let Some(topic) = Topic::from_name(&message.topic) else {
            warn!("Unknown topic: {}", message.topic);
            return None;
        };

        let envelope = Envelope::new(EventKind::from_topic(topic), message.payload.clone());
        let frame = match envelope.to_json() {
            Ok(frame) => frame,
            Err(e) => {
                error!("Failed to serialize {topic} envelope: {e}");
                return None;
            }
        };

        let report = self.registry.broadcast(&frame).await;
        debug!(
            "Relayed {topic} message to {} connection(s), dropped {}",
            report.delivered,
            report.removed.len()
        );
        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::tests::RecordingSink;
    use crate::connection::ConnectionId;
    use async_trait::async_trait;
    use broker::{Error as BrokerError, ErrorKind as BrokerErrorKind, InMemoryBroker};
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    const RETRY: Duration = Duration::from_millis(10);

    fn registry() -> Arc<ConnectionRegistry> {
        Arc::new(ConnectionRegistry::new(Duration::from_millis(100)))
    }

    async fn wait_for_frames(sink: &RecordingSink, count: usize) -> Vec<Value> {
        for _ in 0..200 {
            let frames = sink.frames();
            if frames.len() >= count {
                return frames
                    .iter()
                    .map(|f| serde_json::from_str(f).unwrap())
                    .collect();
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("expected {count} frames, got {:?}", sink.frames());
    }

    async fn wait_for_subscriber(broker: &InMemoryBroker) {
        for _ in 0..200 {
            if broker.subscriber_count() > 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("fan-out loop never subscribed");
    }

    #[tokio::test]
    async fn relay_wraps_payload_in_an_envelope() {
        let registry = registry();
        let sink = Arc::new(RecordingSink::default());
        registry.add(ConnectionId::new(), sink.clone()).await;
        let fanout = FanoutLoop::new(Arc::new(InMemoryBroker::new()), registry, RETRY);

        let report = fanout
            .relay(&InboundMessage {
                topic: "reservation-notifications".to_string(),
                payload: "New reservation created for user 7".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(report.delivered, 1);
        let frame: Value = serde_json::from_str(&sink.frames()[0]).unwrap();
        assert_eq!(
            frame,
            json!({
                "type": "reservation_notification",
                "content": "New reservation created for user 7"
            })
        );
    }

    #[tokio::test]
    async fn relay_skips_unknown_topics() {
        let registry = registry();
        let sink = Arc::new(RecordingSink::default());
        registry.add(ConnectionId::new(), sink.clone()).await;
        let fanout = FanoutLoop::new(Arc::new(InMemoryBroker::new()), registry, RETRY);

        let report = fanout
            .relay(&InboundMessage {
                topic: "websocket-channel".to_string(),
                payload: "hello".to_string(),
            })
            .await;

        assert!(report.is_none());
        assert!(sink.frames().is_empty());
    }

    #[tokio::test]
    async fn delivers_in_publish_order_and_stops_on_shutdown() {
        let broker = Arc::new(InMemoryBroker::new());
        let registry = registry();
        let sinks: Vec<Arc<RecordingSink>> =
            (0..3).map(|_| Arc::new(RecordingSink::default())).collect();
        for sink in &sinks {
            registry.add(ConnectionId::new(), sink.clone()).await;
        }

        let shutdown = CancellationToken::new();
        let handle =
            FanoutLoop::new(broker.clone(), registry.clone(), RETRY).spawn(shutdown.clone());
        wait_for_subscriber(&broker).await;

        broker.publish(Topic::DebugChannel, "one").await.unwrap();
        broker.publish(Topic::ReservationNotifications, "two").await.unwrap();
        broker.publish(Topic::DebugChannel, "three").await.unwrap();

        let expected = vec![
            json!({"type": "debug", "content": "one"}),
            json!({"type": "reservation_notification", "content": "two"}),
            json!({"type": "debug", "content": "three"}),
        ];
        for sink in &sinks {
            assert_eq!(wait_for_frames(sink, 3).await, expected);
        }

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("fan-out loop did not stop")
            .unwrap();
        assert_eq!(broker.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn unknown_channel_does_not_stop_the_loop() {
        let broker = Arc::new(InMemoryBroker::new());
        let registry = registry();
        let sink = Arc::new(RecordingSink::default());
        registry.add(ConnectionId::new(), sink.clone()).await;

        let shutdown = CancellationToken::new();
        let handle =
            FanoutLoop::new(broker.clone(), registry.clone(), RETRY).spawn(shutdown.clone());
        wait_for_subscriber(&broker).await;

        broker.publish_raw("websocket-channel", "ignored");
        broker.publish(Topic::DebugChannel, "kept").await.unwrap();

        let frames = wait_for_frames(&sink, 1).await;
        assert_eq!(frames, vec![json!({"type": "debug", "content": "kept"})]);

        shutdown.cancel();
        handle.await.unwrap();
    }

    /// Subscription that replays a script of results, then waits forever.
    struct ScriptedSubscription {
        script: VecDeque<broker::Result<InboundMessage>>,
    }

    #[async_trait]
    impl Subscription for ScriptedSubscription {
        async fn receive(&mut self) -> broker::Result<InboundMessage> {
            match self.script.pop_front() {
                Some(next) => next,
                None => futures::future::pending().await,
            }
        }
    }

    /// Broker that fails the first `failures` subscribe calls.
    struct FlakyBroker {
        failures: AtomicUsize,
        attempts: AtomicUsize,
        script: StdMutex<Option<VecDeque<broker::Result<InboundMessage>>>>,
    }

    #[async_trait]
    impl Broker for FlakyBroker {
        async fn publish(&self, _topic: Topic, _payload: &str) -> broker::Result<()> {
            Ok(())
        }

        async fn subscribe(&self, _topics: &[Topic]) -> broker::Result<Box<dyn Subscription>> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(BrokerError::new(BrokerErrorKind::Connection));
            }
            let script = self.script.lock().unwrap().take().unwrap_or_default();
            Ok(Box::new(ScriptedSubscription { script }))
        }
    }

    fn message(topic: Topic, payload: &str) -> broker::Result<InboundMessage> {
        Ok(InboundMessage {
            topic: topic.as_str().to_string(),
            payload: payload.to_string(),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn retries_subscribe_and_survives_receive_errors() {
        let broker = Arc::new(FlakyBroker {
            failures: AtomicUsize::new(2),
            attempts: AtomicUsize::new(0),
            script: StdMutex::new(Some(VecDeque::from(vec![
                message(Topic::DebugChannel, "before"),
                Err(BrokerError::new(BrokerErrorKind::Receive)),
                Err(BrokerError::new(BrokerErrorKind::Closed)),
                message(Topic::DebugChannel, "after"),
            ]))),
        });
        let registry = registry();
        let sink = Arc::new(RecordingSink::default());
        registry.add(ConnectionId::new(), sink.clone()).await;

        let shutdown = CancellationToken::new();
        let handle =
            FanoutLoop::new(broker.clone(), registry.clone(), RETRY).spawn(shutdown.clone());

        let frames = wait_for_frames(&sink, 2).await;
        assert_eq!(frames[0]["content"], "before");
        assert_eq!(frames[1]["content"], "after");
        assert_eq!(broker.attempts.load(Ordering::SeqCst), 3);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_subscribe_retries() {
        let broker = Arc::new(FlakyBroker {
            failures: AtomicUsize::new(usize::MAX),
            attempts: AtomicUsize::new(0),
            script: StdMutex::new(None),
        });

        let shutdown = CancellationToken::new();
        let handle = FanoutLoop::new(broker.clone(), registry(), RETRY).spawn(shutdown.clone());
        tokio::time::sleep(RETRY * 5).await;
        shutdown.cancel();

        handle.await.unwrap();
        assert!(broker.attempts.load(Ordering::SeqCst) >= 2);
    }
}
