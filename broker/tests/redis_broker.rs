//! Redis broker integration tests.
//!
//! Run with: cargo test -p broker --test redis_broker -- --ignored --nocapture
//!
//! Requires: REDIS_URL env var or Redis on localhost:6379

use broker::{Broker, RedisBroker, Topic};
use std::time::Duration;

fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
}

#[tokio::test]
#[ignore = "requires running Redis instance"]
async fn test_publish_reaches_subscriber_in_order() {
    let broker = RedisBroker::connect(&redis_url())
        .await
        .expect("Failed to connect to Redis");

    let mut subscription = broker
        .subscribe(&Topic::ALL)
        .await
        .expect("Failed to subscribe");

    // Unique payload prefix so concurrent runs against the same Redis don't collide.
    let run = uuid::Uuid::new_v4().to_string();
    for i in 0..3 {
        broker
            .publish(Topic::ReservationNotifications, &format!("{run}-{i}"))
            .await
            .expect("Failed to publish");
    }

    let mut received = Vec::new();
    while received.len() < 3 {
        let message = tokio::time::timeout(Duration::from_secs(5), subscription.receive())
            .await
            .expect("Timed out waiting for message")
            .expect("Receive failed");

        if message.payload.starts_with(&run) {
            assert_eq!(message.topic, "reservation-notifications");
            received.push(message.payload);
        }
    }

    assert_eq!(
        received,
        vec![format!("{run}-0"), format!("{run}-1"), format!("{run}-2")]
    );
}

#[tokio::test]
async fn test_connect_rejects_an_unparseable_url() {
    let err = match RedisBroker::connect("not a url").await {
        Ok(_) => panic!("expected a config error"),
        Err(err) => err,
    };

    assert_eq!(err.kind(), broker::ErrorKind::Config);
}
