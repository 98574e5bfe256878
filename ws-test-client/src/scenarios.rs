use crate::api_client::ApiClient;
use crate::output::TestResult;
use crate::ws_client::Connection;
use anyhow::Result;
use colored::*;
use std::time::{Duration, Instant};

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

fn result(scenario: &str, started: Instant, outcome: Result<String>) -> TestResult {
    match outcome {
        Ok(message) => {
            println!("{} {}", "✓".green(), message);
            TestResult {
                scenario: scenario.to_string(),
                passed: true,
                message: None,
                duration: started.elapsed(),
            }
        }
        Err(e) => {
            println!("{} {}", "✗".red(), e);
            TestResult {
                scenario: scenario.to_string(),
                passed: false,
                message: Some(e.to_string()),
                duration: started.elapsed(),
            }
        }
    }
}

/// Both clients receive a debug frame sent by the first one, sender included.
pub async fn test_debug_loopback(conn1: &mut Connection, conn2: &mut Connection) -> TestResult {
    println!("\n{} Debug loopback", "→".blue());
    let started = Instant::now();
    let marker = format!("ping-{}", uuid::Uuid::new_v4());

    let outcome = async {
        conn1.send_debug(&marker).await?;
        conn1
            .wait_for_event("debug", EVENT_TIMEOUT, |c| c == marker.as_str())
            .await?;
        conn2
            .wait_for_event("debug", EVENT_TIMEOUT, |c| c == marker.as_str())
            .await?;
        Ok::<_, anyhow::Error>(format!(
            "{} and {} both received {}",
            conn1.label, conn2.label, marker
        ))
    }
    .await;

    result("debug-loopback", started, outcome)
}

/// A malformed frame is dropped and the connection keeps working.
pub async fn test_malformed_frame(conn1: &mut Connection, conn2: &mut Connection) -> TestResult {
    println!("\n{} Malformed frame", "→".blue());
    let started = Instant::now();
    let marker = format!("after-garbage-{}", uuid::Uuid::new_v4());

    let outcome = async {
        conn1.send_raw("this is not json").await?;
        conn1.send_raw(r#"{"type":"chat","content":"x"}"#).await?;
        conn1.send_debug(&marker).await?;
        conn2
            .wait_for_event("debug", EVENT_TIMEOUT, |c| c == marker.as_str())
            .await?;
        Ok::<_, anyhow::Error>(format!("{} still connected after bad frames", conn1.label))
    }
    .await;

    result("malformed-frame", started, outcome)
}

/// Creating a reservation over REST pushes a notification to every client.
pub async fn test_reservation_notification(
    api_client: &ApiClient,
    user_id: &str,
    conn1: &mut Connection,
    conn2: &mut Connection,
) -> TestResult {
    println!("\n{} Reservation notification", "→".blue());
    let started = Instant::now();
    let expected = format!("New reservation created for user {user_id}");

    let outcome = async {
        let reservation = api_client
            .create_reservation(user_id, 2, "window seat")
            .await?;
        println!(
            "{} Reservation created (ID: {})",
            "✓".green(),
            reservation["id"].as_str().unwrap_or("?")
        );

        for conn in [conn1, conn2] {
            let event = conn
                .wait_for_event("reservation_notification", EVENT_TIMEOUT, |c| {
                    c == expected.as_str()
                })
                .await?;
            println!(
                "{} {} notified after {}ms",
                "✓".green(),
                conn.label,
                event.timestamp.duration_since(started).as_millis()
            );
        }
        Ok::<_, anyhow::Error>(expected.clone())
    }
    .await;

    result("reservation-notification", started, outcome)
}
