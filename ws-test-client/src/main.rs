use anyhow::Result;
use clap::Parser;
use colored::*;

mod api_client;
mod output;
mod scenarios;
mod ws_client;

use api_client::ApiClient;
use output::print_test_summary;
use ws_client::Connection;

#[derive(Parser)]
#[command(name = "ws-test-client")]
#[command(about = "Realtime WebSocket Integration Testing Tool")]
struct Cli {
    /// Base URL of the backend (e.g., http://localhost:4000)
    #[arg(long)]
    base_url: String,

    /// Origin header sent on the WebSocket upgrade; must be in ALLOWED_ORIGINS
    #[arg(long, default_value = "http://localhost:3000")]
    origin: String,

    /// Existing user to create reservations for (e.g., the seeded demo user)
    #[arg(long)]
    user_id: Option<String>,

    /// Test scenario to run
    #[arg(long, value_enum)]
    scenario: ScenarioChoice,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

#[derive(clap::ValueEnum, Clone)]
enum ScenarioChoice {
    /// Debug frames are delivered to every client, sender included
    DebugLoopback,
    /// Bad frames are discarded without closing the connection
    MalformedFrame,
    /// Creating a reservation pushes a notification (requires --user-id)
    ReservationNotification,
    /// Run every scenario
    All,
}

fn ws_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}/ws")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}/ws")
    } else {
        format!("{base}/ws")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    }

    println!("{}", "=== SETUP PHASE ===".bright_white().bold());

    let needs_user = matches!(
        cli.scenario,
        ScenarioChoice::ReservationNotification | ScenarioChoice::All
    );
    let user_id = match (&cli.user_id, needs_user) {
        (Some(user_id), _) => Some(user_id.clone()),
        (None, true) => anyhow::bail!("--user-id is required for this scenario"),
        (None, false) => None,
    };

    let api_client = ApiClient::new(reqwest::Client::new(), cli.base_url.clone());
    println!("{} Checking backend health...", "→".blue());
    api_client.health_check().await?;
    println!("{} Backend is healthy", "✓".green());

    println!("\n{} Establishing WebSocket connections...", "→".blue());
    let url = ws_url(&cli.base_url);
    let mut conn1 = Connection::establish(&url, &cli.origin, "Client 1".to_string()).await?;
    let mut conn2 = Connection::establish(&url, &cli.origin, "Client 2".to_string()).await?;
    println!("{} Client 1 connected to {}", "✓".green(), url);
    println!("{} Client 2 connected to {}", "✓".green(), url);

    println!("\n{}", "=== TEST PHASE ===".bright_white().bold());

    let mut results = Vec::new();

    match cli.scenario {
        ScenarioChoice::DebugLoopback => {
            results.push(scenarios::test_debug_loopback(&mut conn1, &mut conn2).await);
        }
        ScenarioChoice::MalformedFrame => {
            results.push(scenarios::test_malformed_frame(&mut conn1, &mut conn2).await);
        }
        ScenarioChoice::ReservationNotification => {
            if let Some(user_id) = &user_id {
                results.push(
                    scenarios::test_reservation_notification(
                        &api_client,
                        user_id,
                        &mut conn1,
                        &mut conn2,
                    )
                    .await,
                );
            }
        }
        ScenarioChoice::All => {
            results.push(scenarios::test_debug_loopback(&mut conn1, &mut conn2).await);
            results.push(scenarios::test_malformed_frame(&mut conn1, &mut conn2).await);
            if let Some(user_id) = &user_id {
                results.push(
                    scenarios::test_reservation_notification(
                        &api_client,
                        user_id,
                        &mut conn1,
                        &mut conn2,
                    )
                    .await,
                );
            }
        }
    }

    conn1.close().await?;
    conn2.close().await?;

    println!("\n{}", "=== RESULTS ===".bright_white().bold());
    print_test_summary(&results);

    let all_passed = results.iter().all(|r| r.passed);

    if all_passed {
        println!("\n{}", "All tests passed! ✓".bright_green().bold());
    } else {
        println!("\n{}", "Some tests failed! ✗".bright_red().bold());
    }

    std::process::exit(if all_passed { 0 } else { 1 });
}
