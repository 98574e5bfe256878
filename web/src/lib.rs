use broker::Broker;
use events::EventPublisher;
use log::*;
use realtime::{ConnectionRegistry, Dispatcher, OriginPolicy};
use sea_orm::DatabaseConnection;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

mod controller;
mod error;
mod params;
mod realtime_handler;
pub mod router;

pub use error::{Error, Result};

/// Web-level state shared by every handler.
///
/// Wraps the infrastructure-only `service::AppState` and adds the realtime
/// collaborators. Cloning is cheap; every field is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub service_state: service::AppState,
    pub event_publisher: Arc<EventPublisher>,
    pub connection_registry: Arc<ConnectionRegistry>,
    pub dispatcher: Dispatcher,
    pub origin_policy: Arc<OriginPolicy>,
}

impl AppState {
    pub fn new(
        service_state: service::AppState,
        event_publisher: Arc<EventPublisher>,
        broker: Arc<dyn Broker>,
        connection_registry: Arc<ConnectionRegistry>,
    ) -> Self {
        let origin_policy = Arc::new(OriginPolicy::new(
            service_state.config.allowed_origins(),
        ));
        Self {
            service_state,
            event_publisher,
            connection_registry,
            dispatcher: Dispatcher::new(broker),
            origin_policy,
        }
    }

    pub fn db_conn_ref(&self) -> &DatabaseConnection {
        self.service_state.db_conn_ref()
    }
}

/// Binds the configured interface and port and serves until `shutdown`
/// resolves. In-flight requests finish; open WebSocket connections are
/// closed by the caller through the connection registry.
pub async fn init_server<F>(app_state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let config = &app_state.service_state.config;
    let host = config.interface.clone().unwrap_or_else(|| "0.0.0.0".to_string());
    let server_url = format!("{host}:{}", config.port);

    let listener = TcpListener::bind(&server_url).await?;
    info!("Server starting... listening for connections on http://{server_url}");

    serve(listener, app_state, shutdown).await
}

/// Serves on an already bound listener. Used directly by integration tests.
pub async fn serve<F>(listener: TcpListener, app_state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router::define_routes(app_state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
