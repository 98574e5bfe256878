use broker::{Broker, InMemoryBroker, RedisBroker};
use events::EventPublisher;
use log::*;
use realtime::{BrokerEventHandler, ConnectionRegistry, FanoutLoop};
use service::config::{BrokerBackend, Config};
use service::logging::Logger;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    let config = Config::new();

    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to initialize logger: {e}");
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    info!(
        "Starting up Reservation Platform in {} mode",
        config.runtime_env()
    );

    let broker = match connect_broker(&config).await {
        Ok(broker) => broker,
        Err(e) => {
            error!("Failed to connect to message broker: {e}");
            std::process::exit(1);
        }
    };

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    let registry = Arc::new(ConnectionRegistry::new(config.broadcast_write_timeout()));
    let event_publisher = Arc::new(
        EventPublisher::new().with_handler(Arc::new(BrokerEventHandler::new(broker.clone()))),
    );

    let shutdown = CancellationToken::new();
    let fanout = FanoutLoop::new(broker.clone(), registry.clone(), config.broker_retry_delay())
        .spawn(shutdown.clone());

    let service_state = service::AppState::new(config, &db);
    let app_state = web::AppState::new(service_state, event_publisher, broker, registry.clone());

    let server_shutdown = {
        let shutdown = shutdown.clone();
        let registry = registry.clone();
        async move {
            web::shutdown_signal().await;
            shutdown.cancel();
            let closed = registry.close_all().await;
            info!("Closed {closed} realtime connection(s)");
        }
    };

    if let Err(e) = web::init_server(app_state, server_shutdown).await {
        error!("Server error: {e}");
        shutdown.cancel();
        registry.close_all().await;
    }

    if let Err(e) = fanout.await {
        error!("Fan-out loop ended abnormally: {e}");
    }

    info!("Shutdown complete");
}

async fn connect_broker(config: &Config) -> broker::Result<Arc<dyn Broker>> {
    match config.broker {
        BrokerBackend::Redis => {
            let redis_url = config.redis_url().ok_or_else(|| {
                broker::Error::new(broker::ErrorKind::Config)
            })?;
            info!("Connecting to Redis broker");
            Ok(Arc::new(RedisBroker::connect(&redis_url).await?))
        }
        BrokerBackend::InMemory => {
            warn!("Using the in-memory broker; realtime events stay within this process");
            Ok(Arc::new(InMemoryBroker::new()))
        }
    }
}
