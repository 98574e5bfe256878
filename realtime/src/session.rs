use crate::connection::{ConnectionId, ConnectionRegistry, MessageSink, WebSocketSink};
use crate::dispatcher::Dispatcher;
use axum::extract::ws::{Message, WebSocket};
use futures::{Stream, StreamExt};
use log::*;
use std::sync::Arc;

/// Serves one upgraded WebSocket until the client goes away.
pub async fn serve(
    socket: WebSocket,
    registry: Arc<ConnectionRegistry>,
    dispatcher: Dispatcher,
) -> ConnectionId {
    let connection_id = ConnectionId::new();
    let (sink, stream) = socket.split();
    let sink: Arc<dyn MessageSink> = Arc::new(WebSocketSink::new(sink));

    run_session(connection_id.clone(), sink, stream, registry, dispatcher).await;
    connection_id
}

/// Registers the connection, dispatches its frames until it ends or the
/// registry evicts it, then deregisters and closes it.
///
/// Deregistration happens on every exit path, including a panic in the
/// read loop.
pub async fn run_session<S>(
    connection_id: ConnectionId,
    sink: Arc<dyn MessageSink>,
    stream: S,
    registry: Arc<ConnectionRegistry>,
    dispatcher: Dispatcher,
) where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let Some(evicted) = registry.add(connection_id.clone(), sink.clone()).await else {
        warn!("Connection {connection_id} is already registered");
        return;
    };
    info!(
        "Client connected: {connection_id} ({} active)",
        registry.len().await
    );

    let mut guard = RegistrationGuard::new(connection_id.clone(), registry.clone());
    let dispatched = dispatcher.run(&connection_id, stream, &evicted).await;
    guard.disarm();

    if !registry.remove(&connection_id).await {
        debug!("Connection {connection_id} was already evicted");
    }
    if tokio::time::timeout(registry.write_timeout(), sink.close())
        .await
        .is_err()
    {
        warn!("Timed out closing connection {connection_id}");
    }
    info!(
        "Client disconnected: {connection_id} after {dispatched} message(s) ({} active)",
        registry.len().await
    );
}

/// Removes a connection from the registry if its session unwinds before
/// reaching the normal teardown.
struct RegistrationGuard {
    connection_id: ConnectionId,
    registry: Arc<ConnectionRegistry>,
    armed: bool,
}

impl RegistrationGuard {
    fn new(connection_id: ConnectionId, registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            connection_id,
            registry,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let connection_id = self.connection_id.clone();
        let registry = self.registry.clone();
        // Drop cannot await; hand the removal to the runtime if one is still running.
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                if registry.remove(&connection_id).await {
                    warn!("Connection {connection_id} removed after abnormal session exit");
                }
            });
        }
    }
}
