use crate::error::{TransportError, TransportErrorKind};
use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use futures::SinkExt;
use log::*;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Write half of one client connection.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send_text(&self, text: &str) -> Result<(), TransportError>;

    /// Best effort; errors are logged, not returned.
    async fn close(&self);
}

/// [`MessageSink`] over the write half of an axum WebSocket.
pub struct WebSocketSink {
    inner: Mutex<SplitSink<WebSocket, Message>>,
    closed: AtomicBool,
}

impl WebSocketSink {
    pub fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self {
            inner: Mutex::new(sink),
            closed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl MessageSink for WebSocketSink {
    async fn send_text(&self, text: &str) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::new(TransportErrorKind::Closed));
        }
        self.inner
            .lock()
            .await
            .send(Message::Text(text.to_string()))
            .await
            .map_err(|e| TransportError::with_source(TransportErrorKind::Write, e))
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        let mut sink = self.inner.lock().await;
        if let Err(e) = sink.send(Message::Close(None)).await {
            debug!("Failed to send close frame: {e}");
        }
        if let Err(e) = sink.close().await {
            debug!("Failed to close WebSocket sink: {e}");
        }
    }
}

/// Outcome of one [`ConnectionRegistry::broadcast`] pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub removed: Vec<ConnectionId>,
}

/// A registered connection: its write half and the token that ends its
/// session once the registry evicts it.
struct Member {
    sink: Arc<dyn MessageSink>,
    evicted: CancellationToken,
}

impl Member {
    /// Stops the member's session and closes its sink off the caller's task.
    fn evict(self, write_timeout: Duration) {
        self.evicted.cancel();
        tokio::spawn(async move {
            if tokio::time::timeout(write_timeout, self.sink.close())
                .await
                .is_err()
            {
                debug!("Close of evicted connection timed out");
            }
        });
    }
}

/// The set of live realtime connections.
///
/// Membership is guarded by a single async mutex. A broadcast holds it for
/// the whole pass, so every member present at the start of a pass gets
/// exactly one write attempt and `add`/`remove` wait until the pass is over.
/// Each write is bounded by `write_timeout`; a failed or timed-out member is
/// removed before the lock is released and its session is cancelled.
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, Member>>,
    write_timeout: Duration,
}

impl ConnectionRegistry {
    pub fn new(write_timeout: Duration) -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            write_timeout,
        }
    }

    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    /// Registers `sink` and returns the token cancelled when the registry
    /// evicts it. Returns `None` if `connection_id` was already registered;
    /// the existing sink is kept.
    pub async fn add(
        &self,
        connection_id: ConnectionId,
        sink: Arc<dyn MessageSink>,
    ) -> Option<CancellationToken> {
        let mut connections = self.connections.lock().await;
        if connections.contains_key(&connection_id) {
            return None;
        }
        let evicted = CancellationToken::new();
        connections.insert(
            connection_id,
            Member {
                sink,
                evicted: evicted.clone(),
            },
        );
        Some(evicted)
    }

    /// Returns `false` if `connection_id` was not registered.
    pub async fn remove(&self, connection_id: &ConnectionId) -> bool {
        self.connections.lock().await.remove(connection_id).is_some()
    }

    pub async fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.connections.lock().await.contains_key(connection_id)
    }

    pub async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Sends `text` to every member, removing those whose write fails.
    pub async fn broadcast(&self, text: &str) -> BroadcastReport {
        let mut connections = self.connections.lock().await;
        let mut report = BroadcastReport::default();

        for (connection_id, member) in connections.iter() {
            let written = tokio::time::timeout(self.write_timeout, member.sink.send_text(text))
                .await
                .unwrap_or_else(|_| Err(TransportError::new(TransportErrorKind::Timeout)));

            match written {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!("WebSocket write error on connection {connection_id}: {e}");
                    report.removed.push(connection_id.clone());
                }
            }
        }

        for connection_id in &report.removed {
            if let Some(member) = connections.remove(connection_id) {
                // Closing can block on the same stalled client; keep it off the lock.
                member.evict(self.write_timeout);
            }
        }

        report
    }

    /// Deregisters and closes every member. Used on shutdown.
    pub async fn close_all(&self) -> usize {
        let drained: Vec<_> = self.connections.lock().await.drain().collect();
        let count = drained.len();

        for (connection_id, member) in drained {
            debug!("Closing connection {connection_id}");
            member.evicted.cancel();
            if tokio::time::timeout(self.write_timeout, member.sink.close())
                .await
                .is_err()
            {
                warn!("Timed out closing connection {connection_id}");
            }
        }

        count
    }
}
