use anyhow::{Context, Result};
use futures_util::stream::{SplitSink, StreamExt};
use futures_util::SinkExt;
use log::*;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

#[derive(Debug, Clone)]
pub struct Event {
    pub event_type: String,
    pub content: Value,
    pub timestamp: Instant,
}

pub struct Connection {
    pub label: String,
    sink: WsSink,
    event_rx: mpsc::UnboundedReceiver<Event>,
    _handle: tokio::task::JoinHandle<()>,
}

impl Connection {
    pub async fn establish(ws_url: &str, origin: &str, label: String) -> Result<Self> {
        let mut request = ws_url
            .into_client_request()
            .context("Invalid WebSocket URL")?;
        request
            .headers_mut()
            .insert("Origin", HeaderValue::from_str(origin)?);

        let (socket, _response) = tokio_tungstenite::connect_async(request)
            .await
            .with_context(|| format!("Failed to connect to {ws_url}"))?;
        let (sink, mut stream) = socket.split();
        let (tx, rx) = mpsc::unbounded_channel();

        let task_label = label.clone();
        let handle = tokio::spawn(async move {
            loop {
                match stream.next().await {
                    Some(Ok(Message::Text(text))) => {
                        let Ok(frame) = serde_json::from_str::<Value>(&text) else {
                            warn!("Non JSON frame for {}: {}", task_label, text);
                            continue;
                        };
                        let event = Event {
                            event_type: frame["type"].as_str().unwrap_or_default().to_string(),
                            content: frame["content"].clone(),
                            timestamp: Instant::now(),
                        };

                        if tx.send(event).is_err() {
                            debug!("WebSocket receiver dropped for {}", task_label);
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket stream ended for {}", task_label);
                        break;
                    }
                    Some(Ok(_)) => {
                        // Ping/pong and binary frames carry no events
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", task_label, e);
                        break;
                    }
                }
            }
        });

        Ok(Self {
            label,
            sink,
            event_rx: rx,
            _handle: handle,
        })
    }

    pub async fn send_debug(&mut self, content: &str) -> Result<()> {
        let frame = json!({ "type": "debug", "content": content });
        self.sink
            .send(Message::Text(frame.to_string()))
            .await
            .context("Failed to send debug frame")
    }

    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.sink
            .send(Message::Text(text.to_string()))
            .await
            .context("Failed to send frame")
    }

    /// Waits for a frame of `event_type` whose content satisfies `matches`.
    pub async fn wait_for_event<F>(
        &mut self,
        event_type: &str,
        timeout: Duration,
        matches: F,
    ) -> Result<Event>
    where
        F: Fn(&Value) -> bool,
    {
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                anyhow::bail!("Timeout waiting for event: {}", event_type);
            }

            match tokio::time::timeout(remaining, self.event_rx.recv()).await {
                Ok(Some(event)) if event.event_type == event_type && matches(&event.content) => {
                    return Ok(event);
                }
                Ok(Some(_)) => {
                    // Unrelated event, keep waiting
                    continue;
                }
                Ok(None) => {
                    anyhow::bail!("WebSocket connection closed");
                }
                Err(_) => {
                    anyhow::bail!("Timeout waiting for event: {}", event_type);
                }
            }
        }
    }

    pub async fn close(mut self) -> Result<()> {
        self.sink
            .close()
            .await
            .context("Failed to close WebSocket")
    }
}
