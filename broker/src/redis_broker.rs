//! Redis implementation of the broker bridge.
//!
//! Publishing goes through a shared [`ConnectionManager`], which reconnects on
//! its own. Each subscription owns a dedicated pub/sub connection because a
//! Redis connection in subscriber mode cannot issue other commands.

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use log::*;
use redis::{aio::ConnectionManager, AsyncCommands, Client, Msg};

use crate::{Broker, Error, ErrorKind, InboundMessage, Result, Subscription, Topic};

pub struct RedisBroker {
    client: Client,
    publisher: ConnectionManager,
}

impl RedisBroker {
    /// Connect to Redis.
    ///
    /// # Arguments
    /// * `url` - Redis connection URL (e.g., redis://localhost:6379)
    pub async fn connect(url: &str) -> Result<Self> {
        let client = Client::open(url).map_err(|e| Error::with_source(ErrorKind::Config, e))?;
        let publisher = ConnectionManager::new(client.clone())
            .await
            .map_err(|e| Error::with_source(ErrorKind::Connection, e))?;

        info!("Connected to Redis broker");

        Ok(Self { client, publisher })
    }
}

#[async_trait]
impl Broker for RedisBroker {
    async fn publish(&self, topic: Topic, payload: &str) -> Result<()> {
        let mut conn = self.publisher.clone();

        let receivers: i64 = conn
            .publish(topic.as_str(), payload)
            .await
            .map_err(|e| Error::with_source(ErrorKind::Publish, e))?;

        debug!("Published to {topic} ({receivers} subscriber(s))");
        Ok(())
    }

    async fn subscribe(&self, topics: &[Topic]) -> Result<Box<dyn Subscription>> {
        let mut subscription = RedisSubscription {
            client: self.client.clone(),
            topics: topics.to_vec(),
            stream: None,
        };
        subscription.establish().await?;

        Ok(Box::new(subscription))
    }
}

/// `stream` is `None` after the pub/sub connection dropped; the next receive
/// re-opens it for the same topics.
struct RedisSubscription {
    client: Client,
    topics: Vec<Topic>,
    stream: Option<BoxStream<'static, Msg>>,
}

impl RedisSubscription {
    async fn establish(&mut self) -> Result<()> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| Error::with_source(ErrorKind::Connection, e))?;

        for topic in &self.topics {
            pubsub
                .subscribe(topic.as_str())
                .await
                .map_err(|e| Error::with_source(ErrorKind::Connection, e))?;
        }

        info!("Subscribed to Redis channels {:?}", self.topics);
        self.stream = Some(pubsub.into_on_message().boxed());
        Ok(())
    }
}

#[async_trait]
impl Subscription for RedisSubscription {
    async fn receive(&mut self) -> Result<InboundMessage> {
        if self.stream.is_none() {
            self.establish().await?;
        }

        let Some(stream) = self.stream.as_mut() else {
            return Err(Error::new(ErrorKind::Closed));
        };

        match stream.next().await {
            Some(msg) => {
                let payload: String = msg
                    .get_payload()
                    .map_err(|e| Error::with_source(ErrorKind::Receive, e))?;

                Ok(InboundMessage {
                    topic: msg.get_channel_name().to_string(),
                    payload,
                })
            }
            None => {
                warn!("Redis pub/sub stream ended");
                self.stream = None;
                Err(Error::new(ErrorKind::Closed))
            }
        }
    }
}
