//! Event publisher.

use async_trait::async_trait;
use lapin::options::BasicPublishOptions;
use lapin::types::ShortString;
use lapin::{BasicProperties, Channel, Connection};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::open_connection;
use crate::error::Result;
use crate::port::EventPublisher;

struct Session {
    // Held so the channel's connection stays open.
    _connection: Connection,
    channel: Channel,
}

/// Publishes JSON bodies to a topic exchange, mandatory routing.
pub struct AmqpPublisher {
    url: String,
    exchange: String,
    session: Mutex<Option<Session>>,
}

impl AmqpPublisher {
    /// `url` must already carry credentials. The connection opens on first
    /// publish.
    pub fn new(url: String, exchange: String) -> Self {
        Self {
            url,
            exchange,
            session: Mutex::new(None),
        }
    }

    async fn open(&self) -> Result<Session> {
        let connection = open_connection(&self.url, "proctor-publisher").await?;
        let channel = connection.create_channel().await?;
        info!(exchange = %self.exchange, "Publisher channel open");
        Ok(Session {
            _connection: connection,
            channel,
        })
    }

    async fn send(&self, channel: &Channel, routing_key: &str, body: &[u8]) -> Result<()> {
        let options = BasicPublishOptions {
            mandatory: true,
            ..BasicPublishOptions::default()
        };
        let properties =
            BasicProperties::default().with_content_type(ShortString::from("application/json"));
        channel
            .basic_publish(&self.exchange, routing_key, options, body, properties)
            .await?
            .await?;
        Ok(())
    }
}

#[async_trait]
impl EventPublisher for AmqpPublisher {
    async fn publish(&self, routing_key: &str, body: &[u8]) -> Result<()> {
        let mut guard = self.session.lock().await;
        let session = match guard.take() {
            Some(session) if session.channel.status().connected() => session,
            _ => self.open().await?,
        };

        // A failed session is dropped and reopened on the next publish.
        self.send(&session.channel, routing_key, body).await?;
        debug!(routing_key, bytes = body.len(), "Published");
        *guard = Some(session);
        Ok(())
    }
}
