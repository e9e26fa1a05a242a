//! Queue consumer.

use async_trait::async_trait;
use futures_util::StreamExt;
use lapin::message::Delivery;
use lapin::options::{BasicAckOptions, BasicConsumeOptions, BasicNackOptions};
use lapin::types::FieldTable;
use lapin::{acker::Acker, Channel, Connection, Consumer};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::open_connection;
use crate::error::Result;
use crate::port::{AckHandle, ChannelEvent, InboundMessage, MessageSource};

struct AmqpAck(Acker);

#[async_trait]
impl AckHandle for AmqpAck {
    async fn ack(&self) -> Result<()> {
        self.0.ack(BasicAckOptions::default()).await?;
        Ok(())
    }

    async fn requeue(&self) -> Result<()> {
        let options = BasicNackOptions {
            requeue: true,
            ..BasicNackOptions::default()
        };
        self.0.nack(options).await?;
        Ok(())
    }
}

struct Session {
    connection: Connection,
    channel: Channel,
    consumer: Consumer,
    /// Fed by the connection's error callback.
    closed: mpsc::UnboundedReceiver<String>,
}

/// Consumes one queue with manual acknowledgement.
pub struct AmqpSource {
    url: String,
    queue: String,
    consumer_tag: String,
    session: Option<Session>,
}

impl AmqpSource {
    /// `url` must already carry credentials.
    pub fn new(url: String, queue: String, consumer_tag: String) -> Self {
        Self {
            url,
            queue,
            consumer_tag,
            session: None,
        }
    }

    fn into_message(delivery: Delivery) -> InboundMessage {
        let Delivery {
            routing_key,
            data,
            acker,
            ..
        } = delivery;
        InboundMessage::new(routing_key.as_str(), data, Box::new(AmqpAck(acker)))
    }
}

#[async_trait]
impl MessageSource for AmqpSource {
    async fn connect(&mut self) -> Result<()> {
        self.teardown().await;

        let connection = open_connection(&self.url, &self.consumer_tag).await?;
        let (tx, closed) = mpsc::unbounded_channel();
        connection.on_error(move |err| {
            let _ = tx.send(err.to_string());
        });

        let channel = connection.create_channel().await?;
        let consumer = channel
            .basic_consume(
                &self.queue,
                &self.consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;
        info!(queue = %self.queue, "Consumer registered");

        self.session = Some(Session {
            connection,
            channel,
            consumer,
            closed,
        });
        Ok(())
    }

    async fn next_event(&mut self) -> Option<ChannelEvent> {
        let Some(session) = self.session.as_mut() else {
            return Some(ChannelEvent::Closed {
                reason: "not connected".into(),
            });
        };

        let event = tokio::select! {
            reason = session.closed.recv() => ChannelEvent::Closed {
                reason: reason.unwrap_or_else(|| "connection dropped".into()),
            },
            delivery = session.consumer.next() => match delivery {
                Some(Ok(delivery)) => ChannelEvent::Message(Self::into_message(delivery)),
                Some(Err(e)) => ChannelEvent::Closed { reason: e.to_string() },
                None => ChannelEvent::Closed {
                    reason: "consumer cancelled".into(),
                },
            },
        };
        Some(event)
    }

    async fn teardown(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        if let Err(e) = session.channel.close(200, "teardown").await {
            debug!(queue = %self.queue, error = %e, "Channel close failed");
        }
        if let Err(e) = session.connection.close(200, "teardown").await {
            debug!(queue = %self.queue, error = %e, "Connection close failed");
        }
    }

    fn queue(&self) -> &str {
        &self.queue
    }
}
