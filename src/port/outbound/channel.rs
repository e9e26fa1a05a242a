//! Message channel ports: durable consumption and event publishing.
//!
//! # Delivery contract
//!
//! Delivery is at-least-once. A message is acknowledged only after the
//! orchestrator has finished with it and published its event, so a crash in
//! between causes redelivery. A delivery whose event could not be published
//! is requeued explicitly so the broker hands it out again on the same
//! channel. Handlers must tolerate running twice: the
//! create path relies on the store's uniqueness invariants and the start path
//! relies on install-or-upgrade being idempotent.

use async_trait::async_trait;

use crate::error::Result;

/// Settles one delivery with the broker.
#[async_trait]
pub trait AckHandle: Send + Sync {
    async fn ack(&self) -> Result<()>;

    /// Reject the delivery and ask the broker to queue it again.
    async fn requeue(&self) -> Result<()>;
}

/// A delivered message awaiting acknowledgement.
pub struct InboundMessage {
    pub routing_key: String,
    pub body: Vec<u8>,
    ack: Box<dyn AckHandle>,
}

impl InboundMessage {
    pub fn new(routing_key: impl Into<String>, body: Vec<u8>, ack: Box<dyn AckHandle>) -> Self {
        Self {
            routing_key: routing_key.into(),
            body,
            ack,
        }
    }

    /// Acknowledge the delivery, consuming it.
    pub async fn ack(self) -> Result<()> {
        self.ack.ack().await
    }

    /// Hand the delivery back to the broker for redelivery, consuming it.
    pub async fn requeue(self) -> Result<()> {
        self.ack.requeue().await
    }
}

impl std::fmt::Debug for InboundMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboundMessage")
            .field("routing_key", &self.routing_key)
            .field("body_len", &self.body.len())
            .finish_non_exhaustive()
    }
}

/// What a message source yields.
#[derive(Debug)]
pub enum ChannelEvent {
    /// A delivered message.
    Message(InboundMessage),
    /// The transport or sub-channel closed (may reconnect).
    Closed {
        /// The closure reason.
        reason: String,
    },
}

/// A consumable queue on a broker.
#[async_trait]
pub trait MessageSource: Send {
    /// Open the transport connection and a sub-channel consuming the queue.
    async fn connect(&mut self) -> Result<()>;

    /// Receive the next event.
    ///
    /// Blocks until a message arrives or the channel closes. Returns `None`
    /// when the source has been exhausted.
    async fn next_event(&mut self) -> Option<ChannelEvent>;

    /// Drop the current sub-channel and connection, if any.
    async fn teardown(&mut self) {}

    /// Queue this source consumes, for logging.
    fn queue(&self) -> &str;
}

#[async_trait]
impl MessageSource for Box<dyn MessageSource> {
    async fn connect(&mut self) -> Result<()> {
        (**self).connect().await
    }

    async fn next_event(&mut self) -> Option<ChannelEvent> {
        (**self).next_event().await
    }

    async fn teardown(&mut self) {
        (**self).teardown().await
    }

    fn queue(&self) -> &str {
        (**self).queue()
    }
}

/// Publishes outbound events to the configured topic exchange.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, routing_key: &str, body: &[u8]) -> Result<()>;
}
