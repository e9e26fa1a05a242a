//! Consume loop: one per queue.
//!
//! Reads deliveries from a [`MessageSource`] and hands each one to the
//! [`Orchestrator`], acknowledging only after the orchestrator returns. A
//! delivery is handled to completion before the next one is read, so a slow
//! start command holds up the rest of its queue.
//!
//! When the orchestrator fails (its terminal event could not be published)
//! the delivery is requeued after a pause, so the command runs again once
//! the publisher recovers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::application::orchestrator::{Disposition, Orchestrator};
use crate::error::Result;
use crate::port::{ChannelEvent, InboundMessage, MessageSource};

/// Counters reported when a loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumeSummary {
    /// Deliveries that ran to a terminal event.
    pub completed: u64,
    /// Deliveries acknowledged without an event.
    pub dropped: u64,
    /// Deliveries handed back to the broker for redelivery.
    pub requeued: u64,
}

pub struct ConsumeLoop<S: MessageSource> {
    source: S,
    orchestrator: Arc<Orchestrator>,
    requeue_delay: Duration,
    summary: ConsumeSummary,
}

impl<S: MessageSource> ConsumeLoop<S> {
    pub fn new(source: S, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            source,
            orchestrator,
            requeue_delay: Duration::ZERO,
            summary: ConsumeSummary::default(),
        }
    }

    /// Pause before requeueing a failed delivery.
    #[must_use]
    pub fn with_requeue_delay(mut self, delay: Duration) -> Self {
        self.requeue_delay = delay;
        self
    }

    /// Run until the source ends or `shutdown` flips to `true`.
    ///
    /// A failed initial connect is not fatal: a reconnecting source retries
    /// from `next_event`, and any other source simply ends.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<ConsumeSummary> {
        if let Err(e) = self.source.connect().await {
            warn!(queue = self.source.queue(), error = %e, "Initial connect failed");
        } else {
            info!(queue = self.source.queue(), "Consuming");
        }

        loop {
            tokio::select! {
                biased;
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!(queue = self.source.queue(), "Consume loop shutting down");
                        break;
                    }
                }
                event = self.source.next_event() => {
                    match event {
                        Some(ChannelEvent::Message(message)) => self.process(message).await,
                        Some(ChannelEvent::Closed { reason }) => {
                            warn!(queue = self.source.queue(), reason = %reason, "Channel closed");
                        }
                        None => {
                            warn!(queue = self.source.queue(), "Message source ended");
                            break;
                        }
                    }
                }
            }
        }

        self.source.teardown().await;
        Ok(self.summary)
    }

    async fn process(&mut self, message: InboundMessage) {
        debug!(
            queue = self.source.queue(),
            routing_key = %message.routing_key,
            bytes = message.body.len(),
            "Delivery received"
        );

        let disposition = match self
            .orchestrator
            .handle(&message.routing_key, &message.body)
            .await
        {
            Ok(disposition) => disposition,
            Err(e) => {
                warn!(
                    routing_key = %message.routing_key,
                    error = %e,
                    delay_ms = self.requeue_delay.as_millis() as u64,
                    "Requeueing delivery"
                );
                self.summary.requeued += 1;
                tokio::time::sleep(self.requeue_delay).await;
                // A failed nack still leaves the delivery unacked; the broker
                // requeues it when the channel goes away.
                if let Err(e) = message.requeue().await {
                    warn!(error = %e, "Requeue failed, delivery stays unacknowledged");
                }
                return;
            }
        };

        match disposition {
            Disposition::Completed(_) => self.summary.completed += 1,
            Disposition::Dropped { .. } => self.summary.dropped += 1,
        }

        if let Err(e) = message.ack().await {
            warn!(error = %e, "Acknowledgement failed, delivery will be redelivered");
        }
    }
}
