//! Mock [`MessageSource`] implementations for testing.
//!
//! - [`ScriptedSource`] - Pre-loaded connect results and events.
//!   Best for: consume loop behavior, reconnect wrapper error handling.
//!
//! - [`FakeBroker`] - A shared in-process queue with per-connection
//!   unacknowledged tracking. Severing the connection requeues every
//!   unacknowledged delivery, the way a real broker does when a channel dies,
//!   and a rejected delivery goes back to the head of the queue.
//!   Best for: redelivery after reconnect.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::error::{Error, Result};
use crate::port::{AckHandle, ChannelEvent, InboundMessage, MessageSource};

/// Shared acknowledgement counters.
#[derive(Debug, Clone, Default)]
pub struct AckCounter {
    acked: Arc<AtomicU32>,
    requeued: Arc<AtomicU32>,
}

impl AckCounter {
    /// Deliveries acknowledged.
    pub fn count(&self) -> u32 {
        self.acked.load(Ordering::SeqCst)
    }

    /// Deliveries handed back for redelivery.
    pub fn requeued(&self) -> u32 {
        self.requeued.load(Ordering::SeqCst)
    }
}

struct CountingAck(AckCounter);

#[async_trait]
impl AckHandle for CountingAck {
    async fn ack(&self) -> Result<()> {
        self.0.acked.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn requeue(&self) -> Result<()> {
        self.0.requeued.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ScriptedSource
// ---------------------------------------------------------------------------

/// A mock source with scripted connect results and a fixed event queue.
///
/// Each call to `connect()` pops the next result (defaults to `Ok(())` when
/// exhausted). Once the events run out the source ends, or blocks forever
/// when built with [`pending_when_empty`](Self::pending_when_empty).
pub struct ScriptedSource {
    queue: String,
    connect_results: VecDeque<Result<()>>,
    events: VecDeque<ChannelEvent>,
    connect_count: Arc<AtomicU32>,
    teardown_count: Arc<AtomicU32>,
    acks: AckCounter,
    pending_when_empty: bool,
}

impl ScriptedSource {
    pub fn new(queue: &str) -> Self {
        Self {
            queue: queue.to_string(),
            connect_results: VecDeque::new(),
            events: VecDeque::new(),
            connect_count: Arc::new(AtomicU32::new(0)),
            teardown_count: Arc::new(AtomicU32::new(0)),
            acks: AckCounter::default(),
            pending_when_empty: false,
        }
    }

    pub fn with_connect_results(mut self, results: Vec<Result<()>>) -> Self {
        self.connect_results = results.into();
        self
    }

    pub fn with_message(mut self, routing_key: &str, body: Vec<u8>) -> Self {
        let ack = Box::new(CountingAck(self.acks.clone()));
        self.events.push_back(ChannelEvent::Message(InboundMessage::new(
            routing_key,
            body,
            ack,
        )));
        self
    }

    pub fn with_closed(mut self, reason: &str) -> Self {
        self.events.push_back(ChannelEvent::Closed {
            reason: reason.to_string(),
        });
        self
    }

    pub fn pending_when_empty(mut self) -> Self {
        self.pending_when_empty = true;
        self
    }

    pub fn acks(&self) -> AckCounter {
        self.acks.clone()
    }

    /// Shared counters for asserting connect/teardown call counts.
    pub fn counts(&self) -> (Arc<AtomicU32>, Arc<AtomicU32>) {
        (self.connect_count.clone(), self.teardown_count.clone())
    }
}

#[async_trait]
impl MessageSource for ScriptedSource {
    async fn connect(&mut self) -> Result<()> {
        self.connect_count.fetch_add(1, Ordering::SeqCst);
        self.connect_results.pop_front().unwrap_or(Ok(()))
    }

    async fn next_event(&mut self) -> Option<ChannelEvent> {
        match self.events.pop_front() {
            Some(event) => Some(event),
            None if self.pending_when_empty => std::future::pending().await,
            None => None,
        }
    }

    async fn teardown(&mut self) {
        self.teardown_count.fetch_add(1, Ordering::SeqCst);
    }

    fn queue(&self) -> &str {
        &self.queue
    }
}

// ---------------------------------------------------------------------------
// FakeBroker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Delivery {
    tag: u64,
    routing_key: String,
    body: Vec<u8>,
}

#[derive(Debug, Default)]
struct BrokerState {
    ready: VecDeque<Delivery>,
    unacked: BTreeMap<u64, Delivery>,
    next_tag: u64,
    /// Bumped on every sever; connections from older generations are dead.
    generation: u64,
    down: bool,
    connects: u32,
    acked: Vec<String>,
    requeued: u32,
}

/// In-process broker holding one queue.
#[derive(Debug, Default)]
pub struct FakeBroker {
    state: Mutex<BrokerState>,
    notify: Notify,
}

impl FakeBroker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Enqueue a delivery.
    pub fn publish(&self, routing_key: &str, body: Vec<u8>) {
        {
            let mut state = self.state.lock();
            state.next_tag += 1;
            let tag = state.next_tag;
            state.ready.push_back(Delivery {
                tag,
                routing_key: routing_key.to_string(),
                body,
            });
        }
        self.notify.notify_waiters();
    }

    /// Kill every open connection and requeue unacknowledged deliveries
    /// ahead of anything still ready.
    pub fn sever(&self) {
        {
            let mut state = self.state.lock();
            state.generation += 1;
            let unacked = std::mem::take(&mut state.unacked);
            for delivery in unacked.into_values().rev() {
                state.ready.push_front(delivery);
            }
        }
        self.notify.notify_waiters();
    }

    /// Refuse (or accept again) new connections.
    pub fn set_down(&self, down: bool) {
        self.state.lock().down = down;
    }

    pub fn source(self: &Arc<Self>, queue: &str) -> FakeBrokerSource {
        FakeBrokerSource {
            broker: Arc::clone(self),
            queue: queue.to_string(),
            generation: None,
        }
    }

    pub fn connect_count(&self) -> u32 {
        self.state.lock().connects
    }

    pub fn ready_count(&self) -> usize {
        self.state.lock().ready.len()
    }

    pub fn unacked_count(&self) -> usize {
        self.state.lock().unacked.len()
    }

    /// Routing keys of acknowledged deliveries, in ack order.
    pub fn acked(&self) -> Vec<String> {
        self.state.lock().acked.clone()
    }

    /// Number of deliveries rejected back onto the queue.
    pub fn requeued_count(&self) -> u32 {
        self.state.lock().requeued
    }
}

struct BrokerAck {
    broker: Arc<FakeBroker>,
    tag: u64,
    generation: u64,
}

#[async_trait]
impl AckHandle for BrokerAck {
    async fn ack(&self) -> Result<()> {
        let mut state = self.broker.state.lock();
        if state.generation != self.generation {
            return Err(Error::Connection("channel closed before ack".into()));
        }
        if let Some(delivery) = state.unacked.remove(&self.tag) {
            state.acked.push(delivery.routing_key);
        }
        Ok(())
    }

    async fn requeue(&self) -> Result<()> {
        {
            let mut state = self.broker.state.lock();
            if state.generation != self.generation {
                return Err(Error::Connection("channel closed before nack".into()));
            }
            if let Some(delivery) = state.unacked.remove(&self.tag) {
                state.requeued += 1;
                state.ready.push_front(delivery);
            }
        }
        self.broker.notify.notify_waiters();
        Ok(())
    }
}

/// One consumer connection to a [`FakeBroker`].
pub struct FakeBrokerSource {
    broker: Arc<FakeBroker>,
    queue: String,
    generation: Option<u64>,
}

#[async_trait]
impl MessageSource for FakeBrokerSource {
    async fn connect(&mut self) -> Result<()> {
        let mut state = self.broker.state.lock();
        if state.down {
            return Err(Error::Connection("broker unavailable".into()));
        }
        state.connects += 1;
        self.generation = Some(state.generation);
        Ok(())
    }

    async fn next_event(&mut self) -> Option<ChannelEvent> {
        loop {
            let notified = self.broker.notify.notified();
            {
                let mut state = self.broker.state.lock();
                let Some(generation) = self.generation else {
                    return Some(ChannelEvent::Closed {
                        reason: "not connected".into(),
                    });
                };
                if generation != state.generation {
                    self.generation = None;
                    return Some(ChannelEvent::Closed {
                        reason: "connection reset by broker".into(),
                    });
                }
                if let Some(delivery) = state.ready.pop_front() {
                    state.unacked.insert(delivery.tag, delivery.clone());
                    let ack = Box::new(BrokerAck {
                        broker: Arc::clone(&self.broker),
                        tag: delivery.tag,
                        generation,
                    });
                    return Some(ChannelEvent::Message(InboundMessage::new(
                        delivery.routing_key,
                        delivery.body,
                        ack,
                    )));
                }
            }
            notified.await;
        }
    }

    async fn teardown(&mut self) {
        self.generation = None;
    }

    fn queue(&self) -> &str {
        &self.queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn severing_requeues_unacked_deliveries_in_order() {
        let broker = FakeBroker::new();
        broker.publish("a.challengeCreate", b"1".to_vec());
        broker.publish("a.challengeStart", b"2".to_vec());
        broker.publish("a.challengeStart", b"3".to_vec());

        let mut source = broker.source("challenge");
        source.connect().await.unwrap();
        let Some(ChannelEvent::Message(first)) = source.next_event().await else {
            panic!("expected delivery");
        };
        let Some(ChannelEvent::Message(_second)) = source.next_event().await else {
            panic!("expected delivery");
        };
        first.ack().await.unwrap();
        assert_eq!(broker.unacked_count(), 1);

        broker.sever();
        assert!(matches!(
            source.next_event().await,
            Some(ChannelEvent::Closed { .. })
        ));
        assert_eq!(broker.ready_count(), 2);

        source.connect().await.unwrap();
        let Some(ChannelEvent::Message(redelivered)) = source.next_event().await else {
            panic!("expected redelivery");
        };
        assert_eq!(redelivered.body, b"2".to_vec());
    }

    #[tokio::test]
    async fn ack_on_a_dead_connection_fails() {
        let broker = FakeBroker::new();
        broker.publish("a.challengeCreate", b"1".to_vec());
        let mut source = broker.source("challenge");
        source.connect().await.unwrap();
        let Some(ChannelEvent::Message(message)) = source.next_event().await else {
            panic!("expected delivery");
        };

        broker.sever();
        assert!(message.ack().await.is_err());
        assert_eq!(broker.ready_count(), 1);
    }

    #[tokio::test]
    async fn requeued_delivery_is_handed_out_again() {
        let broker = FakeBroker::new();
        broker.publish("a.challengeStart", b"1".to_vec());
        broker.publish("a.challengeStart", b"2".to_vec());
        let mut source = broker.source("challenge");
        source.connect().await.unwrap();

        let Some(ChannelEvent::Message(first)) = source.next_event().await else {
            panic!("expected delivery");
        };
        first.requeue().await.unwrap();
        assert_eq!(broker.requeued_count(), 1);
        assert_eq!(broker.unacked_count(), 0);

        let Some(ChannelEvent::Message(again)) = source.next_event().await else {
            panic!("expected redelivery");
        };
        assert_eq!(again.body, b"1".to_vec());
    }

    #[tokio::test]
    async fn down_broker_refuses_connections() {
        let broker = FakeBroker::new();
        broker.set_down(true);
        let mut source = broker.source("challenge");
        assert!(source.connect().await.is_err());
        broker.set_down(false);
        assert!(source.connect().await.is_ok());
        assert_eq!(broker.connect_count(), 1);
    }
}
