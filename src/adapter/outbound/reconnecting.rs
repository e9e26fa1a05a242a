//! Reconnecting wrapper for [`MessageSource`].
//!
//! Closures are absorbed: the wrapper tears the inner source down, waits a
//! fixed delay and reconnects, retrying without limit. Deliveries left
//! unacknowledged on the dead channel come back from the broker once the new
//! consumer is registered.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::Result;
use crate::port::{ChannelEvent, MessageSource};

/// Wrapper that adds automatic reconnection to any [`MessageSource`].
pub struct ReconnectingSource<S: MessageSource> {
    inner: S,
    delay: Duration,
    connected: bool,
    attempts: u32,
}

impl<S: MessageSource> ReconnectingSource<S> {
    /// The wrapper starts disconnected; the first `next_event` call connects
    /// if [`connect`](MessageSource::connect) was not called or failed.
    pub fn new(inner: S, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            connected: false,
            attempts: 0,
        }
    }

    async fn reconnect(&mut self) -> Result<()> {
        self.attempts += 1;
        info!(
            queue = %self.inner.queue(),
            delay_ms = self.delay.as_millis() as u64,
            attempt = self.attempts,
            "Reconnecting after delay"
        );
        sleep(self.delay).await;

        self.inner.connect().await?;
        info!(queue = %self.inner.queue(), "Reconnected");
        self.connected = true;
        self.attempts = 0;
        Ok(())
    }
}

#[async_trait]
impl<S: MessageSource> MessageSource for ReconnectingSource<S> {
    async fn connect(&mut self) -> Result<()> {
        self.inner.connect().await?;
        self.connected = true;
        Ok(())
    }

    /// Never yields [`ChannelEvent::Closed`]. `None` only when the inner
    /// source is exhausted.
    async fn next_event(&mut self) -> Option<ChannelEvent> {
        loop {
            if !self.connected {
                if let Err(e) = self.reconnect().await {
                    warn!(queue = %self.inner.queue(), error = %e, "Reconnection failed, will retry");
                    continue;
                }
            }

            match self.inner.next_event().await {
                Some(ChannelEvent::Closed { reason }) => {
                    warn!(queue = %self.inner.queue(), reason = %reason, "Channel closed, will reconnect");
                    self.connected = false;
                    self.inner.teardown().await;
                }
                other => return other,
            }
        }
    }

    async fn teardown(&mut self) {
        self.connected = false;
        self.inner.teardown().await;
    }

    fn queue(&self) -> &str {
        self.inner.queue()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use tokio::time::Instant;

    use super::*;
    use crate::error::Error;
    use crate::testkit::channel::{FakeBroker, ScriptedSource};

    const DELAY: Duration = Duration::from_secs(5);

    #[tokio::test(start_paused = true)]
    async fn closed_channel_is_reestablished_after_one_delay() {
        let inner = ScriptedSource::new("challenge")
            .with_closed("connection reset")
            .with_message("svc.challengeCreate", b"{}".to_vec());
        let (connects, teardowns) = inner.counts();

        let mut source = ReconnectingSource::new(inner, DELAY);
        source.connect().await.unwrap();

        let started = Instant::now();
        let event = source.next_event().await;
        assert!(matches!(event, Some(ChannelEvent::Message(_))));
        assert_eq!(started.elapsed(), DELAY);
        assert_eq!(connects.load(Ordering::SeqCst), 2);
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_reconnects_are_retried_without_limit() {
        let inner = ScriptedSource::new("challenge")
            .with_connect_results(vec![
                Ok(()),
                Err(Error::Connection("refused".into())),
                Err(Error::Connection("refused".into())),
                Ok(()),
            ])
            .with_closed("gone")
            .with_message("svc.challengeStart", b"{}".to_vec());
        let (connects, _) = inner.counts();

        let mut source = ReconnectingSource::new(inner, DELAY);
        source.connect().await.unwrap();

        let started = Instant::now();
        assert!(matches!(
            source.next_event().await,
            Some(ChannelEvent::Message(_))
        ));
        assert_eq!(started.elapsed(), DELAY * 3);
        assert_eq!(connects.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_initial_connect_is_recovered_on_first_read() {
        let inner = ScriptedSource::new("challenge")
            .with_connect_results(vec![Err(Error::Connection("refused".into()))])
            .with_message("svc.challengeCreate", b"{}".to_vec());

        let mut source = ReconnectingSource::new(inner, DELAY);
        assert!(source.connect().await.is_err());
        assert!(matches!(
            source.next_event().await,
            Some(ChannelEvent::Message(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn unacked_delivery_is_redelivered_after_reconnect() {
        let broker = FakeBroker::new();
        broker.publish("svc.challengeStart", b"first".to_vec());

        let mut source = ReconnectingSource::new(broker.source("challenge"), DELAY);
        source.connect().await.unwrap();

        let Some(ChannelEvent::Message(lost)) = source.next_event().await else {
            panic!("expected delivery");
        };
        broker.sever();
        assert!(lost.ack().await.is_err());

        let Some(ChannelEvent::Message(again)) = source.next_event().await else {
            panic!("expected redelivery");
        };
        assert_eq!(again.body, b"first".to_vec());
        again.ack().await.unwrap();

        assert_eq!(broker.connect_count(), 2);
        assert_eq!(broker.acked(), vec!["svc.challengeStart".to_string()]);
        assert_eq!(broker.unacked_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_inner_source_ends_the_stream() {
        let mut source = ReconnectingSource::new(ScriptedSource::new("challenge"), DELAY);
        source.connect().await.unwrap();
        assert!(source.next_event().await.is_none());
    }
}
