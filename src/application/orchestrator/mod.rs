//! Lifecycle orchestrator.
//!
//! Interprets one inbound delivery at a time, drives the matching state
//! machine to a terminal phase, and publishes an event for every phase that
//! announces one. Collaborator failures never escape as errors: they become
//! `*Failed` events. The only error [`Orchestrator::handle`] returns is a
//! terminal event that could not be published, in which case the delivery
//! must stay unacknowledged.

mod create;
mod start;

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::application::retry::PollPolicy;
use crate::domain::{
    event_routing_key, routing_suffix, AttemptToken, CommandKind, EventStatus, LifecycleCommand,
    LifecycleEvent, Payload, ReleaseId,
};
use crate::error::Result;
use crate::port::{ClusterInventory, EventPublisher, KeyGenerator, RecordStore, WorkloadDeployer};

/// Naming and event settings applied to every command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// Cluster namespace releases are installed into.
    pub namespace: String,
    /// Prepended to the attempt token to form the release name.
    pub release_prefix: String,
    /// Pod label carrying the release name.
    pub instance_label: String,
    /// Appended to the release name to form the service name.
    pub service_suffix: String,
    /// Routing-key prefix for outbound events.
    pub event_namespace: String,
    /// Add `ipaddress` and `port` to `challengeStarted`.
    pub echo_endpoint: bool,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            namespace: "challenge".into(),
            release_prefix: "a".into(),
            instance_label: "app.kubernetes.io/instance".into(),
            service_suffix: "-challenge".into(),
            event_namespace: "challenge.fromService".into(),
            echo_endpoint: true,
        }
    }
}

impl OrchestratorSettings {
    #[must_use]
    pub fn release_for(&self, token: &AttemptToken) -> ReleaseId {
        ReleaseId::for_attempt(&self.release_prefix, token)
    }

    #[must_use]
    pub fn pod_selector(&self, release: &ReleaseId) -> String {
        format!("{}={}", self.instance_label, release)
    }

    #[must_use]
    pub fn service_name(&self, release: &ReleaseId) -> String {
        format!("{}{}", release, self.service_suffix)
    }
}

/// What happened to one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// No event was emitted. The delivery is still acknowledged.
    Dropped { reason: String },
    /// The command ran to the given terminal event.
    Completed(EventStatus),
}

/// Drives lifecycle commands through their state machines.
pub struct Orchestrator {
    store: Arc<dyn RecordStore>,
    deployer: Arc<dyn WorkloadDeployer>,
    inventory: Arc<dyn ClusterInventory>,
    keys: Arc<dyn KeyGenerator>,
    publisher: Arc<dyn EventPublisher>,
    settings: OrchestratorSettings,
    poll: PollPolicy,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn RecordStore>,
        deployer: Arc<dyn WorkloadDeployer>,
        inventory: Arc<dyn ClusterInventory>,
        keys: Arc<dyn KeyGenerator>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            store,
            deployer,
            inventory,
            keys,
            publisher,
            settings: OrchestratorSettings::default(),
            poll: PollPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Process one delivery to completion.
    ///
    /// # Errors
    ///
    /// Returns an error only if the terminal event could not be published.
    pub async fn handle(&self, routing_key: &str, body: &[u8]) -> Result<Disposition> {
        let selector = routing_suffix(routing_key);
        let Some(kind) = CommandKind::from_routing_key(routing_key) else {
            debug!(routing_key, selector, "Ignoring unrecognized command");
            return Ok(Disposition::Dropped {
                reason: format!("unrecognized selector {selector:?}"),
            });
        };

        let payload = match Payload::from_slice(body) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(command = %kind, error = %e, "Dropping undecodable payload");
                return Ok(Disposition::Dropped {
                    reason: e.to_string(),
                });
            }
        };

        let command = match LifecycleCommand::decode(kind, &payload) {
            Ok(command) => command,
            Err(e) => {
                warn!(command = %kind, error = %e, "Rejecting malformed command");
                let status = kind.failure_status();
                self.emit(LifecycleEvent::new(status, &payload)).await?;
                return Ok(Disposition::Completed(status));
            }
        };

        let status = match command {
            LifecycleCommand::Create(create) => self.run_create(create, &payload).await?,
            LifecycleCommand::Start(start) => self.run_start(start, &payload).await?,
        };
        Ok(Disposition::Completed(status))
    }

    /// Publish a terminal event. Failure is returned to the caller.
    async fn emit(&self, event: LifecycleEvent) -> Result<()> {
        let routing_key = event_routing_key(&self.settings.event_namespace, event.status);
        let body = event.to_bytes()?;
        match self.publisher.publish(&routing_key, &body).await {
            Ok(()) => {
                info!(status = %event.status, routing_key = %routing_key, "Event published");
                Ok(())
            }
            Err(e) => {
                error!(status = %event.status, error = %e, "Failed to publish event");
                Err(e)
            }
        }
    }

    /// Publish a progress event. Failure is logged and otherwise ignored.
    async fn emit_progress(&self, event: LifecycleEvent) {
        let routing_key = event_routing_key(&self.settings.event_namespace, event.status);
        let body = match event.to_bytes() {
            Ok(body) => body,
            Err(e) => {
                warn!(status = %event.status, error = %e, "Failed to encode progress event");
                return;
            }
        };
        if let Err(e) = self.publisher.publish(&routing_key, &body).await {
            warn!(status = %event.status, error = %e, "Failed to publish progress event");
        }
    }
}
