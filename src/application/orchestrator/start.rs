//! Start path: provision a workload for one attempt and wait for it.

use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::Orchestrator;
use crate::domain::{
    AccessKeyPair, AttemptBinding, Endpoint, EventStatus, ImageReference, LifecycleEvent, Payload,
    PodPhase, StartChallenge, StartPhase,
};
use crate::error::Result;
use crate::port::ReleaseSpec;

impl Orchestrator {
    pub(super) async fn run_start(
        &self,
        command: StartChallenge,
        payload: &Payload,
    ) -> Result<EventStatus> {
        let mut phase = StartPhase::Received;
        loop {
            phase = self.advance_start(&command, phase).await;
            debug!(token = %command.token, phase = phase.name(), "Start transition");

            let Some(status) = phase.event() else {
                continue;
            };
            let event = self.start_event(status, &phase, payload);
            if !phase.is_terminal() {
                self.emit_progress(event).await;
                continue;
            }

            match &phase {
                StartPhase::Started { endpoint } => {
                    info!(token = %command.token, endpoint = %endpoint, "Challenge started");
                }
                StartPhase::Failed { reason } => {
                    warn!(token = %command.token, reason = %reason, "Challenge start failed");
                }
                _ => {}
            }
            self.emit(event).await?;
            return Ok(status);
        }
    }

    fn start_event(
        &self,
        status: EventStatus,
        phase: &StartPhase,
        payload: &Payload,
    ) -> LifecycleEvent {
        let event = LifecycleEvent::new(status, payload);
        match phase {
            StartPhase::Started { endpoint } if self.settings.echo_endpoint => event
                .with_field("ipaddress", endpoint.ip_address.clone())
                .with_field("port", endpoint.port.to_string()),
            _ => event,
        }
    }

    /// Single transition of the start state machine.
    ///
    /// Waiting happens inside the transitions out of `Deployed` (settle delay)
    /// and `Starting` (poll interval).
    pub(super) async fn advance_start(
        &self,
        command: &StartChallenge,
        phase: StartPhase,
    ) -> StartPhase {
        match phase {
            StartPhase::Received => match self.resolve_image(command).await {
                Ok(image) => StartPhase::ImageResolved { image },
                Err(reason) => StartPhase::Failed { reason },
            },
            StartPhase::ImageResolved { image } => match self.keys.generate() {
                Ok(keys) => StartPhase::KeyGenerated { image, keys },
                Err(e) => StartPhase::Failed {
                    reason: format!("key generation failed: {e}"),
                },
            },
            StartPhase::KeyGenerated { image, keys } => {
                let spec = ReleaseSpec {
                    release: self.settings.release_for(&command.token),
                    namespace: self.settings.namespace.clone(),
                    image,
                    authorized_key: keys.public_key.clone(),
                };
                match self.deployer.install_or_upgrade(&spec).await {
                    Ok(()) => {
                        info!(
                            release = %spec.release,
                            image = %spec.image,
                            engine = self.deployer.engine_name(),
                            "Release installed"
                        );
                        StartPhase::Deployed { keys }
                    }
                    Err(e) => StartPhase::Failed {
                        reason: format!("install of {} failed: {e}", spec.release),
                    },
                }
            }
            StartPhase::Deployed { keys } => {
                sleep(self.poll.initial_delay).await;
                self.poll_workload(command, keys, 0).await
            }
            StartPhase::Starting { keys, polls } => {
                if self.poll.exhausted(polls) {
                    return StartPhase::Failed {
                        reason: format!("workload not running after {polls} polls"),
                    };
                }
                sleep(self.poll.interval).await;
                self.poll_workload(command, keys, polls).await
            }
            StartPhase::Running { keys } => match self.resolve_endpoint(command).await {
                Ok(endpoint) => self.bind(command, endpoint, keys).await,
                Err(e) => StartPhase::Failed {
                    reason: format!("endpoint lookup failed: {e}"),
                },
            },
            StartPhase::Persisted { endpoint } => StartPhase::Started { endpoint },
            terminal @ (StartPhase::Started { .. } | StartPhase::Failed { .. }) => terminal,
        }
    }

    /// Image from the command, or from the stored attempt when the command
    /// carries none.
    async fn resolve_image(
        &self,
        command: &StartChallenge,
    ) -> std::result::Result<ImageReference, String> {
        if let Some(image) = command.image().map_err(|e| e.to_string())? {
            return Ok(image);
        }
        match self.store.find_attempt(&command.token).await {
            Ok(Some(attempt)) => {
                ImageReference::parse(&attempt.image_registry_link).map_err(|e| e.to_string())
            }
            Ok(None) => Err(format!("attempt not found: {}", command.token)),
            Err(e) => Err(format!("attempt lookup failed: {e}")),
        }
    }

    /// Query the lead pod once. Query errors count as still starting.
    async fn poll_workload(
        &self,
        command: &StartChallenge,
        keys: AccessKeyPair,
        polls: u32,
    ) -> StartPhase {
        let release = self.settings.release_for(&command.token);
        let selector = self.settings.pod_selector(&release);
        let polls = polls.saturating_add(1);

        match self
            .inventory
            .pod_phases(&self.settings.namespace, &selector)
            .await
        {
            Ok(phases) => match phases.first() {
                None | Some(PodPhase::Pending) => StartPhase::Starting { keys, polls },
                Some(PodPhase::Running) => StartPhase::Running { keys },
                Some(phase) => StartPhase::Failed {
                    reason: format!("workload {release} entered phase {phase}"),
                },
            },
            Err(e) => {
                warn!(release = %release, error = %e, polls, "Pod query failed, still starting");
                StartPhase::Starting { keys, polls }
            }
        }
    }

    async fn resolve_endpoint(&self, command: &StartChallenge) -> Result<Endpoint> {
        let release = self.settings.release_for(&command.token);
        let ip_address = self.inventory.node_address().await?;
        let port = self
            .inventory
            .service_port(&self.settings.namespace, &self.settings.service_name(&release))
            .await?;
        Ok(Endpoint { ip_address, port })
    }

    async fn bind(
        &self,
        command: &StartChallenge,
        endpoint: Endpoint,
        keys: AccessKeyPair,
    ) -> StartPhase {
        let binding = AttemptBinding {
            ip_address: endpoint.ip_address.clone(),
            port: endpoint.port,
            private_key: keys.private_key,
        };
        match self.store.bind_attempt(&command.token, &binding).await {
            Ok(_) => StartPhase::Persisted { endpoint },
            Err(e) => {
                // The release stays installed.
                warn!(
                    token = %command.token,
                    endpoint = %endpoint,
                    "Workload running but attempt not updated"
                );
                StartPhase::Failed {
                    reason: format!("attempt not updated: {e}"),
                }
            }
        }
    }
}
