//! Create path: resolve the image, store the challenge, fan out attempts.

use tracing::{debug, info, warn};

use super::Orchestrator;
use crate::domain::{
    Attempt, Challenge, CorrelationId, CreateChallenge, CreatePhase, EventStatus, LifecycleEvent,
    Payload,
};
use crate::error::Result;

impl Orchestrator {
    pub(super) async fn run_create(
        &self,
        command: CreateChallenge,
        payload: &Payload,
    ) -> Result<EventStatus> {
        let mut phase = CreatePhase::Received;
        while !phase.is_terminal() {
            phase = self.advance_create(&command, phase).await;
            debug!(
                challenge = %command.challenge_name,
                phase = phase.name(),
                "Create transition"
            );
        }

        match &phase {
            CreatePhase::Created { attempts } => info!(
                creator = %command.creator_name,
                challenge = %command.challenge_name,
                attempts,
                "Challenge created"
            ),
            CreatePhase::Failed { reason } => warn!(
                creator = %command.creator_name,
                challenge = %command.challenge_name,
                reason = %reason,
                "Challenge creation failed"
            ),
            _ => {}
        }

        let status = phase
            .event()
            .unwrap_or(EventStatus::ChallengeCreateFailed);
        self.emit(LifecycleEvent::new(status, payload)).await?;
        Ok(status)
    }

    /// Single transition of the create state machine.
    pub(super) async fn advance_create(
        &self,
        command: &CreateChallenge,
        phase: CreatePhase,
    ) -> CreatePhase {
        match phase {
            CreatePhase::Received => {
                let key = command.image_key();
                match self.store.find_image(&key).await {
                    Ok(Some(image)) => CreatePhase::ImageResolved {
                        image_registry_link: image.image_registry_link,
                    },
                    Ok(None) => CreatePhase::Failed {
                        reason: format!("image not found: {key}"),
                    },
                    Err(e) => CreatePhase::Failed {
                        reason: format!("image lookup failed: {e}"),
                    },
                }
            }
            CreatePhase::ImageResolved {
                image_registry_link,
            } => {
                let challenge = Challenge {
                    cor_id: command
                        .cor_id
                        .clone()
                        .unwrap_or_else(CorrelationId::generate),
                    creator_name: command.creator_name.clone(),
                    challenge_name: command.challenge_name.clone(),
                    image_name: command.image_name.clone(),
                    image_tag: command.image_tag.clone(),
                    participants: command.participants.clone(),
                    image_registry_link,
                };
                match self.store.insert_challenge(&challenge).await {
                    Ok(()) => CreatePhase::ChallengeStored { challenge },
                    Err(e) => CreatePhase::Failed {
                        reason: format!("challenge not stored: {e}"),
                    },
                }
            }
            CreatePhase::ChallengeStored { challenge } => CreatePhase::AttemptsWriting {
                challenge,
                written: 0,
            },
            CreatePhase::AttemptsWriting { challenge, written } => {
                let Some(participant) = challenge.participants.get(written) else {
                    return CreatePhase::Created { attempts: written };
                };
                let attempt = Attempt::pending(&challenge, participant);
                match self.store.insert_attempt(&attempt).await {
                    Ok(()) => CreatePhase::AttemptsWriting {
                        challenge,
                        written: written + 1,
                    },
                    Err(e) => {
                        // Earlier attempts stay in the store.
                        warn!(
                            challenge = %challenge.challenge_name,
                            participant = %participant,
                            written,
                            "Attempt fan-out aborted, leaving partial state"
                        );
                        CreatePhase::Failed {
                            reason: format!("attempt for {participant} not stored: {e}"),
                        }
                    }
                }
            }
            terminal @ (CreatePhase::Created { .. } | CreatePhase::Failed { .. }) => terminal,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::application::orchestrator::Disposition;
    use crate::domain::{Image, ImageKey};
    use crate::error::StoreError;
    use crate::testkit::domain::{create_body, sample_image};
    use crate::testkit::orchestrator::Harness;

    const ROUTING_KEY: &str = "team.challengeCreate";

    #[tokio::test]
    async fn creates_challenge_and_one_attempt_per_participant() {
        let harness = Harness::new();
        harness.store.seed_image(sample_image());

        let body = create_body("heap", &["bob", "carol", "dave"]);
        let disposition = harness
            .orchestrator()
            .handle(ROUTING_KEY, &body)
            .await
            .unwrap();
        assert_eq!(
            disposition,
            Disposition::Completed(EventStatus::ChallengeCreated)
        );

        let attempts = harness.store.attempts();
        assert_eq!(attempts.len(), 3);
        let tokens: HashSet<_> = attempts.iter().map(|a| a.token.clone()).collect();
        assert_eq!(tokens.len(), 3);
        assert!(attempts
            .iter()
            .all(|a| a.image_registry_link == sample_image().image_registry_link));
        assert_eq!(harness.store.challenges().len(), 1);

        let events = harness.publisher.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].body["eventStatus"], "challengeCreated");
    }

    #[tokio::test]
    async fn missing_image_fails_before_any_write() {
        let harness = Harness::new();
        let body = create_body("heap", &["bob"]);
        harness
            .orchestrator()
            .handle(ROUTING_KEY, &body)
            .await
            .unwrap();

        assert!(harness.store.challenges().is_empty());
        assert!(harness.store.attempts().is_empty());
        assert_eq!(
            harness.publisher.statuses(),
            vec![EventStatus::ChallengeCreateFailed]
        );
    }

    #[tokio::test]
    async fn redelivered_create_is_rejected_by_uniqueness() {
        let harness = Harness::new();
        harness.store.seed_image(sample_image());
        let body = create_body("heap", &["bob"]);

        let orchestrator = harness.orchestrator();
        orchestrator.handle(ROUTING_KEY, &body).await.unwrap();
        orchestrator.handle(ROUTING_KEY, &body).await.unwrap();

        assert_eq!(
            harness.publisher.statuses(),
            vec![
                EventStatus::ChallengeCreated,
                EventStatus::ChallengeCreateFailed
            ]
        );
        assert_eq!(harness.store.challenges().len(), 1);
        assert_eq!(harness.store.attempts().len(), 1);
    }

    #[tokio::test]
    async fn attempt_failure_leaves_earlier_attempts() {
        let harness = Harness::new();
        harness.store.seed_image(sample_image());
        harness.store.fail_attempt_inserts_after(
            1,
            StoreError::Backend("disk full".into()),
        );

        let body = create_body("heap", &["bob", "carol", "dave"]);
        harness
            .orchestrator()
            .handle(ROUTING_KEY, &body)
            .await
            .unwrap();

        assert_eq!(harness.store.attempts().len(), 1);
        assert_eq!(harness.store.challenges().len(), 1);
        assert_eq!(
            harness.publisher.statuses(),
            vec![EventStatus::ChallengeCreateFailed]
        );
    }

    #[tokio::test]
    async fn transitions_can_be_driven_one_at_a_time() {
        let harness = Harness::new();
        harness.store.seed_image(Image {
            cor_id: CorrelationId::new("img"),
            ..sample_image()
        });
        let command = CreateChallenge {
            cor_id: Some(CorrelationId::new("fixed")),
            creator_name: "alice".into(),
            challenge_name: "heap".into(),
            image_name: "pwn".into(),
            image_tag: "v1".into(),
            participants: vec!["bob".into()],
        };
        assert_eq!(command.image_key(), ImageKey::new("alice", "pwn", "v1"));

        let orchestrator = harness.orchestrator();
        let phase = orchestrator
            .advance_create(&command, CreatePhase::Received)
            .await;
        assert_eq!(phase.name(), "imageResolved");
        let phase = orchestrator.advance_create(&command, phase).await;
        let CreatePhase::ChallengeStored { challenge } = &phase else {
            panic!("expected stored challenge, got {phase:?}");
        };
        assert_eq!(challenge.cor_id.as_str(), "fixed");
    }
}
