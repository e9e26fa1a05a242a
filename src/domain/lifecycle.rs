//! Explicit state machines for the two command kinds.
//!
//! Each phase carries exactly the data the next transition needs, so a phase
//! that has not generated keys cannot be asked to deploy. The transitions that
//! talk to collaborators live in the application layer; this module only knows
//! which phases are terminal and which event each phase announces.

use super::event::EventStatus;
use super::image::ImageReference;
use super::record::Challenge;
use super::workload::{AccessKeyPair, Endpoint};

/// Create path: `received -> imageResolved -> challengeStored -> attempts* -> created`.
#[derive(Debug, Clone, PartialEq)]
pub enum CreatePhase {
    Received,
    ImageResolved {
        image_registry_link: String,
    },
    ChallengeStored {
        challenge: Challenge,
    },
    /// Self-loops once per participant; `written` attempts are already stored.
    AttemptsWriting {
        challenge: Challenge,
        written: usize,
    },
    Created {
        attempts: usize,
    },
    Failed {
        reason: String,
    },
}

impl CreatePhase {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::ImageResolved { .. } => "imageResolved",
            Self::ChallengeStored { .. } => "challengeStored",
            Self::AttemptsWriting { .. } => "attemptsWriting",
            Self::Created { .. } => "created",
            Self::Failed { .. } => "failed",
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Created { .. } | Self::Failed { .. })
    }

    /// Event announced on entering this phase.
    #[must_use]
    pub fn event(&self) -> Option<EventStatus> {
        match self {
            Self::Created { .. } => Some(EventStatus::ChallengeCreated),
            Self::Failed { .. } => Some(EventStatus::ChallengeCreateFailed),
            _ => None,
        }
    }
}

/// Start path:
/// `received -> imageResolved -> keyGenerated -> deployed -> starting* -> running -> persisted -> started`.
///
/// Any phase may move straight to `Failed`.
#[derive(Debug, Clone, PartialEq)]
pub enum StartPhase {
    Received,
    ImageResolved {
        image: ImageReference,
    },
    KeyGenerated {
        image: ImageReference,
        keys: AccessKeyPair,
    },
    Deployed {
        keys: AccessKeyPair,
    },
    /// Workload not yet scheduled or running; `polls` inventory queries so far.
    Starting {
        keys: AccessKeyPair,
        polls: u32,
    },
    Running {
        keys: AccessKeyPair,
    },
    Persisted {
        endpoint: Endpoint,
    },
    Started {
        endpoint: Endpoint,
    },
    Failed {
        reason: String,
    },
}

impl StartPhase {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::ImageResolved { .. } => "imageResolved",
            Self::KeyGenerated { .. } => "keyGenerated",
            Self::Deployed { .. } => "deployed",
            Self::Starting { .. } => "starting",
            Self::Running { .. } => "running",
            Self::Persisted { .. } => "persisted",
            Self::Started { .. } => "started",
            Self::Failed { .. } => "failed",
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Started { .. } | Self::Failed { .. })
    }

    /// Event announced on entering this phase.
    #[must_use]
    pub fn event(&self) -> Option<EventStatus> {
        match self {
            Self::Starting { .. } => Some(EventStatus::ChallengeStarting),
            Self::Started { .. } => Some(EventStatus::ChallengeStarted),
            Self::Failed { .. } => Some(EventStatus::ChallengeStartFailed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> AccessKeyPair {
        AccessKeyPair {
            public_key: "pub".into(),
            private_key: "priv".into(),
        }
    }

    #[test]
    fn create_events_only_on_terminal_phases() {
        assert_eq!(CreatePhase::Received.event(), None);
        assert_eq!(
            CreatePhase::Created { attempts: 2 }.event(),
            Some(EventStatus::ChallengeCreated)
        );
        assert_eq!(
            CreatePhase::Failed {
                reason: "x".into()
            }
            .event(),
            Some(EventStatus::ChallengeCreateFailed)
        );
        assert!(!CreatePhase::Received.is_terminal());
    }

    #[test]
    fn starting_announces_progress_but_is_not_terminal() {
        let phase = StartPhase::Starting {
            keys: keys(),
            polls: 3,
        };
        assert_eq!(phase.event(), Some(EventStatus::ChallengeStarting));
        assert!(!phase.is_terminal());
        assert_eq!(phase.name(), "starting");
    }

    #[test]
    fn start_terminal_phases() {
        let endpoint = Endpoint {
            ip_address: "10.0.0.1".into(),
            port: 30022,
        };
        assert!(StartPhase::Started {
            endpoint: endpoint.clone()
        }
        .is_terminal());
        assert!(!StartPhase::Persisted { endpoint }.is_terminal());
        assert!(StartPhase::Failed {
            reason: "x".into()
        }
        .is_terminal());
        assert_eq!(StartPhase::Deployed { keys: keys() }.event(), None);
    }
}
