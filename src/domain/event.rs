//! Outbound lifecycle events.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::command::Payload;

/// Closed vocabulary of `eventStatus` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventStatus {
    ChallengeCreated,
    ChallengeCreateFailed,
    /// Progress event; may repeat while a workload is being scheduled.
    ChallengeStarting,
    ChallengeStarted,
    ChallengeStartFailed,
}

impl EventStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ChallengeCreated => "challengeCreated",
            Self::ChallengeCreateFailed => "challengeCreateFailed",
            Self::ChallengeStarting => "challengeStarting",
            Self::ChallengeStarted => "challengeStarted",
            Self::ChallengeStartFailed => "challengeStartFailed",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outbound event: the inbound payload echoed back with `eventStatus` set.
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleEvent {
    pub status: EventStatus,
    pub payload: Payload,
}

impl LifecycleEvent {
    #[must_use]
    pub fn new(status: EventStatus, payload: &Payload) -> Self {
        Self {
            status,
            payload: payload.clone(),
        }
    }

    /// Attach an extra field to the echoed payload.
    #[must_use]
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(key, value.into());
        self
    }

    /// Serialize to the wire body, overwriting any inbound `eventStatus`.
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        let mut body = self.payload.clone();
        body.insert("eventStatus", Value::String(self.status.as_str().into()));
        serde_json::to_vec(body.as_map())
    }
}
