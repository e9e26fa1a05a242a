//! Persistent records: challenges, attempts, and images.
//!
//! Field names serialize in camelCase to match the inbound command payloads
//! and the record collections they mirror.

use serde::{Deserialize, Serialize};

use super::id::{AttemptToken, CorrelationId};

/// Lookup key for an image record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageKey {
    pub creator_name: String,
    pub image_name: String,
    pub image_tag: String,
}

impl ImageKey {
    pub fn new(
        creator_name: impl Into<String>,
        image_name: impl Into<String>,
        image_tag: impl Into<String>,
    ) -> Self {
        Self {
            creator_name: creator_name.into(),
            image_name: image_name.into(),
            image_tag: image_tag.into(),
        }
    }
}

impl std::fmt::Display for ImageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}:{}",
            self.creator_name, self.image_name, self.image_tag
        )
    }
}

/// A built image that challenges can reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub cor_id: CorrelationId,
    pub creator_name: String,
    pub image_name: String,
    pub image_tag: String,
    pub image_registry_link: String,
}

impl Image {
    #[must_use]
    pub fn key(&self) -> ImageKey {
        ImageKey::new(&self.creator_name, &self.image_name, &self.image_tag)
    }
}

/// A named exercise owned by a creator.
///
/// Unique on `cor_id` and on `(challenge_name, creator_name)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub cor_id: CorrelationId,
    pub creator_name: String,
    pub challenge_name: String,
    pub image_name: String,
    pub image_tag: String,
    pub participants: Vec<String>,
    pub image_registry_link: String,
}

/// One participant's instance of a challenge.
///
/// Unique on `token` and on `(challenge_name, creator_name, participant)`.
/// Access fields stay empty until the attempt is started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub participant: String,
    pub token: AttemptToken,
    #[serde(rename = "sshkey")]
    pub ssh_key: String,
    pub result: f64,
    #[serde(rename = "ipaddress")]
    pub ip_address: String,
    pub port: String,
    pub challenge_name: String,
    pub creator_name: String,
    pub image_registry_link: String,
}

impl Attempt {
    /// A freshly created attempt for `participant` with a new token and no
    /// access material yet.
    #[must_use]
    pub fn pending(challenge: &Challenge, participant: &str) -> Self {
        Self {
            participant: participant.to_string(),
            token: AttemptToken::generate(),
            ssh_key: String::new(),
            result: 0.0,
            ip_address: String::new(),
            port: String::new(),
            challenge_name: challenge.challenge_name.clone(),
            creator_name: challenge.creator_name.clone(),
            image_registry_link: challenge.image_registry_link.clone(),
        }
    }

    /// True once a workload has been bound to this attempt.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        !self.ip_address.is_empty() && !self.port.is_empty()
    }
}

/// Access details written onto an attempt once its workload is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptBinding {
    pub ip_address: String,
    pub port: u16,
    pub private_key: String,
}
