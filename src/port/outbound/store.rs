//! Record store port for challenges, attempts, and images.
//!
//! Implementations own the uniqueness invariants and report violations as
//! [`StoreError::Duplicate`](crate::error::StoreError::Duplicate). There is no
//! application-level locking; concurrent writers rely on the store's own
//! per-record atomicity.

use async_trait::async_trait;

use crate::domain::{Attempt, AttemptBinding, AttemptToken, Challenge, Image, ImageKey};
use crate::error::Result;

/// Storage operations used by the orchestrator and operator tooling.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Look up an image by `(creator, name, tag)`.
    async fn find_image(&self, key: &ImageKey) -> Result<Option<Image>>;

    /// Register an image. Duplicate keys are rejected.
    async fn insert_image(&self, image: &Image) -> Result<()>;

    /// Persist a new challenge. Fails on a duplicate correlation id or a
    /// duplicate `(challenge_name, creator_name)`.
    async fn insert_challenge(&self, challenge: &Challenge) -> Result<()>;

    /// Get a challenge by creator and name.
    async fn find_challenge(
        &self,
        creator_name: &str,
        challenge_name: &str,
    ) -> Result<Option<Challenge>>;

    /// Persist a new attempt. Fails on a duplicate token or a duplicate
    /// `(challenge_name, creator_name, participant)`.
    async fn insert_attempt(&self, attempt: &Attempt) -> Result<()>;

    /// Get an attempt by token.
    async fn find_attempt(&self, token: &AttemptToken) -> Result<Option<Attempt>>;

    /// Write access details onto the attempt matched by `token` and return the
    /// updated record.
    async fn bind_attempt(&self, token: &AttemptToken, binding: &AttemptBinding)
        -> Result<Attempt>;

    /// All attempts of one challenge, ordered by participant.
    async fn list_attempts(&self, creator_name: &str, challenge_name: &str)
        -> Result<Vec<Attempt>>;
}
