//! In-memory record store.
//!
//! Enforces the same uniqueness rules as the SQLite store. Selected with
//! `store.path = ":memory:"` and used by the test harness.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::{Attempt, AttemptBinding, AttemptToken, Challenge, Image, ImageKey};
use crate::error::{Result, StoreError};
use crate::port::RecordStore;

#[derive(Debug, Default)]
struct Collections {
    images: HashMap<ImageKey, Image>,
    challenges: Vec<Challenge>,
    attempts: HashMap<AttemptToken, Attempt>,
    attempt_owners: HashSet<(String, String, String)>,
}

/// In-memory store for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image.
    pub fn put_image(&self, image: Image) -> std::result::Result<(), StoreError> {
        let mut inner = self.inner.write();
        let key = image.key();
        if inner.images.contains_key(&key) {
            return Err(StoreError::Duplicate {
                collection: "image",
                key: key.to_string(),
            });
        }
        inner.images.insert(key, image);
        Ok(())
    }

    pub fn put_challenge(&self, challenge: Challenge) -> std::result::Result<(), StoreError> {
        let mut inner = self.inner.write();
        if let Some(existing) = inner.challenges.iter().find(|c| {
            c.cor_id == challenge.cor_id
                || (c.creator_name == challenge.creator_name
                    && c.challenge_name == challenge.challenge_name)
        }) {
            let key = if existing.cor_id == challenge.cor_id {
                challenge.cor_id.to_string()
            } else {
                format!("{}/{}", challenge.creator_name, challenge.challenge_name)
            };
            return Err(StoreError::Duplicate {
                collection: "challenge",
                key,
            });
        }
        inner.challenges.push(challenge);
        Ok(())
    }

    pub fn put_attempt(&self, attempt: Attempt) -> std::result::Result<(), StoreError> {
        let mut inner = self.inner.write();
        if inner.attempts.contains_key(&attempt.token) {
            return Err(StoreError::Duplicate {
                collection: "attempt",
                key: attempt.token.to_string(),
            });
        }
        let owner = (
            attempt.challenge_name.clone(),
            attempt.creator_name.clone(),
            attempt.participant.clone(),
        );
        if !inner.attempt_owners.insert(owner) {
            return Err(StoreError::Duplicate {
                collection: "attempt",
                key: format!(
                    "{}/{}/{}",
                    attempt.creator_name, attempt.challenge_name, attempt.participant
                ),
            });
        }
        inner.attempts.insert(attempt.token.clone(), attempt);
        Ok(())
    }

    /// Snapshot of all challenges in insertion order.
    pub fn challenges(&self) -> Vec<Challenge> {
        self.inner.read().challenges.clone()
    }

    /// Snapshot of all attempts, ordered by participant.
    pub fn attempts(&self) -> Vec<Attempt> {
        let mut attempts: Vec<_> = self.inner.read().attempts.values().cloned().collect();
        attempts.sort_by(|a, b| a.participant.cmp(&b.participant));
        attempts
    }

    pub fn attempt(&self, token: &AttemptToken) -> Option<Attempt> {
        self.inner.read().attempts.get(token).cloned()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_image(&self, key: &ImageKey) -> Result<Option<Image>> {
        Ok(self.inner.read().images.get(key).cloned())
    }

    async fn insert_image(&self, image: &Image) -> Result<()> {
        Ok(self.put_image(image.clone())?)
    }

    async fn insert_challenge(&self, challenge: &Challenge) -> Result<()> {
        Ok(self.put_challenge(challenge.clone())?)
    }

    async fn find_challenge(
        &self,
        creator_name: &str,
        challenge_name: &str,
    ) -> Result<Option<Challenge>> {
        Ok(self
            .inner
            .read()
            .challenges
            .iter()
            .find(|c| c.creator_name == creator_name && c.challenge_name == challenge_name)
            .cloned())
    }

    async fn insert_attempt(&self, attempt: &Attempt) -> Result<()> {
        Ok(self.put_attempt(attempt.clone())?)
    }

    async fn find_attempt(&self, token: &AttemptToken) -> Result<Option<Attempt>> {
        Ok(self.attempt(token))
    }

    async fn bind_attempt(
        &self,
        token: &AttemptToken,
        binding: &AttemptBinding,
    ) -> Result<Attempt> {
        let mut inner = self.inner.write();
        let attempt = inner
            .attempts
            .get_mut(token)
            .ok_or_else(|| StoreError::NotFound {
                collection: "attempt",
                key: token.to_string(),
            })?;
        attempt.ip_address = binding.ip_address.clone();
        attempt.port = binding.port.to_string();
        attempt.ssh_key = binding.private_key.clone();
        Ok(attempt.clone())
    }

    async fn list_attempts(
        &self,
        creator_name: &str,
        challenge_name: &str,
    ) -> Result<Vec<Attempt>> {
        Ok(self
            .attempts()
            .into_iter()
            .filter(|a| a.creator_name == creator_name && a.challenge_name == challenge_name)
            .collect())
    }
}
