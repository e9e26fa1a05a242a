//! Orchestrator wired to in-memory fakes.

use std::sync::Arc;

use super::collaborators::{
    FakeDeployer, FixedKeys, FlakyStore, RecordingPublisher, ScriptedInventory,
};
use crate::application::orchestrator::Orchestrator;

/// Every collaborator as a shared fake, plus a factory for orchestrators
/// that use them.
///
/// Orchestrators built from the same harness share state, so a test can
/// handle several commands and then inspect the fakes.
pub struct Harness {
    pub store: Arc<FlakyStore>,
    pub deployer: Arc<FakeDeployer>,
    pub inventory: Arc<ScriptedInventory>,
    pub keys: Arc<FixedKeys>,
    pub publisher: Arc<RecordingPublisher>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            store: Arc::new(FlakyStore::new()),
            deployer: Arc::new(FakeDeployer::new()),
            inventory: Arc::new(ScriptedInventory::new()),
            keys: Arc::new(FixedKeys::new()),
            publisher: Arc::new(RecordingPublisher::new()),
        }
    }

    /// Orchestrator with default settings and the default (unbounded) poll
    /// policy.
    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(
            self.store.clone(),
            self.deployer.clone(),
            self.inventory.clone(),
            self.keys.clone(),
            self.publisher.clone(),
        )
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
