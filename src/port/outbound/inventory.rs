//! Cluster inventory port: read-only queries about running releases.

use async_trait::async_trait;

use crate::domain::PodPhase;
use crate::error::Result;

#[async_trait]
pub trait ClusterInventory: Send + Sync {
    /// Phases of the pods matching `label_selector`, in the order the cluster
    /// lists them. The first entry is the lead pod.
    async fn pod_phases(&self, namespace: &str, label_selector: &str) -> Result<Vec<PodPhase>>;

    /// First reported address of the first node.
    async fn node_address(&self) -> Result<String>;

    /// First externally exposed port of `service`.
    async fn service_port(&self, namespace: &str, service: &str) -> Result<u16>;
}
