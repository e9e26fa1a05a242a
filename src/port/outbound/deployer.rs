//! Workload deployer port.

use async_trait::async_trait;

use crate::domain::{ImageReference, ReleaseId};
use crate::error::Result;

/// Per-release parameters for one workload instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSpec {
    pub release: ReleaseId,
    pub namespace: String,
    pub image: ImageReference,
    /// Public key the workload must accept for access.
    pub authorized_key: String,
}

/// Installs packaged workload templates on the cluster.
///
/// Chart coordinates and registry settings belong to the implementation.
#[async_trait]
pub trait WorkloadDeployer: Send + Sync {
    /// Install the release, or upgrade it in place if it already exists.
    ///
    /// Must be idempotent under the same release id: calling twice with the
    /// same spec leaves the cluster as if it had been called once.
    async fn install_or_upgrade(&self, spec: &ReleaseSpec) -> Result<()>;

    /// Name of the packaging engine for logging.
    fn engine_name(&self) -> &'static str;
}
