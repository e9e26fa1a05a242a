//! Cluster access and release naming settings.

use std::path::PathBuf;

use serde::Deserialize;

/// How the cluster client is constructed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    /// Service-account credentials mounted into the pod.
    #[default]
    InCluster,
    /// A kubeconfig file, for development against a remote cluster.
    OutOfCluster,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    /// Client construction mode. `ENVIRONMENT=DEV` forces `out-of-cluster`.
    #[serde(default)]
    pub mode: RunMode,
    /// Kubeconfig path for `out-of-cluster`. Overridden by `KUBECONFIG`;
    /// defaults to `$HOME/.kube/config`.
    #[serde(default)]
    pub kubeconfig: Option<PathBuf>,
    /// Namespace that receives challenge releases.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_release_prefix")]
    pub release_prefix: String,
    /// Pod label carrying the release name.
    #[serde(default = "default_instance_label")]
    pub instance_label: String,
    /// Suffix appended to the release name to find its service.
    #[serde(default = "default_service_suffix")]
    pub service_suffix: String,
}

fn default_namespace() -> String {
    "challenge".into()
}

fn default_release_prefix() -> String {
    "a".into()
}

fn default_instance_label() -> String {
    "app.kubernetes.io/instance".into()
}

fn default_service_suffix() -> String {
    "-challenge".into()
}

impl ClusterConfig {
    /// Kubeconfig location, falling back to `$HOME/.kube/config`.
    #[must_use]
    pub fn kubeconfig_path(&self) -> Option<PathBuf> {
        self.kubeconfig.clone().or_else(|| {
            std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".kube").join("config"))
        })
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            kubeconfig: None,
            namespace: default_namespace(),
            release_prefix: default_release_prefix(),
            instance_label: default_instance_label(),
            service_suffix: default_service_suffix(),
        }
    }
}
