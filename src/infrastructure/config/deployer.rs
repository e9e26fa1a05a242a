//! Packaging engine (Helm) settings.

use serde::Deserialize;

/// Chart repository coordinates and per-release image settings.
///
/// Repository credentials come from `HELM_REPO_USERNAME` /
/// `HELM_REPO_PASSWORD` only.
#[derive(Debug, Clone, Deserialize)]
pub struct DeployerConfig {
    #[serde(default = "default_helm_binary")]
    pub helm_binary: String,
    /// Overridden by `HELM_REPO_NAME`.
    #[serde(default)]
    pub repo_name: String,
    /// Overridden by `HELM_REPO_URL`.
    #[serde(default)]
    pub repo_url: String,
    #[serde(skip)]
    pub repo_username: Option<String>,
    #[serde(skip)]
    pub repo_password: Option<String>,
    /// Overridden by `HELM_CHART_NAME`.
    #[serde(default)]
    pub chart_name: String,
    /// Registry host rendered into the release's image values.
    #[serde(default = "default_registry")]
    pub registry: String,
    #[serde(default = "default_pull_policy")]
    pub pull_policy: String,
    #[serde(default = "default_pull_secret")]
    pub pull_secret: Option<String>,
}

fn default_helm_binary() -> String {
    "helm".into()
}

fn default_registry() -> String {
    "registry.gitlab.com".into()
}

fn default_pull_policy() -> String {
    "IfNotPresent".into()
}

#[allow(clippy::unnecessary_wraps)]
fn default_pull_secret() -> Option<String> {
    Some("docker-registry-credentials".into())
}

impl DeployerConfig {
    /// `<repo>/<chart>` as the packaging engine expects it.
    #[must_use]
    pub fn chart_reference(&self) -> String {
        format!("{}/{}", self.repo_name, self.chart_name)
    }
}

impl Default for DeployerConfig {
    fn default() -> Self {
        Self {
            helm_binary: default_helm_binary(),
            repo_name: String::new(),
            repo_url: String::new(),
            repo_username: None,
            repo_password: None,
            chart_name: String::new(),
            registry: default_registry(),
            pull_policy: default_pull_policy(),
            pull_secret: default_pull_secret(),
        }
    }
}
