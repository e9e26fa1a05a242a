//! Cluster inventory backed by the Kubernetes API.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Node, Pod, Service};
use kube::api::ListParams;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client};
use tracing::info;

use crate::domain::PodPhase;
use crate::error::{ConfigError, Error, Result};
use crate::infrastructure::config::cluster::{ClusterConfig, RunMode};
use crate::port::ClusterInventory;

/// Build a client for the configured run mode.
///
/// `in-cluster` reads the mounted service-account credentials;
/// `out-of-cluster` reads the kubeconfig file, which must exist.
///
/// # Errors
/// Returns an error if credentials cannot be loaded.
pub async fn connect_client(config: &ClusterConfig) -> Result<Client> {
    let kube_config = match config.mode {
        RunMode::InCluster => kube::Config::incluster()
            .map_err(|e| Error::Connection(format!("in-cluster credentials: {e}")))?,
        RunMode::OutOfCluster => {
            let path = config
                .kubeconfig_path()
                .ok_or(ConfigError::MissingField {
                    field: "cluster.kubeconfig",
                })?;
            let kubeconfig = Kubeconfig::read_from(&path)
                .map_err(|e| Error::Connection(format!("kubeconfig {}: {e}", path.display())))?;
            info!(path = %path.display(), "Using kubeconfig");
            kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .map_err(|e| Error::Connection(format!("kubeconfig {}: {e}", path.display())))?
        }
    };
    Ok(Client::try_from(kube_config)?)
}

/// Read-only pod, node and service queries.
#[derive(Clone)]
pub struct KubeInventory {
    client: Client,
}

impl KubeInventory {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn pod_phase(pod: &Pod) -> PodPhase {
    pod.status
        .as_ref()
        .and_then(|status| status.phase.as_deref())
        .map_or(PodPhase::Unknown, PodPhase::parse)
}

fn first_node_address(nodes: &[Node]) -> Option<String> {
    nodes
        .first()?
        .status
        .as_ref()?
        .addresses
        .as_ref()?
        .first()
        .map(|address| address.address.clone())
}

/// Node port of the first service port, falling back to the service port.
fn exposed_port(service: &Service) -> Option<i32> {
    let port = service.spec.as_ref()?.ports.as_ref()?.first()?;
    Some(port.node_port.unwrap_or(port.port))
}

#[async_trait]
impl ClusterInventory for KubeInventory {
    async fn pod_phases(&self, namespace: &str, label_selector: &str) -> Result<Vec<PodPhase>> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let list = pods
            .list(&ListParams::default().labels(label_selector))
            .await?;
        Ok(list.items.iter().map(pod_phase).collect())
    }

    async fn node_address(&self) -> Result<String> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        let list = nodes.list(&ListParams::default()).await?;
        first_node_address(&list.items)
            .ok_or_else(|| Error::Inventory("no node reports an address".into()))
    }

    async fn service_port(&self, namespace: &str, service: &str) -> Result<u16> {
        let services: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        let found = services.get(service).await?;
        let port = exposed_port(&found)
            .ok_or_else(|| Error::Inventory(format!("service {service} exposes no port")))?;
        u16::try_from(port)
            .map_err(|_| Error::Inventory(format!("service {service} port {port} out of range")))
    }
}
