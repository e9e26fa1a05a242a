//! Composition root: builds adapters from configuration and runs the
//! consume loops.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::adapter::outbound::amqp::{AmqpPublisher, AmqpSource};
use crate::adapter::outbound::helm::HelmDeployer;
use crate::adapter::outbound::keys::SshKeyGenerator;
use crate::adapter::outbound::kubernetes::{connect_client, KubeInventory};
use crate::adapter::outbound::memory::MemoryStore;
use crate::adapter::outbound::reconnecting::ReconnectingSource;
use crate::adapter::outbound::sqlite::database::connection::{create_pool, run_migrations};
use crate::adapter::outbound::sqlite::SqliteRecordStore;
use crate::application::{ConsumeLoop, ConsumeSummary, Orchestrator, OrchestratorSettings};
use crate::error::{Error, Result};
use crate::infrastructure::config::cluster::RunMode;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::config::store::StoreConfig;
use crate::port::{MessageSource, RecordStore};

/// Store path that selects the in-memory store.
pub const MEMORY_STORE: &str = ":memory:";

/// Open the configured record store, applying migrations for SQLite.
///
/// # Errors
/// Returns an error if the database cannot be opened or migrated.
pub fn build_store(config: &StoreConfig) -> Result<Arc<dyn RecordStore>> {
    if config.path == MEMORY_STORE {
        info!("Using in-memory record store");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let pool = create_pool(&config.path, config.pool_size)?;
    run_migrations(&pool)?;
    info!(path = %config.path, "Record store ready");
    Ok(Arc::new(SqliteRecordStore::new(pool)))
}

#[must_use]
pub fn orchestrator_settings(config: &Config) -> OrchestratorSettings {
    OrchestratorSettings {
        namespace: config.cluster.namespace.clone(),
        release_prefix: config.cluster.release_prefix.clone(),
        instance_label: config.cluster.instance_label.clone(),
        service_suffix: config.cluster.service_suffix.clone(),
        event_namespace: config.broker.event_namespace.clone(),
        echo_endpoint: config.events.echo_endpoint,
    }
}

/// Kubeconfig handed to helm so it installs into the cluster the inventory
/// polls. In cluster, helm uses the mounted service account.
#[must_use]
pub fn helm_kubeconfig(config: &Config) -> Option<PathBuf> {
    match config.cluster.mode {
        RunMode::OutOfCluster => config.cluster.kubeconfig_path(),
        RunMode::InCluster => None,
    }
}

/// Build the orchestrator against the real broker, cluster and helm.
///
/// # Errors
/// Returns an error if the store or the cluster client cannot be set up.
pub async fn build_orchestrator(config: &Config) -> Result<Arc<Orchestrator>> {
    let store = build_store(&config.store)?;
    let client = connect_client(&config.cluster).await?;
    let publisher = AmqpPublisher::new(
        config.broker.connection_url()?,
        config.broker.exchange.clone(),
    );

    let orchestrator = Orchestrator::new(
        store,
        Arc::new(
            HelmDeployer::new(config.deployer.clone()).with_kubeconfig(helm_kubeconfig(config)),
        ),
        Arc::new(KubeInventory::new(client)),
        Arc::new(SshKeyGenerator),
        Arc::new(publisher),
    )
    .with_settings(orchestrator_settings(config))
    .with_poll_policy((&config.polling).into());

    Ok(Arc::new(orchestrator))
}

/// Run one consume loop per source until shutdown or until every source ends.
///
/// Failed deliveries are requeued after `requeue_delay`.
///
/// # Errors
/// Returns the first loop failure after all loops have stopped.
pub async fn run_consumers<S>(
    sources: Vec<S>,
    orchestrator: Arc<Orchestrator>,
    requeue_delay: Duration,
    shutdown: watch::Receiver<bool>,
) -> Result<Vec<ConsumeSummary>>
where
    S: MessageSource + 'static,
{
    let mut loops = JoinSet::new();
    for source in sources {
        let consume = ConsumeLoop::new(source, Arc::clone(&orchestrator))
            .with_requeue_delay(requeue_delay);
        loops.spawn(consume.run(shutdown.clone()));
    }

    let mut summaries = Vec::new();
    let mut failure = None;
    while let Some(joined) = loops.join_next().await {
        match joined {
            Ok(Ok(summary)) => summaries.push(summary),
            Ok(Err(e)) => {
                error!(error = %e, "Consume loop failed");
                failure.get_or_insert(e);
            }
            Err(e) => {
                error!(error = %e, "Consume loop panicked");
                failure.get_or_insert(Error::Connection(format!("consume loop aborted: {e}")));
            }
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(summaries),
    }
}

/// Start the service: one reconnecting consumer per configured queue.
///
/// # Errors
/// Returns an error if startup wiring fails.
pub async fn run(config: Config, shutdown: watch::Receiver<bool>) -> Result<()> {
    let orchestrator = build_orchestrator(&config).await?;
    let url = config.broker.connection_url()?;
    let delay = Duration::from_millis(config.broker.reconnect_delay_ms);

    let sources: Vec<_> = config
        .broker
        .queues
        .iter()
        .map(|queue| {
            let source = AmqpSource::new(
                url.clone(),
                queue.clone(),
                config.broker.consumer_tag.clone(),
            );
            ReconnectingSource::new(source, delay)
        })
        .collect();

    info!(
        broker = %config.broker.display_url(),
        queues = ?config.broker.queues,
        exchange = %config.broker.exchange,
        "Starting consumers"
    );
    let summaries = run_consumers(sources, orchestrator, delay, shutdown).await?;

    for summary in summaries {
        info!(
            completed = summary.completed,
            dropped = summary.dropped,
            requeued = summary.requeued,
            "Consumer stopped"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit;

    #[tokio::test]
    async fn memory_path_selects_memory_store() {
        let store = build_store(&StoreConfig {
            path: MEMORY_STORE.into(),
            pool_size: 1,
        })
        .unwrap();
        assert!(store
            .find_attempt(&crate::domain::AttemptToken::new("x"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn file_path_opens_migrated_sqlite_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.db");
        let store = build_store(&StoreConfig {
            path: path.to_string_lossy().into_owned(),
            pool_size: 2,
        })
        .unwrap();
        store
            .insert_image(&testkit::domain::sample_image())
            .await
            .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn settings_follow_config() {
        let mut config = testkit::config::minimal();
        config.cluster.namespace = "ctf".into();
        config.broker.event_namespace = "svc.events".into();
        config.events.echo_endpoint = false;

        let settings = orchestrator_settings(&config);
        assert_eq!(settings.namespace, "ctf");
        assert_eq!(settings.event_namespace, "svc.events");
        assert!(!settings.echo_endpoint);
    }

    #[test]
    fn helm_follows_out_of_cluster_kubeconfig() {
        let mut config = testkit::config::minimal();
        config.cluster.mode = RunMode::OutOfCluster;
        config.cluster.kubeconfig = Some(PathBuf::from("/etc/proctor/kubeconfig"));
        assert_eq!(
            helm_kubeconfig(&config),
            Some(PathBuf::from("/etc/proctor/kubeconfig"))
        );

        config.cluster.mode = RunMode::InCluster;
        assert_eq!(helm_kubeconfig(&config), None);
    }
}
