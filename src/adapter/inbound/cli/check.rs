//! Handler for `check config`.

use std::path::Path;

use serde_json::json;

use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::config::cluster::RunMode;
use crate::infrastructure::config::settings::Config;

/// Load and validate the configuration without connecting to anything.
pub fn execute_config(path: &Path) -> Result<()> {
    let config = Config::load(path)?;

    let mode = match config.cluster.mode {
        RunMode::InCluster => "in-cluster",
        RunMode::OutOfCluster => "out-of-cluster",
    };
    let max_polls = config
        .polling
        .max_attempts
        .map_or_else(|| "unbounded".to_string(), |n| n.to_string());

    if output::is_json() {
        output::json_output(json!({
            "command": "check.config",
            "config": path.display().to_string(),
            "valid": true,
            "broker": config.broker.display_url(),
            "queues": config.broker.queues,
            "exchange": config.broker.exchange,
            "store": config.store.path,
            "cluster_mode": mode,
            "namespace": config.cluster.namespace,
            "chart": config.deployer.chart_reference(),
            "max_polls": max_polls,
        }));
        return Ok(());
    }

    output::section("Configuration Check");
    output::field("Config", path.display());
    output::success("Configuration file is valid");

    output::section("Summary");
    output::field("Broker", config.broker.display_url());
    output::field("Queues", config.broker.queues.join(", "));
    output::field("Exchange", &config.broker.exchange);
    output::field("Store", &config.store.path);
    output::field("Cluster", mode);
    output::field("Namespace", &config.cluster.namespace);
    output::field("Chart", config.deployer.chart_reference());
    output::field("Max polls", max_polls);

    if config.broker.username.is_none() {
        output::warning("RABBITMQ_USERNAME not set; broker URL credentials are used as-is");
    }
    Ok(())
}
