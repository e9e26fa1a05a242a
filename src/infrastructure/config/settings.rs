//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings.
//! Configuration is loaded from a TOML file, then environment variables
//! override connection URLs and supply every credential. Credentials are
//! never read from the file.
//!
//! # Example
//!
//! ```no_run
//! use proctor::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::broker::BrokerConfig;
use super::cluster::{ClusterConfig, RunMode};
use super::deployer::DeployerConfig;
use super::logging::LoggingConfig;
use super::polling::{EventsConfig, PollingConfig};
use super::store::StoreConfig;
use crate::error::{ConfigError, Result};

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Broker connection, queues, and event exchange.
    #[serde(default)]
    pub broker: BrokerConfig,

    /// Record store location.
    #[serde(default)]
    pub store: StoreConfig,

    /// Cluster client mode and release naming.
    #[serde(default)]
    pub cluster: ClusterConfig,

    /// Packaging engine and chart coordinates.
    #[serde(default)]
    pub deployer: DeployerConfig,

    /// Readiness polling for started workloads.
    #[serde(default)]
    pub polling: PollingConfig,

    /// Outbound event shaping.
    #[serde(default)]
    pub events: EventsConfig,
}

impl Config {
    /// Parse configuration from TOML content and apply process environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        Self::parse_toml_with_env(content, |key| std::env::var(key).ok())
    }

    /// Parse configuration using `lookup` as the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml_with_env<F>(content: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.apply_env(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Initialize the global tracing subscriber.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty("AMQP_URL") {
            self.broker.url = url;
        }
        self.broker.username = non_empty("RABBITMQ_USERNAME");
        self.broker.password = non_empty("RABBITMQ_PASSWORD");

        if let Some(path) = non_empty("DATABASE_URL") {
            self.store.path = path;
        }

        if non_empty("ENVIRONMENT").is_some_and(|env| env.eq_ignore_ascii_case("dev")) {
            self.cluster.mode = RunMode::OutOfCluster;
        }
        if let Some(path) = non_empty("KUBECONFIG") {
            self.cluster.kubeconfig = Some(PathBuf::from(path));
        }

        if let Some(name) = non_empty("HELM_CHART_NAME") {
            self.deployer.chart_name = name;
        }
        if let Some(name) = non_empty("HELM_REPO_NAME") {
            self.deployer.repo_name = name;
        }
        if let Some(url) = non_empty("HELM_REPO_URL") {
            self.deployer.repo_url = url;
        }
        self.deployer.repo_username = non_empty("HELM_REPO_USERNAME");
        self.deployer.repo_password = non_empty("HELM_REPO_PASSWORD");
    }

    /// Validate configuration values.
    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        if self.broker.url.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "broker.url" }.into());
        }
        if self.broker.queues.is_empty() || self.broker.queues.iter().any(|q| q.is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "broker.queues",
                reason: "at least one non-empty queue name is required".to_string(),
            }
            .into());
        }
        if self.broker.exchange.is_empty() {
            return Err(ConfigError::MissingField {
                field: "broker.exchange",
            }
            .into());
        }
        if self.broker.reconnect_delay_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "broker.reconnect_delay_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.store.path.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "store.path" }.into());
        }
        if self.store.pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "store.pool_size",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.cluster.namespace.is_empty() {
            return Err(ConfigError::MissingField {
                field: "cluster.namespace",
            }
            .into());
        }
        if self.cluster.instance_label.is_empty() {
            return Err(ConfigError::MissingField {
                field: "cluster.instance_label",
            }
            .into());
        }

        if self.deployer.repo_name.is_empty() {
            return Err(ConfigError::MissingField {
                field: "deployer.repo_name",
            }
            .into());
        }
        if self.deployer.repo_url.is_empty() {
            return Err(ConfigError::MissingField {
                field: "deployer.repo_url",
            }
            .into());
        }
        if self.deployer.chart_name.is_empty() {
            return Err(ConfigError::MissingField {
                field: "deployer.chart_name",
            }
            .into());
        }

        if self.polling.interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "polling.interval_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.polling.max_attempts == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "polling.max_attempts",
                reason: "must be greater than 0 when set".to_string(),
            }
            .into());
        }

        Ok(())
    }
}
