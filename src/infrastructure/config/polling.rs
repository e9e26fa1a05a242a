//! Readiness polling and event settings.

use std::time::Duration;

use serde::Deserialize;

use crate::application::retry::PollPolicy;

/// How the start path waits for a workload to become ready.
#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    /// Settle time between install and the first inventory query.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Unset means poll until the workload runs or fails.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

const fn default_initial_delay_ms() -> u64 {
    2_000
}

const fn default_interval_ms() -> u64 {
    5_000
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            interval_ms: default_interval_ms(),
            max_attempts: None,
        }
    }
}

impl From<&PollingConfig> for PollPolicy {
    fn from(config: &PollingConfig) -> Self {
        let policy = Self::unbounded(
            Duration::from_millis(config.initial_delay_ms),
            Duration::from_millis(config.interval_ms),
        );
        match config.max_attempts {
            Some(max) => policy.with_max_attempts(max),
            None => policy,
        }
    }
}

/// Outbound event shaping.
#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    /// Add `ipaddress` and `port` to `challengeStarted` payloads.
    #[serde(default = "default_true")]
    pub echo_endpoint: bool,
}

const fn default_true() -> bool {
    true
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            echo_endpoint: true,
        }
    }
}
