//! Proctor - message-driven lifecycle orchestration for challenge workloads.
//!
//! Consumes `challengeCreate` and `challengeStart` commands from AMQP queues,
//! persists challenge and attempt records, installs one workload release per
//! attempt via Helm, polls the cluster until it runs, and publishes lifecycle
//! events back to a topic exchange.
//!
//! # Architecture
//!
//! Hexagonal layout:
//!
//! - [`domain`] - Records, commands, events and lifecycle phases. No I/O.
//! - [`port`] - Traits the orchestrator drives: store, deployer, inventory,
//!   key generator, message source and publisher.
//! - [`application`] - The orchestrator state machines and the consume loop.
//! - [`adapter`] - lapin, Diesel/SQLite, Helm CLI, kube-rs and ssh-key
//!   implementations, plus the operator CLI.
//! - [`infrastructure`] - Configuration and the composition root.
//!
//! # Features
//!
//! - `testkit` - Recording fakes and fixtures for integration tests.

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
