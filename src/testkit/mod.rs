//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`channel`] - Mock [`MessageSource`](crate::port::MessageSource)
//!   implementations: `ScriptedSource` and the redelivering `FakeBroker`.
//! - [`collaborators`] - Recording fakes for the publisher, deployer,
//!   inventory, key generator, and a fault-injecting record store.
//! - [`orchestrator`] - `Harness` wiring every fake into an orchestrator.
//! - [`domain`] - Builders for records and command bodies.
//! - [`config`] - Canonical test configurations.

pub mod channel;
pub mod collaborators;
pub mod config;
pub mod domain;
pub mod orchestrator;
