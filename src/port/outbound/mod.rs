//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the collaborators the orchestrator drives: the
//! record store, the workload deployer, the cluster inventory, key
//! generation, and the message channel.

pub mod channel;
pub mod deployer;
pub mod inventory;
pub mod keys;
pub mod store;
