//! Infrastructure configuration modules.

pub mod broker;
pub mod cluster;
pub mod deployer;
pub mod logging;
pub mod polling;
pub mod settings;
pub mod store;
