//! Outbound adapters (driven side).

pub mod amqp;
pub mod helm;
pub mod keys;
pub mod kubernetes;
pub mod memory;
pub mod reconnecting;
pub mod sqlite;
