//! AMQP 0.9.1 transport via lapin.
//!
//! [`AmqpSource`] consumes one queue over its own connection; wrap it in
//! [`ReconnectingSource`](crate::adapter::outbound::reconnecting::ReconnectingSource)
//! for automatic recovery. [`AmqpPublisher`] publishes lifecycle events to
//! the topic exchange and reopens its connection on the next publish after a
//! failure.

mod publisher;
mod source;

pub use publisher::AmqpPublisher;
pub use source::AmqpSource;

use lapin::{Connection, ConnectionProperties};

use crate::error::Result;

async fn open_connection(url: &str, name: &str) -> Result<Connection> {
    let properties = ConnectionProperties::default().with_connection_name(name.into());
    Ok(Connection::connect(url, properties).await?)
}
