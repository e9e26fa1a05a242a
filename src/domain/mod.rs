//! Pure domain types for challenge lifecycle orchestration.
//!
//! Nothing in here performs I/O.

pub mod command;
pub mod error;
pub mod event;
pub mod id;
pub mod image;
pub mod lifecycle;
pub mod record;
pub mod routing;
pub mod workload;

pub use command::{CreateChallenge, LifecycleCommand, Payload, StartChallenge};
pub use error::DomainError;
pub use event::{EventStatus, LifecycleEvent};
pub use id::{AttemptToken, CorrelationId, ReleaseId};
pub use image::ImageReference;
pub use lifecycle::{CreatePhase, StartPhase};
pub use record::{Attempt, AttemptBinding, Challenge, Image, ImageKey};
pub use routing::{event_routing_key, routing_suffix, CommandKind};
pub use workload::{AccessKeyPair, Endpoint, PodPhase};
