//! Domain validation errors.
//!
//! Returned when an inbound command or a stored value violates a domain rule.
//! These are validation faults: terminal for the message that carried them.

use thiserror::Error;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Image registry links must resolve to a repository and a tag.
    #[error("invalid image reference '{reference}': {reason}")]
    InvalidImageReference {
        /// The reference as received.
        reference: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A challenge needs at least one participant.
    #[error("participants cannot be empty")]
    EmptyParticipants,

    /// The payload was JSON but did not match the command shape.
    #[error("malformed {kind} command: {reason}")]
    MalformedCommand {
        /// The command selector.
        kind: &'static str,
        /// Decoder message.
        reason: String,
    },

    /// The payload was not a JSON object at all.
    #[error("payload is not a JSON object: {0}")]
    NotAnObject(String),
}
