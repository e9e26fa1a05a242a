//! Routing-key helpers for inbound dispatch and outbound events.

use std::fmt;

use super::event::EventStatus;

/// Return the trailing dot-separated segment of a routing key.
///
/// `"team.challengeCreate"` yields `"challengeCreate"`; a key without dots is
/// returned whole, and the empty key stays empty.
#[must_use]
pub fn routing_suffix(routing_key: &str) -> &str {
    match routing_key.rsplit_once('.') {
        Some((_, suffix)) => suffix,
        None => routing_key,
    }
}

/// Build the outbound routing key `<namespace>.<suffix>`.
#[must_use]
pub fn event_routing_key(namespace: &str, status: EventStatus) -> String {
    if namespace.is_empty() {
        status.as_str().to_string()
    } else {
        format!("{namespace}.{status}")
    }
}

/// Command selector carried in the inbound routing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Create,
    Start,
}

impl CommandKind {
    /// Resolve a routing key to a command kind. Unknown selectors yield `None`.
    #[must_use]
    pub fn from_routing_key(routing_key: &str) -> Option<Self> {
        match routing_suffix(routing_key) {
            "challengeCreate" => Some(Self::Create),
            "challengeStart" => Some(Self::Start),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "challengeCreate",
            Self::Start => "challengeStart",
        }
    }

    /// The event emitted when this command cannot be carried out.
    #[must_use]
    pub const fn failure_status(self) -> EventStatus {
        match self {
            Self::Create => EventStatus::ChallengeCreateFailed,
            Self::Start => EventStatus::ChallengeStartFailed,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_of_simple_key() {
        assert_eq!(routing_suffix("test.imageCreate"), "imageCreate");
    }

    #[test]
    fn suffix_of_key_with_multiple_dots() {
        assert_eq!(
            routing_suffix("test.multiple.dots.imageCreated"),
            "imageCreated"
        );
    }

    #[test]
    fn suffix_of_key_without_dots() {
        assert_eq!(routing_suffix("nodots"), "nodots");
    }

    #[test]
    fn suffix_of_empty_key() {
        assert_eq!(routing_suffix(""), "");
    }

    #[test]
    fn trailing_dot_gives_empty_suffix() {
        assert_eq!(routing_suffix("team."), "");
    }

    #[test]
    fn command_kind_dispatch() {
        assert_eq!(
            CommandKind::from_routing_key("team.challengeCreate"),
            Some(CommandKind::Create)
        );
        assert_eq!(
            CommandKind::from_routing_key("challengeStart"),
            Some(CommandKind::Start)
        );
        assert_eq!(CommandKind::from_routing_key("team.imageCreate"), None);
        assert_eq!(CommandKind::from_routing_key(""), None);
    }

    #[test]
    fn outbound_key_appends_status() {
        assert_eq!(
            event_routing_key("challenge.fromService", EventStatus::ChallengeStarting),
            "challenge.fromService.challengeStarting"
        );
        assert_eq!(
            event_routing_key("", EventStatus::ChallengeCreated),
            "challengeCreated"
        );
    }
}
