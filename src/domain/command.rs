//! Inbound lifecycle commands.
//!
//! A delivery is decoded in two steps. The body is first read as an ordered
//! JSON object ([`Payload`]) so every field, known or not, can be echoed back
//! in the outbound event. The object is then projected into the typed
//! [`LifecycleCommand`] selected by the routing key.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::error::DomainError;
use super::id::{AttemptToken, CorrelationId};
use super::image::ImageReference;
use super::record::ImageKey;
use super::routing::CommandKind;

/// Ordered key/value echo of an inbound payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload(Map<String, Value>);

impl Payload {
    /// Parse a message body. Anything but a JSON object is rejected.
    pub fn from_slice(body: &[u8]) -> Result<Self, DomainError> {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            Ok(other) => Err(DomainError::NotAnObject(format!(
                "expected object, got {}",
                json_kind(&other)
            ))),
            Err(e) => Err(DomainError::NotAnObject(e.to_string())),
        }
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    fn project<T: serde::de::DeserializeOwned>(&self, kind: CommandKind) -> Result<T, DomainError> {
        serde_json::from_value(Value::Object(self.0.clone())).map_err(|e| {
            DomainError::MalformedCommand {
                kind: kind.as_str(),
                reason: e.to_string(),
            }
        })
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parameters for creating a challenge and its attempts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChallenge {
    #[serde(default)]
    pub cor_id: Option<CorrelationId>,
    pub creator_name: String,
    pub challenge_name: String,
    pub image_name: String,
    pub image_tag: String,
    pub participants: Vec<String>,
}

impl CreateChallenge {
    #[must_use]
    pub fn image_key(&self) -> ImageKey {
        ImageKey::new(&self.creator_name, &self.image_name, &self.image_tag)
    }
}

/// Parameters for starting one attempt's workload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartChallenge {
    pub token: AttemptToken,
    #[serde(default)]
    pub image_registry_link: Option<String>,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

impl StartChallenge {
    /// Image carried by the command itself, if any.
    ///
    /// Explicit `repository` + `tag` win over `imageRegistryLink`. `Ok(None)`
    /// means the caller must resolve the image from the attempt record.
    pub fn image(&self) -> Result<Option<ImageReference>, DomainError> {
        match (&self.repository, &self.tag) {
            (Some(repository), Some(tag)) if !repository.is_empty() && !tag.is_empty() => {
                return Ok(Some(ImageReference::new(repository, tag)));
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(DomainError::MalformedCommand {
                    kind: CommandKind::Start.as_str(),
                    reason: "repository and tag must be supplied together".into(),
                });
            }
            _ => {}
        }

        match self.image_registry_link.as_deref() {
            Some(link) if !link.is_empty() => ImageReference::parse(link).map(Some),
            _ => Ok(None),
        }
    }
}

/// Typed command union, tagged by the routing-key selector.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleCommand {
    Create(CreateChallenge),
    Start(StartChallenge),
}

impl LifecycleCommand {
    /// Project a parsed payload into the command selected by `kind`.
    pub fn decode(kind: CommandKind, payload: &Payload) -> Result<Self, DomainError> {
        match kind {
            CommandKind::Create => {
                let create: CreateChallenge = payload.project(kind)?;
                if create.participants.is_empty() {
                    return Err(DomainError::EmptyParticipants);
                }
                Ok(Self::Create(create))
            }
            CommandKind::Start => payload.project(kind).map(Self::Start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_object_bodies_are_rejected() {
        assert!(matches!(
            Payload::from_slice(b"[1,2]"),
            Err(DomainError::NotAnObject(_))
        ));
        assert!(matches!(
            Payload::from_slice(b"not json"),
            Err(DomainError::NotAnObject(_))
        ));
    }

    #[test]
    fn decodes_create_and_keeps_unknown_fields_in_payload() {
        let payload = Payload::from_slice(
            br#"{"creatorName":"alice","challengeName":"heap","imageName":"pwn",
                 "imageTag":"v1","participants":["bob"],"note":"kept"}"#,
        )
        .unwrap();

        let command = LifecycleCommand::decode(CommandKind::Create, &payload).unwrap();
        let LifecycleCommand::Create(create) = command else {
            panic!("expected create command");
        };
        assert_eq!(create.participants, vec!["bob".to_string()]);
        assert!(create.cor_id.is_none());
        assert_eq!(create.image_key(), ImageKey::new("alice", "pwn", "v1"));
        assert_eq!(payload.get("note"), Some(&Value::String("kept".into())));
    }

    #[test]
    fn create_without_participants_is_rejected() {
        let payload = Payload::from_slice(
            br#"{"creatorName":"a","challengeName":"c","imageName":"i","imageTag":"t","participants":[]}"#,
        )
        .unwrap();
        assert_eq!(
            LifecycleCommand::decode(CommandKind::Create, &payload),
            Err(DomainError::EmptyParticipants)
        );
    }

    #[test]
    fn create_missing_fields_is_malformed() {
        let payload = Payload::from_slice(br#"{"creatorName":"a"}"#).unwrap();
        assert!(matches!(
            LifecycleCommand::decode(CommandKind::Create, &payload),
            Err(DomainError::MalformedCommand {
                kind: "challengeCreate",
                ..
            })
        ));
    }

    #[test]
    fn start_prefers_explicit_repository_and_tag() {
        let payload = Payload::from_slice(
            br#"{"token":"t1","repository":"team/pwn","tag":"v2",
                 "imageRegistryLink":"https://other/x:v9"}"#,
        )
        .unwrap();
        let LifecycleCommand::Start(start) =
            LifecycleCommand::decode(CommandKind::Start, &payload).unwrap()
        else {
            panic!("expected start command");
        };
        assert_eq!(
            start.image().unwrap(),
            Some(ImageReference::new("team/pwn", "v2"))
        );
    }

    #[test]
    fn start_falls_back_to_registry_link() {
        let payload =
            Payload::from_slice(br#"{"token":"t1","imageRegistryLink":"https://r.io/pwn:v1"}"#)
                .unwrap();
        let LifecycleCommand::Start(start) =
            LifecycleCommand::decode(CommandKind::Start, &payload).unwrap()
        else {
            panic!("expected start command");
        };
        assert_eq!(start.image().unwrap(), Some(ImageReference::new("r.io/pwn", "v1")));
    }

    #[test]
    fn start_without_image_defers_to_store() {
        let payload = Payload::from_slice(br#"{"token":"t1"}"#).unwrap();
        let LifecycleCommand::Start(start) =
            LifecycleCommand::decode(CommandKind::Start, &payload).unwrap()
        else {
            panic!("expected start command");
        };
        assert_eq!(start.image().unwrap(), None);
    }

    #[test]
    fn start_with_half_an_image_is_malformed() {
        let payload = Payload::from_slice(br#"{"token":"t1","repository":"team/pwn"}"#).unwrap();
        let LifecycleCommand::Start(start) =
            LifecycleCommand::decode(CommandKind::Start, &payload).unwrap()
        else {
            panic!("expected start command");
        };
        assert!(start.image().is_err());
    }
}
