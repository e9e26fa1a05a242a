//! Builders for records and command bodies used across tests.
//!
//! Every builder uses the same creator (`alice`) and image (`pwn:v1`) so
//! create and start commands line up without extra setup.

use serde_json::json;

use crate::domain::{Attempt, AttemptToken, Challenge, CorrelationId, Image};

/// Registry link shared by the sample image and attempts.
pub const REGISTRY_LINK: &str = "https://registry.example.com/team/pwn:v1";

/// The image every sample create command refers to.
pub fn sample_image() -> Image {
    Image {
        cor_id: CorrelationId::new("img-1"),
        creator_name: "alice".into(),
        image_name: "pwn".into(),
        image_tag: "v1".into(),
        image_registry_link: REGISTRY_LINK.into(),
    }
}

/// A challenge named `name` for the given participants.
pub fn sample_challenge(name: &str, participants: &[&str]) -> Challenge {
    Challenge {
        cor_id: CorrelationId::new(format!("cor-{name}")),
        creator_name: "alice".into(),
        challenge_name: name.into(),
        image_name: "pwn".into(),
        image_tag: "v1".into(),
        participants: participants.iter().map(|p| (*p).to_string()).collect(),
        image_registry_link: REGISTRY_LINK.into(),
    }
}

/// An unbound attempt on challenge `heap` with a fixed token.
pub fn sample_attempt(token: &str) -> Attempt {
    let mut attempt = Attempt::pending(&sample_challenge("heap", &[]), &format!("p-{token}"));
    attempt.token = AttemptToken::new(token);
    attempt
}

/// Body of a create command for challenge `name`.
pub fn create_body(name: &str, participants: &[&str]) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "creatorName": "alice",
        "challengeName": name,
        "imageName": "pwn",
        "imageTag": "v1",
        "participants": participants,
    }))
    .expect("json literal serializes")
}

/// Body of a start command that resolves its image from the attempt.
pub fn start_body(token: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({ "token": token })).expect("json literal serializes")
}
