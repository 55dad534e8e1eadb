use super::{ChannelId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Command,
    Button,
    Text,
}

/// Inbound event from the chat client.
///
/// Button payloads are `<prefix>:<argument>`, where the prefix names the game
/// kind (see [`super::GameKind::prefix`]). Text payloads are the raw message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub actor: UserId,
    pub channel: ChannelId,
    pub kind: InteractionKind,
    pub payload: String,
    /// Client-side arrival time in ms since the Unix epoch.
    pub arrival_ms: u64,
}

impl Interaction {
    /// Split a button payload into its prefix and argument.
    pub fn split_payload(&self) -> Option<(&str, &str)> {
        self.payload.split_once(':')
    }
}

/// A selectable option rendered by the client (typically a button).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub label: String,
}

impl Choice {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Who should see a prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "user", rename_all = "lowercase")]
pub enum Audience {
    /// Everyone in the channel.
    Channel,
    /// A transient notice only the user sees.
    Private(UserId),
}

/// Outbound "present to user" request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub session: u64,
    pub channel: ChannelId,
    pub audience: Audience,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at_ms: Option<u64>,
}
