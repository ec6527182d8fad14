//! Conversation turns as seen by the voice subsystem.
//!
//! The conversation itself (message list, rendering, transport) is an
//! external collaborator. The voice pipeline only appends tagged user turns
//! and observes the conversation's lifecycle through [`ConversationEvent`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a user turn.
pub type TurnId = Uuid;

/// Marker prepended to voice-originated user turns.
pub const DEFAULT_VOICE_TAG: &str = "[VOICE_MODE]";

/// Marks a user turn as "originated from voice capture, read the reply aloud".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceTag(String);

impl VoiceTag {
    /// Create a tag with a custom marker.
    pub fn new(marker: impl Into<String>) -> Self {
        Self(marker.into())
    }

    /// The raw marker string.
    pub fn marker(&self) -> &str {
        &self.0
    }

    /// Render `text` as tagged conversation content.
    pub fn apply(&self, text: &str) -> String {
        format!("{}{text}", self.0)
    }

    /// Whether `content` carries this tag.
    pub fn is_tagged(&self, content: &str) -> bool {
        content.starts_with(&self.0)
    }

    /// Remove the tag from `content`.
    ///
    /// Returns the cleaned text if the content was tagged, `None` otherwise.
    /// Conversation adapters use this before sending text upstream.
    pub fn strip<'a>(&self, content: &'a str) -> Option<&'a str> {
        content.strip_prefix(self.0.as_str()).map(str::trim)
    }
}

impl Default for VoiceTag {
    fn default() -> Self {
        Self(DEFAULT_VOICE_TAG.to_string())
    }
}

/// A user turn appended to the conversation by the voice pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTurn {
    pub id: TurnId,
    /// The transcript, untagged.
    pub text: String,
    /// Voice tag, if this turn originated from voice capture.
    pub tag: Option<VoiceTag>,
}

impl UserTurn {
    /// A voice-originated turn carrying `tag`.
    pub fn voice(text: impl Into<String>, tag: VoiceTag) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            tag: Some(tag),
        }
    }

    /// A plain (typed) turn.
    pub fn typed(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            tag: None,
        }
    }

    /// Whether the turn came from voice capture.
    pub const fn is_voice(&self) -> bool {
        self.tag.is_some()
    }

    /// Content as it should appear in the conversation (tagged when voice).
    pub fn content(&self) -> String {
        match &self.tag {
            Some(tag) => tag.apply(&self.text),
            None => self.text.clone(),
        }
    }
}

/// A complete assistant reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantTurn {
    /// Conversation-assigned identifier.
    pub id: String,
    /// Full reply text.
    pub text: String,
    /// The user turn this reply answers, when the conversation knows it.
    pub in_reply_to: Option<TurnId>,
}

impl AssistantTurn {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            in_reply_to: None,
        }
    }

    /// Mark this reply as the answer to the user turn `turn`.
    #[must_use]
    pub fn replying_to(mut self, turn: TurnId) -> Self {
        self.in_reply_to = Some(turn);
        self
    }

    /// Whether this reply answers the user turn `turn`.
    pub fn answers(&self, turn: TurnId) -> bool {
        self.in_reply_to == Some(turn)
    }
}

/// Lifecycle events the conversation reports to the voice pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationEvent {
    /// Streaming, not-yet-final content of an assistant turn.
    AssistantTurnDelta { turn_id: String, text: String },

    /// An assistant turn the conversation considers finished.
    AssistantTurnFinalized(AssistantTurn),

    /// Reply generation was stopped before it finalized.
    ///
    /// `in_reply_to` names the user turn whose reply was abandoned; `None`
    /// means the conversation cannot tell.
    GenerationCancelled { in_reply_to: Option<TurnId> },
}
