//! The voice turn state machine.
//!
//! ```text
//!   Idle → Recording → Transcribing → AwaitingReply → Synthesizing → Playing → Idle
//!    ▲         │             │               │               │           │
//!    └─────────┴─────────────┴───── cancel / empty / failure ┴───────────┘
//! ```
//!
//! `Error` is transient: it is entered when a stage fails, a notice is
//! raised, and the machine immediately settles back to `Idle`.

use serde::{Deserialize, Serialize};

/// Current stage of a voice turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VoiceTurnState {
    /// No voice turn in progress.
    #[default]
    Idle,

    /// Microphone open, chunks accumulating.
    Recording,

    /// Clip handed to the transcription collaborator.
    Transcribing,

    /// Tagged user turn appended; waiting for the assistant reply to finalize.
    AwaitingReply,

    /// Reply text sent to the synthesis collaborator.
    Synthesizing,

    /// Synthesized reply audible on the speaker.
    Playing,

    /// A stage failed; resets to `Idle` after the notice is raised.
    Error,
}

impl VoiceTurnState {
    /// Whether `self → next` is a legal edge of the state machine.
    ///
    /// Every non-idle state may fall back to `Idle` (cancel) or `Error`
    /// (failure). Forward edges follow the pipeline order.
    pub const fn can_transition_to(self, next: Self) -> bool {
        use VoiceTurnState::{
            AwaitingReply, Error, Idle, Playing, Recording, Synthesizing, Transcribing,
        };
        match (self, next) {
            (Idle, Recording)
            | (Recording, Transcribing)
            | (Transcribing, AwaitingReply)
            | (AwaitingReply, Synthesizing)
            | (Synthesizing, Playing)
            | (Error, Idle) => true,
            (Idle | Error, _) => false,
            (_, Idle | Error) => true,
            _ => false,
        }
    }

    /// Whether any stage of a turn is in flight.
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// Stable lowercase label for logs and status payloads.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Transcribing => "transcribing",
            Self::AwaitingReply => "awaiting_reply",
            Self::Synthesizing => "synthesizing",
            Self::Playing => "playing",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for VoiceTurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::VoiceTurnState::*;

    #[test]
    fn forward_edges_are_legal() {
        let path = [
            Idle,
            Recording,
            Transcribing,
            AwaitingReply,
            Synthesizing,
            Playing,
            Idle,
        ];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} should be legal",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn skipping_stages_is_illegal() {
        assert!(!Idle.can_transition_to(Transcribing));
        assert!(!Recording.can_transition_to(AwaitingReply));
        assert!(!Transcribing.can_transition_to(Playing));
        assert!(!AwaitingReply.can_transition_to(Recording));
    }

    #[test]
    fn every_active_state_can_reset() {
        for state in [Recording, Transcribing, AwaitingReply, Synthesizing, Playing] {
            assert!(state.can_transition_to(Idle));
            assert!(state.can_transition_to(Error));
        }
    }

    #[test]
    fn idle_cannot_fail_and_error_only_resets() {
        assert!(!Idle.can_transition_to(Error));
        assert!(Error.can_transition_to(Idle));
        assert!(!Error.can_transition_to(Recording));
    }

    #[test]
    fn playing_must_settle_before_recording() {
        assert!(!Playing.can_transition_to(Recording));
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(AwaitingReply.label(), "awaiting_reply");
        assert_eq!(Idle.to_string(), "idle");
    }
}
