//! Domain types for the voice subsystem.
//!
//! These types are independent of any infrastructure concerns (audio
//! hardware, HTTP, UI).

mod audio;
mod conversation;
mod portal;
mod state;

pub use audio::AudioClip;
pub use conversation::{
    AssistantTurn, ConversationEvent, DEFAULT_VOICE_TAG, TurnId, UserTurn, VoiceTag,
};
pub use portal::PortalContext;
pub use state::VoiceTurnState;
