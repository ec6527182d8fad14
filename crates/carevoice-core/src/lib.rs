//! Core domain types and port definitions for the carevoice voice subsystem.
//!
//! This crate has no I/O of its own. It defines the vocabulary shared by the
//! voice pipeline (`carevoice-voice`) and its adapters (`carevoice-http`,
//! the CLI): audio clips, the voice turn state machine, conversation turns,
//! portal context, settings, and the traits ("ports") every external
//! collaborator implements.

#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    AssistantTurn, AudioClip, ConversationEvent, DEFAULT_VOICE_TAG, PortalContext, TurnId,
    UserTurn, VoiceTag, VoiceTurnState,
};
pub use ports::{
    AudioInputHost, AudioOutput, CaptureError, CaptureStream, CollaboratorError,
    ConversationPort, OpenedCapture, PlaybackError, PlaybackNotifier, PlaybackResource,
    PlaybackSignal, PlaybackSignalKind, SynthesisPort, SynthesisRequest, SynthesizedSpeech,
    TranscriptionPort,
};
pub use settings::{
    DEFAULT_PREFERRED_MIME_TYPES, SettingsError, VoiceSettings, validate_settings,
};

// Silence unused dev-dependency warnings for the unit test target
#[cfg(test)]
use serde_json as _;
