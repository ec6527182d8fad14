//! Voice turn pipeline.
//!
//! Turns a spoken question into a tagged conversation turn and speaks the
//! assistant's finalized reply back:
//!
//! ```text
//!   microphone → AudioCaptureManager → TranscriptionRelay → conversation
//!                                                              │
//!   speaker ← PlaybackManager ← SpeechReplyRelay ← finalized reply
//! ```
//!
//! [`VoicePipeline`] owns every stage and is the only writer of the turn
//! state. Hardware and collaborators are reached through the ports in
//! `carevoice-core`; desktop adapters live in [`local`] behind the
//! `local-audio` feature.

#![deny(unused_crate_dependencies)]

#[cfg(test)]
use mockall as _;

pub mod capture;
mod deadline;
pub mod error;
pub mod guard;
#[cfg(feature = "local-audio")]
pub mod local;
pub mod notice;
pub mod pipeline;
pub mod playback;
pub mod speech;
pub mod transcription;

pub use capture::{AudioCaptureManager, select_mime_type};
pub use error::VoiceError;
pub use guard::{ProcessingGuard, ProcessingPermit};
pub use notice::{Notice, NoticeLevel};
pub use pipeline::{VoiceCollaborators, VoiceCommand, VoiceEvent, VoiceHandle, VoicePipeline};
pub use playback::{PlaybackManager, PlaybackOutcome, decode_audio_payload};
pub use speech::SpeechReplyRelay;
pub use transcription::{TranscriptionOutcome, TranscriptionRelay};
