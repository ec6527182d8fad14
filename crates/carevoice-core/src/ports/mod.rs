//! Port definitions (trait abstractions) for external collaborators.
//!
//! Ports define the interfaces the voice pipeline expects from the outside
//! world. They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No `reqwest`, `cpal` or `rodio` types in any signature
//! - Collaborator calls are request/response; streaming is modelled as
//!   explicit events, never as polling
//! - Every trait is object-safe so the pipeline can hold `Arc<dyn _>`

pub mod audio_io;
pub mod conversation;
pub mod synthesis;
pub mod transcription;

use thiserror::Error;

pub use audio_io::{
    AudioInputHost, AudioOutput, CaptureError, CaptureStream, OpenedCapture, PlaybackError,
    PlaybackNotifier, PlaybackResource, PlaybackSignal, PlaybackSignalKind,
};
pub use conversation::ConversationPort;
pub use synthesis::{SynthesisPort, SynthesisRequest, SynthesizedSpeech};
pub use transcription::TranscriptionPort;

/// Errors reported by network collaborators (transcription, synthesis,
/// conversation).
///
/// Adapters translate transport details into one of these variants so the
/// pipeline never sees `reqwest` errors.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// The request never produced a response (DNS, connect, reset, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// The collaborator answered with a non-success status.
    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be understood.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The collaborator refused the request (error payload on a 2xx, closed
    /// conversation, etc.).
    #[error("Rejected: {0}")]
    Rejected(String),
}
