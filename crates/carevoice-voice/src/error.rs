//! Voice pipeline error types.

use carevoice_core::{CaptureError, PlaybackError, VoiceTurnState};

/// Errors that can occur in the voice pipeline.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    /// Microphone permission denied.
    #[error("Microphone permission denied")]
    PermissionDenied,

    /// No usable capture device or encoding.
    #[error("No audio input device available: {0}")]
    DeviceUnavailable(String),

    /// The transcription collaborator failed or timed out.
    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),

    /// The synthesis collaborator failed or timed out.
    #[error("Speech synthesis failed: {0}")]
    SynthesisFailed(String),

    /// Decoding or starting playback failed.
    #[error("Audio playback failed: {0}")]
    PlaybackFailed(String),

    /// A toggle arrived while a turn was mid-flight.
    #[error("Voice pipeline is busy ({0})")]
    Busy(VoiceTurnState),

    /// A clip is already being transcribed.
    #[error("Audio clip is already being processed")]
    AlreadyProcessing,

    /// Interrupted by the user.
    #[error("Voice operation cancelled")]
    Cancelled,

    /// The pipeline task has exited.
    #[error("Voice pipeline has shut down")]
    Shutdown,
}

impl VoiceError {
    /// User-facing notice text, if this failure should surface one.
    pub const fn notice(&self) -> Option<&'static str> {
        match self {
            Self::PermissionDenied | Self::DeviceUnavailable(_) => {
                Some("Failed to start recording. Please check microphone permissions.")
            }
            Self::TranscriptionFailed(_) => Some("Failed to transcribe audio. Please try again."),
            Self::SynthesisFailed(_) => Some("Failed to generate audio response"),
            Self::PlaybackFailed(_) => Some("Failed to play audio"),
            Self::Busy(_) => Some("Voice is busy. Cancel the current turn to start a new one."),
            Self::AlreadyProcessing | Self::Cancelled | Self::Shutdown => None,
        }
    }
}

impl From<CaptureError> for VoiceError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::PermissionDenied => Self::PermissionDenied,
            CaptureError::DeviceUnavailable(reason) | CaptureError::Stream(reason) => {
                Self::DeviceUnavailable(reason)
            }
        }
    }
}

impl From<PlaybackError> for VoiceError {
    fn from(err: PlaybackError) -> Self {
        Self::PlaybackFailed(err.to_string())
    }
}
