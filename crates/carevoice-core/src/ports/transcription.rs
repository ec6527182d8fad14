//! Transcription collaborator port.

use async_trait::async_trait;

use super::CollaboratorError;
use crate::domain::AudioClip;

/// Speech-to-text service.
///
/// A synchronous request/response contract: one binary upload in, one
/// transcript (or error) out.
#[async_trait]
pub trait TranscriptionPort: Send + Sync {
    /// Transcribe a finalized clip.
    ///
    /// Returns `Ok(None)` when the service answered successfully but carried
    /// no transcript field.
    async fn transcribe(&self, clip: AudioClip) -> Result<Option<String>, CollaboratorError>;
}
