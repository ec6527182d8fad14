//! Transcription relay: one clip in, at most one tagged user turn out.

use std::sync::Arc;
use std::time::Duration;

use carevoice_core::{
    AudioClip, ConversationPort, TranscriptionPort, TurnId, UserTurn, VoiceTag,
};

use crate::deadline::within;
use crate::error::VoiceError;
use crate::guard::ProcessingGuard;

/// Result of a successful hand-off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptionOutcome {
    /// The trimmed transcript was appended as the voice-tagged user turn
    /// `turn`.
    Appended { turn: TurnId, text: String },
    /// Nothing intelligible was said; nothing was appended.
    Empty,
}

/// Hands finished clips to the transcription service and appends the
/// result to the conversation.
pub struct TranscriptionRelay {
    transcriber: Arc<dyn TranscriptionPort>,
    conversation: Arc<dyn ConversationPort>,
    guard: ProcessingGuard,
    tag: VoiceTag,
    timeout: Option<Duration>,
}

impl TranscriptionRelay {
    pub fn new(
        transcriber: Arc<dyn TranscriptionPort>,
        conversation: Arc<dyn ConversationPort>,
        tag: VoiceTag,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            transcriber,
            conversation,
            guard: ProcessingGuard::new(),
            tag,
            timeout,
        }
    }

    /// The latch shared by every hand-off through this relay.
    pub const fn guard(&self) -> &ProcessingGuard {
        &self.guard
    }

    /// Transcribe `clip` and append the transcript.
    ///
    /// Rejected with [`VoiceError::AlreadyProcessing`] while another
    /// hand-off holds the guard; the collaborator is not called.
    pub async fn hand_off(&self, clip: AudioClip) -> Result<TranscriptionOutcome, VoiceError> {
        let Some(_permit) = self.guard.try_begin() else {
            tracing::debug!("Hand-off rejected, a clip is already being processed");
            return Err(VoiceError::AlreadyProcessing);
        };

        if clip.is_empty() {
            tracing::info!("Captured clip is empty, skipping transcription");
            return Ok(TranscriptionOutcome::Empty);
        }

        tracing::debug!(
            bytes = clip.len(),
            mime_type = %clip.mime_type(),
            "Sending clip for transcription"
        );

        let transcript = within(self.timeout, self.transcriber.transcribe(clip))
            .await
            .ok_or_else(|| VoiceError::TranscriptionFailed("request timed out".to_string()))?
            .map_err(|e| VoiceError::TranscriptionFailed(e.to_string()))?;

        let text = transcript.as_deref().map(str::trim).unwrap_or_default();
        if text.is_empty() {
            tracing::info!("Transcription returned no speech");
            return Ok(TranscriptionOutcome::Empty);
        }

        let turn = UserTurn::voice(text, self.tag.clone());
        let turn_id = turn.id;
        self.conversation
            .append_user_turn(turn)
            .await
            .map_err(|e| VoiceError::TranscriptionFailed(e.to_string()))?;

        tracing::info!(turn = %turn_id, chars = text.len(), "Voice transcript appended to conversation");
        Ok(TranscriptionOutcome::Appended {
            turn: turn_id,
            text: text.to_string(),
        })
    }
}
