//! Speech reply relay: speaks finalized assistant replies.

use std::sync::Arc;
use std::time::Duration;

use carevoice_core::{
    AssistantTurn, ConversationEvent, SynthesisPort, SynthesisRequest, SynthesizedSpeech, TurnId,
};

use crate::deadline::within;
use crate::error::VoiceError;

/// Sends finalized reply text to the synthesis service with the portal's
/// fixed voice.
pub struct SpeechReplyRelay {
    synthesizer: Arc<dyn SynthesisPort>,
    voice: String,
    timeout: Option<Duration>,
}

impl SpeechReplyRelay {
    pub fn new(
        synthesizer: Arc<dyn SynthesisPort>,
        voice: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            synthesizer,
            voice: voice.into(),
            timeout,
        }
    }

    pub fn voice(&self) -> &str {
        &self.voice
    }

    /// The reply `event` asks to be spoken for the voice turn `awaiting`.
    ///
    /// Only a finalized reply with text that answers `awaiting` qualifies.
    /// Streaming deltas, replies to other turns and replies with no known
    /// origin never do.
    pub fn reply_to_speak(
        awaiting: Option<TurnId>,
        event: &ConversationEvent,
    ) -> Option<&AssistantTurn> {
        let awaiting = awaiting?;
        match event {
            ConversationEvent::AssistantTurnFinalized(turn)
                if turn.answers(awaiting) && !turn.text.trim().is_empty() =>
            {
                Some(turn)
            }
            _ => None,
        }
    }

    /// Synthesize the full text of `turn`.
    pub async fn synthesize(&self, turn: &AssistantTurn) -> Result<SynthesizedSpeech, VoiceError> {
        let request = SynthesisRequest {
            text: turn.text.clone(),
            voice: self.voice.clone(),
        };
        tracing::debug!(turn = %turn.id, voice = %self.voice, "Requesting reply synthesis");

        let speech = within(self.timeout, self.synthesizer.synthesize(request))
            .await
            .ok_or_else(|| VoiceError::SynthesisFailed("request timed out".to_string()))?
            .map_err(|e| VoiceError::SynthesisFailed(e.to_string()))?;

        if speech.audio.trim().is_empty() {
            return Err(VoiceError::SynthesisFailed("no audio in response".to_string()));
        }
        Ok(speech)
    }
}
