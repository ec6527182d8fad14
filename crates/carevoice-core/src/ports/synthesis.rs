//! Speech-synthesis collaborator port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::CollaboratorError;

/// Request body sent to the synthesis service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    /// Full text of the assistant turn.
    pub text: String,
    /// Voice identifier (fixed per portal).
    pub voice: String,
}

/// Audio returned by the synthesis service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedSpeech {
    /// Base64 payload, either bare or as a `data:` URL.
    pub audio: String,
    /// Container format (`wav`, `mp3`, ...), used as `audio/<format>`.
    pub format: String,
}

/// Text-to-speech service.
#[async_trait]
pub trait SynthesisPort: Send + Sync {
    async fn synthesize(
        &self,
        request: SynthesisRequest,
    ) -> Result<SynthesizedSpeech, CollaboratorError>;
}
