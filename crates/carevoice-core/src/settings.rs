//! Voice settings and validation.
//!
//! Pure domain types with no infrastructure dependencies. Adapters (the CLI,
//! a desktop shell) build a [`VoiceSettings`] from their own config sources
//! and hand it to the pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{PortalContext, VoiceTag};

/// Encodings tried in order when opening the microphone.
pub const DEFAULT_PREFERRED_MIME_TYPES: &[&str] = &["audio/webm", "audio/mp4", "audio/wav"];

/// Upper bound accepted for a collaborator request timeout.
const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Voice subsystem settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSettings {
    /// Portal the client serves; fixes the synthesis voice.
    pub portal: PortalContext,

    /// Capture encodings in preference order.
    pub preferred_mime_types: Vec<String>,

    /// Marker prepended to voice-originated user turns.
    pub voice_tag: String,

    /// Bound on each transcription/synthesis call. `None` waits for the
    /// collaborator to answer or fail.
    pub request_timeout_secs: Option<u64>,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            portal: PortalContext::default(),
            preferred_mime_types: DEFAULT_PREFERRED_MIME_TYPES
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            voice_tag: crate::domain::DEFAULT_VOICE_TAG.to_string(),
            request_timeout_secs: Some(60),
        }
    }
}

impl VoiceSettings {
    /// Default settings for `portal`.
    #[must_use]
    pub fn for_portal(portal: PortalContext) -> Self {
        Self {
            portal,
            ..Self::default()
        }
    }

    /// Synthesis voice for the configured portal.
    pub const fn voice(&self) -> &'static str {
        self.portal.voice()
    }

    /// The configured tag as a domain value.
    pub fn tag(&self) -> VoiceTag {
        VoiceTag::new(self.voice_tag.clone())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("Request timeout must be between 1 and 300 seconds, got {0}")]
    InvalidTimeout(u64),

    #[error("At least one preferred capture MIME type is required")]
    NoMimeTypes,

    #[error("Capture MIME type must be an audio/* type, got {0:?}")]
    InvalidMimeType(String),

    #[error("Voice tag cannot be empty")]
    EmptyVoiceTag,
}

/// Validate settings values.
pub fn validate_settings(settings: &VoiceSettings) -> Result<(), SettingsError> {
    if let Some(secs) = settings.request_timeout_secs {
        if !(1..=MAX_REQUEST_TIMEOUT_SECS).contains(&secs) {
            return Err(SettingsError::InvalidTimeout(secs));
        }
    }

    if settings.preferred_mime_types.is_empty() {
        return Err(SettingsError::NoMimeTypes);
    }

    if let Some(bad) = settings
        .preferred_mime_types
        .iter()
        .find(|m| m.strip_prefix("audio/").is_none_or(str::is_empty))
    {
        return Err(SettingsError::InvalidMimeType(bad.clone()));
    }

    if settings.voice_tag.trim().is_empty() {
        return Err(SettingsError::EmptyVoiceTag);
    }

    Ok(())
}
