//! Playback manager: at most one audible reply at a time.
//!
//! Each `play_audio` call tears down whatever is playing, decodes the
//! base64 payload, loads it through the [`AudioOutput`] port and starts it.
//! Every playback carries a fresh id; lifecycle signals from superseded
//! playbacks are ignored.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use carevoice_core::{
    AudioOutput, PlaybackNotifier, PlaybackResource, PlaybackSignal, PlaybackSignalKind,
};
use tokio::sync::mpsc;

use crate::error::VoiceError;

/// Decode a base64 audio payload, bare or wrapped in a `data:` URL.
pub fn decode_audio_payload(payload: &str) -> Result<Vec<u8>, VoiceError> {
    let encoded = match payload.strip_prefix("data:") {
        Some(url) => url
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| VoiceError::PlaybackFailed("malformed data URL".to_string()))?,
        None => payload,
    };

    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| VoiceError::PlaybackFailed(format!("invalid base64 audio: {e}")))?;
    if bytes.is_empty() {
        return Err(VoiceError::PlaybackFailed("empty audio payload".to_string()));
    }
    Ok(bytes)
}

/// `wav` → `audio/wav`; a full MIME type passes through.
fn mime_for_format(format: &str) -> String {
    if format.contains('/') {
        format.to_string()
    } else {
        format!("audio/{}", format.to_ascii_lowercase())
    }
}

/// What a lifecycle signal meant for the live playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Started,
    Finished,
    Failed(String),
}

/// One loaded resource on the speaker. Released exactly once.
struct PlaybackHandle {
    id: u64,
    resource: Box<dyn PlaybackResource>,
    released: bool,
}

impl PlaybackHandle {
    fn teardown(&mut self) {
        if !self.released {
            self.released = true;
            self.resource.pause();
            self.resource.release();
            tracing::debug!(playback = self.id, "Playback resource released");
        }
    }
}

impl Drop for PlaybackHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Owns the live playback handle.
pub struct PlaybackManager {
    output: Arc<dyn AudioOutput>,
    signal_tx: mpsc::UnboundedSender<PlaybackSignal>,
    current: Option<PlaybackHandle>,
    next_id: u64,
}

impl PlaybackManager {
    /// Create a manager and the receiver its playbacks report on.
    #[must_use]
    pub fn new(output: Arc<dyn AudioOutput>) -> (Self, mpsc::UnboundedReceiver<PlaybackSignal>) {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let manager = Self {
            output,
            signal_tx,
            current: None,
            next_id: 0,
        };
        (manager, signal_rx)
    }

    /// Replace whatever is playing with `payload` and start it.
    ///
    /// Returns the new playback id. On failure no handle is left live.
    pub fn play_audio(&mut self, payload: &str, format: &str) -> Result<u64, VoiceError> {
        self.stop_audio();

        let data = decode_audio_payload(payload)?;
        let mime_type = mime_for_format(format);

        self.next_id += 1;
        let id = self.next_id;
        let notifier = PlaybackNotifier::new(id, self.signal_tx.clone());

        let resource = self.output.load(data, &mime_type, notifier)?;
        let mut handle = PlaybackHandle {
            id,
            resource,
            released: false,
        };
        handle.resource.play()?;

        tracing::debug!(playback = id, %mime_type, "Audio playback started");
        self.current = Some(handle);
        Ok(id)
    }

    /// Pause and release the live playback, if any.
    pub fn stop_audio(&mut self) {
        if let Some(mut handle) = self.current.take() {
            handle.teardown();
            tracing::debug!(playback = handle.id, "Audio playback stopped");
        }
    }

    /// Apply a lifecycle signal. `None` for signals from a superseded
    /// playback.
    pub fn handle_signal(&mut self, signal: &PlaybackSignal) -> Option<PlaybackOutcome> {
        if self.current_id() != Some(signal.id) {
            tracing::trace!(playback = signal.id, "Ignoring stale playback signal");
            return None;
        }

        match &signal.kind {
            PlaybackSignalKind::Started => Some(PlaybackOutcome::Started),
            PlaybackSignalKind::Finished => {
                self.stop_audio();
                Some(PlaybackOutcome::Finished)
            }
            PlaybackSignalKind::Failed(reason) => {
                tracing::warn!(playback = signal.id, %reason, "Audio playback failed");
                self.stop_audio();
                Some(PlaybackOutcome::Failed(reason.clone()))
            }
        }
    }

    pub const fn is_playing(&self) -> bool {
        self.current.is_some()
    }

    /// Id of the live playback.
    pub fn current_id(&self) -> Option<u64> {
        self.current.as_ref().map(|h| h.id)
    }
}
