//! Audio hardware ports: microphone capture and speaker output.
//!
//! These traits decouple the voice pipeline from any specific audio backend:
//!
//! | Implementor | Where used |
//! |---|---|
//! | `CpalInputHost` / `RodioOutput` (`carevoice-voice`, feature `local-audio`) | CLI on a desktop machine |
//! | Test fakes | Pipeline state machine tests |
//!
//! Both halves are object-safe (`Arc<dyn AudioInputHost>`,
//! `Arc<dyn AudioOutput>`).

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

// ── Capture ────────────────────────────────────────────────────────

/// Failure to acquire or drive the microphone.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The host refused microphone access.
    #[error("Microphone permission denied")]
    PermissionDenied,

    /// No capture device exists (or it vanished).
    #[error("No audio input device available: {0}")]
    DeviceUnavailable(String),

    /// The stream or encoder failed after acquisition.
    #[error("Audio capture stream error: {0}")]
    Stream(String),
}

/// A freshly opened capture: the hardware stream and the encoder's chunk feed.
pub struct OpenedCapture {
    pub stream: Box<dyn CaptureStream>,
    /// Encoded chunks in arrival order. The encoder closes the channel once
    /// [`CaptureStream::finalize`] has flushed everything.
    pub chunks: mpsc::UnboundedReceiver<Vec<u8>>,
}

/// The host environment's microphone.
#[async_trait]
pub trait AudioInputHost: Send + Sync {
    /// Encodings the host can produce, as MIME types.
    fn supported_mime_types(&self) -> Vec<String>;

    /// Acquire the microphone and start encoding as `mime_type`.
    async fn open(&self, mime_type: &str) -> Result<OpenedCapture, CaptureError>;
}

/// One open microphone acquisition.
#[async_trait]
pub trait CaptureStream: Send {
    /// Ask the encoder to finalize. When this resolves, every chunk the
    /// encoder produced has been sent on the chunk channel.
    async fn finalize(&mut self) -> Result<(), CaptureError>;

    /// Stop every underlying hardware track, releasing the device.
    ///
    /// Must be safe to call after a failed `finalize`.
    fn stop_tracks(&mut self);
}

// ── Playback ───────────────────────────────────────────────────────

/// Failure to load or play audio.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The output device could not be opened.
    #[error("Audio output unavailable: {0}")]
    OutputUnavailable(String),

    /// The payload could not be decoded as the declared media type.
    #[error("Could not decode {mime_type} audio: {reason}")]
    Decode { mime_type: String, reason: String },

    /// The device refused to start playback.
    #[error("Playback failed: {0}")]
    Start(String),
}

/// Lifecycle notification for one playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackSignalKind {
    Started,
    Finished,
    Failed(String),
}

/// A lifecycle notification tagged with the playback it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSignal {
    pub id: u64,
    pub kind: PlaybackSignalKind,
}

/// Sender half handed to a [`PlaybackResource`] so it can report its
/// lifecycle from whatever thread the backend runs on.
#[derive(Debug, Clone)]
pub struct PlaybackNotifier {
    id: u64,
    tx: mpsc::UnboundedSender<PlaybackSignal>,
}

impl PlaybackNotifier {
    pub const fn new(id: u64, tx: mpsc::UnboundedSender<PlaybackSignal>) -> Self {
        Self { id, tx }
    }

    /// Playback id this notifier reports for.
    pub const fn id(&self) -> u64 {
        self.id
    }

    pub fn started(&self) {
        self.send(PlaybackSignalKind::Started);
    }

    pub fn finished(&self) {
        self.send(PlaybackSignalKind::Finished);
    }

    pub fn failed(&self, reason: impl Into<String>) {
        self.send(PlaybackSignalKind::Failed(reason.into()));
    }

    // Receiver gone means the pipeline shut down; nothing left to notify.
    fn send(&self, kind: PlaybackSignalKind) {
        let _ = self.tx.send(PlaybackSignal { id: self.id, kind });
    }
}

/// The host environment's speaker.
pub trait AudioOutput: Send + Sync {
    /// Build a playable resource from `data` of media type `mime_type`.
    ///
    /// Nothing is audible until [`PlaybackResource::play`] is called.
    fn load(
        &self,
        data: Vec<u8>,
        mime_type: &str,
        notifier: PlaybackNotifier,
    ) -> Result<Box<dyn PlaybackResource>, PlaybackError>;
}

/// One loaded audio object assigned to the speaker.
pub trait PlaybackResource: Send {
    /// Begin playback. The resource reports `Started`, then `Finished` or
    /// `Failed`, through its notifier.
    fn play(&mut self) -> Result<(), PlaybackError>;

    /// Silence output without releasing the resource.
    fn pause(&mut self);

    /// Free the decoded buffer and any temporary resource it holds.
    fn release(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifier_tags_signals_with_its_id() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let notifier = PlaybackNotifier::new(7, tx);

        notifier.started();
        notifier.failed("device lost");

        assert_eq!(
            rx.try_recv().unwrap(),
            PlaybackSignal {
                id: 7,
                kind: PlaybackSignalKind::Started
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            PlaybackSignal {
                id: 7,
                kind: PlaybackSignalKind::Failed("device lost".to_string())
            }
        );
    }

    #[test]
    fn notifier_survives_dropped_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let notifier = PlaybackNotifier::new(1, tx);
        notifier.finished();
    }
}
