//! Audio capture manager: one microphone session at a time.
//!
//! Opens the microphone through an [`AudioInputHost`], collects the
//! encoder's chunks while recording, and assembles them into a single
//! [`AudioClip`] when the session is stopped. Hardware tracks are stopped on
//! every path that ends a session, including drop.

use std::sync::Arc;

use carevoice_core::{AudioClip, AudioInputHost, CaptureStream};
use tokio::sync::mpsc;

use crate::error::VoiceError;

/// Pick the capture encoding: the first preferred type the host supports,
/// else the host's first declared type.
pub fn select_mime_type(preferred: &[String], supported: &[String]) -> Option<String> {
    preferred
        .iter()
        .find(|want| supported.iter().any(|have| same_essence(want, have)))
        .cloned()
        .or_else(|| supported.first().cloned())
}

// `audio/webm;codecs=opus` satisfies a preference for `audio/webm`.
fn same_essence(a: &str, b: &str) -> bool {
    let essence = |m: &str| m.split(';').next().unwrap_or(m).trim().to_ascii_lowercase();
    essence(a) == essence(b)
}

/// One open microphone acquisition.
struct RecordingSession {
    stream: Box<dyn CaptureStream>,
    chunk_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    chunks: Vec<Vec<u8>>,
    mime_type: String,
    released: bool,
}

impl RecordingSession {
    /// Move every chunk the encoder has delivered so far into the buffer.
    fn drain(&mut self) {
        while let Ok(chunk) = self.chunk_rx.try_recv() {
            if !chunk.is_empty() {
                self.chunks.push(chunk);
            }
        }
    }

    /// Stop the hardware tracks. Runs at most once per session.
    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.stream.stop_tracks();
            tracing::debug!(mime_type = %self.mime_type, "Microphone tracks stopped");
        }
    }

    fn take_clip(&mut self) -> AudioClip {
        let data = std::mem::take(&mut self.chunks).concat();
        AudioClip::new(data, std::mem::take(&mut self.mime_type))
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        self.release();
    }
}

/// Owns the microphone session and the finished clip.
pub struct AudioCaptureManager {
    host: Arc<dyn AudioInputHost>,
    preferred_mime_types: Vec<String>,
    session: Option<RecordingSession>,
    clip: Option<AudioClip>,
}

impl AudioCaptureManager {
    pub fn new(host: Arc<dyn AudioInputHost>, preferred_mime_types: Vec<String>) -> Self {
        Self {
            host,
            preferred_mime_types,
            session: None,
            clip: None,
        }
    }

    /// Acquire the microphone and start collecting chunks.
    ///
    /// A no-op while a session is already open. Any retained clip from an
    /// earlier session is discarded.
    pub async fn start_recording(&mut self) -> Result<(), VoiceError> {
        if self.session.is_some() {
            tracing::debug!("Recording already in progress");
            return Ok(());
        }

        let supported = self.host.supported_mime_types();
        let mime_type = select_mime_type(&self.preferred_mime_types, &supported).ok_or_else(
            || VoiceError::DeviceUnavailable("no supported capture encoding".to_string()),
        )?;

        let opened = self.host.open(&mime_type).await?;
        self.clip = None;
        self.session = Some(RecordingSession {
            stream: opened.stream,
            chunk_rx: opened.chunks,
            chunks: Vec::new(),
            mime_type,
            released: false,
        });

        tracing::info!(
            mime_type = self.session.as_ref().map_or("", |s| s.mime_type.as_str()),
            "Audio recording started"
        );
        Ok(())
    }

    /// Finalize the encoder, assemble the clip, and release the microphone.
    ///
    /// Returns `None` when no session was open. The tracks are stopped even
    /// if the encoder fails to finalize; whatever chunks arrived still form
    /// the clip.
    pub async fn stop_recording(&mut self) -> Option<&AudioClip> {
        let mut session = self.session.take()?;

        if let Err(e) = session.stream.finalize().await {
            tracing::warn!(error = %e, "Encoder did not finalize cleanly");
        }
        session.drain();
        session.release();

        let clip = session.take_clip();
        tracing::info!(
            bytes = clip.len(),
            mime_type = %clip.mime_type(),
            "Audio recording stopped"
        );
        self.clip = Some(clip);
        self.clip.as_ref()
    }

    /// Move the finished clip out.
    pub fn take_clip(&mut self) -> Option<AudioClip> {
        self.clip.take()
    }

    /// Discard the retained clip. Hardware is left alone.
    pub fn clear_recording(&mut self) {
        self.clip = None;
        if let Some(session) = self.session.as_mut() {
            session.chunks.clear();
        }
    }

    /// Drop an open session without finalizing it, releasing the
    /// microphone and discarding everything captured.
    pub fn abort(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.release();
            tracing::info!("Audio recording discarded");
        }
        self.clip = None;
    }

    pub const fn is_recording(&self) -> bool {
        self.session.is_some()
    }
}
