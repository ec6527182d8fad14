//! Finalized audio clips.

/// A finalized, immutable audio payload produced by one recording session.
///
/// The bytes are opaque: they are whatever the capture encoder produced for
/// `mime_type`. A clip is moved (never cloned) from the capture manager to
/// the transcription relay, so exactly one owner holds it at a time.
#[derive(Debug, PartialEq, Eq)]
pub struct AudioClip {
    data: Vec<u8>,
    mime_type: String,
}

impl AudioClip {
    /// Create a clip from encoded bytes and the MIME type they were encoded as.
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }

    /// Encoded bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// MIME type chosen at capture start (e.g. `audio/webm`).
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Size of the payload in bytes.
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the recorder produced no audio at all.
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Upload file name derived from the MIME type (`audio/webm` → `audio.webm`).
    ///
    /// Codec parameters are ignored (`audio/webm;codecs=opus` → `audio.webm`).
    /// Unknown or malformed types fall back to `audio.bin`.
    pub fn file_name(&self) -> String {
        let essence = self
            .mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();
        let ext = match essence.split_once('/') {
            Some((_, "mpeg")) => "mp3",
            Some((_, "x-wav" | "wave")) => "wav",
            Some((_, subtype)) if !subtype.is_empty() => subtype,
            _ => "bin",
        };
        format!("audio.{ext}")
    }

    /// Consume the clip, returning its bytes and MIME type.
    pub fn into_parts(self) -> (Vec<u8>, String) {
        (self.data, self.mime_type)
    }
}
