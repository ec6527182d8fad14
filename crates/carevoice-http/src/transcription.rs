//! Speech-to-text over `POST {base}/api/transcribe`.

use async_trait::async_trait;
use carevoice_core::{AudioClip, CollaboratorError, TranscriptionPort};
use serde::Deserialize;
use url::Url;

use crate::config::HttpClientConfig;
use crate::error::HttpResult;
use crate::http::{FileUpload, HttpBackend, ReqwestBackend, decode_json};
use crate::url::{TRANSCRIBE_PATH, endpoint};

/// Multipart field the service reads the recording from.
const FILE_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
struct TranscribeResponse {
    #[serde(default)]
    text: Option<String>,
}

/// Uploads finalized clips to the transcription service.
pub struct HttpTranscriber<B = ReqwestBackend> {
    backend: B,
    url: Url,
}

impl HttpTranscriber<ReqwestBackend> {
    pub fn new(config: &HttpClientConfig) -> HttpResult<Self> {
        Self::with_backend(config, ReqwestBackend::new(config)?)
    }
}

impl<B: HttpBackend> HttpTranscriber<B> {
    pub fn with_backend(config: &HttpClientConfig, backend: B) -> HttpResult<Self> {
        Ok(Self {
            backend,
            url: endpoint(&config.base_url, TRANSCRIBE_PATH)?,
        })
    }

    /// Upload `clip`; `Ok(None)` when the reply had no `text` field.
    pub async fn transcribe_clip(&self, clip: AudioClip) -> HttpResult<Option<String>> {
        let file_name = clip.file_name();
        let (data, mime_type) = clip.into_parts();
        tracing::info!(
            bytes = data.len(),
            %mime_type,
            %file_name,
            "Uploading recording for transcription"
        );

        let upload = FileUpload {
            field: FILE_FIELD.to_string(),
            file_name,
            mime_type,
            data,
        };
        let response = self.backend.post_file(&self.url, upload).await?;
        let parsed: TranscribeResponse = decode_json(&self.url, &response)?;
        Ok(parsed.text)
    }
}

#[async_trait]
impl<B: HttpBackend> TranscriptionPort for HttpTranscriber<B> {
    async fn transcribe(&self, clip: AudioClip) -> Result<Option<String>, CollaboratorError> {
        self.transcribe_clip(clip).await.map_err(|e| {
            tracing::warn!(error = %e, "Transcription request failed");
            e.into()
        })
    }
}
