//! Text-to-speech over `POST {base}/api/tts`.

use async_trait::async_trait;
use carevoice_core::{CollaboratorError, SynthesisPort, SynthesisRequest, SynthesizedSpeech};
use serde::Deserialize;
use url::Url;

use crate::config::HttpClientConfig;
use crate::error::{HttpClientError, HttpResult};
use crate::http::{HttpBackend, ReqwestBackend, decode_json};
use crate::url::{TTS_PATH, endpoint};

const DEFAULT_FORMAT: &str = "wav";

#[derive(Debug, Deserialize)]
struct TtsResponse {
    #[serde(default)]
    audio: Option<String>,
}

/// Split the container format out of an audio payload.
///
/// `data:audio/mpeg;base64,...` → format `mp3`. Bare base64, or a data URL
/// without a usable MIME type, is assumed to be `wav`. The payload itself is
/// passed through untouched; decoding happens at playback.
pub fn parse_audio_data_url(audio: &str) -> HttpResult<SynthesizedSpeech> {
    let audio = audio.trim();
    if audio.is_empty() {
        return Err(HttpClientError::InvalidResponse {
            message: "empty audio payload".to_string(),
        });
    }

    let format = match audio.strip_prefix("data:") {
        Some(rest) => {
            let (header, _) = rest.split_once(',').ok_or_else(|| {
                HttpClientError::InvalidResponse {
                    message: "data URL has no payload".to_string(),
                }
            })?;
            let mime = header.split(';').next().unwrap_or_default().trim();
            format_for_mime(mime)
        }
        None => DEFAULT_FORMAT.to_string(),
    };

    Ok(SynthesizedSpeech {
        audio: audio.to_string(),
        format,
    })
}

fn format_for_mime(mime: &str) -> String {
    match mime.to_ascii_lowercase().split_once('/') {
        Some((_, "mpeg")) => "mp3".to_string(),
        Some((_, "x-wav" | "wave")) => DEFAULT_FORMAT.to_string(),
        Some((_, subtype)) if !subtype.is_empty() => subtype.to_string(),
        _ => DEFAULT_FORMAT.to_string(),
    }
}

/// Requests synthesized speech for assistant replies.
pub struct HttpSynthesizer<B = ReqwestBackend> {
    backend: B,
    url: Url,
}

impl HttpSynthesizer<ReqwestBackend> {
    pub fn new(config: &HttpClientConfig) -> HttpResult<Self> {
        Self::with_backend(config, ReqwestBackend::new(config)?)
    }
}

impl<B: HttpBackend> HttpSynthesizer<B> {
    pub fn with_backend(config: &HttpClientConfig, backend: B) -> HttpResult<Self> {
        Ok(Self {
            backend,
            url: endpoint(&config.base_url, TTS_PATH)?,
        })
    }

    pub async fn speak(&self, request: &SynthesisRequest) -> HttpResult<SynthesizedSpeech> {
        tracing::info!(
            voice = %request.voice,
            chars = request.text.chars().count(),
            "Requesting speech synthesis"
        );

        let body = serde_json::to_value(request)?;
        let response = self.backend.post_json(&self.url, &body).await?;
        let parsed: TtsResponse = decode_json(&self.url, &response)?;

        let audio = parsed.audio.ok_or_else(|| HttpClientError::InvalidResponse {
            message: "response has no audio field".to_string(),
        })?;
        parse_audio_data_url(&audio)
    }
}

#[async_trait]
impl<B: HttpBackend> SynthesisPort for HttpSynthesizer<B> {
    async fn synthesize(
        &self,
        request: SynthesisRequest,
    ) -> Result<SynthesizedSpeech, CollaboratorError> {
        self.speak(&request).await.map_err(|e| {
            tracing::warn!(error = %e, "Synthesis request failed");
            e.into()
        })
    }
}
