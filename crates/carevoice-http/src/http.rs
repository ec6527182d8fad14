//! HTTP backend abstraction.
//!
//! Adapters only ever POST: a JSON body or a single-file multipart upload.
//! The backend returns the raw status and body; interpreting them is
//! [`decode_json`]'s job so that every adapter agrees on what counts as an
//! error.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::HttpClientConfig;
use crate::error::{HttpClientError, HttpResult};

// ============================================================================
// HTTP Backend Trait
// ============================================================================

/// A status code and body as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// One file sent as a multipart form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub field: String,
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Transport used by the adapters.
///
/// Injected so tests can run the adapters against canned responses.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    async fn post_json(&self, url: &Url, body: &serde_json::Value) -> HttpResult<HttpResponse>;

    async fn post_file(&self, url: &Url, upload: FileUpload) -> HttpResult<HttpResponse>;
}

/// Turn a raw response into `T`.
///
/// Non-2xx → [`HttpClientError::Status`]. A 2xx body with an `error` field
/// (string, or object with `message`) → [`HttpClientError::Service`].
pub(crate) fn decode_json<T: DeserializeOwned>(url: &Url, response: &HttpResponse) -> HttpResult<T> {
    if !response.is_success() {
        return Err(HttpClientError::status(response.status, url, &response.body));
    }

    let value: serde_json::Value = serde_json::from_str(&response.body)?;
    if let Some(message) = error_message(&value) {
        return Err(HttpClientError::Service(message));
    }
    Ok(serde_json::from_value(value)?)
}

fn error_message(value: &serde_json::Value) -> Option<String> {
    match value.get("error")? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(
            other
                .get("message")
                .and_then(serde_json::Value::as_str)
                .map_or_else(|| other.to_string(), str::to_string),
        ),
    }
}

// ============================================================================
// Reqwest Backend
// ============================================================================

/// Production backend on a shared `reqwest::Client`.
///
/// No retries: a voice turn is interactive and the user can simply try again.
pub struct ReqwestBackend {
    client: reqwest::Client,
    auth_token: Option<String>,
}

impl ReqwestBackend {
    pub fn new(config: &HttpClientConfig) -> HttpResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            auth_token: config.token.clone(),
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth_token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, url: &Url, request: reqwest::RequestBuilder) -> HttpResult<HttpResponse> {
        let started = std::time::Instant::now();
        let response = self.authorize(request).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        tracing::debug!(
            %url,
            status,
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "HTTP request completed"
        );
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn post_json(&self, url: &Url, body: &serde_json::Value) -> HttpResult<HttpResponse> {
        let request = self.client.post(url.as_str()).json(body);
        self.send(url, request).await
    }

    async fn post_file(&self, url: &Url, upload: FileUpload) -> HttpResult<HttpResponse> {
        let part = reqwest::multipart::Part::bytes(upload.data)
            .file_name(upload.file_name)
            .mime_str(&upload.mime_type)?;
        let form = reqwest::multipart::Form::new().part(upload.field, part);

        let request = self.client.post(url.as_str()).multipart(form);
        self.send(url, request).await
    }
}

// ============================================================================
// Fake Backend for Testing
// ============================================================================

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// What the fake backend saw.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Sent {
        Json { url: String, body: serde_json::Value },
        File { url: String, upload: FileUpload },
    }

    /// Replies with queued responses in order, recording every request.
    #[derive(Clone, Default)]
    pub struct FakeBackend {
        responses: Arc<Mutex<VecDeque<HttpResponse>>>,
        sent: Arc<Mutex<Vec<Sent>>>,
    }

    impl FakeBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(self, status: u16, body: impl Into<String>) -> Self {
            self.responses
                .lock()
                .unwrap()
                .push_back(HttpResponse::new(status, body));
            self
        }

        pub fn sent(&self) -> Vec<Sent> {
            self.sent.lock().unwrap().clone()
        }

        fn next(&self) -> HttpResult<HttpResponse> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| HttpClientError::InvalidResponse {
                    message: "no canned response left".to_string(),
                })
        }
    }

    #[async_trait]
    impl HttpBackend for FakeBackend {
        async fn post_json(&self, url: &Url, body: &serde_json::Value) -> HttpResult<HttpResponse> {
            self.sent.lock().unwrap().push(Sent::Json {
                url: url.to_string(),
                body: body.clone(),
            });
            self.next()
        }

        async fn post_file(&self, url: &Url, upload: FileUpload) -> HttpResult<HttpResponse> {
            self.sent.lock().unwrap().push(Sent::File {
                url: url.to_string(),
                upload,
            });
            self.next()
        }
    }
}
