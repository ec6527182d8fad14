//! Error types for the HTTP adapters.
//!
//! These stay inside `carevoice-http`; each adapter maps them to
//! [`CollaboratorError`] at the port boundary.

use carevoice_core::CollaboratorError;
use thiserror::Error;

pub type HttpResult<T> = Result<T, HttpClientError>;

/// Longest slice of an error body kept in messages.
const MAX_BODY_IN_ERROR: usize = 512;

#[derive(Debug, Error)]
pub enum HttpClientError {
    /// The service answered with a non-success status.
    #[error("Request to {url} failed with status {status}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    /// A 2xx response carrying an `error` field.
    #[error("Service reported an error: {0}")]
    Service(String),

    /// The response parsed but lacked what the adapter needs.
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl HttpClientError {
    pub(crate) fn status(status: u16, url: &url::Url, body: &str) -> Self {
        let mut body = body.trim().to_string();
        if body.len() > MAX_BODY_IN_ERROR {
            let mut cut = MAX_BODY_IN_ERROR;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
            body.push('…');
        }
        Self::Status {
            status,
            url: url.to_string(),
            body,
        }
    }
}

impl From<HttpClientError> for CollaboratorError {
    fn from(err: HttpClientError) -> Self {
        match err {
            HttpClientError::Status { status, body, .. } => Self::Status { status, body },
            HttpClientError::Service(message) => Self::Rejected(message),
            HttpClientError::Network(e) => Self::Network(e.to_string()),
            HttpClientError::InvalidUrl(e) => Self::Network(format!("invalid URL: {e}")),
            HttpClientError::JsonParse(e) => Self::MalformedResponse(e.to_string()),
            HttpClientError::InvalidResponse { message } => Self::MalformedResponse(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message() {
        let url = url::Url::parse("http://localhost:3000/api/transcribe").unwrap();
        let error = HttpClientError::status(500, &url, "boom\n");
        let msg = error.to_string();
        assert!(msg.contains("500"));
        assert!(msg.contains("/api/transcribe"));
        assert!(msg.ends_with("boom"));
    }

    #[test]
    fn test_long_body_is_truncated() {
        let url = url::Url::parse("http://localhost:3000/api/tts").unwrap();
        let body = "é".repeat(1000);
        let HttpClientError::Status { body, .. } = HttpClientError::status(502, &url, &body)
        else {
            panic!("expected status error");
        };
        assert!(body.len() <= MAX_BODY_IN_ERROR + '…'.len_utf8());
        assert!(body.ends_with('…'));
    }

    #[test]
    fn test_maps_to_collaborator_error() {
        let url = url::Url::parse("http://localhost:3000/api/tts").unwrap();
        let mapped: CollaboratorError = HttpClientError::status(503, &url, "down").into();
        assert!(matches!(
            mapped,
            CollaboratorError::Status { status: 503, ref body } if body == "down"
        ));

        let mapped: CollaboratorError = HttpClientError::Service("no speech".into()).into();
        assert!(matches!(mapped, CollaboratorError::Rejected(ref m) if m == "no speech"));

        let mapped: CollaboratorError = HttpClientError::InvalidResponse {
            message: "missing audio".into(),
        }
        .into();
        assert!(matches!(mapped, CollaboratorError::MalformedResponse(_)));
    }
}
