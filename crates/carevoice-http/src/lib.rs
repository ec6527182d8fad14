//! HTTP adapters for the carevoice collaborator ports.
//!
//! - [`HttpTranscriber`]: multipart upload to `POST {base}/api/transcribe`
//! - [`HttpSynthesizer`]: JSON request to `POST {base}/api/tts`
//! - [`ChatConversation`]: an OpenAI-compatible chat completion endpoint
//!   acting as the conversation the voice pipeline appends to
//!
//! All transport goes through the [`HttpBackend`] trait so adapters can be
//! exercised against canned responses.
//!
//! # Example
//!
//! ```ignore
//! use carevoice_http::{HttpClientConfig, HttpTranscriber};
//!
//! let config = HttpClientConfig::new().with_base_url("http://localhost:3000");
//! let transcriber = HttpTranscriber::new(&config)?;
//! ```

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

mod chat;
mod config;
mod error;
mod http;
mod synthesis;
mod transcription;
mod url;

pub use chat::{ChatConversation, ChatMessage, ChatOptions, ChatRole};
pub use config::HttpClientConfig;
pub use error::{HttpClientError, HttpResult};
pub use http::{FileUpload, HttpBackend, HttpResponse, ReqwestBackend};
pub use synthesis::{HttpSynthesizer, parse_audio_data_url};
pub use transcription::HttpTranscriber;

// Silence unused dev-dependency warnings for the unit test target
#[cfg(test)]
use tokio_test as _;
