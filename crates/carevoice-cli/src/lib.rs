//! Command-line front end for the carevoice voice pipeline.
//!
//! `transcribe` and `speak` exercise the HTTP collaborators one request at a
//! time. With the `local-audio` feature, `talk` wires the microphone, the
//! speaker, the collaborators and an OpenAI-compatible chat endpoint into a
//! running [`VoicePipeline`](carevoice_voice::VoicePipeline).

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Used by the binary target only
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;

pub use bootstrap::CliContext;
pub use commands::Commands;
pub use error::CliError;
pub use parser::Cli;
