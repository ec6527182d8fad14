//! CLI error type and exit codes.

use carevoice_core::SettingsError;
use carevoice_http::HttpClientError;
use carevoice_voice::VoiceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A collaborator service failed or could not be reached.
    #[error("Service error: {0}")]
    Service(String),

    /// Microphone or speaker trouble.
    #[error("Audio error: {0}")]
    Audio(String),
}

impl CliError {
    /// Exit codes follow sysexits.h where one fits.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Arguments(_) => 2,
            Self::Io(_) => 74,
            Self::Config(_) => 78,
            Self::Service(_) => 69,
            Self::Audio(_) => 71,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<HttpClientError> for CliError {
    fn from(err: HttpClientError) -> Self {
        match err {
            HttpClientError::InvalidUrl(e) => Self::Config(format!("invalid service URL: {e}")),
            other => Self::Service(other.to_string()),
        }
    }
}

impl From<VoiceError> for CliError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::TranscriptionFailed(msg) | VoiceError::SynthesisFailed(msg) => {
                Self::Service(msg)
            }
            other => Self::Audio(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Arguments("x".into()).exit_code(), 2);
        assert_eq!(CliError::Config("x".into()).exit_code(), 78);
        assert_eq!(CliError::Service("x".into()).exit_code(), 69);
    }

    #[test]
    fn test_settings_error_is_config() {
        let err: CliError = SettingsError::InvalidTimeout(900).into();
        assert!(matches!(err, CliError::Config(ref m) if m.contains("900")));
    }

    #[test]
    fn test_voice_errors_split_by_cause() {
        let err: CliError = VoiceError::SynthesisFailed("tts down".into()).into();
        assert!(matches!(err, CliError::Service(_)));

        let err: CliError = VoiceError::PermissionDenied.into();
        assert!(matches!(err, CliError::Audio(_)));
    }
}
