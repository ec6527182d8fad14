//! CLI bootstrap: the composition root.
//!
//! Turns parsed arguments into validated [`VoiceSettings`] and HTTP client
//! configs. Handlers build the adapters they need from the context.

use carevoice_core::{VoiceSettings, validate_settings};
use carevoice_http::{HttpClientConfig, HttpSynthesizer, HttpTranscriber};

use crate::error::CliError;
use crate::parser::Cli;

/// Everything a command handler needs.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub settings: VoiceSettings,
    /// Transcription and speech service.
    pub api: HttpClientConfig,
    api_key: Option<String>,
}

impl CliContext {
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let mut settings = VoiceSettings::for_portal(cli.portal);
        settings.request_timeout_secs = (cli.timeout > 0).then_some(cli.timeout);
        validate_settings(&settings)?;

        let api = HttpClientConfig::new()
            .with_base_url(cli.api_url.clone())
            .with_optional_token(cli.api_key.clone());

        tracing::debug!(
            portal = %settings.portal,
            voice = settings.voice(),
            api_url = %cli.api_url,
            timeout_secs = ?settings.request_timeout_secs,
            "CLI context ready"
        );

        Ok(Self {
            settings,
            api,
            api_key: cli.api_key.clone(),
        })
    }

    pub fn transcriber(&self) -> Result<HttpTranscriber, CliError> {
        Ok(HttpTranscriber::new(&self.api)?)
    }

    pub fn synthesizer(&self) -> Result<HttpSynthesizer, CliError> {
        Ok(HttpSynthesizer::new(&self.api)?)
    }

    /// Config for an OpenAI-compatible chat server, sharing the API key.
    pub fn chat_config(&self, chat_url: &str) -> HttpClientConfig {
        HttpClientConfig::new()
            .with_base_url(chat_url)
            .with_optional_token(self.api_key.clone())
    }
}
