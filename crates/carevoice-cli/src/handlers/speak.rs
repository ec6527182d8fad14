//! `speak <text>`: synthesize in the portal voice.
//!
//! Writes the decoded audio to `--out`. Without `--out` the reply is played
//! on the default speaker when built with `local-audio`, and saved as
//! `reply.<format>` otherwise.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use carevoice_core::{SynthesisRequest, SynthesizedSpeech};
use carevoice_voice::decode_audio_payload;

use crate::bootstrap::CliContext;
use crate::error::CliError;

pub async fn execute(ctx: &CliContext, text: &str, out: Option<&Path>) -> Result<()> {
    let text = text.trim();
    if text.is_empty() {
        return Err(CliError::Arguments("nothing to say".to_string()).into());
    }

    let request = SynthesisRequest {
        text: text.to_string(),
        voice: ctx.settings.voice().to_string(),
    };
    let synthesizer = ctx.synthesizer()?;
    let reply = synthesizer.speak(&request);
    let speech = match ctx.settings.request_timeout() {
        Some(limit) => tokio::time::timeout(limit, reply)
            .await
            .map_err(|_| CliError::Service("speech synthesis timed out".to_string()))?,
        None => reply.await,
    }
    .map_err(CliError::from)?;

    match out {
        Some(path) => save(&speech, path).await,
        None => play_or_save(&speech).await,
    }
}

async fn save(speech: &SynthesizedSpeech, path: &Path) -> Result<()> {
    let audio = decode_audio_payload(&speech.audio).map_err(CliError::from)?;
    tokio::fs::write(path, &audio)
        .await
        .map_err(CliError::from)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {} bytes of {} audio to {}", audio.len(), speech.format, path.display());
    Ok(())
}

/// Default output file for a reply in `format`.
pub fn default_output(format: &str) -> PathBuf {
    PathBuf::from(format!("reply.{format}"))
}

#[cfg(not(feature = "local-audio"))]
async fn play_or_save(speech: &SynthesizedSpeech) -> Result<()> {
    save(speech, &default_output(&speech.format)).await
}

#[cfg(feature = "local-audio")]
async fn play_or_save(speech: &SynthesizedSpeech) -> Result<()> {
    use std::sync::Arc;

    use carevoice_voice::{PlaybackManager, PlaybackOutcome};
    use carevoice_voice::local::RodioOutput;

    let output = RodioOutput::open_default().map_err(|e| CliError::Audio(e.to_string()))?;
    let (mut playback, mut signals) = PlaybackManager::new(Arc::new(output));
    playback
        .play_audio(&speech.audio, &speech.format)
        .map_err(CliError::from)?;

    while let Some(signal) = signals.recv().await {
        match playback.handle_signal(&signal) {
            Some(PlaybackOutcome::Finished) => return Ok(()),
            Some(PlaybackOutcome::Failed(reason)) => {
                return Err(CliError::Audio(reason).into());
            }
            Some(PlaybackOutcome::Started) | None => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Cli;
    use clap::Parser;
    use tokio_test::assert_err;

    #[test]
    fn test_default_output_uses_format() {
        assert_eq!(default_output("wav"), PathBuf::from("reply.wav"));
        assert_eq!(default_output("mp3"), PathBuf::from("reply.mp3"));
    }

    #[tokio::test]
    async fn test_blank_text_is_rejected() {
        let ctx = CliContext::from_cli(&Cli::parse_from(["carevoice", "speak", " "])).unwrap();
        let err = assert_err!(execute(&ctx, "   ", None).await);
        assert!(err.downcast_ref::<CliError>().is_some_and(|e| e.exit_code() == 2));
    }

    #[tokio::test]
    async fn test_save_writes_decoded_audio() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reply.wav");
        let speech = SynthesizedSpeech {
            audio: "data:audio/wav;base64,UklGRg==".to_string(),
            format: "wav".to_string(),
        };

        save(&speech, &path).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"RIFF");
    }
}
