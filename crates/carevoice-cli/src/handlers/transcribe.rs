//! `transcribe <file>`: one-shot upload to the transcription service.

use std::path::Path;

use anyhow::{Context, Result};
use carevoice_core::AudioClip;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// MIME type for a recording, from its extension.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "wav" => "audio/wav",
        "webm" => "audio/webm",
        "mp4" | "m4a" => "audio/mp4",
        "mp3" => "audio/mpeg",
        "ogg" | "oga" => "audio/ogg",
        _ => return None,
    };
    Some(mime)
}

pub async fn execute(ctx: &CliContext, file: &Path) -> Result<()> {
    let mime_type = mime_for_path(file).ok_or_else(|| {
        CliError::Arguments(format!("unsupported audio file type: {}", file.display()))
    })?;
    let data = tokio::fs::read(file)
        .await
        .map_err(CliError::from)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let clip = AudioClip::new(data, mime_type);
    if clip.is_empty() {
        return Err(CliError::Arguments(format!("{} is empty", file.display())).into());
    }

    tracing::info!(file = %file.display(), bytes = clip.len(), mime_type, "Transcribing");
    let transcriber = ctx.transcriber()?;
    let request = transcriber.transcribe_clip(clip);
    let text = match ctx.settings.request_timeout() {
        Some(limit) => tokio::time::timeout(limit, request)
            .await
            .map_err(|_| CliError::Service("transcription timed out".to_string()))?,
        None => request.await,
    }
    .map_err(CliError::from)?;

    match text.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => println!("{text}"),
        _ => eprintln!("No speech detected."),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Cli;
    use clap::Parser;
    use std::path::PathBuf;
    use tokio_test::assert_err;

    fn ctx() -> CliContext {
        CliContext::from_cli(&Cli::parse_from(["carevoice", "transcribe", "x.wav"])).unwrap()
    }

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(&PathBuf::from("q.WAV")), Some("audio/wav"));
        assert_eq!(mime_for_path(&PathBuf::from("q.m4a")), Some("audio/mp4"));
        assert_eq!(mime_for_path(&PathBuf::from("q.mp3")), Some("audio/mpeg"));
        assert_eq!(mime_for_path(&PathBuf::from("q.txt")), None);
        assert_eq!(mime_for_path(&PathBuf::from("recording")), None);
    }

    #[tokio::test]
    async fn test_empty_file_is_rejected_before_upload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("silence.wav");
        std::fs::write(&path, b"").unwrap();

        let err = assert_err!(execute(&ctx(), &path).await);
        let cli_err = err.downcast_ref::<CliError>().unwrap();
        assert_eq!(cli_err.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = assert_err!(execute(&ctx(), &dir.path().join("nope.wav")).await);
        assert!(err.downcast_ref::<CliError>().is_some_and(|e| e.exit_code() == 74));
    }
}
