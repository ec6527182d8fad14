//! Available subcommands.

use std::path::PathBuf;

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transcribe an audio file and print the text
    Transcribe {
        /// Recording to upload (wav, webm, mp4/m4a, mp3, ogg)
        file: PathBuf,
    },

    /// Synthesize speech in the portal voice
    Speak {
        /// Text to read aloud
        text: String,
        /// Write the audio here instead of playing it
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Interactive voice conversation with the assistant
    #[cfg(feature = "local-audio")]
    Talk {
        /// OpenAI-compatible chat server
        #[arg(long, env = "CAREVOICE_CHAT_URL", default_value = "http://localhost:8080")]
        chat_url: String,
        /// Model name sent with each completion request
        #[arg(long, env = "CAREVOICE_CHAT_MODEL", default_value = "default")]
        model: String,
        /// System prompt prepended to the conversation
        #[arg(long)]
        system_prompt: Option<String>,
    },

    /// List audio input devices
    #[cfg(feature = "local-audio")]
    Devices,
}
