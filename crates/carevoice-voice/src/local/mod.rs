//! Desktop audio adapters: cpal microphone capture and rodio playback.
//!
//! `cpal::Stream` and `rodio::OutputStream` are `!Send` on some platforms,
//! so each adapter confines its device handle to a dedicated OS thread and
//! talks to it over channels. The types exported here are plain
//! `Send + Sync` port implementations.

mod capture;
mod playback;
mod wav;

pub use capture::{AudioDeviceInfo, CpalInputHost, WAV_MIME};
pub use playback::RodioOutput;
pub use wav::{downmix, encode_pcm16_wav};
