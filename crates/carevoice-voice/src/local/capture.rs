//! Microphone capture via `cpal`, encoded as PCM16 WAV.
//!
//! Each opened capture runs on its own audio thread that owns the
//! `cpal::Stream`. Finalizing pauses the stream and emits the whole
//! recording as a single WAV chunk; stopping the tracks drops the stream and
//! joins the thread.

use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use async_trait::async_trait;
use carevoice_core::{AudioInputHost, CaptureError, CaptureStream, OpenedCapture};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BuildStreamError, DefaultStreamConfigError, SampleFormat, Stream, StreamConfig};
use tokio::sync::{mpsc, oneshot};

use super::wav::{downmix, encode_pcm16_wav};

/// The only encoding this host produces.
pub const WAV_MIME: &str = "audio/wav";

/// Information about an available audio input device.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioDeviceInfo {
    /// Human-readable device name.
    pub name: String,
    /// Whether this is the system default input device.
    pub is_default: bool,
}

/// The system default microphone.
#[derive(Debug, Default)]
pub struct CpalInputHost;

impl CpalInputHost {
    pub const fn new() -> Self {
        Self
    }

    /// List available audio input devices.
    pub fn list_devices() -> Result<Vec<AudioDeviceInfo>, CaptureError> {
        let host = cpal::default_host();
        let default_name = host
            .default_input_device()
            .and_then(|d| d.name().ok())
            .unwrap_or_default();

        let devices = host
            .input_devices()
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;

        Ok(devices
            .filter_map(|device| device.name().ok())
            .map(|name| AudioDeviceInfo {
                is_default: name == default_name,
                name,
            })
            .collect())
    }
}

#[async_trait]
impl AudioInputHost for CpalInputHost {
    fn supported_mime_types(&self) -> Vec<String> {
        vec![WAV_MIME.to_string()]
    }

    async fn open(&self, mime_type: &str) -> Result<OpenedCapture, CaptureError> {
        if !mime_type.eq_ignore_ascii_case(WAV_MIME) {
            return Err(CaptureError::Stream(format!(
                "unsupported capture encoding {mime_type}"
            )));
        }

        let (chunk_tx, chunks) = mpsc::unbounded_channel();
        let stream = tokio::task::spawn_blocking(move || CpalCaptureStream::spawn(chunk_tx))
            .await
            .map_err(|e| CaptureError::Stream(format!("audio thread setup failed: {e}")))??;

        Ok(OpenedCapture {
            stream: Box::new(stream),
            chunks,
        })
    }
}

// ── Audio thread ───────────────────────────────────────────────────

enum CaptureCommand {
    /// Pause the stream and flush the recording as one WAV chunk.
    Finalize {
        reply: oneshot::Sender<Result<(), CaptureError>>,
    },

    /// Drop the stream and exit the thread.
    Shutdown,
}

/// `Send` proxy for one capture running on its audio thread.
struct CpalCaptureStream {
    cmd_tx: std_mpsc::Sender<CaptureCommand>,
    thread: Option<thread::JoinHandle<()>>,
}

fn thread_gone() -> CaptureError {
    CaptureError::Stream("audio capture thread exited".to_string())
}

impl CpalCaptureStream {
    /// Spawn the audio thread and wait until the stream is live.
    fn spawn(chunk_tx: mpsc::UnboundedSender<Vec<u8>>) -> Result<Self, CaptureError> {
        let (cmd_tx, cmd_rx) = std_mpsc::channel();
        let (init_tx, init_rx) = std_mpsc::channel();

        let thread = thread::Builder::new()
            .name("carevoice-mic".into())
            .spawn(move || run(&cmd_rx, chunk_tx, &init_tx))
            .map_err(|e| CaptureError::Stream(format!("failed to spawn audio thread: {e}")))?;

        init_rx.recv().map_err(|_| thread_gone())??;

        Ok(Self {
            cmd_tx,
            thread: Some(thread),
        })
    }
}

#[async_trait]
impl CaptureStream for CpalCaptureStream {
    async fn finalize(&mut self) -> Result<(), CaptureError> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(CaptureCommand::Finalize { reply })
            .map_err(|_| thread_gone())?;
        rx.await.map_err(|_| thread_gone())?
    }

    fn stop_tracks(&mut self) {
        let _ = self.cmd_tx.send(CaptureCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for CpalCaptureStream {
    fn drop(&mut self) {
        self.stop_tracks();
    }
}

/// Body of the audio thread. Owns the `cpal::Stream` for its whole life.
fn run(
    cmd_rx: &std_mpsc::Receiver<CaptureCommand>,
    chunk_tx: mpsc::UnboundedSender<Vec<u8>>,
    init_tx: &std_mpsc::Sender<Result<(), CaptureError>>,
) {
    let buffer = Arc::new(Mutex::new(Vec::<f32>::new()));
    let (stream, sample_rate, channels) = match open_default_input(&buffer) {
        Ok(opened) => opened,
        Err(e) => {
            let _ = init_tx.send(Err(e));
            return;
        }
    };
    let _ = init_tx.send(Ok(()));

    let mut chunk_tx = Some(chunk_tx);
    while let Ok(command) = cmd_rx.recv() {
        match command {
            CaptureCommand::Finalize { reply } => {
                if let Err(e) = stream.pause() {
                    tracing::debug!(%e, "Input stream did not pause");
                }
                let samples = buffer
                    .lock()
                    .map(|mut buf| std::mem::take(&mut *buf))
                    .unwrap_or_default();
                // Dropping the sender closes the chunk feed.
                let tx = chunk_tx.take();
                let result = match encode_pcm16_wav(&downmix(&samples, channels), sample_rate) {
                    Ok(wav) => {
                        tracing::debug!(samples = samples.len(), bytes = wav.len(), "Capture finalized");
                        if let Some(tx) = tx {
                            let _ = tx.send(wav);
                        }
                        Ok(())
                    }
                    Err(e) => Err(CaptureError::Stream(format!("WAV encoding failed: {e}"))),
                };
                let _ = reply.send(result);
            }
            CaptureCommand::Shutdown => break,
        }
    }

    drop(stream);
    tracing::debug!("Audio capture thread exiting");
}

/// Open and start the default input device, accumulating f32 samples.
fn open_default_input(buffer: &Arc<Mutex<Vec<f32>>>) -> Result<(Stream, u32, u16), CaptureError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| CaptureError::DeviceUnavailable("no default input device".to_string()))?;

    let config = device.default_input_config().map_err(|e| match e {
        DefaultStreamConfigError::DeviceNotAvailable => {
            CaptureError::DeviceUnavailable(e.to_string())
        }
        other => CaptureError::Stream(other.to_string()),
    })?;

    let sample_rate = config.sample_rate().0;
    let channels = config.channels();
    let sample_format = config.sample_format();
    let stream_config: StreamConfig = config.into();

    tracing::info!(
        device = %device.name().unwrap_or_default(),
        sample_rate,
        channels,
        "Microphone opened"
    );

    let err_fn = |err: cpal::StreamError| {
        tracing::error!(%err, "Audio input stream error");
    };

    let stream = match sample_format {
        SampleFormat::F32 => {
            let buffer = Arc::clone(buffer);
            device.build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                err_fn,
                None,
            )
        }
        SampleFormat::I16 => {
            let buffer = Arc::clone(buffer);
            device.build_input_stream(
                &stream_config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend(data.iter().map(|&s| f32::from(s) / 32768.0));
                    }
                },
                err_fn,
                None,
            )
        }
        SampleFormat::I32 => {
            let buffer = Arc::clone(buffer);
            device.build_input_stream(
                &stream_config,
                move |data: &[i32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        #[allow(clippy::cast_precision_loss)]
                        buf.extend(data.iter().map(|&s| s as f32 / 2_147_483_648.0));
                    }
                },
                err_fn,
                None,
            )
        }
        other => {
            return Err(CaptureError::Stream(format!(
                "unsupported sample format: {other:?}"
            )));
        }
    }
    .map_err(classify_build_error)?;

    stream
        .play()
        .map_err(|e| CaptureError::Stream(e.to_string()))?;

    Ok((stream, sample_rate, channels))
}

fn classify_build_error(err: BuildStreamError) -> CaptureError {
    match err {
        BuildStreamError::DeviceNotAvailable => CaptureError::DeviceUnavailable(err.to_string()),
        BuildStreamError::BackendSpecific { err: ref backend }
            if backend.description.to_ascii_lowercase().contains("permission") =>
        {
            CaptureError::PermissionDenied
        }
        other => CaptureError::Stream(other.to_string()),
    }
}
