//! Speaker output via `rodio`.

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::thread;

use carevoice_core::{AudioOutput, PlaybackError, PlaybackNotifier, PlaybackResource};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

/// The system default output device.
///
/// The `rodio::OutputStream` lives on a keeper thread for as long as this
/// value exists; only its `Send` handle is kept here.
pub struct RodioOutput {
    handle: OutputStreamHandle,
    shutdown: Option<std_mpsc::Sender<()>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl RodioOutput {
    /// Open the default output device.
    pub fn open_default() -> Result<Self, PlaybackError> {
        let (handle_tx, handle_rx) = std_mpsc::channel();
        let (shutdown_tx, shutdown_rx) = std_mpsc::channel::<()>();

        let thread = thread::Builder::new()
            .name("carevoice-speaker".into())
            .spawn(move || match OutputStream::try_default() {
                Ok((_stream, handle)) => {
                    let _ = handle_tx.send(Ok(handle));
                    // Blocks until the sender is dropped.
                    let _ = shutdown_rx.recv();
                }
                Err(e) => {
                    let _ = handle_tx.send(Err(PlaybackError::OutputUnavailable(e.to_string())));
                }
            })
            .map_err(|e| PlaybackError::OutputUnavailable(format!("failed to spawn audio thread: {e}")))?;

        let handle = handle_rx.recv().map_err(|_| {
            PlaybackError::OutputUnavailable("audio output thread exited".to_string())
        })??;

        tracing::info!("Audio playback initialized on default output device");
        Ok(Self {
            handle,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }
}

impl Drop for RodioOutput {
    fn drop(&mut self) {
        self.shutdown.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl AudioOutput for RodioOutput {
    fn load(
        &self,
        data: Vec<u8>,
        mime_type: &str,
        notifier: PlaybackNotifier,
    ) -> Result<Box<dyn PlaybackResource>, PlaybackError> {
        let decoder = Decoder::new(Cursor::new(data)).map_err(|e| PlaybackError::Decode {
            mime_type: mime_type.to_string(),
            reason: e.to_string(),
        })?;

        let sink =
            Sink::try_new(&self.handle).map_err(|e| PlaybackError::OutputUnavailable(e.to_string()))?;
        sink.pause();
        sink.append(decoder);

        Ok(Box::new(RodioPlayback {
            sink: Arc::new(sink),
            notifier,
            stopped: Arc::new(AtomicBool::new(false)),
            watching: false,
        }))
    }
}

/// One decoded reply queued on its own sink.
struct RodioPlayback {
    sink: Arc<Sink>,
    notifier: PlaybackNotifier,
    /// Set once the playback was released, so the watcher stays quiet.
    stopped: Arc<AtomicBool>,
    watching: bool,
}

impl PlaybackResource for RodioPlayback {
    fn play(&mut self) -> Result<(), PlaybackError> {
        self.sink.play();
        if self.watching {
            return Ok(());
        }

        self.notifier.started();
        let sink = Arc::clone(&self.sink);
        let stopped = Arc::clone(&self.stopped);
        let notifier = self.notifier.clone();

        // `sleep_until_end()` returns when the queue drains or `stop()` is
        // called on the sink.
        thread::Builder::new()
            .name("carevoice-playback-watch".into())
            .spawn(move || {
                sink.sleep_until_end();
                if !stopped.swap(true, Ordering::SeqCst) {
                    tracing::debug!(playback = notifier.id(), "Playback finished naturally");
                    notifier.finished();
                }
            })
            .map_err(|e| PlaybackError::Start(e.to_string()))?;

        self.watching = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn release(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.sink.stop();
    }
}
