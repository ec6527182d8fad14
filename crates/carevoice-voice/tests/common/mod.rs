//! Fake hardware and collaborators shared by the pipeline tests.
//!
//! Everything here answers instantly (or never, for `Script::Hang`) and
//! records what it was asked to do. No audio devices or network involved.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use carevoice_core::{
    AssistantTurn, AudioClip, AudioInputHost, AudioOutput, CaptureError, CaptureStream,
    CollaboratorError, ConversationEvent, ConversationPort, OpenedCapture, PlaybackError, PlaybackNotifier, PlaybackResource,
    PlaybackSignal, PlaybackSignalKind, SynthesisPort, SynthesisRequest, SynthesizedSpeech,
    TranscriptionPort, TurnId, UserTurn, VoiceSettings,
};
use carevoice_voice::{VoiceCollaborators, VoiceEvent, VoicePipeline};
use tokio::sync::{Notify, mpsc};

/// A tiny WAV header, base64-encoded, as the synthesis service returns it.
pub const REPLY_AUDIO: &str = "data:audio/wav;base64,UklGRiQAAABXQVZF";

// ── Microphone ─────────────────────────────────────────────────────

struct FakeStream {
    tx: Option<mpsc::UnboundedSender<Vec<u8>>>,
    releases: Arc<AtomicUsize>,
    slow_finalize: bool,
    finalizing: Arc<Notify>,
}

#[async_trait]
impl CaptureStream for FakeStream {
    async fn finalize(&mut self) -> Result<(), CaptureError> {
        self.finalizing.notify_one();
        if self.slow_finalize {
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(b"fake-webm-".to_vec());
            let _ = tx.send(b"audio".to_vec());
        }
        Ok(())
    }

    fn stop_tracks(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Microphone that records a fixed clip and counts track releases.
#[derive(Default)]
pub struct FakeMic {
    pub opens: AtomicUsize,
    pub releases: Arc<AtomicUsize>,
    pub deny: AtomicBool,
    /// Encoder takes 200 ms to flush.
    pub slow_finalize: AtomicBool,
    /// Notified when an encoder starts flushing.
    pub finalizing: Arc<Notify>,
}

impl FakeMic {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioInputHost for FakeMic {
    fn supported_mime_types(&self) -> Vec<String> {
        vec!["audio/webm".to_string()]
    }

    async fn open(&self, _mime_type: &str) -> Result<OpenedCapture, CaptureError> {
        if self.deny.load(Ordering::SeqCst) {
            return Err(CaptureError::PermissionDenied);
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        Ok(OpenedCapture {
            stream: Box::new(FakeStream {
                tx: Some(tx),
                releases: Arc::clone(&self.releases),
                slow_finalize: self.slow_finalize.load(Ordering::SeqCst),
                finalizing: Arc::clone(&self.finalizing),
            }),
            chunks: rx,
        })
    }
}

// ── Speaker ────────────────────────────────────────────────────────

struct FakeResource {
    releases: Arc<AtomicUsize>,
}

impl PlaybackResource for FakeResource {
    fn play(&mut self) -> Result<(), PlaybackError> {
        Ok(())
    }

    fn pause(&mut self) {}

    fn release(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Speaker that remembers every playback it loaded.
#[derive(Default)]
pub struct FakeSpeaker {
    pub loaded: Mutex<Vec<(u64, String)>>,
    pub releases: Arc<AtomicUsize>,
    notifiers: Mutex<Vec<PlaybackNotifier>>,
}

impl FakeSpeaker {
    /// Id of the most recently loaded playback.
    pub fn last_id(&self) -> Option<u64> {
        self.loaded.lock().unwrap().last().map(|(id, _)| *id)
    }

    pub fn loads(&self) -> usize {
        self.loaded.lock().unwrap().len()
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Signal that the latest playback drained.
    pub fn finished_signal(&self) -> PlaybackSignal {
        self.signal(PlaybackSignalKind::Finished)
    }

    pub fn signal(&self, kind: PlaybackSignalKind) -> PlaybackSignal {
        PlaybackSignal {
            id: self.last_id().expect("nothing was played"),
            kind,
        }
    }

    /// Report the latest playback finished through its own notifier.
    pub fn finish_latest(&self) {
        if let Some(notifier) = self.notifiers.lock().unwrap().last() {
            notifier.finished();
        }
    }
}

impl AudioOutput for FakeSpeaker {
    fn load(
        &self,
        _data: Vec<u8>,
        mime_type: &str,
        notifier: PlaybackNotifier,
    ) -> Result<Box<dyn PlaybackResource>, PlaybackError> {
        self.loaded
            .lock()
            .unwrap()
            .push((notifier.id(), mime_type.to_string()));
        self.notifiers.lock().unwrap().push(notifier);
        Ok(Box::new(FakeResource {
            releases: Arc::clone(&self.releases),
        }))
    }
}

// ── Collaborators ──────────────────────────────────────────────────

/// Canned transcription behaviour.
#[derive(Clone)]
pub enum Script {
    Text(&'static str),
    Nothing,
    Status(u16),
    Hang,
}

/// Transcriber that follows a [`Script`] and counts calls.
pub struct FakeTranscriber {
    script: Script,
    pub calls: AtomicUsize,
    pub clips: Mutex<Vec<AudioClip>>,
}

impl FakeTranscriber {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            clips: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptionPort for FakeTranscriber {
    async fn transcribe(&self, clip: AudioClip) -> Result<Option<String>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.clips.lock().unwrap().push(clip);
        match self.script.clone() {
            Script::Text(text) => Ok(Some(text.to_string())),
            Script::Nothing => Ok(None),
            Script::Status(status) => Err(CollaboratorError::Status {
                status,
                body: "upstream exploded".to_string(),
            }),
            Script::Hang => std::future::pending().await,
        }
    }
}

/// Synthesizer that always answers with [`REPLY_AUDIO`].
#[derive(Default)]
pub struct FakeSynthesizer {
    pub requests: Mutex<Vec<SynthesisRequest>>,
    pub fail: AtomicBool,
    pub hang: AtomicBool,
}

impl FakeSynthesizer {
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl SynthesisPort for FakeSynthesizer {
    async fn synthesize(
        &self,
        request: SynthesisRequest,
    ) -> Result<SynthesizedSpeech, CollaboratorError> {
        self.requests.lock().unwrap().push(request);
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Network("connection reset".to_string()));
        }
        Ok(SynthesizedSpeech {
            audio: REPLY_AUDIO.to_string(),
            format: "wav".to_string(),
        })
    }
}

/// Conversation that records appended turns.
#[derive(Default)]
pub struct RecordingConversation {
    pub turns: Mutex<Vec<UserTurn>>,
}

impl RecordingConversation {
    pub fn contents(&self) -> Vec<String> {
        self.turns.lock().unwrap().iter().map(UserTurn::content).collect()
    }

    pub fn last_turn_id(&self) -> Option<TurnId> {
        self.turns.lock().unwrap().last().map(|turn| turn.id)
    }

    /// The finalized reply to the most recently appended turn.
    pub fn reply(&self, text: &str) -> ConversationEvent {
        let turn = AssistantTurn::new("reply-1", text);
        ConversationEvent::AssistantTurnFinalized(match self.last_turn_id() {
            Some(id) => turn.replying_to(id),
            None => turn,
        })
    }
}

#[async_trait]
impl ConversationPort for RecordingConversation {
    async fn append_user_turn(&self, turn: UserTurn) -> Result<(), CollaboratorError> {
        self.turns.lock().unwrap().push(turn);
        Ok(())
    }
}

// ── Harness ────────────────────────────────────────────────────────

pub struct Harness {
    pub pipeline: VoicePipeline,
    pub events: mpsc::UnboundedReceiver<VoiceEvent>,
    pub mic: Arc<FakeMic>,
    pub speaker: Arc<FakeSpeaker>,
    pub conversation: Arc<RecordingConversation>,
}

/// Build a pipeline over fresh fakes with the given collaborators.
pub fn harness_with(
    settings: &VoiceSettings,
    transcriber: Arc<dyn TranscriptionPort>,
    synthesizer: Arc<dyn SynthesisPort>,
) -> Harness {
    let mic = Arc::new(FakeMic::default());
    let speaker = Arc::new(FakeSpeaker::default());
    let conversation = Arc::new(RecordingConversation::default());

    let (pipeline, events) = VoicePipeline::new(
        settings,
        VoiceCollaborators {
            input: Arc::clone(&mic) as Arc<dyn AudioInputHost>,
            output: Arc::clone(&speaker) as Arc<dyn AudioOutput>,
            transcriber,
            synthesizer,
            conversation: Arc::clone(&conversation) as Arc<dyn ConversationPort>,
        },
    );

    Harness {
        pipeline,
        events,
        mic,
        speaker,
        conversation,
    }
}

pub fn harness(
    transcriber: Arc<dyn TranscriptionPort>,
    synthesizer: Arc<dyn SynthesisPort>,
) -> Harness {
    harness_with(&VoiceSettings::default(), transcriber, synthesizer)
}

/// Drain all pending events from the event receiver and return them.
pub fn drain_events(rx: &mut mpsc::UnboundedReceiver<VoiceEvent>) -> Vec<VoiceEvent> {
    let mut events = Vec::new();
    while let Ok(e) = rx.try_recv() {
        events.push(e);
    }
    events
}

/// Collect only the state values from `StateChanged` events.
pub fn states_from(events: &[VoiceEvent]) -> Vec<carevoice_core::VoiceTurnState> {
    events
        .iter()
        .filter_map(|e| match e {
            VoiceEvent::StateChanged(s) => Some(*s),
            _ => None,
        })
        .collect()
}

/// Collect notice messages.
pub fn notices_from(events: &[VoiceEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            VoiceEvent::Notice(n) => Some(n.message.clone()),
            _ => None,
        })
        .collect()
}
