//! Voice pipeline orchestrator: the only owner of the turn state.
//!
//! ```text
//!   Idle → Recording → Transcribing → AwaitingReply → Synthesizing → Playing → Idle
//!    ▲         │             │               │               │           │
//!    └─────────┴─────────────┴───── cancel / empty / failure ┴───────────┘
//! ```
//!
//! A single task ([`VoicePipeline::run`]) waits on three completion signals:
//! UI commands, conversation events, and playback signals. Stages within a
//! turn run strictly in order. The encoder finalize and every collaborator
//! call race a [`CancellationToken`] taken when the turn starts recording,
//! so a cancel from the UI wins immediately.
//!
//! Only the reply to the user turn this pipeline appended is spoken. Replies
//! to typed questions that land while a voice turn is in flight are ignored.
//!
//! Failures are turn-scoped: the pipeline passes through `Error`, raises the
//! failure's notice, releases everything it holds, and settles to `Idle`.

use std::sync::{Arc, Mutex, PoisonError};

use carevoice_core::{
    AudioInputHost, AudioOutput, ConversationEvent, ConversationPort, PlaybackSignal,
    SynthesisPort, TranscriptionPort, TurnId, VoiceSettings, VoiceTurnState,
};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::capture::AudioCaptureManager;
use crate::error::VoiceError;
use crate::notice::Notice;
use crate::playback::{PlaybackManager, PlaybackOutcome};
use crate::speech::SpeechReplyRelay;
use crate::transcription::{TranscriptionOutcome, TranscriptionRelay};

// ── Events emitted by the pipeline ─────────────────────────────────

/// Events emitted by the voice pipeline to the UI / application layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceEvent {
    /// Turn state changed.
    StateChanged(VoiceTurnState),

    /// Something the user should see.
    Notice(Notice),

    /// A transcript was appended to the conversation.
    Transcript(String),

    /// Reply audio became audible.
    PlaybackStarted,

    /// Reply audio ended (drained or stopped).
    PlaybackFinished,
}

/// Commands accepted by a running pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceCommand {
    Toggle,
    Cancel,
}

/// Everything outside the pipeline it talks to.
pub struct VoiceCollaborators {
    pub input: Arc<dyn AudioInputHost>,
    pub output: Arc<dyn AudioOutput>,
    pub transcriber: Arc<dyn TranscriptionPort>,
    pub synthesizer: Arc<dyn SynthesisPort>,
    pub conversation: Arc<dyn ConversationPort>,
}

/// Cancellation token for the in-flight turn, swapped for a fresh one each
/// time it fires.
#[derive(Debug, Clone, Default)]
struct Interrupt(Arc<Mutex<CancellationToken>>);

impl Interrupt {
    fn token(&self) -> CancellationToken {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn fire(&self) {
        let mut token = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        token.cancel();
        *token = CancellationToken::new();
    }
}

// ── Voice pipeline ─────────────────────────────────────────────────

/// The voice turn orchestrator.
pub struct VoicePipeline {
    state: VoiceTurnState,
    capture: AudioCaptureManager,
    playback: PlaybackManager,
    playback_rx: mpsc::UnboundedReceiver<PlaybackSignal>,
    transcription: TranscriptionRelay,
    speech: SpeechReplyRelay,
    event_tx: mpsc::UnboundedSender<VoiceEvent>,
    state_tx: watch::Sender<VoiceTurnState>,
    interrupt: Interrupt,
    /// Interrupt token taken when the current turn started recording.
    turn: CancellationToken,
    /// The voice-tagged user turn whose reply is awaited.
    awaiting: Option<TurnId>,
}

impl VoicePipeline {
    /// Create a pipeline in `Idle`.
    ///
    /// Returns the pipeline and a receiver for [`VoiceEvent`]s.
    #[must_use]
    pub fn new(
        settings: &VoiceSettings,
        collaborators: VoiceCollaborators,
    ) -> (Self, mpsc::UnboundedReceiver<VoiceEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(VoiceTurnState::Idle);
        let (playback, playback_rx) = PlaybackManager::new(collaborators.output);
        let timeout = settings.request_timeout();
        let interrupt = Interrupt::default();

        let pipeline = Self {
            state: VoiceTurnState::Idle,
            capture: AudioCaptureManager::new(
                collaborators.input,
                settings.preferred_mime_types.clone(),
            ),
            playback,
            playback_rx,
            transcription: TranscriptionRelay::new(
                collaborators.transcriber,
                collaborators.conversation,
                settings.tag(),
                timeout,
            ),
            speech: SpeechReplyRelay::new(collaborators.synthesizer, settings.voice(), timeout),
            event_tx,
            state_tx,
            turn: interrupt.token(),
            interrupt,
            awaiting: None,
        };

        (pipeline, event_rx)
    }

    pub const fn state(&self) -> VoiceTurnState {
        self.state
    }

    pub const fn is_recording(&self) -> bool {
        self.capture.is_recording()
    }

    pub const fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    /// Whether a clip is currently inside the transcription relay.
    pub fn is_processing(&self) -> bool {
        self.transcription.guard().is_processing()
    }

    /// Watch the turn state.
    pub fn subscribe(&self) -> watch::Receiver<VoiceTurnState> {
        self.state_tx.subscribe()
    }

    /// A handle that interrupts whatever collaborator call is in flight.
    pub fn handle(&self, commands: mpsc::UnboundedSender<VoiceCommand>) -> VoiceHandle {
        VoiceHandle {
            commands,
            state: self.state_tx.subscribe(),
            interrupt: self.interrupt.clone(),
        }
    }

    // ── Turn control ───────────────────────────────────────────────

    /// The voice button.
    ///
    /// Idle starts recording, Recording finishes the clip and hands it off,
    /// Playing stops the reply and starts a new recording. Any other stage
    /// is busy and the press is refused with a notice.
    pub async fn toggle(&mut self) -> Result<(), VoiceError> {
        match self.state {
            VoiceTurnState::Idle => self.begin_recording().await,
            VoiceTurnState::Recording => self.finish_recording().await,
            VoiceTurnState::Playing => {
                tracing::info!("Barge-in, stopping reply playback");
                self.playback.stop_audio();
                self.emit(VoiceEvent::PlaybackFinished);
                self.set_state(VoiceTurnState::Idle);
                self.begin_recording().await
            }
            VoiceTurnState::Error => {
                self.set_state(VoiceTurnState::Idle);
                self.begin_recording().await
            }
            busy @ (VoiceTurnState::Transcribing
            | VoiceTurnState::AwaitingReply
            | VoiceTurnState::Synthesizing) => {
                let err = VoiceError::Busy(busy);
                tracing::debug!(state = %busy, "Toggle refused while turn in flight");
                if let Some(message) = err.notice() {
                    self.emit(VoiceEvent::Notice(Notice::info(message)));
                }
                Err(err)
            }
        }
    }

    async fn begin_recording(&mut self) -> Result<(), VoiceError> {
        self.turn = self.interrupt.token();
        if let Err(err) = self.capture.start_recording().await {
            // Nothing is held yet, so there is no turn to fail.
            tracing::warn!(error = %err, "Failed to start recording");
            if let Some(message) = err.notice() {
                self.emit(VoiceEvent::Notice(Notice::error(message)));
            }
            return Err(err);
        }

        self.set_state(VoiceTurnState::Recording);
        self.emit(VoiceEvent::Notice(Notice::success("Recording started")));
        Ok(())
    }

    /// Stop recording and hand the clip to transcription.
    ///
    /// A no-op outside `Recording`, so a repeated stop never produces a
    /// second hand-off.
    pub async fn finish_recording(&mut self) -> Result<(), VoiceError> {
        if self.state != VoiceTurnState::Recording {
            tracing::debug!(state = %self.state, "No recording to finish");
            return Ok(());
        }

        // Any interrupt fired since recording began, including one during
        // encoder finalize, ends the turn before the clip leaves.
        let token = self.turn.clone();
        let stopped = tokio::select! {
            biased;
            () = token.cancelled() => false,
            _ = self.capture.stop_recording() => true,
        };
        if !stopped {
            tracing::debug!("Recording cancelled while finalizing, clip discarded");
            self.reset();
            return Err(VoiceError::Cancelled);
        }
        self.emit(VoiceEvent::Notice(Notice::success("Recording stopped")));

        let Some(clip) = self.capture.take_clip() else {
            self.set_state(VoiceTurnState::Idle);
            return Ok(());
        };

        self.set_state(VoiceTurnState::Transcribing);
        let result = tokio::select! {
            biased;
            () = token.cancelled() => Err(VoiceError::Cancelled),
            result = self.transcription.hand_off(clip) => result,
        };
        self.capture.clear_recording();

        match result {
            Ok(TranscriptionOutcome::Appended { turn, text }) => {
                self.emit(VoiceEvent::Transcript(text));
                self.set_state(VoiceTurnState::AwaitingReply);
                self.awaiting = Some(turn);
                Ok(())
            }
            Ok(TranscriptionOutcome::Empty) => {
                self.set_state(VoiceTurnState::Idle);
                Ok(())
            }
            Err(err @ (VoiceError::Cancelled | VoiceError::AlreadyProcessing)) => {
                tracing::debug!(error = %err, "Hand-off ended without a transcript");
                self.reset();
                Err(err)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// React to the conversation's lifecycle.
    pub async fn handle_conversation_event(
        &mut self,
        event: ConversationEvent,
    ) -> Result<(), VoiceError> {
        let reply = match &event {
            ConversationEvent::AssistantTurnDelta { turn_id, .. } => {
                tracing::trace!(turn = %turn_id, "Reply still streaming");
                return Ok(());
            }
            ConversationEvent::GenerationCancelled { in_reply_to } => {
                let ours = in_reply_to.is_none_or(|turn| self.awaiting == Some(turn));
                if self.state == VoiceTurnState::AwaitingReply && ours {
                    tracing::info!("Reply generation cancelled, voice turn ends");
                    self.set_state(VoiceTurnState::Idle);
                }
                return Ok(());
            }
            ConversationEvent::AssistantTurnFinalized(reply) => reply,
        };

        if self.state != VoiceTurnState::AwaitingReply {
            tracing::debug!(state = %self.state, "Finalized reply outside a voice turn");
            return Ok(());
        }
        if !self.awaiting.is_some_and(|turn| reply.answers(turn)) {
            tracing::debug!(reply = %reply.id, "Finalized reply answers another turn");
            return Ok(());
        }
        let Some(turn) = SpeechReplyRelay::reply_to_speak(self.awaiting, &event) else {
            tracing::debug!("Finalized reply has no text to speak");
            self.set_state(VoiceTurnState::Idle);
            return Ok(());
        };

        let token = self.turn.clone();
        self.set_state(VoiceTurnState::Synthesizing);
        let result = tokio::select! {
            biased;
            () = token.cancelled() => Err(VoiceError::Cancelled),
            result = self.speech.synthesize(turn) => result,
        };

        let speech = match result {
            Ok(speech) => speech,
            Err(VoiceError::Cancelled) => {
                self.reset();
                return Err(VoiceError::Cancelled);
            }
            Err(err) => return Err(self.fail(err)),
        };

        match self.playback.play_audio(&speech.audio, &speech.format) {
            Ok(id) => {
                tracing::debug!(playback = id, "Reply playback started");
                self.set_state(VoiceTurnState::Playing);
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Apply a lifecycle signal from the speaker.
    pub fn handle_playback_signal(&mut self, signal: &PlaybackSignal) {
        match self.playback.handle_signal(signal) {
            Some(PlaybackOutcome::Started) => self.emit(VoiceEvent::PlaybackStarted),
            Some(PlaybackOutcome::Finished) => {
                self.emit(VoiceEvent::PlaybackFinished);
                if self.state == VoiceTurnState::Playing {
                    self.set_state(VoiceTurnState::Idle);
                }
            }
            Some(PlaybackOutcome::Failed(reason)) => {
                if self.state == VoiceTurnState::Playing {
                    self.fail(VoiceError::PlaybackFailed(reason));
                }
            }
            None => {}
        }
    }

    /// Abandon the turn from any state.
    ///
    /// Stops capture (discarding the clip), stops playback, interrupts any
    /// in-flight collaborator call, and settles to `Idle`.
    pub fn cancel(&mut self) {
        self.interrupt.fire();
        if self.state == VoiceTurnState::Idle && !self.is_recording() && !self.is_playing() {
            return;
        }
        tracing::info!(state = %self.state, "Cancelling voice turn");
        self.reset();
    }

    // ── Run loop ───────────────────────────────────────────────────

    /// Spawn [`run`](Self::run) on the current runtime.
    pub fn spawn(
        self,
        conversation_events: mpsc::UnboundedReceiver<ConversationEvent>,
    ) -> (VoiceHandle, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let handle = self.handle(command_tx);
        let task = tokio::spawn(self.run(command_rx, conversation_events));
        (handle, task)
    }

    /// Drive the pipeline until every command sender is dropped.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<VoiceCommand>,
        mut conversation_events: mpsc::UnboundedReceiver<ConversationEvent>,
    ) {
        tracing::info!(voice = %self.speech.voice(), "Voice pipeline running");
        let mut conversation_open = true;

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(VoiceCommand::Toggle) => {
                        if let Err(e) = self.toggle().await {
                            tracing::debug!(error = %e, "Toggle did not advance the turn");
                        }
                    }
                    Some(VoiceCommand::Cancel) => self.cancel(),
                    None => break,
                },
                event = conversation_events.recv(), if conversation_open => match event {
                    Some(event) => {
                        if let Err(e) = self.handle_conversation_event(event).await {
                            tracing::debug!(error = %e, "Reply was not spoken");
                        }
                    }
                    None => {
                        tracing::warn!("Conversation event stream closed");
                        conversation_open = false;
                        if self.state == VoiceTurnState::AwaitingReply {
                            self.set_state(VoiceTurnState::Idle);
                        }
                    }
                },
                Some(signal) = self.playback_rx.recv() => self.handle_playback_signal(&signal),
            }
        }

        self.cancel();
        tracing::info!("Voice pipeline stopped");
    }

    // ── Internal helpers ───────────────────────────────────────────

    /// Release every resource the turn holds and settle to `Idle`.
    fn reset(&mut self) {
        self.capture.abort();
        if self.playback.is_playing() {
            self.playback.stop_audio();
            self.emit(VoiceEvent::PlaybackFinished);
        }
        self.transcription.guard().reset();
        self.set_state(VoiceTurnState::Idle);
    }

    /// End the turn with a user-visible failure.
    fn fail(&mut self, err: VoiceError) -> VoiceError {
        tracing::warn!(error = %err, state = %self.state, "Voice turn failed");
        self.set_state(VoiceTurnState::Error);
        if let Some(message) = err.notice() {
            self.emit(VoiceEvent::Notice(Notice::error(message)));
        }
        self.reset();
        err
    }

    /// Transition to a new state and emit a state-change event.
    fn set_state(&mut self, new_state: VoiceTurnState) {
        if self.state == new_state {
            return;
        }
        if !self.state.can_transition_to(new_state) {
            tracing::warn!(old = %self.state, new = %new_state, "Unexpected voice state transition");
        }
        tracing::debug!(old = %self.state, new = %new_state, "Voice state transition");
        if new_state != VoiceTurnState::AwaitingReply {
            self.awaiting = None;
        }
        self.state = new_state;
        self.state_tx.send_replace(new_state);
        self.emit(VoiceEvent::StateChanged(new_state));
    }

    /// Emit a voice event. A dropped receiver is logged, not an error.
    fn emit(&self, event: VoiceEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::warn!("Voice event receiver dropped");
        }
    }
}

// ── Handle ─────────────────────────────────────────────────────────

/// Cloneable UI-side handle to a running pipeline.
#[derive(Debug, Clone)]
pub struct VoiceHandle {
    commands: mpsc::UnboundedSender<VoiceCommand>,
    state: watch::Receiver<VoiceTurnState>,
    interrupt: Interrupt,
}

impl VoiceHandle {
    /// Press the voice button.
    pub fn toggle_voice(&self) -> Result<(), VoiceError> {
        self.commands
            .send(VoiceCommand::Toggle)
            .map_err(|_| VoiceError::Shutdown)
    }

    /// Abandon the current turn. An in-flight encoder finalize or
    /// collaborator call is interrupted before the command reaches the
    /// pipeline.
    pub fn cancel(&self) -> Result<(), VoiceError> {
        self.interrupt.fire();
        self.commands
            .send(VoiceCommand::Cancel)
            .map_err(|_| VoiceError::Shutdown)
    }

    pub fn state(&self) -> VoiceTurnState {
        *self.state.borrow()
    }

    pub fn is_recording(&self) -> bool {
        self.state() == VoiceTurnState::Recording
    }

    pub fn is_playing(&self) -> bool {
        self.state() == VoiceTurnState::Playing
    }

    /// Watch the turn state.
    pub fn subscribe(&self) -> watch::Receiver<VoiceTurnState> {
        self.state.clone()
    }
}
