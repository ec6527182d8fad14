//! `talk`: interactive voice conversation.
//!
//! Wires the default microphone and speaker, the HTTP collaborators and an
//! OpenAI-compatible chat server into a running voice pipeline, then reads
//! commands from stdin:
//!
//! - empty line: press the voice button (start or stop recording)
//! - `stop`: stop the reply being generated
//! - `cancel`: abandon the current voice turn
//! - `quit`: exit
//! - anything else: send it as a typed question

use std::sync::Arc;

use anyhow::Result;
use carevoice_core::{ConversationEvent, ConversationPort, UserTurn};
use carevoice_http::{ChatConversation, ChatOptions};
use carevoice_voice::local::{CpalInputHost, RodioOutput};
use carevoice_voice::{NoticeLevel, VoiceCollaborators, VoiceEvent, VoicePipeline};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::bootstrap::CliContext;
use crate::error::CliError;

#[derive(Debug, Clone)]
pub struct TalkArgs {
    pub chat_url: String,
    pub model: String,
    pub system_prompt: Option<String>,
}

/// One line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TalkInput {
    Toggle,
    StopGeneration,
    Cancel,
    Quit,
    Ask(String),
}

impl TalkInput {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "" => Self::Toggle,
            "stop" => Self::StopGeneration,
            "cancel" => Self::Cancel,
            "quit" | "exit" => Self::Quit,
            text => Self::Ask(text.to_string()),
        }
    }
}

pub async fn execute(ctx: &CliContext, args: TalkArgs) -> Result<()> {
    let settings = &ctx.settings;

    // Chat events are teed: printed here, then forwarded to the pipeline.
    let (chat_tx, mut chat_rx) = mpsc::unbounded_channel();
    let (conversation_tx, conversation_rx) = mpsc::unbounded_channel();
    let chat = ChatConversation::new(
        &ctx.chat_config(&args.chat_url),
        ChatOptions {
            model: args.model,
            system_prompt: args.system_prompt,
        },
        settings.tag(),
        chat_tx,
    )
    .map_err(CliError::from)?;

    let output = RodioOutput::open_default().map_err(|e| CliError::Audio(e.to_string()))?;
    let collaborators = VoiceCollaborators {
        input: Arc::new(CpalInputHost::new()),
        output: Arc::new(output),
        transcriber: Arc::new(ctx.transcriber()?),
        synthesizer: Arc::new(ctx.synthesizer()?),
        conversation: Arc::new(chat.clone()),
    };

    let (pipeline, mut events) = VoicePipeline::new(settings, collaborators);
    let (voice, pipeline_task) = pipeline.spawn(conversation_rx);

    let tee = tokio::spawn(async move {
        while let Some(event) = chat_rx.recv().await {
            match &event {
                ConversationEvent::AssistantTurnFinalized(turn) => {
                    println!("Assistant: {}", turn.text.trim());
                }
                ConversationEvent::GenerationCancelled { .. } => eprintln!("(reply stopped)"),
                ConversationEvent::AssistantTurnDelta { .. } => {}
            }
            if conversation_tx.send(event).is_err() {
                break;
            }
        }
    });

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            render(&event);
        }
    });

    println!(
        "Voice ready ({} portal, voice {}). Enter toggles recording; type `stop`, `cancel` or `quit`.",
        settings.portal,
        settings.voice()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.map_err(CliError::from)? {
        match TalkInput::parse(&line) {
            TalkInput::Toggle => voice.toggle_voice().map_err(CliError::from)?,
            TalkInput::StopGeneration => {
                if !chat.stop_generation() {
                    eprintln!("Nothing is being generated.");
                }
            }
            TalkInput::Cancel => voice.cancel().map_err(CliError::from)?,
            TalkInput::Quit => break,
            TalkInput::Ask(text) => {
                chat.append_user_turn(UserTurn::typed(text))
                    .await
                    .map_err(|e| CliError::Service(e.to_string()))?;
            }
        }
    }

    // Dropping the last handle shuts the pipeline down.
    drop(voice);
    if let Err(e) = pipeline_task.await {
        tracing::warn!(error = %e, "Voice pipeline task ended abnormally");
    }
    chat.stop_generation();
    tee.abort();
    let _ = printer.await;
    Ok(())
}

fn render(event: &VoiceEvent) {
    match event {
        VoiceEvent::StateChanged(state) => tracing::info!(%state, "Voice state"),
        VoiceEvent::Notice(notice) => match notice.level {
            NoticeLevel::Error => eprintln!("✗ {}", notice.message),
            NoticeLevel::Success | NoticeLevel::Info => eprintln!("• {}", notice.message),
        },
        VoiceEvent::Transcript(text) => println!("You: {text}"),
        VoiceEvent::PlaybackStarted => tracing::debug!("Speaking reply"),
        VoiceEvent::PlaybackFinished => tracing::debug!("Reply finished"),
    }
}
