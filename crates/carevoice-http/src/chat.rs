//! A conversation backed by an OpenAI-compatible chat completion endpoint.
//!
//! [`ChatConversation`] keeps the message history, strips the voice tag
//! before anything goes upstream and generates replies in the background.
//! Outcomes are reported as [`ConversationEvent`]s on the channel handed to
//! [`ChatConversation::new`], which is what the voice pipeline listens to.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use carevoice_core::{
    AssistantTurn, CollaboratorError, ConversationEvent, ConversationPort, UserTurn, VoiceTag,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::HttpClientConfig;
use crate::error::{HttpClientError, HttpResult};
use crate::http::{HttpBackend, ReqwestBackend, decode_json};
use crate::url::{CHAT_COMPLETIONS_PATH, endpoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Model selection and prompt for the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatOptions {
    pub model: String,
    pub system_prompt: Option<String>,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            model: "default".to_string(),
            system_prompt: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

struct Inner<B> {
    backend: B,
    url: Url,
    options: ChatOptions,
    tag: VoiceTag,
    history: Mutex<Vec<ChatMessage>>,
    generation: Mutex<Option<Generation>>,
    next_generation: AtomicU64,
    events: mpsc::UnboundedSender<ConversationEvent>,
}

impl<B: HttpBackend> Inner<B> {
    fn emit(&self, event: ConversationEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("Conversation event receiver dropped");
        }
    }

    /// System prompt followed by the history so far.
    fn transcript(&self) -> Vec<ChatMessage> {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        self.options
            .system_prompt
            .iter()
            .map(|prompt| ChatMessage::new(ChatRole::System, prompt.clone()))
            .chain(history.iter().cloned())
            .collect()
    }

    async fn complete(&self, messages: &[ChatMessage]) -> HttpResult<AssistantTurn> {
        let request = CompletionRequest {
            model: &self.options.model,
            messages,
            stream: false,
        };
        let body = serde_json::to_value(&request)?;
        let response = self.backend.post_json(&self.url, &body).await?;
        let parsed: CompletionResponse = decode_json(&self.url, &response)?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| HttpClientError::InvalidResponse {
                message: "completion has no message content".to_string(),
            })?;
        let id = parsed
            .id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Ok(AssistantTurn::new(id, text))
    }

    /// Clear the live generation slot if `id` still owns it.
    ///
    /// Returns `true` when a newer generation has taken the slot over.
    fn finish_generation(&self, id: u64) -> bool {
        let mut generation = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
        match generation.as_ref() {
            Some(live) if live.id == id => {
                *generation = None;
                false
            }
            Some(_) => true,
            None => false,
        }
    }
}

/// The reply currently being generated.
struct Generation {
    id: u64,
    token: CancellationToken,
}

/// OpenAI-compatible chat conversation.
///
/// Cheap to clone; clones share the history and the live generation.
pub struct ChatConversation<B = ReqwestBackend> {
    inner: Arc<Inner<B>>,
}

impl<B> Clone for ChatConversation<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl ChatConversation<ReqwestBackend> {
    pub fn new(
        config: &HttpClientConfig,
        options: ChatOptions,
        tag: VoiceTag,
        events: mpsc::UnboundedSender<ConversationEvent>,
    ) -> HttpResult<Self> {
        Self::with_backend(config, ReqwestBackend::new(config)?, options, tag, events)
    }
}

impl<B: HttpBackend + 'static> ChatConversation<B> {
    pub fn with_backend(
        config: &HttpClientConfig,
        backend: B,
        options: ChatOptions,
        tag: VoiceTag,
        events: mpsc::UnboundedSender<ConversationEvent>,
    ) -> HttpResult<Self> {
        Ok(Self {
            inner: Arc::new(Inner {
                backend,
                url: endpoint(&config.base_url, CHAT_COMPLETIONS_PATH)?,
                options,
                tag,
                history: Mutex::new(Vec::new()),
                generation: Mutex::new(None),
                next_generation: AtomicU64::new(0),
                events,
            }),
        })
    }

    /// Messages exchanged so far, voice tags already stripped.
    pub fn history(&self) -> Vec<ChatMessage> {
        self.inner
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a reply is being generated.
    pub fn is_generating(&self) -> bool {
        self.inner
            .generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Stop the reply being generated, if any.
    ///
    /// The conversation reports [`ConversationEvent::GenerationCancelled`].
    pub fn stop_generation(&self) -> bool {
        let live = self
            .inner
            .generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match live {
            Some(generation) => {
                tracing::info!(generation = generation.id, "Stopping reply generation");
                generation.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Record `turn` and start generating the reply in the background.
    fn submit(&self, turn: &UserTurn) {
        let content = turn.content();
        let upstream = self.inner.tag.strip(&content).unwrap_or(&content);
        self.inner
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ChatMessage::new(ChatRole::User, upstream));

        let id = self.inner.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let token = CancellationToken::new();
        let previous = self
            .inner
            .generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Generation {
                id,
                token: token.clone(),
            });
        if let Some(previous) = previous {
            previous.token.cancel();
        }

        let messages = self.inner.transcript();
        let inner = Arc::clone(&self.inner);
        let turn_id = turn.id;
        tracing::debug!(
            turn = %turn.id,
            generation = id,
            voice = turn.is_voice(),
            messages = messages.len(),
            "Generating reply"
        );

        tokio::spawn(async move {
            let outcome = tokio::select! {
                result = inner.complete(&messages) => Some(result),
                () = token.cancelled() => None,
            };
            let superseded = inner.finish_generation(id);

            match outcome {
                Some(Ok(reply)) => {
                    let reply = reply.replying_to(turn_id);
                    inner
                        .history
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(ChatMessage::new(ChatRole::Assistant, reply.text.clone()));
                    tracing::info!(turn = %reply.id, chars = reply.text.len(), "Reply finalized");
                    inner.emit(ConversationEvent::AssistantTurnFinalized(reply));
                }
                Some(Err(e)) => {
                    // The turn will never finalize; report it as stopped.
                    tracing::error!(error = %e, "Reply generation failed");
                    inner.emit(ConversationEvent::GenerationCancelled {
                        in_reply_to: Some(turn_id),
                    });
                }
                None if superseded => {
                    tracing::debug!(generation = id, "Reply superseded by a newer turn");
                }
                None => {
                    tracing::info!(generation = id, "Reply generation cancelled");
                    inner.emit(ConversationEvent::GenerationCancelled {
                        in_reply_to: Some(turn_id),
                    });
                }
            }
        });
    }
}

#[async_trait]
impl<B: HttpBackend + 'static> ConversationPort for ChatConversation<B> {
    async fn append_user_turn(&self, turn: UserTurn) -> Result<(), CollaboratorError> {
        if self.inner.events.is_closed() {
            return Err(CollaboratorError::Rejected(
                "conversation is closed".to_string(),
            ));
        }
        self.submit(&turn);
        Ok(())
    }
}
