//! Conversation collaborator port.
//!
//! The voice pipeline produces tagged user turns into the conversation and
//! consumes its lifecycle as a stream of
//! [`ConversationEvent`](crate::domain::ConversationEvent)s, delivered by
//! whoever owns the conversation (UI, chat adapter) over a channel.

use async_trait::async_trait;

use super::CollaboratorError;
use crate::domain::UserTurn;

/// The conversation the voice pipeline appends to.
#[async_trait]
pub trait ConversationPort: Send + Sync {
    /// Append a user turn. Generation of the assistant reply is the
    /// conversation's business; its outcome arrives as events.
    async fn append_user_turn(&self, turn: UserTurn) -> Result<(), CollaboratorError>;
}
