//! Input gating
//!
//! Arbitration of concurrent user interactions against live prompts. Two
//! mechanisms share one invariant: at most one acceptance per outstanding
//! prompt, even under racing triggers.
//!
//! The presentation layer is an external collaborator behind the
//! [`Presenter`] trait; it renders prompts and translates raw platform
//! events into the typed [`interaction::InteractionEvent`] /
//! [`reaction::ReactionEvent`] values this layer consumes.

pub mod interaction;
pub mod reaction;

pub use interaction::{InteractionCallback, InteractionEvent, InteractionGate, Resolution};
pub use reaction::{ReactionCallback, ReactionEvent, ReactionHandler, ReactionRegistry, SingleMessageHandler};

use crate::error::GateError;
use crate::types::{ActionId, MessageId};
use async_trait::async_trait;

/// A prompt to render: free text plus selectable options
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub content: String,
    pub options: Vec<PromptOption>,
}

/// One button/select entry inside a prompt
#[derive(Debug, Clone, PartialEq)]
pub struct PromptOption {
    pub action_id: ActionId,
    pub label: String,
}

/// Presentation collaborator: renders prompts and manipulates messages.
///
/// Failures surface as [`GateError`] values; the gating layer treats
/// `NotFound` as benign (messages may legitimately outlive their handler).
#[async_trait]
pub trait Presenter: Send + Sync {
    async fn send_prompt(&self, prompt: &Prompt) -> Result<MessageId, GateError>;

    /// Strip the interactive components from a message, leaving its content
    async fn clear_prompt(&self, message: MessageId) -> Result<(), GateError>;

    async fn delete_message(&self, message: MessageId) -> Result<(), GateError>;

    async fn add_bot_reaction(&self, message: MessageId, emoji: &str) -> Result<(), GateError>;

    async fn remove_bot_reaction(&self, message: MessageId, emoji: &str) -> Result<(), GateError>;

    async fn remove_user_reaction(
        &self,
        message: MessageId,
        emoji: &str,
        user: &str,
    ) -> Result<(), GateError>;

    async fn clear_reactions(&self, message: MessageId) -> Result<(), GateError>;
}
