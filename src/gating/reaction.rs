//! Per-message reaction tables
//!
//! The legacy emoji-reaction prompt path: a registry maps message identity
//! to a handler; a handler owns ordered callback lists per emoji. The
//! registry is an explicit context object owned by the application, with its
//! lifetime tied to the match, not a process-global table.

use crate::error::GateError;
use crate::gating::Presenter;
use crate::types::{MessageId, PlayerId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// A typed "user reacted" event, produced by the presentation layer
#[derive(Debug, Clone)]
pub struct ReactionEvent {
    pub message: MessageId,
    pub emoji: String,
    pub user: PlayerId,
}

/// Callback registered against an emoji. `LackingPermission` aborts the
/// emoji's callback chain without surfacing to the caller.
#[async_trait]
pub trait ReactionCallback: Send + Sync {
    async fn invoke(&self, event: &ReactionEvent) -> Result<(), GateError>;
}

/// Ordered emoji → callback-list table for one prompt message
#[derive(Clone)]
pub struct ReactionHandler {
    /// Insertion-ordered so reactions are added to messages in setup order
    entries: Vec<(String, Vec<Arc<dyn ReactionCallback>>)>,
    rem_user_react: bool,
    rem_bot_react: bool,
}

impl ReactionHandler {
    pub fn new(rem_user_react: bool, rem_bot_react: bool) -> Self {
        Self {
            entries: Vec::new(),
            rem_user_react,
            rem_bot_react,
        }
    }

    pub fn rem_user_react(&self) -> bool {
        self.rem_user_react
    }

    pub fn rem_bot_react(&self) -> bool {
        self.rem_bot_react
    }

    /// Append one callback to an emoji's chain, creating the entry if needed
    pub fn add_reaction(&mut self, emoji: &str, callback: Arc<dyn ReactionCallback>) {
        if let Some((_, list)) = self.entries.iter_mut().find(|(e, _)| e == emoji) {
            list.push(callback);
        } else {
            self.entries.push((emoji.to_string(), vec![callback]));
        }
    }

    /// Replace an emoji's entire chain
    pub fn set_reaction(&mut self, emoji: &str, callbacks: Vec<Arc<dyn ReactionCallback>>) {
        self.rem_reaction(emoji);
        self.entries.push((emoji.to_string(), callbacks));
    }

    pub fn rem_reaction(&mut self, emoji: &str) {
        self.entries.retain(|(e, _)| e != emoji);
    }

    pub fn is_reaction(&self, emoji: &str) -> bool {
        self.entries.iter().any(|(e, _)| e == emoji)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Emojis in registration order
    pub fn emojis(&self) -> Vec<String> {
        self.entries.iter().map(|(e, _)| e.clone()).collect()
    }

    fn callbacks_for(&self, emoji: &str) -> Option<Vec<Arc<dyn ReactionCallback>>> {
        self.entries
            .iter()
            .find(|(e, _)| e == emoji)
            .map(|(_, list)| list.clone())
    }
}

/// Registry from live message identity to its reaction handler
pub struct ReactionRegistry {
    presenter: Arc<dyn Presenter>,
    handlers: Mutex<HashMap<MessageId, ReactionHandler>>,
}

impl ReactionRegistry {
    pub fn new(presenter: Arc<dyn Presenter>) -> Self {
        Self {
            presenter,
            handlers: Mutex::new(HashMap::new()),
        }
    }

    pub fn presenter(&self) -> &Arc<dyn Presenter> {
        &self.presenter
    }

    pub async fn add_handler(&self, message: MessageId, handler: ReactionHandler) {
        self.handlers.lock().await.insert(message, handler);
    }

    /// Deregistering an unknown message is a no-op
    pub async fn rem_handler(&self, message: MessageId) {
        self.handlers.lock().await.remove(&message);
    }

    pub async fn has_handler(&self, message: MessageId) -> bool {
        self.handlers.lock().await.contains_key(&message)
    }

    /// Route an incoming reaction. No handler for the message means the
    /// reaction is simply ignored; messages may outlive their handler.
    ///
    /// On a fully successful callback chain with `rem_bot_react`, the
    /// emoji's entry is retired and the bot-side reaction stripped; an
    /// exhausted handler is deregistered entirely. The user-side reaction is
    /// stripped regardless of outcome when `rem_user_react` is set.
    pub async fn process(&self, event: &ReactionEvent) {
        let (callbacks, rem_user, rem_bot) = {
            let handlers = self.handlers.lock().await;
            let Some(handler) = handlers.get(&event.message) else {
                return;
            };
            (
                handler.callbacks_for(&event.emoji),
                handler.rem_user_react,
                handler.rem_bot_react,
            )
        };

        let mut success = false;
        if let Some(callbacks) = callbacks {
            success = true;
            for callback in callbacks {
                if let Err(e) = callback.invoke(event).await {
                    debug!("reaction callback aborted '{}': {}", event.emoji, e);
                    success = false;
                    break;
                }
            }
        }

        if success && rem_bot {
            {
                let mut handlers = self.handlers.lock().await;
                if let Some(handler) = handlers.get_mut(&event.message) {
                    handler.rem_reaction(&event.emoji);
                    if handler.is_empty() {
                        handlers.remove(&event.message);
                    }
                }
            }
            let _ = self
                .presenter
                .remove_bot_reaction(event.message, &event.emoji)
                .await;
        }
        if rem_user {
            let _ = self
                .presenter
                .remove_user_reaction(event.message, &event.emoji, &event.user)
                .await;
        }
    }
}

/// Restricts a reaction handler to a single live message: attaching to a new
/// message first tears down the previous one, so only one message is ever
/// actionable through this handler.
pub struct SingleMessageHandler {
    registry: Arc<ReactionRegistry>,
    handler: ReactionHandler,
    message: Option<MessageId>,
    remove_msg: bool,
}

impl SingleMessageHandler {
    pub fn new(registry: Arc<ReactionRegistry>, handler: ReactionHandler, remove_msg: bool) -> Self {
        Self {
            registry,
            handler,
            message: None,
            remove_msg,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.message.is_some()
    }

    pub fn message(&self) -> Option<MessageId> {
        self.message
    }

    /// Attach to a new message, tearing down the previous one first, and
    /// seed the message with the handler's reactions in registration order.
    pub async fn attach(&mut self, message: MessageId) {
        self.destroy().await;
        self.message = Some(message);
        self.registry
            .add_handler(message, self.handler.clone())
            .await;
        let presenter = self.registry.presenter();
        for emoji in self.handler.emojis() {
            let _ = presenter.add_bot_reaction(message, &emoji).await;
        }
    }

    /// Deregister and visually retire the current message, if any
    pub async fn destroy(&mut self) {
        let Some(message) = self.message.take() else {
            return;
        };
        self.registry.rem_handler(message).await;
        let presenter = self.registry.presenter();
        if self.remove_msg {
            let _ = presenter.delete_message(message).await;
        } else {
            let _ = presenter.clear_reactions(message).await;
        }
    }
}
