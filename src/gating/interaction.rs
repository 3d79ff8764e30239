//! Single-prompt interaction arbiter
//!
//! Holds a lock flag and the identity of the currently displayed prompt.
//! Sending a new prompt locks, replaces any prior prompt (cancelling its
//! effect), sends, and unlocks. Resolution attempts are rejected outright
//! while locked; the lock is always released on a drop-guard path, so a
//! failing callback can never leave the arbiter wedged.

use crate::error::GateError;
use crate::gating::{Presenter, Prompt};
use crate::types::{ActionId, MessageId, PlayerId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// A typed "user clicked/selected" event, produced by the presentation layer
#[derive(Debug, Clone)]
pub struct InteractionEvent {
    pub message: MessageId,
    pub action_id: ActionId,
    pub user: PlayerId,
    /// Selected values for select-menu interactions
    pub values: Vec<String>,
}

/// Outcome of a resolution attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// At least one callback accepted the interaction
    Handled,
    /// The arbiter was locked by a concurrent attempt
    Rejected,
    /// Unknown action id, stale message, or a benign callback veto
    Ignored,
}

/// Callback registered against an action id. Implementations may be
/// immediate or genuinely asynchronous; benign refusals are signalled
/// through [`GateError`].
#[async_trait]
pub trait InteractionCallback: Send + Sync {
    async fn invoke(&self, event: &InteractionEvent) -> Result<(), GateError>;
}

/// Releases the lock flag when dropped, including on early returns
struct UnlockGuard<'a>(&'a AtomicBool);

impl Drop for UnlockGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

struct GateState {
    message: Option<MessageId>,
    callbacks: HashMap<ActionId, Vec<Arc<dyn InteractionCallback>>>,
}

/// The single-flight arbiter for one prompt slot
pub struct InteractionGate {
    presenter: Arc<dyn Presenter>,
    disable_after_use: bool,
    locked: AtomicBool,
    state: Mutex<GateState>,
}

impl InteractionGate {
    pub fn new(presenter: Arc<dyn Presenter>, disable_after_use: bool) -> Self {
        Self {
            presenter,
            disable_after_use,
            locked: AtomicBool::new(false),
            state: Mutex::new(GateState {
                message: None,
                callbacks: HashMap::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, GateState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Register a callback for an action id; callbacks run in registration
    /// order
    pub fn add_callback(&self, action_id: impl Into<ActionId>, callback: Arc<dyn InteractionCallback>) {
        self.state()
            .callbacks
            .entry(action_id.into())
            .or_default()
            .push(callback);
    }

    /// The message currently accepting interactions, if any
    pub fn message(&self) -> Option<MessageId> {
        self.state().message
    }

    /// Send a new prompt, atomically superseding any prior one.
    ///
    /// The arbiter is locked for the duration, so a resolution racing
    /// against the swap is rejected rather than hitting a half-replaced
    /// prompt.
    pub async fn send(&self, prompt: &Prompt) -> crate::error::Result<MessageId> {
        self.locked.store(true, Ordering::SeqCst);
        let _guard = UnlockGuard(&self.locked);

        let prior = self.state().message.take();
        if let Some(prior) = prior {
            // Prior prompt may already be gone; that is fine.
            let _ = self.presenter.clear_prompt(prior).await;
        }
        let message = self.presenter.send_prompt(prompt).await?;
        self.state().message = Some(message);
        Ok(message)
    }

    /// Attempt to resolve an interaction against the live prompt.
    ///
    /// Exactly one concurrent attempt can make it past the lock; everything
    /// else is `Rejected`. Unknown action ids, stale messages, and benign
    /// callback refusals are `Ignored`.
    pub async fn resolve(&self, event: &InteractionEvent) -> Resolution {
        if self
            .locked
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Resolution::Rejected;
        }
        let _guard = UnlockGuard(&self.locked);

        let callbacks = {
            let state = self.state();
            if state.message != Some(event.message) {
                return Resolution::Ignored;
            }
            match state.callbacks.get(&event.action_id) {
                None => return Resolution::Ignored,
                Some(list) => list.clone(),
            }
        };

        let mut handled = false;
        for callback in callbacks {
            match callback.invoke(event).await {
                Ok(()) => {
                    handled = true;
                    if self.disable_after_use {
                        self.clean().await;
                    }
                }
                Err(e) => {
                    debug!("interaction callback refused '{}': {}", event.action_id, e);
                    break;
                }
            }
        }
        if handled {
            Resolution::Handled
        } else {
            Resolution::Ignored
        }
    }

    /// Detach and visually clear the current prompt, if any. Idempotent.
    pub async fn clean(&self) {
        let message = self.state().message.take();
        if let Some(message) = message {
            let _ = self.presenter.clear_prompt(message).await;
        }
    }
}
