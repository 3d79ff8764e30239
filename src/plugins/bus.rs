//! Plugin registration and event broadcast
//!
//! The bus is built once per match. Plugin construction may fail with
//! [`MatchError::PluginDisabled`] (for example, missing credentials) without
//! aborting the other registrations. During a broadcast, plugins run in
//! registration order, and a failure in one plugin is logged and never
//! propagated to the match state machine or the remaining plugins.

use crate::error::Result;
use crate::plugins::event::{EventKind, MatchEvent};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{error, warn};

/// An independently-failing observer of match lifecycle events.
///
/// Plugins implement a subset of lifecycle events, declared through
/// [`MatchPlugin::subscriptions`]; the bus skips them for everything else.
/// A plugin wanting concurrent or long-running work must hand off to its own
/// task or process rather than block `handle`.
#[async_trait]
pub trait MatchPlugin: Send + Sync {
    /// Event kinds this plugin wants to receive
    fn subscriptions(&self) -> Vec<EventKind>;

    /// React to a single lifecycle event. Errors are logged and isolated.
    fn handle(&mut self, event: &MatchEvent) -> Result<()>;

    /// Asynchronous teardown, awaited when the match ends
    async fn async_clean(&mut self) -> Result<()> {
        Ok(())
    }
}

struct PluginEntry {
    name: String,
    plugin: Box<dyn MatchPlugin>,
}

/// Dispatches lifecycle events to the active plugin set
pub struct PluginBus {
    plugins: Vec<PluginEntry>,
    /// Dispatch table from event kind to subscriber indices, rebuilt on
    /// every registration change
    dispatch: HashMap<EventKind, Vec<usize>>,
}

impl PluginBus {
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
            dispatch: HashMap::new(),
        }
    }

    /// Register a plugin construction result.
    ///
    /// A construction error marks the plugin disabled: a warning is recorded
    /// and the remaining registrations proceed.
    pub fn register(&mut self, name: &str, plugin: Result<Box<dyn MatchPlugin>>) {
        match plugin {
            Ok(plugin) => {
                self.plugins.push(PluginEntry {
                    name: name.to_string(),
                    plugin,
                });
                self.rebuild_dispatch();
            }
            Err(e) => {
                warn!("Could not start plugin '{}': {}", name, e);
            }
        }
    }

    fn rebuild_dispatch(&mut self) {
        self.dispatch.clear();
        for (idx, entry) in self.plugins.iter().enumerate() {
            for kind in entry.plugin.subscriptions() {
                self.dispatch.entry(kind).or_default().push(idx);
            }
        }
    }

    /// Names of the active plugins, in registration order
    pub fn active(&self) -> Vec<&str> {
        self.plugins.iter().map(|e| e.name.as_str()).collect()
    }

    /// Invoke every subscribed plugin for `event`, in registration order.
    ///
    /// Plugin failures are logged with the plugin's name and the event, and
    /// never stop dispatch to the remaining plugins.
    pub fn broadcast(&mut self, event: &MatchEvent) {
        let kind = event.kind();
        let Some(subscribers) = self.dispatch.get(&kind) else {
            return;
        };
        for &idx in subscribers.clone().iter() {
            let entry = &mut self.plugins[idx];
            if let Err(e) = entry.plugin.handle(event) {
                error!(
                    "Error occurred in plugin '{}' during '{}': {}",
                    entry.name, kind, e
                );
            }
        }
    }

    /// Await every plugin's teardown, isolating failures per plugin
    pub async fn async_clean(&mut self) {
        for entry in self.plugins.iter_mut() {
            if let Err(e) = entry.plugin.async_clean().await {
                error!("Error occurred when clearing plugin '{}': {}", entry.name, e);
            }
        }
    }
}

impl Default for PluginBus {
    fn default() -> Self {
        Self::new()
    }
}
