//! Event logger plugin
//!
//! Records every lifecycle event through the tracing stack. Cheap enough to
//! stay enabled even when every other plugin is disabled.

use crate::error::Result;
use crate::plugins::bus::MatchPlugin;
use crate::plugins::event::{EventKind, MatchEvent};
use async_trait::async_trait;
use tracing::info;

pub struct EventLogger;

impl EventLogger {
    pub fn create() -> Result<Box<dyn MatchPlugin>> {
        Ok(Box::new(EventLogger))
    }
}

#[async_trait]
impl MatchPlugin for EventLogger {
    fn subscriptions(&self) -> Vec<EventKind> {
        EventKind::ALL.to_vec()
    }

    fn handle(&mut self, event: &MatchEvent) -> Result<()> {
        match event {
            MatchEvent::FactionPick { team, faction } => {
                info!("[{}] {} picked {}", event.kind(), team, faction);
            }
            MatchEvent::BaseSelected { base } => {
                info!("[{}] base '{}' selected", event.kind(), base);
            }
            MatchEvent::TeamReady { team } => {
                info!("[{}] {} is ready", event.kind(), team);
            }
            MatchEvent::RoundOver {
                round_no,
                switch_sides,
            } => {
                info!(
                    "[{}] round {} finished (switch sides: {})",
                    event.kind(),
                    round_no,
                    switch_sides
                );
            }
            MatchEvent::PlayerSub { old, new } => {
                info!("[{}] '{}' substituted by '{}'", event.kind(), old, new);
            }
            other => {
                info!("[{}]", other.kind());
            }
        }
        Ok(())
    }
}
