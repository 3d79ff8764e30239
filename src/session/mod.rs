//! Match session orchestration
//!
//! [`MatchInstance`] is the pure state machine; [`MatchSession`] pairs it
//! with a [`PluginBus`] so that every completed transition is broadcast to
//! the plugins after the state mutation is fully applied. Events are
//! fire-and-forget relative to the state machine: a session operation never
//! waits on plugin completion.

pub mod instance;
pub mod stage;

pub use instance::{MatchConfig, MatchInstance, MatchSnapshot};
pub use stage::MatchStage;

use crate::error::Result;
use crate::plugins::bus::PluginBus;
use crate::plugins::event::MatchEvent;
use crate::types::{BaseId, Faction, Player, RoundScores, TeamId};
use tracing::info;

/// A live match: state machine plus its plugin bus
pub struct MatchSession {
    instance: MatchInstance,
    bus: PluginBus,
}

impl MatchSession {
    pub fn new(instance: MatchInstance, bus: PluginBus) -> Self {
        Self { instance, bus }
    }

    pub fn instance(&self) -> &MatchInstance {
        &self.instance
    }

    pub fn stage(&self) -> MatchStage {
        self.instance.stage()
    }

    /// Apply one state-machine operation, then broadcast whatever it emitted.
    /// Mutation is complete before the first plugin sees an event, so
    /// observers never see a state between two stages.
    fn apply<F>(&mut self, op: F) -> Result<MatchStage>
    where
        F: FnOnce(&mut MatchInstance) -> std::result::Result<Vec<MatchEvent>, crate::MatchError>,
    {
        let events = op(&mut self.instance)?;
        for event in &events {
            self.bus.broadcast(event);
        }
        Ok(self.instance.stage())
    }

    pub fn launch(&mut self) -> Result<MatchStage> {
        info!("Launching match {}", self.instance.id());
        self.apply(|m| m.launch())
    }

    pub fn open_captain_pick(&mut self) -> Result<MatchStage> {
        self.apply(|m| m.open_captain_pick())
    }

    pub fn select_captains(
        &mut self,
        captain_1: &str,
        captain_2: &str,
        first_pick: TeamId,
    ) -> Result<MatchStage> {
        self.apply(|m| m.select_captains(captain_1, captain_2, first_pick))
    }

    pub fn pick_team_member(&mut self, captain: &str, player: &str) -> Result<MatchStage> {
        self.apply(|m| m.pick_team_member(captain, player))
    }

    pub fn pick_faction(&mut self, team: TeamId, faction: Faction) -> Result<MatchStage> {
        self.apply(|m| m.pick_faction(team, faction))
    }

    pub fn select_base(&mut self, base: BaseId) -> Result<MatchStage> {
        self.apply(|m| m.select_base(base))
    }

    pub fn set_team_ready(&mut self, team: TeamId) -> Result<MatchStage> {
        self.apply(|m| m.set_team_ready(team))
    }

    pub fn start_round(&mut self) -> Result<MatchStage> {
        self.apply(|m| m.start_round())
    }

    pub fn end_round(&mut self, scores: RoundScores) -> Result<MatchStage> {
        self.apply(|m| m.end_round(scores))
    }

    pub fn substitute(&mut self, old: &str, new_player: Player) -> Result<MatchStage> {
        self.apply(|m| m.substitute(old, new_player))
    }

    /// Cancel the match and await every plugin's teardown
    pub async fn cancel(&mut self) -> Result<()> {
        self.instance.cancel()?;
        info!("Match {} cancelled", self.instance.id());
        self.bus.async_clean().await;
        Ok(())
    }

    /// Await plugin teardown after the match closed normally
    pub async fn close(&mut self) {
        self.bus.async_clean().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::bus::MatchPlugin;
    use crate::plugins::event::EventKind;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct Recorder {
        events: Arc<Mutex<Vec<EventKind>>>,
    }

    #[async_trait]
    impl MatchPlugin for Recorder {
        fn subscriptions(&self) -> Vec<EventKind> {
            EventKind::ALL.to_vec()
        }

        fn handle(&mut self, event: &MatchEvent) -> Result<()> {
            self.events.lock().unwrap().push(event.kind());
            Ok(())
        }
    }

    fn session_with_recorder(pool_size: usize) -> (MatchSession, Arc<Mutex<Vec<EventKind>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let pool = (1..=pool_size)
            .map(|i| Player::new(format!("p{}", i), format!("Player {}", i)))
            .collect();
        let instance = MatchInstance::new(pool, MatchConfig::default());
        let mut bus = PluginBus::new();
        bus.register(
            "recorder",
            Ok(Box::new(Recorder {
                events: events.clone(),
            }) as Box<dyn MatchPlugin>),
        );
        (MatchSession::new(instance, bus), events)
    }

    #[tokio::test]
    async fn test_events_broadcast_in_stage_order() {
        let (mut session, events) = session_with_recorder(4);
        session.launch().unwrap();
        session.open_captain_pick().unwrap();
        session
            .select_captains("p1", "p2", TeamId::One)
            .unwrap();
        session.pick_team_member("p1", "p3").unwrap();
        session.pick_faction(TeamId::One, Faction::NC).unwrap();
        session.pick_faction(TeamId::Two, Faction::TR).unwrap();
        session.select_base("chac".to_string()).unwrap();
        session.set_team_ready(TeamId::One).unwrap();
        session.set_team_ready(TeamId::Two).unwrap();

        let seen = events.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                EventKind::MatchLaunching,
                EventKind::CaptainsSelected,
                EventKind::TeamsDone,
                EventKind::FactionPick,
                EventKind::FactionPick,
                EventKind::FactionsPicked,
                EventKind::BaseSelected,
                EventKind::TeamReady,
                EventKind::TeamReady,
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_operation_broadcasts_nothing() {
        let (mut session, events) = session_with_recorder(4);
        assert!(session.end_round(RoundScores::default()).is_err());
        assert!(events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_is_terminal() {
        let (mut session, _events) = session_with_recorder(4);
        session.launch().unwrap();
        session.cancel().await.unwrap();
        assert_eq!(session.stage(), MatchStage::Cancelled);
        assert!(session.launch().is_err());
    }
}
