//! Integration tests for the ready-room orchestration core
//!
//! These tests validate the system working together, including:
//! - The complete negotiation flow from lobby signup to match over
//! - Plugin broadcast ordering and failure isolation across a full match
//! - Restart persistence of lobby and match state

use ready_room::lobby::LobbyQueue;
use ready_room::plugins::{EventKind, MatchEvent, MatchPlugin, PluginBus};
use ready_room::session::{MatchConfig, MatchInstance, MatchSession};
use ready_room::storage::{MemoryStore, RecordStore};
use ready_room::types::{Faction, Player, RoundScores, TeamId};
use ready_room::{MatchError, MatchStage, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Records every event kind it receives, in order
struct RecordingPlugin {
    seen: Arc<Mutex<Vec<EventKind>>>,
    fail: bool,
    cleaned: Arc<Mutex<bool>>,
}

impl RecordingPlugin {
    fn create(
        fail: bool,
    ) -> (
        Result<Box<dyn MatchPlugin>>,
        Arc<Mutex<Vec<EventKind>>>,
        Arc<Mutex<bool>>,
    ) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let cleaned = Arc::new(Mutex::new(false));
        let plugin = Box::new(RecordingPlugin {
            seen: seen.clone(),
            fail,
            cleaned: cleaned.clone(),
        }) as Box<dyn MatchPlugin>;
        (Ok(plugin), seen, cleaned)
    }
}

#[async_trait]
impl MatchPlugin for RecordingPlugin {
    fn subscriptions(&self) -> Vec<EventKind> {
        EventKind::ALL.to_vec()
    }

    fn handle(&mut self, event: &MatchEvent) -> Result<()> {
        self.seen.lock().unwrap().push(event.kind());
        if self.fail {
            anyhow::bail!("induced plugin failure");
        }
        Ok(())
    }

    async fn async_clean(&mut self) -> Result<()> {
        *self.cleaned.lock().unwrap() = true;
        Ok(())
    }
}

fn signup(id: &str) -> Player {
    Player::new(id.to_string(), format!("Player {}", id))
}

/// Fill a lobby, drain it into a session, and drive the negotiation to
/// TEAMS_READY with both teams ready.
async fn negotiated_session(bus: PluginBus) -> MatchSession {
    let store = Arc::new(MemoryStore::new());
    let mut lobby = LobbyQueue::new(store, 6);
    for id in ["p1", "p2", "p3", "p4", "p5", "p6"] {
        lobby.join(signup(id)).await.unwrap();
    }
    assert!(lobby.is_full());

    let pool = lobby.drain_for_match().await.unwrap();
    let instance = MatchInstance::new(pool, MatchConfig::default());
    let mut session = MatchSession::new(instance, bus);

    session.launch().unwrap();
    session.open_captain_pick().unwrap();
    session
        .select_captains("p1", "p2", TeamId::One)
        .unwrap();
    session.pick_team_member("p1", "p3").unwrap();
    session.pick_team_member("p2", "p4").unwrap();
    // p5 drafted, p6 auto-assigned: draft complete
    session.pick_team_member("p1", "p5").unwrap();
    session.pick_faction(TeamId::One, Faction::NC).unwrap();
    session.pick_faction(TeamId::Two, Faction::TR).unwrap();
    session.select_base("chac".to_string()).unwrap();
    session.set_team_ready(TeamId::One).unwrap();
    session.set_team_ready(TeamId::Two).unwrap();
    session
}

#[tokio::test]
async fn test_full_match_workflow_with_plugins() {
    let (plugin, seen, cleaned) = RecordingPlugin::create(false);
    let mut bus = PluginBus::new();
    bus.register("recorder", plugin);

    let mut session = negotiated_session(bus).await;
    assert_eq!(session.stage(), MatchStage::TeamsReady);

    // Two-round match: round 1 ends with a side switch, round 2 without,
    // and one further end closes the match.
    session.start_round().unwrap();
    session.end_round(RoundScores::new(120, 95)).unwrap();
    session.start_round().unwrap();
    session.end_round(RoundScores::new(80, 110)).unwrap();
    session.end_round(RoundScores::default()).unwrap();
    assert_eq!(session.stage(), MatchStage::MatchOver);
    session.close().await;

    let seen = seen.lock().unwrap();
    assert_eq!(
        seen.as_slice(),
        [
            EventKind::MatchLaunching,
            EventKind::CaptainsSelected,
            EventKind::TeamsDone,
            EventKind::FactionPick,
            EventKind::FactionPick,
            EventKind::FactionsPicked,
            EventKind::BaseSelected,
            EventKind::TeamReady,
            EventKind::TeamReady,
            EventKind::MatchStarting,
            EventKind::RoundOver,
            EventKind::MatchStarting,
            EventKind::RoundOver,
            EventKind::MatchOver,
        ]
    );
    assert!(*cleaned.lock().unwrap());
}

#[tokio::test]
async fn test_round_over_event_carries_switch_sides() {
    let mut bus = PluginBus::new();
    let (plugin, seen, _) = RecordingPlugin::create(false);
    bus.register("recorder", plugin);

    let mut session = negotiated_session(bus).await;
    session.start_round().unwrap();
    session.end_round(RoundScores::new(10, 20)).unwrap();

    // Direct inspection of the instance confirms the round bookkeeping
    assert_eq!(session.instance().round_no(), 1);
    assert_eq!(session.instance().team(TeamId::One).score(), 10);
    assert_eq!(session.instance().team(TeamId::Two).score(), 20);
    assert_eq!(
        *seen.lock().unwrap().last().unwrap(),
        EventKind::RoundOver
    );
}

#[tokio::test]
async fn test_failing_plugin_never_blocks_the_match() {
    let mut bus = PluginBus::new();
    let (boom, boom_seen, _) = RecordingPlugin::create(true);
    let (tail, tail_seen, _) = RecordingPlugin::create(false);
    bus.register("boom", boom);
    bus.register("tail", tail);

    let mut session = negotiated_session(bus).await;
    session.start_round().unwrap();
    session.end_round(RoundScores::new(1, 2)).unwrap();

    // Both plugins observed everything despite the first failing every call
    let boom_seen = boom_seen.lock().unwrap();
    let tail_seen = tail_seen.lock().unwrap();
    assert_eq!(boom_seen.as_slice(), tail_seen.as_slice());
    assert_eq!(session.stage(), MatchStage::RoundOver);
}

#[tokio::test]
async fn test_failed_operation_broadcasts_nothing() {
    let mut bus = PluginBus::new();
    let (plugin, seen, _) = RecordingPlugin::create(false);
    bus.register("recorder", plugin);

    let mut session = negotiated_session(bus).await;
    let before = seen.lock().unwrap().len();

    // end_round is illegal in TEAMS_READY
    let err = session.end_round(RoundScores::new(5, 5)).unwrap_err();
    let err = err.downcast::<MatchError>().unwrap();
    assert!(matches!(err, MatchError::IllegalTransition { .. }));
    assert_eq!(seen.lock().unwrap().len(), before);
}

#[tokio::test]
async fn test_cancel_tears_down_plugins() {
    let mut bus = PluginBus::new();
    let (plugin, _, cleaned) = RecordingPlugin::create(false);
    bus.register("recorder", plugin);

    let mut session = negotiated_session(bus).await;
    session.cancel().await.unwrap();
    assert_eq!(session.stage(), MatchStage::Cancelled);
    assert!(*cleaned.lock().unwrap());

    // A cancelled match rejects further operations
    assert!(session.start_round().is_err());
}

#[tokio::test]
async fn test_substitution_mid_negotiation() {
    let mut session = negotiated_session(PluginBus::new()).await;
    session
        .substitute("p4", signup("p7"))
        .unwrap();

    let team_2 = session.instance().team(TeamId::Two);
    assert!(team_2.contains("p7"));
    assert!(!team_2.contains("p4"));
    assert_eq!(team_2.captain().unwrap().id, "p2");
}

#[tokio::test]
async fn test_match_snapshot_survives_restart() {
    let store = Arc::new(MemoryStore::new());
    let mut session = negotiated_session(PluginBus::new()).await;
    session.start_round().unwrap();
    session.end_round(RoundScores::new(55, 60)).unwrap();

    let snapshot = session.instance().snapshot();
    store
        .set(
            "restart_data",
            "match",
            serde_json::to_value(&snapshot).unwrap(),
        )
        .await
        .unwrap();

    // Simulated restart: read the record back and rebuild the match
    let value = store.get("restart_data", "match").await.unwrap().unwrap();
    let restored_snapshot = serde_json::from_value(value).unwrap();
    let restored = MatchInstance::from_snapshot(&restored_snapshot, MatchConfig::default());

    assert_eq!(restored.stage(), MatchStage::RoundOver);
    assert_eq!(restored.round_no(), 1);
    assert_eq!(restored.base().map(String::as_str), Some("chac"));
    assert_eq!(restored.team(TeamId::One).faction(), Some(Faction::NC));
    assert_eq!(restored.team(TeamId::Two).score(), 60);
}

#[tokio::test]
async fn test_lobby_restart_preserves_signups() {
    let store = Arc::new(MemoryStore::new());
    {
        let mut lobby = LobbyQueue::new(store.clone(), 6);
        lobby.join(signup("p1")).await.unwrap();
        lobby.join(signup("p2")).await.unwrap();
        lobby.join(signup("p3")).await.unwrap();
        lobby.leave("p2").await.unwrap();
    }

    let mut lobby = LobbyQueue::new(store, 6);
    assert_eq!(lobby.restore().await.unwrap(), 2);
    let ids: Vec<&str> = lobby.players().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["p1", "p3"]);
}
