//! Match lifecycle events
//!
//! Events carry the data observers need, so plugins never reach back into
//! live match state during dispatch.

use crate::types::{BaseId, Faction, PlayerId, TeamId};

/// A lifecycle event emitted by the match state machine
#[derive(Debug, Clone, PartialEq)]
pub enum MatchEvent {
    /// The match left IDLE and is assembling
    MatchLaunching,
    /// Both captains are set; the team draft begins
    CaptainsSelected,
    /// Both rosters are fielded; faction pick begins
    TeamsDone,
    /// One team locked a faction (fires per pick, before both are in)
    FactionPick { team: TeamId, faction: Faction },
    /// Both factions are in; base pick begins. `base` is carried so
    /// observers can tell whether a base was already locked earlier.
    FactionsPicked { base: Option<BaseId> },
    /// A base was selected for the match
    BaseSelected { base: BaseId },
    /// One team readied up (fires per team)
    TeamReady { team: TeamId },
    /// A round is about to begin
    MatchStarting,
    /// A round finished; `switch_sides` is set for every round except the last
    RoundOver { round_no: u32, switch_sides: bool },
    /// The match reached its terminal stage
    MatchOver,
    /// A roster slot was substituted in place
    PlayerSub { old: PlayerId, new: PlayerId },
}

impl MatchEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            MatchEvent::MatchLaunching => EventKind::MatchLaunching,
            MatchEvent::CaptainsSelected => EventKind::CaptainsSelected,
            MatchEvent::TeamsDone => EventKind::TeamsDone,
            MatchEvent::FactionPick { .. } => EventKind::FactionPick,
            MatchEvent::FactionsPicked { .. } => EventKind::FactionsPicked,
            MatchEvent::BaseSelected { .. } => EventKind::BaseSelected,
            MatchEvent::TeamReady { .. } => EventKind::TeamReady,
            MatchEvent::MatchStarting => EventKind::MatchStarting,
            MatchEvent::RoundOver { .. } => EventKind::RoundOver,
            MatchEvent::MatchOver => EventKind::MatchOver,
            MatchEvent::PlayerSub { .. } => EventKind::PlayerSub,
        }
    }
}

/// Discriminant used for the bus dispatch table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MatchLaunching,
    CaptainsSelected,
    TeamsDone,
    FactionPick,
    FactionsPicked,
    BaseSelected,
    TeamReady,
    MatchStarting,
    RoundOver,
    MatchOver,
    PlayerSub,
}

impl EventKind {
    /// Every lifecycle event kind, in lifecycle order
    pub const ALL: [EventKind; 11] = [
        EventKind::MatchLaunching,
        EventKind::CaptainsSelected,
        EventKind::TeamsDone,
        EventKind::FactionPick,
        EventKind::FactionsPicked,
        EventKind::BaseSelected,
        EventKind::TeamReady,
        EventKind::MatchStarting,
        EventKind::RoundOver,
        EventKind::MatchOver,
        EventKind::PlayerSub,
    ];
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EventKind::MatchLaunching => "match_launching",
            EventKind::CaptainsSelected => "captains_selected",
            EventKind::TeamsDone => "teams_done",
            EventKind::FactionPick => "faction_pick",
            EventKind::FactionsPicked => "factions_picked",
            EventKind::BaseSelected => "base_selected",
            EventKind::TeamReady => "team_ready",
            EventKind::MatchStarting => "match_starting",
            EventKind::RoundOver => "round_over",
            EventKind::MatchOver => "match_over",
            EventKind::PlayerSub => "player_sub",
        };
        write!(f, "{}", name)
    }
}
