//! Match lifecycle stages

use serde::{Deserialize, Serialize};

/// Possible stages of a match session, in lifecycle order.
///
/// A match only ever moves forward through this order, or jumps to
/// `Cancelled` through an administrative cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MatchStage {
    /// Match object exists but has not launched
    Idle,
    /// Players are assembling from the lobby
    Launching,
    /// Captains are being chosen
    CaptainPick,
    /// Captains alternate drafting players from the pool
    TeamPick,
    /// Teams lock their factions
    FactionPick,
    /// A base/map is being selected
    BasePick,
    /// Base is locked; teams are readying up
    TeamsReady,
    /// A round is in progress
    RoundActive,
    /// Between rounds (or after the final round, before closure)
    RoundOver,
    /// Terminal: match completed
    MatchOver,
    /// Terminal: match administratively cancelled
    Cancelled,
}

impl MatchStage {
    /// Terminal stages reject every further mutation
    pub fn is_terminal(self) -> bool {
        matches!(self, MatchStage::MatchOver | MatchStage::Cancelled)
    }

    /// Active stages allow substitution
    pub fn is_active(self) -> bool {
        !self.is_terminal() && self != MatchStage::Idle
    }
}

impl std::fmt::Display for MatchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MatchStage::Idle => "IDLE",
            MatchStage::Launching => "LAUNCHING",
            MatchStage::CaptainPick => "CAPTAIN_PICK",
            MatchStage::TeamPick => "TEAM_PICK",
            MatchStage::FactionPick => "FACTION_PICK",
            MatchStage::BasePick => "BASE_PICK",
            MatchStage::TeamsReady => "TEAMS_READY",
            MatchStage::RoundActive => "ROUND_ACTIVE",
            MatchStage::RoundOver => "ROUND_OVER",
            MatchStage::MatchOver => "MATCH_OVER",
            MatchStage::Cancelled => "CANCELLED",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_ordering() {
        assert!(MatchStage::Idle < MatchStage::Launching);
        assert!(MatchStage::Launching < MatchStage::CaptainPick);
        assert!(MatchStage::TeamsReady < MatchStage::RoundActive);
        assert!(MatchStage::RoundOver < MatchStage::MatchOver);
    }

    #[test]
    fn test_terminal_stages() {
        assert!(MatchStage::MatchOver.is_terminal());
        assert!(MatchStage::Cancelled.is_terminal());
        assert!(!MatchStage::RoundActive.is_terminal());
        assert!(!MatchStage::Idle.is_terminal());
    }

    #[test]
    fn test_active_stages() {
        assert!(!MatchStage::Idle.is_active());
        assert!(MatchStage::Launching.is_active());
        assert!(MatchStage::RoundOver.is_active());
        assert!(!MatchStage::Cancelled.is_active());
    }
}
