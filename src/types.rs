//! Common types used throughout the match orchestration service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for players
pub type PlayerId = String;

/// Unique identifier for matches
pub type MatchId = Uuid;

/// Identity of a rendered chat message, as handed over by the presentation layer
pub type MessageId = u64;

/// Short identifier for a base/map ("chac", "xeno", ...)
pub type BaseId = String;

/// Symbolic id of a button or select option inside a prompt
pub type ActionId = String;

/// One of the two sides of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamId {
    One,
    Two,
}

impl TeamId {
    /// Roster array index (0-based)
    pub fn index(self) -> usize {
        match self {
            TeamId::One => 0,
            TeamId::Two => 1,
        }
    }

    /// Display/sound-cue number (1-based)
    pub fn number(self) -> u8 {
        match self {
            TeamId::One => 1,
            TeamId::Two => 2,
        }
    }

    /// The opposing side
    pub fn other(self) -> TeamId {
        match self {
            TeamId::One => TeamId::Two,
            TeamId::Two => TeamId::One,
        }
    }
}

impl std::fmt::Display for TeamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "team {}", self.number())
    }
}

/// In-game faction; 0 is reserved for "unassigned" in snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    VS,
    NC,
    TR,
}

impl Faction {
    /// Stable numeric id used in persisted snapshots
    pub fn id(self) -> u8 {
        match self {
            Faction::VS => 1,
            Faction::NC => 2,
            Faction::TR => 3,
        }
    }

    /// Reverse of [`Faction::id`]; 0 maps to `None` (unassigned)
    pub fn from_id(id: u8) -> Option<Faction> {
        match id {
            1 => Some(Faction::VS),
            2 => Some(Faction::NC),
            3 => Some(Faction::TR),
            _ => None,
        }
    }

    /// Lowercase tag used in sound-cue file keys
    pub fn tag(self) -> &'static str {
        match self {
            Faction::VS => "vs",
            Faction::NC => "nc",
            Faction::TR => "tr",
        }
    }
}

impl std::fmt::Display for Faction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Faction::VS => write!(f, "VS"),
            Faction::NC => write!(f, "NC"),
            Faction::TR => write!(f, "TR"),
        }
    }
}

/// A player known to the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub joined_at: DateTime<Utc>,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            joined_at: Utc::now(),
        }
    }

    /// Rehydrated players carry only their id until the roster service fills
    /// in a display name.
    pub fn from_id(id: impl Into<PlayerId>) -> Self {
        let id = id.into();
        let name = id.clone();
        Self {
            id,
            name,
            joined_at: Utc::now(),
        }
    }
}

/// Points scored by each side during a single round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundScores {
    pub team_1: u32,
    pub team_2: u32,
}

impl RoundScores {
    pub fn new(team_1: u32, team_2: u32) -> Self {
        Self { team_1, team_2 }
    }

    pub fn for_team(&self, team: TeamId) -> u32 {
        match team {
            TeamId::One => self.team_1,
            TeamId::Two => self.team_2,
        }
    }
}
