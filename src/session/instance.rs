//! Match instance implementation and lifecycle state machine
//!
//! A [`MatchInstance`] is the pure state machine: every public operation
//! validates against the current stage, applies its mutation atomically (no
//! partial application on error), and returns the lifecycle events the caller
//! must broadcast. It never blocks on plugin completion; broadcasting is the
//! session wrapper's job, performed only after the mutation is fully applied.

use crate::plugins::event::MatchEvent;
use crate::roster::{PlayerSnapshot, Team, TeamSnapshot};
use crate::session::stage::MatchStage;
use crate::types::{BaseId, Faction, MatchId, Player, PlayerId, RoundScores, TeamId};
use crate::utils::{current_timestamp, generate_match_id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-match rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Number of rounds played before the match can close
    pub round_count: u32,
    pub team_names: [String; 2],
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            round_count: 2,
            team_names: ["Team 1".to_string(), "Team 2".to_string()],
        }
    }
}

type OpResult = Result<Vec<MatchEvent>, crate::error::MatchError>;
use crate::error::MatchError;

/// A single match session's state
#[derive(Debug, Clone, PartialEq)]
pub struct MatchInstance {
    id: MatchId,
    config: MatchConfig,
    stage: MatchStage,
    teams: [Team; 2],
    /// Players not yet drafted to a team
    pool: Vec<Player>,
    base: Option<BaseId>,
    round_no: u32,
    round_scores: Vec<RoundScores>,
    /// Which captain drafts next; set once captains are selected
    picking: Option<TeamId>,
    ready: [bool; 2],
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
}

impl MatchInstance {
    /// Create a new match over a waiting pool of players
    pub fn new(pool: Vec<Player>, config: MatchConfig) -> Self {
        let now = current_timestamp();
        let teams = [
            Team::new(TeamId::One, config.team_names[0].clone()),
            Team::new(TeamId::Two, config.team_names[1].clone()),
        ];
        Self {
            id: generate_match_id(),
            config,
            stage: MatchStage::Idle,
            teams,
            pool,
            base: None,
            round_no: 0,
            round_scores: Vec::new(),
            picking: None,
            ready: [false, false],
            created_at: now,
            last_activity: now,
        }
    }

    pub fn id(&self) -> MatchId {
        self.id
    }

    pub fn stage(&self) -> MatchStage {
        self.stage
    }

    pub fn team(&self, id: TeamId) -> &Team {
        &self.teams[id.index()]
    }

    pub fn pool(&self) -> &[Player] {
        &self.pool
    }

    pub fn base(&self) -> Option<&BaseId> {
        self.base.as_ref()
    }

    pub fn round_no(&self) -> u32 {
        self.round_no
    }

    pub fn round_scores(&self) -> &[RoundScores] {
        &self.round_scores
    }

    pub fn is_ready(&self, team: TeamId) -> bool {
        self.ready[team.index()]
    }

    /// The captain whose draft turn it is (only meaningful during TEAM_PICK)
    pub fn picking(&self) -> Option<TeamId> {
        self.picking
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn touch(&mut self) {
        self.last_activity = current_timestamp();
    }

    fn ensure_stage(&self, expected: MatchStage, op: &str) -> Result<(), MatchError> {
        if self.stage.is_terminal() {
            return Err(MatchError::closed(self.stage));
        }
        if self.stage != expected {
            return Err(MatchError::illegal(self.stage, op));
        }
        Ok(())
    }

    fn pool_position(&self, player_id: &str) -> Option<usize> {
        self.pool.iter().position(|p| p.id == player_id)
    }

    fn participates(&self, player_id: &str) -> bool {
        self.teams.iter().any(|t| t.contains(player_id)) || self.pool_position(player_id).is_some()
    }

    /// IDLE → LAUNCHING
    pub fn launch(&mut self) -> OpResult {
        self.ensure_stage(MatchStage::Idle, "launch")?;
        self.stage = MatchStage::Launching;
        self.touch();
        Ok(vec![MatchEvent::MatchLaunching])
    }

    /// LAUNCHING → CAPTAIN_PICK (no lifecycle event on this edge)
    pub fn open_captain_pick(&mut self) -> OpResult {
        self.ensure_stage(MatchStage::Launching, "open_captain_pick")?;
        self.stage = MatchStage::CaptainPick;
        self.touch();
        Ok(vec![])
    }

    /// CAPTAIN_PICK → TEAM_PICK.
    ///
    /// `first_pick` resolves the pick-order tie-break; the coin flip is the
    /// caller's business, not the state machine's.
    pub fn select_captains(
        &mut self,
        captain_1: &str,
        captain_2: &str,
        first_pick: TeamId,
    ) -> OpResult {
        self.ensure_stage(MatchStage::CaptainPick, "select_captains")?;
        if captain_1 == captain_2 {
            return Err(MatchError::InvalidRequest {
                reason: format!("'{}' cannot captain both teams", captain_1),
            });
        }
        let pos_1 = self
            .pool_position(captain_1)
            .ok_or_else(|| MatchError::unknown("player", captain_1))?;
        self.pool_position(captain_2)
            .ok_or_else(|| MatchError::unknown("player", captain_2))?;

        // Validation done, now mutate. Captain 2's position is re-looked-up
        // because removing captain 1 may shift it.
        let c1 = self.pool.remove(pos_1);
        let pos_2 = self
            .pool_position(captain_2)
            .ok_or_else(|| MatchError::unknown("player", captain_2))?;
        let c2 = self.pool.remove(pos_2);
        self.teams[TeamId::One.index()].add_player(c1);
        self.teams[TeamId::Two.index()].add_player(c2);
        self.picking = Some(first_pick);
        self.stage = MatchStage::TeamPick;
        self.touch();
        Ok(vec![MatchEvent::CaptainsSelected])
    }

    /// Draft one player; alternates the picking captain. The final pool
    /// player is auto-assigned, completing the draft (TEAM_PICK → FACTION_PICK).
    pub fn pick_team_member(&mut self, captain: &str, player: &str) -> OpResult {
        self.ensure_stage(MatchStage::TeamPick, "pick_team_member")?;
        let picking = self
            .picking
            .ok_or_else(|| MatchError::Internal {
                message: "no picking captain in TEAM_PICK".to_string(),
            })?;
        let expected = self.teams[picking.index()]
            .captain()
            .ok_or_else(|| MatchError::Internal {
                message: format!("{} has no captain in TEAM_PICK", picking),
            })?;
        if expected.id != captain {
            if self.teams[picking.other().index()]
                .captain()
                .map(|c| c.id == captain)
                .unwrap_or(false)
            {
                return Err(MatchError::illegal(self.stage, "pick_team_member (not your pick)"));
            }
            return Err(MatchError::unknown("captain", captain));
        }
        if self.teams.iter().any(|t| t.contains(player)) {
            return Err(MatchError::InvalidRequest {
                reason: format!("player '{}' was already drafted", player),
            });
        }
        let pos = self
            .pool_position(player)
            .ok_or_else(|| MatchError::unknown("player", player))?;

        let drafted = self.pool.remove(pos);
        self.teams[picking.index()].add_player(drafted);
        let next = picking.other();
        self.picking = Some(next);

        // Auto-assign the last remaining player to whoever picks next.
        if self.pool.len() == 1 {
            let last = self.pool.remove(0);
            self.teams[next.index()].add_player(last);
        }

        self.touch();
        if self.pool.is_empty() {
            self.picking = None;
            self.stage = MatchStage::FactionPick;
            Ok(vec![MatchEvent::TeamsDone])
        } else {
            Ok(vec![])
        }
    }

    /// Record a faction pick; FACTION_PICK → BASE_PICK once both are in.
    ///
    /// Emits `FactionPick` for every pick; `FactionsPicked` fires exactly
    /// once, when the stage completes.
    pub fn pick_faction(&mut self, team: TeamId, faction: Faction) -> OpResult {
        self.ensure_stage(MatchStage::FactionPick, "pick_faction")?;
        if self.teams[team.other().index()].faction() == Some(faction) {
            return Err(MatchError::InvalidRequest {
                reason: format!("faction {} is already taken by {}", faction, team.other()),
            });
        }
        self.teams[team.index()].set_faction(faction);
        self.touch();

        let mut events = vec![MatchEvent::FactionPick { team, faction }];
        if self.teams.iter().all(|t| t.faction().is_some()) {
            self.stage = MatchStage::BasePick;
            events.push(MatchEvent::FactionsPicked {
                base: self.base.clone(),
            });
        }
        Ok(events)
    }

    /// BASE_PICK → TEAMS_READY
    pub fn select_base(&mut self, base: BaseId) -> OpResult {
        self.ensure_stage(MatchStage::BasePick, "select_base")?;
        self.base = Some(base.clone());
        self.stage = MatchStage::TeamsReady;
        self.touch();
        Ok(vec![MatchEvent::BaseSelected { base }])
    }

    /// Mark one team ready. The stage stays TEAMS_READY until `start_round`.
    pub fn set_team_ready(&mut self, team: TeamId) -> OpResult {
        self.ensure_stage(MatchStage::TeamsReady, "set_team_ready")?;
        if !self.teams[team.index()].is_players() {
            return Err(MatchError::InvalidRequest {
                reason: format!("{} is not fielded and cannot ready up", team),
            });
        }
        if self.ready[team.index()] {
            return Err(MatchError::InvalidRequest {
                reason: format!("{} is already ready", team),
            });
        }
        self.ready[team.index()] = true;
        self.touch();
        Ok(vec![MatchEvent::TeamReady { team }])
    }

    /// TEAMS_READY → ROUND_ACTIVE (both teams ready), or
    /// ROUND_OVER → ROUND_ACTIVE while rounds remain.
    pub fn start_round(&mut self) -> OpResult {
        if self.stage.is_terminal() {
            return Err(MatchError::closed(self.stage));
        }
        match self.stage {
            MatchStage::TeamsReady => {
                if !self.ready.iter().all(|r| *r) {
                    return Err(MatchError::illegal(
                        self.stage,
                        "start_round (teams not ready)",
                    ));
                }
            }
            MatchStage::RoundOver => {
                if self.round_no >= self.config.round_count {
                    return Err(MatchError::illegal(
                        self.stage,
                        "start_round (no rounds remaining)",
                    ));
                }
            }
            _ => return Err(MatchError::illegal(self.stage, "start_round")),
        }
        self.stage = MatchStage::RoundActive;
        self.touch();
        Ok(vec![MatchEvent::MatchStarting])
    }

    /// ROUND_ACTIVE → ROUND_OVER, applying the round's scores. Called again
    /// after the final round, closes the match (ROUND_OVER → MATCH_OVER).
    pub fn end_round(&mut self, scores: RoundScores) -> OpResult {
        if self.stage.is_terminal() {
            return Err(MatchError::closed(self.stage));
        }
        match self.stage {
            MatchStage::RoundActive => {
                self.round_no += 1;
                self.teams[TeamId::One.index()].add_score(scores.team_1);
                self.teams[TeamId::Two.index()].add_score(scores.team_2);
                self.round_scores.push(scores);
                self.stage = MatchStage::RoundOver;
                self.touch();
                Ok(vec![MatchEvent::RoundOver {
                    round_no: self.round_no,
                    switch_sides: self.round_no < self.config.round_count,
                }])
            }
            MatchStage::RoundOver if self.round_no >= self.config.round_count => {
                self.stage = MatchStage::MatchOver;
                self.touch();
                Ok(vec![MatchEvent::MatchOver])
            }
            _ => Err(MatchError::illegal(self.stage, "end_round")),
        }
    }

    /// Replace a roster slot (or pool entry) in place. Legal in any active
    /// stage; not a stage transition.
    pub fn substitute(&mut self, old: &str, new_player: Player) -> OpResult {
        if self.stage.is_terminal() {
            return Err(MatchError::closed(self.stage));
        }
        if !self.stage.is_active() {
            return Err(MatchError::illegal(self.stage, "substitute"));
        }
        if self.participates(&new_player.id) {
            return Err(MatchError::InvalidRequest {
                reason: format!("player '{}' already participates", new_player.id),
            });
        }
        if !self.participates(old) {
            return Err(MatchError::unknown("player", old));
        }

        let new_id = new_player.id.clone();
        if let Some(pos) = self.pool_position(old) {
            self.pool[pos] = new_player;
        } else {
            let team = self
                .teams
                .iter_mut()
                .find(|t| t.contains(old))
                .ok_or_else(|| MatchError::unknown("player", old))?;
            team.substitute(old, new_player)
                .map_err(|_| MatchError::unknown("player", old))?;
        }
        self.touch();
        Ok(vec![MatchEvent::PlayerSub {
            old: old.to_string(),
            new: new_id,
        }])
    }

    /// Administrative cancel: any non-terminal stage → CANCELLED.
    /// Clears both rosters and the pool.
    pub fn cancel(&mut self) -> Result<(), MatchError> {
        if self.stage.is_terminal() {
            return Err(MatchError::closed(self.stage));
        }
        self.stage = MatchStage::Cancelled;
        for team in self.teams.iter_mut() {
            team.clear();
        }
        self.pool.clear();
        self.touch();
        Ok(())
    }

    /// Serialize into a flat snapshot record
    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            id: self.id,
            stage: self.stage,
            base: self.base.clone(),
            round_no: self.round_no,
            round_scores: self.round_scores.clone(),
            teams: [self.teams[0].snapshot(), self.teams[1].snapshot()],
            pool: self.pool.iter().map(PlayerSnapshot::from).collect(),
            picking: self.picking,
            ready: self.ready,
        }
    }

    /// Rebuild a match from a snapshot record
    pub fn from_snapshot(data: &MatchSnapshot, config: MatchConfig) -> Self {
        let now = current_timestamp();
        Self {
            id: data.id,
            config,
            stage: data.stage,
            teams: [
                Team::from_snapshot(TeamId::One, &data.teams[0]),
                Team::from_snapshot(TeamId::Two, &data.teams[1]),
            ],
            pool: data
                .pool
                .iter()
                .map(|p| Player::new(p.id.clone(), p.name.clone()))
                .collect(),
            base: data.base.clone(),
            round_no: data.round_no,
            round_scores: data.round_scores.clone(),
            picking: data.picking,
            ready: data.ready,
            created_at: now,
            last_activity: now,
        }
    }
}

/// Flat persisted form of a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub id: MatchId,
    pub stage: MatchStage,
    pub base: Option<BaseId>,
    pub round_no: u32,
    pub round_scores: Vec<RoundScores>,
    pub teams: [TeamSnapshot; 2],
    pub pool: Vec<PlayerSnapshot>,
    pub picking: Option<TeamId>,
    pub ready: [bool; 2],
}
