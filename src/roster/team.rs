//! Team implementation and roster lifecycle
//!
//! A team holds an ordered roster of players (index 0 is the captain),
//! running score counters, and the faction assigned during the faction-pick
//! stage. Roster order is stable: substitution replaces a slot in place, so
//! captain-ness survives any substitution that does not target the captain.

use crate::error::MatchError;
use crate::types::{Faction, Player, PlayerId, TeamId};
use serde::{Deserialize, Serialize};

/// One side of a match
#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    id: TeamId,
    name: String,
    players: Vec<Player>,
    score: u64,
    net: u64,
    kills: u64,
    deaths: u64,
    cap_points: u64,
    faction: Option<Faction>,
}

impl Team {
    pub fn new(id: TeamId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            players: Vec::new(),
            score: 0,
            net: 0,
            kills: 0,
            deaths: 0,
            cap_points: 0,
            faction: None,
        }
    }

    pub fn id(&self) -> TeamId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// The captain is always the first roster slot
    pub fn captain(&self) -> Option<&Player> {
        self.players.first()
    }

    /// A team with only its captain is not yet fielded
    pub fn is_players(&self) -> bool {
        self.players.len() > 1
    }

    /// Roster minus the captain slot
    pub fn non_captains(&self) -> &[Player] {
        if self.players.is_empty() {
            &[]
        } else {
            &self.players[1..]
        }
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    pub fn faction(&self) -> Option<Faction> {
        self.faction
    }

    pub fn set_faction(&mut self, faction: Faction) {
        self.faction = Some(faction);
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn net(&self) -> u64 {
        self.net
    }

    pub fn kills(&self) -> u64 {
        self.kills
    }

    pub fn deaths(&self) -> u64 {
        self.deaths
    }

    pub fn cap_points(&self) -> u64 {
        self.cap_points
    }

    /// Append a player to the roster. The first player added becomes captain.
    pub fn add_player(&mut self, player: Player) {
        self.players.push(player);
    }

    /// Replace `old` with `new_player` in place, preserving the roster index.
    pub fn substitute(&mut self, old: &str, new_player: Player) -> Result<(), MatchError> {
        let slot = self
            .players
            .iter()
            .position(|p| p.id == old)
            .ok_or_else(|| MatchError::unknown("player", old))?;
        self.players[slot] = new_player;
        Ok(())
    }

    /// Empty the roster (match teardown)
    pub fn clear(&mut self) {
        self.players.clear();
    }

    /// Capture points also count towards the score
    pub fn add_cap(&mut self, points: u32) {
        self.cap_points += u64::from(points);
        self.score += u64::from(points);
    }

    pub fn add_score(&mut self, points: u32) {
        self.score += u64::from(points);
    }

    pub fn add_net(&mut self, points: u32) {
        self.net += u64::from(points);
    }

    pub fn add_one_kill(&mut self) {
        self.kills += 1;
    }

    pub fn add_one_death(&mut self) {
        self.deaths += 1;
    }

    /// Serialize into a flat snapshot record
    pub fn snapshot(&self) -> TeamSnapshot {
        TeamSnapshot {
            name: self.name.clone(),
            faction_id: self.faction.map(Faction::id).unwrap_or(0),
            score: self.score,
            net: self.net,
            deaths: self.deaths,
            kills: self.kills,
            cap_points: self.cap_points,
            players: self.players.iter().map(PlayerSnapshot::from).collect(),
        }
    }

    /// Rebuild a team from a snapshot record, preserving roster order
    pub fn from_snapshot(id: TeamId, data: &TeamSnapshot) -> Self {
        let mut team = Team::new(id, data.name.clone());
        team.faction = Faction::from_id(data.faction_id);
        team.score = data.score;
        team.net = data.net;
        team.deaths = data.deaths;
        team.kills = data.kills;
        team.cap_points = data.cap_points;
        for p in &data.players {
            team.add_player(Player::new(p.id.clone(), p.name.clone()));
        }
        team
    }
}

/// Flat persisted form of a team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSnapshot {
    pub name: String,
    pub faction_id: u8,
    pub score: u64,
    pub net: u64,
    pub deaths: u64,
    pub kills: u64,
    pub cap_points: u64,
    pub players: Vec<PlayerSnapshot>,
}

/// Flat persisted form of a roster slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
}

impl From<&Player> for PlayerSnapshot {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id.clone(),
            name: player.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_team() -> Team {
        let mut team = Team::new(TeamId::One, "Cobalt");
        team.add_player(Player::new("p1", "Captain"));
        team.add_player(Player::new("p2", "Second"));
        team.add_player(Player::new("p3", "Third"));
        team
    }

    #[test]
    fn test_captain_is_first_slot() {
        let team = create_test_team();
        assert_eq!(team.captain().unwrap().id, "p1");
        assert!(team.is_players());

        let rest: Vec<&str> = team.non_captains().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(rest, ["p2", "p3"]);
    }

    #[test]
    fn test_captain_only_team_is_not_fielded() {
        let mut team = Team::new(TeamId::Two, "Emerald");
        team.add_player(Player::new("c1", "Captain"));
        assert!(!team.is_players());
        assert!(team.captain().is_some());
    }

    #[test]
    fn test_substitute_preserves_index_and_length() {
        let mut team = create_test_team();
        team.substitute("p2", Player::new("p9", "Sub")).unwrap();

        assert_eq!(team.players().len(), 3);
        assert_eq!(team.players()[1].id, "p9");
        assert_eq!(team.captain().unwrap().id, "p1");
    }

    #[test]
    fn test_substitute_captain_slot_changes_captain() {
        let mut team = create_test_team();
        team.substitute("p1", Player::new("p8", "NewCap")).unwrap();

        assert_eq!(team.captain().unwrap().id, "p8");
        assert_eq!(team.players().len(), 3);
    }

    #[test]
    fn test_substitute_unknown_player() {
        let mut team = create_test_team();
        let err = team
            .substitute("ghost", Player::new("p9", "Sub"))
            .unwrap_err();
        assert!(matches!(err, MatchError::UnknownEntity { .. }));
        assert_eq!(team.players().len(), 3);
    }

    #[test]
    fn test_counters_accumulate() {
        let mut team = create_test_team();
        team.add_score(100);
        team.add_cap(50);
        team.add_net(30);
        team.add_one_kill();
        team.add_one_kill();
        team.add_one_death();

        assert_eq!(team.score(), 150); // cap points count towards score
        assert_eq!(team.cap_points(), 50);
        assert_eq!(team.net(), 30);
        assert_eq!(team.kills(), 2);
        assert_eq!(team.deaths(), 1);
    }

    #[test]
    fn test_clear_empties_roster() {
        let mut team = create_test_team();
        team.clear();
        assert!(team.players().is_empty());
        assert!(team.captain().is_none());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut team = create_test_team();
        team.set_faction(Faction::TR);
        team.add_score(128);
        team.add_one_kill();

        let snapshot = team.snapshot();
        let restored = Team::from_snapshot(TeamId::One, &snapshot);

        assert_eq!(restored.snapshot(), snapshot);
        assert_eq!(restored.captain().unwrap().id, "p1");
        assert_eq!(restored.faction(), Some(Faction::TR));
        assert_eq!(restored.score(), 128);
    }

    #[test]
    fn test_unassigned_faction_serializes_as_zero() {
        let team = create_test_team();
        let snapshot = team.snapshot();
        assert_eq!(snapshot.faction_id, 0);

        let restored = Team::from_snapshot(TeamId::One, &snapshot);
        assert_eq!(restored.faction(), None);
    }
}
