//! Lobby queue
//!
//! Pre-match signup list with restart persistence. Every mutation is written
//! through to the record store, so a process restart rehydrates the queue
//! instead of silently dropping everyone who had signed up.

use crate::error::{MatchError, Result};
use crate::storage::RecordStore;
use crate::types::{Player, PlayerId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Collection holding state that must survive a restart
pub const RESTART_COLLECTION: &str = "restart_data";

const LOBBY_RECORD_ID: &str = "lobby";

/// Persisted lobby snapshot
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LobbyRecord {
    pub last_lobby: Vec<PlayerId>,
}

/// Ordered signup queue for the next match
pub struct LobbyQueue {
    store: Arc<dyn RecordStore>,
    players: Vec<Player>,
    capacity: usize,
}

impl LobbyQueue {
    pub fn new(store: Arc<dyn RecordStore>, capacity: usize) -> Self {
        Self {
            store,
            players: Vec::new(),
            capacity,
        }
    }

    /// Rehydrate the queue from the last persisted snapshot. Missing or
    /// empty records leave the queue empty.
    pub async fn restore(&mut self) -> Result<usize> {
        let record = match self.store.get(RESTART_COLLECTION, LOBBY_RECORD_ID).await? {
            Some(value) => serde_json::from_value::<LobbyRecord>(value)?,
            None => return Ok(0),
        };
        self.players = record
            .last_lobby
            .iter()
            .map(|id| Player::from_id(id.clone()))
            .collect();
        if !self.players.is_empty() {
            info!("restored {} lobby signups", self.players.len());
        }
        Ok(self.players.len())
    }

    /// Add a player to the end of the queue and persist.
    pub async fn join(&mut self, player: Player) -> Result<()> {
        if self.players.iter().any(|p| p.id == player.id) {
            return Err(MatchError::InvalidRequest {
                reason: format!("'{}' is already signed up", player.id),
            }
            .into());
        }
        if self.is_full() {
            return Err(MatchError::InvalidRequest {
                reason: "lobby is full".to_string(),
            }
            .into());
        }
        self.players.push(player);
        self.persist().await
    }

    /// Remove a player from the queue and persist.
    pub async fn leave(&mut self, player_id: &str) -> Result<()> {
        let before = self.players.len();
        self.players.retain(|p| p.id != player_id);
        if self.players.len() == before {
            return Err(MatchError::unknown("player", player_id).into());
        }
        self.persist().await
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Hand the signups off to a launching match, emptying the queue. The
    /// persisted record is cleared so a restart mid-match does not resurrect
    /// a stale lobby.
    pub async fn drain_for_match(&mut self) -> Result<Vec<Player>> {
        let players = std::mem::take(&mut self.players);
        self.persist().await?;
        Ok(players)
    }

    async fn persist(&self) -> Result<()> {
        let record = LobbyRecord {
            last_lobby: self.players.iter().map(|p| p.id.clone()).collect(),
        };
        self.store
            .set(
                RESTART_COLLECTION,
                LOBBY_RECORD_ID,
                serde_json::to_value(record)?,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn player(id: &str) -> Player {
        Player::new(id.to_string(), id.to_string())
    }

    #[tokio::test]
    async fn test_join_and_leave_persist() {
        let store = Arc::new(MemoryStore::new());
        let mut queue = LobbyQueue::new(store.clone(), 10);

        queue.join(player("p1")).await.unwrap();
        queue.join(player("p2")).await.unwrap();
        assert_eq!(queue.len(), 2);

        queue.leave("p1").await.unwrap();
        assert_eq!(queue.players()[0].id, "p2");

        let value = store.get(RESTART_COLLECTION, "lobby").await.unwrap().unwrap();
        let record: LobbyRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.last_lobby, vec!["p2".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_join_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let mut queue = LobbyQueue::new(store, 10);

        queue.join(player("p1")).await.unwrap();
        assert!(queue.join(player("p1")).await.is_err());
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_capacity_is_enforced() {
        let store = Arc::new(MemoryStore::new());
        let mut queue = LobbyQueue::new(store, 2);

        queue.join(player("p1")).await.unwrap();
        queue.join(player("p2")).await.unwrap();
        assert!(queue.is_full());
        assert!(queue.join(player("p3")).await.is_err());
    }

    #[tokio::test]
    async fn test_leave_unknown_player_fails() {
        let store = Arc::new(MemoryStore::new());
        let mut queue = LobbyQueue::new(store, 4);
        assert!(queue.leave("ghost").await.is_err());
    }

    #[tokio::test]
    async fn test_restore_rehydrates_from_store() {
        let store = Arc::new(MemoryStore::new());
        {
            let mut queue = LobbyQueue::new(store.clone(), 10);
            queue.join(player("p1")).await.unwrap();
            queue.join(player("p2")).await.unwrap();
        }

        let mut fresh = LobbyQueue::new(store, 10);
        assert_eq!(fresh.restore().await.unwrap(), 2);
        assert_eq!(fresh.players()[1].id, "p2");
    }

    #[tokio::test]
    async fn test_drain_empties_queue_and_store() {
        let store = Arc::new(MemoryStore::new());
        let mut queue = LobbyQueue::new(store.clone(), 10);
        queue.join(player("p1")).await.unwrap();

        let drained = queue.drain_for_match().await.unwrap();
        assert_eq!(drained.len(), 1);
        assert!(queue.is_empty());

        let mut fresh = LobbyQueue::new(store, 10);
        assert_eq!(fresh.restore().await.unwrap(), 0);
    }
}
