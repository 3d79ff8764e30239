//! Record persistence
//!
//! A small collection/record abstraction behind the [`RecordStore`] trait so
//! lobby state survives a process restart without tying the core to one
//! backing store. The in-memory implementation backs tests and single-node
//! deployments.

use crate::error::{MatchError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// Keyed JSON record storage, grouped into named collections
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch one record; `Ok(None)` when absent
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>>;

    /// Insert or replace one record
    async fn set(&self, collection: &str, id: &str, value: Value) -> Result<()>;

    /// All records in a collection, keyed by id
    async fn get_all(&self, collection: &str) -> Result<HashMap<String, Value>>;
}

/// Process-local store. Cheap and good enough when restart persistence only
/// needs to survive an in-process reload, not a host reboot.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, HashMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_lock(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, HashMap<String, Value>>>> {
        self.collections.read().map_err(|_| {
            MatchError::Internal {
                message: "record store lock poisoned".to_string(),
            }
            .into()
        })
    }

    fn write_lock(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, HashMap<String, Value>>>> {
        self.collections.write().map_err(|_| {
            MatchError::Internal {
                message: "record store lock poisoned".to_string(),
            }
            .into()
        })
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let collections = self.read_lock()?;
        Ok(collections
            .get(collection)
            .and_then(|records| records.get(id))
            .cloned())
    }

    async fn set(&self, collection: &str, id: &str, value: Value) -> Result<()> {
        let mut collections = self.write_lock()?;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), value);
        Ok(())
    }

    async fn get_all(&self, collection: &str) -> Result<HashMap<String, Value>> {
        let collections = self.read_lock()?;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_missing_record_is_none() {
        let store = MemoryStore::new();
        assert!(store.get("restart_data", "lobby").await.unwrap().is_none());
        assert!(store.get_all("restart_data").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_then_get_round_trips() {
        let store = MemoryStore::new();
        store
            .set("restart_data", "lobby", json!({"last_lobby": ["p1", "p2"]}))
            .await
            .unwrap();

        let value = store.get("restart_data", "lobby").await.unwrap().unwrap();
        assert_eq!(value["last_lobby"][1], "p2");
    }

    #[tokio::test]
    async fn test_set_replaces_existing_record() {
        let store = MemoryStore::new();
        store.set("c", "k", json!(1)).await.unwrap();
        store.set("c", "k", json!(2)).await.unwrap();

        assert_eq!(store.get("c", "k").await.unwrap(), Some(json!(2)));
        assert_eq!(store.get_all("c").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let store = MemoryStore::new();
        store.set("a", "k", json!("left")).await.unwrap();
        store.set("b", "k", json!("right")).await.unwrap();

        assert_eq!(store.get("a", "k").await.unwrap(), Some(json!("left")));
        assert_eq!(store.get("b", "k").await.unwrap(), Some(json!("right")));
    }
}
