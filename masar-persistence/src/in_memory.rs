//! In-memory implementation of RunStore.
//!
//! Stores records in a HashMap. Useful for testing and as a reference
//! implementation.

use crate::store::{RunStore, StoreError};
use async_trait::async_trait;
use masar_core::id::RunId;
use masar_core::state::RunState;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// In-memory store backed by a HashMap.
///
/// Thread-safe and cloneable: clones share the same underlying map, so a
/// runner and a test can observe the same records. For durability across
/// process restarts use [`FsStore`](crate::FsStore) or a custom
/// [`RunStore`] implementation.
#[derive(Clone)]
pub struct InMemoryStore {
    records: Arc<RwLock<HashMap<String, RunState>>>,
}

impl InMemoryStore {
    /// Create a new in-memory store.
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RunStore for InMemoryStore {
    async fn save(&self, state: &RunState) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| StoreError::Storage(format!("Lock error: {}", e)))?;
        records.insert(state.run_id().to_string(), state.clone());
        Ok(())
    }

    async fn load(&self, run_id: &RunId) -> Result<RunState, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|e| StoreError::Storage(format!("Lock error: {}", e)))?;
        records
            .get(run_id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(run_id.to_string()))
    }

    async fn delete(&self, run_id: &RunId) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| StoreError::Storage(format!("Lock error: {}", e)))?;
        records
            .remove(run_id.as_str())
            .ok_or_else(|| StoreError::NotFound(run_id.to_string()))
            .map(|_| ())
    }

    async fn list(&self) -> Result<Vec<RunId>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|e| StoreError::Storage(format!("Lock error: {}", e)))?;
        Ok(records.keys().cloned().map(RunId::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn save_and_load() {
        let store = InMemoryStore::new();
        let mut state = RunState::new("test-123");
        state.set("records", 100).unwrap();

        store.save(&state).await.unwrap();
        let loaded = store.load(&RunId::new("test-123")).await.unwrap();

        assert_eq!(loaded.run_id(), state.run_id());
        assert_eq!(loaded.get("records"), Some(&json!(100)));
    }

    #[tokio::test]
    async fn load_not_found() {
        let store = InMemoryStore::new();
        let result = store.load(&RunId::new("nonexistent")).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn save_overwrites_existing_record() {
        let store = InMemoryStore::new();
        let mut state = RunState::new("test-123");
        state.set("version", 1).unwrap();
        store.save(&state).await.unwrap();

        state.set("version", 2).unwrap();
        store.save(&state).await.unwrap();

        let loaded = store.load(&RunId::new("test-123")).await.unwrap();
        assert_eq!(loaded.get("version"), Some(&json!(2)));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let store = InMemoryStore::new();
        store.save(&RunState::new("test-123")).await.unwrap();

        store.delete(&RunId::new("test-123")).await.unwrap();
        let result = store.load(&RunId::new("test-123")).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_not_found() {
        let store = InMemoryStore::new();
        let result = store.delete(&RunId::new("nonexistent")).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn list_returns_all_ids() {
        let store = InMemoryStore::new();
        store.save(&RunState::new("run-1")).await.unwrap();
        store.save(&RunState::new("run-2")).await.unwrap();

        let mut ids = store.list().await.unwrap();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        assert_eq!(ids, vec![RunId::new("run-1"), RunId::new("run-2")]);
    }

    #[tokio::test]
    async fn clones_share_records() {
        let store = InMemoryStore::new();
        let view = store.clone();

        store.save(&RunState::new("shared")).await.unwrap();
        assert!(view.load(&RunId::new("shared")).await.is_ok());
    }
}
