//! Store trait for persisting and retrieving run state records.
//!
//! This trait abstracts the storage mechanism, allowing implementations
//! for various backends (in-memory, filesystem, key-value stores, etc.).

use async_trait::async_trait;
use masar_core::id::RunId;
use masar_core::state::RunState;

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Record not found.
    #[error("No record for run: {0}")]
    NotFound(String),
    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Store-specific error.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Trait for persistent storage of run state records.
///
/// One record exists per [`RunId`], overwritten on each save. The runner
/// saves after every step transition, so a record always reflects the
/// latest checkpoint of its run.
///
/// A `save` must either fully succeed or leave the prior record intact;
/// a reader must never observe a partially-written record.
///
/// # Example
///
/// ```rust,ignore
/// use masar_persistence::{InMemoryStore, RunStore};
///
/// let store = InMemoryStore::new();
/// store.save(&state).await?;
/// let restored = store.load(&run_id).await?;
/// ```
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Persist the record for `state.run_id()`.
    ///
    /// If a record for that id already exists, it is replaced.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the record cannot be saved.
    async fn save(&self, state: &RunState) -> Result<(), StoreError>;

    /// Load the record for a run id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no record exists for the id.
    async fn load(&self, run_id: &RunId) -> Result<RunState, StoreError>;

    /// Delete the record for a run id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no record exists for the id.
    async fn delete(&self, run_id: &RunId) -> Result<(), StoreError>;

    /// List the ids of all stored runs.
    ///
    /// Returns an empty vector if no records exist.
    async fn list(&self) -> Result<Vec<RunId>, StoreError>;
}
