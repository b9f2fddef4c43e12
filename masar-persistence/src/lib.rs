//! Persistence layer for durable run state.
//!
//! This crate provides the storage boundary for `RunState` records,
//! enabling execution to resume across process restarts.
//!
//! # Architecture
//!
//! The persistence layer is built around three core concepts:
//!
//! - **RunStore**: a trait that abstracts the storage mechanism for run
//!   state records, one record per run id.
//! - **InMemoryStore**: a reference implementation using an in-memory
//!   HashMap, suitable for tests.
//! - **FsStore**: a filesystem implementation writing one JSON file per
//!   run, replaced atomically on every save.
//!
//! # Implementing custom stores
//!
//! To persist runs into a database or key-value store:
//!
//! 1. Add `masar-persistence` as a dependency
//! 2. Implement the `RunStore` trait
//! 3. Make `save` an atomic replace of the whole record
//!
//! ```rust,ignore
//! use masar_persistence::{RunStore, StoreError};
//! use async_trait::async_trait;
//!
//! pub struct RedisStore {
//!     // your Redis client
//! }
//!
//! #[async_trait]
//! impl RunStore for RedisStore {
//!     async fn save(&self, state: &RunState) -> Result<(), StoreError> {
//!         // serialize and SET under the run id
//!     }
//!     // ... implement other methods
//! }
//! ```

mod fs;
mod in_memory;
mod store;

pub use fs::FsStore;
pub use in_memory::InMemoryStore;
pub use store::{RunStore, StoreError};
