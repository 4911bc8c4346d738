//! Persistence behind the HTTP handlers.
//!
//! Handlers never talk to MongoDB directly. They hold an [`SharedStore`] and
//! call the five operations of [`TodoStore`]; which backend answers is decided
//! once, in `main`.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::todo::{NewTodo, Todo, TodoChanges, TodoId};

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// The store handle passed to every handler.
pub type SharedStore = Arc<dyn TodoStore>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Another record already carries this title.
    #[error("a todo titled {0:?} already exists")]
    DuplicateTitle(String),

    #[error("mongodb: {0}")]
    Mongo(#[from] mongodb::error::Error),
}

/// Document-store operations the service needs, and nothing else.
///
/// Lookups and mutations by id return `Ok(None)` when no record has that id.
#[async_trait]
pub trait TodoStore: Send + Sync + 'static {
    async fn find_by_title(&self, title: &str) -> Result<Option<Todo>, StoreError>;

    async fn find_by_id(&self, id: TodoId) -> Result<Option<Todo>, StoreError>;

    /// Persists a new record with a fresh id and both timestamps set to now.
    ///
    /// Fails with [`StoreError::DuplicateTitle`] if the title is taken, even
    /// when a concurrent insert got there between the caller's pre-check and
    /// this call.
    async fn insert(&self, new: NewTodo) -> Result<Todo, StoreError>;

    /// Writes the present fields, refreshes `updatedAt`, and returns the
    /// record as it is after the update.
    async fn update_by_id(&self, id: TodoId, changes: TodoChanges) -> Result<Option<Todo>, StoreError>;

    /// Removes the record and returns it.
    async fn delete_by_id(&self, id: TodoId) -> Result<Option<Todo>, StoreError>;

    /// Round-trips to the backend. Used by the readiness probe.
    async fn ping(&self) -> Result<(), StoreError>;
}
