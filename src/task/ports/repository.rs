//! Repository port for task persistence and graph lookups.

use crate::task::domain::{TaskId, TaskRecord};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Task persistence contract.
///
/// Implementations must serialise writers per task: [`TaskRepository::save`]
/// is a compare-and-swap on the record revision.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID already
    /// exists.
    async fn store(&self, task: &TaskRecord) -> TaskRepositoryResult<()>;

    /// Loads a task snapshot.
    ///
    /// Returns `None` when the task does not exist.
    async fn load(&self, id: TaskId) -> TaskRepositoryResult<Option<TaskRecord>>;

    /// Replaces an existing task when its stored revision equals
    /// `expected_revision`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist
    /// or [`TaskRepositoryError::Conflict`] when another writer got there
    /// first.
    async fn save(&self, task: &TaskRecord, expected_revision: u64) -> TaskRepositoryResult<()>;

    /// Atomically replaces several existing tasks, each guarded by its
    /// expected revision. Either every record is written or none is.
    ///
    /// # Errors
    ///
    /// Returns the first [`TaskRepositoryError::NotFound`] or
    /// [`TaskRepositoryError::Conflict`] encountered; nothing is written.
    async fn save_all(&self, tasks: &[(TaskRecord, u64)]) -> TaskRepositoryResult<()>;

    /// Atomically replaces a recurring template and stores its newly
    /// generated occurrence. Either both writes happen or neither does.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] or
    /// [`TaskRepositoryError::Conflict`] for the template, or
    /// [`TaskRepositoryError::DuplicateTask`] for the occurrence; nothing is
    /// written.
    async fn save_generated(
        &self,
        template: &TaskRecord,
        expected_revision: u64,
        occurrence: &TaskRecord,
    ) -> TaskRepositoryResult<()>;

    /// Returns every task holding a dependency edge to `id`.
    async fn list_dependents(&self, id: TaskId) -> TaskRepositoryResult<Vec<TaskRecord>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The stored revision no longer matches the snapshot being saved.
    #[error("revision conflict on task {task}: expected {expected}, found {actual}")]
    Conflict {
        /// Task being saved.
        task: TaskId,
        /// Revision the writer started from.
        expected: u64,
        /// Revision currently stored.
        actual: u64,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
