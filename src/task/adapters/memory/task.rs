//! In-memory task repository used by tests and embedders.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{TaskId, TaskRecord},
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory task repository with revision checks.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, TaskRecord>,
    dependents_index: HashMap<TaskId, HashSet<TaskId>>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deletes a task without touching edges that point at it.
    ///
    /// Mirrors an out-of-band deletion by the surrounding system; dependents
    /// keep their (now dangling) edges.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    pub fn remove(&self, id: TaskId) -> TaskRepositoryResult<TaskRecord> {
        let mut state = self.write()?;
        let removed = state
            .tasks
            .remove(&id)
            .ok_or(TaskRepositoryError::NotFound(id))?;
        unindex_dependencies(&mut state, &removed);
        Ok(removed)
    }

    /// Returns the number of stored tasks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Persistence`] when the lock is poisoned.
    pub fn len(&self) -> TaskRepositoryResult<usize> {
        Ok(self.read()?.tasks.len())
    }

    /// Returns `true` when no task is stored.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Persistence`] when the lock is poisoned.
    pub fn is_empty(&self) -> TaskRepositoryResult<bool> {
        Ok(self.read()?.tasks.is_empty())
    }

    fn read(&self) -> TaskRepositoryResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state.read().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> TaskRepositoryResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state.write().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

fn index_dependencies(state: &mut InMemoryTaskState, task: &TaskRecord) {
    for dependency in task.dependency_ids() {
        state
            .dependents_index
            .entry(dependency)
            .or_default()
            .insert(task.id());
    }
}

/// Removes a task from the reverse index, cleaning up empty entries.
fn unindex_dependencies(state: &mut InMemoryTaskState, task: &TaskRecord) {
    for dependency in task.dependency_ids() {
        if let Some(dependents) = state.dependents_index.get_mut(&dependency) {
            dependents.remove(&task.id());
            if dependents.is_empty() {
                state.dependents_index.remove(&dependency);
            }
        }
    }
}

fn check_revision(
    state: &InMemoryTaskState,
    task: &TaskRecord,
    expected_revision: u64,
) -> TaskRepositoryResult<()> {
    let stored = state
        .tasks
        .get(&task.id())
        .ok_or(TaskRepositoryError::NotFound(task.id()))?;
    if stored.revision() != expected_revision {
        return Err(TaskRepositoryError::Conflict {
            task: task.id(),
            expected: expected_revision,
            actual: stored.revision(),
        });
    }
    Ok(())
}

fn replace(state: &mut InMemoryTaskState, task: &TaskRecord) {
    if let Some(old_task) = state.tasks.get(&task.id()).cloned() {
        unindex_dependencies(state, &old_task);
    }
    index_dependencies(state, task);
    state.tasks.insert(task.id(), task.clone());
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, task: &TaskRecord) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        index_dependencies(&mut state, task);
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn load(&self, id: TaskId) -> TaskRepositoryResult<Option<TaskRecord>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    async fn save(&self, task: &TaskRecord, expected_revision: u64) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        check_revision(&state, task, expected_revision)?;
        replace(&mut state, task);
        Ok(())
    }

    async fn save_all(&self, tasks: &[(TaskRecord, u64)]) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        for (task, expected_revision) in tasks {
            check_revision(&state, task, *expected_revision)?;
        }
        for (task, _) in tasks {
            replace(&mut state, task);
        }
        Ok(())
    }

    async fn save_generated(
        &self,
        template: &TaskRecord,
        expected_revision: u64,
        occurrence: &TaskRecord,
    ) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        check_revision(&state, template, expected_revision)?;
        if state.tasks.contains_key(&occurrence.id()) {
            return Err(TaskRepositoryError::DuplicateTask(occurrence.id()));
        }
        replace(&mut state, template);
        index_dependencies(&mut state, occurrence);
        state.tasks.insert(occurrence.id(), occurrence.clone());
        Ok(())
    }

    async fn list_dependents(&self, id: TaskId) -> TaskRepositoryResult<Vec<TaskRecord>> {
        let state = self.read()?;
        let mut dependents: Vec<TaskRecord> = state
            .dependents_index
            .get(&id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|dependent| state.tasks.get(dependent).cloned())
                    .collect()
            })
            .unwrap_or_default();
        dependents.sort_by_key(TaskRecord::created_at);
        Ok(dependents)
    }
}
