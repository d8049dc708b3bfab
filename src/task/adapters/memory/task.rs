//! In-memory task repository with revision-checked writes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use crate::task::{
    domain::{Task, TaskId, UserId},
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory task repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> TaskRepositoryResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state.write().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

/// Checks the stored revision and returns the task stamped with the next one.
fn compare_and_swap(state: &InMemoryTaskState, task: &Task) -> TaskRepositoryResult<Task> {
    let stored = state
        .tasks
        .get(&task.id())
        .ok_or(TaskRepositoryError::NotFound(task.id()))?;
    if stored.revision() != task.revision() {
        return Err(TaskRepositoryError::RevisionConflict {
            task_id: task.id(),
            expected: task.revision(),
            actual: stored.revision(),
        });
    }
    Ok(task.clone().with_revision(task.revision().next()))
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<Task> {
        let mut state = self.write()?;
        let committed = compare_and_swap(&state, task)?;
        state.tasks.insert(committed.id(), committed.clone());
        Ok(committed)
    }

    async fn commit_reassignment(
        &self,
        original: &Task,
        replacement: &Task,
    ) -> TaskRepositoryResult<Task> {
        let mut state = self.write()?;
        let committed = compare_and_swap(&state, original)?;
        if state.tasks.contains_key(&replacement.id()) {
            return Err(TaskRepositoryError::DuplicateTask(replacement.id()));
        }
        state.tasks.insert(committed.id(), committed.clone());
        state.tasks.insert(replacement.id(), replacement.clone());
        Ok(committed)
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.state.read().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn find_by_assignee(&self, user: UserId) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| task.assigned_to() == Some(user))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(tasks)
    }
}
