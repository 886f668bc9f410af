//! In-memory keyed task store guarded by a single RwLock.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{Task, TaskError, TaskId, TaskStatus};

/// Shared registry of task id -> task record. Readers run concurrently;
/// writers exclude everything. Only snapshots ever leave the lock.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: RwLock<HashMap<TaskId, Task>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<TaskId, Task>> {
        self.tasks.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<TaskId, Task>> {
        self.tasks.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a new `Created` task with no links.
    pub fn create(&self, id: TaskId) -> Result<Task, TaskError> {
        let mut tasks = self.write();
        insert_new(&mut tasks, id)
    }

    /// Insert a new task only if fewer than `limit` tasks are processing.
    /// The count and the insert happen under one write lock.
    pub fn create_admitted(&self, id: TaskId, limit: usize) -> Result<Task, TaskError> {
        let mut tasks = self.write();
        if count_in(&tasks, TaskStatus::Processing) >= limit {
            return Err(TaskError::ServerBusy { limit });
        }
        insert_new(&mut tasks, id)
    }

    /// Current snapshot of a task.
    pub fn get(&self, id: TaskId) -> Result<Task, TaskError> {
        self.read().get(&id).cloned().ok_or(TaskError::NotFound(id))
    }

    /// Replace the stored record unconditionally (last writer wins).
    pub fn update(&self, task: Task) {
        self.write().insert(task.id, task);
    }

    /// Apply `f` to the live record under the write lock. The change is kept
    /// only when `f` returns `Ok`; on `Err` the record is left untouched.
    pub fn modify<T, F>(&self, id: TaskId, f: F) -> Result<T, TaskError>
    where
        F: FnOnce(&mut Task) -> Result<T, TaskError>,
    {
        let mut tasks = self.write();
        let current = tasks.get(&id).ok_or(TaskError::NotFound(id))?;
        let mut draft = current.clone();
        let out = f(&mut draft)?;
        tasks.insert(id, draft);
        Ok(out)
    }

    pub fn count_by_status(&self, status: TaskStatus) -> usize {
        count_in(&self.read(), status)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

fn insert_new(tasks: &mut HashMap<TaskId, Task>, id: TaskId) -> Result<Task, TaskError> {
    if tasks.contains_key(&id) {
        return Err(TaskError::AlreadyExists(id));
    }
    let task = Task::new(id);
    tasks.insert(id, task.clone());
    Ok(task)
}

fn count_in(tasks: &HashMap<TaskId, Task>, status: TaskStatus) -> usize {
    tasks.values().filter(|t| t.status == status).count()
}
