use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::domain::error::{TaskError, TaskResult};
use crate::domain::storage::{KeyValueStorage, StorageError, TASKS_KEY};
use crate::domain::task::{Task, TaskDraft, TaskId};

/// Authoritative, ordered task collection. Every mutation re-persists the
/// whole collection under [`TASKS_KEY`].
///
/// A failed write is reported as [`TaskError::Persistence`] but the
/// in-memory change is kept: memory stays the source of truth for the
/// session.
pub struct TaskStore<S: KeyValueStorage> {
    storage: S,
    tasks: Vec<Task>,
    last_id: i64,
}

impl<S: KeyValueStorage> TaskStore<S> {
    /// Load the collection. An absent or unparsable entry gives an empty one;
    /// a backend read failure is returned so nothing overwrites the stored data.
    pub async fn load(storage: S) -> TaskResult<Self> {
        let raw = storage.get(TASKS_KEY).await.map_err(|err| {
            warn!(error = %err, "failed to read stored tasks");
            TaskError::Load(err)
        })?;
        let tasks = match raw {
            Some(raw) => match serde_json::from_str::<Vec<Task>>(&raw) {
                Ok(tasks) => dedup_ids(tasks),
                Err(err) => {
                    warn!(error = %err, "stored tasks are unreadable, starting empty");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        info!(count = tasks.len(), "tasks loaded");
        let last_id = tasks.iter().map(|t| t.id.0).max().unwrap_or(0);
        Ok(Self { storage, tasks, last_id })
    }

    pub fn list(&self) -> &[Task] { &self.tasks }

    pub fn get(&self, id: TaskId) -> Option<&Task> { self.tasks.iter().find(|t| t.id == id) }

    pub async fn create(&mut self, draft: TaskDraft) -> TaskResult<Task> {
        let draft = draft.normalized(None)?;
        let task = Task {
            id: self.next_id()?,
            title: draft.title,
            description: draft.description,
            due_date: draft.due_date,
            priority: draft.priority,
            completed: false,
        };
        self.tasks.push(task.clone());
        debug!(id = %task.id, "task created");
        self.persist().await?;
        Ok(task)
    }

    /// Replace title, description, due date and priority; id, completion and position stay.
    pub async fn update(&mut self, id: TaskId, draft: TaskDraft) -> TaskResult<Task> {
        let index = self.position(id).ok_or(TaskError::NotFound(id))?;
        let draft = draft.normalized(Some(&self.tasks[index].priority))?;
        let task = &mut self.tasks[index];
        task.title = draft.title;
        task.description = draft.description;
        task.due_date = draft.due_date;
        task.priority = draft.priority;
        let task = task.clone();
        debug!(%id, "task updated");
        self.persist().await?;
        Ok(task)
    }

    pub async fn toggle_completed(&mut self, id: TaskId, completed: bool) -> TaskResult<Task> {
        let index = self.position(id).ok_or(TaskError::NotFound(id))?;
        self.tasks[index].completed = completed;
        let task = self.tasks[index].clone();
        debug!(%id, completed, "task completion changed");
        self.persist().await?;
        Ok(task)
    }

    /// Remove a task. An unknown id is a no-op and returns `false`.
    pub async fn delete(&mut self, id: TaskId) -> TaskResult<bool> {
        let Some(index) = self.position(id) else { return Ok(false) };
        self.tasks.remove(index);
        debug!(%id, "task deleted");
        self.persist().await?;
        Ok(true)
    }

    /// Remove every completed task, returning how many were removed.
    pub async fn clear_completed(&mut self) -> TaskResult<usize> {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.completed);
        let removed = before - self.tasks.len();
        if removed == 0 {
            return Ok(0);
        }
        debug!(removed, "completed tasks cleared");
        self.persist().await?;
        Ok(removed)
    }

    fn position(&self, id: TaskId) -> Option<usize> { self.tasks.iter().position(|t| t.id == id) }

    /// Millisecond timestamp, bumped past every id issued or loaded so far.
    fn next_id(&mut self) -> TaskResult<TaskId> {
        let bumped = self.last_id.checked_add(1).ok_or(TaskError::IdsExhausted(TaskId(self.last_id)))?;
        self.last_id = Utc::now().timestamp_millis().max(bumped);
        Ok(TaskId(self.last_id))
    }

    async fn persist(&self) -> TaskResult<()> {
        let payload = serde_json::to_string(&self.tasks)
            .map_err(|e| TaskError::Persistence(StorageError::Backend(e.to_string())))?;
        match self.storage.set(TASKS_KEY, &payload).await {
            Ok(()) => {
                debug!(count = self.tasks.len(), "tasks persisted");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "failed to persist tasks");
                Err(TaskError::Persistence(err))
            }
        }
    }
}

/// Keep the first task for each id; later duplicates are dropped.
fn dedup_ids(tasks: Vec<Task>) -> Vec<Task> {
    let before = tasks.len();
    let mut seen = HashSet::new();
    let tasks: Vec<Task> = tasks.into_iter().filter(|t| seen.insert(t.id)).collect();
    let dropped = before - tasks.len();
    if dropped > 0 {
        warn!(dropped, "stored tasks contain duplicate ids, keeping the first of each");
    }
    tasks
}
