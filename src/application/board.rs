use crate::application::confirm::{Confirm, ConfirmRequest, Confirmed};
use crate::application::task_store::TaskStore;
use crate::domain::error::{TaskError, TaskResult};
use crate::domain::storage::KeyValueStorage;
use crate::domain::task::{Task, TaskDraft, TaskId};
use crate::domain::view::{project, Projection, SortOption, StatusFilter, TaskCounts, ViewQuery};

/// Everything a renderer needs for one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub projection: Projection,
    pub can_clear_completed: bool,
    pub editing: Option<TaskId>,
}

impl Frame {
    pub fn submit_label(&self) -> &'static str {
        if self.editing.is_some() { "Save Changes" } else { "Add Task" }
    }
}

/// One user session over a [`TaskStore`]: view parameters plus the
/// edit-in-progress state, translating user commands into store calls.
pub struct TaskBoard<S: KeyValueStorage> {
    store: TaskStore<S>,
    view: ViewQuery,
    editing: Option<TaskId>,
}

impl<S: KeyValueStorage> TaskBoard<S> {
    pub fn new(store: TaskStore<S>) -> Self {
        Self { store, view: ViewQuery::default(), editing: None }
    }

    pub fn store(&self) -> &TaskStore<S> { &self.store }

    pub fn view(&self) -> &ViewQuery { &self.view }

    pub fn editing(&self) -> Option<TaskId> { self.editing }

    pub fn render(&self) -> Frame {
        let projection = project(self.store.list(), &self.view);
        Frame {
            can_clear_completed: projection.counts.completed > 0,
            projection,
            editing: self.editing,
        }
    }

    pub fn set_filter(&mut self, filter: StatusFilter) { self.view.filter = filter; }

    pub fn set_query(&mut self, query: impl Into<String>) { self.view.query = query.into(); }

    pub fn set_sort(&mut self, sort: SortOption) { self.view.sort = sort; }

    /// Enter edit mode for `id`, returning the fields to pre-fill.
    pub fn begin_edit(&mut self, id: TaskId) -> Option<TaskDraft> {
        let draft = self.store.get(id).map(TaskDraft::from)?;
        self.editing = Some(id);
        Some(draft)
    }

    pub fn cancel_edit(&mut self) { self.editing = None; }

    /// Save the form: update the task being edited, or create a new one.
    pub async fn submit(&mut self, draft: TaskDraft) -> TaskResult<Task> {
        let result = match self.editing {
            Some(id) => self.store.update(id, draft).await,
            None => self.store.create(draft).await,
        };
        // A rejected title keeps the form as it is; anything else ends the edit.
        if !matches!(result, Err(TaskError::Validation(_))) {
            self.editing = None;
        }
        result
    }

    /// Create directly, outside of any edit session.
    pub async fn create(&mut self, draft: TaskDraft) -> TaskResult<Task> { self.store.create(draft).await }

    /// Update a specific task, outside of any edit session.
    pub async fn update(&mut self, id: TaskId, draft: TaskDraft) -> TaskResult<Task> { self.store.update(id, draft).await }

    pub async fn toggle(&mut self, id: TaskId, completed: bool) -> TaskResult<Task> {
        self.store.toggle_completed(id, completed).await
    }

    pub async fn delete(&mut self, id: TaskId, confirm: &mut impl Confirm) -> TaskResult<Confirmed<bool>> {
        let Some(task) = self.store.get(id) else { return Ok(Confirmed::Applied(false)) };
        let request = ConfirmRequest::DeleteTask { id, title: task.title.clone() };
        if !confirm.confirm(&request) {
            return Ok(Confirmed::Declined);
        }
        if self.editing == Some(id) {
            self.editing = None;
        }
        self.store.delete(id).await.map(Confirmed::Applied)
    }

    pub async fn clear_completed(&mut self, confirm: &mut impl Confirm) -> TaskResult<Confirmed<usize>> {
        let count = TaskCounts::of(self.store.list()).completed;
        if count == 0 {
            return Ok(Confirmed::Applied(0));
        }
        if !confirm.confirm(&ConfirmRequest::ClearCompleted { count }) {
            return Ok(Confirmed::Declined);
        }
        if let Some(id) = self.editing {
            if self.store.get(id).is_some_and(|t| t.completed) {
                self.editing = None;
            }
        }
        self.store.clear_completed().await.map(Confirmed::Applied)
    }
}
