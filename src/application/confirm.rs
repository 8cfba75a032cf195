use crate::domain::task::TaskId;

/// A destructive operation waiting for the user's approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmRequest {
    DeleteTask { id: TaskId, title: String },
    ClearCompleted { count: usize },
}

impl ConfirmRequest {
    pub fn prompt(&self) -> &'static str {
        match self {
            ConfirmRequest::DeleteTask { .. } => "Are you sure you want to delete this task?",
            ConfirmRequest::ClearCompleted { .. } => "This will remove all completed tasks. Continue?",
        }
    }
}

/// Injected approval capability for destructive operations.
pub trait Confirm {
    fn confirm(&mut self, request: &ConfirmRequest) -> bool;
}

impl<F: FnMut(&ConfirmRequest) -> bool> Confirm for F {
    fn confirm(&mut self, request: &ConfirmRequest) -> bool { self(request) }
}

/// An answer collected ahead of time, for two-phase callers that ask the
/// user first and then issue the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Answer(pub bool);

impl Confirm for Answer {
    fn confirm(&mut self, _request: &ConfirmRequest) -> bool { self.0 }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmed<T> {
    Applied(T),
    Declined,
}
