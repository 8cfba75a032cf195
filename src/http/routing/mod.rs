pub mod tasks;
pub mod theme;

use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::sync::Mutex;

use crate::application::{board::TaskBoard, preferences::ThemePreference};
use crate::domain::storage::KeyValueStorage;

/// Shared server state. Each lock is held for the whole of one request, so
/// a mutation, its persist and the response are never interleaved.
pub struct AppState<S: KeyValueStorage> {
    pub board: Arc<Mutex<TaskBoard<S>>>,
    pub theme: Arc<Mutex<ThemePreference<S>>>,
}

impl<S: KeyValueStorage> AppState<S> {
    pub fn new(board: TaskBoard<S>, theme: ThemePreference<S>) -> Self {
        Self { board: Arc::new(Mutex::new(board)), theme: Arc::new(Mutex::new(theme)) }
    }
}

impl<S: KeyValueStorage> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self { board: Arc::clone(&self.board), theme: Arc::clone(&self.theme) }
    }
}

pub fn app<S: KeyValueStorage>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(tasks::router(state.clone()))
        .merge(theme::router(state))
}
