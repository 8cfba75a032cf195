use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{routing::{post, put}, Json, Router};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::application::confirm::{ConfirmRequest, Confirmed};
use crate::domain::storage::KeyValueStorage;
use crate::domain::task::{Task, TaskDraft, TaskId};
use crate::domain::view::{project, Projection, SortOption, StatusFilter, ViewQuery};
use crate::http::types::ApiError;

pub fn router<S: KeyValueStorage>(state: AppState<S>) -> Router {
    Router::new()
        .route("/tasks", post(create_task::<S>).get(list_tasks::<S>))
        .route("/tasks/clear-completed", post(clear_completed::<S>))
        .route("/tasks/:id", put(update_task::<S>).delete(delete_task::<S>))
        .route("/tasks/:id/completed", put(set_completed::<S>))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    filter: Option<String>,
    q: Option<String>,
    sort: Option<String>,
}

impl ListParams {
    fn into_view(self) -> Result<ViewQuery, ApiError> {
        let filter = match self.filter.as_deref() {
            Some(raw) => raw.parse::<StatusFilter>().map_err(|e| ApiError::bad_request(e.to_string()))?,
            None => StatusFilter::All,
        };
        let sort = match self.sort.as_deref() {
            Some(raw) => raw.parse::<SortOption>().map_err(|e| ApiError::bad_request(e.to_string()))?,
            None => SortOption::None,
        };
        Ok(ViewQuery::new(filter, self.q.unwrap_or_default(), sort))
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfirmParams {
    #[serde(default)]
    confirm: bool,
}

#[derive(Deserialize)]
struct CompletedBody {
    completed: bool,
}

#[derive(Serialize)]
struct ClearedBody {
    removed: usize,
}

async fn list_tasks<S: KeyValueStorage>(State(state): State<AppState<S>>, Query(params): Query<ListParams>) -> Result<Json<Projection>, ApiError> {
    let view = params.into_view()?;
    let board = state.board.lock().await;
    Ok(Json(project(board.store().list(), &view)))
}

async fn create_task<S: KeyValueStorage>(State(state): State<AppState<S>>, Json(draft): Json<TaskDraft>) -> Result<(StatusCode, Json<Task>), ApiError> {
    let mut board = state.board.lock().await;
    let task = board.create(draft).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task<S: KeyValueStorage>(State(state): State<AppState<S>>, Path(id): Path<i64>, Json(draft): Json<TaskDraft>) -> Result<Json<Task>, ApiError> {
    let mut board = state.board.lock().await;
    let task = board.update(TaskId(id), draft).await?;
    Ok(Json(task))
}

async fn set_completed<S: KeyValueStorage>(State(state): State<AppState<S>>, Path(id): Path<i64>, Json(body): Json<CompletedBody>) -> Result<Json<Task>, ApiError> {
    let mut board = state.board.lock().await;
    let task = board.toggle(TaskId(id), body.completed).await?;
    Ok(Json(task))
}

async fn delete_task<S: KeyValueStorage>(State(state): State<AppState<S>>, Path(id): Path<i64>, Query(params): Query<ConfirmParams>) -> Result<StatusCode, ApiError> {
    let mut board = state.board.lock().await;
    let mut asked: Option<ConfirmRequest> = None;
    let outcome = board
        .delete(TaskId(id), &mut |request: &ConfirmRequest| {
            asked = Some(request.clone());
            params.confirm
        })
        .await?;
    match (outcome, asked) {
        (Confirmed::Declined, Some(request)) => Err(ApiError::confirmation_required(&request)),
        _ => Ok(StatusCode::NO_CONTENT),
    }
}

async fn clear_completed<S: KeyValueStorage>(State(state): State<AppState<S>>, Query(params): Query<ConfirmParams>) -> Result<Json<ClearedBody>, ApiError> {
    let mut board = state.board.lock().await;
    let mut asked: Option<ConfirmRequest> = None;
    let outcome = board
        .clear_completed(&mut |request: &ConfirmRequest| {
            asked = Some(request.clone());
            params.confirm
        })
        .await?;
    match (outcome, asked) {
        (Confirmed::Applied(removed), _) => Ok(Json(ClearedBody { removed })),
        (Confirmed::Declined, Some(request)) => Err(ApiError::confirmation_required(&request)),
        (Confirmed::Declined, None) => Ok(Json(ClearedBody { removed: 0 })),
    }
}
