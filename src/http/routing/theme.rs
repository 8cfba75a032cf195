use axum::extract::State;
use axum::{routing::{get, post}, Json, Router};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::application::preferences::Theme;
use crate::domain::storage::KeyValueStorage;
use crate::http::types::ApiError;

pub fn router<S: KeyValueStorage>(state: AppState<S>) -> Router {
    Router::new()
        .route("/theme", get(get_theme::<S>).put(set_theme::<S>))
        .route("/theme/toggle", post(toggle_theme::<S>))
        .with_state(state)
}

#[derive(Debug, Serialize, Deserialize)]
struct ThemeBody {
    theme: Theme,
}

async fn get_theme<S: KeyValueStorage>(State(state): State<AppState<S>>) -> Json<ThemeBody> {
    Json(ThemeBody { theme: state.theme.lock().await.theme() })
}

async fn set_theme<S: KeyValueStorage>(State(state): State<AppState<S>>, Json(body): Json<ThemeBody>) -> Result<Json<ThemeBody>, ApiError> {
    let theme = state.theme.lock().await.set(body.theme).await.map_err(storage_error)?;
    Ok(Json(ThemeBody { theme }))
}

async fn toggle_theme<S: KeyValueStorage>(State(state): State<AppState<S>>) -> Result<Json<ThemeBody>, ApiError> {
    let theme = state.theme.lock().await.toggle().await.map_err(storage_error)?;
    Ok(Json(ThemeBody { theme }))
}

fn storage_error<E: std::fmt::Display>(e: E) -> ApiError {
    ApiError::new(axum::http::StatusCode::INSUFFICIENT_STORAGE, format!("failed to save theme: {e}"))
}
