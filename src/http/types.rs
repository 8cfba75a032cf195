use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::application::confirm::ConfirmRequest;
use crate::domain::error::TaskError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    /// Set when the request needs `?confirm=true` to proceed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, body: ErrorBody { message: message.into(), confirm: None } }
    }

    pub fn bad_request(message: impl Into<String>) -> Self { Self::new(StatusCode::BAD_REQUEST, message) }

    pub fn confirmation_required(request: &ConfirmRequest) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            body: ErrorBody { message: "confirmation required".into(), confirm: Some(request.prompt().to_string()) },
        }
    }
}

impl From<TaskError> for ApiError {
    fn from(err: TaskError) -> Self {
        let status = match &err {
            TaskError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            TaskError::NotFound(_) => StatusCode::NOT_FOUND,
            TaskError::Persistence(_) => StatusCode::INSUFFICIENT_STORAGE,
            TaskError::IdsExhausted(_) | TaskError::Load(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response { (self.status, axum::Json(self.body)).into_response() }
}
