//! Error handling

use axum::{
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

use crate::logic::ExplainError;
use crate::models::InputError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Input errors
    ValidationError(String),
    MalformedBody(String),

    // Prediction errors
    PredictionFailed(String),
    Timeout,

    // Generic errors
    InternalError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::MalformedBody(_)
            | AppError::PredictionFailed(_) => StatusCode::BAD_REQUEST,
            AppError::Timeout => StatusCode::REQUEST_TIMEOUT,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the client
    pub fn message(&self) -> String {
        match self {
            AppError::ValidationError(msg) => msg.clone(),
            AppError::MalformedBody(msg) => format!("Malformed request body: {}", msg),
            AppError::PredictionFailed(msg) => msg.clone(),
            AppError::Timeout => "Prediction timed out".to_string(),
            AppError::InternalError(_) => "Internal server error".to_string(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::InternalError(msg) => tracing::error!("Internal error: {}", msg),
            AppError::Timeout => tracing::warn!("Prediction timed out"),
            other => tracing::debug!("Request rejected: {}", other.message()),
        }

        let body = Json(json!({
            "error": self.message(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<InputError> for AppError {
    fn from(err: InputError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<ExplainError> for AppError {
    fn from(err: ExplainError) -> Self {
        AppError::PredictionFailed(err.to_string())
    }
}

impl From<minijinja::Error> for AppError {
    fn from(err: minijinja::Error) -> Self {
        AppError::InternalError(format!("page rendering failed: {}", err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedBody(rejection.body_text())
    }
}
