use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::controller::ActionKind;
use crate::remote::{Operation, ServiceError};

/// Application-level error type.
/// Controller operations return it; handlers turn it into a notice or, for
/// request-level failures, into a JSON response via `IntoResponse`.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad local input. Never reaches the network.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The session lacks something an action depends on.
    #[error("Missing context: {0}")]
    MissingContext(String),

    #[error("Action already in progress: {0}")]
    Busy(ActionKind),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Template error: {0}")]
    Render(#[from] askama::Error),
}

impl AppError {
    /// Text shown to the user in the notice banner.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::MissingContext(msg) => msg.clone(),
            AppError::Busy(action) => {
                format!("Please wait: {action} is already in progress")
            }
            AppError::BadRequest(msg) => msg.clone(),
            AppError::Service(e) => service_message(e),
            AppError::Render(_) => "An unexpected error occurred".to_string(),
        }
    }

    /// Logs at a level matching the failure. Local input problems are not
    /// worth more than a warning.
    pub fn log(&self) {
        match self {
            AppError::Validation(_) | AppError::MissingContext(_) | AppError::Busy(_) => {
                tracing::warn!("{self}")
            }
            AppError::BadRequest(msg) => tracing::warn!("Bad request: {msg}"),
            AppError::Service(e) => {
                tracing::error!(operation = %e.operation(), status = ?e.status(), "{e}")
            }
            AppError::Render(e) => tracing::error!("Template render failed: {e}"),
        }
    }
}

fn service_message(e: &ServiceError) -> String {
    if let ServiceError::Timeout { operation, .. } = e {
        return match operation {
            Operation::Upload | Operation::Analyze => {
                "Request timed out. Please try again with a smaller PDF file.".to_string()
            }
            Operation::GenerateQuestions => {
                "Question generation timed out. Using default questions.".to_string()
            }
            Operation::GenerateResume | Operation::FetchResume => {
                "Request timed out. Please try again with shorter answers.".to_string()
            }
        };
    }

    let prefix = match e.operation() {
        Operation::Upload | Operation::Analyze => "Error analyzing resume",
        Operation::GenerateQuestions => "Error generating questions",
        Operation::GenerateResume | Operation::FetchResume => "Error generating resume",
    };
    format!("{prefix}: {}", e.user_detail())
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();

        let (status, code) = match &self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::MissingContext(_) => (StatusCode::CONFLICT, "MISSING_CONTEXT"),
            AppError::Busy(_) => (StatusCode::CONFLICT, "BUSY"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::Service(_) => (StatusCode::BAD_GATEWAY, "SERVICE_ERROR"),
            AppError::Render(_) => (StatusCode::INTERNAL_SERVER_ERROR, "RENDER_ERROR"),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.user_message()
            }
        }));

        (status, body).into_response()
    }
}
