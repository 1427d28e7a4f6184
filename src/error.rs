use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    /// No JSON object could be isolated from the model output
    #[error("Failed to parse AI response")]
    Extraction { raw_text: String },

    /// JSON parsed, but mandatory fields are absent
    #[error("AI response missing required fields: {}", .missing.join(", "))]
    Validation {
        missing: Vec<&'static str>,
        raw_text: String,
    },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Enrichment error: {0}")]
    Enrichment(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                json!({ "error": self.to_string() }),
            ),
            AppError::Extraction { raw_text } | AppError::Validation { raw_text, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "success": false,
                    "error": self.to_string(),
                    "rawText": raw_text,
                }),
            ),
            AppError::HttpClient(_) | AppError::Upstream(_) | AppError::Enrichment(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "success": false,
                    "error": "Internal server error",
                    "message": self.to_string(),
                }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
