use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::analysis::ModelError;
use crate::speech::SpeechError;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Model invocation failed: {0}")]
    Model(#[from] ModelError),

    #[error("Speech synthesis failed: {0}")]
    Speech(#[from] SpeechError),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::Model(e) => (StatusCode::BAD_GATEWAY, "MODEL_ERROR", e.to_string()),
            AppError::Speech(e) => (StatusCode::BAD_GATEWAY, "SPEECH_ERROR", e.to_string()),
        };

        tracing::error!("Request failed: {} - {}", code, message);

        (
            status,
            Json(ErrorResponse {
                error: message,
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}
