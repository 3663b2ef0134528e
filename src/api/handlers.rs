use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::{HealthResponse, SpeakRequest};
use crate::analysis::{AnalysisResult, ChangeRecord};
use crate::api::routes::AppState;
use crate::error::AppError;

pub async fn analyze(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Vec<ChangeRecord>>, JsonRejection>,
) -> Result<Json<Vec<AnalysisResult>>, AppError> {
    let Json(changes) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    if changes.is_empty() {
        return Err(AppError::BadRequest("changes list cannot be empty".into()));
    }

    let results = state.analysis.analyze(&changes).await?;
    Ok(Json(results))
}

pub async fn speak(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SpeakRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    if request.text.trim().is_empty() {
        return Err(AppError::BadRequest("text cannot be empty".into()));
    }

    let audio = state
        .speech
        .synthesize(&request.text, request.voice_id.as_deref())
        .await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "audio/mpeg")],
        Body::from_stream(audio),
    )
        .into_response())
}

pub async fn banner() -> &'static str {
    "Flight brief server: POST /analyze for leg change summaries, POST /speak for audio"
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
