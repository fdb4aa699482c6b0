// src/handlers/events.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{error::AppError, models::submission::SubmissionEvent, services::StatsEngine};

/// Receives a submission event from the answer workflow.
///
/// * The answer row is already stored; this only maintains the rollups.
/// * Always 202 once the event is valid: updater failures are reported in the
///   body and logged, never surfaced as request errors.
pub async fn record_submission(
    State(engine): State<StatsEngine>,
    Json(event): Json<SubmissionEvent>,
) -> Result<impl IntoResponse, AppError> {
    event.validate()?;

    let outcome = engine.process_submission(&event).await;

    Ok((StatusCode::ACCEPTED, Json(outcome)))
}

/// Receives an "assignment created" notification from the assignment workflow.
pub async fn assignment_created(
    State(engine): State<StatsEngine>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = engine.on_assignment_created(id).await.map_err(|e| {
        tracing::error!("Failed to register assignment {}: {}", id, e);
        e
    })?;

    Ok((StatusCode::ACCEPTED, Json(outcome)))
}
