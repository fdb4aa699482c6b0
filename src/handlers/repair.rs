// src/handlers/repair.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;

use crate::{error::AppError, services::StatsEngine, utils::jwt::Claims};

/// Lists rollup rows that fail their consistency checks.
/// Admin only.
pub async fn audit(State(engine): State<StatsEngine>) -> Result<impl IntoResponse, AppError> {
    let violations = engine.audit_rollups().await?;

    Ok(Json(json!({
        "count": violations.len(),
        "violations": violations,
    })))
}

/// Audits and rebuilds every failing row.
/// Admin only.
pub async fn repair_all(
    State(engine): State<StatsEngine>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!("Rollup repair requested by user {}", claims.sub);

    let report = engine.repair_rollups().await?;

    Ok(Json(report))
}

/// Admin only.
pub async fn recalculate_assignment(
    State(engine): State<StatsEngine>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let stats = engine
        .recalculate_assignment_statistics(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Assignment {} not found", id)))?;

    Ok(Json(stats))
}

/// Admin only.
pub async fn recalculate_student(
    State(engine): State<StatsEngine>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let stats = engine
        .recalculate_student_statistics(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Student {} not found", id)))?;

    Ok(Json(stats))
}
