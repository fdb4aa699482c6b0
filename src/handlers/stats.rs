// src/handlers/stats.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::NaiveDate;
use validator::Validate;

use crate::{error::AppError, models::submission::TrendQuery, services::StatsEngine};

const DEFAULT_TREND_DAYS: u32 = 7;

pub async fn get_assignment_stats(
    State(engine): State<StatsEngine>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let stats = engine
        .assignment_stats(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No statistics for assignment {}", id)))?;

    Ok(Json(stats))
}

pub async fn get_student_stats(
    State(engine): State<StatsEngine>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let stats = engine
        .student_stats(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No statistics for student {}", id)))?;

    Ok(Json(stats))
}

pub async fn get_class_stats(
    State(engine): State<StatsEngine>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let stats = engine
        .class_stats(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No statistics for class {}", id)))?;

    Ok(Json(stats))
}

/// Recomputes a class rollup on demand (e.g. right before a dashboard read).
pub async fn refresh_class_stats(
    State(engine): State<StatsEngine>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let stats = engine
        .update_class_statistics(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Class {} not found", id)))?;

    Ok(Json(stats))
}

pub async fn get_teacher_stats(
    State(engine): State<StatsEngine>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let stats = engine
        .teacher_stats(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No statistics for teacher {}", id)))?;

    Ok(Json(stats))
}

pub async fn refresh_teacher_stats(
    State(engine): State<StatsEngine>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let stats = engine
        .update_teacher_statistics(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Teacher {} not found", id)))?;

    Ok(Json(stats))
}

/// Path date is `YYYY-MM-DD`.
pub async fn get_school_stats(
    State(engine): State<StatsEngine>,
    Path(date): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("Invalid date '{}', expected YYYY-MM-DD", date)))?;

    let stats = engine
        .school_stats(date)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No school snapshot for {}", date)))?;

    Ok(Json(stats))
}

pub async fn get_school_trend(
    State(engine): State<StatsEngine>,
    Query(query): Query<TrendQuery>,
) -> Result<impl IntoResponse, AppError> {
    query.validate()?;

    let trend = engine
        .school_trend(query.days.unwrap_or(DEFAULT_TREND_DAYS))
        .await?;

    Ok(Json(trend))
}

/// Recomputes today's school snapshot.
pub async fn refresh_school_stats(State(engine): State<StatsEngine>) -> Result<impl IntoResponse, AppError> {
    let today = engine.now().date_naive();
    let stats = engine.update_school_statistics(today).await?;

    Ok(Json(stats))
}
