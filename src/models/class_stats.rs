// src/models/class_stats.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'class_stats_detailed' table.
/// Rebuilt from the members' StudentStats, never from raw answers.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ClassStatsDetailed {
    pub class_id: i64,
    pub total_students: i64,
    pub total_assignments: i64,
    pub average_completion: f64,
    pub average_score: f64,
    pub total_questions: i64,
    pub total_answers: i64,
    pub total_correct_answers: i64,
    pub accuracy_rate: f64,
    /// Members with activity in the trailing 7 days.
    pub active_students: i64,
    pub students_needing_help: i64,
    pub last_activity_date: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
}

/// Read-only view of a class row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct ClassInfo {
    pub id: i64,
    pub teacher_id: i64,
}
