// src/models/teacher_stats.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'teacher_stats' table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct TeacherStats {
    pub teacher_id: i64,
    pub total_assignments: i64,
    pub total_classes: i64,
    /// Distinct students across the teacher's classes.
    pub total_students: i64,
    pub average_class_completion: f64,
    pub average_class_score: f64,
    pub active_assignments: i64,
    pub scheduled_assignments: i64,
    pub last_updated: DateTime<Utc>,
}
