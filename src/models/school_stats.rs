// src/models/school_stats.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::scope::AssignmentStatus;

/// Represents the 'school_stats' table. One row per calendar day.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct SchoolStats {
    pub date: NaiveDate,
    pub total_students: i64,
    pub total_teachers: i64,
    pub total_admins: i64,
    pub total_classes: i64,
    pub total_assignments: i64,
    pub active_assignments: i64,
    pub scheduled_assignments: i64,
    pub average_completion_rate: f64,
    pub average_score: f64,
    /// Students with activity in the trailing 24 hours.
    pub daily_active_students: i64,
    pub daily_active_teachers: i64,
    pub students_needing_help: i64,
    pub last_updated: DateTime<Utc>,
}

impl SchoolStats {
    /// Same-day bump for a newly created assignment.
    pub fn add_assignment(&mut self, status: AssignmentStatus, now: DateTime<Utc>) {
        self.total_assignments += 1;
        match status {
            AssignmentStatus::Active => self.active_assignments += 1,
            AssignmentStatus::Scheduled => self.scheduled_assignments += 1,
            AssignmentStatus::Closed => {}
        }
        self.last_updated = now;
    }
}
