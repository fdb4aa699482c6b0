// src/models/student_stats.rs

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{
    models::{
        audit::{Partition, check_rollup},
        scope::{AnswerTally, ProgressStatus},
    },
    utils::math::{mean, percentage},
};

/// Students below either threshold are flagged as needing help.
pub const HELP_COMPLETION_THRESHOLD: f64 = 50.0;
pub const HELP_ACCURACY_THRESHOLD: f64 = 60.0;

/// Represents the 'student_stats' table.
/// One rollup per student, counting assignments by progress bucket.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct StudentStats {
    pub student_id: i64,

    /// Assignments in scope, including ones not yet published.
    pub total_assignments: i64,
    pub completed_assignments: i64,
    pub in_progress_assignments: i64,
    pub not_started_assignments: i64,

    /// Equal-weight mean of per-assignment accuracy over completed assignments.
    pub average_score: f64,

    pub total_questions: i64,
    pub total_answers: i64,
    pub total_correct_answers: i64,
    pub accuracy_rate: f64,
    pub completion_rate: f64,

    pub last_activity_date: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
}

impl StudentStats {
    pub fn seeded(
        student_id: i64,
        total_assignments: i64,
        total_questions: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            student_id,
            total_assignments,
            completed_assignments: 0,
            in_progress_assignments: 0,
            not_started_assignments: total_assignments,
            average_score: 0.0,
            total_questions,
            total_answers: 0,
            total_correct_answers: 0,
            accuracy_rate: 0.0,
            completion_rate: 0.0,
            last_activity_date: None,
            last_updated: now,
        }
    }

    pub fn record_answer(&mut self, is_correct: bool) {
        self.total_answers += 1;
        if is_correct {
            self.total_correct_answers += 1;
        }
    }

    /// Moves one assignment between buckets. The bucket sum is unchanged.
    pub fn shift(&mut self, from: ProgressStatus, to: ProgressStatus) {
        if from == to {
            return;
        }
        *self.bucket_mut(from) -= 1;
        *self.bucket_mut(to) += 1;
    }

    fn bucket_mut(&mut self, status: ProgressStatus) -> &mut i64 {
        match status {
            ProgressStatus::NotStarted => &mut self.not_started_assignments,
            ProgressStatus::InProgress => &mut self.in_progress_assignments,
            ProgressStatus::Completed => &mut self.completed_assignments,
        }
    }

    /// A newly created assignment enters the not-started bucket.
    pub fn add_assignment(&mut self, question_count: i64) {
        self.total_assignments += 1;
        self.not_started_assignments += 1;
        self.total_questions += question_count;
        self.completion_rate = percentage(self.completed_assignments, self.total_assignments);
    }

    /// Recomputes rates. `question_counts` holds the student's in-scope
    /// assignments; tallies for anything else are ignored.
    pub fn refresh_rates(&mut self, tallies: &[AnswerTally], question_counts: &HashMap<i64, i64>) {
        self.completion_rate = percentage(self.completed_assignments, self.total_assignments);
        self.accuracy_rate = percentage(self.total_correct_answers, self.total_answers);
        self.average_score = mean(
            tallies
                .iter()
                .filter(|t| {
                    question_counts
                        .get(&t.assignment_id)
                        .is_some_and(|&q| t.status(q) == ProgressStatus::Completed)
                })
                .map(AnswerTally::accuracy),
        );
    }

    /// Only students with assigned work can be flagged.
    pub fn needs_help(&self) -> bool {
        self.total_assignments > 0
            && (self.completion_rate < HELP_COMPLETION_THRESHOLD
                || self.accuracy_rate < HELP_ACCURACY_THRESHOLD)
    }

    pub fn active_since(&self, since: DateTime<Utc>) -> bool {
        self.last_activity_date.is_some_and(|at| at >= since)
    }

    pub fn active_within(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.active_since(now - window)
    }

    pub fn problems(&self) -> Vec<String> {
        check_rollup(
            Partition {
                total: self.total_assignments,
                completed: self.completed_assignments,
                in_progress: self.in_progress_assignments,
                not_started: self.not_started_assignments,
            },
            &[
                ("completion_rate", self.completion_rate),
                ("accuracy_rate", self.accuracy_rate),
                ("average_score", self.average_score),
            ],
        )
    }
}
