// src/models/assignment_stats.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{
    models::{
        audit::{Partition, check_rollup},
        scope::{AnswerTally, ProgressStatus},
    },
    utils::math::{mean, percentage},
};

/// Represents the 'assignment_stats' table.
/// One rollup per assignment, counting students by progress bucket.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct AssignmentStats {
    pub assignment_id: i64,

    /// Students in scope when the row was seeded (class members ∪ individual).
    pub total_students: i64,
    pub total_questions: i64,

    pub completed_students: i64,
    pub in_progress_students: i64,
    pub not_started_students: i64,

    pub completion_rate: f64,

    /// Mean accuracy over students who answered every question.
    pub average_score: f64,

    pub total_answers: i64,
    pub total_correct_answers: i64,
    pub accuracy_rate: f64,

    pub last_updated: DateTime<Utc>,
}

impl AssignmentStats {
    /// Fresh row where every in-scope student has not started.
    pub fn seeded(
        assignment_id: i64,
        total_students: i64,
        total_questions: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            assignment_id,
            total_students,
            total_questions,
            completed_students: 0,
            in_progress_students: 0,
            not_started_students: total_students,
            completion_rate: 0.0,
            average_score: 0.0,
            total_answers: 0,
            total_correct_answers: 0,
            accuracy_rate: 0.0,
            last_updated: now,
        }
    }

    pub fn record_answer(&mut self, is_correct: bool) {
        self.total_answers += 1;
        if is_correct {
            self.total_correct_answers += 1;
        }
    }

    /// Moves one student between buckets. The bucket sum is unchanged.
    pub fn shift(&mut self, from: ProgressStatus, to: ProgressStatus) {
        if from == to {
            return;
        }
        *self.bucket_mut(from) -= 1;
        *self.bucket_mut(to) += 1;
    }

    fn bucket_mut(&mut self, status: ProgressStatus) -> &mut i64 {
        match status {
            ProgressStatus::NotStarted => &mut self.not_started_students,
            ProgressStatus::InProgress => &mut self.in_progress_students,
            ProgressStatus::Completed => &mut self.completed_students,
        }
    }

    /// Recomputes the derived rates from the counters and the assignment's tallies.
    pub fn refresh_rates(&mut self, tallies: &[AnswerTally]) {
        self.completion_rate = percentage(self.completed_students, self.total_students);
        self.accuracy_rate = percentage(self.total_correct_answers, self.total_answers);
        self.average_score = mean(
            tallies
                .iter()
                .filter(|t| t.status(self.total_questions) == ProgressStatus::Completed)
                .map(AnswerTally::accuracy),
        );
    }

    pub fn problems(&self) -> Vec<String> {
        check_rollup(
            Partition {
                total: self.total_students,
                completed: self.completed_students,
                in_progress: self.in_progress_students,
                not_started: self.not_started_students,
            },
            &[
                ("completion_rate", self.completion_rate),
                ("accuracy_rate", self.accuracy_rate),
                ("average_score", self.average_score),
            ],
        )
    }
}
