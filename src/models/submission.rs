// src/models/submission.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A student's answer to one question, as recorded by the submission workflow.
/// The fact row is already stored when this event arrives.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SubmissionEvent {
    #[validate(range(min = 1))]
    pub student_id: i64,
    #[validate(range(min = 1))]
    pub assignment_id: i64,
    #[validate(range(min = 1))]
    pub question_id: i64,
    pub is_complete: bool,
    pub is_correct: bool,
    /// False when the student re-saves an answer that was already counted.
    #[serde(default = "default_true")]
    pub is_new_submission: bool,
}

fn default_true() -> bool {
    true
}

impl SubmissionEvent {
    /// Only completed, first-time answers move the answer counters.
    pub fn counts_as_new_answer(&self) -> bool {
        self.is_complete && self.is_new_submission
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateOutcome {
    Applied,
    /// The owning entity no longer exists.
    Skipped,
    /// The transaction rolled back; the rollup is stale until reconciled.
    Failed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub assignment: UpdateOutcome,
    pub student: UpdateOutcome,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignmentCreatedOutcome {
    pub seeded: bool,
    pub students_incremented: usize,
    pub classes_incremented: usize,
}

/// Query string for the school trend endpoint.
#[derive(Debug, Deserialize, Validate)]
pub struct TrendQuery {
    #[validate(range(min = 1, max = 366))]
    pub days: Option<u32>,
}
