// src/models/scope.rs

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::utils::math::raw_percentage;

/// Which bucket an (assignment, student) pair is counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl ProgressStatus {
    /// Derives the status from the fact store's completed-question count.
    ///
    /// An assignment without questions can never be completed.
    pub fn classify(completed_questions: i64, total_questions: i64) -> Self {
        if total_questions > 0 && completed_questions >= total_questions {
            ProgressStatus::Completed
        } else if completed_questions >= 1 {
            ProgressStatus::InProgress
        } else {
            ProgressStatus::NotStarted
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::NotStarted => "not_started",
            ProgressStatus::InProgress => "in_progress",
            ProgressStatus::Completed => "completed",
        }
    }

    /// Unknown values read back as `NotStarted`, the same as a missing mark.
    pub fn parse(value: &str) -> Self {
        match value {
            "in_progress" => ProgressStatus::InProgress,
            "completed" => ProgressStatus::Completed,
            _ => ProgressStatus::NotStarted,
        }
    }
}

/// Who an assignment is handed out to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssignmentAudience {
    ClassBased { class_ids: Vec<i64> },
    Individual { student_ids: Vec<i64> },
    Mixed {
        class_ids: Vec<i64>,
        student_ids: Vec<i64>,
    },
}

impl AssignmentAudience {
    /// Builds the audience from the assignment's class links and individual links.
    pub fn from_links(class_ids: Vec<i64>, student_ids: Vec<i64>) -> Self {
        match (class_ids.is_empty(), student_ids.is_empty()) {
            (false, true) => AssignmentAudience::ClassBased { class_ids },
            (true, _) => AssignmentAudience::Individual { student_ids },
            (false, false) => AssignmentAudience::Mixed {
                class_ids,
                student_ids,
            },
        }
    }

    pub fn class_ids(&self) -> &[i64] {
        match self {
            AssignmentAudience::ClassBased { class_ids }
            | AssignmentAudience::Mixed { class_ids, .. } => class_ids,
            AssignmentAudience::Individual { .. } => &[],
        }
    }

    /// Unions the members of the linked classes with the individually assigned
    /// students into one deduplicated set.
    pub fn resolve(&self, class_members: &[i64]) -> BTreeSet<i64> {
        match self {
            AssignmentAudience::ClassBased { .. } => class_members.iter().copied().collect(),
            AssignmentAudience::Individual { student_ids } => student_ids.iter().copied().collect(),
            AssignmentAudience::Mixed { student_ids, .. } => class_members
                .iter()
                .chain(student_ids.iter())
                .copied()
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Scheduled,
    Active,
    Closed,
}

/// Read-only view of an assignment row plus its question count.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct AssignmentInfo {
    pub id: i64,
    pub teacher_id: i64,
    pub question_count: i64,
    pub publish_at: Option<DateTime<Utc>>,
    pub due_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AssignmentInfo {
    pub fn status(&self, now: DateTime<Utc>) -> AssignmentStatus {
        match (self.publish_at, self.due_at) {
            (Some(publish_at), _) if publish_at > now => AssignmentStatus::Scheduled,
            (_, Some(due_at)) if due_at < now => AssignmentStatus::Closed,
            _ => AssignmentStatus::Active,
        }
    }
}

/// Per (assignment, student) aggregate of completed answer rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct AnswerTally {
    pub assignment_id: i64,
    pub student_id: i64,
    pub completed_questions: i64,
    pub correct_answers: i64,
}

impl AnswerTally {
    pub fn status(&self, total_questions: i64) -> ProgressStatus {
        ProgressStatus::classify(self.completed_questions, total_questions)
    }

    /// Share of the answered questions that were correct, unrounded.
    pub fn accuracy(&self) -> f64 {
        raw_percentage(self.correct_answers, self.completed_questions)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct UserCounts {
    pub students: i64,
    pub teachers: i64,
    pub admins: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct AssignmentCounts {
    pub total: i64,
    pub active: i64,
    pub scheduled: i64,
}

impl AssignmentCounts {
    pub fn tally<'a>(assignments: impl IntoIterator<Item = &'a AssignmentInfo>, now: DateTime<Utc>) -> Self {
        assignments
            .into_iter()
            .fold(AssignmentCounts::default(), |mut counts, assignment| {
                counts.total += 1;
                match assignment.status(now) {
                    AssignmentStatus::Active => counts.active += 1,
                    AssignmentStatus::Scheduled => counts.scheduled += 1,
                    AssignmentStatus::Closed => {}
                }
                counts
            })
    }

    /// Takes one assignment with the given status back out of the counts.
    pub fn remove(&mut self, status: AssignmentStatus) {
        self.total -= 1;
        match status {
            AssignmentStatus::Active => self.active -= 1,
            AssignmentStatus::Scheduled => self.scheduled -= 1,
            AssignmentStatus::Closed => {}
        }
    }
}
