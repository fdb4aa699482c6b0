// src/services/mod.rs

//! The statistics aggregation engine.
//!
//! Leaf rollups (assignment, student) are updated per submission under a row
//! lock. Class, teacher and school rollups are full recomputations over the
//! leaves and may read slightly stale leaf rows; they never wait on leaf writers.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    error::AppResult,
    models::{
        assignment_stats::AssignmentStats,
        class_stats::ClassStatsDetailed,
        school_stats::SchoolStats,
        student_stats::StudentStats,
        submission::{SubmissionEvent, SubmissionOutcome, UpdateOutcome},
        teacher_stats::TeacherStats,
    },
    store::{StatsStore, StatsTx},
    utils::clock::Clock,
};

pub mod aggregate;
pub mod assignment;
pub mod reconcile;
pub mod school;
pub mod student;

#[derive(Clone)]
pub struct StatsEngine {
    store: Arc<dyn StatsStore>,
    clock: Arc<dyn Clock>,
}

impl StatsEngine {
    pub fn new(store: Arc<dyn StatsStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Runs both leaf updaters for one submission.
    ///
    /// The two rollups are updated in separate transactions. A failure in one is
    /// logged and does not prevent the other; reconciliation repairs the drift.
    pub async fn process_submission(&self, event: &SubmissionEvent) -> SubmissionOutcome {
        let counts_answer = event.counts_as_new_answer();

        let assignment = outcome(
            self.update_assignment_statistics(
                event.assignment_id,
                event.student_id,
                event.is_correct,
                counts_answer,
            )
            .await,
            "assignment",
            event.assignment_id,
        );

        let student = outcome(
            self.update_student_statistics(
                event.student_id,
                event.assignment_id,
                event.is_correct,
                counts_answer,
            )
            .await,
            "student",
            event.student_id,
        );

        SubmissionOutcome { assignment, student }
    }

    pub async fn assignment_stats(&self, assignment_id: i64) -> AppResult<Option<AssignmentStats>> {
        let mut tx = self.store.begin().await?;
        let stats = tx.assignment_stats(assignment_id).await?;
        Ok(stats)
    }

    pub async fn student_stats(&self, student_id: i64) -> AppResult<Option<StudentStats>> {
        let mut tx = self.store.begin().await?;
        let stats = tx.student_stats(student_id).await?;
        Ok(stats)
    }

    pub async fn class_stats(&self, class_id: i64) -> AppResult<Option<ClassStatsDetailed>> {
        let mut tx = self.store.begin().await?;
        let stats = tx.class_stats(class_id).await?;
        Ok(stats)
    }

    pub async fn teacher_stats(&self, teacher_id: i64) -> AppResult<Option<TeacherStats>> {
        let mut tx = self.store.begin().await?;
        let stats = tx.teacher_stats(teacher_id).await?;
        Ok(stats)
    }

    pub async fn school_stats(&self, date: NaiveDate) -> AppResult<Option<SchoolStats>> {
        let mut tx = self.store.begin().await?;
        let stats = tx.school_stats(date).await?;
        Ok(stats)
    }
}

fn outcome<T>(result: AppResult<Option<T>>, rollup: &str, key: i64) -> UpdateOutcome {
    match result {
        Ok(Some(_)) => UpdateOutcome::Applied,
        Ok(None) => UpdateOutcome::Skipped,
        Err(e) => {
            tracing::error!("Failed to update {} statistics for {}: {}", rollup, key, e);
            UpdateOutcome::Failed
        }
    }
}

/// Resolves an assignment's audience into the concrete set of student ids.
pub(crate) async fn resolve_audience(
    tx: &mut dyn StatsTx,
    assignment_id: i64,
) -> AppResult<BTreeSet<i64>> {
    let audience = tx.assignment_audience(assignment_id).await?;
    let members = tx.class_members(audience.class_ids()).await?;
    Ok(audience.resolve(&members))
}
