// src/services/assignment.rs

use chrono::{DateTime, Utc};

use super::{StatsEngine, resolve_audience};
use crate::{
    error::{AppError, AppResult},
    models::{
        assignment_stats::AssignmentStats,
        scope::{AssignmentInfo, ProgressStatus},
        submission::AssignmentCreatedOutcome,
    },
    store::StatsTx,
};

impl StatsEngine {
    /// Applies one submission to the assignment's rollup.
    ///
    /// Returns `None` when the assignment no longer exists. Any error rolls the
    /// whole update back, leaving the row at its previous value.
    pub async fn update_assignment_statistics(
        &self,
        assignment_id: i64,
        student_id: i64,
        is_correct: bool,
        is_new_submission: bool,
    ) -> AppResult<Option<AssignmentStats>> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        let Some(info) = tx.assignment_info(assignment_id).await? else {
            tracing::info!(
                "Assignment {} no longer exists, skipping statistics update",
                assignment_id
            );
            return Ok(None);
        };

        // Row lock held from here until commit.
        let mut stats = lock_or_seed(&mut *tx, &info, now).await?;

        if is_new_submission {
            stats.record_answer(is_correct);
        }

        let tallies = tx.assignment_tallies(assignment_id).await?;
        let audience = resolve_audience(&mut *tx, assignment_id).await?;

        if audience.contains(&student_id) {
            let completed = tallies
                .iter()
                .find(|t| t.student_id == student_id)
                .map_or(0, |t| t.completed_questions);
            let current = ProgressStatus::classify(completed, stats.total_questions);
            let recorded = tx.assignment_mark(assignment_id, student_id).await?;

            if current != recorded {
                tracing::debug!(
                    "Assignment {}: student {} moves {:?} -> {:?}",
                    assignment_id,
                    student_id,
                    recorded,
                    current
                );
                stats.shift(recorded, current);
                tx.set_assignment_mark(assignment_id, student_id, current)
                    .await?;
            }
        } else {
            tracing::debug!(
                "Student {} is outside the audience of assignment {}; buckets unchanged",
                student_id,
                assignment_id
            );
        }

        stats.refresh_rates(&tallies);
        stats.last_updated = now;

        tx.save_assignment_stats(&stats).await?;
        tx.commit().await?;

        let problems = stats.problems();
        if !problems.is_empty() {
            tracing::warn!(
                "AssignmentStats {} failed consistency checks after update: {:?}",
                assignment_id,
                problems
            );
        }

        Ok(Some(stats))
    }

    /// Hook for the assignment-creation workflow.
    ///
    /// Seeds the assignment's rollup eagerly, then bumps the "total" denominators
    /// of every in-scope student, every linked class and today's school snapshot.
    /// Only the call that seeds the row applies the bumps.
    pub async fn on_assignment_created(&self, assignment_id: i64) -> AppResult<AssignmentCreatedOutcome> {
        let now = self.clock.now();
        let mut outcome = AssignmentCreatedOutcome::default();

        let mut tx = self.store.begin().await?;
        let Some(info) = tx.assignment_info(assignment_id).await? else {
            tracing::info!(
                "Assignment {} no longer exists, skipping creation hooks",
                assignment_id
            );
            return Ok(outcome);
        };

        let audience = tx.assignment_audience(assignment_id).await?;
        let members = tx.class_members(audience.class_ids()).await?;
        let students = audience.resolve(&members);

        if tx.lock_assignment_stats(assignment_id).await?.is_some() {
            // Redelivered hook, or a submission seeded the row first. Either way the
            // assignment is already counted wherever it will be.
            tracing::info!(
                "Assignment {} already has statistics, skipping creation hooks",
                assignment_id
            );
            return Ok(outcome);
        }

        let seeded =
            AssignmentStats::seeded(assignment_id, students.len() as i64, info.question_count, now);
        tx.insert_assignment_stats(&seeded).await?;
        tx.commit().await?;
        outcome.seeded = true;

        for student_id in &students {
            match self
                .increment_student_assignment_count(*student_id, info.question_count)
                .await
            {
                Ok(true) => outcome.students_incremented += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!(
                    "Failed to bump assignment count for student {}: {}",
                    student_id,
                    e
                ),
            }
        }

        for class_id in audience.class_ids() {
            match self.increment_class_assignment_count(*class_id).await {
                Ok(true) => outcome.classes_incremented += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!(
                    "Failed to bump assignment count for class {}: {}",
                    class_id,
                    e
                ),
            }
        }

        self.increment_school_assignment_count(now.date_naive(), &info)
            .await?;

        tracing::info!(
            "Assignment {} registered: seeded={}, students={}, classes={}",
            assignment_id,
            outcome.seeded,
            outcome.students_incremented,
            outcome.classes_incremented
        );

        Ok(outcome)
    }
}

/// Locks the assignment's rollup row, seeding it from the resolved audience first
/// when it does not exist yet.
///
/// The insert is a no-op when a concurrent transaction seeded the row first, so
/// the lock always lands on exactly one row.
pub(crate) async fn lock_or_seed(
    tx: &mut dyn StatsTx,
    info: &AssignmentInfo,
    now: DateTime<Utc>,
) -> AppResult<AssignmentStats> {
    if let Some(stats) = tx.lock_assignment_stats(info.id).await? {
        return Ok(stats);
    }

    let students = resolve_audience(tx, info.id).await?;
    let seeded = AssignmentStats::seeded(info.id, students.len() as i64, info.question_count, now);
    tx.insert_assignment_stats(&seeded).await?;

    tx.lock_assignment_stats(info.id).await?.ok_or_else(|| {
        AppError::Conflict(format!(
            "assignment_stats row for assignment {} disappeared after seeding",
            info.id
        ))
    })
}
