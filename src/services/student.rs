// src/services/student.rs

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use super::StatsEngine;
use crate::{
    error::{AppError, AppResult},
    models::{
        scope::{AssignmentInfo, ProgressStatus},
        student_stats::StudentStats,
    },
    store::StatsTx,
};

impl StatsEngine {
    /// Applies one submission to the student's rollup and stamps their activity.
    ///
    /// Returns `None` when the student or the assignment no longer exists.
    pub async fn update_student_statistics(
        &self,
        student_id: i64,
        assignment_id: i64,
        is_correct: bool,
        is_new_submission: bool,
    ) -> AppResult<Option<StudentStats>> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        if !tx.student_exists(student_id).await? {
            tracing::info!(
                "Student {} no longer exists, skipping statistics update",
                student_id
            );
            return Ok(None);
        }
        if tx.assignment_info(assignment_id).await?.is_none() {
            tracing::info!(
                "Assignment {} no longer exists, skipping statistics update for student {}",
                assignment_id,
                student_id
            );
            return Ok(None);
        }

        let assignments = tx.student_assignments(student_id).await?;
        let question_counts = question_counts(&assignments);

        let mut stats = lock_or_seed(&mut *tx, student_id, &assignments, now).await?;

        if is_new_submission {
            stats.record_answer(is_correct);
        }

        let tallies = tx.student_tallies(student_id).await?;

        match question_counts.get(&assignment_id) {
            Some(&total_questions) => {
                let completed = tallies
                    .iter()
                    .find(|t| t.assignment_id == assignment_id)
                    .map_or(0, |t| t.completed_questions);
                let current = ProgressStatus::classify(completed, total_questions);
                let recorded = tx.student_mark(assignment_id, student_id).await?;

                if current != recorded {
                    tracing::debug!(
                        "Student {}: assignment {} moves {:?} -> {:?}",
                        student_id,
                        assignment_id,
                        recorded,
                        current
                    );
                    stats.shift(recorded, current);
                    tx.set_student_mark(assignment_id, student_id, current)
                        .await?;
                }
            }
            None => tracing::debug!(
                "Assignment {} is outside the scope of student {}; buckets unchanged",
                assignment_id,
                student_id
            ),
        }

        stats.refresh_rates(&tallies, &question_counts);
        stats.last_activity_date = Some(now);
        stats.last_updated = now;

        tx.save_student_stats(&stats).await?;
        tx.commit().await?;

        let problems = stats.problems();
        if !problems.is_empty() {
            tracing::warn!(
                "StudentStats {} failed consistency checks after update: {:?}",
                student_id,
                problems
            );
        }

        Ok(Some(stats))
    }

    /// Counts a newly created assignment into an existing student rollup.
    ///
    /// Returns `false` when the student has no rollup yet; seeding will count
    /// the assignment from the current scope.
    pub async fn increment_student_assignment_count(
        &self,
        student_id: i64,
        question_count: i64,
    ) -> AppResult<bool> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        let Some(mut stats) = tx.lock_student_stats(student_id).await? else {
            return Ok(false);
        };

        stats.add_assignment(question_count);
        stats.last_updated = now;

        tx.save_student_stats(&stats).await?;
        tx.commit().await?;
        Ok(true)
    }
}

pub(crate) fn question_counts(assignments: &[AssignmentInfo]) -> HashMap<i64, i64> {
    assignments
        .iter()
        .map(|a| (a.id, a.question_count))
        .collect()
}

/// Locks the student's rollup row, seeding it from the current scope first
/// when it does not exist yet.
pub(crate) async fn lock_or_seed(
    tx: &mut dyn StatsTx,
    student_id: i64,
    assignments: &[AssignmentInfo],
    now: DateTime<Utc>,
) -> AppResult<StudentStats> {
    if let Some(stats) = tx.lock_student_stats(student_id).await? {
        return Ok(stats);
    }

    let total_questions = assignments.iter().map(|a| a.question_count).sum();
    let seeded = StudentStats::seeded(student_id, assignments.len() as i64, total_questions, now);
    tx.insert_student_stats(&seeded).await?;

    tx.lock_student_stats(student_id).await?.ok_or_else(|| {
        AppError::Conflict(format!(
            "student_stats row for student {} disappeared after seeding",
            student_id
        ))
    })
}

/// StudentStats rows for `student_ids`. A student without a row yet is
/// represented by a freshly seeded one for their current scope, so aggregates
/// see students who have never submitted anything.
pub(crate) async fn rollups_or_seeded(
    tx: &mut dyn StatsTx,
    student_ids: &[i64],
    now: DateTime<Utc>,
) -> AppResult<Vec<StudentStats>> {
    let mut rollups = tx.student_stats_for(student_ids).await?;
    let present: HashSet<i64> = rollups.iter().map(|s| s.student_id).collect();

    for student_id in student_ids {
        if present.contains(student_id) {
            continue;
        }
        let assignments = tx.student_assignments(*student_id).await?;
        let total_questions = assignments.iter().map(|a| a.question_count).sum();
        rollups.push(StudentStats::seeded(
            *student_id,
            assignments.len() as i64,
            total_questions,
            now,
        ));
    }

    Ok(rollups)
}
