// src/services/reconcile.rs

//! Full rebuilds from the fact store. Incremental updates are an optimization;
//! these are ground truth.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};

use super::{StatsEngine, assignment, resolve_audience, student};
use crate::{
    error::AppResult,
    models::{
        assignment_stats::AssignmentStats,
        audit::{InvariantViolation, RepairReport, RollupKind},
        scope::{AnswerTally, AssignmentInfo, ProgressStatus},
        student_stats::StudentStats,
    },
};

impl StatsEngine {
    /// Rebuilds one AssignmentStats row and its assignment-side progress marks.
    pub async fn recalculate_assignment_statistics(
        &self,
        assignment_id: i64,
    ) -> AppResult<Option<AssignmentStats>> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        let Some(info) = tx.assignment_info(assignment_id).await? else {
            tracing::info!("Assignment {} no longer exists, nothing to recalculate", assignment_id);
            return Ok(None);
        };

        assignment::lock_or_seed(&mut *tx, &info, now).await?;
        let students = resolve_audience(&mut *tx, assignment_id).await?;
        let tallies = tx.assignment_tallies(assignment_id).await?;

        let (stats, marks) = rebuild_assignment(&info, &students, &tallies, now);

        tx.clear_assignment_marks(assignment_id).await?;
        for (student_id, status) in &marks {
            tx.set_assignment_mark(assignment_id, *student_id, *status)
                .await?;
        }
        tx.save_assignment_stats(&stats).await?;
        tx.commit().await?;

        tracing::info!(
            "Recalculated assignment {}: {}/{}/{} of {} students",
            assignment_id,
            stats.completed_students,
            stats.in_progress_students,
            stats.not_started_students,
            stats.total_students
        );
        Ok(Some(stats))
    }

    /// Rebuilds one StudentStats row and its student-side progress marks.
    pub async fn recalculate_student_statistics(&self, student_id: i64) -> AppResult<Option<StudentStats>> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        if !tx.student_exists(student_id).await? {
            tracing::info!("Student {} no longer exists, nothing to recalculate", student_id);
            return Ok(None);
        }

        let assignments = tx.student_assignments(student_id).await?;
        let previous = student::lock_or_seed(&mut *tx, student_id, &assignments, now).await?;
        let tallies = tx.student_tallies(student_id).await?;

        let (mut stats, marks) = rebuild_student(student_id, &assignments, &tallies, now);
        stats.last_activity_date = previous.last_activity_date;

        tx.clear_student_marks(student_id).await?;
        for (assignment_id, status) in &marks {
            tx.set_student_mark(*assignment_id, student_id, *status)
                .await?;
        }
        tx.save_student_stats(&stats).await?;
        tx.commit().await?;

        tracing::info!(
            "Recalculated student {}: {}/{}/{} of {} assignments",
            student_id,
            stats.completed_assignments,
            stats.in_progress_assignments,
            stats.not_started_assignments,
            stats.total_assignments
        );
        Ok(Some(stats))
    }

    /// Scans every leaf rollup for consistency problems.
    pub async fn audit_rollups(&self) -> AppResult<Vec<InvariantViolation>> {
        let mut tx = self.store.begin().await?;
        let assignments = tx.all_assignment_stats().await?;
        let students = tx.all_student_stats().await?;
        drop(tx);

        let assignment_violations = assignments.iter().filter_map(|s| {
            violation(RollupKind::Assignment, s.assignment_id, s.problems())
        });
        let student_violations = students
            .iter()
            .filter_map(|s| violation(RollupKind::Student, s.student_id, s.problems()));

        Ok(assignment_violations.chain(student_violations).collect())
    }

    /// Audits, then recalculates every row that failed.
    pub async fn repair_rollups(&self) -> AppResult<RepairReport> {
        let violations = self.audit_rollups().await?;
        let mut report = RepairReport::default();

        for v in &violations {
            tracing::warn!("{:?} rollup {} is inconsistent: {:?}", v.kind, v.key, v.problems);

            let result = match v.kind {
                RollupKind::Assignment => self
                    .recalculate_assignment_statistics(v.key)
                    .await
                    .map(|r| r.is_some()),
                RollupKind::Student => self
                    .recalculate_student_statistics(v.key)
                    .await
                    .map(|r| r.is_some()),
            };

            match (result, v.kind) {
                (Ok(true), RollupKind::Assignment) => report.repaired_assignments.push(v.key),
                (Ok(true), RollupKind::Student) => report.repaired_students.push(v.key),
                (Ok(false), _) => {}
                (Err(e), kind) => {
                    tracing::error!("Failed to repair {:?} rollup {}: {}", kind, v.key, e);
                    report.failures.push(format!("{:?} {}: {}", kind, v.key, e));
                }
            }
        }

        report.violations = violations;
        Ok(report)
    }
}

fn violation(kind: RollupKind, key: i64, problems: Vec<String>) -> Option<InvariantViolation> {
    (!problems.is_empty()).then_some(InvariantViolation {
        kind,
        key,
        problems,
    })
}

/// Derives an assignment's rollup and its non-default marks from facts alone.
pub(crate) fn rebuild_assignment(
    info: &AssignmentInfo,
    students: &BTreeSet<i64>,
    tallies: &[AnswerTally],
    now: DateTime<Utc>,
) -> (AssignmentStats, Vec<(i64, ProgressStatus)>) {
    let mut stats = AssignmentStats::seeded(info.id, students.len() as i64, info.question_count, now);
    let mut marks = Vec::new();

    for tally in tallies {
        stats.total_answers += tally.completed_questions;
        stats.total_correct_answers += tally.correct_answers;

        if !students.contains(&tally.student_id) {
            continue;
        }
        let status = tally.status(info.question_count);
        if status != ProgressStatus::NotStarted {
            stats.shift(ProgressStatus::NotStarted, status);
            marks.push((tally.student_id, status));
        }
    }

    stats.refresh_rates(tallies);
    (stats, marks)
}

/// Derives a student's rollup and its non-default marks from facts alone.
pub(crate) fn rebuild_student(
    student_id: i64,
    assignments: &[AssignmentInfo],
    tallies: &[AnswerTally],
    now: DateTime<Utc>,
) -> (StudentStats, Vec<(i64, ProgressStatus)>) {
    let question_counts: HashMap<i64, i64> = student::question_counts(assignments);
    let total_questions = assignments.iter().map(|a| a.question_count).sum();
    let mut stats = StudentStats::seeded(student_id, assignments.len() as i64, total_questions, now);
    let mut marks = Vec::new();

    for tally in tallies {
        stats.total_answers += tally.completed_questions;
        stats.total_correct_answers += tally.correct_answers;

        let Some(&question_count) = question_counts.get(&tally.assignment_id) else {
            continue;
        };
        let status = tally.status(question_count);
        if status != ProgressStatus::NotStarted {
            stats.shift(ProgressStatus::NotStarted, status);
            marks.push((tally.assignment_id, status));
        }
    }

    stats.refresh_rates(tallies, &question_counts);
    (stats, marks)
}
