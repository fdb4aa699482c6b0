// src/services/aggregate.rs

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::{StatsEngine, student};
use crate::{
    error::AppResult,
    models::{
        assignment_stats::AssignmentStats,
        class_stats::ClassStatsDetailed,
        scope::{AssignmentCounts, AssignmentInfo},
        student_stats::StudentStats,
        teacher_stats::TeacherStats,
    },
    utils::math::{mean, percentage},
};

/// Trailing window for a class's "active students".
pub const CLASS_ACTIVITY_WINDOW_DAYS: i64 = 7;

/// Result of one scheduled aggregation cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregationSummary {
    pub classes_refreshed: usize,
    pub teachers_refreshed: usize,
    pub failures: usize,
}

impl StatsEngine {
    /// Rebuilds a class rollup from its members' StudentStats. Members who have
    /// never submitted count as freshly seeded rows.
    ///
    /// Reads are not locked: a concurrent submission may or may not be reflected.
    pub async fn update_class_statistics(&self, class_id: i64) -> AppResult<Option<ClassStatsDetailed>> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        if tx.class_info(class_id).await?.is_none() {
            tracing::info!("Class {} no longer exists, skipping statistics update", class_id);
            return Ok(None);
        }

        let members = tx.class_members(&[class_id]).await?;
        let total_assignments = tx.class_assignment_count(class_id).await?;
        let students = student::rollups_or_seeded(&mut *tx, &members, now).await?;

        let stats = summarize_class(class_id, members.len() as i64, total_assignments, &students, now);

        tx.save_class_stats(&stats).await?;
        tx.commit().await?;
        Ok(Some(stats))
    }

    /// Counts a newly created assignment into an existing class rollup.
    pub async fn increment_class_assignment_count(&self, class_id: i64) -> AppResult<bool> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        let Some(mut stats) = tx.lock_class_stats(class_id).await? else {
            return Ok(false);
        };

        stats.total_assignments += 1;
        stats.last_updated = now;

        tx.save_class_stats(&stats).await?;
        tx.commit().await?;
        Ok(true)
    }

    /// Rebuilds a teacher rollup from the AssignmentStats of the teacher's assignments.
    pub async fn update_teacher_statistics(&self, teacher_id: i64) -> AppResult<Option<TeacherStats>> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        if !tx.teacher_exists(teacher_id).await? {
            tracing::info!("Teacher {} no longer exists, skipping statistics update", teacher_id);
            return Ok(None);
        }

        let assignments = tx.teacher_assignments(teacher_id).await?;
        let class_ids = tx.teacher_class_ids(teacher_id).await?;
        let students = tx.class_members(&class_ids).await?;
        let assignment_ids: Vec<i64> = assignments.iter().map(|a| a.id).collect();
        let rollups = tx.assignment_stats_for(&assignment_ids).await?;

        let stats = summarize_teacher(
            teacher_id,
            &assignments,
            class_ids.len() as i64,
            students.len() as i64,
            &rollups,
            now,
        );

        tx.save_teacher_stats(&stats).await?;
        tx.commit().await?;
        Ok(Some(stats))
    }

    /// Refreshes every class and teacher rollup, then today's school snapshot.
    /// One entity failing does not stop the others.
    pub async fn refresh_all_aggregates(&self) -> AppResult<AggregationSummary> {
        let (class_ids, teacher_ids) = {
            let mut tx = self.store.begin().await?;
            let class_ids = tx.all_class_ids().await?;
            let teacher_ids = tx.all_teacher_ids().await?;
            (class_ids, teacher_ids)
        };

        let mut summary = AggregationSummary::default();

        for class_id in class_ids {
            match self.update_class_statistics(class_id).await {
                Ok(Some(_)) => summary.classes_refreshed += 1,
                Ok(None) => {}
                Err(e) => {
                    summary.failures += 1;
                    tracing::error!("Failed to refresh class {} statistics: {}", class_id, e);
                }
            }
        }

        for teacher_id in teacher_ids {
            match self.update_teacher_statistics(teacher_id).await {
                Ok(Some(_)) => summary.teachers_refreshed += 1,
                Ok(None) => {}
                Err(e) => {
                    summary.failures += 1;
                    tracing::error!("Failed to refresh teacher {} statistics: {}", teacher_id, e);
                }
            }
        }

        let today = self.clock.now().date_naive();
        if let Err(e) = self.update_school_statistics(today).await {
            summary.failures += 1;
            tracing::error!("Failed to refresh school statistics for {}: {}", today, e);
        }

        Ok(summary)
    }
}

pub(crate) fn summarize_class(
    class_id: i64,
    total_students: i64,
    total_assignments: i64,
    students: &[StudentStats],
    now: DateTime<Utc>,
) -> ClassStatsDetailed {
    let total_answers: i64 = students.iter().map(|s| s.total_answers).sum();
    let total_correct_answers: i64 = students.iter().map(|s| s.total_correct_answers).sum();
    let window = Duration::days(CLASS_ACTIVITY_WINDOW_DAYS);

    ClassStatsDetailed {
        class_id,
        total_students,
        total_assignments,
        average_completion: mean(students.iter().map(|s| s.completion_rate)),
        average_score: mean(
            students
                .iter()
                .filter(|s| s.completed_assignments > 0)
                .map(|s| s.average_score),
        ),
        total_questions: students.iter().map(|s| s.total_questions).sum(),
        total_answers,
        total_correct_answers,
        accuracy_rate: percentage(total_correct_answers, total_answers),
        active_students: students.iter().filter(|s| s.active_within(now, window)).count() as i64,
        students_needing_help: students.iter().filter(|s| s.needs_help()).count() as i64,
        last_activity_date: students.iter().filter_map(|s| s.last_activity_date).max(),
        last_updated: now,
    }
}

pub(crate) fn summarize_teacher(
    teacher_id: i64,
    assignments: &[AssignmentInfo],
    total_classes: i64,
    total_students: i64,
    rollups: &[AssignmentStats],
    now: DateTime<Utc>,
) -> TeacherStats {
    let counts = AssignmentCounts::tally(assignments, now);

    TeacherStats {
        teacher_id,
        total_assignments: counts.total,
        total_classes,
        total_students,
        average_class_completion: mean(rollups.iter().map(|r| r.completion_rate)),
        average_class_score: mean(
            rollups
                .iter()
                .filter(|r| r.completed_students > 0)
                .map(|r| r.average_score),
        ),
        active_assignments: counts.active,
        scheduled_assignments: counts.scheduled,
        last_updated: now,
    }
}
