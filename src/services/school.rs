// src/services/school.rs

use chrono::{DateTime, Duration, NaiveDate, Utc};

use super::{StatsEngine, student};
use crate::{
    error::{AppError, AppResult},
    models::{
        assignment_stats::AssignmentStats,
        school_stats::SchoolStats,
        scope::{AssignmentCounts, AssignmentInfo, UserCounts},
        student_stats::StudentStats,
    },
    store::StatsTx,
    utils::math::mean,
};

/// Trailing window for "daily active" users.
pub const DAILY_ACTIVITY_WINDOW_HOURS: i64 = 24;

pub const MAX_TREND_DAYS: u32 = 366;

impl StatsEngine {
    /// Computes and stores the school snapshot for `date`.
    ///
    /// Today's row is recomputed on every call. A past day that already has a
    /// row is left untouched; a past day without one is backfilled from current
    /// data.
    pub async fn update_school_statistics(&self, date: NaiveDate) -> AppResult<SchoolStats> {
        let now = self.clock.now();
        let today = now.date_naive();
        if date > today {
            return Err(AppError::BadRequest(format!(
                "Cannot snapshot {} before the day has started",
                date
            )));
        }

        let mut tx = self.store.begin().await?;

        if date < today {
            if let Some(existing) = tx.school_stats(date).await? {
                tracing::debug!("School snapshot for {} is final, leaving it as is", date);
                return Ok(existing);
            }
        }

        let stats = compute_snapshot(&mut *tx, date, now, None).await?;
        tx.save_school_stats(&stats).await?;
        tx.commit().await?;

        tracing::info!(
            "School snapshot for {}: {} students, {} assignments, {} needing help",
            date,
            stats.total_students,
            stats.total_assignments,
            stats.students_needing_help
        );
        Ok(stats)
    }

    /// Same-day bump for a newly created assignment.
    ///
    /// When the day's row does not exist yet, the full computation runs first
    /// (without `assignment`) and the increment is applied on top of it, inside
    /// the same transaction.
    pub async fn increment_school_assignment_count(
        &self,
        date: NaiveDate,
        assignment: &AssignmentInfo,
    ) -> AppResult<SchoolStats> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        let mut stats = match tx.lock_school_stats(date).await? {
            Some(stats) => stats,
            None => {
                let fresh = compute_snapshot(&mut *tx, date, now, Some(assignment)).await?;
                tx.insert_school_stats(&fresh).await?;
                tx.lock_school_stats(date).await?.ok_or_else(|| {
                    AppError::Conflict(format!("school_stats row for {} disappeared after seeding", date))
                })?
            }
        };

        stats.add_assignment(assignment.status(now), now);

        tx.save_school_stats(&stats).await?;
        tx.commit().await?;
        Ok(stats)
    }

    /// The last `days` daily snapshots up to and including today, oldest first.
    /// Days without a snapshot are omitted.
    pub async fn school_trend(&self, days: u32) -> AppResult<Vec<SchoolStats>> {
        if days == 0 || days > MAX_TREND_DAYS {
            return Err(AppError::BadRequest(format!(
                "days must be between 1 and {}",
                MAX_TREND_DAYS
            )));
        }

        let today = self.clock.now().date_naive();
        let from = today - Duration::days(i64::from(days) - 1);

        let mut tx = self.store.begin().await?;
        let trend = tx.school_stats_between(from, today).await?;
        Ok(trend)
    }
}

/// Full snapshot from current data. `excluding` is left out of the assignment
/// counters when it is already stored.
async fn compute_snapshot(
    tx: &mut dyn StatsTx,
    date: NaiveDate,
    now: DateTime<Utc>,
    excluding: Option<&AssignmentInfo>,
) -> AppResult<SchoolStats> {
    let users = tx.user_counts().await?;
    let total_classes = tx.class_count().await?;
    let mut assignments = tx.assignment_counts(now).await?;
    if let Some(info) = excluding {
        if tx.assignment_info(info.id).await?.is_some() {
            assignments.remove(info.status(now));
        }
    }
    let rollups = tx.all_assignment_stats().await?;
    let student_ids = tx.all_student_ids().await?;
    let students = student::rollups_or_seeded(tx, &student_ids, now).await?;
    let active_teachers = tx
        .active_teacher_count(now - Duration::hours(DAILY_ACTIVITY_WINDOW_HOURS))
        .await?;

    Ok(summarize_school(
        date,
        users,
        total_classes,
        assignments,
        &rollups,
        &students,
        active_teachers,
        now,
    ))
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn summarize_school(
    date: NaiveDate,
    users: UserCounts,
    total_classes: i64,
    assignments: AssignmentCounts,
    rollups: &[AssignmentStats],
    students: &[StudentStats],
    daily_active_teachers: i64,
    now: DateTime<Utc>,
) -> SchoolStats {
    let window = Duration::hours(DAILY_ACTIVITY_WINDOW_HOURS);

    SchoolStats {
        date,
        total_students: users.students,
        total_teachers: users.teachers,
        total_admins: users.admins,
        total_classes,
        total_assignments: assignments.total,
        active_assignments: assignments.active,
        scheduled_assignments: assignments.scheduled,
        average_completion_rate: mean(rollups.iter().map(|r| r.completion_rate)),
        average_score: mean(
            rollups
                .iter()
                .filter(|r| r.completed_students > 0)
                .map(|r| r.average_score),
        ),
        daily_active_students: students.iter().filter(|s| s.active_within(now, window)).count() as i64,
        daily_active_teachers,
        students_needing_help: students.iter().filter(|s| s.needs_help()).count() as i64,
        last_updated: now,
    }
}
