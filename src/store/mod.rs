// src/store/mod.rs

//! Rollup repository and read-only access to the fact store.
//!
//! Every engine operation opens one [`StatsTx`], does its reads and writes through it,
//! and commits. Dropping a transaction without committing discards its writes.
//! The `lock_*` methods hold the rollup row until commit or drop, which is what
//! serializes concurrent updates of the same assignment or student.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    error::AppResult,
    models::{
        assignment_stats::AssignmentStats,
        class_stats::{ClassInfo, ClassStatsDetailed},
        school_stats::SchoolStats,
        scope::{
            AnswerTally, AssignmentAudience, AssignmentCounts, AssignmentInfo, ProgressStatus,
            UserCounts,
        },
        student_stats::StudentStats,
        teacher_stats::TeacherStats,
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait StatsStore: Send + Sync {
    async fn begin(&self) -> AppResult<Box<dyn StatsTx>>;
}

#[async_trait]
pub trait StatsTx: Send {
    // Organization (read-only)

    async fn assignment_info(&mut self, assignment_id: i64) -> AppResult<Option<AssignmentInfo>>;
    async fn assignment_audience(&mut self, assignment_id: i64) -> AppResult<AssignmentAudience>;
    /// Distinct students enrolled in any of the classes.
    async fn class_members(&mut self, class_ids: &[i64]) -> AppResult<Vec<i64>>;
    async fn student_exists(&mut self, student_id: i64) -> AppResult<bool>;
    /// Assignments the student is in scope for, through a class or individually.
    async fn student_assignments(&mut self, student_id: i64) -> AppResult<Vec<AssignmentInfo>>;
    async fn class_info(&mut self, class_id: i64) -> AppResult<Option<ClassInfo>>;
    async fn class_assignment_count(&mut self, class_id: i64) -> AppResult<i64>;
    async fn teacher_exists(&mut self, teacher_id: i64) -> AppResult<bool>;
    async fn teacher_assignments(&mut self, teacher_id: i64) -> AppResult<Vec<AssignmentInfo>>;
    async fn teacher_class_ids(&mut self, teacher_id: i64) -> AppResult<Vec<i64>>;
    async fn all_class_ids(&mut self) -> AppResult<Vec<i64>>;
    async fn all_teacher_ids(&mut self) -> AppResult<Vec<i64>>;
    async fn all_student_ids(&mut self) -> AppResult<Vec<i64>>;
    async fn user_counts(&mut self) -> AppResult<UserCounts>;
    async fn class_count(&mut self) -> AppResult<i64>;
    async fn assignment_counts(&mut self, now: DateTime<Utc>) -> AppResult<AssignmentCounts>;
    async fn active_teacher_count(&mut self, since: DateTime<Utc>) -> AppResult<i64>;

    // Facts (read-only)

    async fn assignment_tallies(&mut self, assignment_id: i64) -> AppResult<Vec<AnswerTally>>;
    async fn student_tallies(&mut self, student_id: i64) -> AppResult<Vec<AnswerTally>>;

    // Progress marks. Each side only ever writes its own column.

    async fn assignment_mark(&mut self, assignment_id: i64, student_id: i64) -> AppResult<ProgressStatus>;
    async fn set_assignment_mark(
        &mut self,
        assignment_id: i64,
        student_id: i64,
        status: ProgressStatus,
    ) -> AppResult<()>;
    async fn clear_assignment_marks(&mut self, assignment_id: i64) -> AppResult<()>;
    async fn student_mark(&mut self, assignment_id: i64, student_id: i64) -> AppResult<ProgressStatus>;
    async fn set_student_mark(
        &mut self,
        assignment_id: i64,
        student_id: i64,
        status: ProgressStatus,
    ) -> AppResult<()>;
    async fn clear_student_marks(&mut self, student_id: i64) -> AppResult<()>;

    // AssignmentStats

    async fn lock_assignment_stats(&mut self, assignment_id: i64) -> AppResult<Option<AssignmentStats>>;
    /// Inserts unless a row already exists.
    async fn insert_assignment_stats(&mut self, stats: &AssignmentStats) -> AppResult<()>;
    async fn save_assignment_stats(&mut self, stats: &AssignmentStats) -> AppResult<()>;
    async fn assignment_stats(&mut self, assignment_id: i64) -> AppResult<Option<AssignmentStats>>;
    async fn assignment_stats_for(&mut self, assignment_ids: &[i64]) -> AppResult<Vec<AssignmentStats>>;
    async fn all_assignment_stats(&mut self) -> AppResult<Vec<AssignmentStats>>;

    // StudentStats

    async fn lock_student_stats(&mut self, student_id: i64) -> AppResult<Option<StudentStats>>;
    async fn insert_student_stats(&mut self, stats: &StudentStats) -> AppResult<()>;
    async fn save_student_stats(&mut self, stats: &StudentStats) -> AppResult<()>;
    async fn student_stats(&mut self, student_id: i64) -> AppResult<Option<StudentStats>>;
    async fn student_stats_for(&mut self, student_ids: &[i64]) -> AppResult<Vec<StudentStats>>;
    async fn all_student_stats(&mut self) -> AppResult<Vec<StudentStats>>;

    // ClassStatsDetailed

    async fn lock_class_stats(&mut self, class_id: i64) -> AppResult<Option<ClassStatsDetailed>>;
    async fn save_class_stats(&mut self, stats: &ClassStatsDetailed) -> AppResult<()>;
    async fn class_stats(&mut self, class_id: i64) -> AppResult<Option<ClassStatsDetailed>>;

    // TeacherStats

    async fn save_teacher_stats(&mut self, stats: &TeacherStats) -> AppResult<()>;
    async fn teacher_stats(&mut self, teacher_id: i64) -> AppResult<Option<TeacherStats>>;

    // SchoolStats

    async fn lock_school_stats(&mut self, date: NaiveDate) -> AppResult<Option<SchoolStats>>;
    async fn insert_school_stats(&mut self, stats: &SchoolStats) -> AppResult<()>;
    async fn save_school_stats(&mut self, stats: &SchoolStats) -> AppResult<()>;
    async fn school_stats(&mut self, date: NaiveDate) -> AppResult<Option<SchoolStats>>;
    /// Rows with `from <= date <= to`, oldest first.
    async fn school_stats_between(&mut self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<SchoolStats>>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
}
