// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use super::{StatsStore, StatsTx};
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

const ASSIGNMENT_INFO_SELECT: &str = r#"
    SELECT
        a.id,
        a.teacher_id,
        (SELECT COUNT(*) FROM questions q WHERE q.assignment_id = a.id) AS question_count,
        a.publish_at,
        a.due_at,
        a.created_at
    FROM assignments a
"#;

const ASSIGNMENT_STATS_COLUMNS: &str = "assignment_id, total_students, total_questions, \
    completed_students, in_progress_students, not_started_students, completion_rate, \
    average_score, total_answers, total_correct_answers, accuracy_rate, last_updated";

const STUDENT_STATS_COLUMNS: &str = "student_id, total_assignments, completed_assignments, \
    in_progress_assignments, not_started_assignments, average_score, total_questions, \
    total_answers, total_correct_answers, accuracy_rate, completion_rate, last_activity_date, \
    last_updated";

const CLASS_STATS_COLUMNS: &str = "class_id, total_students, total_assignments, \
    average_completion, average_score, total_questions, total_answers, total_correct_answers, \
    accuracy_rate, active_students, students_needing_help, last_activity_date, last_updated";

const TEACHER_STATS_COLUMNS: &str = "teacher_id, total_assignments, total_classes, \
    total_students, average_class_completion, average_class_score, active_assignments, \
    scheduled_assignments, last_updated";

const SCHOOL_STATS_COLUMNS: &str = "date, total_students, total_teachers, total_admins, \
    total_classes, total_assignments, active_assignments, scheduled_assignments, \
    average_completion_rate, average_score, daily_active_students, daily_active_teachers, \
    students_needing_help, last_updated";

const TALLY_SELECT: &str = r#"
    SELECT
        assignment_id,
        student_id,
        COUNT(*) AS completed_questions,
        COUNT(*) FILTER (WHERE is_correct) AS correct_answers
    FROM student_answers
"#;

/// Postgres-backed rollup repository.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl StatsStore for PgStore {
    async fn begin(&self) -> AppResult<Box<dyn StatsTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }
}

/// One database transaction. Row locks taken with `FOR UPDATE` are released
/// on commit or when the transaction is dropped (rollback).
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StatsTx for PgTx {
    async fn assignment_info(&mut self, assignment_id: i64) -> AppResult<Option<AssignmentInfo>> {
        let sql = format!("{} WHERE a.id = $1", ASSIGNMENT_INFO_SELECT);
        let info = sqlx::query_as::<_, AssignmentInfo>(&sql)
            .bind(assignment_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(info)
    }

    async fn assignment_audience(&mut self, assignment_id: i64) -> AppResult<AssignmentAudience> {
        let class_ids = sqlx::query_scalar::<_, i64>(
            "SELECT class_id FROM assignment_classes WHERE assignment_id = $1 ORDER BY class_id",
        )
        .bind(assignment_id)
        .fetch_all(&mut *self.tx)
        .await?;

        let student_ids = sqlx::query_scalar::<_, i64>(
            "SELECT student_id FROM assignment_students WHERE assignment_id = $1 ORDER BY student_id",
        )
        .bind(assignment_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(AssignmentAudience::from_links(class_ids, student_ids))
    }

    async fn class_members(&mut self, class_ids: &[i64]) -> AppResult<Vec<i64>> {
        if class_ids.is_empty() {
            return Ok(Vec::new());
        }
        let members = sqlx::query_scalar::<_, i64>(
            "SELECT DISTINCT student_id FROM class_students WHERE class_id = ANY($1) ORDER BY student_id",
        )
        .bind(class_ids)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(members)
    }

    async fn student_exists(&mut self, student_id: i64) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE id = $1 AND role = 'student')",
        )
        .bind(student_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(exists)
    }

    async fn student_assignments(&mut self, student_id: i64) -> AppResult<Vec<AssignmentInfo>> {
        let sql = format!(
            r#"{}
            WHERE a.id IN (
                SELECT ac.assignment_id
                FROM assignment_classes ac
                JOIN class_students cs ON cs.class_id = ac.class_id
                WHERE cs.student_id = $1
                UNION
                SELECT s.assignment_id FROM assignment_students s WHERE s.student_id = $1
            )
            ORDER BY a.id"#,
            ASSIGNMENT_INFO_SELECT
        );
        let assignments = sqlx::query_as::<_, AssignmentInfo>(&sql)
            .bind(student_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(assignments)
    }

    async fn class_info(&mut self, class_id: i64) -> AppResult<Option<ClassInfo>> {
        let info = sqlx::query_as::<_, ClassInfo>("SELECT id, teacher_id FROM classes WHERE id = $1")
            .bind(class_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(info)
    }

    async fn class_assignment_count(&mut self, class_id: i64) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM assignment_classes WHERE class_id = $1",
        )
        .bind(class_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(count)
    }

    async fn teacher_exists(&mut self, teacher_id: i64) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE id = $1 AND role = 'teacher')",
        )
        .bind(teacher_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(exists)
    }

    async fn teacher_assignments(&mut self, teacher_id: i64) -> AppResult<Vec<AssignmentInfo>> {
        let sql = format!("{} WHERE a.teacher_id = $1 ORDER BY a.id", ASSIGNMENT_INFO_SELECT);
        let assignments = sqlx::query_as::<_, AssignmentInfo>(&sql)
            .bind(teacher_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(assignments)
    }

    async fn teacher_class_ids(&mut self, teacher_id: i64) -> AppResult<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM classes WHERE teacher_id = $1 ORDER BY id")
            .bind(teacher_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(ids)
    }

    async fn all_class_ids(&mut self) -> AppResult<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM classes ORDER BY id")
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(ids)
    }

    async fn all_teacher_ids(&mut self) -> AppResult<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE role = 'teacher' ORDER BY id")
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(ids)
    }

    async fn all_student_ids(&mut self) -> AppResult<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE role = 'student' ORDER BY id")
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(ids)
    }

    async fn user_counts(&mut self) -> AppResult<UserCounts> {
        let counts = sqlx::query_as::<_, UserCounts>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE role = 'student') AS students,
                COUNT(*) FILTER (WHERE role = 'teacher') AS teachers,
                COUNT(*) FILTER (WHERE role = 'admin') AS admins
            FROM users
            "#,
        )
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(counts)
    }

    async fn class_count(&mut self) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM classes")
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(count)
    }

    async fn assignment_counts(&mut self, now: DateTime<Utc>) -> AppResult<AssignmentCounts> {
        // Mirrors AssignmentInfo::status.
        let counts = sqlx::query_as::<_, AssignmentCounts>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (
                    WHERE (publish_at IS NULL OR publish_at <= $1)
                      AND (due_at IS NULL OR due_at >= $1)
                ) AS active,
                COUNT(*) FILTER (WHERE publish_at > $1) AS scheduled
            FROM assignments
            "#,
        )
        .bind(now)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(counts)
    }

    async fn active_teacher_count(&mut self, since: DateTime<Utc>) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE role = 'teacher' AND last_active_at >= $1",
        )
        .bind(since)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(count)
    }

    async fn assignment_tallies(&mut self, assignment_id: i64) -> AppResult<Vec<AnswerTally>> {
        let sql = format!(
            "{} WHERE assignment_id = $1 AND is_completed GROUP BY assignment_id, student_id ORDER BY student_id",
            TALLY_SELECT
        );
        let tallies = sqlx::query_as::<_, AnswerTally>(&sql)
            .bind(assignment_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(tallies)
    }

    async fn student_tallies(&mut self, student_id: i64) -> AppResult<Vec<AnswerTally>> {
        let sql = format!(
            "{} WHERE student_id = $1 AND is_completed GROUP BY assignment_id, student_id ORDER BY assignment_id",
            TALLY_SELECT
        );
        let tallies = sqlx::query_as::<_, AnswerTally>(&sql)
            .bind(student_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(tallies)
    }

    async fn assignment_mark(&mut self, assignment_id: i64, student_id: i64) -> AppResult<ProgressStatus> {
        let status = sqlx::query_scalar::<_, String>(
            "SELECT assignment_status FROM stats_progress WHERE assignment_id = $1 AND student_id = $2",
        )
        .bind(assignment_id)
        .bind(student_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(status.map(|s| ProgressStatus::parse(&s)).unwrap_or_default())
    }

    async fn set_assignment_mark(
        &mut self,
        assignment_id: i64,
        student_id: i64,
        status: ProgressStatus,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stats_progress (assignment_id, student_id, assignment_status)
            VALUES ($1, $2, $3)
            ON CONFLICT (assignment_id, student_id) DO UPDATE SET
                assignment_status = EXCLUDED.assignment_status
            "#,
        )
        .bind(assignment_id)
        .bind(student_id)
        .bind(status.as_str())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn clear_assignment_marks(&mut self, assignment_id: i64) -> AppResult<()> {
        sqlx::query("UPDATE stats_progress SET assignment_status = 'not_started' WHERE assignment_id = $1")
            .bind(assignment_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn student_mark(&mut self, assignment_id: i64, student_id: i64) -> AppResult<ProgressStatus> {
        let status = sqlx::query_scalar::<_, String>(
            "SELECT student_status FROM stats_progress WHERE assignment_id = $1 AND student_id = $2",
        )
        .bind(assignment_id)
        .bind(student_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(status.map(|s| ProgressStatus::parse(&s)).unwrap_or_default())
    }

    async fn set_student_mark(
        &mut self,
        assignment_id: i64,
        student_id: i64,
        status: ProgressStatus,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stats_progress (assignment_id, student_id, student_status)
            VALUES ($1, $2, $3)
            ON CONFLICT (assignment_id, student_id) DO UPDATE SET
                student_status = EXCLUDED.student_status
            "#,
        )
        .bind(assignment_id)
        .bind(student_id)
        .bind(status.as_str())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn clear_student_marks(&mut self, student_id: i64) -> AppResult<()> {
        sqlx::query("UPDATE stats_progress SET student_status = 'not_started' WHERE student_id = $1")
            .bind(student_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn lock_assignment_stats(&mut self, assignment_id: i64) -> AppResult<Option<AssignmentStats>> {
        let sql = format!(
            "SELECT {} FROM assignment_stats WHERE assignment_id = $1 FOR UPDATE",
            ASSIGNMENT_STATS_COLUMNS
        );
        let stats = sqlx::query_as::<_, AssignmentStats>(&sql)
            .bind(assignment_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(stats)
    }

    async fn insert_assignment_stats(&mut self, stats: &AssignmentStats) -> AppResult<()> {
        let sql = format!(
            "INSERT INTO assignment_stats ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             ON CONFLICT (assignment_id) DO NOTHING",
            ASSIGNMENT_STATS_COLUMNS
        );
        bind_assignment_stats(sqlx::query(&sql), stats)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn save_assignment_stats(&mut self, stats: &AssignmentStats) -> AppResult<()> {
        let sql = format!(
            r#"INSERT INTO assignment_stats ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (assignment_id) DO UPDATE SET
                total_students = EXCLUDED.total_students,
                total_questions = EXCLUDED.total_questions,
                completed_students = EXCLUDED.completed_students,
                in_progress_students = EXCLUDED.in_progress_students,
                not_started_students = EXCLUDED.not_started_students,
                completion_rate = EXCLUDED.completion_rate,
                average_score = EXCLUDED.average_score,
                total_answers = EXCLUDED.total_answers,
                total_correct_answers = EXCLUDED.total_correct_answers,
                accuracy_rate = EXCLUDED.accuracy_rate,
                last_updated = EXCLUDED.last_updated"#,
            ASSIGNMENT_STATS_COLUMNS
        );
        bind_assignment_stats(sqlx::query(&sql), stats)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn assignment_stats(&mut self, assignment_id: i64) -> AppResult<Option<AssignmentStats>> {
        let sql = format!(
            "SELECT {} FROM assignment_stats WHERE assignment_id = $1",
            ASSIGNMENT_STATS_COLUMNS
        );
        let stats = sqlx::query_as::<_, AssignmentStats>(&sql)
            .bind(assignment_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(stats)
    }

    async fn assignment_stats_for(&mut self, assignment_ids: &[i64]) -> AppResult<Vec<AssignmentStats>> {
        let sql = format!(
            "SELECT {} FROM assignment_stats WHERE assignment_id = ANY($1) ORDER BY assignment_id",
            ASSIGNMENT_STATS_COLUMNS
        );
        let stats = sqlx::query_as::<_, AssignmentStats>(&sql)
            .bind(assignment_ids)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(stats)
    }

    async fn all_assignment_stats(&mut self) -> AppResult<Vec<AssignmentStats>> {
        let sql = format!(
            "SELECT {} FROM assignment_stats ORDER BY assignment_id",
            ASSIGNMENT_STATS_COLUMNS
        );
        let stats = sqlx::query_as::<_, AssignmentStats>(&sql)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(stats)
    }

    async fn lock_student_stats(&mut self, student_id: i64) -> AppResult<Option<StudentStats>> {
        let sql = format!(
            "SELECT {} FROM student_stats WHERE student_id = $1 FOR UPDATE",
            STUDENT_STATS_COLUMNS
        );
        let stats = sqlx::query_as::<_, StudentStats>(&sql)
            .bind(student_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(stats)
    }

    async fn insert_student_stats(&mut self, stats: &StudentStats) -> AppResult<()> {
        let sql = format!(
            "INSERT INTO student_stats ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             ON CONFLICT (student_id) DO NOTHING",
            STUDENT_STATS_COLUMNS
        );
        bind_student_stats(sqlx::query(&sql), stats)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn save_student_stats(&mut self, stats: &StudentStats) -> AppResult<()> {
        let sql = format!(
            r#"INSERT INTO student_stats ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (student_id) DO UPDATE SET
                total_assignments = EXCLUDED.total_assignments,
                completed_assignments = EXCLUDED.completed_assignments,
                in_progress_assignments = EXCLUDED.in_progress_assignments,
                not_started_assignments = EXCLUDED.not_started_assignments,
                average_score = EXCLUDED.average_score,
                total_questions = EXCLUDED.total_questions,
                total_answers = EXCLUDED.total_answers,
                total_correct_answers = EXCLUDED.total_correct_answers,
                accuracy_rate = EXCLUDED.accuracy_rate,
                completion_rate = EXCLUDED.completion_rate,
                last_activity_date = EXCLUDED.last_activity_date,
                last_updated = EXCLUDED.last_updated"#,
            STUDENT_STATS_COLUMNS
        );
        bind_student_stats(sqlx::query(&sql), stats)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn student_stats(&mut self, student_id: i64) -> AppResult<Option<StudentStats>> {
        let sql = format!(
            "SELECT {} FROM student_stats WHERE student_id = $1",
            STUDENT_STATS_COLUMNS
        );
        let stats = sqlx::query_as::<_, StudentStats>(&sql)
            .bind(student_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(stats)
    }

    async fn student_stats_for(&mut self, student_ids: &[i64]) -> AppResult<Vec<StudentStats>> {
        let sql = format!(
            "SELECT {} FROM student_stats WHERE student_id = ANY($1) ORDER BY student_id",
            STUDENT_STATS_COLUMNS
        );
        let stats = sqlx::query_as::<_, StudentStats>(&sql)
            .bind(student_ids)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(stats)
    }

    async fn all_student_stats(&mut self) -> AppResult<Vec<StudentStats>> {
        let sql = format!("SELECT {} FROM student_stats ORDER BY student_id", STUDENT_STATS_COLUMNS);
        let stats = sqlx::query_as::<_, StudentStats>(&sql)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(stats)
    }

    async fn lock_class_stats(&mut self, class_id: i64) -> AppResult<Option<ClassStatsDetailed>> {
        let sql = format!(
            "SELECT {} FROM class_stats_detailed WHERE class_id = $1 FOR UPDATE",
            CLASS_STATS_COLUMNS
        );
        let stats = sqlx::query_as::<_, ClassStatsDetailed>(&sql)
            .bind(class_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(stats)
    }

    async fn save_class_stats(&mut self, stats: &ClassStatsDetailed) -> AppResult<()> {
        let sql = format!(
            r#"INSERT INTO class_stats_detailed ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (class_id) DO UPDATE SET
                total_students = EXCLUDED.total_students,
                total_assignments = EXCLUDED.total_assignments,
                average_completion = EXCLUDED.average_completion,
                average_score = EXCLUDED.average_score,
                total_questions = EXCLUDED.total_questions,
                total_answers = EXCLUDED.total_answers,
                total_correct_answers = EXCLUDED.total_correct_answers,
                accuracy_rate = EXCLUDED.accuracy_rate,
                active_students = EXCLUDED.active_students,
                students_needing_help = EXCLUDED.students_needing_help,
                last_activity_date = EXCLUDED.last_activity_date,
                last_updated = EXCLUDED.last_updated"#,
            CLASS_STATS_COLUMNS
        );
        sqlx::query(&sql)
            .bind(stats.class_id)
            .bind(stats.total_students)
            .bind(stats.total_assignments)
            .bind(stats.average_completion)
            .bind(stats.average_score)
            .bind(stats.total_questions)
            .bind(stats.total_answers)
            .bind(stats.total_correct_answers)
            .bind(stats.accuracy_rate)
            .bind(stats.active_students)
            .bind(stats.students_needing_help)
            .bind(stats.last_activity_date)
            .bind(stats.last_updated)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn class_stats(&mut self, class_id: i64) -> AppResult<Option<ClassStatsDetailed>> {
        let sql = format!(
            "SELECT {} FROM class_stats_detailed WHERE class_id = $1",
            CLASS_STATS_COLUMNS
        );
        let stats = sqlx::query_as::<_, ClassStatsDetailed>(&sql)
            .bind(class_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(stats)
    }

    async fn save_teacher_stats(&mut self, stats: &TeacherStats) -> AppResult<()> {
        let sql = format!(
            r#"INSERT INTO teacher_stats ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (teacher_id) DO UPDATE SET
                total_assignments = EXCLUDED.total_assignments,
                total_classes = EXCLUDED.total_classes,
                total_students = EXCLUDED.total_students,
                average_class_completion = EXCLUDED.average_class_completion,
                average_class_score = EXCLUDED.average_class_score,
                active_assignments = EXCLUDED.active_assignments,
                scheduled_assignments = EXCLUDED.scheduled_assignments,
                last_updated = EXCLUDED.last_updated"#,
            TEACHER_STATS_COLUMNS
        );
        sqlx::query(&sql)
            .bind(stats.teacher_id)
            .bind(stats.total_assignments)
            .bind(stats.total_classes)
            .bind(stats.total_students)
            .bind(stats.average_class_completion)
            .bind(stats.average_class_score)
            .bind(stats.active_assignments)
            .bind(stats.scheduled_assignments)
            .bind(stats.last_updated)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn teacher_stats(&mut self, teacher_id: i64) -> AppResult<Option<TeacherStats>> {
        let sql = format!(
            "SELECT {} FROM teacher_stats WHERE teacher_id = $1",
            TEACHER_STATS_COLUMNS
        );
        let stats = sqlx::query_as::<_, TeacherStats>(&sql)
            .bind(teacher_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(stats)
    }

    async fn lock_school_stats(&mut self, date: NaiveDate) -> AppResult<Option<SchoolStats>> {
        let sql = format!(
            "SELECT {} FROM school_stats WHERE date = $1 FOR UPDATE",
            SCHOOL_STATS_COLUMNS
        );
        let stats = sqlx::query_as::<_, SchoolStats>(&sql)
            .bind(date)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(stats)
    }

    async fn insert_school_stats(&mut self, stats: &SchoolStats) -> AppResult<()> {
        let sql = format!(
            "INSERT INTO school_stats ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             ON CONFLICT (date) DO NOTHING",
            SCHOOL_STATS_COLUMNS
        );
        bind_school_stats(sqlx::query(&sql), stats)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn save_school_stats(&mut self, stats: &SchoolStats) -> AppResult<()> {
        let sql = format!(
            r#"INSERT INTO school_stats ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (date) DO UPDATE SET
                total_students = EXCLUDED.total_students,
                total_teachers = EXCLUDED.total_teachers,
                total_admins = EXCLUDED.total_admins,
                total_classes = EXCLUDED.total_classes,
                total_assignments = EXCLUDED.total_assignments,
                active_assignments = EXCLUDED.active_assignments,
                scheduled_assignments = EXCLUDED.scheduled_assignments,
                average_completion_rate = EXCLUDED.average_completion_rate,
                average_score = EXCLUDED.average_score,
                daily_active_students = EXCLUDED.daily_active_students,
                daily_active_teachers = EXCLUDED.daily_active_teachers,
                students_needing_help = EXCLUDED.students_needing_help,
                last_updated = EXCLUDED.last_updated"#,
            SCHOOL_STATS_COLUMNS
        );
        bind_school_stats(sqlx::query(&sql), stats)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn school_stats(&mut self, date: NaiveDate) -> AppResult<Option<SchoolStats>> {
        let sql = format!("SELECT {} FROM school_stats WHERE date = $1", SCHOOL_STATS_COLUMNS);
        let stats = sqlx::query_as::<_, SchoolStats>(&sql)
            .bind(date)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(stats)
    }

    async fn school_stats_between(&mut self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<SchoolStats>> {
        let sql = format!(
            "SELECT {} FROM school_stats WHERE date BETWEEN $1 AND $2 ORDER BY date",
            SCHOOL_STATS_COLUMNS
        );
        let stats = sqlx::query_as::<_, SchoolStats>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(stats)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments>;

fn bind_assignment_stats<'q>(query: PgQuery<'q>, stats: &AssignmentStats) -> PgQuery<'q> {
    query
        .bind(stats.assignment_id)
        .bind(stats.total_students)
        .bind(stats.total_questions)
        .bind(stats.completed_students)
        .bind(stats.in_progress_students)
        .bind(stats.not_started_students)
        .bind(stats.completion_rate)
        .bind(stats.average_score)
        .bind(stats.total_answers)
        .bind(stats.total_correct_answers)
        .bind(stats.accuracy_rate)
        .bind(stats.last_updated)
}

fn bind_student_stats<'q>(query: PgQuery<'q>, stats: &StudentStats) -> PgQuery<'q> {
    query
        .bind(stats.student_id)
        .bind(stats.total_assignments)
        .bind(stats.completed_assignments)
        .bind(stats.in_progress_assignments)
        .bind(stats.not_started_assignments)
        .bind(stats.average_score)
        .bind(stats.total_questions)
        .bind(stats.total_answers)
        .bind(stats.total_correct_answers)
        .bind(stats.accuracy_rate)
        .bind(stats.completion_rate)
        .bind(stats.last_activity_date)
        .bind(stats.last_updated)
}

fn bind_school_stats<'q>(query: PgQuery<'q>, stats: &SchoolStats) -> PgQuery<'q> {
    query
        .bind(stats.date)
        .bind(stats.total_students)
        .bind(stats.total_teachers)
        .bind(stats.total_admins)
        .bind(stats.total_classes)
        .bind(stats.total_assignments)
        .bind(stats.active_assignments)
        .bind(stats.scheduled_assignments)
        .bind(stats.average_completion_rate)
        .bind(stats.average_score)
        .bind(stats.daily_active_students)
        .bind(stats.daily_active_teachers)
        .bind(stats.students_needing_help)
        .bind(stats.last_updated)
}
