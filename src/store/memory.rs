// src/store/memory.rs

//! In-memory rollup repository and fact store.
//!
//! Holds the organizational tables, the answer facts and the rollups in one
//! process-local state. A transaction takes the state mutex for its whole
//! lifetime and works on a copy, so writes become visible only on commit and a
//! dropped transaction leaves nothing behind.
//!
//! Not suitable for production: no persistence and no cross-process locking.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

#[derive(Debug, Clone)]
struct UserRecord {
    role: Role,
    last_active_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy)]
struct AnswerRecord {
    is_completed: bool,
    is_correct: bool,
}

/// Assignment row as the assignment-creation workflow would have stored it.
#[derive(Debug, Clone)]
pub struct AssignmentFixture {
    pub id: i64,
    pub teacher_id: i64,
    pub questions: i64,
    pub class_ids: Vec<i64>,
    pub student_ids: Vec<i64>,
    pub publish_at: Option<DateTime<Utc>>,
    pub due_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AssignmentFixture {
    pub fn new(id: i64, teacher_id: i64, questions: i64) -> Self {
        Self {
            id,
            teacher_id,
            questions,
            class_ids: Vec::new(),
            student_ids: Vec::new(),
            publish_at: None,
            due_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn for_classes(mut self, class_ids: &[i64]) -> Self {
        self.class_ids = class_ids.to_vec();
        self
    }

    pub fn for_students(mut self, student_ids: &[i64]) -> Self {
        self.student_ids = student_ids.to_vec();
        self
    }

    pub fn published_at(mut self, at: DateTime<Utc>) -> Self {
        self.publish_at = Some(at);
        self
    }

    pub fn due_at(mut self, at: DateTime<Utc>) -> Self {
        self.due_at = Some(at);
        self
    }
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: BTreeMap<i64, UserRecord>,
    classes: BTreeMap<i64, ClassInfo>,
    /// (class_id, student_id)
    class_students: BTreeSet<(i64, i64)>,
    assignments: BTreeMap<i64, AssignmentFixture>,
    /// (student_id, assignment_id, question_id)
    answers: BTreeMap<(i64, i64, i64), AnswerRecord>,
    /// (assignment_id, student_id) -> (assignment side, student side)
    marks: BTreeMap<(i64, i64), (ProgressStatus, ProgressStatus)>,
    assignment_stats: BTreeMap<i64, AssignmentStats>,
    student_stats: BTreeMap<i64, StudentStats>,
    class_stats: BTreeMap<i64, ClassStatsDetailed>,
    teacher_stats: BTreeMap<i64, TeacherStats>,
    school_stats: BTreeMap<NaiveDate, SchoolStats>,
}

impl MemoryState {
    fn info(&self, assignment: &AssignmentFixture) -> AssignmentInfo {
        AssignmentInfo {
            id: assignment.id,
            teacher_id: assignment.teacher_id,
            question_count: assignment.questions,
            publish_at: assignment.publish_at,
            due_at: assignment.due_at,
            created_at: assignment.created_at,
        }
    }

    fn members(&self, class_id: i64) -> impl Iterator<Item = i64> + '_ {
        self.class_students
            .iter()
            .filter(move |(c, _)| *c == class_id)
            .map(|(_, s)| *s)
    }

    fn in_scope(&self, assignment: &AssignmentFixture, student_id: i64) -> bool {
        assignment.student_ids.contains(&student_id)
            || assignment
                .class_ids
                .iter()
                .any(|c| self.class_students.contains(&(*c, student_id)))
    }

    fn tallies(&self, keep: impl Fn(i64, i64) -> bool) -> Vec<AnswerTally> {
        let mut grouped: BTreeMap<(i64, i64), AnswerTally> = BTreeMap::new();
        for ((student_id, assignment_id, _), answer) in &self.answers {
            if !answer.is_completed || !keep(*assignment_id, *student_id) {
                continue;
            }
            let tally = grouped
                .entry((*assignment_id, *student_id))
                .or_insert(AnswerTally {
                    assignment_id: *assignment_id,
                    student_id: *student_id,
                    completed_questions: 0,
                    correct_answers: 0,
                });
            tally.completed_questions += 1;
            if answer.is_correct {
                tally.correct_answers += 1;
            }
        }
        grouped.into_values().collect()
    }

    fn count_role(&self, role: Role) -> i64 {
        self.users.values().filter(|u| u.role == role).count() as i64
    }
}

/// Process-local store. Cloning shares the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, id: i64, role: Role) {
        self.state.lock().await.users.insert(
            id,
            UserRecord {
                role,
                last_active_at: None,
            },
        );
    }

    pub async fn touch_user(&self, id: i64, at: DateTime<Utc>) {
        if let Some(user) = self.state.lock().await.users.get_mut(&id) {
            user.last_active_at = Some(at);
        }
    }

    pub async fn insert_class(&self, id: i64, teacher_id: i64, student_ids: &[i64]) {
        let mut state = self.state.lock().await;
        state.classes.insert(id, ClassInfo { id, teacher_id });
        for student_id in student_ids {
            state.class_students.insert((id, *student_id));
        }
    }

    pub async fn enroll_student(&self, class_id: i64, student_id: i64) {
        self.state
            .lock()
            .await
            .class_students
            .insert((class_id, student_id));
    }

    pub async fn insert_assignment(&self, assignment: AssignmentFixture) {
        self.state
            .lock()
            .await
            .assignments
            .insert(assignment.id, assignment);
    }

    /// Deletes the assignment and everything that cascades from it.
    pub async fn delete_assignment(&self, id: i64) {
        let mut state = self.state.lock().await;
        state.assignments.remove(&id);
        state.answers.retain(|(_, a, _), _| *a != id);
        state.marks.retain(|(a, _), _| *a != id);
        state.assignment_stats.remove(&id);
    }

    /// Upserts one fact row, as the submission workflow does before raising its event.
    pub async fn record_answer(
        &self,
        student_id: i64,
        assignment_id: i64,
        question_id: i64,
        is_completed: bool,
        is_correct: bool,
    ) {
        self.state.lock().await.answers.insert(
            (student_id, assignment_id, question_id),
            AnswerRecord {
                is_completed,
                is_correct,
            },
        );
    }

    /// Overwrites a rollup row directly, bypassing the engine.
    pub async fn put_assignment_stats(&self, stats: AssignmentStats) {
        self.state
            .lock()
            .await
            .assignment_stats
            .insert(stats.assignment_id, stats);
    }

    /// Overwrites a rollup row directly, bypassing the engine.
    pub async fn put_student_stats(&self, stats: StudentStats) {
        self.state
            .lock()
            .await
            .student_stats
            .insert(stats.student_id, stats);
    }
}

#[async_trait]
impl StatsStore for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn StatsTx>> {
        let guard = self.state.clone().lock_owned().await;
        let working = (*guard).clone();
        Ok(Box::new(MemoryTx { guard, working }))
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl StatsTx for MemoryTx {
    async fn assignment_info(&mut self, assignment_id: i64) -> AppResult<Option<AssignmentInfo>> {
        let state = &self.working;
        Ok(state.assignments.get(&assignment_id).map(|a| state.info(a)))
    }

    async fn assignment_audience(&mut self, assignment_id: i64) -> AppResult<AssignmentAudience> {
        let (class_ids, student_ids) = self
            .working
            .assignments
            .get(&assignment_id)
            .map(|a| (a.class_ids.clone(), a.student_ids.clone()))
            .unwrap_or_default();
        Ok(AssignmentAudience::from_links(class_ids, student_ids))
    }

    async fn class_members(&mut self, class_ids: &[i64]) -> AppResult<Vec<i64>> {
        let members: BTreeSet<i64> = class_ids
            .iter()
            .flat_map(|c| self.working.members(*c))
            .collect();
        Ok(members.into_iter().collect())
    }

    async fn student_exists(&mut self, student_id: i64) -> AppResult<bool> {
        Ok(self
            .working
            .users
            .get(&student_id)
            .is_some_and(|u| u.role == Role::Student))
    }

    async fn student_assignments(&mut self, student_id: i64) -> AppResult<Vec<AssignmentInfo>> {
        let state = &self.working;
        Ok(state
            .assignments
            .values()
            .filter(|a| state.in_scope(a, student_id))
            .map(|a| state.info(a))
            .collect())
    }

    async fn class_info(&mut self, class_id: i64) -> AppResult<Option<ClassInfo>> {
        Ok(self.working.classes.get(&class_id).copied())
    }

    async fn class_assignment_count(&mut self, class_id: i64) -> AppResult<i64> {
        Ok(self
            .working
            .assignments
            .values()
            .filter(|a| a.class_ids.contains(&class_id))
            .count() as i64)
    }

    async fn teacher_exists(&mut self, teacher_id: i64) -> AppResult<bool> {
        Ok(self
            .working
            .users
            .get(&teacher_id)
            .is_some_and(|u| u.role == Role::Teacher))
    }

    async fn teacher_assignments(&mut self, teacher_id: i64) -> AppResult<Vec<AssignmentInfo>> {
        let state = &self.working;
        Ok(state
            .assignments
            .values()
            .filter(|a| a.teacher_id == teacher_id)
            .map(|a| state.info(a))
            .collect())
    }

    async fn teacher_class_ids(&mut self, teacher_id: i64) -> AppResult<Vec<i64>> {
        Ok(self
            .working
            .classes
            .values()
            .filter(|c| c.teacher_id == teacher_id)
            .map(|c| c.id)
            .collect())
    }

    async fn all_class_ids(&mut self) -> AppResult<Vec<i64>> {
        Ok(self.working.classes.keys().copied().collect())
    }

    async fn all_teacher_ids(&mut self) -> AppResult<Vec<i64>> {
        Ok(self
            .working
            .users
            .iter()
            .filter(|(_, u)| u.role == Role::Teacher)
            .map(|(id, _)| *id)
            .collect())
    }

    async fn all_student_ids(&mut self) -> AppResult<Vec<i64>> {
        Ok(self
            .working
            .users
            .iter()
            .filter(|(_, u)| u.role == Role::Student)
            .map(|(id, _)| *id)
            .collect())
    }

    async fn user_counts(&mut self) -> AppResult<UserCounts> {
        let state = &self.working;
        Ok(UserCounts {
            students: state.count_role(Role::Student),
            teachers: state.count_role(Role::Teacher),
            admins: state.count_role(Role::Admin),
        })
    }

    async fn class_count(&mut self) -> AppResult<i64> {
        Ok(self.working.classes.len() as i64)
    }

    async fn assignment_counts(&mut self, now: DateTime<Utc>) -> AppResult<AssignmentCounts> {
        let state = &self.working;
        let infos: Vec<AssignmentInfo> = state.assignments.values().map(|a| state.info(a)).collect();
        Ok(AssignmentCounts::tally(&infos, now))
    }

    async fn active_teacher_count(&mut self, since: DateTime<Utc>) -> AppResult<i64> {
        Ok(self
            .working
            .users
            .values()
            .filter(|u| u.role == Role::Teacher && u.last_active_at.is_some_and(|at| at >= since))
            .count() as i64)
    }

    async fn assignment_tallies(&mut self, assignment_id: i64) -> AppResult<Vec<AnswerTally>> {
        Ok(self.working.tallies(|a, _| a == assignment_id))
    }

    async fn student_tallies(&mut self, student_id: i64) -> AppResult<Vec<AnswerTally>> {
        Ok(self.working.tallies(|_, s| s == student_id))
    }

    async fn assignment_mark(&mut self, assignment_id: i64, student_id: i64) -> AppResult<ProgressStatus> {
        Ok(self
            .working
            .marks
            .get(&(assignment_id, student_id))
            .map(|(side, _)| *side)
            .unwrap_or_default())
    }

    async fn set_assignment_mark(
        &mut self,
        assignment_id: i64,
        student_id: i64,
        status: ProgressStatus,
    ) -> AppResult<()> {
        self.working
            .marks
            .entry((assignment_id, student_id))
            .or_default()
            .0 = status;
        Ok(())
    }

    async fn clear_assignment_marks(&mut self, assignment_id: i64) -> AppResult<()> {
        for ((a, _), (side, _)) in self.working.marks.iter_mut() {
            if *a == assignment_id {
                *side = ProgressStatus::NotStarted;
            }
        }
        Ok(())
    }

    async fn student_mark(&mut self, assignment_id: i64, student_id: i64) -> AppResult<ProgressStatus> {
        Ok(self
            .working
            .marks
            .get(&(assignment_id, student_id))
            .map(|(_, side)| *side)
            .unwrap_or_default())
    }

    async fn set_student_mark(
        &mut self,
        assignment_id: i64,
        student_id: i64,
        status: ProgressStatus,
    ) -> AppResult<()> {
        self.working
            .marks
            .entry((assignment_id, student_id))
            .or_default()
            .1 = status;
        Ok(())
    }

    async fn clear_student_marks(&mut self, student_id: i64) -> AppResult<()> {
        for ((_, s), (_, side)) in self.working.marks.iter_mut() {
            if *s == student_id {
                *side = ProgressStatus::NotStarted;
            }
        }
        Ok(())
    }

    async fn lock_assignment_stats(&mut self, assignment_id: i64) -> AppResult<Option<AssignmentStats>> {
        Ok(self.working.assignment_stats.get(&assignment_id).cloned())
    }

    async fn insert_assignment_stats(&mut self, stats: &AssignmentStats) -> AppResult<()> {
        self.working
            .assignment_stats
            .entry(stats.assignment_id)
            .or_insert_with(|| stats.clone());
        Ok(())
    }

    async fn save_assignment_stats(&mut self, stats: &AssignmentStats) -> AppResult<()> {
        self.working
            .assignment_stats
            .insert(stats.assignment_id, stats.clone());
        Ok(())
    }

    async fn assignment_stats(&mut self, assignment_id: i64) -> AppResult<Option<AssignmentStats>> {
        Ok(self.working.assignment_stats.get(&assignment_id).cloned())
    }

    async fn assignment_stats_for(&mut self, assignment_ids: &[i64]) -> AppResult<Vec<AssignmentStats>> {
        Ok(self
            .working
            .assignment_stats
            .values()
            .filter(|s| assignment_ids.contains(&s.assignment_id))
            .cloned()
            .collect())
    }

    async fn all_assignment_stats(&mut self) -> AppResult<Vec<AssignmentStats>> {
        Ok(self.working.assignment_stats.values().cloned().collect())
    }

    async fn lock_student_stats(&mut self, student_id: i64) -> AppResult<Option<StudentStats>> {
        Ok(self.working.student_stats.get(&student_id).cloned())
    }

    async fn insert_student_stats(&mut self, stats: &StudentStats) -> AppResult<()> {
        self.working
            .student_stats
            .entry(stats.student_id)
            .or_insert_with(|| stats.clone());
        Ok(())
    }

    async fn save_student_stats(&mut self, stats: &StudentStats) -> AppResult<()> {
        self.working
            .student_stats
            .insert(stats.student_id, stats.clone());
        Ok(())
    }

    async fn student_stats(&mut self, student_id: i64) -> AppResult<Option<StudentStats>> {
        Ok(self.working.student_stats.get(&student_id).cloned())
    }

    async fn student_stats_for(&mut self, student_ids: &[i64]) -> AppResult<Vec<StudentStats>> {
        Ok(self
            .working
            .student_stats
            .values()
            .filter(|s| student_ids.contains(&s.student_id))
            .cloned()
            .collect())
    }

    async fn all_student_stats(&mut self) -> AppResult<Vec<StudentStats>> {
        Ok(self.working.student_stats.values().cloned().collect())
    }

    async fn lock_class_stats(&mut self, class_id: i64) -> AppResult<Option<ClassStatsDetailed>> {
        Ok(self.working.class_stats.get(&class_id).cloned())
    }

    async fn save_class_stats(&mut self, stats: &ClassStatsDetailed) -> AppResult<()> {
        self.working.class_stats.insert(stats.class_id, stats.clone());
        Ok(())
    }

    async fn class_stats(&mut self, class_id: i64) -> AppResult<Option<ClassStatsDetailed>> {
        Ok(self.working.class_stats.get(&class_id).cloned())
    }

    async fn save_teacher_stats(&mut self, stats: &TeacherStats) -> AppResult<()> {
        self.working
            .teacher_stats
            .insert(stats.teacher_id, stats.clone());
        Ok(())
    }

    async fn teacher_stats(&mut self, teacher_id: i64) -> AppResult<Option<TeacherStats>> {
        Ok(self.working.teacher_stats.get(&teacher_id).cloned())
    }

    async fn lock_school_stats(&mut self, date: NaiveDate) -> AppResult<Option<SchoolStats>> {
        Ok(self.working.school_stats.get(&date).cloned())
    }

    async fn insert_school_stats(&mut self, stats: &SchoolStats) -> AppResult<()> {
        self.working
            .school_stats
            .entry(stats.date)
            .or_insert_with(|| stats.clone());
        Ok(())
    }

    async fn save_school_stats(&mut self, stats: &SchoolStats) -> AppResult<()> {
        self.working.school_stats.insert(stats.date, stats.clone());
        Ok(())
    }

    async fn school_stats(&mut self, date: NaiveDate) -> AppResult<Option<SchoolStats>> {
        Ok(self.working.school_stats.get(&date).cloned())
    }

    async fn school_stats_between(&mut self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<SchoolStats>> {
        if from > to {
            return Ok(Vec::new());
        }
        Ok(self
            .working
            .school_stats
            .range(from..=to)
            .map(|(_, stats)| stats.clone())
            .collect())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
