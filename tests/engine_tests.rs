// tests/engine_tests.rs

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rollup_stats::{
    models::{
        audit::RollupKind,
        submission::{SubmissionEvent, UpdateOutcome},
    },
    services::StatsEngine,
    store::memory::{AssignmentFixture, MemoryStore, Role},
    utils::clock::FixedClock,
};

const TEACHER: i64 = 10;
const CLASS: i64 = 100;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 12, 10, 0, 0).unwrap()
}

/// Engine over an empty in-memory store with a clock pinned to `start()`.
fn engine() -> (StatsEngine, MemoryStore, Arc<FixedClock>) {
    let store = MemoryStore::new();
    let clock = Arc::new(FixedClock::new(start()));
    let engine = StatsEngine::new(Arc::new(store.clone()), clock.clone());
    (engine, store, clock)
}

/// One teacher, one class of `students`.
async fn seed_class(store: &MemoryStore, students: &[i64]) {
    store.insert_user(TEACHER, Role::Teacher).await;
    for id in students {
        store.insert_user(*id, Role::Student).await;
    }
    store.insert_class(CLASS, TEACHER, students).await;
}

fn event(student_id: i64, assignment_id: i64, question_id: i64, is_correct: bool) -> SubmissionEvent {
    SubmissionEvent {
        student_id,
        assignment_id,
        question_id,
        is_complete: true,
        is_correct,
        is_new_submission: true,
    }
}

/// Stores the fact row, then raises the event for it.
async fn answer(
    engine: &StatsEngine,
    store: &MemoryStore,
    student_id: i64,
    assignment_id: i64,
    question_id: i64,
    is_correct: bool,
) {
    store
        .record_answer(student_id, assignment_id, question_id, true, is_correct)
        .await;
    let outcome = engine
        .process_submission(&event(student_id, assignment_id, question_id, is_correct))
        .await;
    assert_eq!(outcome.assignment, UpdateOutcome::Applied);
    assert_eq!(outcome.student, UpdateOutcome::Applied);
}

#[tokio::test]
async fn answers_move_student_through_buckets() {
    let (engine, store, _) = engine();
    seed_class(&store, &[1, 2, 3]).await;
    store
        .insert_assignment(AssignmentFixture::new(1, TEACHER, 2).for_classes(&[CLASS]))
        .await;

    answer(&engine, &store, 1, 1, 1, true).await;

    let stats = engine.assignment_stats(1).await.unwrap().unwrap();
    assert_eq!(stats.total_students, 3);
    assert_eq!(stats.in_progress_students, 1);
    assert_eq!(stats.not_started_students, 2);
    assert_eq!(stats.completed_students, 0);
    assert_eq!(stats.total_answers, 1);
    assert_eq!(stats.total_correct_answers, 1);
    assert_eq!(stats.accuracy_rate, 100.0);

    answer(&engine, &store, 1, 1, 2, false).await;

    let stats = engine.assignment_stats(1).await.unwrap().unwrap();
    assert_eq!(stats.completed_students, 1);
    assert_eq!(stats.in_progress_students, 0);
    assert_eq!(stats.not_started_students, 2);
    assert_eq!(stats.total_answers, 2);
    assert_eq!(stats.total_correct_answers, 1);
    assert_eq!(stats.accuracy_rate, 50.0);
    assert_eq!(stats.average_score, 50.0);
    assert_eq!(stats.completion_rate, 33.33);
    assert!(stats.problems().is_empty());

    let student = engine.student_stats(1).await.unwrap().unwrap();
    assert_eq!(student.total_assignments, 1);
    assert_eq!(student.completed_assignments, 1);
    assert_eq!(student.completion_rate, 100.0);
    assert_eq!(student.average_score, 50.0);
    assert_eq!(student.last_activity_date, Some(start()));
}

#[tokio::test]
async fn concurrent_final_answers_complete_both_students() {
    let (engine, store, _) = engine();
    seed_class(&store, &[1, 2, 3]).await;
    store
        .insert_assignment(AssignmentFixture::new(1, TEACHER, 2).for_classes(&[CLASS]))
        .await;

    answer(&engine, &store, 1, 1, 1, true).await;
    answer(&engine, &store, 2, 1, 1, true).await;

    store.record_answer(1, 1, 2, true, true).await;
    store.record_answer(2, 1, 2, true, false).await;

    let first = tokio::spawn({
        let engine = engine.clone();
        async move { engine.process_submission(&event(1, 1, 2, true)).await }
    });
    let second = tokio::spawn({
        let engine = engine.clone();
        async move { engine.process_submission(&event(2, 1, 2, false)).await }
    });
    first.await.unwrap();
    second.await.unwrap();

    let stats = engine.assignment_stats(1).await.unwrap().unwrap();
    assert_eq!(stats.completed_students, 2);
    assert_eq!(stats.in_progress_students, 0);
    assert_eq!(stats.not_started_students, 1);
    assert_eq!(stats.total_answers, 4);
    assert_eq!(stats.average_score, 75.0);
    assert!(stats.problems().is_empty());
}

#[tokio::test]
async fn many_concurrent_submissions_keep_partition() {
    let (engine, store, _) = engine();
    let students: Vec<i64> = (1..=20).collect();
    seed_class(&store, &students).await;
    store
        .insert_assignment(AssignmentFixture::new(1, TEACHER, 3).for_classes(&[CLASS]))
        .await;

    let mut handles = Vec::new();
    for student_id in students.iter().copied() {
        for question_id in 1..=3 {
            store.record_answer(student_id, 1, question_id, true, true).await;
        }
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            for question_id in 1..=3 {
                engine
                    .process_submission(&event(student_id, 1, question_id, true))
                    .await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let stats = engine.assignment_stats(1).await.unwrap().unwrap();
    assert_eq!(stats.completed_students, 20);
    assert_eq!(stats.in_progress_students, 0);
    assert_eq!(stats.not_started_students, 0);
    assert_eq!(stats.total_answers, 60);
    assert_eq!(stats.completion_rate, 100.0);
    assert!(engine.audit_rollups().await.unwrap().is_empty());
}

#[tokio::test]
async fn redelivered_completion_counts_once() {
    let (engine, store, _) = engine();
    seed_class(&store, &[1, 2]).await;
    store
        .insert_assignment(AssignmentFixture::new(1, TEACHER, 1).for_classes(&[CLASS]))
        .await;

    answer(&engine, &store, 1, 1, 1, true).await;

    let mut resave = event(1, 1, 1, true);
    resave.is_new_submission = false;
    engine.process_submission(&resave).await;
    engine.process_submission(&resave).await;

    let stats = engine.assignment_stats(1).await.unwrap().unwrap();
    // Single-question assignments go straight to completed.
    assert_eq!(stats.completed_students, 1);
    assert_eq!(stats.in_progress_students, 0);
    assert_eq!(stats.total_answers, 1);

    let student = engine.student_stats(1).await.unwrap().unwrap();
    assert_eq!(student.completed_assignments, 1);
    assert_eq!(student.total_answers, 1);
}

#[tokio::test]
async fn incomplete_answer_only_touches_activity() {
    let (engine, store, clock) = engine();
    seed_class(&store, &[1]).await;
    store
        .insert_assignment(AssignmentFixture::new(1, TEACHER, 2).for_classes(&[CLASS]))
        .await;

    clock.advance(Duration::minutes(5));
    store.record_answer(1, 1, 1, false, false).await;
    let mut draft = event(1, 1, 1, false);
    draft.is_complete = false;
    engine.process_submission(&draft).await;

    let stats = engine.assignment_stats(1).await.unwrap().unwrap();
    assert_eq!(stats.total_answers, 0);
    assert_eq!(stats.not_started_students, 1);

    let student = engine.student_stats(1).await.unwrap().unwrap();
    assert_eq!(student.total_answers, 0);
    assert_eq!(student.not_started_assignments, 1);
    assert_eq!(student.last_activity_date, Some(start() + Duration::minutes(5)));
}

#[tokio::test]
async fn student_average_weights_assignments_equally() {
    let (engine, store, _) = engine();
    seed_class(&store, &[]).await;
    store.insert_user(1, Role::Student).await;
    store
        .insert_assignment(AssignmentFixture::new(1, TEACHER, 1).for_students(&[1]))
        .await;
    store
        .insert_assignment(AssignmentFixture::new(2, TEACHER, 4).for_students(&[1]))
        .await;

    answer(&engine, &store, 1, 1, 1, true).await;
    answer(&engine, &store, 1, 2, 1, true).await;
    for question_id in 2..=4 {
        answer(&engine, &store, 1, 2, question_id, false).await;
    }

    let student = engine.student_stats(1).await.unwrap().unwrap();
    assert_eq!(student.total_assignments, 2);
    assert_eq!(student.completed_assignments, 2);
    assert_eq!(student.total_questions, 5);
    assert_eq!(student.total_answers, 5);
    assert_eq!(student.accuracy_rate, 40.0);
    assert_eq!(student.average_score, 62.5);
}

#[tokio::test]
async fn mixed_audience_counts_each_student_once() {
    let (engine, store, _) = engine();
    seed_class(&store, &[1, 2]).await;
    store.insert_user(3, Role::Student).await;
    store
        .insert_assignment(
            AssignmentFixture::new(1, TEACHER, 2)
                .for_classes(&[CLASS])
                .for_students(&[2, 3]),
        )
        .await;

    answer(&engine, &store, 3, 1, 1, true).await;

    let stats = engine.assignment_stats(1).await.unwrap().unwrap();
    assert_eq!(stats.total_students, 3);
    assert_eq!(stats.in_progress_students, 1);
    assert_eq!(stats.not_started_students, 2);
}

#[tokio::test]
async fn out_of_scope_answer_counts_without_moving_buckets() {
    let (engine, store, _) = engine();
    seed_class(&store, &[1]).await;
    store.insert_user(2, Role::Student).await;
    store
        .insert_assignment(AssignmentFixture::new(1, TEACHER, 1).for_classes(&[CLASS]))
        .await;

    answer(&engine, &store, 2, 1, 1, false).await;

    let stats = engine.assignment_stats(1).await.unwrap().unwrap();
    assert_eq!(stats.total_students, 1);
    assert_eq!(stats.completed_students, 0);
    assert_eq!(stats.not_started_students, 1);
    assert_eq!(stats.total_answers, 1);
    assert_eq!(stats.accuracy_rate, 0.0);
    assert!(stats.problems().is_empty());
}

#[tokio::test]
async fn deleted_assignment_is_skipped() {
    let (engine, store, _) = engine();
    seed_class(&store, &[1]).await;
    store
        .insert_assignment(AssignmentFixture::new(1, TEACHER, 2).for_classes(&[CLASS]))
        .await;
    answer(&engine, &store, 1, 1, 1, true).await;

    store.delete_assignment(1).await;
    let outcome = engine.process_submission(&event(1, 1, 2, true)).await;

    assert_eq!(outcome.assignment, UpdateOutcome::Skipped);
    assert_eq!(outcome.student, UpdateOutcome::Skipped);
    assert!(engine.assignment_stats(1).await.unwrap().is_none());
}

#[tokio::test]
async fn recalculation_is_idempotent() {
    let (engine, store, _) = engine();
    seed_class(&store, &[1, 2, 3]).await;
    store
        .insert_assignment(AssignmentFixture::new(1, TEACHER, 2).for_classes(&[CLASS]))
        .await;
    answer(&engine, &store, 1, 1, 1, true).await;
    answer(&engine, &store, 1, 1, 2, true).await;
    answer(&engine, &store, 2, 1, 1, false).await;

    let incremental = engine.assignment_stats(1).await.unwrap().unwrap();
    let first = engine.recalculate_assignment_statistics(1).await.unwrap().unwrap();
    let second = engine.recalculate_assignment_statistics(1).await.unwrap().unwrap();

    assert_eq!(first, second);
    assert_eq!(first.completed_students, incremental.completed_students);
    assert_eq!(first.in_progress_students, incremental.in_progress_students);
    assert_eq!(first.not_started_students, incremental.not_started_students);
    assert_eq!(first.total_answers, incremental.total_answers);
    assert_eq!(first.average_score, incremental.average_score);

    let before = engine.student_stats(1).await.unwrap().unwrap();
    let rebuilt = engine.recalculate_student_statistics(1).await.unwrap().unwrap();
    assert_eq!(rebuilt.completed_assignments, 1);
    assert_eq!(rebuilt.last_activity_date, before.last_activity_date);
}

#[tokio::test]
async fn repair_rebuilds_drifted_rows() {
    let (engine, store, _) = engine();
    seed_class(&store, &[1, 2]).await;
    store
        .insert_assignment(AssignmentFixture::new(1, TEACHER, 1).for_classes(&[CLASS]))
        .await;
    answer(&engine, &store, 1, 1, 1, true).await;

    let mut drifted = engine.student_stats(1).await.unwrap().unwrap();
    drifted.completed_assignments = 2;
    store.put_student_stats(drifted).await;

    let violations = engine.audit_rollups().await.unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, RollupKind::Student);
    assert_eq!(violations[0].key, 1);

    let report = engine.repair_rollups().await.unwrap();
    assert_eq!(report.repaired_students, vec![1]);
    assert!(report.repaired_assignments.is_empty());
    assert!(report.failures.is_empty());

    let repaired = engine.student_stats(1).await.unwrap().unwrap();
    assert_eq!(repaired.completed_assignments, 1);
    assert_eq!(repaired.not_started_assignments, 0);
    assert!(engine.audit_rollups().await.unwrap().is_empty());

    // Progress marks were rebuilt too: a later answer elsewhere stays consistent.
    store
        .insert_assignment(AssignmentFixture::new(2, TEACHER, 1).for_classes(&[CLASS]))
        .await;
    engine.on_assignment_created(2).await.unwrap();
    answer(&engine, &store, 1, 2, 1, true).await;
    let student = engine.student_stats(1).await.unwrap().unwrap();
    assert_eq!(student.completed_assignments, 2);
    assert!(student.problems().is_empty());
}

#[tokio::test]
async fn class_rollup_flags_low_completion() {
    let (engine, store, clock) = engine();
    seed_class(&store, &[1, 2]).await;
    for id in 1..=5 {
        store
            .insert_assignment(AssignmentFixture::new(id, TEACHER, 1).for_classes(&[CLASS]))
            .await;
    }

    // Student 1: 2 of 5 done, all correct. Student 2: all 5 done.
    for assignment_id in 1..=2 {
        answer(&engine, &store, 1, assignment_id, 1, true).await;
    }
    for assignment_id in 1..=5 {
        answer(&engine, &store, 2, assignment_id, 1, assignment_id != 5).await;
    }

    clock.advance(Duration::days(1));
    let stats = engine.update_class_statistics(CLASS).await.unwrap().unwrap();

    assert_eq!(stats.total_students, 2);
    assert_eq!(stats.total_assignments, 5);
    assert_eq!(stats.average_completion, 70.0);
    assert_eq!(stats.total_answers, 7);
    assert_eq!(stats.total_correct_answers, 6);
    assert_eq!(stats.accuracy_rate, 85.71);
    assert_eq!(stats.students_needing_help, 1);
    assert_eq!(stats.active_students, 2);
    assert_eq!(stats.last_activity_date, Some(start()));

    clock.advance(Duration::days(7));
    let stale = engine.update_class_statistics(CLASS).await.unwrap().unwrap();
    assert_eq!(stale.active_students, 0);

    assert_eq!(engine.class_stats(CLASS).await.unwrap(), Some(stale));
    assert!(engine.update_class_statistics(999).await.unwrap().is_none());
}

#[tokio::test]
async fn teacher_rollup_counts_statuses() {
    let (engine, store, _) = engine();
    seed_class(&store, &[1, 2]).await;
    store
        .insert_assignment(AssignmentFixture::new(1, TEACHER, 1).for_classes(&[CLASS]))
        .await;
    store
        .insert_assignment(
            AssignmentFixture::new(2, TEACHER, 1)
                .for_classes(&[CLASS])
                .published_at(start() + Duration::days(2)),
        )
        .await;
    store
        .insert_assignment(
            AssignmentFixture::new(3, TEACHER, 1)
                .for_classes(&[CLASS])
                .due_at(start() - Duration::days(1)),
        )
        .await;
    answer(&engine, &store, 1, 1, 1, true).await;

    let stats = engine.update_teacher_statistics(TEACHER).await.unwrap().unwrap();
    assert_eq!(stats.total_assignments, 3);
    assert_eq!(stats.active_assignments, 1);
    assert_eq!(stats.scheduled_assignments, 1);
    assert_eq!(stats.total_classes, 1);
    assert_eq!(stats.total_students, 2);
    // Only assignment 1 has a rollup yet.
    assert_eq!(stats.average_class_completion, 50.0);
    assert_eq!(stats.average_class_score, 100.0);

    assert!(engine.update_teacher_statistics(1).await.unwrap().is_none());
}

#[tokio::test]
async fn assignment_creation_bumps_existing_rollups() {
    let (engine, store, _) = engine();
    seed_class(&store, &[1, 2]).await;
    store
        .insert_assignment(AssignmentFixture::new(1, TEACHER, 2).for_classes(&[CLASS]))
        .await;
    answer(&engine, &store, 1, 1, 1, true).await;
    engine.update_class_statistics(CLASS).await.unwrap();
    let before = engine.update_school_statistics(start().date_naive()).await.unwrap();

    store
        .insert_assignment(AssignmentFixture::new(2, TEACHER, 3).for_classes(&[CLASS]))
        .await;
    let outcome = engine.on_assignment_created(2).await.unwrap();

    assert!(outcome.seeded);
    // Student 2 has no rollup yet and is counted at seeding time instead.
    assert_eq!(outcome.students_incremented, 1);
    assert_eq!(outcome.classes_incremented, 1);

    let seeded = engine.assignment_stats(2).await.unwrap().unwrap();
    assert_eq!(seeded.total_students, 2);
    assert_eq!(seeded.not_started_students, 2);

    let student = engine.student_stats(1).await.unwrap().unwrap();
    assert_eq!(student.total_assignments, 2);
    assert_eq!(student.not_started_assignments, 1);
    assert_eq!(student.total_questions, 5);
    assert!(student.problems().is_empty());

    let class = engine.class_stats(CLASS).await.unwrap().unwrap();
    assert_eq!(class.total_assignments, 2);

    let school = engine.school_stats(start().date_naive()).await.unwrap().unwrap();
    assert_eq!(school.total_assignments, before.total_assignments + 1);
    assert_eq!(school.active_assignments, before.active_assignments + 1);
}

#[tokio::test]
async fn first_assignment_of_the_day_is_counted_once() {
    let (engine, store, _) = engine();
    seed_class(&store, &[1]).await;
    store
        .insert_assignment(AssignmentFixture::new(1, TEACHER, 2).for_classes(&[CLASS]))
        .await;
    assert!(engine.school_stats(start().date_naive()).await.unwrap().is_none());

    engine.on_assignment_created(1).await.unwrap();

    let school = engine.school_stats(start().date_naive()).await.unwrap().unwrap();
    assert_eq!(school.total_assignments, 1);
    assert_eq!(school.active_assignments, 1);
    assert_eq!(school.scheduled_assignments, 0);
}

#[tokio::test]
async fn redelivered_creation_hook_changes_nothing() {
    let (engine, store, _) = engine();
    seed_class(&store, &[1]).await;
    store
        .insert_assignment(AssignmentFixture::new(1, TEACHER, 2).for_classes(&[CLASS]))
        .await;
    answer(&engine, &store, 1, 1, 1, true).await;
    engine.update_class_statistics(CLASS).await.unwrap();

    store
        .insert_assignment(AssignmentFixture::new(2, TEACHER, 3).for_classes(&[CLASS]))
        .await;
    let first = engine.on_assignment_created(2).await.unwrap();
    assert!(first.seeded);
    assert_eq!(first.students_incremented, 1);
    let school_before = engine.school_stats(start().date_naive()).await.unwrap().unwrap();

    let again = engine.on_assignment_created(2).await.unwrap();
    assert!(!again.seeded);
    assert_eq!(again.students_incremented, 0);
    assert_eq!(again.classes_incremented, 0);

    let student = engine.student_stats(1).await.unwrap().unwrap();
    assert_eq!(student.total_assignments, 2);
    assert_eq!(student.total_questions, 5);
    let rebuilt = engine.recalculate_student_statistics(1).await.unwrap().unwrap();
    assert_eq!(rebuilt.total_assignments, student.total_assignments);

    let class = engine.class_stats(CLASS).await.unwrap().unwrap();
    assert_eq!(class.total_assignments, 2);
    let school = engine.school_stats(start().date_naive()).await.unwrap().unwrap();
    assert_eq!(school.total_assignments, school_before.total_assignments);
}

#[tokio::test]
async fn members_who_never_submitted_count_as_not_started() {
    let (engine, store, _) = engine();
    seed_class(&store, &[1, 2]).await;
    store
        .insert_assignment(AssignmentFixture::new(1, TEACHER, 1).for_classes(&[CLASS]))
        .await;
    answer(&engine, &store, 1, 1, 1, true).await;
    assert!(engine.student_stats(2).await.unwrap().is_none());

    let class = engine.update_class_statistics(CLASS).await.unwrap().unwrap();
    assert_eq!(class.total_students, 2);
    assert_eq!(class.average_completion, 50.0);
    assert_eq!(class.students_needing_help, 1);

    let school = engine.update_school_statistics(start().date_naive()).await.unwrap();
    assert_eq!(school.average_completion_rate, 50.0);
    assert_eq!(school.students_needing_help, 1);
}

#[tokio::test]
async fn school_snapshot_and_trend() {
    let (engine, store, clock) = engine();
    seed_class(&store, &[1, 2]).await;
    store.insert_user(50, Role::Admin).await;
    store.touch_user(TEACHER, start() - Duration::hours(2)).await;
    store
        .insert_assignment(AssignmentFixture::new(1, TEACHER, 1).for_classes(&[CLASS]))
        .await;
    store
        .insert_assignment(
            AssignmentFixture::new(2, TEACHER, 1)
                .for_classes(&[CLASS])
                .published_at(start() + Duration::days(1)),
        )
        .await;
    answer(&engine, &store, 1, 1, 1, true).await;

    let day_one = engine.update_school_statistics(start().date_naive()).await.unwrap();
    assert_eq!(day_one.total_students, 2);
    assert_eq!(day_one.total_teachers, 1);
    assert_eq!(day_one.total_admins, 1);
    assert_eq!(day_one.total_classes, 1);
    assert_eq!(day_one.total_assignments, 2);
    assert_eq!(day_one.active_assignments, 1);
    assert_eq!(day_one.scheduled_assignments, 1);
    assert_eq!(day_one.daily_active_students, 1);
    assert_eq!(day_one.daily_active_teachers, 1);
    assert_eq!(day_one.average_completion_rate, 50.0);
    assert_eq!(day_one.average_score, 100.0);

    // Skip a day, then snapshot again.
    clock.advance(Duration::days(2));
    let day_three = engine.update_school_statistics(clock_date(&engine)).await.unwrap();
    assert_eq!(day_three.active_assignments, 2);
    assert_eq!(day_three.daily_active_students, 0);

    // A finished day keeps its snapshot.
    let replay = engine.update_school_statistics(start().date_naive()).await.unwrap();
    assert_eq!(replay, day_one);

    let trend = engine.school_trend(7).await.unwrap();
    let dates: Vec<_> = trend.iter().map(|s| s.date).collect();
    assert_eq!(dates, vec![start().date_naive(), clock_date(&engine)]);

    assert_eq!(engine.school_trend(1).await.unwrap(), vec![day_three]);
    assert!(engine.school_trend(0).await.is_err());
    assert!(engine.school_trend(367).await.is_err());

    let tomorrow = clock_date(&engine) + Duration::days(1);
    assert!(engine.update_school_statistics(tomorrow).await.is_err());
}

#[tokio::test]
async fn refresh_all_covers_every_entity() {
    let (engine, store, _) = engine();
    seed_class(&store, &[1]).await;
    store.insert_user(11, Role::Teacher).await;
    store.insert_class(200, 11, &[]).await;
    store
        .insert_assignment(AssignmentFixture::new(1, TEACHER, 1).for_classes(&[CLASS]))
        .await;
    answer(&engine, &store, 1, 1, 1, true).await;

    let summary = engine.refresh_all_aggregates().await.unwrap();
    assert_eq!(summary.classes_refreshed, 2);
    assert_eq!(summary.teachers_refreshed, 2);
    assert_eq!(summary.failures, 0);

    assert!(engine.class_stats(200).await.unwrap().is_some());
    assert!(engine.teacher_stats(11).await.unwrap().is_some());
    assert!(engine.school_stats(start().date_naive()).await.unwrap().is_some());
}

fn clock_date(engine: &StatsEngine) -> chrono::NaiveDate {
    engine.now().date_naive()
}
