// tests/api_tests.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rollup_stats::{
    config::Config,
    routes,
    services::StatsEngine,
    state::AppState,
    store::memory::{AssignmentFixture, MemoryStore, Role},
    utils::{clock::SystemClock, jwt::sign_jwt},
};
use serde_json::{Value, json};

const SECRET: &str = "test_secret_for_integration_tests";

struct TestApp {
    address: String,
    store: MemoryStore,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

fn token(id: i64, role: &str) -> String {
    sign_jwt(id, role, SECRET, 600).unwrap()
}

/// Helper function to spawn the app on a random port for testing.
/// Backed by the in-memory store, so no database is needed.
async fn spawn_app() -> TestApp {
    let store = MemoryStore::new();
    let engine = StatsEngine::new(Arc::new(store.clone()), Arc::new(SystemClock));

    let config = Config {
        database_url: "unused".to_string(),
        database_max_connections: 1,
        jwt_secret: SECRET.to_string(),
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        aggregation_interval: Duration::from_secs(300),
        repair_interval: None,
    };

    let state = AppState { engine, config };
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp { address, store }
}

/// One teacher, a class of two students and a two-question assignment for it.
async fn seed(store: &MemoryStore) {
    store.insert_user(10, Role::Teacher).await;
    store.insert_user(1, Role::Student).await;
    store.insert_user(2, Role::Student).await;
    store.insert_class(100, 10, &[1, 2]).await;
    store
        .insert_assignment(AssignmentFixture::new(7, 10, 2).for_classes(&[100]))
        .await;
}

#[tokio::test]
async fn unknown_path_is_404() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(app.url("/random_path_that_does_not_exist"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn stats_require_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(app.url("/api/stats/assignments/7"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = client
        .get(app.url("/api/stats/assignments/7"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn submission_updates_rollups() {
    let app = spawn_app().await;
    seed(&app.store).await;
    let client = reqwest::Client::new();
    let teacher = token(10, "teacher");

    app.store.record_answer(1, 7, 1, true, true).await;
    let response = client
        .post(app.url("/api/events/submissions"))
        .bearer_auth(&teacher)
        .json(&json!({
            "student_id": 1,
            "assignment_id": 7,
            "question_id": 1,
            "is_complete": true,
            "is_correct": true
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 202);
    let outcome: Value = response.json().await.unwrap();
    assert_eq!(outcome["assignment"], "applied");
    assert_eq!(outcome["student"], "applied");

    let stats: Value = client
        .get(app.url("/api/stats/assignments/7"))
        .bearer_auth(&teacher)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["total_students"], 2);
    assert_eq!(stats["in_progress_students"], 1);
    assert_eq!(stats["not_started_students"], 1);
    assert_eq!(stats["accuracy_rate"], 100.0);

    let student: Value = client
        .get(app.url("/api/stats/students/1"))
        .bearer_auth(&teacher)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(student["in_progress_assignments"], 1);
}

#[tokio::test]
async fn submission_for_deleted_assignment_is_skipped() {
    let app = spawn_app().await;
    seed(&app.store).await;
    let client = reqwest::Client::new();

    let response = client
        .post(app.url("/api/events/submissions"))
        .bearer_auth(token(10, "teacher"))
        .json(&json!({
            "student_id": 1,
            "assignment_id": 999,
            "question_id": 1,
            "is_complete": true,
            "is_correct": false
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 202);
    let outcome: Value = response.json().await.unwrap();
    assert_eq!(outcome["assignment"], "skipped");
    assert_eq!(outcome["student"], "skipped");
}

#[tokio::test]
async fn invalid_submission_is_rejected() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(app.url("/api/events/submissions"))
        .bearer_auth(token(10, "teacher"))
        .json(&json!({
            "student_id": 0,
            "assignment_id": 7,
            "question_id": 1,
            "is_complete": true,
            "is_correct": true
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn missing_rollup_is_404() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    for path in [
        "/api/stats/assignments/7",
        "/api/stats/students/1",
        "/api/stats/classes/100",
        "/api/stats/teachers/10",
        "/api/stats/school/2024-01-01",
    ] {
        let response = client
            .get(app.url(path))
            .bearer_auth(token(10, "teacher"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 404, "{}", path);
    }
}

#[tokio::test]
async fn school_endpoints_validate_input() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let teacher = token(10, "teacher");

    let response = client
        .get(app.url("/api/stats/school/not-a-date"))
        .bearer_auth(&teacher)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = client
        .get(app.url("/api/stats/school/trend?days=0"))
        .bearer_auth(&teacher)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = client
        .get(app.url("/api/stats/school/trend?days=400"))
        .bearer_auth(&teacher)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn school_refresh_then_trend() {
    let app = spawn_app().await;
    seed(&app.store).await;
    let client = reqwest::Client::new();
    let teacher = token(10, "teacher");

    let response = client
        .post(app.url("/api/stats/school/refresh"))
        .bearer_auth(&teacher)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let snapshot: Value = response.json().await.unwrap();
    assert_eq!(snapshot["total_students"], 2);
    assert_eq!(snapshot["total_assignments"], 1);

    let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
    let response = client
        .get(app.url(&format!("/api/stats/school/{}", today)))
        .bearer_auth(&teacher)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let trend: Vec<Value> = client
        .get(app.url("/api/stats/school/trend"))
        .bearer_auth(&teacher)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(trend.len(), 1);
    assert_eq!(trend[0]["date"], today);
}

#[tokio::test]
async fn assignment_created_seeds_rollup() {
    let app = spawn_app().await;
    seed(&app.store).await;
    let client = reqwest::Client::new();
    let teacher = token(10, "teacher");

    let response = client
        .post(app.url("/api/events/assignments/7/created"))
        .bearer_auth(&teacher)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 202);
    let outcome: Value = response.json().await.unwrap();
    assert_eq!(outcome["seeded"], true);

    let stats: Value = client
        .get(app.url("/api/stats/assignments/7"))
        .bearer_auth(&teacher)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["not_started_students"], 2);
}

#[tokio::test]
async fn class_and_teacher_refresh() {
    let app = spawn_app().await;
    seed(&app.store).await;
    let client = reqwest::Client::new();
    let teacher = token(10, "teacher");

    let response = client
        .post(app.url("/api/stats/classes/100/refresh"))
        .bearer_auth(&teacher)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let class: Value = response.json().await.unwrap();
    assert_eq!(class["total_students"], 2);
    assert_eq!(class["total_assignments"], 1);

    let response = client
        .post(app.url("/api/stats/teachers/10/refresh"))
        .bearer_auth(&teacher)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let response = client
        .post(app.url("/api/stats/classes/555/refresh"))
        .bearer_auth(&teacher)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn repair_tooling_requires_admin() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(app.url("/api/admin/audit"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = client
        .get(app.url("/api/admin/audit"))
        .bearer_auth(token(10, "teacher"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = client
        .post(app.url("/api/admin/repair"))
        .bearer_auth(token(10, "teacher"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn admin_audit_and_repair() {
    let app = spawn_app().await;
    seed(&app.store).await;
    let client = reqwest::Client::new();
    let admin = token(99, "admin");

    app.store.record_answer(1, 7, 1, true, true).await;
    app.store.record_answer(1, 7, 2, true, true).await;
    let response = client
        .post(app.url("/api/admin/repair/assignments/7"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let rebuilt: Value = response.json().await.unwrap();
    assert_eq!(rebuilt["completed_students"], 1);
    assert_eq!(rebuilt["total_answers"], 2);

    let audit: Value = client
        .get(app.url("/api/admin/audit"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(audit["count"], 0);

    let report: Value = client
        .post(app.url("/api/admin/repair"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(report["violations"].as_array().map(Vec::len), Some(0));

    let response = client
        .post(app.url("/api/admin/repair/students/404"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}
