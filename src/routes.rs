// src/routes.rs

use axum::{
    Router,
    http::Method,
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{events, repair, stats},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Events and dashboard reads require a valid token.
/// * Repair tooling additionally requires the admin role.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let event_routes = Router::new()
        .route("/submissions", post(events::record_submission))
        .route("/assignments/{id}/created", post(events::assignment_created));

    let stats_routes = Router::new()
        .route("/assignments/{id}", get(stats::get_assignment_stats))
        .route("/students/{id}", get(stats::get_student_stats))
        .route("/classes/{id}", get(stats::get_class_stats))
        .route("/classes/{id}/refresh", post(stats::refresh_class_stats))
        .route("/teachers/{id}", get(stats::get_teacher_stats))
        .route("/teachers/{id}/refresh", post(stats::refresh_teacher_stats))
        .route("/school/trend", get(stats::get_school_trend))
        .route("/school/refresh", post(stats::refresh_school_stats))
        .route("/school/{date}", get(stats::get_school_stats));

    let admin_routes = Router::new()
        .route("/audit", get(repair::audit))
        .route("/repair", post(repair::repair_all))
        .route("/repair/assignments/{id}", post(repair::recalculate_assignment))
        .route("/repair/students/{id}", post(repair::recalculate_student))
        // Auth first, then Admin check
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
                .layer(middleware::from_fn(admin_middleware)),
        );

    let protected = Router::new()
        .nest("/events", event_routes)
        .nest("/stats", stats_routes)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api", protected.nest("/admin", admin_routes))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
