// src/scheduler.rs

use std::time::Duration;

use tokio::task::JoinHandle;

use crate::services::StatsEngine;

/// Starts the periodic jobs: class/teacher/school aggregation and, when
/// enabled, the audit-and-repair pass.
pub fn spawn(
    engine: StatsEngine,
    aggregation_interval: Duration,
    repair_interval: Option<Duration>,
) -> Vec<JoinHandle<()>> {
    let mut handles = vec![tokio::spawn(run_aggregation_loop(
        engine.clone(),
        aggregation_interval,
    ))];

    match repair_interval {
        Some(interval) => handles.push(tokio::spawn(run_repair_loop(engine, interval))),
        None => tracing::info!("Periodic rollup repair disabled"),
    }

    handles
}

async fn run_aggregation_loop(engine: StatsEngine, interval: Duration) {
    let mut interval_timer = tokio::time::interval(interval);
    interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        // The first tick completes immediately, seeding today's snapshot on startup.
        interval_timer.tick().await;

        tracing::debug!("Starting aggregation cycle");
        match engine.refresh_all_aggregates().await {
            Ok(summary) => tracing::info!(
                "Aggregation cycle finished: {} classes, {} teachers, {} failures",
                summary.classes_refreshed,
                summary.teachers_refreshed,
                summary.failures
            ),
            Err(e) => tracing::error!("Aggregation cycle failed: {}", e),
        }
    }
}

async fn run_repair_loop(engine: StatsEngine, interval: Duration) {
    let mut interval_timer = tokio::time::interval(interval);
    interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // Skip the immediate first tick; repairs start one interval after boot.
    interval_timer.tick().await;

    loop {
        interval_timer.tick().await;

        match engine.repair_rollups().await {
            Ok(report) if report.violations.is_empty() => {
                tracing::debug!("Repair pass found no inconsistent rollups")
            }
            Ok(report) => tracing::warn!(
                "Repair pass: {} inconsistent rollups, {} assignments and {} students rebuilt, {} failures",
                report.violations.len(),
                report.repaired_assignments.len(),
                report.repaired_students.len(),
                report.failures.len()
            ),
            Err(e) => tracing::error!("Repair pass failed: {}", e),
        }
    }
}
