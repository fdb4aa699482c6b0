// src/models/audit.rs

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RollupKind {
    Assignment,
    Student,
}

/// One rollup row that failed its consistency checks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvariantViolation {
    pub kind: RollupKind,
    pub key: i64,
    pub problems: Vec<String>,
}

/// Outcome of an audit-and-repair pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RepairReport {
    pub violations: Vec<InvariantViolation>,
    pub repaired_assignments: Vec<i64>,
    pub repaired_students: Vec<i64>,
    pub failures: Vec<String>,
}

/// Status buckets of a partitioned rollup, named for messages.
pub(crate) struct Partition {
    pub total: i64,
    pub completed: i64,
    pub in_progress: i64,
    pub not_started: i64,
}

/// Checks counters and rates, returning a human readable problem per failure.
pub(crate) fn check_rollup(partition: Partition, rates: &[(&str, f64)]) -> Vec<String> {
    let mut problems = Vec::new();

    for (name, value) in [
        ("total", partition.total),
        ("completed", partition.completed),
        ("in_progress", partition.in_progress),
        ("not_started", partition.not_started),
    ] {
        if value < 0 {
            problems.push(format!("{} is negative ({})", name, value));
        }
    }

    let sum = partition.completed + partition.in_progress + partition.not_started;
    if sum != partition.total {
        problems.push(format!(
            "buckets sum to {} but total is {}",
            sum, partition.total
        ));
    }

    if partition.completed > partition.total {
        problems.push(format!(
            "completed ({}) exceeds total ({})",
            partition.completed, partition.total
        ));
    }

    for (name, rate) in rates {
        if !(0.0..=100.0).contains(rate) {
            problems.push(format!("{} out of range ({})", name, rate));
        }
    }

    problems
}
