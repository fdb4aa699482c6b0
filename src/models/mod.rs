// src/models/mod.rs

pub mod assignment_stats;
pub mod audit;
pub mod class_stats;
pub mod school_stats;
pub mod scope;
pub mod student_stats;
pub mod submission;
pub mod teacher_stats;
