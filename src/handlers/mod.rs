// src/handlers/mod.rs

pub mod events;
pub mod repair;
pub mod stats;
