// src/lib.rs

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod scheduler;
pub mod services;
pub mod state;
pub mod store;
pub mod utils;

pub use routes::create_router;
pub use services::StatsEngine;
