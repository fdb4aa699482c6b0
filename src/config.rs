// src/config.rs

use std::env;
use std::time::Duration;

use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub rust_log: String,
    pub bind_addr: String,
    /// How often class/teacher rollups and today's school snapshot are rebuilt.
    pub aggregation_interval: Duration,
    /// How often the audit-and-repair pass runs. `None` disables it.
    pub repair_interval: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let database_max_connections = parse_var("DATABASE_MAX_CONNECTIONS").unwrap_or(5);

        let aggregation_interval =
            Duration::from_secs(parse_var("AGGREGATION_INTERVAL_SECS").unwrap_or(300).max(1));

        let repair_interval = match parse_var("REPAIR_INTERVAL_SECS").unwrap_or(0) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Self {
            database_url,
            database_max_connections: database_max_connections as u32,
            jwt_secret,
            rust_log,
            bind_addr,
            aggregation_interval,
            repair_interval,
        }
    }
}

/// Reads a numeric variable, ignoring it (with a warning) when malformed.
fn parse_var(name: &str) -> Option<u64> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring malformed {}={:?}", name, raw);
            None
        }
    }
}
