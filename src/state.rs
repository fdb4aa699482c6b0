use axum::extract::FromRef;

use crate::config::Config;
use crate::services::StatsEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: StatsEngine,
    pub config: Config,
}

impl FromRef<AppState> for StatsEngine {
    fn from_ref(state: &AppState) -> Self {
        state.engine.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
