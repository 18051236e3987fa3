//! Dashboard aggregates: task, equipment and team statistics.

pub mod stats;
pub mod types;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::core::shared::state::AppState;
use crate::core::urls::ApiUrls;

pub use stats::{build_stats, handle_dashboard_stats, handle_team_stats, team_workloads};
pub use types::*;

pub fn configure_dashboard_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(ApiUrls::DASHBOARD_STATS, get(handle_dashboard_stats))
        .route(ApiUrls::DASHBOARD_TEAMS, get(handle_team_stats))
}
