//! Health check endpoint.

use std::time::Instant;

use axum::{extract::State, routing::get, Json, Router};

use crate::dto::HealthResponse;
use crate::state::AppState;

/// Start time for uptime calculation.
static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize the start time.
pub fn init_start_time() {
    START_TIME.get_or_init(Instant::now);
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Returns overall service health and bank counters.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.snapshot();
    let uptime = START_TIME.get().map(|t| t.elapsed().as_secs()).unwrap_or(0);

    let status = if snapshot.bank.is_empty() {
        "degraded"
    } else {
        "healthy"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        items: snapshot.bank.len(),
        calibrated_items: snapshot.bank.calibrated_count(),
        learners: snapshot.responses_by_learner.len(),
        uptime_seconds: uptime,
    })
}
