//! Bank analysis and reload endpoints.

use axum::{extract::State, routing::get, routing::post, Json, Router};
use tracing::{info, instrument};

use ec_core::BankAnalysis;

use crate::dto::ReloadResponse;
use crate::error::ApiError;
use crate::state::{load_snapshot, AppState};

/// Creates bank routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/bank/analysis", get(analysis))
        .route("/api/bank/reload", post(reload))
}

/// Returns descriptive statistics over the current bank.
async fn analysis(State(state): State<AppState>) -> Json<BankAnalysis> {
    let snapshot = state.snapshot();
    Json(BankAnalysis::compute(&snapshot.bank, &snapshot.topic_map))
}

/// Reloads the data files, recalibrates, and atomically publishes the new
/// bank. In-flight requests keep the snapshot they started with.
#[instrument(skip(state))]
async fn reload(State(state): State<AppState>) -> Result<Json<ReloadResponse>, ApiError> {
    let Some(paths) = state.data_paths().cloned() else {
        return Err(ApiError::ServiceUnavailable(
            "service was not started from data files; reload is disabled".into(),
        ));
    };
    let config = state.engine_config().clone();

    let (snapshot, stats) = tokio::task::spawn_blocking(move || load_snapshot(&paths, &config))
        .await
        .map_err(|e| ApiError::Internal(format!("reload task failed: {}", e)))?
        .map_err(|e| ApiError::Internal(format!("reload failed: {}", e)))?;

    state.publish(snapshot);
    info!(items = stats.items, learners = stats.learners, "bank reloaded");

    Ok(Json(ReloadResponse {
        items: stats.items,
        calibrated_items: stats.calibrated_items,
        learners: stats.learners,
        responses: stats.responses,
        dropped_records: stats.dropped_records,
    }))
}
