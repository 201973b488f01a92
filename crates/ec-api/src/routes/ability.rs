//! Ability estimation endpoints.

use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use ec_core::{AbilityEstimator, EngineError, LearnerResponses};

use crate::dto::{
    AbilityBody, BatchAbilityEntry, EstimateAbilitiesBatchRequest, EstimateAbilitiesBatchResponse,
    EstimateAbilityRequest, UserAbilityResponse,
};
use crate::error::{ApiError, ErrorResponse};
use crate::state::AppState;

/// Creates ability routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/ability/estimate", post(estimate))
        .route("/api/ability/estimate-batch", post(estimate_batch))
}

/// Estimates one learner's overall and per-topic ability from their stored
/// history. 404 when the learner has no responses.
#[instrument(skip(state, request), fields(user_id = %request.user_id))]
async fn estimate(
    State(state): State<AppState>,
    Json(request): Json<EstimateAbilityRequest>,
) -> Result<Json<UserAbilityResponse>, ApiError> {
    let snapshot = state.snapshot();
    let responses = snapshot
        .responses_by_learner
        .get(&request.user_id)
        .cloned()
        .unwrap_or_default();

    let estimator = AbilityEstimator::new(state.engine_config().clone());
    let profile = estimator.estimate_by_topic(
        &request.user_id,
        &responses,
        &snapshot.bank,
        &snapshot.topic_map,
    )?;

    Ok(Json(UserAbilityResponse {
        user_id: request.user_id,
        ability: AbilityBody::from(&profile),
    }))
}

/// Estimates abilities for several learners at once.
///
/// Never fails as a whole: learners that cannot be estimated are reported
/// in-band with a `null` estimate and the error kind, in request order.
#[instrument(skip(state, request), fields(learners = request.user_ids.len()))]
async fn estimate_batch(
    State(state): State<AppState>,
    Json(request): Json<EstimateAbilitiesBatchRequest>,
) -> Result<Json<EstimateAbilitiesBatchResponse>, ApiError> {
    let snapshot = state.snapshot();
    let config = state.engine_config().clone();

    let requests: Vec<LearnerResponses> = request
        .user_ids
        .iter()
        .map(|user_id| LearnerResponses {
            learner_id: user_id.clone(),
            responses: snapshot
                .responses_by_learner
                .get(user_id)
                .cloned()
                .unwrap_or_default(),
        })
        .collect();

    // Estimation is CPU-bound and internally parallel; keep it off the
    // async workers.
    let outcomes = tokio::task::spawn_blocking(move || {
        let estimator = AbilityEstimator::new(config);
        estimator.estimate_batch(&requests, &snapshot.bank, &snapshot.topic_map)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("batch estimation task failed: {}", e)))?;

    let results = outcomes
        .into_iter()
        .map(|outcome| match outcome.result {
            Ok(profile) => BatchAbilityEntry {
                user_id: outcome.learner_id,
                estimate: Some(AbilityBody::from(&profile)),
                error: None,
            },
            Err(err) => BatchAbilityEntry {
                user_id: outcome.learner_id,
                estimate: None,
                error: Some(error_body(&err)),
            },
        })
        .collect();

    Ok(Json(EstimateAbilitiesBatchResponse { results }))
}

fn error_body(err: &EngineError) -> ErrorResponse {
    ErrorResponse {
        code: err.kind_code().to_string(),
        message: err.to_string(),
    }
}
