//! Pass-probability forecasting endpoint.

use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use ec_core::{
    selection, EngineError, ExamItem, ExamSpec, ForecastService, ItemParams,
};

use crate::dto::{ExamStructureDto, PassingProbabilityRequest, PassingProbabilityResponse};
use crate::error::ApiError;
use crate::state::{AppState, Snapshot};

/// Creates forecast routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/api/forecast/passing-probability",
        post(passing_probability),
    )
}

/// Forecasts a learner's probability of passing a prospective exam.
///
/// The exam is given either as an explicit question list or as a topic
/// structure to assemble from the bank.
#[instrument(skip(state, request), fields(user_id = %request.user_id))]
async fn passing_probability(
    State(state): State<AppState>,
    Json(request): Json<PassingProbabilityRequest>,
) -> Result<Json<PassingProbabilityResponse>, ApiError> {
    let snapshot = state.snapshot();
    let responses = snapshot
        .responses_by_learner
        .get(&request.user_id)
        .cloned()
        .unwrap_or_default();

    let spec = build_exam_spec(&request.exam_structure, &snapshot, state.engine_config())?;

    let service = ForecastService::new(state.engine_config().clone());
    let outcome = service.forecast_for_learner(
        &request.user_id,
        &responses,
        &snapshot.bank,
        &snapshot.topic_map,
        &spec,
    )?;

    Ok(Json(PassingProbabilityResponse {
        user_id: request.user_id,
        passing_probability: outcome.forecast.pass_probability_pct,
        confidence_score: outcome.forecast.confidence,
        expected_score: outcome.forecast.expected_score_pct,
        passing_threshold: spec.passing_threshold * 100.0,
        exam_info: outcome.summary,
    }))
}

/// Materializes the requested exam against the current snapshot.
fn build_exam_spec(
    structure: &ExamStructureDto,
    snapshot: &Snapshot,
    config: &ec_core::EngineConfig,
) -> Result<ExamSpec, ApiError> {
    let items = if let Some(questions) = &structure.questions {
        questions
            .iter()
            .map(|q| {
                let bank_params = q
                    .question_id
                    .as_deref()
                    .and_then(|id| snapshot.bank.params(id));
                let params = ItemParams {
                    difficulty: q
                        .difficulty
                        .or(bank_params.map(|p| p.difficulty))
                        .unwrap_or(0.0),
                    discrimination: q
                        .discrimination
                        .or(bank_params.map(|p| p.discrimination))
                        .unwrap_or(config.default_discrimination),
                    guessing: q
                        .guessing
                        .or(bank_params.map(|p| p.guessing))
                        .unwrap_or(config.default_guessing),
                };
                match &q.question_id {
                    Some(id) => ExamItem::from_bank(id.clone(), params),
                    None => ExamItem::ad_hoc(params),
                }
            })
            .collect()
    } else if let Some(topics) = &structure.topics {
        let mut rng = rand::thread_rng();
        selection::assemble_from_topic_structure(
            &snapshot.bank,
            &snapshot.topic_map,
            topics,
            &mut rng,
        )
    } else {
        return Err(ApiError::BadRequest(
            "exam_structure needs either questions or topics".into(),
        ));
    };

    if items.is_empty() {
        return Err(ApiError::Engine(EngineError::EmptyExam));
    }

    Ok(ExamSpec {
        items,
        passing_threshold: structure.passing_threshold,
        total_score: structure.total_score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorResponse;
    use crate::test_helpers::test_state;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new().merge(routes()).with_state(test_state())
    }

    async fn post_json(body: serde_json::Value) -> (StatusCode, Vec<u8>) {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/forecast/passing-probability")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_forecast_from_explicit_questions() {
        let (status, body) = post_json(serde_json::json!({
            "user_id": "u1",
            "exam_structure": {
                "questions": [
                    {"question_id": "q1"},
                    {"question_id": "q2"},
                    {"question_id": "q3", "difficulty": 1.5},
                    {"difficulty": 0.0, "discrimination": 1.2}
                ],
                "passing_threshold": 0.5
            }
        }))
        .await;

        assert_eq!(status, StatusCode::OK);
        let response: PassingProbabilityResponse = serde_json::from_slice(&body).unwrap();
        assert!((0.0..=100.0).contains(&response.passing_probability));
        assert!((0.0..=100.0).contains(&response.expected_score));
        assert!((0.0..=1.0).contains(&response.confidence_score));
        assert_eq!(response.exam_info.total_questions, 4);
        assert_eq!(response.exam_info.min_correct_needed, 2);
        assert!((response.passing_threshold - 50.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_forecast_invalid_threshold_is_400() {
        let (status, body) = post_json(serde_json::json!({
            "user_id": "u1",
            "exam_structure": {
                "questions": [{"question_id": "q1"}],
                "passing_threshold": 1.5
            }
        }))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.code, "INVALID_THRESHOLD");
    }

    #[tokio::test]
    async fn test_forecast_without_questions_or_topics_is_400() {
        let (status, _) = post_json(serde_json::json!({
            "user_id": "u1",
            "exam_structure": {"passing_threshold": 0.7}
        }))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_forecast_unknown_learner_is_404() {
        let (status, body) = post_json(serde_json::json!({
            "user_id": "nobody",
            "exam_structure": {
                "questions": [{"question_id": "q1"}],
                "passing_threshold": 0.7
            }
        }))
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.code, "NO_RESPONSES");
    }

    #[tokio::test]
    async fn test_forecast_from_topic_structure() {
        let (status, body) = post_json(serde_json::json!({
            "user_id": "u1",
            "exam_structure": {
                "topics": [{
                    "topic_id": "math",
                    "topic_kind": "main",
                    "difficulty_counts": {"easy": 0, "medium": 2, "hard": 0}
                }],
                "passing_threshold": 0.5
            }
        }))
        .await;

        assert_eq!(status, StatusCode::OK);
        let response: PassingProbabilityResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(response.exam_info.total_questions, 2);
    }

    #[tokio::test]
    async fn test_forecast_empty_assembly_is_400() {
        let (status, body) = post_json(serde_json::json!({
            "user_id": "u1",
            "exam_structure": {
                "topics": [{
                    "topic_id": "no-such-topic",
                    "topic_kind": "main",
                    "difficulty_counts": {"easy": 1, "medium": 1, "hard": 1}
                }],
                "passing_threshold": 0.5
            }
        }))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.code, "EMPTY_EXAM");
    }
}
