//! Request and response bodies.

use serde::{Deserialize, Serialize};

use ec_core::{ExamSummary, TopicAbilityProfile, TopicStructure};

use crate::error::ErrorResponse;

/// Request: estimate one learner's ability.
#[derive(Debug, Clone, Deserialize)]
pub struct EstimateAbilityRequest {
    pub user_id: String,
}

/// One per-topic ability entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicAbilityDto {
    pub topic_id: String,
    pub ability: f64,
    pub confidence: f64,
    pub num_responses: usize,
}

/// Ability payload shared by the single and batch endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilityBody {
    pub overall_ability: f64,
    pub confidence: f64,
    pub num_responses: usize,
    /// Sorted by topic id ascending.
    pub main_topic_abilities: Vec<TopicAbilityDto>,
    /// Sorted by topic id ascending.
    pub sub_topic_abilities: Vec<TopicAbilityDto>,
}

impl From<&TopicAbilityProfile> for AbilityBody {
    fn from(profile: &TopicAbilityProfile) -> Self {
        let to_dtos = |map: &std::collections::BTreeMap<String, ec_core::AbilityEstimate>| {
            map.iter()
                .map(|(topic_id, estimate)| TopicAbilityDto {
                    topic_id: topic_id.clone(),
                    ability: estimate.theta,
                    confidence: estimate.confidence,
                    num_responses: estimate.num_responses,
                })
                .collect()
        };
        Self {
            overall_ability: profile.overall.theta,
            confidence: profile.overall.confidence,
            num_responses: profile.overall.num_responses,
            main_topic_abilities: to_dtos(&profile.main_topics),
            sub_topic_abilities: to_dtos(&profile.sub_topics),
        }
    }
}

/// Response: one learner's ability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAbilityResponse {
    pub user_id: String,
    #[serde(flatten)]
    pub ability: AbilityBody,
}

/// Request: estimate abilities for several learners.
#[derive(Debug, Clone, Deserialize)]
pub struct EstimateAbilitiesBatchRequest {
    pub user_ids: Vec<String>,
}

/// One per-learner entry of the batch response.
///
/// Exactly one of `estimate` and `error` is set; the batch call itself
/// always succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchAbilityEntry {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate: Option<AbilityBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponse>,
}

/// Response: batch ability estimation, in request order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateAbilitiesBatchResponse {
    pub results: Vec<BatchAbilityEntry>,
}

/// One exam question, either bank-backed or fully specified.
#[derive(Debug, Clone, Deserialize)]
pub struct ExamQuestionDto {
    #[serde(default)]
    pub question_id: Option<String>,
    /// Overrides the bank difficulty when set.
    #[serde(default)]
    pub difficulty: Option<f64>,
    #[serde(default)]
    pub discrimination: Option<f64>,
    #[serde(default)]
    pub guessing: Option<f64>,
}

/// The exam to forecast: an explicit question list or a topic structure to
/// assemble from the bank.
#[derive(Debug, Clone, Deserialize)]
pub struct ExamStructureDto {
    #[serde(default)]
    pub questions: Option<Vec<ExamQuestionDto>>,
    #[serde(default)]
    pub topics: Option<Vec<TopicStructure>>,
    /// Fraction of items needed to pass, in `(0, 1]`.
    pub passing_threshold: f64,
    #[serde(default)]
    pub total_score: Option<u32>,
}

/// Request: pass-probability forecast for one learner.
#[derive(Debug, Clone, Deserialize)]
pub struct PassingProbabilityRequest {
    pub user_id: String,
    pub exam_structure: ExamStructureDto,
}

/// Response: pass-probability forecast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassingProbabilityResponse {
    pub user_id: String,
    /// Probability of passing, in `[0, 100]`.
    pub passing_probability: f64,
    /// Forecast confidence, in `[0, 1]`.
    pub confidence_score: f64,
    /// Expected score, in `[0, 100]`.
    pub expected_score: f64,
    /// The threshold echoed back as a percentage.
    pub passing_threshold: f64,
    pub exam_info: ExamSummary,
}

/// Response: service health.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub items: usize,
    pub calibrated_items: usize,
    pub learners: usize,
    pub uptime_seconds: u64,
}

/// Response: bank reload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub items: usize,
    pub calibrated_items: usize,
    pub learners: usize,
    pub responses: usize,
    pub dropped_records: usize,
}
