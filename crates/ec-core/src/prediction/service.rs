//! End-to-end forecasting for a learner against a prospective exam.
//!
//! Estimates the learner's ability from their history, then forecasts the
//! exam. When a topic map is supplied, each exam item is scored at the
//! learner's main-topic ability where one was estimable, falling back to
//! the overall estimate, so strength in one topic does not inflate the
//! forecast for another.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::forecast::{ExamForecaster, ExamSpec, PassForecast};
use crate::ability::AbilityEstimator;
use crate::bank::{ItemBank, TopicMap};
use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::irt;
use crate::model::Response;

/// Per-topic answer counts from the learner's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicAnswerStats {
    pub total: usize,
    pub correct: usize,
    pub accuracy_pct: f64,
}

/// Context describing the exam and the ability signals the forecast used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamSummary {
    pub total_questions: usize,
    pub average_difficulty: f64,
    pub min_correct_needed: usize,
    pub overall_ability: f64,
    pub ability_confidence: f64,
    /// Main-topic abilities that informed per-item probabilities.
    pub main_topic_abilities: BTreeMap<String, f64>,
    /// Historical answer counts per main topic.
    pub topic_statistics: BTreeMap<String, TopicAnswerStats>,
}

/// A forecast together with its explanatory summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastOutcome {
    pub forecast: PassForecast,
    pub summary: ExamSummary,
}

/// Orchestrates ability estimation and exam forecasting for one learner.
#[derive(Debug, Clone)]
pub struct ForecastService {
    estimator: AbilityEstimator,
    forecaster: ExamForecaster,
}

impl ForecastService {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            estimator: AbilityEstimator::new(config.clone()),
            forecaster: ExamForecaster::new(config),
        }
    }

    /// Forecasts the exam for a learner given their response history.
    pub fn forecast_for_learner(
        &self,
        learner_id: &str,
        responses: &[Response],
        bank: &ItemBank,
        topic_map: &TopicMap,
        spec: &ExamSpec,
    ) -> EngineResult<ForecastOutcome> {
        let profile = self
            .estimator
            .estimate_by_topic(learner_id, responses, bank, topic_map)?;

        let topic_thetas: BTreeMap<String, f64> = profile
            .main_topics
            .iter()
            .map(|(topic_id, estimate)| (topic_id.clone(), estimate.theta))
            .collect();

        // Per-item probability at the most specific ability available.
        let probs: Vec<f64> = spec
            .items
            .iter()
            .map(|item| {
                let theta = item
                    .item_id
                    .as_deref()
                    .and_then(|id| topic_map.main_topic(id))
                    .and_then(|topic_id| topic_thetas.get(topic_id))
                    .copied()
                    .unwrap_or(profile.overall.theta);
                irt::probability(theta, &item.params)
            })
            .collect();

        let forecast = self.forecaster.forecast_from_probabilities(
            probs,
            spec.passing_threshold,
            profile.overall.confidence,
        )?;

        let total_questions = spec.items.len();
        let average_difficulty = spec
            .items
            .iter()
            .map(|item| item.params.difficulty)
            .sum::<f64>()
            / total_questions as f64;

        let summary = ExamSummary {
            total_questions,
            average_difficulty,
            min_correct_needed: spec.min_correct(),
            overall_ability: profile.overall.theta,
            ability_confidence: profile.overall.confidence,
            main_topic_abilities: topic_thetas,
            topic_statistics: topic_answer_stats(responses, topic_map),
        };

        debug!(
            learner = learner_id,
            items = total_questions,
            pass_pct = forecast.pass_probability_pct,
            "exam forecast computed"
        );

        Ok(ForecastOutcome { forecast, summary })
    }
}

/// Aggregates the learner's historical answers by main topic.
fn topic_answer_stats(
    responses: &[Response],
    topic_map: &TopicMap,
) -> BTreeMap<String, TopicAnswerStats> {
    let mut totals: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for response in responses {
        if let Some(topic_id) = topic_map.main_topic(&response.item_id) {
            let entry = totals.entry(topic_id.to_string()).or_insert((0, 0));
            entry.0 += 1;
            if response.correct {
                entry.1 += 1;
            }
        }
    }

    totals
        .into_iter()
        .map(|(topic_id, (total, correct))| {
            let accuracy_pct = if total > 0 {
                correct as f64 / total as f64 * 100.0
            } else {
                0.0
            };
            (
                topic_id,
                TopicAnswerStats {
                    total,
                    correct,
                    accuracy_pct,
                },
            )
        })
        .collect()
}
