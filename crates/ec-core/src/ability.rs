//! Maximum-likelihood ability estimation.
//!
//! Ability is the theta maximizing the 3PL log-likelihood of a learner's
//! responses, found by Newton-Raphson on the closed-form score and Fisher
//! information. The iteration is bounded, clamped to the ability scale, and
//! guarded against flat information and log singularities, so it terminates
//! for every input including all-correct and all-incorrect histories (which
//! converge to the scale boundary with low confidence).

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::bank::{ItemBank, TopicMap};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::irt;
use crate::model::{AbilityEstimate, ItemParams, Response};

/// Floor applied to the information before dividing or inverting.
const INFORMATION_FLOOR: f64 = 1e-6;

/// Probabilities are nudged this far into the interior of `(c, 1)` before
/// the score and information are evaluated.
const INTERIOR_NUDGE: f64 = 1e-9;

/// A learner's overall ability together with per-topic breakdowns.
///
/// Topic maps are ordered by topic id ascending; topic groups with fewer
/// responses than the configured minimum are omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicAbilityProfile {
    pub learner_id: String,
    pub overall: AbilityEstimate,
    pub main_topics: BTreeMap<String, AbilityEstimate>,
    pub sub_topics: BTreeMap<String, AbilityEstimate>,
}

/// One learner's input to the batch operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerResponses {
    pub learner_id: String,
    pub responses: Vec<Response>,
}

/// One learner's outcome from the batch operation.
///
/// Failures are carried in-band; a batch call never fails as a whole.
#[derive(Debug, Clone)]
pub struct LearnerAbilityOutcome {
    pub learner_id: String,
    pub result: EngineResult<TopicAbilityProfile>,
}

/// Estimates learner ability against a calibrated item bank.
#[derive(Debug, Clone)]
pub struct AbilityEstimator {
    config: EngineConfig,
}

impl AbilityEstimator {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Estimates a learner's overall ability from their responses.
    ///
    /// Fails with [`EngineError::NoResponses`] on an empty history and
    /// [`EngineError::UnknownItem`] when a response references an item the
    /// bank does not contain.
    pub fn estimate(
        &self,
        learner_id: &str,
        responses: &[Response],
        bank: &ItemBank,
    ) -> EngineResult<AbilityEstimate> {
        let scored = self.resolve(learner_id, responses, bank)?;
        self.solve(learner_id, &scored)
    }

    /// Estimates overall ability plus one estimate per main and sub topic.
    ///
    /// Responses whose items carry no topic assignment contribute to the
    /// overall estimate only. Topic groups below `min_topic_responses`
    /// responses are omitted from the output.
    pub fn estimate_by_topic(
        &self,
        learner_id: &str,
        responses: &[Response],
        bank: &ItemBank,
        topic_map: &TopicMap,
    ) -> EngineResult<TopicAbilityProfile> {
        let overall = self.estimate(learner_id, responses, bank)?;

        let mut main_groups: BTreeMap<String, Vec<&Response>> = BTreeMap::new();
        let mut sub_groups: BTreeMap<String, Vec<&Response>> = BTreeMap::new();

        for response in responses {
            if let Some(assignment) = topic_map.assignment(&response.item_id) {
                main_groups
                    .entry(assignment.main_topic_id.clone())
                    .or_default()
                    .push(response);
                if let Some(sub) = &assignment.sub_topic_id {
                    sub_groups.entry(sub.clone()).or_default().push(response);
                }
            }
        }

        let main_topics = self.estimate_groups(learner_id, main_groups, bank)?;
        let sub_topics = self.estimate_groups(learner_id, sub_groups, bank)?;

        Ok(TopicAbilityProfile {
            learner_id: learner_id.to_string(),
            overall,
            main_topics,
            sub_topics,
        })
    }

    /// Estimates topic profiles for many learners, in input order.
    ///
    /// Per-learner failures are reported in-band; estimations run in
    /// parallel and read the bank by shared reference.
    pub fn estimate_batch(
        &self,
        requests: &[LearnerResponses],
        bank: &ItemBank,
        topic_map: &TopicMap,
    ) -> Vec<LearnerAbilityOutcome> {
        let outcomes: Vec<LearnerAbilityOutcome> = requests
            .par_iter()
            .map(|request| LearnerAbilityOutcome {
                learner_id: request.learner_id.clone(),
                result: self.estimate_by_topic(
                    &request.learner_id,
                    &request.responses,
                    bank,
                    topic_map,
                ),
            })
            .collect();

        let failures = outcomes.iter().filter(|o| o.result.is_err()).count();
        debug!(
            learners = outcomes.len(),
            failures, "batch ability estimation finished"
        );

        outcomes
    }

    fn estimate_groups(
        &self,
        learner_id: &str,
        groups: BTreeMap<String, Vec<&Response>>,
        bank: &ItemBank,
    ) -> EngineResult<BTreeMap<String, AbilityEstimate>> {
        let mut estimates = BTreeMap::new();
        for (topic_id, group) in groups {
            if group.len() < self.config.min_topic_responses {
                continue;
            }
            let owned: Vec<Response> = group.into_iter().cloned().collect();
            let scored = self.resolve(learner_id, &owned, bank)?;
            estimates.insert(topic_id, self.solve(learner_id, &scored)?);
        }
        Ok(estimates)
    }

    /// Resolves response item ids against the bank.
    fn resolve(
        &self,
        learner_id: &str,
        responses: &[Response],
        bank: &ItemBank,
    ) -> EngineResult<Vec<(ItemParams, f64)>> {
        if responses.is_empty() {
            return Err(EngineError::NoResponses(learner_id.to_string()));
        }
        responses
            .iter()
            .map(|response| {
                let params = bank
                    .params(&response.item_id)
                    .ok_or_else(|| EngineError::UnknownItem(response.item_id.clone()))?;
                Ok((params, if response.correct { 1.0 } else { 0.0 }))
            })
            .collect()
    }

    /// Newton-Raphson solve over the resolved responses.
    fn solve(&self, learner_id: &str, scored: &[(ItemParams, f64)]) -> EngineResult<AbilityEstimate> {
        let clip = self.config.ability_clip;
        let mut theta = 0.0;
        let mut restarted = false;
        let mut iterations = 0;

        for _ in 0..self.config.newton_max_iter {
            iterations += 1;
            let (score, information) = score_and_information(theta, scored);

            if !score.is_finite() || !information.is_finite() {
                if restarted {
                    return Err(EngineError::NumericInstability(learner_id.to_string()));
                }
                restarted = true;
                theta = 0.0;
                continue;
            }

            let step = score / information.max(INFORMATION_FLOOR);
            let next = (theta + step).clamp(-clip, clip);

            if !next.is_finite() {
                if restarted {
                    return Err(EngineError::NumericInstability(learner_id.to_string()));
                }
                restarted = true;
                theta = 0.0;
                continue;
            }

            let change = (next - theta).abs();
            theta = next;
            if change < self.config.newton_tol {
                break;
            }
        }

        let (_, information) = score_and_information(theta, scored);
        if !theta.is_finite() || !information.is_finite() {
            return Err(EngineError::NumericInstability(learner_id.to_string()));
        }

        let standard_error = 1.0 / information.max(INFORMATION_FLOOR).sqrt();
        let confidence = 1.0 / (1.0 + standard_error);

        trace!(
            learner = learner_id,
            theta,
            standard_error,
            iterations,
            "ability estimate converged"
        );

        Ok(AbilityEstimate {
            theta,
            standard_error,
            confidence,
            num_responses: scored.len(),
        })
    }
}

/// Score (log-likelihood derivative) and Fisher information at `theta`.
///
/// Each probability is nudged into the interior of `(c, 1)` before use so
/// that boundary responses cannot produce log singularities.
fn score_and_information(theta: f64, scored: &[(ItemParams, f64)]) -> (f64, f64) {
    let mut score = 0.0;
    let mut information = 0.0;

    for (params, u) in scored {
        let a = params.discrimination;
        let c = params.guessing;
        let lo = c + INTERIOR_NUDGE;
        let hi = 1.0 - INTERIOR_NUDGE;
        let p = irt::probability(theta, params).clamp(lo, hi);

        score += a * (u - p) * (p - c) / (p * (1.0 - c));
        information += a.powi(2) * (p - c).powi(2) * (1.0 - p) / ((1.0 - c).powi(2) * p);
    }

    (score, information)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::TopicAssignment;
    use crate::model::Item;
    use std::collections::HashMap;

    fn bank_with(items: Vec<(&str, f64, f64)>) -> ItemBank {
        // (id, difficulty, guessing)
        let items = items
            .into_iter()
            .map(|(id, difficulty, guessing)| Item {
                id: id.to_string(),
                params: ItemParams {
                    difficulty,
                    discrimination: 1.0,
                    guessing,
                },
                stats: Default::default(),
                calibrated: true,
            })
            .collect();
        ItemBank::new(items, 30.0)
    }

    fn estimator() -> AbilityEstimator {
        AbilityEstimator::new(EngineConfig::default())
    }

    #[test]
    fn test_empty_history_fails() {
        let bank = bank_with(vec![("q1", 0.0, 0.25)]);
        let err = estimator().estimate("u1", &[], &bank).unwrap_err();
        assert_eq!(err.kind_code(), "NO_RESPONSES");
    }

    #[test]
    fn test_unknown_item_fails() {
        let bank = bank_with(vec![("q1", 0.0, 0.25)]);
        let responses = vec![Response::new("q-missing", true, 10.0)];
        let err = estimator().estimate("u1", &responses, &bank).unwrap_err();
        assert_eq!(err.kind_code(), "UNKNOWN_ITEM");
    }

    #[test]
    fn test_all_correct_hits_upper_bound_with_low_confidence() {
        let bank = bank_with(vec![("q1", 0.0, 0.25)]);
        let responses = vec![Response::new("q1", true, 10.0); 5];
        let estimate = estimator().estimate("u1", &responses, &bank).unwrap();

        assert!(
            (estimate.theta - 3.0).abs() < 1e-9,
            "all-correct should clamp at +3, got {}",
            estimate.theta
        );
        assert!(
            estimate.confidence < 0.3,
            "boundary estimate should have low confidence, got {}",
            estimate.confidence
        );
        assert_eq!(estimate.num_responses, 5);
    }

    #[test]
    fn test_all_incorrect_hits_lower_bound() {
        let bank = bank_with(vec![("q1", 0.0, 0.25)]);
        let responses = vec![Response::new("q1", false, 10.0); 5];
        let estimate = estimator().estimate("u1", &responses, &bank).unwrap();
        assert!(
            (estimate.theta + 3.0).abs() < 1e-9,
            "all-incorrect should clamp at -3, got {}",
            estimate.theta
        );
    }

    #[test]
    fn test_balanced_history_centers_near_zero() {
        // One correct and one incorrect at each of b = -1, 0, +1 on
        // zero-guessing items is symmetric around theta = 0.
        let bank = bank_with(vec![
            ("easy", -1.0, 0.0),
            ("mid", 0.0, 0.0),
            ("hard", 1.0, 0.0),
        ]);
        let responses = vec![
            Response::new("easy", true, 10.0),
            Response::new("easy", false, 10.0),
            Response::new("mid", true, 10.0),
            Response::new("mid", false, 10.0),
            Response::new("hard", true, 10.0),
            Response::new("hard", false, 10.0),
        ];
        let estimate = estimator().estimate("u1", &responses, &bank).unwrap();

        assert!(
            estimate.theta.abs() < 0.2,
            "balanced history should center near 0, got {}",
            estimate.theta
        );
        assert!(
            estimate.confidence > 0.5,
            "six balanced responses should be reasonably confident, got {}",
            estimate.confidence
        );
    }

    #[test]
    fn test_single_response_finite_with_low_confidence() {
        let bank = bank_with(vec![("q1", 0.0, 0.25)]);
        let responses = vec![Response::new("q1", true, 10.0)];
        let estimate = estimator().estimate("u1", &responses, &bank).unwrap();

        assert!(estimate.theta.is_finite());
        assert!(estimate.theta >= -3.0 && estimate.theta <= 3.0);
        assert!(
            estimate.confidence < 0.3,
            "one response cannot be confident, got {}",
            estimate.confidence
        );
    }

    #[test]
    fn test_adding_correct_response_never_lowers_theta() {
        let bank = bank_with(vec![("q1", -0.5, 0.25), ("q2", 0.5, 0.25), ("q3", 0.0, 0.25)]);
        let mut responses = vec![
            Response::new("q1", true, 10.0),
            Response::new("q2", false, 10.0),
        ];
        let before = estimator().estimate("u1", &responses, &bank).unwrap();

        responses.push(Response::new("q3", true, 10.0));
        let after = estimator().estimate("u1", &responses, &bank).unwrap();

        assert!(
            after.theta >= before.theta - 1e-9,
            "correct response lowered theta: {} -> {}",
            before.theta,
            after.theta
        );
    }

    #[test]
    fn test_adding_incorrect_response_never_raises_theta() {
        let bank = bank_with(vec![("q1", -0.5, 0.25), ("q2", 0.5, 0.25), ("q3", 0.0, 0.25)]);
        let mut responses = vec![
            Response::new("q1", true, 10.0),
            Response::new("q2", false, 10.0),
        ];
        let before = estimator().estimate("u1", &responses, &bank).unwrap();

        responses.push(Response::new("q3", false, 10.0));
        let after = estimator().estimate("u1", &responses, &bank).unwrap();

        assert!(
            after.theta <= before.theta + 1e-9,
            "incorrect response raised theta: {} -> {}",
            before.theta,
            after.theta
        );
    }

    #[test]
    fn test_duplicate_responses_contribute_independently() {
        let bank = bank_with(vec![("q1", 0.0, 0.25), ("q2", 0.0, 0.25)]);
        let one = vec![
            Response::new("q1", true, 10.0),
            Response::new("q2", false, 10.0),
        ];
        let doubled = vec![
            Response::new("q1", true, 10.0),
            Response::new("q1", true, 10.0),
            Response::new("q2", false, 10.0),
            Response::new("q2", false, 10.0),
        ];
        let single = estimator().estimate("u1", &one, &bank).unwrap();
        let double = estimator().estimate("u1", &doubled, &bank).unwrap();

        // Same point estimate, tighter standard error from twice the data.
        assert!((single.theta - double.theta).abs() < 1e-6);
        assert!(double.standard_error < single.standard_error);
    }

    fn topic_map() -> TopicMap {
        let mut assignments = HashMap::new();
        assignments.insert(
            "q1".to_string(),
            TopicAssignment {
                main_topic_id: "math".into(),
                sub_topic_id: Some("fractions".into()),
            },
        );
        assignments.insert(
            "q2".to_string(),
            TopicAssignment {
                main_topic_id: "reading".into(),
                sub_topic_id: None,
            },
        );
        TopicMap::new(assignments, HashMap::new())
    }

    #[test]
    fn test_topic_profile_groups_and_orders() {
        let bank = bank_with(vec![("q1", 0.0, 0.25), ("q2", 0.0, 0.25), ("q3", 0.0, 0.25)]);
        let responses = vec![
            Response::new("q2", false, 10.0),
            Response::new("q1", true, 10.0),
            Response::new("q3", true, 10.0), // unmapped: overall only
        ];
        let profile = estimator()
            .estimate_by_topic("u1", &responses, &bank, &topic_map())
            .unwrap();

        assert_eq!(profile.overall.num_responses, 3);
        let main_ids: Vec<&String> = profile.main_topics.keys().collect();
        assert_eq!(main_ids, vec!["math", "reading"], "topics sorted ascending");
        assert_eq!(profile.main_topics["math"].num_responses, 1);
        assert_eq!(profile.sub_topics.len(), 1);
        assert!(profile.sub_topics.contains_key("fractions"));
    }

    #[test]
    fn test_topic_groups_below_minimum_are_omitted() {
        let config = EngineConfig {
            min_topic_responses: 3,
            ..Default::default()
        };
        let bank = bank_with(vec![("q1", 0.0, 0.25), ("q2", 0.0, 0.25)]);
        let responses = vec![
            Response::new("q1", true, 10.0),
            Response::new("q2", false, 10.0),
        ];
        let profile = AbilityEstimator::new(config)
            .estimate_by_topic("u1", &responses, &bank, &topic_map())
            .unwrap();

        assert!(
            profile.main_topics.is_empty(),
            "groups with fewer than 3 responses must be omitted"
        );
    }

    #[test]
    fn test_batch_reports_failures_in_band() {
        let bank = bank_with(vec![("q1", 0.0, 0.25)]);
        let requests = vec![
            LearnerResponses {
                learner_id: "ok".into(),
                responses: vec![Response::new("q1", true, 10.0)],
            },
            LearnerResponses {
                learner_id: "empty".into(),
                responses: vec![],
            },
            LearnerResponses {
                learner_id: "ghost-item".into(),
                responses: vec![Response::new("q-missing", true, 10.0)],
            },
        ];
        let outcomes = estimator().estimate_batch(&requests, &bank, &TopicMap::default());

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].learner_id, "ok");
        assert!(outcomes[0].result.is_ok());
        assert_eq!(
            outcomes[1].result.as_ref().unwrap_err().kind_code(),
            "NO_RESPONSES"
        );
        assert_eq!(
            outcomes[2].result.as_ref().unwrap_err().kind_code(),
            "UNKNOWN_ITEM"
        );
    }
}
