//! Difficulty derivation and bank assembly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::scale::to_standard_normal;
use crate::bank::{ItemBank, TopicMap};
use crate::config::EngineConfig;
use crate::model::{Item, ItemParams, ItemStats, Response};

/// Outcome counters for one calibration run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalibrationReport {
    /// Responses that entered the aggregation.
    pub responses_used: usize,
    /// Responses dropped for missing or invalid fields.
    pub malformed_dropped: usize,
    /// Items that received a data-derived difficulty.
    pub calibrated_items: usize,
    /// Items emitted with the neutral default (no attempts recorded).
    pub uncalibrated_items: usize,
}

/// Accumulator for one item's aggregate statistics.
#[derive(Default)]
struct ItemAccumulator {
    attempts: usize,
    correct: usize,
    time_sum: f64,
    timed_attempts: usize,
}

/// Derives per-item difficulties from the full response history.
#[derive(Debug, Clone)]
pub struct BankCalibrator {
    config: EngineConfig,
}

impl BankCalibrator {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Calibrates an item bank from responses and the item-topic mapping.
    ///
    /// The bank covers the union of items seen in the responses and items
    /// listed in the topic map; mapped items without any attempt are emitted
    /// uncalibrated with neutral difficulty.
    pub fn calibrate(
        &self,
        responses: &[Response],
        topic_map: &TopicMap,
    ) -> (ItemBank, CalibrationReport) {
        let mut report = CalibrationReport::default();
        let mut accumulators: HashMap<String, ItemAccumulator> = HashMap::new();

        let mut global_time_sum = 0.0;
        let mut global_timed_count = 0usize;

        for response in responses {
            if !response.is_well_formed() {
                report.malformed_dropped += 1;
                continue;
            }
            report.responses_used += 1;

            let acc = accumulators.entry(response.item_id.clone()).or_default();
            acc.attempts += 1;
            if response.correct {
                acc.correct += 1;
            }
            if response.response_time_secs > 0.0 {
                acc.time_sum += response.response_time_secs;
                acc.timed_attempts += 1;
                global_time_sum += response.response_time_secs;
                global_timed_count += 1;
            }
        }

        let global_mean_time = if global_timed_count > 0 {
            global_time_sum / global_timed_count as f64
        } else {
            0.0
        };

        let mut items = Vec::with_capacity(accumulators.len());

        for (item_id, acc) in accumulators {
            let mean_time = if acc.timed_attempts > 0 {
                Some(acc.time_sum / acc.timed_attempts as f64)
            } else {
                None
            };
            let stats = ItemStats {
                attempt_count: acc.attempts,
                correct_count: acc.correct,
                mean_response_time: mean_time,
            };
            let difficulty = self.difficulty_from_stats(&stats, global_mean_time);
            report.calibrated_items += 1;

            items.push(Item {
                id: item_id,
                params: ItemParams {
                    difficulty,
                    discrimination: self.config.default_discrimination,
                    guessing: self.config.default_guessing,
                },
                stats,
                calibrated: true,
            });
        }

        // Mapped items nobody attempted yet still belong in the bank so that
        // exam assembly and forecasting can reference them.
        let seen: std::collections::HashSet<&str> =
            items.iter().map(|i| i.id.as_str()).collect();
        let missing: Vec<String> = topic_map
            .iter()
            .filter(|(item_id, _)| !seen.contains(item_id.as_str()))
            .map(|(item_id, _)| item_id.clone())
            .collect();
        for item_id in missing {
            report.uncalibrated_items += 1;
            items.push(Item::uncalibrated(
                item_id,
                ItemParams {
                    difficulty: 0.0,
                    discrimination: self.config.default_discrimination,
                    guessing: self.config.default_guessing,
                },
            ));
        }

        if report.malformed_dropped > 0 {
            debug!(
                dropped = report.malformed_dropped,
                "dropped malformed responses during calibration"
            );
        }
        info!(
            items = items.len(),
            calibrated = report.calibrated_items,
            uncalibrated = report.uncalibrated_items,
            responses = report.responses_used,
            "item bank calibrated"
        );

        (ItemBank::new(items, global_mean_time), report)
    }

    /// Difficulty on the standard-normal scale for one item's statistics.
    ///
    /// Blends the accuracy signal (weight 0.6 by default) with the
    /// response-time signal (weight 0.4). The time signal is linear in the
    /// ratio of the item's mean time to the corpus mean, centered at 0.5
    /// for an average-speed item, and is deliberately unsaturated: extreme
    /// ratios are absorbed by the `[0, 1]` clamp on the blended value.
    pub fn difficulty_from_stats(&self, stats: &ItemStats, global_mean_time: f64) -> f64 {
        if stats.attempt_count == 0 {
            return 0.0;
        }

        let difficulty_from_accuracy = 1.0 - stats.accuracy();

        let difficulty_from_time = match (stats.mean_response_time, global_mean_time) {
            (Some(mean_time), global) if global > 0.0 => {
                let ratio = mean_time / global;
                0.5 * (1.0 + (ratio - 1.0) * 0.5)
            }
            _ => 0.5,
        };

        let blended = self.config.accuracy_weight * difficulty_from_accuracy
            + self.config.time_weight * difficulty_from_time;

        to_standard_normal(blended.clamp(0.0, 1.0))
    }
}
