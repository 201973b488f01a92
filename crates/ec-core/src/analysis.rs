//! Bank analysis: descriptive statistics over the calibrated item bank.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bank::{ItemBank, TopicMap};

/// Number of top main topics reported by the analysis.
const TOP_TOPIC_COUNT: usize = 5;

/// Key used for items without a topic assignment.
const UNKNOWN_TOPIC: &str = "unknown";

/// Distribution summary for item difficulties.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DifficultyStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
}

/// Distribution summary for item discriminations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscriminationStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

impl Default for DiscriminationStats {
    fn default() -> Self {
        Self {
            min: 1.0,
            max: 1.0,
            mean: 1.0,
            median: 1.0,
        }
    }
}

/// Item counts per difficulty band.
///
/// Bands partition the standard-normal scale: easy `[-3, -1)`,
/// medium `[-1, 1]`, hard `(1, 3]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DifficultyBands {
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
}

/// One entry in the top-topics ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicCount {
    pub topic_id: String,
    pub question_count: usize,
}

/// Item counts per topic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopicDistribution {
    pub by_main_topic: BTreeMap<String, usize>,
    pub by_sub_topic: BTreeMap<String, usize>,
    pub total_main_topics: usize,
    pub total_sub_topics: usize,
    /// Main topics with the most items, largest first.
    pub top_main_topics: Vec<TopicCount>,
}

/// Snapshot of bank-wide statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BankAnalysis {
    pub total_items: usize,
    pub calibrated_items: usize,
    pub difficulty: DifficultyStats,
    pub discrimination: DiscriminationStats,
    pub bands: DifficultyBands,
    pub topics: TopicDistribution,
}

impl BankAnalysis {
    /// Computes the analysis over a bank and its topic mapping.
    pub fn compute(bank: &ItemBank, topic_map: &TopicMap) -> Self {
        if bank.is_empty() {
            return Self::default();
        }

        let mut difficulties: Vec<f64> = bank.items().map(|i| i.params.difficulty).collect();
        let mut discriminations: Vec<f64> = bank.items().map(|i| i.params.discrimination).collect();
        difficulties.sort_by(|a, b| a.partial_cmp(b).unwrap());
        discriminations.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let mut bands = DifficultyBands::default();
        for &b in &difficulties {
            if (-3.0..-1.0).contains(&b) {
                bands.easy += 1;
            } else if (-1.0..=1.0).contains(&b) {
                bands.medium += 1;
            } else if b > 1.0 && b <= 3.0 {
                bands.hard += 1;
            }
        }

        let mut by_main: BTreeMap<String, usize> = BTreeMap::new();
        let mut by_sub: BTreeMap<String, usize> = BTreeMap::new();
        for item in bank.items() {
            let main = topic_map
                .main_topic(&item.id)
                .unwrap_or(UNKNOWN_TOPIC)
                .to_string();
            *by_main.entry(main).or_default() += 1;

            let sub = topic_map
                .sub_topic(&item.id)
                .unwrap_or(UNKNOWN_TOPIC)
                .to_string();
            *by_sub.entry(sub).or_default() += 1;
        }

        let mut ranked: Vec<TopicCount> = by_main
            .iter()
            .map(|(topic_id, &question_count)| TopicCount {
                topic_id: topic_id.clone(),
                question_count,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.question_count
                .cmp(&a.question_count)
                .then_with(|| a.topic_id.cmp(&b.topic_id))
        });
        ranked.truncate(TOP_TOPIC_COUNT);

        Self {
            total_items: bank.len(),
            calibrated_items: bank.calibrated_count(),
            difficulty: DifficultyStats {
                min: difficulties[0],
                max: *difficulties.last().unwrap(),
                mean: mean(&difficulties),
                median: median_of_sorted(&difficulties),
                std_dev: std_dev(&difficulties),
            },
            discrimination: DiscriminationStats {
                min: discriminations[0],
                max: *discriminations.last().unwrap(),
                mean: mean(&discriminations),
                median: median_of_sorted(&discriminations),
            },
            bands,
            topics: TopicDistribution {
                total_main_topics: by_main.len(),
                total_sub_topics: by_sub.len(),
                by_main_topic: by_main,
                by_sub_topic: by_sub,
                top_main_topics: ranked,
            },
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}
