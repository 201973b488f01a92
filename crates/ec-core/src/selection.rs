//! Item selection for exam assembly and adaptive questioning.
//!
//! Two strategies from the diagnostic flow:
//!
//! - maximum-information selection of the next item to ask at the current
//!   ability estimate
//! - difficulty-banded random assembly of an exam from a topic structure
//!   (so many easy/medium/hard items per topic)

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::bank::{ItemBank, TopicKind, TopicMap};
use crate::irt;
use crate::model::Item;
use crate::prediction::ExamItem;

/// How many items to draw from each difficulty band.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DifficultyCounts {
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
}

/// A topic slice of an exam to assemble.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicStructure {
    pub topic_id: String,
    #[serde(default = "default_topic_kind")]
    pub topic_kind: TopicKind,
    pub difficulty_counts: DifficultyCounts,
}

fn default_topic_kind() -> TopicKind {
    TopicKind::Sub
}

/// Picks the unanswered item contributing the most Fisher information at
/// the learner's current ability.
///
/// Returns `None` when every candidate has already been answered.
pub fn next_item<'a>(
    candidates: impl IntoIterator<Item = &'a Item>,
    answered: &HashSet<String>,
    theta: f64,
) -> Option<&'a Item> {
    candidates
        .into_iter()
        .filter(|item| !answered.contains(&item.id))
        .max_by(|a, b| {
            let ia = irt::information(theta, &a.params);
            let ib = irt::information(theta, &b.params);
            ia.partial_cmp(&ib).unwrap_or(std::cmp::Ordering::Equal)
        })
}

/// Assembles exam items from a topic structure by sampling each difficulty
/// band without replacement.
///
/// Bands with fewer candidates than requested contribute everything they
/// have; the caller decides whether a short exam is acceptable.
pub fn assemble_from_topic_structure<R: Rng>(
    bank: &ItemBank,
    topic_map: &TopicMap,
    structures: &[TopicStructure],
    rng: &mut R,
) -> Vec<ExamItem> {
    let mut selected = Vec::new();

    for structure in structures {
        let mut easy: Vec<&Item> = Vec::new();
        let mut medium: Vec<&Item> = Vec::new();
        let mut hard: Vec<&Item> = Vec::new();

        for item in bank.items() {
            let topic = match structure.topic_kind {
                TopicKind::Main => topic_map.main_topic(&item.id),
                TopicKind::Sub => topic_map.sub_topic(&item.id),
            };
            if topic != Some(structure.topic_id.as_str()) {
                continue;
            }
            let b = item.params.difficulty;
            if (-3.0..-1.0).contains(&b) {
                easy.push(item);
            } else if (-1.0..=1.0).contains(&b) {
                medium.push(item);
            } else if b > 1.0 && b <= 3.0 {
                hard.push(item);
            }
        }

        for (pool, count) in [
            (easy, structure.difficulty_counts.easy),
            (medium, structure.difficulty_counts.medium),
            (hard, structure.difficulty_counts.hard),
        ] {
            for item in sample(pool, count, rng) {
                selected.push(ExamItem::from_bank(item.id.clone(), item.params));
            }
        }
    }

    selected
}

fn sample<'a, R: Rng>(mut pool: Vec<&'a Item>, count: usize, rng: &mut R) -> Vec<&'a Item> {
    if count == 0 {
        return Vec::new();
    }
    if pool.len() <= count {
        return pool;
    }
    pool.shuffle(rng);
    pool.truncate(count);
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::TopicAssignment;
    use crate::model::ItemParams;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn item(id: &str, difficulty: f64) -> Item {
        Item {
            id: id.to_string(),
            params: ItemParams::with_difficulty(difficulty),
            stats: Default::default(),
            calibrated: true,
        }
    }

    #[test]
    fn test_next_item_prefers_difficulty_near_theta() {
        let items = vec![item("far", -2.5), item("near", 0.3), item("other", 2.0)];
        let chosen = next_item(&items, &HashSet::new(), 0.0).unwrap();
        assert_eq!(chosen.id, "near");
    }

    #[test]
    fn test_next_item_skips_answered() {
        let items = vec![item("a", 0.0), item("b", 0.5)];
        let answered: HashSet<String> = ["a".to_string()].into();
        let chosen = next_item(&items, &answered, 0.0).unwrap();
        assert_eq!(chosen.id, "b");
    }

    #[test]
    fn test_next_item_none_when_exhausted() {
        let items = vec![item("a", 0.0)];
        let answered: HashSet<String> = ["a".to_string()].into();
        assert!(next_item(&items, &answered, 0.0).is_none());
    }

    fn banded_bank() -> (ItemBank, TopicMap) {
        let mut items = Vec::new();
        let mut assignments = HashMap::new();
        for (i, b) in [-2.0, -1.5, 0.0, 0.5, 1.5, 2.5].iter().enumerate() {
            let id = format!("q{}", i);
            items.push(item(&id, *b));
            assignments.insert(
                id,
                TopicAssignment {
                    main_topic_id: "math".into(),
                    sub_topic_id: Some("algebra".into()),
                },
            );
        }
        (
            ItemBank::new(items, 30.0),
            TopicMap::new(assignments, HashMap::new()),
        )
    }

    #[test]
    fn test_assemble_respects_band_counts() {
        let (bank, topic_map) = banded_bank();
        let structures = vec![TopicStructure {
            topic_id: "math".into(),
            topic_kind: TopicKind::Main,
            difficulty_counts: DifficultyCounts {
                easy: 1,
                medium: 2,
                hard: 1,
            },
        }];
        let mut rng = StdRng::seed_from_u64(7);
        let exam = assemble_from_topic_structure(&bank, &topic_map, &structures, &mut rng);

        assert_eq!(exam.len(), 4);
        let easy = exam
            .iter()
            .filter(|i| i.params.difficulty < -1.0)
            .count();
        let hard = exam.iter().filter(|i| i.params.difficulty > 1.0).count();
        assert_eq!(easy, 1);
        assert_eq!(hard, 1);
    }

    #[test]
    fn test_assemble_short_band_takes_everything() {
        let (bank, topic_map) = banded_bank();
        let structures = vec![TopicStructure {
            topic_id: "math".into(),
            topic_kind: TopicKind::Main,
            difficulty_counts: DifficultyCounts {
                easy: 10,
                medium: 0,
                hard: 0,
            },
        }];
        let mut rng = StdRng::seed_from_u64(7);
        let exam = assemble_from_topic_structure(&bank, &topic_map, &structures, &mut rng);
        assert_eq!(exam.len(), 2, "only two easy items exist");
    }

    #[test]
    fn test_assemble_by_sub_topic() {
        let (bank, topic_map) = banded_bank();
        let structures = vec![TopicStructure {
            topic_id: "algebra".into(),
            topic_kind: TopicKind::Sub,
            difficulty_counts: DifficultyCounts {
                easy: 0,
                medium: 2,
                hard: 0,
            },
        }];
        let mut rng = StdRng::seed_from_u64(42);
        let exam = assemble_from_topic_structure(&bank, &topic_map, &structures, &mut rng);
        assert_eq!(exam.len(), 2);
    }

    #[test]
    fn test_assemble_unknown_topic_yields_nothing() {
        let (bank, topic_map) = banded_bank();
        let structures = vec![TopicStructure {
            topic_id: "geography".into(),
            topic_kind: TopicKind::Main,
            difficulty_counts: DifficultyCounts {
                easy: 1,
                medium: 1,
                hard: 1,
            },
        }];
        let mut rng = StdRng::seed_from_u64(1);
        let exam = assemble_from_topic_structure(&bank, &topic_map, &structures, &mut rng);
        assert!(exam.is_empty());
    }
}
