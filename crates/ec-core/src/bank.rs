//! The calibrated item bank and the item-to-topic mapping.
//!
//! The bank is produced once by the calibrator and read-only afterwards.
//! Recalibration builds a fresh bank; publishers swap the reference
//! atomically so in-flight estimations finish against the bank they started
//! with.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Item, ItemParams};

/// Immutable collection of calibrated items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemBank {
    items: HashMap<String, Item>,
    /// Mean response time across all recorded responses, in seconds.
    /// Zero when no attempt carried a usable time.
    pub global_mean_response_time: f64,
    /// When this bank was calibrated.
    pub generated_at: DateTime<Utc>,
}

impl ItemBank {
    /// Builds a bank from calibrated items.
    pub fn new(items: Vec<Item>, global_mean_response_time: f64) -> Self {
        Self {
            items: items.into_iter().map(|i| (i.id.clone(), i)).collect(),
            global_mean_response_time,
            generated_at: Utc::now(),
        }
    }

    /// Looks up an item by id.
    pub fn get(&self, item_id: &str) -> Option<&Item> {
        self.items.get(item_id)
    }

    /// Looks up the response-curve parameters for an item.
    pub fn params(&self, item_id: &str) -> Option<ItemParams> {
        self.items.get(item_id).map(|i| i.params)
    }

    /// Returns true when the bank contains the item.
    pub fn contains(&self, item_id: &str) -> bool {
        self.items.contains_key(item_id)
    }

    /// Number of items in the bank.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true when the bank holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over all items in unspecified order.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// Number of items that received a data-derived difficulty.
    pub fn calibrated_count(&self) -> usize {
        self.items.values().filter(|i| i.calibrated).count()
    }
}

/// Whether a topic is a main topic or a sub topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicKind {
    Main,
    Sub,
}

impl std::fmt::Display for TopicKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopicKind::Main => write!(f, "main"),
            TopicKind::Sub => write!(f, "sub"),
        }
    }
}

/// Topic assignment for a single item.
///
/// Each item has exactly one main topic and at most one sub topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicAssignment {
    pub main_topic_id: String,
    pub sub_topic_id: Option<String>,
}

/// Display metadata for a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicMeta {
    pub name: String,
    pub kind: TopicKind,
}

/// Mapping from items to topics, with topic display metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopicMap {
    assignments: HashMap<String, TopicAssignment>,
    topics: HashMap<String, TopicMeta>,
}

impl TopicMap {
    /// Builds a topic map from per-item assignments and topic metadata.
    pub fn new(
        assignments: HashMap<String, TopicAssignment>,
        topics: HashMap<String, TopicMeta>,
    ) -> Self {
        Self {
            assignments,
            topics,
        }
    }

    /// Returns the topic assignment for an item, if mapped.
    pub fn assignment(&self, item_id: &str) -> Option<&TopicAssignment> {
        self.assignments.get(item_id)
    }

    /// Returns the main topic id for an item, if mapped.
    pub fn main_topic(&self, item_id: &str) -> Option<&str> {
        self.assignments.get(item_id).map(|a| a.main_topic_id.as_str())
    }

    /// Returns the sub topic id for an item, if mapped.
    pub fn sub_topic(&self, item_id: &str) -> Option<&str> {
        self.assignments
            .get(item_id)
            .and_then(|a| a.sub_topic_id.as_deref())
    }

    /// Returns display metadata for a topic id.
    pub fn topic_meta(&self, topic_id: &str) -> Option<&TopicMeta> {
        self.topics.get(topic_id)
    }

    /// Number of mapped items.
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Returns true when no items are mapped.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Iterates over (item id, assignment) pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &TopicAssignment)> {
        self.assignments.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Item;

    fn sample_bank() -> ItemBank {
        let items = vec![
            Item {
                id: "q1".into(),
                params: ItemParams::with_difficulty(-0.5),
                stats: Default::default(),
                calibrated: true,
            },
            Item::uncalibrated("q2", ItemParams::default()),
        ];
        ItemBank::new(items, 28.0)
    }

    #[test]
    fn test_bank_lookup() {
        let bank = sample_bank();
        assert_eq!(bank.len(), 2);
        assert!(bank.contains("q1"));
        assert!(!bank.contains("q3"));
        assert!((bank.params("q1").unwrap().difficulty + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_bank_calibrated_count() {
        let bank = sample_bank();
        assert_eq!(bank.calibrated_count(), 1);
    }

    #[test]
    fn test_topic_map_lookup() {
        let mut assignments = HashMap::new();
        assignments.insert(
            "q1".to_string(),
            TopicAssignment {
                main_topic_id: "arithmetic".into(),
                sub_topic_id: Some("fractions".into()),
            },
        );
        assignments.insert(
            "q2".to_string(),
            TopicAssignment {
                main_topic_id: "algebra".into(),
                sub_topic_id: None,
            },
        );
        let map = TopicMap::new(assignments, HashMap::new());

        assert_eq!(map.main_topic("q1"), Some("arithmetic"));
        assert_eq!(map.sub_topic("q1"), Some("fractions"));
        assert_eq!(map.sub_topic("q2"), None);
        assert_eq!(map.main_topic("q3"), None);
        assert_eq!(map.len(), 2);
    }
}
