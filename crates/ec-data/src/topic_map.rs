//! Topic mapping file loading.
//!
//! The mapping is nominally CSV with columns `question_id`, `main_topic_id`,
//! `sub_topic_id`, `main_topic_name`, `sub_topic_name`. Some exports pack
//! every column into a single `|`-joined field, so the reader inspects the
//! header: when it contains `|`, rows are split on `|`; otherwise on `,`.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use ec_core::{TopicAssignment, TopicKind, TopicMap, TopicMeta};

use crate::error::LoadError;

/// Parses the topic mapping from its text content.
pub fn parse_topic_map(text: &str) -> Result<TopicMap, LoadError> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header = lines.next().ok_or(LoadError::EmptyTopicFile)?;

    let delimiter = if header.contains('|') { '|' } else { ',' };
    let columns: Vec<&str> = header.split(delimiter).map(str::trim).collect();

    let question_idx = column_index(&columns, "question_id")?;
    let main_idx = column_index(&columns, "main_topic_id")?;
    let sub_idx = columns.iter().position(|c| *c == "sub_topic_id");
    let main_name_idx = columns.iter().position(|c| *c == "main_topic_name");
    let sub_name_idx = columns.iter().position(|c| *c == "sub_topic_name");

    let mut assignments: HashMap<String, TopicAssignment> = HashMap::new();
    let mut topics: HashMap<String, TopicMeta> = HashMap::new();

    for line in lines {
        let fields: Vec<&str> = line.split(delimiter).map(str::trim).collect();
        if fields.len() != columns.len() {
            continue;
        }

        let question_id = fields[question_idx];
        let main_topic_id = fields[main_idx];
        if question_id.is_empty() || main_topic_id.is_empty() {
            continue;
        }

        let sub_topic_id = sub_idx
            .map(|i| fields[i])
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        if let Some(name_idx) = main_name_idx {
            topics.insert(
                main_topic_id.to_string(),
                TopicMeta {
                    name: fields[name_idx].to_string(),
                    kind: TopicKind::Main,
                },
            );
        }
        if let (Some(sub), Some(name_idx)) = (&sub_topic_id, sub_name_idx) {
            topics.insert(
                sub.clone(),
                TopicMeta {
                    name: fields[name_idx].to_string(),
                    kind: TopicKind::Sub,
                },
            );
        }

        assignments.insert(
            question_id.to_string(),
            TopicAssignment {
                main_topic_id: main_topic_id.to_string(),
                sub_topic_id,
            },
        );
    }

    Ok(TopicMap::new(assignments, topics))
}

/// Reads and parses a topic mapping file.
pub fn load_topic_file(path: &Path) -> Result<TopicMap, LoadError> {
    let text = std::fs::read_to_string(path)?;
    let map = parse_topic_map(&text)?;
    debug!(path = %path.display(), items = map.len(), "loaded topic mapping");
    Ok(map)
}

fn column_index(columns: &[&str], name: &'static str) -> Result<usize, LoadError> {
    columns
        .iter()
        .position(|c| *c == name)
        .ok_or(LoadError::MissingColumn(name))
}
