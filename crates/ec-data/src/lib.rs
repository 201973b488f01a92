//! # ec-data
//!
//! Loading and normalization of the two flat files the engine consumes:
//! the aggregated response-history export (JSON) and the item-to-topic
//! mapping (delimited text).
//!
//! Upstream exports are messy: identifiers arrive as numbers or strings,
//! timing data is a JSON document packed inside a string field, and the
//! topic file sometimes packs every column into one pipe-joined field.
//! The loaders normalize all of that, dropping and counting records that
//! cannot be salvaged; a malformed record is never fatal.

mod error;
mod progress;
mod topic_map;

pub use error::LoadError;
pub use progress::{
    all_responses, learner_responses, load_progress_file, parse_progress_json,
    responses_by_learner, LoadReport, ProgressRecord,
};
pub use topic_map::{load_topic_file, parse_topic_map};
