//! Response-history loading.
//!
//! The upstream progress export is a JSON array of per-(learner, item)
//! records. Correctness comes from the `histories` array (last entry 1 =
//! correct, empty = incorrect); response time comes from the most recent
//! span in the `playedTimes` field, which is itself a JSON document packed
//! into a string.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use ec_core::Response;

use crate::error::LoadError;

/// Response time assumed when the record carries no usable timing data.
const DEFAULT_RESPONSE_TIME_SECS: f64 = 30.0;

/// One raw record of the progress export.
///
/// Field types are deliberately loose; upstream sends identifiers as either
/// numbers or strings depending on export version.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub question_id: Option<Value>,
    /// Per-attempt correctness history; the last entry is the current state.
    #[serde(default)]
    pub histories: Vec<Value>,
    /// JSON-encoded array of `{startTime, endTime}` spans, as a string.
    #[serde(default)]
    pub played_times: Option<String>,
    #[serde(default)]
    pub last_update: Option<i64>,
}

/// One timing span inside the packed `playedTimes` document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayedSpan {
    #[serde(default)]
    start_time: i64,
    #[serde(default)]
    end_time: i64,
}

/// Counters for one load pass.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Records present in the export.
    pub total_records: usize,
    /// Records converted into responses.
    pub converted: usize,
    /// Records dropped for missing or unusable identifiers.
    pub dropped: usize,
}

/// Parses the progress export from its JSON text.
pub fn parse_progress_json(text: &str) -> Result<Vec<ProgressRecord>, LoadError> {
    Ok(serde_json::from_str(text)?)
}

/// Reads and parses a progress export file.
pub fn load_progress_file(path: &Path) -> Result<Vec<ProgressRecord>, LoadError> {
    let text = std::fs::read_to_string(path)?;
    let records = parse_progress_json(&text)?;
    debug!(path = %path.display(), records = records.len(), "loaded progress export");
    Ok(records)
}

/// Converts every record into a response, regardless of learner.
///
/// Used to build the calibration corpus.
pub fn all_responses(records: &[ProgressRecord]) -> (Vec<Response>, LoadReport) {
    let mut report = LoadReport {
        total_records: records.len(),
        ..Default::default()
    };
    let mut responses = Vec::with_capacity(records.len());

    for record in records {
        match record_to_response(record) {
            Some(response) => {
                report.converted += 1;
                responses.push(response);
            }
            None => report.dropped += 1,
        }
    }

    if report.dropped > 0 {
        warn!(
            dropped = report.dropped,
            total = report.total_records,
            "dropped malformed progress records"
        );
    }

    (responses, report)
}

/// Groups responses by learner id.
pub fn responses_by_learner(
    records: &[ProgressRecord],
) -> (HashMap<String, Vec<Response>>, LoadReport) {
    let mut report = LoadReport {
        total_records: records.len(),
        ..Default::default()
    };
    let mut by_learner: HashMap<String, Vec<Response>> = HashMap::new();

    for record in records {
        let learner = match record.user_id.as_ref().and_then(id_string) {
            Some(id) => id,
            None => {
                report.dropped += 1;
                continue;
            }
        };
        match record_to_response(record) {
            Some(response) => {
                report.converted += 1;
                by_learner.entry(learner).or_default().push(response);
            }
            None => report.dropped += 1,
        }
    }

    (by_learner, report)
}

/// Responses of a single learner.
pub fn learner_responses(records: &[ProgressRecord], learner_id: &str) -> Vec<Response> {
    records
        .iter()
        .filter(|record| {
            record
                .user_id
                .as_ref()
                .and_then(id_string)
                .is_some_and(|id| id == learner_id)
        })
        .filter_map(record_to_response)
        .collect()
}

/// Normalizes a record into a response; `None` when the item id is unusable.
fn record_to_response(record: &ProgressRecord) -> Option<Response> {
    let item_id = record.question_id.as_ref().and_then(id_string)?;

    let correct = record
        .histories
        .last()
        .and_then(Value::as_i64)
        .is_some_and(|h| h == 1);

    Some(Response {
        item_id,
        correct,
        response_time_secs: response_time(record.played_times.as_deref()),
        timestamp: record.last_update.unwrap_or(0),
    })
}

/// Extracts the response time from the packed `playedTimes` string.
///
/// Uses the most recent span; anything unparseable falls back to the
/// default, matching how the export has always been consumed.
fn response_time(played_times: Option<&str>) -> f64 {
    let Some(text) = played_times else {
        return DEFAULT_RESPONSE_TIME_SECS;
    };
    let spans: Vec<PlayedSpan> = match serde_json::from_str(text) {
        Ok(spans) => spans,
        Err(_) => return DEFAULT_RESPONSE_TIME_SECS,
    };
    let Some(span) = spans.last() else {
        return DEFAULT_RESPONSE_TIME_SECS;
    };
    if span.end_time > span.start_time {
        (span.end_time - span.start_time) as f64 / 1000.0
    } else {
        DEFAULT_RESPONSE_TIME_SECS
    }
}

/// Renders a JSON identifier as a non-empty string.
fn id_string(value: &Value) -> Option<String> {
    let id = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}
