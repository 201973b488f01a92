//! Shared application state.
//!
//! The calibrated bank, the topic map, and the per-learner response index
//! are published together as one immutable snapshot behind an `Arc`.
//! Handlers clone the `Arc` and work against a consistent view; a reload
//! calibrates a fresh snapshot and swaps the reference, so in-flight
//! requests finish against whichever snapshot they started with.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use tracing::info;

use ec_core::{BankCalibrator, EngineConfig, ItemBank, Response, TopicMap};
use ec_data::LoadError;

/// Locations of the flat data files, kept for reload.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub response_history_path: PathBuf,
    pub item_topic_map_path: PathBuf,
}

/// One immutable, internally consistent view of the loaded data.
#[derive(Debug)]
pub struct Snapshot {
    pub bank: Arc<ItemBank>,
    pub topic_map: Arc<TopicMap>,
    pub responses_by_learner: Arc<HashMap<String, Vec<Response>>>,
}

/// Counters describing a (re)load.
#[derive(Debug, Clone, Default)]
pub struct ReloadStats {
    pub items: usize,
    pub calibrated_items: usize,
    pub learners: usize,
    pub responses: usize,
    pub dropped_records: usize,
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<StateInner>,
}

struct StateInner {
    snapshot: RwLock<Arc<Snapshot>>,
    engine_config: EngineConfig,
    data_paths: Option<DataPaths>,
}

impl AppState {
    /// Creates state from an already-built snapshot.
    pub fn new(snapshot: Snapshot, engine_config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(StateInner {
                snapshot: RwLock::new(Arc::new(snapshot)),
                engine_config,
                data_paths: None,
            }),
        }
    }

    /// Creates state that can reload itself from the given files.
    pub fn with_data_paths(
        snapshot: Snapshot,
        engine_config: EngineConfig,
        data_paths: DataPaths,
    ) -> Self {
        Self {
            inner: Arc::new(StateInner {
                snapshot: RwLock::new(Arc::new(snapshot)),
                engine_config,
                data_paths: Some(data_paths),
            }),
        }
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.snapshot.read().expect("snapshot lock").clone()
    }

    /// Atomically publishes a new snapshot.
    pub fn publish(&self, snapshot: Snapshot) {
        *self.inner.snapshot.write().expect("snapshot lock") = Arc::new(snapshot);
    }

    /// The engine configuration this service runs with.
    pub fn engine_config(&self) -> &EngineConfig {
        &self.inner.engine_config
    }

    /// The data paths, when the service was started from files.
    pub fn data_paths(&self) -> Option<&DataPaths> {
        self.inner.data_paths.as_ref()
    }
}

/// Loads the data files and calibrates a fresh snapshot.
pub fn load_snapshot(
    paths: &DataPaths,
    engine_config: &EngineConfig,
) -> Result<(Snapshot, ReloadStats), LoadError> {
    let records = ec_data::load_progress_file(&paths.response_history_path)?;
    let topic_map = ec_data::load_topic_file(&paths.item_topic_map_path)?;

    let (all, corpus_report) = ec_data::all_responses(&records);
    let (by_learner, _) = ec_data::responses_by_learner(&records);

    let (bank, calibration_report) =
        BankCalibrator::new(engine_config.clone()).calibrate(&all, &topic_map);

    let stats = ReloadStats {
        items: bank.len(),
        calibrated_items: bank.calibrated_count(),
        learners: by_learner.len(),
        responses: corpus_report.converted,
        dropped_records: corpus_report.dropped + calibration_report.malformed_dropped,
    };

    info!(
        items = stats.items,
        learners = stats.learners,
        responses = stats.responses,
        dropped = stats.dropped_records,
        "snapshot loaded"
    );

    Ok((
        Snapshot {
            bank: Arc::new(bank),
            topic_map: Arc::new(topic_map),
            responses_by_learner: Arc::new(by_learner),
        },
        stats,
    ))
}
