//! Shared fixtures for route tests.

use std::collections::HashMap;
use std::sync::Arc;

use ec_core::{
    BankCalibrator, EngineConfig, Response, TopicAssignment, TopicMap,
};

use crate::state::{AppState, Snapshot};

/// Builds a state with a small calibrated bank and two learners.
///
/// Items q1/q2 belong to main topic `math`, q3/q4 to `reading`. Learner
/// `u1` is strong in math and weak in reading; learner `u2` has a single
/// response.
pub fn test_state() -> AppState {
    let topic_map = test_topic_map();

    // Population history for calibration: varied accuracy and speed.
    let mut population = Vec::new();
    // Chosen so every item calibrates into the medium difficulty band.
    let profile = [
        ("q1", 7, 10, 30.0),
        ("q2", 6, 10, 30.0),
        ("q3", 5, 10, 30.0),
        ("q4", 3, 10, 50.0),
    ];
    for (item, correct, total, time) in profile {
        for i in 0..total {
            population.push(Response::new(item, i < correct, time));
        }
    }

    let config = EngineConfig::default();
    let (bank, _) = BankCalibrator::new(config.clone()).calibrate(&population, &topic_map);

    let mut by_learner: HashMap<String, Vec<Response>> = HashMap::new();
    by_learner.insert(
        "u1".to_string(),
        vec![
            Response::new("q1", true, 18.0),
            Response::new("q2", true, 22.0),
            Response::new("q3", false, 40.0),
            Response::new("q4", false, 55.0),
        ],
    );
    by_learner.insert("u2".to_string(), vec![Response::new("q1", true, 25.0)]);

    AppState::new(
        Snapshot {
            bank: Arc::new(bank),
            topic_map: Arc::new(topic_map),
            responses_by_learner: Arc::new(by_learner),
        },
        config,
    )
}

fn test_topic_map() -> TopicMap {
    let mut assignments = HashMap::new();
    for (item, main, sub) in [
        ("q1", "math", Some("algebra")),
        ("q2", "math", None),
        ("q3", "reading", Some("vocabulary")),
        ("q4", "reading", None),
    ] {
        assignments.insert(
            item.to_string(),
            TopicAssignment {
                main_topic_id: main.to_string(),
                sub_topic_id: sub.map(str::to_string),
            },
        );
    }
    TopicMap::new(assignments, HashMap::new())
}
