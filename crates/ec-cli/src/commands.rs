//! Command implementations.

use std::path::Path;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use rand::seq::SliceRandom;
use serde::Deserialize;
use tracing::Level;

use ec_api::{load_snapshot, AppState, DataPaths};
use ec_core::{
    AbilityEstimator, BankAnalysis, ExamItem, ExamSpec, ForecastService, ItemParams,
};
use ec_observability::{init_logging_with_config, LoggingConfig};

use crate::config::AppConfig;
use crate::OutputFormat;

/// Initializes logging from the config file and the verbose flag.
pub fn init_logging(config: &AppConfig, verbose: bool) {
    let level = if verbose {
        Level::DEBUG
    } else {
        config
            .logging
            .level
            .parse()
            .unwrap_or(Level::INFO)
    };
    init_logging_with_config(LoggingConfig {
        level,
        json_format: config.logging.json,
        ..LoggingConfig::default()
    });
}

/// Starts the API server.
pub fn run_serve(config: &AppConfig, paths: DataPaths, host: &str, port: u16) -> Result<()> {
    let engine_config = config.engine.clone();
    let (snapshot, stats) = load_snapshot(&paths, &engine_config)?;

    println!(
        "{} {} items ({} calibrated), {} learners, {} responses",
        "loaded".green().bold(),
        stats.items,
        stats.calibrated_items,
        stats.learners,
        stats.responses
    );

    let state = AppState::with_data_paths(snapshot, engine_config, paths);
    let addr: std::net::SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", host, port))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(ec_api::serve(addr, state))?;
    Ok(())
}

/// Calibrates the bank and prints a summary, optionally dumping it as JSON.
pub fn run_calibrate(
    config: &AppConfig,
    paths: DataPaths,
    output: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let (snapshot, stats) = load_snapshot(&paths, &config.engine)?;

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(snapshot.bank.as_ref())?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write bank to {}", path.display()))?;
        println!("{} bank written to {}", "ok".green().bold(), path.display());
    }

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "items": stats.items,
                    "calibrated_items": stats.calibrated_items,
                    "learners": stats.learners,
                    "responses": stats.responses,
                    "dropped_records": stats.dropped_records,
                })
            );
        }
        OutputFormat::Text => {
            println!("{}", "Calibration summary".bold());
            println!("  items:       {}", stats.items);
            println!("  calibrated:  {}", stats.calibrated_items);
            println!("  learners:    {}", stats.learners);
            println!("  responses:   {}", stats.responses);
            if stats.dropped_records > 0 {
                println!(
                    "  dropped:     {}",
                    stats.dropped_records.to_string().yellow()
                );
            }
        }
    }
    Ok(())
}

/// Estimates and prints one learner's ability profile.
pub fn run_estimate(
    config: &AppConfig,
    paths: DataPaths,
    user_id: &str,
    format: OutputFormat,
) -> Result<()> {
    let (snapshot, _) = load_snapshot(&paths, &config.engine)?;
    let responses = snapshot
        .responses_by_learner
        .get(user_id)
        .cloned()
        .unwrap_or_default();

    let estimator = AbilityEstimator::new(config.engine.clone());
    let profile = estimator
        .estimate_by_topic(user_id, &responses, &snapshot.bank, &snapshot.topic_map)
        .with_context(|| format!("could not estimate ability for learner {}", user_id))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&profile)?),
        OutputFormat::Text => {
            println!("{} {}", "Learner".bold(), user_id);
            println!(
                "  ability:    {:+.3} (se {:.3}, confidence {:.2})",
                profile.overall.theta,
                profile.overall.standard_error,
                profile.overall.confidence
            );
            println!("  responses:  {}", profile.overall.num_responses);
            if !profile.main_topics.is_empty() {
                println!("  {}", "main topics".bold());
                for (topic_id, estimate) in &profile.main_topics {
                    println!(
                        "    {:<24} {:+.3} ({} responses)",
                        topic_id, estimate.theta, estimate.num_responses
                    );
                }
            }
            if !profile.sub_topics.is_empty() {
                println!("  {}", "sub topics".bold());
                for (topic_id, estimate) in &profile.sub_topics {
                    println!(
                        "    {:<24} {:+.3} ({} responses)",
                        topic_id, estimate.theta, estimate.num_responses
                    );
                }
            }
        }
    }
    Ok(())
}

/// Exam file format accepted by `predict --exam`.
#[derive(Debug, Deserialize)]
struct ExamFile {
    questions: Vec<ExamFileQuestion>,
    #[serde(default)]
    passing_threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ExamFileQuestion {
    #[serde(default)]
    question_id: Option<String>,
    #[serde(default)]
    difficulty: Option<f64>,
    #[serde(default)]
    discrimination: Option<f64>,
    #[serde(default)]
    guessing: Option<f64>,
}

/// Forecasts a learner's pass probability for an exam.
#[allow(clippy::too_many_arguments)]
pub fn run_predict(
    config: &AppConfig,
    paths: DataPaths,
    user_id: &str,
    exam: Option<&Path>,
    num_questions: usize,
    threshold: f64,
    format: OutputFormat,
) -> Result<()> {
    let (snapshot, _) = load_snapshot(&paths, &config.engine)?;
    let responses = snapshot
        .responses_by_learner
        .get(user_id)
        .cloned()
        .unwrap_or_default();

    let spec = match exam {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read exam file {}", path.display()))?;
            let file: ExamFile = serde_json::from_str(&text)
                .with_context(|| format!("failed to parse exam file {}", path.display()))?;

            let items = file
                .questions
                .iter()
                .map(|q| {
                    let bank_params = q
                        .question_id
                        .as_deref()
                        .and_then(|id| snapshot.bank.params(id));
                    let params = ItemParams {
                        difficulty: q
                            .difficulty
                            .or(bank_params.map(|p| p.difficulty))
                            .unwrap_or(0.0),
                        discrimination: q
                            .discrimination
                            .or(bank_params.map(|p| p.discrimination))
                            .unwrap_or(config.engine.default_discrimination),
                        guessing: q
                            .guessing
                            .or(bank_params.map(|p| p.guessing))
                            .unwrap_or(config.engine.default_guessing),
                    };
                    match &q.question_id {
                        Some(id) => ExamItem::from_bank(id.clone(), params),
                        None => ExamItem::ad_hoc(params),
                    }
                })
                .collect();

            ExamSpec {
                items,
                passing_threshold: file.passing_threshold.unwrap_or(threshold),
                total_score: None,
            }
        }
        None => {
            // No exam file: sample a uniform random exam from the bank.
            let mut items: Vec<&ec_core::Item> = snapshot.bank.items().collect();
            if items.is_empty() {
                bail!("the calibrated bank is empty; cannot sample an exam");
            }
            let mut rng = rand::thread_rng();
            items.shuffle(&mut rng);
            items.truncate(num_questions.max(1));

            ExamSpec {
                items: items
                    .into_iter()
                    .map(|item| ExamItem::from_bank(item.id.clone(), item.params))
                    .collect(),
                passing_threshold: threshold,
                total_score: None,
            }
        }
    };

    let service = ForecastService::new(config.engine.clone());
    let outcome = service
        .forecast_for_learner(user_id, &responses, &snapshot.bank, &snapshot.topic_map, &spec)
        .with_context(|| format!("could not forecast exam for learner {}", user_id))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Text => {
            let forecast = &outcome.forecast;
            let summary = &outcome.summary;
            println!("{} {}", "Forecast for".bold(), user_id);
            println!(
                "  pass probability: {}",
                format!("{:.1}%", forecast.pass_probability_pct).green().bold()
            );
            println!("  expected score:   {:.1}%", forecast.expected_score_pct);
            println!("  confidence:       {:.2}", forecast.confidence);
            println!(
                "  exam:             {} items, avg difficulty {:+.2}, need {} correct",
                summary.total_questions, summary.average_difficulty, summary.min_correct_needed
            );
            println!(
                "  ability:          {:+.3} (confidence {:.2})",
                summary.overall_ability, summary.ability_confidence
            );
        }
    }
    Ok(())
}

/// Prints descriptive statistics over the calibrated bank.
pub fn run_analyze(config: &AppConfig, paths: DataPaths, format: OutputFormat) -> Result<()> {
    let (snapshot, _) = load_snapshot(&paths, &config.engine)?;
    let analysis = BankAnalysis::compute(&snapshot.bank, &snapshot.topic_map);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&analysis)?),
        OutputFormat::Text => {
            println!("{}", "Bank analysis".bold());
            println!(
                "  items: {} ({} calibrated)",
                analysis.total_items, analysis.calibrated_items
            );
            println!(
                "  difficulty: min {:+.2}  max {:+.2}  mean {:+.2}  median {:+.2}  std {:.2}",
                analysis.difficulty.min,
                analysis.difficulty.max,
                analysis.difficulty.mean,
                analysis.difficulty.median,
                analysis.difficulty.std_dev
            );
            println!(
                "  bands: {} easy / {} medium / {} hard",
                analysis.bands.easy, analysis.bands.medium, analysis.bands.hard
            );
            println!(
                "  topics: {} main, {} sub",
                analysis.topics.total_main_topics, analysis.topics.total_sub_topics
            );
            for entry in &analysis.topics.top_main_topics {
                println!("    {:<24} {} items", entry.topic_id, entry.question_count);
            }
        }
    }
    Ok(())
}

/// Validates configuration and data files without running anything.
pub fn run_validate(config: &AppConfig, paths: Result<DataPaths>) -> Result<()> {
    config
        .engine
        .validate()
        .context("engine configuration is invalid")?;
    println!("{} engine configuration", "ok".green().bold());

    match paths {
        Ok(paths) => {
            ec_data::load_progress_file(&paths.response_history_path)
                .context("response history failed to load")?;
            println!("{} response history", "ok".green().bold());

            ec_data::load_topic_file(&paths.item_topic_map_path)
                .context("topic mapping failed to load")?;
            println!("{} topic mapping", "ok".green().bold());
        }
        Err(err) => {
            println!("{} data paths: {}", "missing".yellow().bold(), err);
        }
    }
    Ok(())
}
