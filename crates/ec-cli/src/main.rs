//! Examcast CLI
//!
//! Command-line interface for calibrating the item bank, inspecting learner
//! abilities, forecasting exams, and serving the HTTP API.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

mod commands;
mod config;

use config::AppConfig;
use ec_api::DataPaths;

#[derive(Parser)]
#[command(name = "examcast")]
#[command(version)]
#[command(about = "IRT ability estimation and exam pass-probability forecasting", long_about = None)]
struct Cli {
    /// Configuration file path (YAML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Response-history export (overrides the config file)
    #[arg(long, value_name = "FILE")]
    progress: Option<PathBuf>,

    /// Item-topic mapping file (overrides the config file)
    #[arg(long, value_name = "FILE")]
    topics: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("invalid output format: {}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },

    /// Calibrate the item bank and print a summary
    Calibrate {
        /// Write the calibrated bank as JSON to this file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Estimate a learner's ability
    Estimate {
        /// Learner identifier
        user_id: String,
    },

    /// Forecast a learner's probability of passing an exam
    Predict {
        /// Learner identifier
        user_id: String,

        /// Exam specification file (JSON); omit to sample from the bank
        #[arg(short, long, value_name = "FILE")]
        exam: Option<PathBuf>,

        /// Number of items to sample when no exam file is given
        #[arg(short, long, default_value = "20")]
        num_questions: usize,

        /// Passing threshold as a fraction of items
        #[arg(short, long, default_value = "0.7")]
        threshold: f64,
    },

    /// Print descriptive statistics over the calibrated bank
    Analyze,

    /// Validate the configuration file and data paths
    Validate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let app_config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    commands::init_logging(&app_config, cli.verbose);

    let paths = resolve_paths(&cli, &app_config);

    match cli.command {
        Commands::Serve { port, host } => {
            let paths = paths?;
            let host = host.unwrap_or_else(|| app_config.server.host.clone());
            let port = port.unwrap_or(app_config.server.port);
            commands::run_serve(&app_config, paths, &host, port)
        }
        Commands::Calibrate { output } => {
            commands::run_calibrate(&app_config, paths?, output.as_deref(), cli.format)
        }
        Commands::Estimate { user_id } => {
            commands::run_estimate(&app_config, paths?, &user_id, cli.format)
        }
        Commands::Predict {
            user_id,
            exam,
            num_questions,
            threshold,
        } => commands::run_predict(
            &app_config,
            paths?,
            &user_id,
            exam.as_deref(),
            num_questions,
            threshold,
            cli.format,
        ),
        Commands::Analyze => commands::run_analyze(&app_config, paths?, cli.format),
        Commands::Validate => commands::run_validate(&app_config, paths),
    }
}

/// Resolves the data file locations from flags and the config file.
fn resolve_paths(cli: &Cli, config: &AppConfig) -> Result<DataPaths> {
    let response_history_path = cli
        .progress
        .clone()
        .or_else(|| config.response_history_path.clone());
    let item_topic_map_path = cli.topics.clone().or_else(|| config.item_topic_map_path.clone());

    let Some(response_history_path) = response_history_path else {
        bail!("no response history file; pass --progress or set response_history_path");
    };
    let Some(item_topic_map_path) = item_topic_map_path else {
        bail!("no topic mapping file; pass --topics or set item_topic_map_path");
    };

    if !response_history_path.exists() {
        bail!(
            "response history file does not exist: {}",
            response_history_path.display()
        );
    }
    if !item_topic_map_path.exists() {
        bail!(
            "topic mapping file does not exist: {}",
            item_topic_map_path.display()
        );
    }

    config
        .engine
        .validate()
        .context("engine configuration is invalid")?;

    Ok(DataPaths {
        response_history_path,
        item_topic_map_path,
    })
}
