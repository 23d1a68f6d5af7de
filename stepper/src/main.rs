//! Command-line driver for the durable step execution engine.
//!
//! Runs catalog functions against hand-written histories and validates history
//! documents, printing outcomes as JSON on stdout.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;
use stepper::catalog;
use stepper::core::history::HistoricalStepRecord;
use stepper::execute::Engine;
use stepper::exit_codes;
use stepper::io::config::{EngineConfig, load_config, write_config};
use stepper::io::history_store::load_history;
use stepper::{EngineError, Outcome, logging};

#[derive(Parser)]
#[command(
    name = "stepper",
    version,
    about = "Replay step history against a durable function and report its next action"
)]
struct Cli {
    /// Engine configuration (TOML). Defaults apply when the file is missing.
    #[arg(long, global = true, default_value = "stepper.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default configuration file at `--config`.
    Init {
        /// Overwrite an existing configuration file.
        #[arg(long)]
        force: bool,
    },
    /// Check a history file against the schema and history invariants.
    Validate {
        /// Path to the history JSON document.
        history: PathBuf,
    },
    /// Run a catalog function for one invocation and print its outcome.
    Run {
        /// Catalog function name (see `stepper functions`).
        function: String,
        /// Event payload as inline JSON.
        #[arg(long, default_value = "null")]
        input: String,
        /// History JSON document; empty history when omitted.
        #[arg(long)]
        history: Option<PathBuf>,
    },
    /// List catalog functions.
    Functions,
}

fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => ExitCode::from(code as u8),
        Err(err) => {
            eprintln!("{:#}", err);
            ExitCode::from(exit_codes::INVALID as u8)
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Init { force } => cmd_init(&cli.config, force),
        Command::Validate { history } => cmd_validate(&load_config(&cli.config)?, &history),
        Command::Run {
            function,
            input,
            history,
        } => cmd_run(
            &load_config(&cli.config)?,
            &function,
            &input,
            history.as_deref(),
        ),
        Command::Functions => cmd_functions(),
    }
}

fn cmd_init(path: &Path, force: bool) -> Result<i32> {
    if path.exists() && !force {
        bail!("{} already exists (pass --force to overwrite)", path.display());
    }
    write_config(path, &EngineConfig::default())?;
    println!("wrote {}", path.display());
    Ok(exit_codes::OK)
}

fn cmd_validate(config: &EngineConfig, path: &Path) -> Result<i32> {
    let history = load_history(path, config.max_history_records)?;
    println!("{}: {} records ok", path.display(), history.len());
    Ok(exit_codes::OK)
}

fn cmd_run(config: &EngineConfig, name: &str, input: &str, history: Option<&Path>) -> Result<i32> {
    let entry = catalog::lookup(name)
        .with_context(|| format!("unknown function '{name}' (see `stepper functions`)"))?;
    let input: Value = serde_json::from_str(input).context("parse --input as JSON")?;
    let history: Vec<HistoricalStepRecord> = match history {
        Some(path) => load_history(path, config.max_history_records)?,
        None => Vec::new(),
    };

    let engine = Engine::new(config.clone());
    match engine.execute(&entry.function, &input, &history) {
        Ok(outcome) => {
            print_outcome(&outcome)?;
            Ok(exit_codes::OK)
        }
        Err(err) => {
            eprintln!("{err}");
            Ok(exit_code_for(&err))
        }
    }
}

fn cmd_functions() -> Result<i32> {
    for entry in catalog::entries() {
        println!("{:<16} {}", entry.name, entry.description);
    }
    Ok(exit_codes::OK)
}

fn exit_code_for(err: &EngineError) -> i32 {
    match err {
        EngineError::InvalidHistory(_) => exit_codes::INVALID,
        EngineError::Drift(_) => exit_codes::DRIFT,
        EngineError::Function(_) => exit_codes::FUNCTION_FAILED,
    }
}

/// Print `outcome` as pretty JSON on stdout.
fn print_outcome(outcome: &Outcome) -> Result<()> {
    let payload = serde_json::to_string_pretty(outcome).context("serialize outcome")?;
    println!("{payload}");
    Ok(())
}
