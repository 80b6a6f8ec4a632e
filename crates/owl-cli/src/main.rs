//! OWL CLI - trains and inspects the overworld exploration learner
//!
//! Runs tabular Q-learning against a grid world standing in for the emulator.

#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::{evaluate, inspect, train};

#[derive(Parser)]
#[command(name = "owl")]
#[command(author, version, about = "OWL - overworld exploration learner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a value table and save it
    Train(train::TrainArgs),

    /// Summarize a saved value table
    Inspect(inspect::InspectArgs),

    /// Run one greedy episode with a saved value table
    Evaluate(evaluate::EvaluateArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(commands::config::ConfigCommands),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = if cli.verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("owl={log_level},owl_rl={log_level},owl_core={log_level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Train(args) => train::run(args),
        Commands::Inspect(args) => inspect::run(&args),
        Commands::Evaluate(args) => evaluate::run(&args),
        Commands::Config(cmd) => commands::config::run(cmd),
    }
}
