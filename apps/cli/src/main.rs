//! Wayfarer CLI - simulated users for decision-tree chatbots
//!
//! This CLI provides a `wayfarer` command that drives a chat model through a
//! chatbot graph, labels single choices, generates intents and scores
//! similarity evaluators on the labeled data.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::types::{ConverseArgs, IntentArgs, LabelArgs, ScoreArgs};
use commands::{converse, intent, label, score};
use config::CliConfig;

/// Wayfarer CLI - simulated users for decision-tree chatbots
#[derive(Parser, Debug)]
#[command(name = "wayfarer", author, version, about = "Wayfarer - simulated users for decision-tree chatbots")]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Configuration file, applied over ~/.wayfarer/config.toml and ./.wayfarerrc
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run simulated conversations
    ///
    /// Each conversation starts at the root with one intent and follows the
    /// model's choices until it exits, summons an agent, or fails.
    Converse(ConverseArgs),

    /// Label one choice per intent at random branching nodes
    Label(LabelArgs),

    /// Generate user intents for a chatbot
    Intent(IntentArgs),

    /// Score a similarity evaluator on labeled data
    Score(ScoreArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = CliConfig::discover_and_load(args.config.as_deref())?;

    let log_level = args.log_level.as_deref().or(config.log_level.as_deref()).unwrap_or("info");
    let level = match log_level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber =
        FmtSubscriber::builder().with_max_level(level).without_time().with_target(false).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Converse(args) => converse::execute(args, &config).await,
        Command::Label(args) => label::execute(args, &config).await,
        Command::Intent(args) => intent::execute(args, &config).await,
        Command::Score(args) => score::execute(args, &config).await,
    }
}
