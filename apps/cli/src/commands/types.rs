//! Command type definitions shared between main.rs and the command modules.

use clap::Args;
use std::path::PathBuf;

/// Chat model selection, overriding the `[chat]` configuration section.
#[derive(Args, Debug, Clone, Default)]
pub struct ChatOptions {
    /// Chat provider (openai, universal, ollama)
    #[arg(long)]
    pub provider: Option<String>,

    /// Chat model id
    #[arg(long)]
    pub model: Option<String>,

    /// Base URL of an OpenAI-compatible server
    #[arg(long)]
    pub base_url: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ConverseArgs {
    /// Chatbot definition (JSON)
    pub graph: PathBuf,

    /// Intent file, one intent per line
    pub intents: PathBuf,

    /// Output prefix; writes `<out>.log` and `<out>.json`
    pub out: PathBuf,

    /// Number of conversations to run
    pub n: usize,

    /// Seed for shuffling intents
    #[arg(long)]
    pub seed: Option<u64>,

    #[command(flatten)]
    pub chat: ChatOptions,
}

#[derive(Args, Debug, Clone)]
pub struct LabelArgs {
    /// Chatbot definition (JSON)
    pub graph: PathBuf,

    /// Intent file, one intent per line
    pub intents: PathBuf,

    /// Output prefix; writes `<out>.log` and `<out>.json`
    pub out: PathBuf,

    /// Number of intents to label
    pub n: usize,

    /// Seed for shuffling intents and picking start nodes
    #[arg(long)]
    pub seed: Option<u64>,

    #[command(flatten)]
    pub chat: ChatOptions,
}

#[derive(Args, Debug, Clone)]
pub struct IntentArgs {
    /// Chatbot definition (JSON)
    pub graph: PathBuf,

    /// Output file; intents are appended one per line
    pub out: PathBuf,

    /// Number of intents to generate
    pub n: usize,

    #[command(flatten)]
    pub chat: ChatOptions,
}

#[derive(Args, Debug, Clone)]
pub struct ScoreArgs {
    /// Labeled dataset (JSON array)
    pub dataset: PathBuf,

    /// Similarity evaluator (random, openai, ollama)
    pub evaluator: String,

    /// Report output file
    pub out: PathBuf,

    /// Score at most this many examples
    #[arg(long)]
    pub limit: Option<usize>,

    /// Seed for the random evaluator
    #[arg(long)]
    pub seed: Option<u64>,

    /// Embedding model id, overriding `[embedding] model`
    #[arg(long)]
    pub embedding_model: Option<String>,
}
