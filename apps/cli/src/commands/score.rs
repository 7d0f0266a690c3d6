//! Score command: evaluate a similarity evaluator on labeled data.

use anyhow::{Context, Result, bail};
use colored::Colorize;
use comfy_table::{Cell, Color as ComfyColor, Table};
use wayfarer_eval::dataset::{load_records, resolve_records};
use wayfarer_eval::{
    EmbeddingSimilarity, EvaluationReport, RandomSimilarity, SimilarityEvaluator, StdoutProgressSink,
    compute_dataset_id, score_dataset,
};
use wayfarer_models::{ModelConfig, ModelFactory};

use super::types::ScoreArgs;
use crate::config::CliConfig;

const DEFAULT_OPENAI_EMBEDDING: &str = "text-embedding-3-small";
const DEFAULT_OLLAMA_EMBEDDING: &str = "nomic-embed-text";

/// Execute the score command.
pub async fn execute(args: ScoreArgs, config: &CliConfig) -> Result<()> {
    let mut records = load_records(&args.dataset)
        .with_context(|| format!("Failed to load dataset: {}", args.dataset.display()))?;
    if let Some(limit) = args.limit {
        records.truncate(limit);
    }
    let data = resolve_records(&records).context("Invalid labeled data")?;
    let dataset_id = compute_dataset_id(&records)?;

    let evaluator = build_evaluator(&args, config)?;

    println!("{}", "Scoring dataset".bold().cyan());
    println!("  Dataset: {} ({})", args.dataset.display(), dataset_id.to_string().dimmed());
    println!("  Evaluator: {}", evaluator.name().green());
    println!("  Examples: {}", data.len());
    println!();

    let report = score_dataset(&data, dataset_id, evaluator, &StdoutProgressSink::new("score"))
        .await
        .context("Scoring failed")?;
    report
        .write_json(&args.out)
        .with_context(|| format!("Failed to write report: {}", args.out.display()))?;

    println!();
    print_report(&report);
    println!();
    println!("{} {}", "Saved report to".green(), args.out.display());

    Ok(())
}

fn build_evaluator(args: &ScoreArgs, config: &CliConfig) -> Result<Box<dyn SimilarityEvaluator>> {
    let default_model = match args.evaluator.as_str() {
        "random" => {
            return Ok(Box::new(args.seed.map_or_else(RandomSimilarity::from_entropy, RandomSimilarity::seeded)));
        }
        "openai" => DEFAULT_OPENAI_EMBEDDING,
        "ollama" => DEFAULT_OLLAMA_EMBEDDING,
        other => bail!("Unknown evaluator '{}'. Expected one of: random, openai, ollama", other),
    };

    let configured = config.embedding.provider.as_deref() == Some(args.evaluator.as_str());
    let model = args
        .embedding_model
        .clone()
        .or_else(|| config.embedding.model.clone().filter(|_| configured))
        .unwrap_or_else(|| default_model.to_string());

    let mut model_config = ModelConfig::from_provider(&args.evaluator, model)?;
    if let Some(base_url) = config.embedding.base_url.clone().filter(|_| configured) {
        model_config = model_config.with_base_url(base_url);
    }
    let embedder = ModelFactory::create_embedder(model_config).context("Failed to create embedder")?;
    Ok(Box::new(EmbeddingSimilarity::new(embedder)))
}

fn print_report(report: &EvaluationReport) {
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Total", "Mean"]);
    table.add_row(vec![
        Cell::new("cross entropy").fg(ComfyColor::Cyan),
        Cell::new(format!("{:.4}", report.cross_entropy.total)),
        Cell::new(format!("{:.4}", report.cross_entropy.mean)),
    ]);
    table.add_row(vec![
        Cell::new("cosine").fg(ComfyColor::Cyan),
        Cell::new(format!("{:.4}", report.cosine.total)),
        Cell::new(format!("{:.4}", report.cosine.mean)),
    ]);
    table.add_row(vec![
        Cell::new("accuracy").fg(ComfyColor::Cyan),
        Cell::new(""),
        Cell::new(format!("{:.4}", report.accuracy)),
    ]);

    println!("{}", "Results:".bold());
    println!("  Scored: {}  Skipped: {}", report.examples, report.skipped);
    println!("{table}");
}
