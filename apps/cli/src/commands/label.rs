//! Label command: one labeled choice per intent.

use anyhow::{Context, Result};
use colored::Colorize;
use rand::seq::SliceRandom;
use tracing::{error, info, warn};
use wayfarer_driver::ConversationDriver;
use wayfarer_eval::artifacts::{json_path, log_path, rewrite_json_from_log};
use wayfarer_eval::{AppendLog, LabeledRecord, ProgressEvent, ProgressSink, StdoutProgressSink};

use super::types::LabelArgs;
use crate::config::CliConfig;

/// Execute the label command.
pub async fn execute(args: LabelArgs, config: &CliConfig) -> Result<()> {
    let graph = super::load_graph(&args.graph)?;
    let mut intents = super::read_intents(&args.intents)?;
    let driver_config = config.driver_config()?;
    let model = super::chat_model(config, &args.chat)?;

    let mut rng = super::rng(args.seed);
    intents.shuffle(&mut rng);
    intents.truncate(args.n);

    println!("{}", "Labeling choices".bold().cyan());
    println!("  Graph: {} ({} nodes)", graph.name().green(), graph.node_count());
    println!("  Model: {}", model.model_id().green());
    println!("  Intents: {}", intents.len());
    println!();

    let log_file = log_path(&args.out);
    let json_file = json_path(&args.out);
    let mut log = AppendLog::open(&log_file)
        .with_context(|| format!("Failed to open log file: {}", log_file.display()))?;

    let driver = ConversationDriver::with_config(model.as_ref(), &graph, driver_config);
    let sink = StdoutProgressSink::new("label");
    let total = intents.len();
    let mut skipped = 0;

    sink.on_event(ProgressEvent::Started { total });
    for (index, intent) in intents.iter().enumerate() {
        sink.on_event(ProgressEvent::Item { index, total });

        let outcome = match driver.run_single_prompt(intent, &mut rng).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(intent = %intent, error = %e, "Labeling failed");
                sink.on_event(ProgressEvent::Skipped { index, reason: e.to_string() });
                skipped += 1;
                continue;
            }
        };

        let Some(chosen_id) = outcome.chosen_id.as_deref() else {
            warn!(intent = %intent, start = %outcome.start_id, "No valid choice, skipping");
            sink.on_event(ProgressEvent::Skipped { index, reason: "no valid choice".to_string() });
            skipped += 1;
            continue;
        };

        let record = LabeledRecord::from_transition(&graph, intent, &outcome.start_id, chosen_id)?;
        info!(intent = %intent, start = %outcome.start_id, choice = %record.choice.text, "Labeled");
        log.append_json(&record)?;
    }
    sink.on_event(ProgressEvent::Finished { completed: log.written(), skipped });

    let count = rewrite_json_from_log(&log_file, &json_file)
        .with_context(|| format!("Failed to write {}", json_file.display()))?;

    println!();
    println!(
        "{} {}, {}. Generated {} labeled examples.",
        "Saved result to".green(),
        json_file.display(),
        log_file.display(),
        count.to_string().bold()
    );

    Ok(())
}
