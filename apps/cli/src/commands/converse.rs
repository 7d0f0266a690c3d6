//! Converse command: simulated conversations over a chatbot graph.

use anyhow::{Context, Result};
use colored::Colorize;
use rand::seq::SliceRandom;
use tracing::{error, info};
use wayfarer_driver::ConversationDriver;
use wayfarer_eval::artifacts::{json_path, log_path, rewrite_conversations_json};
use wayfarer_eval::{AppendLog, ConversationRecord, ProgressEvent, ProgressSink, StdoutProgressSink};

use super::types::ConverseArgs;
use crate::config::CliConfig;

/// Execute the converse command.
pub async fn execute(args: ConverseArgs, config: &CliConfig) -> Result<()> {
    let graph = super::load_graph(&args.graph)?;
    let mut intents = super::read_intents(&args.intents)?;
    let driver_config = config.driver_config()?;
    let model = super::chat_model(config, &args.chat)?;

    let mut rng = super::rng(args.seed);
    intents.shuffle(&mut rng);
    intents.truncate(args.n);

    println!("{}", "Simulating conversations".bold().cyan());
    println!("  Graph: {} ({} nodes)", graph.name().green(), graph.node_count());
    println!("  Model: {}", model.model_id().green());
    println!("  Conversations: {}", intents.len());
    println!();

    let log_file = log_path(&args.out);
    let json_file = json_path(&args.out);
    let mut log = AppendLog::open(&log_file)
        .with_context(|| format!("Failed to open log file: {}", log_file.display()))?;

    let driver = ConversationDriver::with_config(model.as_ref(), &graph, driver_config);
    let sink = StdoutProgressSink::new("converse");
    let total = intents.len();
    let mut skipped = 0;

    sink.on_event(ProgressEvent::Started { total });
    for (index, intent) in intents.iter().enumerate() {
        sink.on_event(ProgressEvent::Item { index, total });

        let outcome = match driver.run_conversation(intent).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(intent = %intent, error = %e, "Conversation failed");
                sink.on_event(ProgressEvent::Skipped { index, reason: e.to_string() });
                skipped += 1;
                continue;
            }
        };

        info!(intent = %intent, path = %outcome.path, end = ?outcome.end, "Conversation finished");
        let record = ConversationRecord::new(outcome.intent, outcome.path.to_strings());
        log.append_line(&record.to_log_line()?)?;
    }
    sink.on_event(ProgressEvent::Finished { completed: log.written(), skipped });

    let count = rewrite_conversations_json(&log_file, &json_file)
        .with_context(|| format!("Failed to write {}", json_file.display()))?;

    println!();
    println!(
        "{} {}, {}. Generated {} conversations.",
        "Saved result to".green(),
        json_file.display(),
        log_file.display(),
        count.to_string().bold()
    );

    Ok(())
}
