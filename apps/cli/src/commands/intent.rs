//! Intent command: generate user intents for a chatbot.

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::{error, info};
use wayfarer_driver::IntentGenerator;
use wayfarer_eval::{AppendLog, ProgressEvent, ProgressSink, StdoutProgressSink};

use super::types::IntentArgs;
use crate::config::CliConfig;

/// Execute the intent command.
pub async fn execute(args: IntentArgs, config: &CliConfig) -> Result<()> {
    let graph = super::load_graph(&args.graph)?;
    let driver_config = config.driver_config()?;
    let model = super::chat_model(config, &args.chat)?;

    println!("{}", "Generating intents".bold().cyan());
    println!("  Chatbot: {}", graph.name().green());
    println!("  Model: {}", model.model_id().green());
    println!();

    let mut out = AppendLog::open(&args.out)
        .with_context(|| format!("Failed to open output file: {}", args.out.display()))?;

    let generator = IntentGenerator::new(model.as_ref(), &driver_config);
    let sink = StdoutProgressSink::new("intent");
    let total = args.n;
    let mut skipped = 0;

    sink.on_event(ProgressEvent::Started { total });
    for index in 0..total {
        sink.on_event(ProgressEvent::Item { index, total });

        match generator.generate(&graph).await {
            Ok(intent) => {
                info!(intent = %intent, "Generated intent");
                out.append_line(&intent)?;
            }
            Err(e) => {
                error!(error = %e, "Intent generation failed");
                sink.on_event(ProgressEvent::Skipped { index, reason: e.to_string() });
                skipped += 1;
            }
        }
    }
    sink.on_event(ProgressEvent::Finished { completed: out.written(), skipped });

    println!();
    println!(
        "{} {}. Generated {} intents.",
        "Saved result to".green(),
        args.out.display(),
        out.written().to_string().bold()
    );

    Ok(())
}
