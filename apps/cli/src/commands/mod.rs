//! CLI command implementations.

pub mod converse;
pub mod intent;
pub mod label;
pub mod score;
pub mod types;

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use wayfarer_abstraction::ChatModel;
use wayfarer_graph::ChatbotGraph;
use wayfarer_models::{ModelConfig, ModelFactory};

use crate::config::CliConfig;
use types::ChatOptions;

const DEFAULT_CHAT_PROVIDER: &str = "openai";
const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo-1106";

/// Build the chat model from flags, falling back to the `[chat]` section.
pub fn chat_model(config: &CliConfig, options: &ChatOptions) -> Result<Arc<dyn ChatModel>> {
    let provider = options
        .provider
        .as_deref()
        .or(config.chat.provider.as_deref())
        .unwrap_or(DEFAULT_CHAT_PROVIDER);
    let model = options
        .model
        .clone()
        .or_else(|| config.chat.model.clone())
        .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());
    let base_url = options.base_url.clone().or_else(|| config.chat.base_url.clone());

    debug!(provider, model = %model, "Selecting chat model");

    let mut model_config = ModelConfig::from_provider(provider, model)?;
    if let Some(base_url) = base_url {
        model_config = model_config.with_base_url(base_url);
    }
    ModelFactory::create_chat(model_config).context("Failed to create chat model")
}

pub fn load_graph(path: &Path) -> Result<ChatbotGraph> {
    ChatbotGraph::parse_from_file(path)
        .with_context(|| format!("Failed to load chatbot graph: {}", path.display()))
}

/// Non-empty, trimmed lines of an intent file.
pub fn read_intents(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read intents: {}", path.display()))?;
    Ok(content.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string).collect())
}

pub fn rng(seed: Option<u64>) -> StdRng {
    seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_intents_skips_blank_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("intents.txt");
        std::fs::write(&path, "환불해 주세요\n\n   \n  앱이 멈춰요  \n").unwrap();

        let intents = read_intents(&path).unwrap();
        assert_eq!(intents, vec!["환불해 주세요", "앱이 멈춰요"]);
    }

    #[test]
    fn test_chat_model_uses_flags_over_config() {
        let mut config = CliConfig::default();
        config.chat.provider = Some("openai".to_string());
        config.chat.model = Some("gpt-4".to_string());

        let options = ChatOptions {
            provider: Some("universal".to_string()),
            model: Some("local-model".to_string()),
            base_url: Some("http://localhost:8000/v1".to_string()),
        };
        let model = chat_model(&config, &options).unwrap();
        assert_eq!(model.model_id(), "local-model");
    }

    #[test]
    fn test_chat_model_rejects_unknown_provider() {
        let options = ChatOptions { provider: Some("bert".to_string()), ..ChatOptions::default() };
        assert!(chat_model(&CliConfig::default(), &options).is_err());
    }
}
