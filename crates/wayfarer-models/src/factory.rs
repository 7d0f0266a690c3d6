//! Model factory for creating model instances from configuration.
//!
//! This module provides functionality to create chat models and embedders
//! based on configuration, handling API key loading from environment variables.

use crate::{OllamaEmbedder, OpenAIEmbedder, OpenAIModel};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error};
use wayfarer_abstraction::{ChatModel, Embedder, ModelError};

/// Ollama's OpenAI-compatible endpoint, used for chat.
const OLLAMA_OPENAI_BASE_URL: &str = "http://localhost:11434/v1";

/// Model type enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelType {
    /// OpenAI model.
    OpenAI,
    /// Universal OpenAI-compatible server (vLLM, LocalAI, LM Studio, etc.).
    Universal,
    /// Ollama local model.
    Ollama,
}

impl FromStr for ModelType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "universal" | "openai-compatible" | "local" => Ok(Self::Universal),
            "ollama" => Ok(Self::Ollama),
            _ => Err(()),
        }
    }
}

/// Model configuration.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// The type of model to create.
    pub model_type: ModelType,
    /// The model ID (e.g., "gpt-3.5-turbo-1106", "text-embedding-3-small").
    pub model_id: String,
    /// Optional API key (if not provided, will be loaded from environment).
    pub api_key: Option<String>,
    /// Optional base URL (required for Universal models).
    pub base_url: Option<String>,
}

impl ModelConfig {
    /// Creates a new `ModelConfig` with the given type and model ID.
    #[must_use]
    pub fn new(model_type: ModelType, model_id: String) -> Self {
        Self { model_type, model_id, api_key: None, base_url: None }
    }

    /// Sets the API key for this configuration.
    #[must_use]
    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Sets the base URL for this configuration.
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Parses a provider name into a configuration.
    ///
    /// # Errors
    /// Returns `ModelError::UnsupportedModelProvider` for unknown provider names.
    pub fn from_provider(provider: &str, model_id: String) -> Result<Self, ModelError> {
        let model_type = ModelType::from_str(provider).map_err(|()| {
            error!(model_type = %provider, "Unrecognized model type");
            ModelError::UnsupportedModelProvider(format!("Unrecognized model type: {}", provider))
        })?;
        Ok(Self::new(model_type, model_id))
    }
}

/// Factory for creating model instances.
pub struct ModelFactory;

impl ModelFactory {
    fn openai_model(config: ModelConfig) -> Result<OpenAIModel, ModelError> {
        let model = match config.api_key {
            Some(api_key) => OpenAIModel::with_api_key(config.model_id, api_key),
            None => OpenAIModel::new(config.model_id)?,
        };
        Ok(match config.base_url {
            Some(base_url) => model.with_base_url(base_url),
            None => model,
        })
    }

    /// Creates a chat model from the given configuration.
    ///
    /// # Errors
    /// Returns a `ModelError` if model creation fails (e.g., missing API key).
    pub fn create_chat(config: ModelConfig) -> Result<Arc<dyn ChatModel>, ModelError> {
        debug!(
            model_type = ?config.model_type,
            model_id = %config.model_id,
            "Creating chat model instance"
        );

        match config.model_type {
            ModelType::OpenAI => Ok(Arc::new(Self::openai_model(config)?)),
            ModelType::Universal => {
                let base_url = config.base_url.ok_or_else(|| {
                    ModelError::UnsupportedModelProvider(
                        "base_url is required for Universal model type. Use ModelConfig::with_base_url() to set it.".to_string(),
                    )
                })?;
                let model = OpenAIModel::with_api_key(config.model_id, config.api_key.unwrap_or_default())
                    .with_base_url(base_url);
                Ok(Arc::new(model))
            }
            ModelType::Ollama => {
                let base_url =
                    config.base_url.unwrap_or_else(|| OLLAMA_OPENAI_BASE_URL.to_string());
                let model = OpenAIModel::with_api_key(config.model_id, "ollama".to_string())
                    .with_base_url(base_url);
                Ok(Arc::new(model))
            }
        }
    }

    /// Creates an embedder from the given configuration.
    ///
    /// # Errors
    /// Returns a `ModelError` if embedder creation fails (e.g., missing API key).
    pub fn create_embedder(config: ModelConfig) -> Result<Arc<dyn Embedder>, ModelError> {
        debug!(
            model_type = ?config.model_type,
            model_id = %config.model_id,
            "Creating embedder instance"
        );

        match config.model_type {
            ModelType::OpenAI => {
                let embedder = match config.api_key {
                    Some(api_key) => OpenAIEmbedder::with_api_key(config.model_id, api_key),
                    None => OpenAIEmbedder::new(config.model_id)?,
                };
                Ok(Arc::new(match config.base_url {
                    Some(base_url) => embedder.with_base_url(base_url),
                    None => embedder,
                }))
            }
            ModelType::Universal => {
                let base_url = config.base_url.ok_or_else(|| {
                    ModelError::UnsupportedModelProvider(
                        "base_url is required for Universal model type. Use ModelConfig::with_base_url() to set it.".to_string(),
                    )
                })?;
                let embedder =
                    OpenAIEmbedder::with_api_key(config.model_id, config.api_key.unwrap_or_default())
                        .with_base_url(base_url);
                Ok(Arc::new(embedder))
            }
            ModelType::Ollama => Ok(Arc::new(match config.base_url {
                Some(base_url) => OllamaEmbedder::with_base_url(config.model_id, base_url),
                None => OllamaEmbedder::new(config.model_id),
            })),
        }
    }
}
