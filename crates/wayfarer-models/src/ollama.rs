//! Ollama embedding implementation.
//!
//! Serves locally hosted sentence-embedding models (e.g. a pulled
//! sentence-transformers model) through Ollama's embeddings API.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use wayfarer_abstraction::{Embedder, ModelError};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Ollama embedding model.
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    /// The model ID (e.g., "nomic-embed-text", "bge-m3").
    model_id: String,
    /// The base URL for the Ollama API (default: "http://localhost:11434").
    base_url: String,
    /// HTTP client for making requests.
    client: Client,
}

impl OllamaEmbedder {
    /// Creates a new `OllamaEmbedder` against the default local server.
    pub fn new(model_id: String) -> Self {
        Self::with_base_url(model_id, DEFAULT_BASE_URL.to_string())
    }

    /// Creates a new `OllamaEmbedder` with a custom base URL.
    pub fn with_base_url(model_id: String, base_url: String) -> Self {
        Self { model_id, base_url: base_url.trim_end_matches('/').to_string(), client: Client::new() }
    }
}

#[derive(Serialize)]
struct OllamaEmbeddingRequest {
    model: String,
    prompt: String,
}

#[derive(Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct OllamaError {
    error: String,
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
        debug!(model_id = %self.model_id, text_len = text.len(), "OllamaEmbedder embedding text");

        let url = format!("{}/api/embeddings", self.base_url);
        let request_body =
            OllamaEmbeddingRequest { model: self.model_id.clone(), prompt: text.to_string() };

        let response = self.client.post(&url).json(&request_body).send().await.map_err(|e| {
            error!(error = %e, base_url = %self.base_url, "Failed to connect to Ollama");
            if e.is_connect() {
                ModelError::RequestError(format!(
                    "Ollama server not reachable at {}. Start it with 'ollama serve'.",
                    self.base_url
                ))
            } else {
                ModelError::RequestError(format!("Network error: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "Ollama API returned error status");

            let not_found = status == StatusCode::NOT_FOUND
                || serde_json::from_str::<OllamaError>(&error_text)
                    .is_ok_and(|e| e.error.contains("model") && e.error.contains("not found"));
            if not_found {
                return Err(ModelError::ModelResponseError(format!(
                    "Model '{}' not found. Pull it with 'ollama pull {}'.",
                    self.model_id, self.model_id
                )));
            }

            return Err(ModelError::ModelResponseError(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let parsed: OllamaEmbeddingResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse Ollama embeddings response");
            ModelError::SerializationError(format!("Failed to parse response: {}", e))
        })?;

        if parsed.embedding.is_empty() {
            return Err(ModelError::ModelResponseError(format!(
                "Model '{}' returned an empty embedding",
                self.model_id
            )));
        }

        Ok(parsed.embedding)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_url() {
        let embedder = OllamaEmbedder::new("nomic-embed-text".to_string());
        assert_eq!(embedder.base_url, DEFAULT_BASE_URL);
        assert_eq!(embedder.model_id(), "nomic-embed-text");
    }

    #[tokio::test]
    async fn test_embed_parses_vector() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/embeddings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"embedding":[0.5,0.25,0.0]}"#)
            .create_async()
            .await;

        let embedder = OllamaEmbedder::with_base_url("bge-m3".to_string(), server.url());
        let vector = embedder.embed("환불 받고 싶어요").await.unwrap();
        assert_eq!(vector, vec![0.5, 0.25, 0.0]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_embed_model_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/embeddings")
            .with_status(404)
            .with_body(r#"{"error":"model \"bge-m3\" not found"}"#)
            .create_async()
            .await;

        let embedder = OllamaEmbedder::with_base_url("bge-m3".to_string(), server.url());
        let err = embedder.embed("hello").await.unwrap_err();
        assert!(err.to_string().contains("ollama pull bge-m3"));
    }
}
