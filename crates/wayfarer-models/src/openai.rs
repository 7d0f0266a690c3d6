//! OpenAI model implementation.
//!
//! This module provides `ChatModel` (chat completions with function calling)
//! and `Embedder` (embeddings endpoint) implementations for OpenAI's API and
//! any server speaking the same protocol.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use tracing::{debug, error};
use wayfarer_abstraction::{
    ChatMessage, ChatModel, ChatResponse, Embedder, ModelError, ModelParameters, ModelUsage, Role,
    ToolCall, ToolDefinition,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[allow(clippy::disallowed_methods)] // env::var is needed for API key loading
fn api_key_from_env() -> Result<String, ModelError> {
    env::var("OPENAI_API_KEY").map_err(|_| {
        ModelError::UnsupportedModelProvider("OPENAI_API_KEY environment variable not set".to_string())
    })
}

/// Maps a non-success HTTP status to a `ModelError`.
///
/// 402 and 429 are hard stops and become `QuotaExceeded`.
pub(crate) fn status_error(provider: &str, status: StatusCode, error_text: String) -> ModelError {
    if status == StatusCode::PAYMENT_REQUIRED || status == StatusCode::TOO_MANY_REQUESTS {
        return ModelError::QuotaExceeded { provider: provider.to_string(), message: Some(error_text) };
    }
    ModelError::ModelResponseError(format!("API error ({}): {}", status, error_text))
}

/// OpenAI chat model with function calling.
#[derive(Debug, Clone)]
pub struct OpenAIModel {
    /// The model ID (e.g., "gpt-3.5-turbo-1106").
    model_id: String,
    /// The API key for authentication.
    api_key: String,
    /// The base URL for the OpenAI API.
    base_url: String,
    /// HTTP client for making requests.
    client: Client,
}

impl OpenAIModel {
    /// Creates a new `OpenAIModel` with the given model ID.
    ///
    /// # Errors
    /// Returns a `ModelError` if the API key is not found in environment variables.
    pub fn new(model_id: String) -> Result<Self, ModelError> {
        Ok(Self::with_api_key(model_id, api_key_from_env()?))
    }

    /// Creates a new `OpenAIModel` with a custom API key.
    #[must_use]
    pub fn with_api_key(model_id: String, api_key: String) -> Self {
        Self { model_id, api_key, base_url: DEFAULT_BASE_URL.to_string(), client: Client::new() }
    }

    /// Points the model at a different OpenAI-compatible endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn to_openai_message(msg: &ChatMessage) -> OpenAIMessage {
        let tool_calls = if msg.tool_calls.is_empty() {
            None
        } else {
            Some(
                msg.tool_calls
                    .iter()
                    .map(|tc| OpenAIToolCall {
                        id: tc.id.clone(),
                        call_type: "function".to_string(),
                        function: OpenAIFunctionCall {
                            name: tc.name.clone(),
                            arguments: tc.arguments.clone(),
                        },
                    })
                    .collect(),
            )
        };

        OpenAIMessage {
            role: msg.role.as_str().to_string(),
            content: msg.content.clone(),
            tool_calls,
            tool_call_id: msg.tool_call_id.clone(),
            name: msg.name.clone(),
        }
    }

    fn tools_to_openai(tools: &[ToolDefinition]) -> Vec<OpenAITool> {
        tools
            .iter()
            .map(|tool| OpenAITool {
                tool_type: "function".to_string(),
                function: OpenAIFunction {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters: tool.parameters.clone(),
                },
            })
            .collect()
    }

    fn from_openai_message(msg: OpenAIMessage) -> ChatMessage {
        let tool_calls = msg
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall { id: tc.id, name: tc.function.name, arguments: tc.function.arguments })
            .collect();

        ChatMessage {
            role: Role::Assistant,
            content: msg.content,
            tool_calls,
            tool_call_id: None,
            name: None,
        }
    }

    fn build_request(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        parameters: Option<ModelParameters>,
    ) -> OpenAIRequest {
        let openai_tools = Self::tools_to_openai(tools);
        let mut request = OpenAIRequest {
            model: self.model_id.clone(),
            messages: messages.iter().map(Self::to_openai_message).collect(),
            tools: if openai_tools.is_empty() { None } else { Some(openai_tools) },
            temperature: None,
            top_p: None,
            max_tokens: None,
            stop: None,
        };

        if let Some(params) = parameters {
            request.temperature = params.temperature;
            request.top_p = params.top_p;
            request.max_tokens = params.max_tokens;
            request.stop = params.stop_sequences;
        }

        request
    }
}

#[async_trait]
impl ChatModel for OpenAIModel {
    async fn generate_chat_completion(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        parameters: Option<ModelParameters>,
    ) -> Result<ChatResponse, ModelError> {
        debug!(
            model_id = %self.model_id,
            message_count = messages.len(),
            tool_count = tools.len(),
            parameters = ?parameters,
            "OpenAIModel generating chat completion"
        );

        let url = format!("{}/chat/completions", self.base_url);
        let request_body = self.build_request(messages, tools, parameters);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send request to OpenAI API");
                ModelError::RequestError(format!("Network error: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "OpenAI API returned error status");
            return Err(status_error("openai", status, error_text));
        }

        let openai_response: OpenAIResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse OpenAI API response");
            ModelError::SerializationError(format!("Failed to parse response: {}", e))
        })?;

        let choice = openai_response.choices.into_iter().next().ok_or_else(|| {
            error!("No choices in OpenAI API response");
            ModelError::ModelResponseError("No choices in API response".to_string())
        })?;

        let usage = openai_response.usage.map(|u| ModelUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ChatResponse {
            message: Self::from_openai_message(choice.message),
            model_id: Some(openai_response.model.unwrap_or_else(|| self.model_id.clone())),
            usage,
            finish_reason: choice.finish_reason,
        })
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// OpenAI embeddings client.
#[derive(Debug, Clone)]
pub struct OpenAIEmbedder {
    model_id: String,
    api_key: String,
    base_url: String,
    client: Client,
}

impl OpenAIEmbedder {
    /// Creates an embedder reading the API key from `OPENAI_API_KEY`.
    ///
    /// # Errors
    /// Returns a `ModelError` if the API key is not set.
    pub fn new(model_id: String) -> Result<Self, ModelError> {
        Ok(Self::with_api_key(model_id, api_key_from_env()?))
    }

    /// Creates an embedder with an explicit API key.
    #[must_use]
    pub fn with_api_key(model_id: String, api_key: String) -> Self {
        Self { model_id, api_key, base_url: DEFAULT_BASE_URL.to_string(), client: Client::new() }
    }

    /// Points the embedder at a different OpenAI-compatible endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
        debug!(model_id = %self.model_id, text_len = text.len(), "OpenAIEmbedder embedding text");

        let url = format!("{}/embeddings", self.base_url);
        let request_body =
            EmbeddingRequest { model: self.model_id.clone(), input: vec![text.to_string()] };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send request to OpenAI embeddings API");
                ModelError::RequestError(format!("Network error: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "OpenAI embeddings API returned error status");
            return Err(status_error("openai", status, error_text));
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            ModelError::SerializationError(format!("Failed to parse embeddings response: {}", e))
        })?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| ModelError::ModelResponseError("No embedding in API response".to_string()))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// OpenAI API request/response structures

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAITool {
    #[serde(rename = "type")]
    tool_type: String,
    function: OpenAIFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: OpenAIFunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[allow(clippy::struct_field_names)] // Matches API naming
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}
