//! Model abstraction layer for Wayfarer.
//!
//! This module defines the provider-neutral chat, tool-calling and embedding
//! types, and the traits the conversation driver and the similarity
//! evaluators are written against. Concrete providers live in
//! `wayfarer-models`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Represents an error that can occur when interacting with an AI model.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelError {
    /// An error occurred during the API request (e.g., network issues, invalid request).
    #[error("Request Error: {0}")]
    RequestError(String),

    /// The model returned an error (e.g., invalid input, rate limiting).
    #[error("Model Response Error: {0}")]
    ModelResponseError(String),

    /// An error occurred during serialization or deserialization.
    #[error("Serialization Error: {0}")]
    SerializationError(String),

    /// The model provider is not supported or configured.
    #[error("Unsupported Model Provider: {0}")]
    UnsupportedModelProvider(String),

    /// Provider quota exceeded or rate limit hit (hard stop error).
    #[error("Provider '{provider}' quota exceeded{}", message.as_ref().map(|m| format!(": {}", m)).unwrap_or_default())]
    QuotaExceeded {
        /// The provider name (e.g., "openai", "ollama").
        provider: String,
        /// Optional error message from the provider.
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Other unexpected errors.
    #[error("Other Model Error: {0}")]
    Other(String),
}

/// The role of a message sender in a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    /// Wire name of the role.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured function invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call id, echoed back in the tool result.
    pub id: String,
    /// Name of the function the model wants to invoke.
    pub name: String,
    /// Raw argument payload exactly as the model produced it.
    ///
    /// Kept unparsed so callers can treat malformed JSON as a recoverable
    /// protocol violation instead of a transport failure.
    pub arguments: String,
}

impl ToolCall {
    /// Parses the raw argument payload as JSON.
    ///
    /// An empty payload is treated as an empty object.
    ///
    /// # Errors
    /// Returns `ModelError::SerializationError` if the payload is not valid JSON.
    pub fn parse_arguments(&self) -> Result<Value, ModelError> {
        if self.arguments.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        serde_json::from_str(&self.arguments).map_err(|e| {
            ModelError::SerializationError(format!(
                "Invalid arguments for '{}': {}",
                self.name, e
            ))
        })
    }
}

/// Represents a message in a conversation with a chat model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message sender.
    pub role: Role,
    /// The text content. Assistant messages carrying only tool calls have none.
    #[serde(default)]
    pub content: Option<String>,
    /// Tool calls requested by an assistant message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// For tool messages: the id of the call this message answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// For tool messages: the name of the function that was called.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatMessage {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    /// Creates an assistant message with text content.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// Creates an assistant message that carries tool calls.
    pub fn assistant_tool_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self { role: Role::Assistant, content, tool_calls, tool_call_id: None, name: None }
    }

    /// Creates the tool-result message answering `call`.
    pub fn tool_result(call: &ToolCall, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(call.id.clone()),
            name: Some(call.name.clone()),
        }
    }

    /// Text content, or the empty string.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    /// The first tool call, if any.
    pub fn first_tool_call(&self) -> Option<&ToolCall> {
        self.tool_calls.first()
    }
}

/// A function the model may call, described with a JSON schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Function name.
    pub name: String,
    /// What the function means to the model.
    pub description: String,
    /// JSON schema of the argument object.
    pub parameters: Value,
}

/// Parameters for controlling the model's generation.
///
/// Unset fields fall back to the provider's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    /// What sampling temperature to use, between 0 and 2.
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Nucleus sampling probability mass.
    #[serde(default)]
    pub top_p: Option<f32>,

    /// The maximum number of tokens to generate in the chat completion.
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Up to 4 sequences where the API will stop generating further tokens.
    #[serde(default)]
    pub stop_sequences: Option<Vec<String>>,
}

/// Usage statistics for a model request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelUsage {
    /// Number of tokens in the prompt.
    pub prompt_tokens: u32,

    /// Number of tokens in the completion.
    pub completion_tokens: u32,

    /// Total number of tokens used.
    pub total_tokens: u32,
}

/// The response from a chat completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The assistant message, possibly carrying tool calls.
    pub message: ChatMessage,

    /// Optional: The ID of the model used to generate the response.
    pub model_id: Option<String>,

    /// Optional: Usage statistics for the request.
    pub usage: Option<ModelUsage>,

    /// Optional: provider finish reason ("stop", "tool_calls", ...).
    pub finish_reason: Option<String>,
}

impl ChatResponse {
    /// Wraps a bare assistant message.
    pub fn from_message(message: ChatMessage) -> Self {
        Self { message, model_id: None, usage: None, finish_reason: None }
    }
}

/// A chat model with structured function calling.
///
/// Implementations are injected into the driver as an owned handle, which
/// lets tests substitute a scripted model for a live API.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generates one assistant message for the given transcript.
    ///
    /// # Arguments
    /// * `messages` - The transcript so far
    /// * `tools` - Functions the model may call; empty for plain text generation
    /// * `parameters` - Optional parameters to control generation
    ///
    /// # Errors
    /// Returns a `ModelError` if the request fails or the reply cannot be decoded.
    async fn generate_chat_completion(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        parameters: Option<ModelParameters>,
    ) -> Result<ChatResponse, ModelError>;

    /// Returns the ID of the model.
    fn model_id(&self) -> &str;
}

/// A model that maps text to a dense vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds a single string.
    ///
    /// # Errors
    /// Returns a `ModelError` if the request fails or the reply has no vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError>;

    /// Returns the ID of the embedding model.
    fn model_id(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
        assert_eq!(Role::Tool.to_string(), "tool");
    }

    #[test]
    fn test_tool_result_echoes_call() {
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "move_to_node".to_string(),
            arguments: r#"{"node":"billing"}"#.to_string(),
        };
        let msg = ChatMessage::tool_result(&call, "billing");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(msg.name.as_deref(), Some("move_to_node"));
        assert_eq!(msg.text(), "billing");
    }

    #[test]
    fn test_parse_arguments() {
        let call = ToolCall {
            id: "c".to_string(),
            name: "move_to_node".to_string(),
            arguments: r#"{"node":"support"}"#.to_string(),
        };
        let args = call.parse_arguments().unwrap();
        assert_eq!(args["node"], "support");
    }

    #[test]
    fn test_parse_arguments_empty_is_object() {
        let call = ToolCall { id: "c".to_string(), name: "exit".to_string(), arguments: String::new() };
        assert!(call.parse_arguments().unwrap().is_object());
    }

    #[test]
    fn test_parse_arguments_malformed() {
        let call = ToolCall {
            id: "c".to_string(),
            name: "move_to_node".to_string(),
            arguments: "{node: ".to_string(),
        };
        let err = call.parse_arguments().unwrap_err();
        assert!(matches!(err, ModelError::SerializationError(_)));
        assert!(err.to_string().contains("move_to_node"));
    }

    #[test]
    fn test_plain_message_omits_tool_fields() {
        let json = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(json["role"], "user");
        assert!(json.get("tool_calls").is_none());
        assert!(json.get("tool_call_id").is_none());
    }

    #[test]
    fn test_quota_error_display() {
        let err = ModelError::QuotaExceeded {
            provider: "openai".to_string(),
            message: Some("insufficient_quota".to_string()),
        };
        assert_eq!(err.to_string(), "Provider 'openai' quota exceeded: insufficient_quota");
    }
}
