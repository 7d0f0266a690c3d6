//! Model implementations for Wayfarer.
//!
//! This crate provides concrete implementations of the `ChatModel` and
//! `Embedder` traits.
//!
//! # Supported Providers
//!
//! - **Scripted**: Replays fixed replies; used by tests and dry runs
//! - **OpenAI**: Chat completions with function calling, and embeddings (API key required)
//! - **Universal**: Any OpenAI-compatible server (vLLM, LM Studio, Ollama's `/v1`)
//! - **Ollama**: Local embedding models (no API key, local execution)

pub mod factory;
pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use tracing::debug;
use wayfarer_abstraction::{
    ChatMessage, ChatModel, ChatResponse, ModelError, ModelParameters, ToolCall, ToolDefinition,
};

pub use factory::{ModelConfig, ModelFactory, ModelType};
pub use ollama::OllamaEmbedder;
pub use openai::{OpenAIEmbedder, OpenAIModel};

/// One request observed by a [`ScriptedModel`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Transcript sent with the request.
    pub messages: Vec<ChatMessage>,
    /// Tools offered with the request.
    pub tools: Vec<ToolDefinition>,
}

impl RecordedRequest {
    /// Names of the offered tools, in offer order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }
}

/// A `ChatModel` that replays a fixed queue of assistant messages.
///
/// Every request is recorded so tests can assert on what was offered.
/// Requests made after the script runs out fail with `ModelError::Other`.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    id: String,
    replies: Mutex<VecDeque<ChatMessage>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedModel {
    /// Creates a `ScriptedModel` with the given replies.
    pub fn new(id: impl Into<String>, replies: impl IntoIterator<Item = ChatMessage>) -> Self {
        Self {
            id: id.into(),
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// An assistant reply calling `name` with JSON `arguments`.
    pub fn call(name: &str, arguments: &serde_json::Value) -> ChatMessage {
        Self::raw_call(name, &arguments.to_string())
    }

    /// An assistant reply calling `name` with an unparsed argument payload.
    pub fn raw_call(name: &str, arguments: &str) -> ChatMessage {
        ChatMessage::assistant_tool_calls(
            None,
            vec![ToolCall { id: String::new(), name: name.to_string(), arguments: arguments.to_string() }],
        )
    }

    /// A plain-text assistant reply with no tool call.
    pub fn text(content: &str) -> ChatMessage {
        ChatMessage::assistant(content)
    }

    /// Appends a reply to the end of the script.
    pub fn push(&self, reply: ChatMessage) {
        self.replies.lock().unwrap_or_else(PoisonError::into_inner).push_back(reply);
    }

    /// All requests seen so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replies not yet consumed.
    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn generate_chat_completion(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        parameters: Option<ModelParameters>,
    ) -> Result<ChatResponse, ModelError> {
        debug!(
            model_id = %self.id,
            message_count = messages.len(),
            tool_count = tools.len(),
            parameters = ?parameters,
            "ScriptedModel replaying reply"
        );

        let request_index = {
            let mut requests = self.requests.lock().unwrap_or_else(PoisonError::into_inner);
            requests.push(RecordedRequest { messages: messages.to_vec(), tools: tools.to_vec() });
            requests.len()
        };

        let mut reply = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or_else(|| ModelError::Other(format!("Script for '{}' is exhausted", self.id)))?;

        for (i, call) in reply.tool_calls.iter_mut().enumerate() {
            if call.id.is_empty() {
                call.id = format!("call_{request_index}_{i}");
            }
        }

        Ok(ChatResponse {
            message: reply,
            model_id: Some(self.id.clone()),
            usage: None,
            finish_reason: None,
        })
    }

    fn model_id(&self) -> &str {
        &self.id
    }
}
