// Synthetic intent generation
//
// Asks the chat model to role-play a user of a given chatbot and state one
// specific intent in a single sentence.

use tracing::{debug, warn};
use wayfarer_abstraction::{ChatMessage, ChatModel, ModelParameters};
use wayfarer_graph::ChatbotGraph;

use crate::config::DriverConfig;
use crate::error::{DriverError, Result};
use crate::prompts;

/// Generates user intents for a chatbot
pub struct IntentGenerator<'a, M: ChatModel + ?Sized> {
    model: &'a M,
    company: String,
    parameters: ModelParameters,
}

impl<'a, M: ChatModel + ?Sized> IntentGenerator<'a, M> {
    pub fn new(model: &'a M, config: &DriverConfig) -> Self {
        Self { model, company: config.company.clone(), parameters: config.parameters.clone() }
    }

    /// Generates one intent for `graph`, on a single line
    ///
    /// # Errors
    /// Returns `DriverError::EmptyIntent` if the reply has no text.
    pub async fn generate(&self, graph: &ChatbotGraph) -> Result<String> {
        let messages = [
            ChatMessage::system(prompts::intent_system_prompt(&self.company, graph.name())),
            ChatMessage::user(prompts::chatbot_greeting(graph.name())),
        ];

        let response = self
            .model
            .generate_chat_completion(&messages, &[], Some(self.parameters.clone()))
            .await?;

        let intent = single_line(response.message.text());
        if intent.is_empty() {
            warn!(chatbot = %graph.name(), "Model returned no intent text");
            return Err(DriverError::EmptyIntent);
        }

        debug!(chatbot = %graph.name(), intent = %intent, "Generated intent");
        Ok(intent)
    }
}

/// Joins non-blank lines with single spaces
pub fn single_line(text: &str) -> String {
    text.lines().map(str::trim).filter(|line| !line.is_empty()).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line() {
        assert_eq!(single_line("  환불하고 싶어요\n\n 빨리요 \n"), "환불하고 싶어요 빨리요");
        assert_eq!(single_line("\n \n"), "");
    }
}
