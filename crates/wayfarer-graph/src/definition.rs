//! Serialized chatbot definition.
//!
//! A chatbot is stored as a list of sections; each section shows some text
//! and offers labeled choices that point at the next section.

use serde::{Deserialize, Serialize};

/// The on-disk form of a chatbot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatbotDefinition {
    /// Display name of the chatbot.
    #[serde(default)]
    pub name: String,
    /// Id of the entry section. Defaults to the first section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_section_id: Option<String>,
    pub sections: Vec<SectionDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDefinition {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub choices: Vec<ChoiceDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceDefinition {
    pub text: String,
    pub next_section_id: String,
}
