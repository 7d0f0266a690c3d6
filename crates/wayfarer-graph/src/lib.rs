//! Wayfarer Graph
//!
//! Read-only dialogue graph consumed by the conversation driver:
//! - Nodes with display text and a stable id
//! - Labeled edges pointing at target nodes
//! - Loading from a JSON chatbot definition

pub mod definition;
pub mod error;
pub mod graph;

pub use definition::{ChatbotDefinition, ChoiceDefinition, SectionDefinition};
pub use error::{GraphError, GraphResult};
pub use graph::{ChatbotGraph, Edge, GraphBuilder, Node};
