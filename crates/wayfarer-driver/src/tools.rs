// Navigation tools offered to the model
//
// At every node the model may move along one outgoing edge, exit, or
// summon a human. This module builds those function schemas and turns a
// returned tool call back into a decision.

use serde_json::{Value, json};
use thiserror::Error;
use wayfarer_abstraction::{ToolCall, ToolDefinition};
use wayfarer_graph::Edge;

/// Function name for following an edge
pub const MOVE_TO_NODE: &str = "move_to_node";
/// Function name for leaving the chatbot
pub const EXIT: &str = "exit";
/// Function name for asking for a human agent
pub const SUMMON: &str = "summon";

/// Which terminal tools are offered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolPolicy {
    pub allow_exit: bool,
    pub allow_summon: bool,
}

impl ToolPolicy {
    /// Offer every tool
    pub const fn all() -> Self {
        Self { allow_exit: true, allow_summon: true }
    }

    /// Offer `move_to_node` only
    pub const fn moves_only() -> Self {
        Self { allow_exit: false, allow_summon: false }
    }
}

impl Default for ToolPolicy {
    fn default() -> Self {
        Self::all()
    }
}

/// What the model chose
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Follow the edge with this label
    Move { label: String },
    Exit,
    Summon,
}

/// A tool call the driver cannot act on
///
/// The `Display` text is what the model sees in the corrective message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    #[error("ERROR: You cannot use arbitrary response.")]
    MissingToolCall,

    #[error("ERROR: Invalid arguments for {function}: {reason}")]
    MalformedArguments { function: String, reason: String },

    #[error("ERROR: Missing required argument 'node'")]
    MissingLabel,

    #[error("ERROR: Function {0} is not available")]
    NotOffered(String),

    #[error("ERROR: No edge with label {0}")]
    UnmatchedLabel(String),
}

fn empty_parameters() -> Value {
    json!({"type": "object", "properties": {}})
}

/// Builds the tool list for a node with the given outgoing edges
///
/// `move_to_node` is offered only when `edges` is non-empty; its `node`
/// argument is an enum of the edge labels in edge order.
pub fn navigation_tools(edges: &[Edge], policy: ToolPolicy) -> Vec<ToolDefinition> {
    let mut tools = Vec::with_capacity(3);

    if policy.allow_exit {
        tools.push(ToolDefinition {
            name: EXIT.to_string(),
            description: "You are either satisfied or frustrated with the chatbot and want to exit"
                .to_string(),
            parameters: empty_parameters(),
        });
    }

    if policy.allow_summon {
        tools.push(ToolDefinition {
            name: SUMMON.to_string(),
            description: "Summon a human agent to help you".to_string(),
            parameters: empty_parameters(),
        });
    }

    if !edges.is_empty() {
        let labels: Vec<&str> = edges.iter().map(Edge::text).collect();
        tools.push(ToolDefinition {
            name: MOVE_TO_NODE.to_string(),
            description: "Navigate to another node of the chatbot based on its label".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "node": {
                        "type": "string",
                        "description": "The label of the node to navigate to",
                        "enum": labels,
                    }
                },
                "required": ["node"],
            }),
        });
    }

    tools
}

/// Interprets a tool call against the tools that were offered
///
/// Label matching against the graph happens in the driver; this only
/// checks the call is well formed and was on offer.
pub fn decide(call: &ToolCall, offered: &[ToolDefinition]) -> Result<Decision, ProtocolViolation> {
    if !offered.iter().any(|tool| tool.name == call.name) {
        return Err(ProtocolViolation::NotOffered(call.name.clone()));
    }

    match call.name.as_str() {
        MOVE_TO_NODE => {
            let args = call.parse_arguments().map_err(|e| {
                ProtocolViolation::MalformedArguments { function: call.name.clone(), reason: e.to_string() }
            })?;
            let label = args
                .get("node")
                .and_then(Value::as_str)
                .ok_or(ProtocolViolation::MissingLabel)?;
            Ok(Decision::Move { label: label.to_string() })
        }
        EXIT => Ok(Decision::Exit),
        SUMMON => Ok(Decision::Summon),
        other => Err(ProtocolViolation::NotOffered(other.to_string())),
    }
}
