// Conversation driver
//
// Walks the chatbot graph by asking the chat model to pick one navigation
// tool per node. Protocol violations are answered with a corrective
// message and retried within a per-node attempt budget; the path never
// grows past the configured ceiling.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use wayfarer_abstraction::{ChatMessage, ChatModel, ToolDefinition};
use wayfarer_graph::{ChatbotGraph, Node};

use crate::config::{DriverConfig, PathLimitPolicy};
use crate::error::{DriverError, Result};
use crate::path::{ConversationPath, Terminal};
use crate::prompts;
use crate::tools::{self, Decision, ProtocolViolation, ToolPolicy};
use crate::transcript::Transcript;

/// Minimum outgoing edges for a node to start a single-prompt run
pub const MIN_LABEL_CHOICES: usize = 2;

/// Why a conversation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationEnd {
    /// The model called `exit`
    Exit,
    /// The model called `summon`
    Summon,
    /// The attempt budget at one node ran out
    RetriesExhausted,
    /// The path reached `max_path_length`
    PathLimit,
    /// A node with nothing left to offer
    Leaf,
}

/// Result of one simulated conversation
#[derive(Debug, Clone, Serialize)]
pub struct ConversationOutcome {
    pub intent: String,
    pub path: ConversationPath,
    pub end: ConversationEnd,
    /// Total model calls made
    pub model_calls: u32,
    /// Calls that were answered with a corrective message
    pub retries: u32,
}

/// Result of one single-prompt labeling run
#[derive(Debug, Clone)]
pub struct SinglePromptOutcome {
    /// Node the prompt was shown at
    pub start_id: String,
    /// Node the model moved to, if it made a valid choice
    pub chosen_id: Option<String>,
    /// `[start, chosen]` or `[start, "error"]`
    pub path: ConversationPath,
    pub model_calls: u32,
    pub retries: u32,
}

/// Result of the decision step at one node
enum Step<'g> {
    Moved(&'g Node),
    Exit,
    Summon,
    Exhausted,
}

#[derive(Debug, Default)]
struct CallStats {
    model_calls: u32,
    retries: u32,
}

/// Drives simulated conversations over one chatbot graph
pub struct ConversationDriver<'a, M: ChatModel + ?Sized> {
    model: &'a M,
    graph: &'a ChatbotGraph,
    config: DriverConfig,
}

impl<'a, M: ChatModel + ?Sized> ConversationDriver<'a, M> {
    /// Create a driver with default configuration
    pub fn new(model: &'a M, graph: &'a ChatbotGraph) -> Self {
        Self::with_config(model, graph, DriverConfig::default())
    }

    /// Create a driver with the given configuration
    pub fn with_config(model: &'a M, graph: &'a ChatbotGraph, config: DriverConfig) -> Self {
        Self { model, graph, config }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Runs one conversation from the root until a terminal condition
    ///
    /// # Errors
    /// Returns `DriverError::Model` if the chat model fails; protocol
    /// violations by the model are retried and never surface here.
    pub async fn run_conversation(&self, intent: &str) -> Result<ConversationOutcome> {
        self.config.validate()?;
        let intent = intent.trim();
        if intent.is_empty() {
            return Err(DriverError::EmptyIntent);
        }

        let graph: &'a ChatbotGraph = self.graph;
        let policy = self.config.tool_policy();
        let mut transcript = Transcript::new();
        transcript.push(ChatMessage::system(prompts::system_prompt(&self.config.company)));
        transcript.push(ChatMessage::user(intent));

        let mut stats = CallStats::default();
        let mut path = ConversationPath::new();
        let mut current = graph.root();
        path.push_node(current.id());

        info!(intent = %intent, root = %current.id(), "Starting conversation");

        let end = loop {
            let edges = graph.edges_of(current);
            if edges.is_empty() && self.config.stop_at_leaf {
                break ConversationEnd::Leaf;
            }

            let offered = tools::navigation_tools(edges, policy);
            if offered.is_empty() {
                break ConversationEnd::Leaf;
            }

            if path.len() + self.config.reserved_slots() >= self.config.max_path_length {
                warn!(
                    node_id = %current.id(),
                    max_path_length = self.config.max_path_length,
                    "Path length ceiling reached"
                );
                if self.config.path_limit == PathLimitPolicy::Error {
                    path.push_terminal(Terminal::Error);
                }
                break ConversationEnd::PathLimit;
            }

            transcript.push(ChatMessage::assistant(current.text()));
            debug!(
                node_id = %current.id(),
                choices = ?edges.iter().map(|e| e.text()).collect::<Vec<_>>(),
                "Presenting node"
            );

            match self.decide_at(current, &offered, &mut transcript, &mut stats).await? {
                Step::Moved(next) => {
                    path.push_node(next.id());
                    current = next;
                }
                Step::Exit => {
                    path.push_terminal(Terminal::Exit);
                    break ConversationEnd::Exit;
                }
                Step::Summon => {
                    path.push_terminal(Terminal::Summon);
                    break ConversationEnd::Summon;
                }
                Step::Exhausted => {
                    path.push_terminal(Terminal::Error);
                    break ConversationEnd::RetriesExhausted;
                }
            }
        };

        info!(path = %path, end = ?end, model_calls = stats.model_calls, "End of conversation");

        Ok(ConversationOutcome {
            intent: intent.to_string(),
            path,
            end,
            model_calls: stats.model_calls,
            retries: stats.retries,
        })
    }

    /// Asks for one choice at a uniformly random node with at least two edges
    ///
    /// # Errors
    /// Returns `DriverError::NoEligibleStartNode` if no node qualifies, or
    /// `DriverError::Model` if the chat model fails.
    pub async fn run_single_prompt<R: Rng + ?Sized>(
        &self,
        intent: &str,
        rng: &mut R,
    ) -> Result<SinglePromptOutcome> {
        let graph: &'a ChatbotGraph = self.graph;
        let candidates: Vec<&Node> = graph
            .vertices()
            .iter()
            .filter(|node| graph.edges_of(node).len() >= MIN_LABEL_CHOICES)
            .collect();
        let start = candidates
            .choose(rng)
            .copied()
            .ok_or(DriverError::NoEligibleStartNode(MIN_LABEL_CHOICES))?;

        self.run_single_prompt_at(start.id(), intent).await
    }

    /// Asks for one choice at the given node, offering `move_to_node` only
    ///
    /// # Errors
    /// Returns `DriverError::UnknownNode` if `start_id` is not in the graph.
    pub async fn run_single_prompt_at(&self, start_id: &str, intent: &str) -> Result<SinglePromptOutcome> {
        self.config.validate()?;
        let intent = intent.trim();
        if intent.is_empty() {
            return Err(DriverError::EmptyIntent);
        }

        let graph: &'a ChatbotGraph = self.graph;
        let start =
            graph.node(start_id).ok_or_else(|| DriverError::UnknownNode(start_id.to_string()))?;
        let offered = tools::navigation_tools(graph.edges_of(start), ToolPolicy::moves_only());

        let mut transcript = Transcript::new();
        transcript.push(ChatMessage::system(prompts::system_prompt(&self.config.company)));
        transcript.push(ChatMessage::assistant(start.text()));
        transcript.push(ChatMessage::user(intent));

        let mut stats = CallStats::default();
        let mut path = ConversationPath::new();
        path.push_node(start.id());

        let chosen_id = if offered.is_empty() {
            warn!(node_id = %start.id(), "Start node has no choices");
            path.push_terminal(Terminal::Error);
            None
        } else {
            match self.decide_at(start, &offered, &mut transcript, &mut stats).await? {
                Step::Moved(next) => {
                    path.push_node(next.id());
                    Some(next.id().to_string())
                }
                Step::Exit => {
                    path.push_terminal(Terminal::Exit);
                    None
                }
                Step::Summon => {
                    path.push_terminal(Terminal::Summon);
                    None
                }
                Step::Exhausted => {
                    path.push_terminal(Terminal::Error);
                    None
                }
            }
        };

        Ok(SinglePromptOutcome {
            start_id: start.id().to_string(),
            chosen_id,
            path,
            model_calls: stats.model_calls,
            retries: stats.retries,
        })
    }

    /// Bounded decision loop at one node
    async fn decide_at(
        &self,
        node: &'a Node,
        offered: &[ToolDefinition],
        transcript: &mut Transcript,
        stats: &mut CallStats,
    ) -> Result<Step<'a>> {
        let graph: &'a ChatbotGraph = self.graph;

        for attempt in 1..=self.config.max_attempts {
            stats.model_calls += 1;
            let response = self
                .model
                .generate_chat_completion(
                    transcript.messages(),
                    offered,
                    Some(self.config.parameters.clone()),
                )
                .await
                .inspect_err(|e| {
                    error!(node_id = %node.id(), attempt, error = %e, "Chat model request failed");
                })?;
            let message = response.message;

            let Some(call) = message.first_tool_call().cloned() else {
                let violation = ProtocolViolation::MissingToolCall;
                warn!(
                    node_id = %node.id(),
                    attempt,
                    raw_response = %message.text(),
                    "No tool call in response"
                );
                transcript.push(message);
                transcript.push(ChatMessage::system(violation.to_string()));
                stats.retries += 1;
                continue;
            };

            // Only the first call is honoured, so only it is kept.
            transcript.push(ChatMessage::assistant_tool_calls(message.content, vec![call.clone()]));

            let violation = match tools::decide(&call, offered) {
                Ok(Decision::Move { label }) => match graph.find_edge(node, &label) {
                    Some(edge) => {
                        let next = graph
                            .node(edge.to_id())
                            .ok_or_else(|| DriverError::UnknownNode(edge.to_id().to_string()))?;
                        transcript.push(ChatMessage::tool_result(&call, edge.text()));
                        debug!(node_id = %node.id(), label = %label, next = %next.id(), "User selects choice");
                        return Ok(Step::Moved(next));
                    }
                    None => ProtocolViolation::UnmatchedLabel(label),
                },
                Ok(Decision::Exit) => {
                    transcript.push(ChatMessage::tool_result(&call, tools::EXIT));
                    debug!(node_id = %node.id(), "User exited the chatbot");
                    return Ok(Step::Exit);
                }
                Ok(Decision::Summon) => {
                    transcript.push(ChatMessage::tool_result(&call, tools::SUMMON));
                    debug!(node_id = %node.id(), "User summoned a human agent");
                    return Ok(Step::Summon);
                }
                Err(violation) => violation,
            };

            warn!(
                node_id = %node.id(),
                attempt,
                function = %call.name,
                raw_arguments = %call.arguments,
                error = %violation,
                "Rejected tool call"
            );
            transcript.push(ChatMessage::tool_result(&call, violation.to_string()));
            stats.retries += 1;
        }

        error!(
            node_id = %node.id(),
            max_attempts = self.config.max_attempts,
            "Too many retries"
        );
        Ok(Step::Exhausted)
    }
}
