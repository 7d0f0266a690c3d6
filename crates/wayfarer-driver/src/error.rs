// Error types for the conversation driver

use thiserror::Error;

/// Result type for driver operations
pub type Result<T> = std::result::Result<T, DriverError>;

/// Driver errors
///
/// Protocol violations by the model never surface here; they are retried
/// and, once the attempt budget is spent, recorded in the path.
#[derive(Debug, Error)]
pub enum DriverError {
    /// External model failure
    #[error("Model error: {0}")]
    Model(#[from] wayfarer_abstraction::ModelError),

    /// Graph error
    #[error("Graph error: {0}")]
    Graph(#[from] wayfarer_graph::GraphError),

    /// An edge points at a node the graph does not contain
    #[error("Node '{0}' not found in chatbot graph")]
    UnknownNode(String),

    /// No node qualifies as the start of a single-prompt run
    #[error("No node with at least {0} choices to start from")]
    NoEligibleStartNode(usize),

    /// Invalid driver configuration
    #[error("Invalid driver configuration: {0}")]
    InvalidConfig(String),

    /// The model produced no usable intent text
    #[error("Model returned an empty intent")]
    EmptyIntent,
}
