use thiserror::Error;

pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// Errors raised while building or loading a chatbot graph.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("chatbot definition has no sections")]
    Empty,

    #[error("section '{0}' is defined more than once")]
    DuplicateNode(String),

    #[error("root section '{0}' not found")]
    RootNotFound(String),

    #[error("choice '{label}' of section '{from}' points at unknown section '{to}'")]
    DanglingEdge { from: String, label: String, to: String },

    #[error("edge source section '{0}' not found")]
    UnknownSource(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to parse chatbot definition: {0}")]
    Json(#[from] serde_json::Error),
}
