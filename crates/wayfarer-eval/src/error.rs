use thiserror::Error;
use wayfarer_abstraction::ModelError;
use wayfarer_graph::GraphError;

pub type EvalResult<T> = std::result::Result<T, EvalError>;

#[derive(Debug, Error)]
pub enum EvalError {
    /// An evaluator produced a score outside [0, 1]. Never recovered.
    #[error("similarity from '{evaluator}' is outside [0, 1]: {score}")]
    Validation { evaluator: String, score: f64 },

    #[error("embedding of {0:?} has zero norm")]
    DegenerateEmbedding(String),

    #[error("embedding dimensions differ: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("labeled example has no choices")]
    EmptyChoices,

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl EvalError {
    /// Failures of an external collaborator, which abandon one example only.
    pub fn is_external(&self) -> bool {
        matches!(self, Self::Model(_))
    }
}
