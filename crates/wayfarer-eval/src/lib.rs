//! Wayfarer evaluation
//!
//! Labeled navigation examples, the artifacts batch runs persist, and the
//! machinery to rank similarity evaluators on them:
//! - `LabeledRecord` / `LabeledData` and dataset fingerprints
//! - append-only logs with companion JSON arrays
//! - similarity evaluators (random, embedding cosine, safe wrapper)
//! - cross-entropy and cosine-margin losses
//! - the dataset scoring harness and its report

pub mod artifacts;
pub mod dataset;
pub mod error;
pub mod loss;
pub mod progress;
pub mod report;
pub mod similarity;

pub use artifacts::{AppendLog, ConversationRecord};
pub use dataset::{ChoiceRecord, DatasetId, LabeledData, LabeledRecord, compute_dataset_id};
pub use error::{EvalError, EvalResult};
pub use loss::{cosine_similarity_loss, cross_entropy_loss};
pub use progress::{NullProgressSink, ProgressEvent, ProgressSink, StdoutProgressSink};
pub use report::{EvaluationReport, LossSummary, score_dataset};
pub use similarity::{EmbeddingSimilarity, RandomSimilarity, SafeSimilarity, SimilarityEvaluator};
