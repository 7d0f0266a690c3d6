// Dataset scoring harness
//
// Scores every labeled example with one evaluator, wrapped so that an
// out-of-range score aborts the run. Examples whose similarity calls fail
// externally are skipped and counted.

use crate::dataset::{DatasetId, LabeledData};
use crate::error::EvalResult;
use crate::loss::{choice_similarities, cosine_margin, cross_entropy, is_top_choice};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::similarity::{SafeSimilarity, SimilarityEvaluator};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LossSummary {
    pub total: f64,
    pub mean: f64,
}

impl LossSummary {
    fn from_total(total: f64, count: usize) -> Self {
        let mean = if count == 0 { 0.0 } else { total / count as f64 };
        Self { total, mean }
    }
}

struct ExampleScore {
    cross_entropy: f64,
    cosine: f64,
    correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub evaluator: String,
    pub dataset_id: DatasetId,
    pub created_at: DateTime<Utc>,
    /// Examples scored
    pub examples: usize,
    /// Examples abandoned after an external failure
    pub skipped: usize,
    pub cross_entropy: LossSummary,
    pub cosine: LossSummary,
    /// Share of scored examples whose correct choice ranked first
    pub accuracy: f64,
}

impl EvaluationReport {
    pub fn write_json(&self, path: &Path) -> EvalResult<()> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        std::fs::write(path, out)?;
        Ok(())
    }
}

/// Scores `data` with `evaluator`.
///
/// # Errors
/// Returns `EvalError::Validation` as soon as any score leaves [0, 1].
/// External failures skip the example instead.
pub async fn score_dataset<S: SimilarityEvaluator>(
    data: &[LabeledData],
    dataset_id: DatasetId,
    evaluator: S,
    sink: &dyn ProgressSink,
) -> EvalResult<EvaluationReport> {
    let mut evaluator = SafeSimilarity::new(evaluator);
    let total = data.len();
    let mut scores = Vec::with_capacity(total);
    let mut skipped = 0;

    sink.on_event(ProgressEvent::Started { total });
    info!(evaluator = %evaluator.name(), dataset_id = %dataset_id, examples = total, "Scoring dataset");

    for (index, example) in data.iter().enumerate() {
        sink.on_event(ProgressEvent::Item { index, total });

        let similarities = match choice_similarities(example, &mut evaluator).await {
            Ok(similarities) => similarities,
            Err(e) if e.is_external() => {
                warn!(index, intent = %example.intent(), error = %e, "Skipping example");
                sink.on_event(ProgressEvent::Skipped { index, reason: e.to_string() });
                skipped += 1;
                continue;
            }
            Err(e) => {
                error!(index, intent = %example.intent(), error = %e, "Aborting scoring run");
                return Err(e);
            }
        };

        let correct = example.correct_index();
        scores.push(ExampleScore {
            cross_entropy: cross_entropy(&similarities, correct)?,
            cosine: cosine_margin(&similarities, correct)?,
            correct: is_top_choice(&similarities, correct),
        });
    }

    sink.on_event(ProgressEvent::Finished { completed: scores.len(), skipped });

    let scored = scores.len();
    let hits = scores.iter().filter(|s| s.correct).count();
    let report = EvaluationReport {
        evaluator: evaluator.name().to_string(),
        dataset_id,
        created_at: Utc::now(),
        examples: scored,
        skipped,
        cross_entropy: LossSummary::from_total(scores.iter().map(|s| s.cross_entropy).sum(), scored),
        cosine: LossSummary::from_total(scores.iter().map(|s| s.cosine).sum(), scored),
        accuracy: if scored == 0 { 0.0 } else { hits as f64 / scored as f64 },
    };

    info!(
        evaluator = %report.evaluator,
        examples = report.examples,
        skipped = report.skipped,
        cross_entropy = report.cross_entropy.mean,
        cosine = report.cosine.mean,
        accuracy = report.accuracy,
        "Scoring finished"
    );

    Ok(report)
}
