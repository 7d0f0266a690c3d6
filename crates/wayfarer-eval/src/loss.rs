// Example-level losses
//
// Both losses score one labeled example from the similarity of its intent
// to each candidate choice. Lower is better.

use crate::dataset::LabeledData;
use crate::error::{EvalError, EvalResult};
use crate::similarity::SimilarityEvaluator;

fn check_index(similarities: &[f64], correct: usize) -> EvalResult<()> {
    if similarities.is_empty() {
        return Err(EvalError::EmptyChoices);
    }
    if correct >= similarities.len() {
        return Err(EvalError::Dataset(format!(
            "correct index {correct} out of range for {} choices",
            similarities.len()
        )));
    }
    Ok(())
}

/// Negative log of the softmax probability of the correct choice.
///
/// Equals `ln(N)` when all `N` similarities are equal.
pub fn cross_entropy(similarities: &[f64], correct: usize) -> EvalResult<f64> {
    check_index(similarities, correct)?;
    let max = similarities.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let log_sum_exp = max + similarities.iter().map(|s| (s - max).exp()).sum::<f64>().ln();
    Ok(log_sum_exp - similarities[correct])
}

/// `1 - s` for the correct choice plus `s` for every other choice.
pub fn cosine_margin(similarities: &[f64], correct: usize) -> EvalResult<f64> {
    check_index(similarities, correct)?;
    Ok(similarities
        .iter()
        .enumerate()
        .map(|(i, &s)| if i == correct { 1.0 - s } else { s })
        .sum())
}

/// True when the correct choice has the highest similarity; ties go to the earliest choice.
pub fn is_top_choice(similarities: &[f64], correct: usize) -> bool {
    let mut best = 0;
    for (i, &s) in similarities.iter().enumerate() {
        if s > similarities[best] {
            best = i;
        }
    }
    !similarities.is_empty() && best == correct
}

/// Similarity of the intent to each choice, in choice order.
pub async fn choice_similarities<E: SimilarityEvaluator + ?Sized>(
    example: &LabeledData,
    evaluator: &mut E,
) -> EvalResult<Vec<f64>> {
    let mut similarities = Vec::with_capacity(example.choices().len());
    for choice in example.choices() {
        similarities.push(evaluator.similarity(example.intent(), choice).await?);
    }
    Ok(similarities)
}

pub async fn cross_entropy_loss<E: SimilarityEvaluator + ?Sized>(
    example: &LabeledData,
    evaluator: &mut E,
) -> EvalResult<f64> {
    let similarities = choice_similarities(example, evaluator).await?;
    cross_entropy(&similarities, example.correct_index())
}

pub async fn cosine_similarity_loss<E: SimilarityEvaluator + ?Sized>(
    example: &LabeledData,
    evaluator: &mut E,
) -> EvalResult<f64> {
    let similarities = choice_similarities(example, evaluator).await?;
    cosine_margin(&similarities, example.correct_index())
}
