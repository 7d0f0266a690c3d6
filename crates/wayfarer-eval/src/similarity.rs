// Similarity evaluators
//
// Interchangeable strategies scoring how related two strings are. Scores
// are expected in [0, 1]; `SafeSimilarity` enforces that before any loss
// sees them.

use crate::error::{EvalError, EvalResult};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};
use wayfarer_abstraction::Embedder;

/// Scores the relatedness of two strings.
///
/// Takes `&mut self` so implementations can keep a local cache. One
/// instance serves one run on one task.
#[async_trait]
pub trait SimilarityEvaluator: Send {
    async fn similarity(&mut self, s1: &str, s2: &str) -> EvalResult<f64>;

    /// Name used in logs and reports.
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: SimilarityEvaluator + ?Sized> SimilarityEvaluator for Box<T> {
    async fn similarity(&mut self, s1: &str, s2: &str) -> EvalResult<f64> {
        (**self).similarity(s1, s2).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Uniform random baseline, for calibrating the harness.
#[derive(Debug)]
pub struct RandomSimilarity<R = StdRng> {
    rng: R,
}

impl RandomSimilarity<StdRng> {
    pub fn from_entropy() -> Self {
        Self { rng: StdRng::from_entropy() }
    }

    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl<R: Rng + Send> RandomSimilarity<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

#[async_trait]
impl<R: Rng + Send> SimilarityEvaluator for RandomSimilarity<R> {
    async fn similarity(&mut self, _s1: &str, _s2: &str) -> EvalResult<f64> {
        Ok(self.rng.gen_range(0.0..=1.0))
    }

    fn name(&self) -> &str {
        "random"
    }
}

/// Cosine similarity of dense embeddings.
///
/// Embeddings are cached by input string for the lifetime of the evaluator
/// and never invalidated.
///
/// Scores range over [-1, 1]. Opposed embeddings score below zero, which
/// [`SafeSimilarity`] rejects, so one such pair aborts a scoring run.
pub struct EmbeddingSimilarity {
    embedder: Arc<dyn Embedder>,
    name: String,
    cache: HashMap<String, Vec<f32>>,
}

impl EmbeddingSimilarity {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        let name = format!("embedding:{}", embedder.model_id());
        Self { embedder, name, cache: HashMap::new() }
    }

    /// Number of distinct strings embedded so far.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    async fn ensure_cached(&mut self, text: &str) -> EvalResult<()> {
        if !self.cache.contains_key(text) {
            let embedding = self.embedder.embed(text).await?;
            debug!(model_id = %self.embedder.model_id(), dims = embedding.len(), "Cached embedding");
            self.cache.insert(text.to_string(), embedding);
        }
        Ok(())
    }
}

#[async_trait]
impl SimilarityEvaluator for EmbeddingSimilarity {
    async fn similarity(&mut self, s1: &str, s2: &str) -> EvalResult<f64> {
        self.ensure_cached(s1).await?;
        self.ensure_cached(s2).await?;
        cosine_similarity((s1, self.cache[s1].as_slice()), (s2, self.cache[s2].as_slice()))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Cosine of the angle between two labeled vectors.
///
/// Rounding overshoot past ±1 is clamped.
pub fn cosine_similarity(a: (&str, &[f32]), b: (&str, &[f32])) -> EvalResult<f64> {
    let ((a_text, a), (b_text, b)) = (a, b);
    if a.len() != b.len() {
        return Err(EvalError::DimensionMismatch { left: a.len(), right: b.len() });
    }

    let mut dot = 0.0_f64;
    let mut a_norm = 0.0_f64;
    let mut b_norm = 0.0_f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        a_norm += x * x;
        b_norm += y * y;
    }

    if a_norm == 0.0 {
        return Err(EvalError::DegenerateEmbedding(a_text.to_string()));
    }
    if b_norm == 0.0 {
        return Err(EvalError::DegenerateEmbedding(b_text.to_string()));
    }

    Ok((dot / (a_norm.sqrt() * b_norm.sqrt())).clamp(-1.0, 1.0))
}

/// Rejects scores outside [0, 1] (NaN included) with `EvalError::Validation`.
#[derive(Debug)]
pub struct SafeSimilarity<S> {
    inner: S,
}

impl<S: SimilarityEvaluator> SafeSimilarity<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: SimilarityEvaluator> SimilarityEvaluator for SafeSimilarity<S> {
    async fn similarity(&mut self, s1: &str, s2: &str) -> EvalResult<f64> {
        let score = self.inner.similarity(s1, s2).await?;
        if !(0.0..=1.0).contains(&score) {
            error!(evaluator = %self.inner.name(), score, s1, s2, "Similarity out of range");
            return Err(EvalError::Validation { evaluator: self.inner.name().to_string(), score });
        }
        Ok(score)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_abstraction::ModelError;

    struct Fixed(f64);

    #[async_trait]
    impl SimilarityEvaluator for Fixed {
        async fn similarity(&mut self, _s1: &str, _s2: &str) -> EvalResult<f64> {
            Ok(self.0)
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    /// Maps known strings to vectors and counts calls.
    struct TableEmbedder {
        table: HashMap<&'static str, Vec<f32>>,
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl Embedder for TableEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.table.get(text).cloned().ok_or_else(|| ModelError::RequestError(format!("no vector for {text}")))
        }

        fn model_id(&self) -> &str {
            "table"
        }
    }

    fn embedder() -> Arc<TableEmbedder> {
        let table = HashMap::from([
            ("x", vec![1.0, 0.0]),
            ("y", vec![0.0, 2.0]),
            ("xy", vec![1.0, 1.0]),
            ("zero", vec![0.0, 0.0]),
            ("-x", vec![-1.0, 0.0]),
        ]);
        Arc::new(TableEmbedder { table, calls: std::sync::atomic::AtomicUsize::new(0) })
    }

    #[tokio::test]
    async fn test_random_in_unit_interval() {
        let mut random = RandomSimilarity::seeded(42);
        for _ in 0..100 {
            let score = random.similarity("a", "b").await.unwrap();
            assert!((0.0..=1.0).contains(&score));
        }
        assert_eq!(random.name(), "random");
    }

    #[tokio::test]
    async fn test_embedding_cosine_and_cache() {
        let table = embedder();
        let mut evaluator = EmbeddingSimilarity::new(table.clone());

        let orthogonal = evaluator.similarity("x", "y").await.unwrap();
        assert!(orthogonal.abs() < 1e-12);

        let diagonal = evaluator.similarity("x", "xy").await.unwrap();
        assert!((diagonal - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-6);

        let same = evaluator.similarity("xy", "xy").await.unwrap();
        assert!(same <= 1.0 && (same - 1.0).abs() < 1e-9);

        assert_eq!(evaluator.cached(), 3);
        assert_eq!(table.calls.load(std::sync::atomic::Ordering::SeqCst), 3);
        assert_eq!(evaluator.name(), "embedding:table");
    }

    #[tokio::test]
    async fn test_embedding_errors() {
        let mut evaluator = EmbeddingSimilarity::new(embedder());
        assert!(matches!(
            evaluator.similarity("x", "zero").await,
            Err(EvalError::DegenerateEmbedding(text)) if text == "zero"
        ));
        assert!(matches!(evaluator.similarity("x", "missing").await, Err(EvalError::Model(_))));
    }

    #[test]
    fn test_cosine_dimension_mismatch() {
        let err = cosine_similarity(("a", &[1.0_f32][..]), ("b", &[1.0_f32, 0.0][..])).unwrap_err();
        assert!(matches!(err, EvalError::DimensionMismatch { left: 1, right: 2 }));
    }

    #[tokio::test]
    async fn test_safe_rejects_out_of_range() {
        for bad in [1.5, -0.1, f64::NAN] {
            let mut safe = SafeSimilarity::new(Fixed(bad));
            let err = safe.similarity("a", "b").await.unwrap_err();
            assert!(matches!(err, EvalError::Validation { ref evaluator, .. } if evaluator == "fixed"));
        }
    }

    #[tokio::test]
    async fn test_negative_cosine_fails_validation() {
        let mut evaluator = EmbeddingSimilarity::new(embedder());
        let opposed = evaluator.similarity("x", "-x").await.unwrap();
        assert!((opposed + 1.0).abs() < 1e-12);

        let mut safe = SafeSimilarity::new(evaluator);
        let err = safe.similarity("x", "-x").await.unwrap_err();
        assert!(matches!(err, EvalError::Validation { score, .. } if score < 0.0));
    }

    #[tokio::test]
    async fn test_safe_passes_bounds() {
        for ok in [0.0, 0.5, 1.0] {
            let mut safe = SafeSimilarity::new(Fixed(ok));
            assert!((safe.similarity("a", "b").await.unwrap() - ok).abs() < f64::EPSILON);
        }
    }

    #[tokio::test]
    async fn test_boxed_evaluator() {
        let boxed: Box<dyn SimilarityEvaluator> = Box::new(Fixed(0.25));
        let mut safe = SafeSimilarity::new(boxed);
        assert_eq!(safe.name(), "fixed");
        assert!((safe.similarity("a", "b").await.unwrap() - 0.25).abs() < f64::EPSILON);
    }
}
