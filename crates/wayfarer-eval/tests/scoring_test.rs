//! End-to-end scoring over a labeled dataset written to disk.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use wayfarer_abstraction::ModelError;
use wayfarer_eval::artifacts::{AppendLog, json_path, log_path, rewrite_json_from_log};
use wayfarer_eval::dataset::{load_records, resolve_records};
use wayfarer_eval::{
    EvalError, EvalResult, LabeledRecord, NullProgressSink, ProgressEvent, ProgressSink, RandomSimilarity,
    SimilarityEvaluator, compute_dataset_id, score_dataset,
};
use wayfarer_graph::ChatbotGraph;

fn graph() -> ChatbotGraph {
    ChatbotGraph::builder("support-bot")
        .node("A", "무엇을 도와드릴까요?")
        .node("B", "결제")
        .node("C", "기술 지원")
        .node("D", "채용")
        .edge("A", "billing", "B")
        .edge("A", "support", "C")
        .edge("A", "jobs", "D")
        .build()
        .unwrap()
}

/// Scores by the choice text; fails for choices listed in `failing`.
struct ByChoice {
    scores: HashMap<&'static str, f64>,
    failing: Vec<&'static str>,
}

#[async_trait]
impl SimilarityEvaluator for ByChoice {
    async fn similarity(&mut self, s1: &str, s2: &str) -> EvalResult<f64> {
        if self.failing.iter().any(|f| *f == s1) {
            return Err(ModelError::RequestError("connection reset".to_string()).into());
        }
        Ok(self.scores.get(s2).copied().unwrap_or(0.0))
    }

    fn name(&self) -> &str {
        "by-choice"
    }
}

#[derive(Default)]
struct Recorder(Mutex<Vec<ProgressEvent>>);

impl ProgressSink for Recorder {
    fn on_event(&self, event: ProgressEvent) {
        self.0.lock().unwrap().push(event);
    }
}

/// Writes records through the log, then rewrites the companion JSON.
fn write_dataset(dir: &std::path::Path, records: &[LabeledRecord]) -> std::path::PathBuf {
    let out = dir.join("labels");
    let mut log = AppendLog::open(&log_path(&out)).unwrap();
    for record in records {
        log.append_json(record).unwrap();
    }
    let json = json_path(&out);
    assert_eq!(rewrite_json_from_log(&log_path(&out), &json).unwrap(), records.len());
    json
}

fn records(graph: &ChatbotGraph) -> Vec<LabeledRecord> {
    vec![
        LabeledRecord::from_transition(graph, "환불해 주세요", "A", "B").unwrap(),
        LabeledRecord::from_transition(graph, "앱이 멈춰요", "A", "C").unwrap(),
        LabeledRecord::from_transition(graph, "채용 공고가 궁금해요", "A", "D").unwrap(),
    ]
}

#[tokio::test]
async fn test_score_perfect_evaluator() {
    let graph = graph();
    let dir = tempfile::tempdir().unwrap();
    let records = vec![LabeledRecord::from_transition(&graph, "환불해 주세요", "A", "B").unwrap()];
    let json = write_dataset(dir.path(), &records);

    let loaded = load_records(&json).unwrap();
    assert_eq!(loaded, records);
    let data = resolve_records(&loaded).unwrap();
    let id = compute_dataset_id(&loaded).unwrap();

    let evaluator = ByChoice { scores: HashMap::from([("billing", 1.0)]), failing: vec![] };
    let report = score_dataset(&data, id.clone(), evaluator, &NullProgressSink).await.unwrap();

    assert_eq!(report.evaluator, "by-choice");
    assert_eq!(report.dataset_id, id);
    assert_eq!(report.examples, 1);
    assert_eq!(report.skipped, 0);
    assert!(report.cosine.total.abs() < f64::EPSILON);
    assert!((report.accuracy - 1.0).abs() < f64::EPSILON);

    let report_path = dir.path().join("report.json");
    report.write_json(&report_path).unwrap();
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(written["examples"], 1);
    assert!(written["cross_entropy"]["mean"].is_number());
}

#[tokio::test]
async fn test_external_failures_skip_examples() {
    let graph = graph();
    let data = resolve_records(&records(&graph)).unwrap();
    let evaluator = ByChoice { scores: HashMap::new(), failing: vec!["앱이 멈춰요"] };
    let recorder = Recorder::default();

    let id = compute_dataset_id(&records(&graph)).unwrap();
    let report = score_dataset(&data, id, evaluator, &recorder).await.unwrap();

    assert_eq!(report.examples, 2);
    assert_eq!(report.skipped, 1);
    assert!((report.cross_entropy.mean - 3.0_f64.ln()).abs() < 1e-12);

    let events = recorder.0.lock().unwrap();
    assert_eq!(events.first(), Some(&ProgressEvent::Started { total: 3 }));
    assert!(events.iter().any(|e| matches!(e, ProgressEvent::Skipped { index: 1, .. })));
    assert_eq!(events.last(), Some(&ProgressEvent::Finished { completed: 2, skipped: 1 }));
}

#[tokio::test]
async fn test_out_of_range_score_aborts() {
    let graph = graph();
    let data = resolve_records(&records(&graph)).unwrap();
    let evaluator = ByChoice { scores: HashMap::from([("support", 1.5)]), failing: vec![] };
    let id = compute_dataset_id(&records(&graph)).unwrap();

    let err = score_dataset(&data, id, evaluator, &NullProgressSink).await.unwrap_err();
    assert!(matches!(err, EvalError::Validation { ref evaluator, .. } if evaluator == "by-choice"));
}

#[tokio::test]
async fn test_random_baseline_report() {
    let graph = graph();
    let data = resolve_records(&records(&graph)).unwrap();
    let id = compute_dataset_id(&records(&graph)).unwrap();

    let report = score_dataset(&data, id, RandomSimilarity::seeded(3), &NullProgressSink).await.unwrap();

    assert_eq!(report.evaluator, "random");
    assert_eq!(report.examples, 3);
    assert!(report.cross_entropy.mean > 0.0);
    assert!((0.0..=1.0).contains(&report.accuracy));
}
