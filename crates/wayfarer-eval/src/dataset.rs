use crate::error::{EvalError, EvalResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use wayfarer_graph::ChatbotGraph;

/// Stable identifier for a labeled dataset (content hash).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetId(pub String);

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A choice as written to labeled-data files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceRecord {
    pub text: String,
    pub next_section_id: String,
}

/// One labeled example as persisted: the node prompt, every choice offered
/// there, and the choice the model made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledRecord {
    pub intent: String,
    pub prompt: String,
    pub choices: Vec<ChoiceRecord>,
    pub choice: ChoiceRecord,
}

impl LabeledRecord {
    /// Records a move from `start_id` to `chosen_id` under `intent`.
    ///
    /// The recorded choice is the first edge of `start_id` that targets
    /// `chosen_id`.
    pub fn from_transition(
        graph: &ChatbotGraph,
        intent: &str,
        start_id: &str,
        chosen_id: &str,
    ) -> EvalResult<Self> {
        let start = graph
            .node(start_id)
            .ok_or_else(|| EvalError::Dataset(format!("unknown start node '{start_id}'")))?;

        let choices: Vec<ChoiceRecord> = graph
            .edges_of(start)
            .iter()
            .map(|edge| ChoiceRecord {
                text: edge.text().to_string(),
                next_section_id: edge.to_id().to_string(),
            })
            .collect();

        let choice = choices
            .iter()
            .find(|c| c.next_section_id == chosen_id)
            .cloned()
            .ok_or_else(|| {
                EvalError::Dataset(format!("node '{start_id}' has no choice leading to '{chosen_id}'"))
            })?;

        Ok(Self { intent: intent.to_string(), prompt: start.text().to_string(), choices, choice })
    }
}

/// One evaluation example, resolved from a [`LabeledRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledData {
    intent: String,
    prompt: String,
    choices: Vec<String>,
    correct_index: usize,
}

impl LabeledData {
    pub fn new(
        intent: impl Into<String>,
        prompt: impl Into<String>,
        choices: Vec<String>,
        correct_index: usize,
    ) -> EvalResult<Self> {
        if choices.is_empty() {
            return Err(EvalError::EmptyChoices);
        }
        if correct_index >= choices.len() {
            return Err(EvalError::Dataset(format!(
                "correct index {correct_index} out of range for {} choices",
                choices.len()
            )));
        }
        Ok(Self { intent: intent.into(), prompt: prompt.into(), choices, correct_index })
    }

    /// Resolves the correct index by matching the chosen target id.
    pub fn from_record(record: &LabeledRecord) -> EvalResult<Self> {
        if record.choices.is_empty() {
            return Err(EvalError::EmptyChoices);
        }
        let correct_index = record
            .choices
            .iter()
            .position(|c| c.next_section_id == record.choice.next_section_id)
            .ok_or_else(|| {
                EvalError::Dataset(format!(
                    "choice '{}' matches none of the candidates",
                    record.choice.next_section_id
                ))
            })?;

        Self::new(
            record.intent.clone(),
            record.prompt.clone(),
            record.choices.iter().map(|c| c.text.clone()).collect(),
            correct_index,
        )
    }

    pub fn intent(&self) -> &str {
        &self.intent
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    pub fn correct_choice(&self) -> &str {
        &self.choices[self.correct_index]
    }
}

pub fn compute_dataset_id(records: &[LabeledRecord]) -> EvalResult<DatasetId> {
    let mut hasher = Sha256::new();

    for record in records {
        let bytes = serde_json::to_vec(record)?;
        hasher.update(bytes);
        hasher.update(b"\n");
    }

    Ok(DatasetId(hex::encode(hasher.finalize())))
}

/// Reads a JSON array of labeled records.
pub fn load_records(path: &Path) -> EvalResult<Vec<LabeledRecord>> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| EvalError::Dataset(format!("failed to parse {}: {}", path.display(), e)))
}

/// Resolves every record, failing on the first malformed one.
pub fn resolve_records(records: &[LabeledRecord]) -> EvalResult<Vec<LabeledData>> {
    records
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            LabeledData::from_record(record).map_err(|e| match e {
                EvalError::Dataset(msg) => EvalError::Dataset(format!("record[{idx}]: {msg}")),
                other => other,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> LabeledRecord {
        LabeledRecord {
            intent: "환불 받고 싶어요".to_string(),
            prompt: "무엇을 도와드릴까요?".to_string(),
            choices: vec![
                ChoiceRecord { text: "billing".to_string(), next_section_id: "B".to_string() },
                ChoiceRecord { text: "support".to_string(), next_section_id: "C".to_string() },
            ],
            choice: ChoiceRecord { text: "support".to_string(), next_section_id: "C".to_string() },
        }
    }

    #[test]
    fn test_record_uses_camel_case() {
        let json = serde_json::to_value(record()).unwrap();
        assert_eq!(json["choice"]["nextSectionId"], "C");
        assert!(json["choices"][0].get("next_section_id").is_none());
    }

    #[test]
    fn test_from_record_resolves_index() {
        let data = LabeledData::from_record(&record()).unwrap();
        assert_eq!(data.correct_index(), 1);
        assert_eq!(data.correct_choice(), "support");
        assert_eq!(data.choices(), ["billing", "support"]);
    }

    #[test]
    fn test_from_record_rejects_unmatched_choice() {
        let mut r = record();
        r.choice.next_section_id = "Z".to_string();
        assert!(matches!(LabeledData::from_record(&r), Err(EvalError::Dataset(_))));

        r.choices.clear();
        assert!(matches!(LabeledData::from_record(&r), Err(EvalError::EmptyChoices)));
    }

    #[test]
    fn test_new_rejects_out_of_range_index() {
        assert!(LabeledData::new("i", "p", vec!["a".to_string()], 1).is_err());
        assert!(matches!(LabeledData::new("i", "p", vec![], 0), Err(EvalError::EmptyChoices)));
    }

    #[test]
    fn test_from_transition() {
        let graph = ChatbotGraph::builder("g")
            .node("A", "start")
            .node("B", "b")
            .node("C", "c")
            .edge("A", "billing", "B")
            .edge("A", "support", "C")
            .build()
            .unwrap();

        let r = LabeledRecord::from_transition(&graph, "intent", "A", "C").unwrap();
        assert_eq!(r.prompt, "start");
        assert_eq!(r.choices.len(), 2);
        assert_eq!(r.choice.text, "support");

        assert!(LabeledRecord::from_transition(&graph, "intent", "A", "A").is_err());
        assert!(LabeledRecord::from_transition(&graph, "intent", "Q", "B").is_err());
    }

    #[test]
    fn test_compute_dataset_id_stable_for_same_content() {
        let records = vec![record(), record()];
        let id1 = compute_dataset_id(&records).unwrap();
        let id2 = compute_dataset_id(&records).unwrap();
        assert_eq!(id1, id2);
        assert_eq!(id1.0.len(), 64);
        assert_ne!(id1, compute_dataset_id(&records[..1]).unwrap());
    }

    #[test]
    fn test_resolve_records_reports_index() {
        let mut bad = record();
        bad.choice.next_section_id = "Z".to_string();
        let err = resolve_records(&[record(), bad]).unwrap_err();
        assert!(err.to_string().contains("record[1]"));
    }
}
