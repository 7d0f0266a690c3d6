use serde::{Deserialize, Serialize};

/// Progress of a batch run. Indices are zero-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Started { total: usize },
    Item { index: usize, total: usize },
    Skipped { index: usize, reason: String },
    Finished { completed: usize, skipped: usize },
}

pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: ProgressEvent);
}

/// Prints events prefixed with the task name.
#[derive(Debug)]
pub struct StdoutProgressSink {
    task: String,
}

impl StdoutProgressSink {
    pub fn new(task: impl Into<String>) -> Self {
        Self { task: task.into() }
    }
}

impl ProgressSink for StdoutProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        let task = &self.task;
        match event {
            ProgressEvent::Started { total } => println!("[{task}] started ({total} items)"),
            ProgressEvent::Item { index, total } => println!("[{task}] {}/{total}", index + 1),
            ProgressEvent::Skipped { index, reason } => {
                println!("[{task}] skipped item {}: {reason}", index + 1);
            }
            ProgressEvent::Finished { completed, skipped } => {
                println!("[{task}] finished ({completed} done, {skipped} skipped)");
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Default)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn on_event(&self, _event: ProgressEvent) {}
}
