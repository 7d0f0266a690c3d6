// Persisted run artifacts
//
// Batch runs append one line per result to `<out>.log`, flushing after
// every line so a crash loses nothing already produced. At the end the log
// is re-read and `<out>.json` is rewritten in full as a JSON array.

use crate::error::{EvalError, EvalResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

fn with_suffix(out: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(out.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// `<out>.log`
pub fn log_path(out: &Path) -> PathBuf {
    with_suffix(out, ".log")
}

/// `<out>.json`
pub fn json_path(out: &Path) -> PathBuf {
    with_suffix(out, ".json")
}

/// Append-only line log.
#[derive(Debug)]
pub struct AppendLog {
    path: PathBuf,
    file: File,
    written: usize,
}

impl AppendLog {
    /// Opens `path` for appending, creating it if needed.
    pub fn open(path: &Path) -> EvalResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { path: path.to_path_buf(), file, written: 0 })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines appended through this handle.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Appends one line and flushes it.
    pub fn append_line(&mut self, line: &str) -> EvalResult<()> {
        writeln!(self.file, "{line}")?;
        self.file.flush()?;
        self.written += 1;
        Ok(())
    }

    /// Appends `value` as one compact JSON line.
    pub fn append_json<T: Serialize>(&mut self, value: &T) -> EvalResult<()> {
        let line = serde_json::to_string(value)?;
        self.append_line(&line)
    }
}

/// Reads a JSON-lines file, skipping blank lines.
pub fn read_json_lines<T: DeserializeOwned>(path: &Path) -> EvalResult<Vec<T>> {
    let contents = std::fs::read_to_string(path)?;
    let mut items = Vec::new();

    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let item = serde_json::from_str(line).map_err(|e| {
            EvalError::Dataset(format!("failed to parse {} line {}: {}", path.display(), idx + 1, e))
        })?;
        items.push(item);
    }

    Ok(items)
}

/// Writes `items` as a pretty JSON array, replacing the file.
pub fn write_json_array<T: Serialize>(path: &Path, items: &[T]) -> EvalResult<()> {
    let mut out = serde_json::to_string_pretty(items)?;
    out.push('\n');
    std::fs::write(path, out)?;
    Ok(())
}

/// Rewrites `json` from every record in the JSON-lines `log`. Returns the record count.
pub fn rewrite_json_from_log(log: &Path, json: &Path) -> EvalResult<usize> {
    let records: Vec<serde_json::Value> = read_json_lines(log)?;
    write_json_array(json, &records)?;
    debug!(log = %log.display(), json = %json.display(), records = records.len(), "Rewrote JSON from log");
    Ok(records.len())
}

/// One simulated conversation as logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub intent: String,
    pub path: Vec<String>,
}

impl ConversationRecord {
    pub fn new(intent: impl Into<String>, path: Vec<String>) -> Self {
        Self { intent: intent.into(), path }
    }

    /// `intent<TAB>["node", ..., "terminal"]`
    pub fn to_log_line(&self) -> EvalResult<String> {
        Ok(format!("{}\t{}", self.intent, serde_json::to_string(&self.path)?))
    }

    /// Parses a line written by [`Self::to_log_line`].
    pub fn parse_log_line(line: &str) -> EvalResult<Self> {
        let (intent, path) = line
            .rsplit_once('\t')
            .ok_or_else(|| EvalError::Dataset(format!("missing tab separator in {line:?}")))?;
        let path = serde_json::from_str(path.trim())
            .map_err(|e| EvalError::Dataset(format!("invalid path in {line:?}: {e}")))?;
        Ok(Self { intent: intent.to_string(), path })
    }
}

/// Rewrites `json` from a tab-separated conversation `log`. Returns the record count.
pub fn rewrite_conversations_json(log: &Path, json: &Path) -> EvalResult<usize> {
    let contents = std::fs::read_to_string(log)?;
    let records = contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(ConversationRecord::parse_log_line)
        .collect::<EvalResult<Vec<_>>>()?;
    write_json_array(json, &records)?;
    Ok(records.len())
}
