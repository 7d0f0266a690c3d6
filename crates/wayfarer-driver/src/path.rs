// Conversation paths
//
// A path is the ordered list of visited node ids, optionally closed by a
// terminal marker. It serializes as a flat JSON array of strings, which is
// the format written to conversation logs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker closing a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terminal {
    Exit,
    Summon,
    Error,
}

impl Terminal {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exit => "exit",
            Self::Summon => "summon",
            Self::Error => "error",
        }
    }

    /// Parses a marker; node ids never collide with these in practice.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "exit" => Some(Self::Exit),
            "summon" => Some(Self::Summon),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One path entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PathEntry {
    Node(String),
    Terminal(Terminal),
}

impl PathEntry {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Node(id) => id,
            Self::Terminal(t) => t.as_str(),
        }
    }
}

impl From<String> for PathEntry {
    fn from(s: String) -> Self {
        match Terminal::parse(&s) {
            Some(t) => Self::Terminal(t),
            None => Self::Node(s),
        }
    }
}

impl From<PathEntry> for String {
    fn from(entry: PathEntry) -> Self {
        match entry {
            PathEntry::Node(id) => id,
            PathEntry::Terminal(t) => t.as_str().to_string(),
        }
    }
}

/// Visited node ids plus an optional terminal marker
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationPath {
    entries: Vec<PathEntry>,
}

impl ConversationPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_node(&mut self, id: impl Into<String>) {
        self.entries.push(PathEntry::Node(id.into()));
    }

    pub fn push_terminal(&mut self, terminal: Terminal) {
        self.entries.push(PathEntry::Terminal(terminal));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PathEntry] {
        &self.entries
    }

    /// The terminal marker, if the path ends with one
    pub fn terminal(&self) -> Option<Terminal> {
        match self.entries.last() {
            Some(PathEntry::Terminal(t)) => Some(*t),
            _ => None,
        }
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.as_str().to_string()).collect()
    }
}

/// Renders as a JSON array of strings
impl fmt::Display for ConversationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
