use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a history entry is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// The command line as the user typed it
    Command,
    /// Result text of a command
    Output,
    Error,
    /// Notices that are neither output nor failure
    Info,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryKind::Command => "command",
            EntryKind::Output => "output",
            EntryKind::Error => "error",
            EntryKind::Info => "info",
        };
        write!(f, "{}", name)
    }
}

/// One record of a terminal interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: u64,
    pub command: String,
    pub result: Option<String>,
    pub kind: EntryKind,
    pub timestamp: DateTime<Utc>,
}

/// Display history of a session.
///
/// Ids come from a counter owned by the history, so they stay unique and
/// strictly increasing even across `clear`.
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
    last_id: u64,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return a copy of it
    pub fn push(&mut self, command: &str, result: Option<String>, kind: EntryKind) -> HistoryEntry {
        self.last_id += 1;
        let entry = HistoryEntry {
            id: self.last_id,
            command: command.to_string(),
            result,
            kind,
            timestamp: Utc::now(),
        };
        self.entries.push(entry.clone());
        entry
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
