use super::history::HistoryEntry;

/// Change notifications published by the terminal store
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    EntryAppended(HistoryEntry),
    /// Display history and output buffer were truncated
    HistoryCleared,
    CommandLogCleared,
    ProcessingChanged(bool),
    CursorMoved(Option<usize>),
    CurrentCommandChanged(String),
    OutputAppended(String),
}
