//! Terminal session store
//!
//! Owns the display history, the raw command log with its recall cursor, the
//! processing flag and the mirrored input line. The presentation layer reads
//! snapshots or subscribes to [`StoreEvent`]s and changes state only through
//! the operations on [`TerminalStore`].
//!
//! State sits behind a short-lived lock that is never held across an await,
//! so the store can be shared as `Arc<TerminalStore>` between the input loop
//! and whatever renders it.

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::{SubmitPolicy, TerminalConfig};

pub mod backend;
pub mod builtin;
pub mod events;
pub mod history;
pub mod navigation;

pub use backend::{BackendReply, CommandBackend, CommandContext, DeferredBackend, GatewayBackend};
pub use builtin::{Builtin, BuiltinOutcome};
pub use events::StoreEvent;
pub use history::{EntryKind, HistoryEntry};
pub use navigation::Direction;

use builtin::StatusReport;
use history::History;
use navigation::CommandLog;

/// Result text recorded for a submission abandoned mid-flight
pub const CANCELLED_NOTICE: &str = "command cancelled";

/// What happened to a submitted command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input, nothing recorded
    Ignored,
    /// Another command was running and the policy is `reject`
    Rejected,
    Completed,
}

/// Read-only copy of the whole store
#[derive(Debug, Clone, Serialize)]
pub struct TerminalSnapshot {
    pub session_id: Uuid,
    pub history: Vec<HistoryEntry>,
    pub output: Vec<String>,
    pub command_log: Vec<String>,
    pub cursor: Option<usize>,
    pub processing: bool,
    pub current_command: String,
}

#[derive(Debug, Default)]
struct SessionState {
    history: History,
    output: Vec<String>,
    log: CommandLog,
    processing: bool,
    current_command: String,
}

/// Puts the store back to idle when a submission ends, however it ends.
///
/// A submission dropped before completion (timeout, `select!`, task abort)
/// still gets its error entry.
struct RunningCommand<'a> {
    store: &'a TerminalStore,
    command: &'a str,
    finished: bool,
}

impl Drop for RunningCommand<'_> {
    fn drop(&mut self) {
        let store = self.store;
        let mut state = store.state();
        if !self.finished {
            tracing::warn!("Command '{}' was cancelled", self.command);
            let entry = state.history.push(
                self.command,
                Some(CANCELLED_NOTICE.to_string()),
                EntryKind::Error,
            );
            store.emit(StoreEvent::EntryAppended(entry));
        }
        state.processing = false;
        state.log.reset_cursor();
        store.emit(StoreEvent::ProcessingChanged(false));
        store.emit(StoreEvent::CursorMoved(None));
    }
}

pub struct TerminalStore {
    session_id: Uuid,
    state: Mutex<SessionState>,
    /// Held for the whole duration of one submission
    turn: tokio::sync::Mutex<()>,
    backend: Arc<dyn CommandBackend>,
    latency: Duration,
    policy: SubmitPolicy,
    context_commands: usize,
    events: broadcast::Sender<StoreEvent>,
}

impl TerminalStore {
    pub fn new(config: &TerminalConfig, backend: Arc<dyn CommandBackend>) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            session_id: Uuid::new_v4(),
            state: Mutex::new(SessionState::default()),
            turn: tokio::sync::Mutex::new(()),
            backend,
            latency: config.latency(),
            policy: config.submit_policy,
            context_commands: config.context_commands,
            events,
        }
    }

    /// Store whose non-built-in commands get the integration-pending notice
    pub fn offline(config: &TerminalConfig) -> Self {
        Self::new(config, Arc::new(DeferredBackend))
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Run one command through the built-ins or the backend.
    ///
    /// Appends a `command` entry up front and at most one `output`, `info`
    /// or `error` entry when done (`clear` appends none). Leaves the store
    /// idle with the recall cursor reset.
    pub async fn submit(&self, command: &str) -> SubmitOutcome {
        if command.trim().is_empty() {
            return SubmitOutcome::Ignored;
        }

        let _turn = match self.policy {
            SubmitPolicy::Queue => self.turn.lock().await,
            SubmitPolicy::Reject => match self.turn.try_lock() {
                Ok(guard) => guard,
                Err(_) => {
                    tracing::warn!("Rejected '{}' while another command is running", command);
                    return SubmitOutcome::Rejected;
                }
            },
        };

        tracing::debug!("Executing command: {}", command);

        let context = {
            let mut state = self.state();
            state.processing = true;
            state.log.push(command);
            let entry = state.history.push(command, None, EntryKind::Command);
            self.emit(StoreEvent::ProcessingChanged(true));
            self.emit(StoreEvent::EntryAppended(entry));

            CommandContext {
                session_id: self.session_id,
                recent_commands: state.log.recent(self.context_commands).to_vec(),
            }
        };

        // From here on the store returns to idle even if this future is dropped
        let mut running = RunningCommand {
            store: self,
            command,
            finished: false,
        };

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let reply = match self.dispatch_builtin(command) {
            Some(BuiltinOutcome::Text(text)) => Some(BackendReply::output(text)),
            Some(BuiltinOutcome::Cleared) => None,
            None => match self.backend.dispatch(command, &context).await {
                Ok(reply) => Some(reply),
                Err(e) => {
                    tracing::warn!("Command '{}' failed: {:#}", command, e);
                    Some(BackendReply {
                        kind: EntryKind::Error,
                        text: e.to_string(),
                    })
                }
            },
        };

        if let Some(reply) = reply {
            let entry = self.state().history.push(command, Some(reply.text), reply.kind);
            self.emit(StoreEvent::EntryAppended(entry));
        }
        running.finished = true;

        SubmitOutcome::Completed
    }

    /// Run `command` if it names a built-in; `None` means it should be
    /// forwarded to the backend.
    pub fn dispatch_builtin(&self, command: &str) -> Option<BuiltinOutcome> {
        let parsed = Builtin::parse(command)?;
        let mut state = self.state();

        let outcome = match parsed {
            Builtin::Help => BuiltinOutcome::Text(builtin::help_text()),
            Builtin::Clear => {
                state.history.clear();
                state.output.clear();
                tracing::info!("Terminal history cleared");
                self.emit(StoreEvent::HistoryCleared);
                BuiltinOutcome::Cleared
            }
            Builtin::History => BuiltinOutcome::Text(builtin::history_text(state.log.commands())),
            Builtin::Status => BuiltinOutcome::Text(builtin::status_text(&StatusReport {
                command_count: state.log.len(),
                active: !state.processing,
                last_command: state.log.last(),
            })),
            Builtin::About => BuiltinOutcome::Text(builtin::about_text()),
        };

        Some(outcome)
    }

    /// Step through the command log; returns the line to show in the input
    pub fn navigate(&self, direction: Direction) -> String {
        let mut state = self.state();
        let before = state.log.cursor();
        let recalled = state.log.navigate(direction);
        let after = state.log.cursor();
        if before != after {
            self.emit(StoreEvent::CursorMoved(after));
        }
        recalled
    }

    /// Forget all submitted commands. Display history is left alone.
    pub fn clear_command_log(&self) {
        self.state().log.clear();
        self.emit(StoreEvent::CommandLogCleared);
    }

    pub fn set_current_command(&self, text: impl Into<String>) {
        let text = text.into();
        self.state().current_command = text.clone();
        self.emit(StoreEvent::CurrentCommandChanged(text));
    }

    /// Append an arbitrary entry to the display history
    pub fn add_entry(&self, command: &str, result: Option<String>, kind: EntryKind) -> HistoryEntry {
        let entry = self.state().history.push(command, result, kind);
        self.emit(StoreEvent::EntryAppended(entry.clone()));
        entry
    }

    /// Append a raw line to the output buffer
    pub fn push_output(&self, line: impl Into<String>) {
        let line = line.into();
        self.state().output.push(line.clone());
        self.emit(StoreEvent::OutputAppended(line));
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.state().history.entries().to_vec()
    }

    pub fn command_log(&self) -> Vec<String> {
        self.state().log.commands().to_vec()
    }

    pub fn output(&self) -> Vec<String> {
        self.state().output.clone()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.state().log.cursor()
    }

    pub fn is_processing(&self) -> bool {
        self.state().processing
    }

    /// Whether new input should be accepted
    pub fn is_active(&self) -> bool {
        !self.is_processing()
    }

    pub fn current_command(&self) -> String {
        self.state().current_command.clone()
    }

    pub fn last_command(&self) -> Option<String> {
        self.state().log.last().map(str::to_string)
    }

    pub fn command_count(&self) -> usize {
        self.state().log.len()
    }

    pub fn snapshot(&self) -> TerminalSnapshot {
        let state = self.state();
        TerminalSnapshot {
            session_id: self.session_id,
            history: state.history.entries().to_vec(),
            output: state.output.clone(),
            command_log: state.log.commands().to_vec(),
            cursor: state.log.cursor(),
            processing: state.processing,
            current_command: state.current_command.clone(),
        }
    }
}
