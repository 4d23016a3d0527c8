use ai_terminal::config::{SubmitPolicy, TerminalConfig};
use ai_terminal::terminal::backend::PENDING_NOTICE;
use ai_terminal::terminal::{
    BackendReply, CANCELLED_NOTICE, BuiltinOutcome, CommandBackend, CommandContext, Direction, EntryKind,
    StoreEvent, SubmitOutcome, TerminalStore,
};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn instant_config() -> TerminalConfig {
    TerminalConfig {
        latency_ms: 0,
        ..TerminalConfig::default()
    }
}

fn offline_store() -> TerminalStore {
    TerminalStore::offline(&instant_config())
}

struct FailingBackend;

#[async_trait]
impl CommandBackend for FailingBackend {
    async fn dispatch(&self, _command: &str, _context: &CommandContext) -> Result<BackendReply> {
        anyhow::bail!("backend unavailable")
    }
}

/// Records the contexts it receives and echoes the command back
#[derive(Default)]
struct RecordingBackend {
    contexts: Mutex<Vec<CommandContext>>,
}

#[async_trait]
impl CommandBackend for RecordingBackend {
    async fn dispatch(&self, command: &str, context: &CommandContext) -> Result<BackendReply> {
        self.contexts.lock().unwrap().push(context.clone());
        Ok(BackendReply::output(format!("echo: {}", command)))
    }
}

#[tokio::test]
async fn test_builtin_appends_command_and_output() {
    let store = offline_store();

    assert_eq!(store.submit("help").await, SubmitOutcome::Completed);

    let history = store.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].kind, EntryKind::Command);
    assert_eq!(history[0].command, "help");
    assert!(history[0].result.is_none());
    assert_eq!(history[1].kind, EntryKind::Output);
    assert!(history[1].result.as_deref().unwrap().contains("Available commands"));
    assert!(history[0].id < history[1].id);

    assert!(!store.is_processing());
    assert_eq!(store.cursor(), None);
}

#[tokio::test]
async fn test_unknown_command_gets_pending_notice() {
    let store = offline_store();

    store.submit("build a login page").await;

    let history = store.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].kind, EntryKind::Info);
    assert_eq!(history[1].result.as_deref(), Some(PENDING_NOTICE));
}

#[tokio::test]
async fn test_blank_submission_changes_nothing() {
    let store = offline_store();
    store.submit("ls").await;
    store.navigate(Direction::Up);
    let before = store.snapshot();

    assert_eq!(store.submit("").await, SubmitOutcome::Ignored);
    assert_eq!(store.submit("   \t ").await, SubmitOutcome::Ignored);

    let after = store.snapshot();
    assert_eq!(after.history, before.history);
    assert_eq!(after.command_log, before.command_log);
    assert_eq!(after.cursor, Some(0));
}

#[tokio::test]
async fn test_backend_error_becomes_error_entry() {
    let store = TerminalStore::new(&instant_config(), Arc::new(FailingBackend));

    assert_eq!(store.submit("deploy").await, SubmitOutcome::Completed);

    let history = store.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].kind, EntryKind::Error);
    assert_eq!(history[1].result.as_deref(), Some("backend unavailable"));
    assert!(!store.is_processing());
}

#[tokio::test]
async fn test_clear_empties_history_but_keeps_command_log() {
    let store = offline_store();
    store.submit("ls").await;
    store.submit("help").await;
    store.push_output("raw line");
    assert_eq!(store.history().len(), 4);

    store.submit("clear").await;

    assert!(store.history().is_empty());
    assert!(store.output().is_empty());
    assert_eq!(store.command_log(), vec!["ls", "help", "clear"]);
}

#[tokio::test]
async fn test_clear_command_log_keeps_history() {
    let store = offline_store();
    store.submit("ls").await;
    store.submit("pwd").await;
    store.navigate(Direction::Up);

    store.clear_command_log();

    assert!(store.command_log().is_empty());
    assert_eq!(store.cursor(), None);
    assert_eq!(store.history().len(), 4);
    assert_eq!(store.navigate(Direction::Up), "");
}

#[tokio::test]
async fn test_status_counts_itself() {
    let store = offline_store();
    store.submit("ls").await;
    store.submit("pwd").await;
    store.submit("status").await;

    let history = store.history();
    let report = history.last().unwrap().result.clone().unwrap();
    assert!(report.contains("Commands executed: 3"));
    assert!(report.contains("Last command: status"));
    assert!(report.contains("Terminal active: No"));
}

#[tokio::test]
async fn test_history_builtin_lists_commands() {
    let store = offline_store();
    store.submit("ls").await;
    store.submit("History").await;

    let history = store.history();
    assert_eq!(
        history.last().unwrap().result.as_deref(),
        Some("1: ls\n2: History")
    );
}

#[test]
fn test_dispatch_builtin_is_case_and_space_insensitive() {
    let store = offline_store();

    let upper = store.dispatch_builtin("HELP");
    let padded = store.dispatch_builtin(" help ");
    let plain = store.dispatch_builtin("help");

    assert!(matches!(plain, Some(BuiltinOutcome::Text(_))));
    assert_eq!(upper, plain);
    assert_eq!(padded, plain);
    assert_eq!(store.dispatch_builtin("generate"), None);
    assert_eq!(store.dispatch_builtin("clear"), Some(BuiltinOutcome::Cleared));
}

#[test]
fn test_dispatch_history_when_empty() {
    let store = offline_store();
    assert_eq!(
        store.dispatch_builtin("history"),
        Some(BuiltinOutcome::Text("No commands in history".to_string()))
    );
}

#[tokio::test]
async fn test_navigation_through_store() {
    let store = offline_store();
    store.submit("ls").await;
    store.submit("pwd").await;

    assert_eq!(store.navigate(Direction::Up), "pwd");
    assert_eq!(store.navigate(Direction::Up), "ls");
    assert_eq!(store.navigate(Direction::Up), "ls");
    assert_eq!(store.cursor(), Some(1));
    assert_eq!(store.navigate(Direction::Down), "pwd");
    assert_eq!(store.navigate(Direction::Down), "");
    assert_eq!(store.cursor(), None);
}

#[tokio::test]
async fn test_submit_resets_cursor() {
    let store = offline_store();
    store.submit("ls").await;
    store.navigate(Direction::Up);
    assert_eq!(store.cursor(), Some(0));

    store.submit("pwd").await;
    assert_eq!(store.cursor(), None);
}

#[test]
fn test_set_current_command_and_getters() {
    let store = offline_store();
    assert!(store.is_active());
    assert_eq!(store.last_command(), None);
    assert_eq!(store.command_count(), 0);

    store.set_current_command("git st");
    assert_eq!(store.current_command(), "git st");
    store.set_current_command("");
    assert_eq!(store.current_command(), "");
}

#[test]
fn test_add_entry_appends() {
    let store = offline_store();
    let entry = store.add_entry("notice", Some("connected".into()), EntryKind::Info);
    assert_eq!(store.history(), vec![entry]);
}

#[tokio::test]
async fn test_context_carries_recent_commands() {
    let backend = Arc::new(RecordingBackend::default());
    let config = TerminalConfig {
        latency_ms: 0,
        context_commands: 2,
        ..TerminalConfig::default()
    };
    let store = TerminalStore::new(&config, backend.clone());

    store.submit("one").await;
    store.submit("help").await;
    store.submit("three").await;

    let contexts = backend.contexts.lock().unwrap();
    assert_eq!(contexts.len(), 2);
    assert_eq!(contexts[1].recent_commands, vec!["help", "three"]);
    assert_eq!(contexts[1].session_id, store.session_id());

    let history = store.history();
    assert_eq!(history.last().unwrap().result.as_deref(), Some("echo: three"));
}

#[tokio::test]
async fn test_events_follow_submission() {
    let store = offline_store();
    let mut events = store.subscribe();

    store.submit("about").await;

    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }

    assert_eq!(received.first(), Some(&StoreEvent::ProcessingChanged(true)));
    let appended: Vec<EntryKind> = received
        .iter()
        .filter_map(|e| match e {
            StoreEvent::EntryAppended(entry) => Some(entry.kind),
            _ => None,
        })
        .collect();
    assert_eq!(appended, vec![EntryKind::Command, EntryKind::Output]);
    assert!(received.contains(&StoreEvent::ProcessingChanged(false)));
}

#[tokio::test]
async fn test_processing_flag_set_during_latency() {
    let config = TerminalConfig {
        latency_ms: 100,
        ..TerminalConfig::default()
    };
    let store = TerminalStore::offline(&config);

    let observed = async {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        (store.is_processing(), store.history().len())
    };

    let (_, (processing, entries)) = tokio::join!(store.submit("ls"), observed);

    assert!(processing);
    assert_eq!(entries, 1);
    assert!(!store.is_processing());
    assert_eq!(store.history().len(), 2);
}

#[tokio::test]
async fn test_queue_policy_serializes_overlapping_submits() {
    let config = TerminalConfig {
        latency_ms: 50,
        submit_policy: SubmitPolicy::Queue,
        ..TerminalConfig::default()
    };
    let store = TerminalStore::offline(&config);

    let second = async {
        tokio::task::yield_now().await;
        store.submit("second").await
    };
    let (a, b) = tokio::join!(store.submit("first"), second);

    assert_eq!(a, SubmitOutcome::Completed);
    assert_eq!(b, SubmitOutcome::Completed);

    let order: Vec<(String, EntryKind)> = store
        .history()
        .into_iter()
        .map(|e| (e.command, e.kind))
        .collect();
    assert_eq!(
        order,
        vec![
            ("first".to_string(), EntryKind::Command),
            ("first".to_string(), EntryKind::Info),
            ("second".to_string(), EntryKind::Command),
            ("second".to_string(), EntryKind::Info),
        ]
    );
}

#[tokio::test]
async fn test_reject_policy_refuses_overlapping_submit() {
    let config = TerminalConfig {
        latency_ms: 50,
        submit_policy: SubmitPolicy::Reject,
        ..TerminalConfig::default()
    };
    let store = TerminalStore::offline(&config);

    let second = async {
        tokio::task::yield_now().await;
        store.submit("second").await
    };
    let (a, b) = tokio::join!(store.submit("first"), second);

    assert_eq!(a, SubmitOutcome::Completed);
    assert_eq!(b, SubmitOutcome::Rejected);
    assert_eq!(store.command_log(), vec!["first"]);
    assert_eq!(store.history().len(), 2);
}

#[tokio::test]
async fn test_dropped_submit_returns_store_to_idle() {
    let config = TerminalConfig {
        latency_ms: 200,
        ..TerminalConfig::default()
    };
    let store = TerminalStore::offline(&config);
    store.submit("pwd").await;
    store.navigate(Direction::Up);
    let mut events = store.subscribe();

    let result = tokio::time::timeout(Duration::from_millis(20), store.submit("ls")).await;
    assert!(result.is_err());

    assert!(!store.is_processing());
    assert!(store.is_active());
    assert_eq!(store.cursor(), None);

    let history = store.history();
    assert_eq!(history.len(), 4);
    assert_eq!(history[2].kind, EntryKind::Command);
    assert_eq!(history[3].kind, EntryKind::Error);
    assert_eq!(history[3].command, "ls");
    assert_eq!(history[3].result.as_deref(), Some(CANCELLED_NOTICE));

    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }
    assert!(received.contains(&StoreEvent::ProcessingChanged(false)));
    assert!(received.contains(&StoreEvent::CursorMoved(None)));

    // The queue is free again
    let next = tokio::time::timeout(Duration::from_secs(2), store.submit("help")).await;
    assert_eq!(next.ok(), Some(SubmitOutcome::Completed));
}

#[tokio::test]
async fn test_aborted_submit_task_returns_store_to_idle() {
    let config = TerminalConfig {
        latency_ms: 500,
        ..TerminalConfig::default()
    };
    let store = Arc::new(TerminalStore::offline(&config));

    let task = {
        let store = store.clone();
        tokio::spawn(async move { store.submit("deploy").await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(store.is_processing());

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    assert!(!store.is_processing());
    let kinds: Vec<EntryKind> = store.history().iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![EntryKind::Command, EntryKind::Error]);
}
