//! Commands answered locally, never forwarded to the AI backend

/// Built-in command names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Help,
    Clear,
    History,
    Status,
    About,
}

/// Result of running a built-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuiltinOutcome {
    /// Text to show as an output entry
    Text(String),
    /// Display history was truncated; nothing to show
    Cleared,
}

impl Builtin {
    pub const ALL: [Builtin; 5] = [
        Builtin::Help,
        Builtin::Clear,
        Builtin::History,
        Builtin::Status,
        Builtin::About,
    ];

    /// Case-insensitive exact match on the trimmed input
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "help" => Some(Builtin::Help),
            "clear" => Some(Builtin::Clear),
            "history" => Some(Builtin::History),
            "status" => Some(Builtin::Status),
            "about" => Some(Builtin::About),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Help => "help",
            Builtin::Clear => "clear",
            Builtin::History => "history",
            Builtin::Status => "status",
            Builtin::About => "about",
        }
    }
}

/// Inputs of the `status` report
#[derive(Debug, Clone)]
pub struct StatusReport<'a> {
    pub command_count: usize,
    pub active: bool,
    pub last_command: Option<&'a str>,
}

pub fn help_text() -> String {
    r#"Available commands:
  help     - Show this help message
  clear    - Clear terminal history
  history  - Show command history
  status   - Show application status
  about    - About this application

AI Commands (coming soon):
  build    - Build application features
  generate - Generate components
  deploy   - Deploy application"#
        .to_string()
}

pub fn about_text() -> String {
    format!(
        r#"AI Terminal {}
A terminal front-end that builds and modifies application features through AI-powered commands.

Built with:
- Tokio (async runtime)
- Reqwest (API client)
- Serde (JSON and TOML)
- Clap (command line)
- Tracing (diagnostics)"#,
        env!("CARGO_PKG_VERSION")
    )
}

/// Numbered listing of the command log
pub fn history_text(commands: &[String]) -> String {
    if commands.is_empty() {
        return "No commands in history".to_string();
    }

    commands
        .iter()
        .enumerate()
        .map(|(i, cmd)| format!("{}: {}", i + 1, cmd))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn status_text(report: &StatusReport<'_>) -> String {
    format!(
        "AI Terminal Status:\n  Version: {}\n  Commands executed: {}\n  Terminal active: {}\n  Last command: {}",
        env!("CARGO_PKG_VERSION"),
        report.command_count,
        if report.active { "Yes" } else { "No" },
        report.last_command.unwrap_or("None"),
    )
}
