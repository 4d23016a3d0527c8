//! Where commands go when no built-in handles them

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::history::EntryKind;
use crate::gateway::AiService;

/// Text shown while no AI backend is wired in
pub const PENDING_NOTICE: &str = "Command processed by AI (integration pending)";

/// Session data sent along with a forwarded command
#[derive(Debug, Clone, Serialize)]
pub struct CommandContext {
    pub session_id: Uuid,
    /// Most recent commands, oldest first, including the one being sent
    pub recent_commands: Vec<String>,
}

/// What the backend wants appended to the history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendReply {
    pub kind: EntryKind,
    pub text: String,
}

impl BackendReply {
    pub fn output(text: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Output,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Info,
            text: text.into(),
        }
    }
}

#[async_trait]
pub trait CommandBackend: Send + Sync {
    /// Handle a non-built-in command. Errors become an error entry.
    async fn dispatch(&self, command: &str, context: &CommandContext) -> Result<BackendReply>;
}

/// Placeholder that acknowledges the command without contacting anything
#[derive(Debug, Default, Clone, Copy)]
pub struct DeferredBackend;

#[async_trait]
impl CommandBackend for DeferredBackend {
    async fn dispatch(&self, _command: &str, _context: &CommandContext) -> Result<BackendReply> {
        Ok(BackendReply::info(PENDING_NOTICE))
    }
}

/// Sends commands to the AI gateway's `/ai/process` endpoint
pub struct GatewayBackend {
    ai: AiService,
}

impl GatewayBackend {
    pub fn new(ai: AiService) -> Self {
        Self { ai }
    }
}

#[async_trait]
impl CommandBackend for GatewayBackend {
    async fn dispatch(&self, command: &str, context: &CommandContext) -> Result<BackendReply> {
        let context = serde_json::to_value(context)?;
        let body = self.ai.process_command(command, &context).await?;
        Ok(BackendReply::output(response_text(&body)))
    }
}

/// Pull the displayable text out of a gateway response body
pub fn response_text(body: &Value) -> String {
    match body {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        Value::Object(map) => ["result", "response", "output", "message"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| pretty(body)),
        _ => pretty(body),
    }
}

fn pretty(body: &Value) -> String {
    serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string())
}
