use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable that overrides the gateway base URL
pub const BASE_URL_ENV: &str = "AI_TERMINAL_API_BASE_URL";

const DEFAULT_BASE_URL: &str = "http://localhost:3001/api";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub terminal: TerminalConfig,
}

/// Settings for the HTTP gateway that fronts the AI backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL every request path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds (default: 30); 0 disables the timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Target framework sent along with code generation requests
    #[serde(default = "default_framework")]
    pub framework: String,
}

fn default_base_url() -> String {
    std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_framework() -> String {
    "vue3".to_string()
}

impl GatewayConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            framework: default_framework(),
        }
    }
}

/// How the terminal store admits a submission while another is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitPolicy {
    /// Wait for the running command to finish, then execute
    #[default]
    Queue,
    /// Refuse the new command without touching any state
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Artificial delay before a submitted command is dispatched (default: 500ms)
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,

    #[serde(default)]
    pub submit_policy: SubmitPolicy,

    /// Number of recent commands forwarded to the AI backend as context
    #[serde(default = "default_context_commands")]
    pub context_commands: usize,

    /// Buffer size of the store's event channel
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_latency_ms() -> u64 {
    500
}

fn default_context_commands() -> usize {
    10
}

fn default_event_capacity() -> usize {
    256
}

impl TerminalConfig {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            latency_ms: default_latency_ms(),
            submit_policy: SubmitPolicy::default(),
            context_commands: default_context_commands(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context("Failed to read config file")?;

        toml::from_str(&content).context("Failed to parse config file")
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;
        Ok(config_dir.join("ai-terminal"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Location of the persisted bearer token
    pub fn token_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("auth_token.json"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            terminal: TerminalConfig::default(),
        }
    }
}
