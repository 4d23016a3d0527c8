use ai_terminal::auth::{CredentialStore, FileCredentialStore};
use ai_terminal::config::Config;
use ai_terminal::gateway::{AiService, GatewayClient, GatewayError};
use ai_terminal::terminal::{
    CommandBackend, DeferredBackend, EntryKind, GatewayBackend, HistoryEntry, StoreEvent,
    TerminalStore,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ai-terminal")]
#[command(about = "Terminal front-end for issuing commands to an AI backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive terminal session
    Run {
        /// Answer non-built-in commands locally instead of calling the gateway
        #[arg(long, default_value = "false")]
        offline: bool,
    },
    /// Execute a single command and print its result
    Exec {
        command: String,
        #[arg(long, default_value = "false")]
        offline: bool,
    },
    /// Ask the gateway for completions of a partial input
    Suggest { input: String },
    /// Ask the gateway to generate code
    Generate {
        prompt: String,
        /// Kind of artifact to generate
        #[arg(short, long, default_value = "component")]
        kind: String,
    },
    /// Store the bearer token used for gateway requests
    Login { token: String },
    /// Remove the stored bearer token
    Logout,
    /// Configure ai-terminal
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
        /// Set the gateway base URL
        #[arg(long)]
        base_url: Option<String>,
        /// Set the request timeout in seconds (0 disables it)
        #[arg(long)]
        timeout: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ai_terminal=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { offline } => {
            run_terminal(offline).await?;
        }
        Commands::Exec { command, offline } => {
            exec_command(&command, offline).await?;
        }
        Commands::Suggest { input } => {
            let ai = ai_service(&Config::load()?)?;
            let suggestions = gateway_result(ai.get_suggestions(&input).await)?;
            println!("{}", serde_json::to_string_pretty(&suggestions)?);
        }
        Commands::Generate { prompt, kind } => {
            let ai = ai_service(&Config::load()?)?;
            let generated = gateway_result(ai.generate_code(&prompt, &kind).await)?;
            println!("{}", serde_json::to_string_pretty(&generated)?);
        }
        Commands::Login { token } => {
            let store = FileCredentialStore::default_location()?;
            store.set_token(token.trim())?;
            println!("Token saved to: {}", store.path().display());
        }
        Commands::Logout => {
            FileCredentialStore::default_location()?.clear()?;
            println!("Token removed");
        }
        Commands::Config { show, base_url, timeout } => {
            handle_config(show, base_url, timeout)?;
        }
    }

    Ok(())
}

fn ai_service(config: &Config) -> Result<AiService> {
    let credentials: Arc<dyn CredentialStore> = Arc::new(FileCredentialStore::default_location()?);
    let gateway = GatewayClient::new(&config.gateway, credentials)
        .context("Failed to create gateway client")?;
    Ok(AiService::new(Arc::new(gateway), config.gateway.framework.clone()))
}

/// Name the HTTP status in gateway failures that carry one
fn gateway_result<T>(result: Result<T, GatewayError>) -> Result<T> {
    result.map_err(|e| match e.status() {
        Some(status) => anyhow::Error::new(e).context(format!("Gateway responded with HTTP {}", status)),
        None => anyhow::Error::new(e),
    })
}

fn build_store(config: &Config, offline: bool) -> Result<TerminalStore> {
    let backend: Arc<dyn CommandBackend> = if offline {
        Arc::new(DeferredBackend)
    } else {
        Arc::new(GatewayBackend::new(ai_service(config)?))
    };
    Ok(TerminalStore::new(&config.terminal, backend))
}

async fn run_terminal(offline: bool) -> Result<()> {
    let config = Config::load()?;
    let store = build_store(&config, offline)?;
    let mut events = store.subscribe();

    println!("AI Terminal");
    if offline {
        println!("Offline mode: AI commands are acknowledged but not sent");
    } else {
        println!("Gateway: {}", config.gateway.base_url);
    }
    println!("Type 'help' for commands, 'exit' or 'quit' to end the session");

    loop {
        print!("\n> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input == "exit" || input == "quit" {
            println!("Goodbye!");
            break;
        }

        store.submit(input).await;
        print_new_entries(&mut events);
    }

    Ok(())
}

async fn exec_command(command: &str, offline: bool) -> Result<()> {
    let config = Config::load()?;
    let store = build_store(&config, offline)?;
    let mut events = store.subscribe();

    store.submit(command).await;
    print_new_entries(&mut events);

    Ok(())
}

/// Print every result entry published since the last call
fn print_new_entries(events: &mut broadcast::Receiver<StoreEvent>) {
    loop {
        match events.try_recv() {
            Ok(StoreEvent::EntryAppended(entry)) => print_entry(&entry),
            Ok(_) => {}
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                tracing::warn!("Skipped {} terminal events", skipped);
            }
            Err(_) => break,
        }
    }
}

fn print_entry(entry: &HistoryEntry) {
    let text = entry.result.as_deref().unwrap_or_default();
    match entry.kind {
        EntryKind::Command => {}
        EntryKind::Output => println!("{}", text),
        EntryKind::Info => println!("[info] {}", text),
        EntryKind::Error => eprintln!("Error: {}", text),
    }
}

fn handle_config(show: bool, base_url: Option<String>, timeout: Option<u64>) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        println!("Current configuration:");
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let mut changed = false;

    if let Some(url) = base_url {
        config.gateway.base_url = url;
        changed = true;
        println!("Base URL updated");
    }

    if let Some(secs) = timeout {
        config.gateway.timeout_secs = secs;
        changed = true;
        println!("Timeout updated");
    }

    if changed {
        config.save()?;
        println!("Configuration saved to: {:?}", Config::config_path()?);
    } else {
        println!("No changes made. Use --show to view current configuration.");
    }

    Ok(())
}
