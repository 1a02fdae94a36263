//! # parley-cli
//!
//! Terminal driver for the Parley chat client. Wires the HTTP store, the
//! conversation state machine, and the navigation synchronizer into a plain
//! read-eval loop.

#![deny(unsafe_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use parley_api::{ApiClient, ApiConfig};
use parley_client::{BackendStatus, ChatController, ChatState, NavigationSynchronizer};
use parley_core::retry::RetryConfig;
use parley_core::{ConversationId, Role};

/// Parley chat client.
#[derive(Parser, Debug)]
#[command(name = "parley", about = "Terminal chat client for a Parley backend")]
struct Cli {
    /// Backend base URL.
    #[arg(long, default_value = "http://localhost:3000")]
    server: String,

    /// Conversation to open at startup.
    #[arg(value_name = "CONVERSATION_ID")]
    conversation: Option<String>,

    /// Maximum retries for retryable request failures.
    #[arg(long, default_value_t = RetryConfig::default().max_retries)]
    max_retries: u32,

    /// Delay before the first retry in milliseconds (doubled each attempt).
    #[arg(long, default_value_t = RetryConfig::default().initial_delay_ms)]
    retry_delay_ms: u64,
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("parley=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut config = ApiConfig::new(cli.server.trim_end_matches('/'));
    config.retry = RetryConfig {
        max_retries: cli.max_retries,
        initial_delay_ms: cli.retry_delay_ms,
    };
    let store = Arc::new(ApiClient::new(config));
    let chat = Arc::new(ChatController::new(store));
    let mut nav = NavigationSynchronizer::new();

    let initial = cli.conversation.map(ConversationId::from);
    if let Some(command) = chat.initialize(initial).await {
        println!("conversation not found; starting at the conversation list");
        nav.apply(&chat, command).await;
    }

    let state = chat.snapshot();
    match state.backend_status {
        BackendStatus::Offline => {
            println!(
                "backend at {} is unreachable: {}",
                cli.server,
                state.error.as_deref().unwrap_or("unknown error")
            );
            return Ok(());
        }
        BackendStatus::Online | BackendStatus::Checking => {}
    }
    print_conversations(&state);
    print_messages(&state);
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let Some(line) = lines.next_line().await.context("reading stdin")? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        debug!(input = line, "repl command");

        match line.split_once(' ').map_or((line, ""), |(cmd, rest)| (cmd, rest.trim())) {
            ("/quit" | "/q", _) => break,
            ("/help", _) => print_help(),
            ("/list", _) => print_conversations(&chat.snapshot()),
            ("/new", _) => {
                if let Some(command) = chat.start_new_conversation().await {
                    nav.apply(&chat, command).await;
                }
                report(&chat.snapshot());
            }
            ("/open", target) => {
                match resolve_conversation(&chat.snapshot(), target) {
                    Some(id) => {
                        if let Some(command) = chat.select_conversation(id).await {
                            nav.apply(&chat, command).await;
                        }
                        let state = chat.snapshot();
                        print_messages(&state);
                        report(&state);
                    }
                    None => println!("no such conversation: {target}"),
                }
            }
            ("/delete", target) => {
                match resolve_conversation(&chat.snapshot(), target) {
                    Some(id) => {
                        if let Some(command) = chat.delete_conversation(&id).await {
                            nav.apply(&chat, command).await;
                        }
                        report(&chat.snapshot());
                    }
                    None => println!("no such conversation: {target}"),
                }
            }
            ("/retry", _) => {
                match last_failed_message(&chat.snapshot()) {
                    Some(id) => {
                        chat.retry_message(&id).await;
                        let state = chat.snapshot();
                        print_messages(&state);
                        report(&state);
                    }
                    None => println!("nothing to retry"),
                }
            }
            ("/edit", rest) => {
                let (index, new_content) =
                    rest.split_once(' ').map_or((rest, ""), |(i, c)| (i, c.trim()));
                match edit_target(&chat.snapshot(), index) {
                    Some(id) if !new_content.is_empty() => {
                        if chat.start_editing(&id) {
                            chat.submit_edit(&id, new_content).await;
                            let state = chat.snapshot();
                            print_messages(&state);
                            report(&state);
                        } else {
                            println!("that message cannot be edited (retry it instead)");
                        }
                    }
                    _ => println!("usage: /edit <message-number> <new text>"),
                }
            }
            _ => {
                if line.starts_with('/') {
                    println!("unknown command: {line}");
                    continue;
                }
                if chat.snapshot().selected.is_none() {
                    println!("no conversation open; use /new or /open <n>");
                    continue;
                }
                chat.send_message(line, None).await;
                let state = chat.snapshot();
                print_messages(&state);
                report(&state);
            }
        }
    }

    chat.shutdown();
    Ok(())
}

/// Resolve a 1-based list index or a raw conversation ID.
fn resolve_conversation(state: &ChatState, target: &str) -> Option<ConversationId> {
    if target.is_empty() {
        return None;
    }
    if let Ok(index) = target.parse::<usize>() {
        return state
            .conversations
            .get(index.checked_sub(1)?)
            .map(|c| c.id.clone());
    }
    state
        .conversations
        .iter()
        .find(|c| c.id.as_str() == target)
        .map(|c| c.id.clone())
}

/// The most recent message with a failed-send record.
fn last_failed_message(state: &ChatState) -> Option<parley_core::MessageId> {
    state
        .messages
        .iter()
        .rev()
        .find(|m| state.failed.contains(&m.id))
        .map(|m| m.id.clone())
}

/// Resolve a 1-based message number to an editable user message.
fn edit_target(state: &ChatState, index: &str) -> Option<parley_core::MessageId> {
    let index = index.parse::<usize>().ok()?.checked_sub(1)?;
    state.messages.get(index).map(|m| m.id.clone())
}

fn print_help() {
    println!("commands: /new, /list, /open <n>, /delete <n>, /retry, /edit <n> <text>, /quit");
    println!("anything else is sent as a message");
}

fn print_conversations(state: &ChatState) {
    if state.conversations.is_empty() {
        println!("(no conversations)");
        return;
    }
    for (index, conversation) in state.conversations.iter().enumerate() {
        let marker = if state.is_selected(&conversation.id) { "*" } else { " " };
        println!("{marker} {}. {}", index + 1, conversation.title);
    }
}

fn print_messages(state: &ChatState) {
    let Some(selected) = &state.selected else {
        return;
    };
    println!("── {} ──", selected.title);
    for (index, message) in state.messages.iter().enumerate() {
        let speaker = match message.role {
            Role::User => "you",
            Role::Assistant => "assistant",
        };
        let failed = state
            .failed
            .get(&message.id)
            .map(|f| format!("  [failed: {}: {}]", f.code, f.message))
            .unwrap_or_default();
        println!("{}. {speaker}> {}{failed}", index + 1, message.content);
    }
}

fn report(state: &ChatState) {
    if let Some(error) = &state.error {
        println!("! {error}");
    }
}
