//! Command entry points: chat turn, thread commands, trace.
//!
//! Each takes the backend and an output writer so tests can drive them with the mock backend
//! and a byte buffer.

mod trace;

pub use trace::{parse_events, run_trace};

use std::io::Write;
use std::sync::Arc;

use langgraph_chat::{
    AgentBackend, ChatMessage, ChatSession, LangGraphClient, MockBackend, SystemClock,
    ThreadManager,
};

use crate::config::{CliConfig, Error};
use crate::render::{render_message, render_trace};

/// Reply streamed by the mock backend.
const MOCK_REPLY: &str = "This is a mock reply from the offline backend.";

/// `threads` subcommands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ThreadsCommand {
    List,
    Create,
    History(String),
    Delete(String),
    DeleteAll,
}

/// HTTP client for the configured server, or the mock backend in mock mode.
pub fn build_backend(config: &CliConfig) -> Result<Arc<dyn AgentBackend>, Error> {
    match &config.client {
        Some(client) if !config.options.mock => {
            Ok(Arc::new(LangGraphClient::new(client.clone())?))
        }
        _ => Ok(Arc::new(MockBackend::echo_reply(MOCK_REPLY))),
    }
}

/// Runs one chat turn, streaming reply tokens to `out` as they arrive.
///
/// Returns the assistant message added to the conversation, if any. With `debug` set the
/// consolidated trace of the turn is printed after the reply.
pub async fn run_chat<W: Write>(
    backend: Arc<dyn AgentBackend>,
    config: &CliConfig,
    message: &str,
    out: &mut W,
) -> Result<Option<ChatMessage>, Error> {
    let mut session = ChatSession::new(backend)
        .with_graph_id(config.graph_id())
        .with_assistant_id(config.assistant_id().map(String::from))
        .with_thread_id(config.options.thread_id.clone());
    session.init().await?;
    tracing::debug!(
        thread_id = ?session.thread_id(),
        assistant_id = ?session.assistant_id(),
        "chat session ready"
    );

    writeln!(out, "{}", render_message(&ChatMessage::user(message)))?;
    write!(out, "[Assistant] ")?;
    let mut printed = 0;
    let mut write_error = None;
    let reply = session
        .send_message_with(message, |_, state| {
            let content = &state.streaming_content;
            if content.len() > printed && write_error.is_none() {
                if let Err(e) = write!(out, "{}", &content[printed..]).and_then(|_| out.flush()) {
                    write_error = Some(e);
                }
                printed = content.len();
            }
        })
        .await;
    if let Some(e) = write_error {
        return Err(e.into());
    }
    match &reply {
        // Nothing was streamed (e.g. the apology after a failure): print the whole reply.
        Some(m) if printed == 0 => writeln!(out, "{}", m.content)?,
        _ => writeln!(out)?,
    }
    if let Some(thread_id) = session.thread_id() {
        writeln!(out, "(thread {})", thread_id)?;
    }

    if config.options.debug {
        writeln!(out, "--- debug trace ---")?;
        writeln!(out, "{}", render_trace(&session.debug_trace(&SystemClock)))?;
    }
    Ok(reply)
}

/// Runs one `threads` subcommand against the configured graph.
pub async fn run_threads<W: Write>(
    backend: Arc<dyn AgentBackend>,
    config: &CliConfig,
    command: ThreadsCommand,
    out: &mut W,
) -> Result<(), Error> {
    let mut manager = ThreadManager::new(backend).with_graph_id(config.graph_id());
    match command {
        ThreadsCommand::List => {
            let threads = manager.load_threads().await?;
            if threads.is_empty() {
                writeln!(out, "no threads")?;
            }
            for t in threads {
                writeln!(
                    out,
                    "{}  {}  {} messages  {}",
                    t.thread_id,
                    t.created_at,
                    t.messages.len(),
                    preview(t.last_message().unwrap_or(""))
                )?;
            }
        }
        ThreadsCommand::Create => {
            let thread_id = manager.create_new_thread().await?;
            writeln!(out, "{}", thread_id)?;
        }
        ThreadsCommand::History(thread_id) => {
            for m in manager.load_thread_history(&thread_id).await? {
                writeln!(out, "{}", render_message(&m))?;
            }
        }
        ThreadsCommand::Delete(thread_id) => {
            manager.delete_thread(&thread_id).await?;
            writeln!(out, "deleted {}", thread_id)?;
        }
        ThreadsCommand::DeleteAll => {
            let deleted = manager.delete_all_threads().await?;
            writeln!(out, "deleted {} threads", deleted)?;
        }
    }
    Ok(())
}

/// First line of `text`, cut to 60 characters.
fn preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or("");
    if line.chars().count() > 60 {
        format!("{}...", line.chars().take(60).collect::<String>())
    } else {
        line.to_string()
    }
}
