//! Chat session: one conversation with an assistant on one thread.
//!
//! [`ChatSession::send_message`] streams a run, records every raw event for the debug
//! trace, accumulates the reply text, and appends the finished reply to the conversation.
//! [`ChatState`] is the observable state (messages, raw events, loading flag, partial reply).

mod processor;

pub use processor::{classify_chunk, ChunkKind};

use std::sync::Arc;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::backend::AgentBackend;
use crate::client::{AssistantSearch, RunStreamPayload};
use crate::config::DEFAULT_GRAPH_ID;
use crate::consolidate::{consolidate, Clock, DisplayRecord};
use crate::error::ClientError;
use crate::logging;
use crate::stream::{MessageContent, RawEvent, StreamMode};

/// Reply appended when a run fails.
pub const APOLOGY_MESSAGE: &str =
    "Sorry, there was an error processing your message. Please try again.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One conversation message as shown to the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Converts a message from thread state (`{type: "human"|"ai", content}`).
    ///
    /// Tool and system messages, and assistant messages without text (tool-call turns),
    /// are skipped.
    pub fn from_langgraph(message: &Value) -> Option<Self> {
        let kind = message
            .get("type")
            .or_else(|| message.get("role"))
            .and_then(Value::as_str)?;
        let content = message
            .get("content")
            .cloned()
            .and_then(|c| serde_json::from_value::<MessageContent>(c).ok())
            .map(|c| c.text())
            .unwrap_or_default();
        match kind {
            "human" | "user" => Some(Self::user(content)),
            "ai" | "assistant" | "AIMessageChunk" if !content.trim().is_empty() => {
                Some(Self::assistant(content))
            }
            _ => None,
        }
    }
}

/// Observable state of a chat session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChatState {
    /// Conversation so far.
    pub messages: Vec<ChatMessage>,
    /// Raw events of the latest run, for the debug trace.
    pub raw_messages: Vec<RawEvent>,
    /// True while a run is streaming.
    pub is_loading: bool,
    /// Reply text received so far in the current run.
    pub streaming_content: String,
    /// Tool outputs seen in the latest run.
    pub sources: Vec<String>,
}

impl ChatState {
    pub fn add_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn add_raw_message(&mut self, event: RawEvent) {
        self.raw_messages.push(event);
    }

    pub fn clear_raw_messages(&mut self) {
        self.raw_messages.clear();
    }

    /// Replaces the conversation (e.g. after loading thread history).
    pub fn set_messages(&mut self, messages: Vec<ChatMessage>) {
        self.messages = messages;
    }
}

/// Reply text of one run and whether a completing chunk was seen.
struct TurnOutcome {
    content: String,
    complete: bool,
}

/// A conversation with one assistant on one thread.
///
/// **Interaction**: Uses an [`AgentBackend`] for thread creation, assistant lookup and run
/// streaming; [`debug_trace`](Self::debug_trace) feeds the raw events to [`consolidate`].
pub struct ChatSession<B: AgentBackend + ?Sized> {
    backend: Arc<B>,
    graph_id: String,
    preferred_assistant: Option<String>,
    thread_id: Option<String>,
    assistant_id: Option<String>,
    state: ChatState,
}

impl<B: AgentBackend + ?Sized> ChatSession<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            graph_id: DEFAULT_GRAPH_ID.to_string(),
            preferred_assistant: None,
            thread_id: None,
            assistant_id: None,
            state: ChatState::default(),
        }
    }

    /// Graph id recorded in the metadata of threads this session creates.
    pub fn with_graph_id(mut self, graph_id: impl Into<String>) -> Self {
        self.graph_id = graph_id.into();
        self
    }

    /// Use this assistant instead of the first one found.
    pub fn with_assistant_id(mut self, assistant_id: Option<String>) -> Self {
        self.preferred_assistant = assistant_id;
        self
    }

    /// Continue an existing thread instead of creating one in `init`.
    pub fn with_thread_id(mut self, thread_id: Option<String>) -> Self {
        self.thread_id = thread_id;
        self
    }

    /// Creates a thread (unless one is set) and picks the assistant.
    ///
    /// # Errors
    ///
    /// Backend errors, or `NotReady` when no assistant is available.
    pub async fn init(&mut self) -> Result<(), ClientError> {
        if self.thread_id.is_none() {
            let thread = self
                .backend
                .create_thread(Some(json!({ "graph_id": self.graph_id })))
                .await?;
            self.thread_id = Some(thread.thread_id);
        }
        if self.assistant_id.is_none() {
            self.assistant_id = match &self.preferred_assistant {
                Some(id) => Some(id.clone()),
                None => self
                    .backend
                    .search_assistants(&AssistantSearch::default())
                    .await?
                    .into_iter()
                    .next()
                    .map(|a| a.assistant_id),
            };
        }
        if self.assistant_id.is_none() {
            return Err(ClientError::NotReady("no assistants available".to_string()));
        }
        Ok(())
    }

    /// True once a thread and an assistant are known.
    pub fn is_ready(&self) -> bool {
        self.thread_id.is_some() && self.assistant_id.is_some()
    }

    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    pub fn assistant_id(&self) -> Option<&str> {
        self.assistant_id.as_deref()
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ChatState {
        &mut self.state
    }

    /// Sends a user message; see [`send_message_with`](Self::send_message_with).
    pub async fn send_message(&mut self, content: &str) -> Option<ChatMessage> {
        self.send_message_with(content, |_, _| {}).await
    }

    /// Sends a user message and streams the assistant's reply.
    ///
    /// `observer` is called after each event with the event and the updated state.
    /// Returns the assistant message appended to the conversation: the reply when the run
    /// completed with text, [`APOLOGY_MESSAGE`] when the run failed, `None` otherwise.
    /// Blank input or an uninitialized session does nothing.
    pub async fn send_message_with<F>(&mut self, content: &str, mut observer: F) -> Option<ChatMessage>
    where
        F: FnMut(&RawEvent, &ChatState),
    {
        if content.trim().is_empty() {
            return None;
        }
        let (Some(thread_id), Some(assistant_id)) =
            (self.thread_id.clone(), self.assistant_id.clone())
        else {
            return None;
        };

        self.state.add_message(ChatMessage::user(content));
        self.state.is_loading = true;
        self.state.clear_raw_messages();
        self.state.sources.clear();

        let reply = match self
            .stream_turn(&thread_id, &assistant_id, content, &mut observer)
            .await
        {
            Ok(turn) if turn.complete && !turn.content.is_empty() => {
                Some(ChatMessage::assistant(turn.content))
            }
            Ok(_) => None,
            Err(e) => {
                logging::log_recovered_error("sending message", &e);
                Some(ChatMessage::assistant(APOLOGY_MESSAGE))
            }
        };
        if let Some(message) = &reply {
            self.state.add_message(message.clone());
        }
        self.state.streaming_content.clear();
        self.state.is_loading = false;
        reply
    }

    async fn stream_turn<F>(
        &mut self,
        thread_id: &str,
        assistant_id: &str,
        content: &str,
        observer: &mut F,
    ) -> Result<TurnOutcome, ClientError>
    where
        F: FnMut(&RawEvent, &ChatState),
    {
        let payload = RunStreamPayload::user_message(content, vec![StreamMode::MessagesTuple]);
        let mut stream = self
            .backend
            .stream_run(thread_id, assistant_id, &payload)
            .await?;

        let mut turn = TurnOutcome {
            content: String::new(),
            complete: false,
        };
        while let Some(item) = stream.next().await {
            let event = item?;
            match classify_chunk(&event) {
                ChunkKind::Content {
                    text,
                    completes_turn,
                } => {
                    if !text.trim().is_empty() {
                        turn.content.push_str(&text);
                        self.state.streaming_content = turn.content.clone();
                    }
                    turn.complete |= completes_turn;
                }
                ChunkKind::Source(source) => self.state.sources.push(source),
                ChunkKind::Ignored => {}
            }
            self.state.add_raw_message(event);
            if let Some(event) = self.state.raw_messages.last() {
                observer(event, &self.state);
            }
        }
        logging::log_run_complete(thread_id, self.state.raw_messages.len());
        Ok(turn)
    }

    /// Consolidated view of the latest run's raw events.
    pub fn debug_trace<C: Clock + ?Sized>(&self, clock: &C) -> Vec<DisplayRecord> {
        consolidate(&self.state.raw_messages, clock)
    }
}
