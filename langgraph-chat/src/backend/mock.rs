//! In-memory backend for tests and offline runs.
//!
//! Keeps threads in a list, returns a fixed assistant list, and answers every run with the
//! same scripted events. No LangGraph server required.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Value};

use super::{AgentBackend, RawEventStream};
use crate::client::{Assistant, AssistantSearch, RunStreamPayload, Thread, ThreadSearch, ThreadState};
use crate::error::ClientError;
use crate::stream::RawEvent;

/// One recorded `stream_run` call.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedRun {
    pub thread_id: String,
    pub assistant_id: String,
    pub payload: RunStreamPayload,
}

/// Mock backend: scripted run events, in-memory threads.
///
/// **Interaction**: Implements `AgentBackend`; used by `ChatSession` / `ThreadManager` tests
/// and by the CLI's `--mock` mode.
pub struct MockBackend {
    threads: Mutex<Vec<(Thread, ThreadState)>>,
    assistants: Vec<Assistant>,
    run_events: Vec<RawEvent>,
    /// When set, every run stream ends with this error after the scripted events.
    stream_error: Option<String>,
    /// Thread ids whose state lookups fail.
    broken_threads: Vec<String>,
    runs: Mutex<Vec<RecordedRun>>,
    next_id: AtomicUsize,
}

impl MockBackend {
    /// One assistant `mock-assistant` for `react_agent`, no threads, empty runs.
    pub fn new() -> Self {
        Self {
            threads: Mutex::new(Vec::new()),
            assistants: vec![Assistant {
                assistant_id: "mock-assistant".to_string(),
                graph_id: Some(crate::config::DEFAULT_GRAPH_ID.to_string()),
                ..Assistant::default()
            }],
            run_events: Vec::new(),
            stream_error: None,
            broken_threads: Vec::new(),
            runs: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1),
        }
    }

    /// Mock whose runs stream `reply` as word chunks from node `agent`, ending with `stop`.
    pub fn echo_reply(reply: &str) -> Self {
        let words: Vec<&str> = reply.split_inclusive(' ').collect();
        let mut events = vec![RawEvent::new("metadata", json!({"run_id": "mock-run"}))];
        for (i, word) in words.iter().enumerate() {
            let finish = if i + 1 == words.len() {
                json!({"finish_reason": "stop"})
            } else {
                json!({})
            };
            events.push(RawEvent::new(
                "messages",
                json!([
                    {"type": "AIMessageChunk", "content": word, "tool_calls": [], "response_metadata": finish},
                    {"langgraph_node": "agent", "graph_id": crate::config::DEFAULT_GRAPH_ID}
                ]),
            ));
        }
        Self::new().with_run_events(events)
    }

    pub fn with_assistants(mut self, assistants: Vec<Assistant>) -> Self {
        self.assistants = assistants;
        self
    }

    pub fn with_run_events(mut self, events: Vec<RawEvent>) -> Self {
        self.run_events = events;
        self
    }

    pub fn with_stream_error(mut self, message: impl Into<String>) -> Self {
        self.stream_error = Some(message.into());
        self
    }

    /// Adds an existing thread with the given state.
    pub fn with_thread(self, thread: Thread, state: ThreadState) -> Self {
        self.lock_threads().push((thread, state));
        self
    }

    /// Makes state lookups for this thread fail with NotFound while it stays searchable.
    pub fn with_broken_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.broken_threads.push(thread_id.into());
        self
    }

    /// Runs started so far.
    pub fn runs(&self) -> Vec<RecordedRun> {
        self.runs.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Ids of the threads currently stored.
    pub fn thread_ids(&self) -> Vec<String> {
        self.lock_threads()
            .iter()
            .map(|(t, _)| t.thread_id.clone())
            .collect()
    }

    fn lock_threads(&self) -> std::sync::MutexGuard<'_, Vec<(Thread, ThreadState)>> {
        self.threads.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// True when every key of `filter` has an equal value in `metadata`.
fn metadata_matches(filter: Option<&Value>, metadata: Option<&Value>) -> bool {
    let Some(Value::Object(filter)) = filter else {
        return true;
    };
    filter
        .iter()
        .all(|(k, v)| metadata.and_then(|m| m.get(k)) == Some(v))
}

#[async_trait]
impl AgentBackend for MockBackend {
    async fn create_thread(&self, metadata: Option<Value>) -> Result<Thread, ClientError> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let thread = Thread {
            thread_id: format!("mock-thread-{}", n),
            created_at: Some(chrono::Utc::now().to_rfc3339()),
            metadata,
            status: Some("idle".to_string()),
            ..Thread::default()
        };
        self.lock_threads()
            .push((thread.clone(), ThreadState::default()));
        Ok(thread)
    }

    async fn search_threads(&self, query: &ThreadSearch) -> Result<Vec<Thread>, ClientError> {
        Ok(self
            .lock_threads()
            .iter()
            .map(|(t, _)| t)
            .filter(|t| metadata_matches(query.metadata.as_ref(), t.metadata.as_ref()))
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .cloned()
            .collect())
    }

    async fn get_thread_state(&self, thread_id: &str) -> Result<ThreadState, ClientError> {
        if self.broken_threads.iter().any(|t| t == thread_id) {
            return Err(ClientError::NotFound(format!("thread {}", thread_id)));
        }
        self.lock_threads()
            .iter()
            .find(|(t, _)| t.thread_id == thread_id)
            .map(|(_, s)| s.clone())
            .ok_or_else(|| ClientError::NotFound(format!("thread {}", thread_id)))
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<(), ClientError> {
        let mut threads = self.lock_threads();
        let before = threads.len();
        threads.retain(|(t, _)| t.thread_id != thread_id);
        if threads.len() == before {
            return Err(ClientError::NotFound(format!("thread {}", thread_id)));
        }
        Ok(())
    }

    async fn search_assistants(
        &self,
        query: &AssistantSearch,
    ) -> Result<Vec<Assistant>, ClientError> {
        Ok(self
            .assistants
            .iter()
            .filter(|a| match &query.graph_id {
                Some(g) => a.graph_id.as_deref() == Some(g.as_str()),
                None => true,
            })
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .cloned()
            .collect())
    }

    async fn stream_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        payload: &RunStreamPayload,
    ) -> Result<RawEventStream, ClientError> {
        if !self.lock_threads().iter().any(|(t, _)| t.thread_id == thread_id) {
            return Err(ClientError::NotFound(format!("thread {}", thread_id)));
        }
        self.runs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedRun {
                thread_id: thread_id.to_string(),
                assistant_id: assistant_id.to_string(),
                payload: payload.clone(),
            });
        let mut items: Vec<Result<RawEvent, ClientError>> =
            self.run_events.iter().cloned().map(Ok).collect();
        if let Some(message) = &self.stream_error {
            items.push(Err(ClientError::Stream(message.clone())));
        }
        Ok(tokio_stream::iter(items).boxed())
    }
}
