//! Thread manager: the list of conversation threads for one graph.
//!
//! [`ThreadManager`] keeps a newest-first list of [`ThreadSummary`] and the current thread
//! id, and refreshes the list from the backend after every mutation.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use serde_json::json;

use crate::backend::AgentBackend;
use crate::chat::ChatMessage;
use crate::client::{Thread, ThreadSearch};
use crate::config::DEFAULT_GRAPH_ID;
use crate::error::ClientError;
use crate::logging;

/// Upper bound on threads fetched per listing.
const THREAD_LIST_LIMIT: u32 = 100;

/// One thread as shown in a thread list.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ThreadSummary {
    pub thread_id: String,
    pub created_at: String,
    pub messages: Vec<ChatMessage>,
}

impl ThreadSummary {
    /// Last message text, for list previews.
    pub fn last_message(&self) -> Option<&str> {
        self.messages.last().map(|m| m.content.as_str())
    }
}

fn parse_created_at(created_at: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(created_at).ok()
}

/// Lists, creates, loads and deletes threads of one graph.
///
/// **Interaction**: Uses an [`AgentBackend`]; the CLI `threads` subcommand drives it.
pub struct ThreadManager<B: AgentBackend + ?Sized> {
    backend: Arc<B>,
    graph_id: String,
    threads: Vec<ThreadSummary>,
    current_thread_id: Option<String>,
}

impl<B: AgentBackend + ?Sized> ThreadManager<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            graph_id: DEFAULT_GRAPH_ID.to_string(),
            threads: Vec::new(),
            current_thread_id: None,
        }
    }

    pub fn with_graph_id(mut self, graph_id: impl Into<String>) -> Self {
        self.graph_id = graph_id.into();
        self
    }

    pub fn threads(&self) -> &[ThreadSummary] {
        &self.threads
    }

    pub fn current_thread_id(&self) -> Option<&str> {
        self.current_thread_id.as_deref()
    }

    pub fn set_current_thread_id(&mut self, thread_id: Option<String>) {
        self.current_thread_id = thread_id;
    }

    fn search(&self) -> ThreadSearch {
        ThreadSearch {
            limit: THREAD_LIST_LIMIT,
            ..ThreadSearch::for_graph(&self.graph_id)
        }
    }

    async fn summarize(&self, thread: Thread) -> Result<ThreadSummary, ClientError> {
        let state = self.backend.get_thread_state(&thread.thread_id).await?;
        let messages = state
            .messages()
            .iter()
            .filter_map(ChatMessage::from_langgraph)
            .collect();
        Ok(ThreadSummary {
            thread_id: thread.thread_id,
            created_at: thread
                .created_at
                .unwrap_or_else(|| Utc::now().to_rfc3339()),
            messages,
        })
    }

    /// Reloads the thread list, newest first.
    ///
    /// Threads whose state cannot be read are logged and left out.
    ///
    /// # Errors
    ///
    /// Fails only when the thread search itself fails.
    pub async fn load_threads(&mut self) -> Result<&[ThreadSummary], ClientError> {
        let found = self.backend.search_threads(&self.search()).await?;
        let mut threads = Vec::with_capacity(found.len());
        for thread in found.into_iter().filter(|t| !t.thread_id.is_empty()) {
            let thread_id = thread.thread_id.clone();
            match self.summarize(thread).await {
                Ok(summary) => threads.push(summary),
                Err(e) => logging::log_recovered_error(&format!("loading thread {}", thread_id), &e),
            }
        }
        // Unparseable timestamps sort last.
        threads.sort_by(|a, b| {
            parse_created_at(&b.created_at).cmp(&parse_created_at(&a.created_at))
        });
        self.threads = threads;
        Ok(&self.threads)
    }

    /// Creates a thread for this graph, puts it at the top of the list and makes it current.
    pub async fn create_new_thread(&mut self) -> Result<String, ClientError> {
        let thread = self
            .backend
            .create_thread(Some(json!({ "graph_id": self.graph_id })))
            .await?;
        let thread_id = thread.thread_id.clone();
        self.threads.insert(
            0,
            ThreadSummary {
                thread_id: thread.thread_id,
                created_at: thread
                    .created_at
                    .unwrap_or_else(|| Utc::now().to_rfc3339()),
                messages: Vec::new(),
            },
        );
        self.current_thread_id = Some(thread_id.clone());
        Ok(thread_id)
    }

    /// Reads the thread's messages and refreshes its summary.
    pub async fn load_thread_history(
        &mut self,
        thread_id: &str,
    ) -> Result<Vec<ChatMessage>, ClientError> {
        let state = self.backend.get_thread_state(thread_id).await?;
        let messages: Vec<ChatMessage> = state
            .messages()
            .iter()
            .filter_map(ChatMessage::from_langgraph)
            .collect();
        if let Some(summary) = self.threads.iter_mut().find(|t| t.thread_id == thread_id) {
            summary.messages = messages.clone();
        }
        Ok(messages)
    }

    /// Deletes one thread and reloads the list.
    pub async fn delete_thread(&mut self, thread_id: &str) -> Result<(), ClientError> {
        self.backend.delete_thread(thread_id).await?;
        if self.current_thread_id.as_deref() == Some(thread_id) {
            self.current_thread_id = None;
        }
        self.load_threads().await?;
        Ok(())
    }

    /// Deletes every thread of this graph concurrently; returns how many were deleted.
    ///
    /// Individual failures are logged and skipped.
    pub async fn delete_all_threads(&mut self) -> Result<usize, ClientError> {
        let found = self.backend.search_threads(&self.search()).await?;
        let backend = Arc::clone(&self.backend);
        let deletions = found
            .iter()
            .filter(|t| !t.thread_id.is_empty())
            .map(|t| {
                let backend = Arc::clone(&backend);
                async move {
                    let result = backend.delete_thread(&t.thread_id).await;
                    (t.thread_id.as_str(), result)
                }
            });
        let mut deleted = 0;
        for (thread_id, result) in futures::future::join_all(deletions).await {
            match result {
                Ok(()) => deleted += 1,
                Err(e) => {
                    logging::log_recovered_error(&format!("deleting thread {}", thread_id), &e)
                }
            }
        }
        self.current_thread_id = None;
        self.load_threads().await?;
        Ok(deleted)
    }
}
