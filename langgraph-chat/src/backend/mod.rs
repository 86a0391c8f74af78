//! The agent backend seam.
//!
//! [`AgentBackend`] is everything the chat session and thread manager need from a LangGraph
//! server. [`LangGraphClient`](crate::LangGraphClient) implements it over HTTP; [`MockBackend`]
//! implements it in memory for tests and offline runs.

mod mock;

pub use mock::{MockBackend, RecordedRun};

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;

use crate::client::{Assistant, AssistantSearch, RunStreamPayload, Thread, ThreadSearch, ThreadState};
use crate::error::ClientError;
use crate::stream::RawEvent;

/// Events of one run, in arrival order; ends when the transport closes.
pub type RawEventStream = BoxStream<'static, Result<RawEvent, ClientError>>;

/// Operations on a LangGraph server used by the chat layer.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Creates a thread, optionally tagged with metadata (e.g. `{"graph_id": ...}`).
    async fn create_thread(&self, metadata: Option<Value>) -> Result<Thread, ClientError>;

    /// Threads matching the query's metadata filter.
    async fn search_threads(&self, query: &ThreadSearch) -> Result<Vec<Thread>, ClientError>;

    /// Current state of a thread.
    async fn get_thread_state(&self, thread_id: &str) -> Result<ThreadState, ClientError>;

    async fn delete_thread(&self, thread_id: &str) -> Result<(), ClientError>;

    async fn search_assistants(
        &self,
        query: &AssistantSearch,
    ) -> Result<Vec<Assistant>, ClientError>;

    /// Starts a run on the thread and returns its event stream.
    async fn stream_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        payload: &RunStreamPayload,
    ) -> Result<RawEventStream, ClientError>;
}
