//! # LangGraph chat client
//!
//! Talks to a LangGraph agent server: creates and lists conversation threads, runs the
//! agent against a thread, consumes the run's event stream, and turns the raw stream into
//! a readable debug trace.
//!
//! ## Main Modules
//!
//! - [`stream`]: `RawEvent` (the `{event, data}` record of a run stream) and its typed view `StreamEvent`.
//! - [`consolidate`]: `consolidate` merges streaming token chunks into `DisplayRecord`s; `Clock` injects time.
//! - [`client`]: `LangGraphClient`, a typed HTTP client for threads, assistants and run streams.
//! - [`backend`]: `AgentBackend` trait implemented by the HTTP client and by `MockBackend`.
//! - [`chat`]: `ChatSession` drives one conversation turn; `classify_chunk` splits content from sources.
//! - [`threads`]: `ThreadManager` lists, creates, loads and deletes threads for one graph.
//! - [`config`]: `ClientConfig` from environment / `.env`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use langgraph_chat::{consolidate, RawEvent, SystemClock};
//! use serde_json::json;
//!
//! let events = vec![RawEvent::new(
//!     "messages",
//!     json!([{"type": "AIMessageChunk", "content": "Hi"}, {"thread_id": "t1"}]),
//! )];
//! for record in consolidate(&events, &SystemClock) {
//!     println!("{}", record.tag());
//! }
//! ```

pub mod backend;
pub mod chat;
pub mod client;
pub mod config;
pub mod consolidate;
pub mod error;
pub mod logging;
pub mod stream;
pub mod threads;

pub use backend::{AgentBackend, MockBackend, RawEventStream, RecordedRun};
pub use chat::{
    classify_chunk, ChatMessage, ChatSession, ChatState, ChunkKind, Role, APOLOGY_MESSAGE,
};
pub use client::{
    decode_events, to_raw_event, Assistant, AssistantSearch, LangGraphClient, RunInput, RunStreamPayload, Thread, ThreadSearch,
    ThreadState,
};
pub use config::{load_dotenv, ClientConfig, DEFAULT_GRAPH_ID};
pub use consolidate::{
    consolidate, normalize_content, Clock, DisplayRecord, FixedClock, StreamState, SystemClock,
};
pub use error::ClientError;
pub use stream::{
    thread_id_of, ContentPart, MessageContent, MessageData, Metadata, RawEvent, StreamEvent,
    StreamMode,
};
pub use threads::{ThreadManager, ThreadSummary};
