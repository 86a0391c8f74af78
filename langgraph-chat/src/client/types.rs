//! Request and response bodies of the LangGraph HTTP API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chat::ChatMessage;
use crate::stream::StreamMode;

/// A conversation thread as returned by `/threads` endpoints.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    #[serde(default)]
    pub thread_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Value>,
}

/// Current state (or one history entry) of a thread.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreadState {
    #[serde(default)]
    pub values: Value,
    #[serde(default)]
    pub next: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_checkpoint: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl ThreadState {
    /// `values.messages` of the state, or empty when the graph keeps no messages.
    pub fn messages(&self) -> Vec<Value> {
        self.values
            .get("messages")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    }
}

/// A deployed assistant (graph + config).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Assistant {
    pub assistant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Body of `POST /threads/search`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ThreadSearch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for ThreadSearch {
    fn default() -> Self {
        Self {
            metadata: None,
            status: None,
            limit: 10,
            offset: 0,
        }
    }
}

impl ThreadSearch {
    /// Threads whose metadata carries the given `graph_id`.
    pub fn for_graph(graph_id: &str) -> Self {
        Self {
            metadata: Some(serde_json::json!({ "graph_id": graph_id })),
            ..Self::default()
        }
    }
}

/// Body of `POST /assistants/search`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssistantSearch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for AssistantSearch {
    fn default() -> Self {
        Self {
            graph_id: None,
            metadata: None,
            limit: 10,
            offset: 0,
        }
    }
}

/// Graph input of a run: the new messages for the thread.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunInput {
    pub messages: Vec<ChatMessage>,
}

impl RunInput {
    pub fn user_message(content: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(content)],
        }
    }
}

/// Run options of `POST /threads/{id}/runs/stream`; the assistant id is added by the client.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunStreamPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<RunInput>,
    pub stream_mode: Vec<StreamMode>,
    pub stream_subgraphs: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

impl RunStreamPayload {
    /// Payload sending one user message and streaming with the given modes.
    pub fn user_message(content: impl Into<String>, stream_mode: Vec<StreamMode>) -> Self {
        Self {
            input: Some(RunInput::user_message(content)),
            stream_mode,
            stream_subgraphs: false,
            config: None,
        }
    }

    pub fn with_subgraphs(mut self) -> Self {
        self.stream_subgraphs = true;
        self
    }
}
