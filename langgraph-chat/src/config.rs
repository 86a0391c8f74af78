//! Client config: API URL, key, graph id, assistant id, timeout. Filled from env / .env.
//!
//! Used by [`LangGraphClient::new`](crate::LangGraphClient::new), the thread manager (graph id)
//! and the chat session (assistant id).

use std::time::Duration;

use crate::error::ClientError;

/// Graph id used to tag and search threads when `LANGGRAPH_GRAPH_ID` is not set.
pub const DEFAULT_GRAPH_ID: &str = "react_agent";

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Connection settings for one LangGraph server.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    /// Base URL, e.g. `http://localhost:2024`. Stored without trailing slash.
    pub api_url: String,
    /// Sent as `x-api-key` when set.
    pub api_key: Option<String>,
    /// Graph whose threads are listed and created.
    pub graph_id: String,
    /// Assistant to run; when unset the first assistant found is used.
    pub assistant_id: Option<String>,
    /// Timeout for non-streaming requests.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Config for the given base URL with defaults for everything else.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            graph_id: DEFAULT_GRAPH_ID.to_string(),
            assistant_id: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_graph_id(mut self, graph_id: impl Into<String>) -> Self {
        self.graph_id = graph_id.into();
        self
    }

    pub fn with_assistant_id(mut self, assistant_id: impl Into<String>) -> Self {
        self.assistant_id = Some(assistant_id.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fill config from env vars. Call [`load_dotenv`] first to pick up `.env`.
    ///
    /// `LANGGRAPH_API_URL` (or `NEXT_PUBLIC_LANGGRAPH_API_URL`) required;
    /// `LANGGRAPH_API_KEY`, `LANGGRAPH_ASSISTANT_ID` optional;
    /// `LANGGRAPH_GRAPH_ID` defaults to `react_agent`, `LANGGRAPH_TIMEOUT_SECS` to 60.
    pub fn from_env() -> Result<Self, ClientError> {
        let api_url = non_empty_var("LANGGRAPH_API_URL")
            .or_else(|| non_empty_var("NEXT_PUBLIC_LANGGRAPH_API_URL"))
            .ok_or(ClientError::MissingApiUrl)?;
        let mut config = Self::new(api_url);
        config.api_key = non_empty_var("LANGGRAPH_API_KEY");
        if let Some(graph_id) = non_empty_var("LANGGRAPH_GRAPH_ID") {
            config.graph_id = graph_id;
        }
        config.assistant_id = non_empty_var("LANGGRAPH_ASSISTANT_ID");
        if let Some(secs) = non_empty_var("LANGGRAPH_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Load .env from current directory; if not found, try parent (workspace root when run from crate dir).
pub fn load_dotenv() {
    if dotenv::dotenv().is_ok() {
        return;
    }
    if let Ok(cwd) = std::env::current_dir() {
        if let Some(parent) = cwd.parent() {
            let env_path = parent.join(".env");
            if env_path.is_file() {
                let _ = dotenv::from_path(env_path);
            }
        }
    }
}
