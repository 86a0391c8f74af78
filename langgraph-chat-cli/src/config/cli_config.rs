//! CLI config: LangGraph connection (from env / .env) plus [`RunOptions`](super::RunOptions).
//!
//! Interacts with [`ClientConfig::from_env`](langgraph_chat::ClientConfig::from_env) and
//! [`build_backend`](crate::build_backend).

use langgraph_chat::{ClientConfig, DEFAULT_GRAPH_ID};

use super::RunOptions;

/// Error type used across the CLI.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

#[derive(Clone, Debug, PartialEq)]
pub struct CliConfig {
    /// Connection settings; `None` in mock mode.
    pub client: Option<ClientConfig>,
    pub options: RunOptions,
}

impl CliConfig {
    /// Builds config from env vars. Call `load_dotenv` first to pick up `.env`.
    ///
    /// In mock mode the environment is not read and no API URL is required.
    pub fn from_env(options: RunOptions) -> Result<Self, Error> {
        let client = if options.mock {
            None
        } else {
            Some(ClientConfig::from_env()?)
        };
        Ok(Self { client, options })
    }

    /// Config for a mock run.
    pub fn mock(options: RunOptions) -> Self {
        Self {
            client: None,
            options: RunOptions {
                mock: true,
                ..options
            },
        }
    }

    pub fn graph_id(&self) -> &str {
        self.client
            .as_ref()
            .map(|c| c.graph_id.as_str())
            .unwrap_or(DEFAULT_GRAPH_ID)
    }

    pub fn assistant_id(&self) -> Option<&str> {
        self.client.as_ref().and_then(|c| c.assistant_id.as_deref())
    }
}
