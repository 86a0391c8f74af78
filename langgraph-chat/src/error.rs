//! Client error types.
//!
//! Returned by [`LangGraphClient`](crate::LangGraphClient), every [`AgentBackend`](crate::AgentBackend)
//! implementation, and the chat/thread layers built on top of them.

use thiserror::Error;

/// Error talking to the LangGraph server or using the chat layer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No API URL in config or environment.
    #[error("LangGraph API URL is not configured")]
    MissingApiUrl,
    /// Connection, timeout or body read failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// Server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    /// Response body was not the expected JSON.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    /// Run stream broke off mid-way.
    #[error("stream error: {0}")]
    Stream(String),
    /// Requested thread or assistant does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Session used before `init` succeeded, or init found nothing to use.
    #[error("not ready: {0}")]
    NotReady(String),
}
