//! Route errors and their JSON bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use langgraph_chat::ClientError;
use serde_json::json;

/// Upstream failure codes returned in `{"error", "code"}` bodies.
pub mod code {
    pub const THREAD_CREATION_FAILED: &str = "THREAD_CREATION_FAILED";
    pub const THREAD_FETCH_FAILED: &str = "THREAD_FETCH_FAILED";
    pub const THREAD_DELETE_FAILED: &str = "THREAD_DELETE_FAILED";
    pub const HISTORY_FETCH_FAILED: &str = "HISTORY_FETCH_FAILED";
    pub const CONFIG_FETCH_FAILED: &str = "CONFIG_FETCH_FAILED";
    pub const CONFIG_UPDATE_FAILED: &str = "CONFIG_UPDATE_FAILED";
    pub const MESSAGE_SEND_FAILED: &str = "MESSAGE_SEND_FAILED";
    pub const SSE_CONNECTION_FAILED: &str = "SSE_CONNECTION_FAILED";
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed request fields. 400 `{error}`.
    #[error("{0}")]
    BadRequest(String),
    /// Thread listing failed. 500 `{error, threads: []}`.
    #[error("Failed to fetch threads")]
    ThreadList(#[source] ClientError),
    /// Any other upstream failure. 500 `{error, code}`.
    #[error("{message}")]
    Upstream {
        code: &'static str,
        message: String,
    },
}

impl ApiError {
    /// Maps a client error to an upstream error with the given code; logs it.
    pub fn upstream(code: &'static str, context: &'static str) -> impl FnOnce(ClientError) -> Self {
        move |e| {
            tracing::error!(code = code, error = %e, "{}", context);
            ApiError::Upstream {
                code,
                message: format!("{}: {}", context, e),
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match &self {
            ApiError::BadRequest(m) => {
                return (StatusCode::BAD_REQUEST, Json(json!({ "error": m }))).into_response()
            }
            ApiError::ThreadList(e) => {
                tracing::error!(error = %e, "fetching threads");
                json!({ "error": self.to_string(), "threads": [] })
            }
            ApiError::Upstream { code, message } => json!({ "error": message, "code": code }),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), 1024).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    /// **Scenario**: Bad requests are 400 with only an error message.
    #[tokio::test]
    async fn bad_request_body() {
        let (status, body) = body_of(ApiError::BadRequest("Thread ID is required".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Thread ID is required"}));
    }

    /// **Scenario**: Upstream failures are 500 with the failure code.
    #[tokio::test]
    async fn upstream_body_carries_code() {
        let err = ApiError::upstream(code::THREAD_DELETE_FAILED, "Failed to delete thread")(
            ClientError::NotFound("thread t1".into()),
        );
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "THREAD_DELETE_FAILED");
        assert_eq!(body["error"], "Failed to delete thread: not found: thread t1");
    }

    /// **Scenario**: Thread list failures still return an empty thread list.
    #[tokio::test]
    async fn thread_list_body_has_empty_threads() {
        let (status, body) = body_of(ApiError::ThreadList(ClientError::Stream("x".into()))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Failed to fetch threads", "threads": []}));
    }
}
