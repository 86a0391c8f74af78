//! `/api/*` routes. Every route forwards to the LangGraph server through [`LangGraphClient`].

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use langgraph_chat::{
    consolidate, AgentBackend, DisplayRecord, LangGraphClient, RawEvent, RunStreamPayload, StreamMode,
    SystemClock, ThreadSearch,
};
use reqwest::Method;
use serde_json::{json, Value};

use crate::error::{code, ApiError};

/// Upper bound on threads returned by `GET /api/threads`.
const THREAD_LIST_LIMIT: u32 = 100;

/// Shared state for all routes.
pub struct AppState {
    pub client: LangGraphClient,
    pub graph_id: String,
    /// Assistant run by `/api/stream`; LangGraph also accepts a graph id here.
    pub assistant_id: String,
}

impl AppState {
    pub fn new(client: LangGraphClient) -> Self {
        let graph_id = client.config().graph_id.clone();
        let assistant_id = client
            .config()
            .assistant_id
            .clone()
            .unwrap_or_else(|| graph_id.clone());
        Self {
            client,
            graph_id,
            assistant_id,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/threads", get(list_threads).post(create_thread))
        .route(
            "/api/threads/:thread_id",
            get(get_thread).delete(delete_thread),
        )
        .route("/api/threads/:thread_id/history", get(thread_history))
        .route(
            "/api/threads/:thread_id/config",
            get(get_thread_config).patch(update_thread_config),
        )
        .route("/api/chat", post(send_chat))
        .route("/api/messages", post(send_message))
        .route("/api/stream", post(stream_run))
        .route("/api/debug/consolidate", post(consolidate_events))
        .with_state(state)
}

fn require_thread_id(thread_id: &str) -> Result<(), ApiError> {
    if thread_id.trim().is_empty() {
        return Err(ApiError::BadRequest("Thread ID is required".into()));
    }
    Ok(())
}

/// Non-empty string field of a JSON body.
fn str_field<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn user_message_body(message: &str) -> Value {
    json!({ "messages": [{ "role": "user", "content": message }] })
}

async fn list_threads(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let query = ThreadSearch {
        limit: THREAD_LIST_LIMIT,
        ..ThreadSearch::default()
    };
    let threads = state
        .client
        .search_threads(&query)
        .await
        .map_err(ApiError::ThreadList)?;
    Ok(Json(json!({ "threads": threads })))
}

/// Creates a thread under a fresh uuid and returns its run config.
async fn create_thread(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let thread_id = uuid::Uuid::new_v4().to_string();
    let configurable = json!({
        "thread_id": thread_id,
        "model": "gpt-4",
        "temperature": 0.1,
    });
    let body = json!({
        "thread_id": thread_id,
        "graph_id": state.graph_id,
        "configurable": configurable,
        "metadata": {
            "graph_id": state.graph_id,
            "created_at": chrono::Utc::now().to_rfc3339(),
            "version": "1.0",
        },
    });
    state
        .client
        .request_json(Method::POST, "/threads", Some(&body))
        .await
        .map_err(ApiError::upstream(code::THREAD_CREATION_FAILED, "Failed to create thread"))?;
    tracing::info!(thread_id = %thread_id, "thread created");
    Ok(Json(json!({ "thread_id": thread_id, "config": configurable })))
}

async fn get_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_thread_id(&thread_id)?;
    let thread = state
        .client
        .request_json(Method::GET, &format!("/threads/{}", thread_id), None)
        .await
        .map_err(ApiError::upstream(code::THREAD_FETCH_FAILED, "Failed to fetch thread"))?;
    Ok(Json(thread))
}

async fn delete_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_thread_id(&thread_id)?;
    state
        .client
        .delete_thread(&thread_id)
        .await
        .map_err(ApiError::upstream(code::THREAD_DELETE_FAILED, "Failed to delete thread"))?;
    Ok(Json(json!({ "success": true })))
}

/// Messages of the thread's current state.
async fn thread_history(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_thread_id(&thread_id)?;
    let thread_state = state
        .client
        .get_thread_state(&thread_id)
        .await
        .map_err(ApiError::upstream(
            code::HISTORY_FETCH_FAILED,
            "Failed to fetch thread history",
        ))?;
    Ok(Json(json!({ "messages": thread_state.messages() })))
}

async fn get_thread_config(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_thread_id(&thread_id)?;
    let config = state
        .client
        .request_json(Method::GET, &format!("/threads/{}/config", thread_id), None)
        .await
        .map_err(ApiError::upstream(
            code::CONFIG_FETCH_FAILED,
            "Failed to fetch thread configuration",
        ))?;
    Ok(Json(config))
}

async fn update_thread_config(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    require_thread_id(&thread_id)?;
    let config = state
        .client
        .request_json(
            Method::PATCH,
            &format!("/threads/{}/config", thread_id),
            Some(&body),
        )
        .await
        .map_err(ApiError::upstream(
            code::CONFIG_UPDATE_FAILED,
            "Failed to update thread configuration",
        ))?;
    Ok(Json(config))
}

/// `{thread_id, message}` forwarded to `/threads/{id}/messages`.
async fn send_chat(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let (Some(thread_id), Some(message)) = (str_field(&body, "thread_id"), str_field(&body, "message"))
    else {
        return Err(ApiError::BadRequest(
            "Thread ID and message are required".into(),
        ));
    };
    state
        .client
        .request_json(
            Method::POST,
            &format!("/threads/{}/messages", thread_id),
            Some(&user_message_body(message)),
        )
        .await
        .map_err(ApiError::upstream(code::MESSAGE_SEND_FAILED, "Failed to send message"))?;
    Ok(Json(json!({ "success": true })))
}

/// `{thread_id, message}` written into the thread state.
async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let thread_id = str_field(&body, "thread_id")
        .ok_or_else(|| ApiError::BadRequest("Thread ID is required".into()))?;
    let message = str_field(&body, "message")
        .ok_or_else(|| ApiError::BadRequest("Message content is required".into()))?;
    state
        .client
        .request_json(
            Method::POST,
            &format!("/threads/{}/state", thread_id),
            Some(&user_message_body(message)),
        )
        .await
        .map_err(ApiError::upstream(
            code::MESSAGE_SEND_FAILED,
            "Failed to send message to LangGraph",
        ))?;
    Ok(Json(json!({ "success": true })))
}

/// `{threadId, message}`: starts a run and pipes the upstream SSE body through unchanged.
async fn stream_run(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let missing: Vec<&str> = ["threadId", "message"]
        .into_iter()
        .filter(|k| str_field(&body, k).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }
    let thread_id = str_field(&body, "threadId").unwrap_or_default();
    let message = str_field(&body, "message").unwrap_or_default();

    let mut payload = RunStreamPayload::user_message(
        message,
        vec![StreamMode::MessagesTuple, StreamMode::Messages],
    )
    .with_subgraphs();
    payload.config = Some(json!({ "configurable": { "thread_id": thread_id } }));
    let mut upstream_body = serde_json::to_value(&payload).map_err(|e| ApiError::Upstream {
        code: code::SSE_CONNECTION_FAILED,
        message: e.to_string(),
    })?;
    upstream_body["assistant_id"] = json!(state.assistant_id);

    let upstream = state
        .client
        .forward_stream(&format!("/threads/{}/runs/stream", thread_id), &upstream_body)
        .await
        .map_err(ApiError::upstream(
            code::SSE_CONNECTION_FAILED,
            "Stream connection failed",
        ))?;
    tracing::debug!(thread_id = %thread_id, "piping run stream");

    let mut res = (StatusCode::OK, Body::from_stream(upstream.bytes_stream())).into_response();
    let headers = res.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    Ok(res)
}

/// Array of raw `{event, data}` records in, consolidated display records out.
async fn consolidate_events(
    Json(body): Json<Value>,
) -> Result<Json<Vec<DisplayRecord>>, ApiError> {
    let events: Vec<RawEvent> = serde_json::from_value(body)
        .map_err(|e| ApiError::BadRequest(format!("expected an array of events: {}", e)))?;
    Ok(Json(consolidate(&events, &SystemClock)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::Request;
    use langgraph_chat::ClientConfig;
    use tower::ServiceExt;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app_for(uri: &str) -> Router {
        let client = LangGraphClient::new(ClientConfig::new(uri)).expect("client");
        router(Arc::new(AppState::new(client)))
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(res: Response) -> Value {
        let bytes = to_bytes(res.into_body(), 1024 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// **Scenario**: GET /api/threads wraps the upstream search result.
    #[tokio::test]
    async fn list_threads_wraps_search_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/threads/search"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"thread_id": "t1"}])),
            )
            .mount(&server)
            .await;

        let res = app_for(&server.uri())
            .oneshot(Request::get("/api/threads").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body["threads"][0]["thread_id"], "t1");
    }

    /// **Scenario**: A failed thread listing is 500 with an empty thread list.
    #[tokio::test]
    async fn list_threads_failure_returns_empty_list() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/threads/search"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let res = app_for(&server.uri())
            .oneshot(Request::get("/api/threads").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(res).await,
            json!({"error": "Failed to fetch threads", "threads": []})
        );
    }

    /// **Scenario**: POST /api/threads creates a uuid thread and returns its config.
    #[tokio::test]
    async fn create_thread_returns_config() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/threads"))
            .and(body_partial_json(json!({
                "graph_id": "react_agent",
                "configurable": {"model": "gpt-4", "temperature": 0.1},
                "metadata": {"version": "1.0"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let res = app_for(&server.uri())
            .oneshot(Request::post("/api/threads").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        let thread_id = body["thread_id"].as_str().unwrap();
        assert!(uuid::Uuid::parse_str(thread_id).is_ok());
        assert_eq!(body["config"]["thread_id"], thread_id);
    }

    /// **Scenario**: Upstream failure on create is 500 THREAD_CREATION_FAILED.
    #[tokio::test]
    async fn create_thread_failure_has_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/threads"))
            .respond_with(ResponseTemplate::new(422).set_body_string("bad graph"))
            .mount(&server)
            .await;

        let res = app_for(&server.uri())
            .oneshot(Request::post("/api/threads").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(res).await;
        assert_eq!(body["code"], "THREAD_CREATION_FAILED");
        assert!(body["error"].as_str().unwrap().contains("bad graph"));
    }

    /// **Scenario**: DELETE /api/threads/{id} returns success.
    #[tokio::test]
    async fn delete_thread_returns_success() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/threads/t1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let res = app_for(&server.uri())
            .oneshot(Request::delete("/api/threads/t1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(json_body(res).await, json!({"success": true}));
    }

    /// **Scenario**: History returns the messages of the thread state.
    #[tokio::test]
    async fn history_returns_state_messages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/threads/t1/state"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "values": {"messages": [{"type": "human", "content": "hi"}]}
            })))
            .mount(&server)
            .await;

        let res = app_for(&server.uri())
            .oneshot(
                Request::get("/api/threads/t1/history")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            json_body(res).await,
            json!({"messages": [{"type": "human", "content": "hi"}]})
        );
    }

    /// **Scenario**: PATCH config forwards the body and returns the upstream JSON.
    #[tokio::test]
    async fn update_config_forwards_body() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/threads/t1/config"))
            .and(body_partial_json(json!({"temperature": 0.5})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"temperature": 0.5})))
            .mount(&server)
            .await;

        let res = app_for(&server.uri())
            .oneshot(json_request(
                "PATCH",
                "/api/threads/t1/config",
                json!({"temperature": 0.5}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await["temperature"], 0.5);
    }

    /// **Scenario**: /api/chat and /api/messages reject missing fields with 400.
    #[tokio::test]
    async fn message_routes_validate_fields() {
        let app = app_for("http://127.0.0.1:9");
        let res = app
            .clone()
            .oneshot(json_request("POST", "/api/chat", json!({"thread_id": "t1"})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(res).await,
            json!({"error": "Thread ID and message are required"})
        );

        let res = app
            .oneshot(json_request("POST", "/api/messages", json!({"thread_id": "t1"})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(res).await,
            json!({"error": "Message content is required"})
        );
    }

    /// **Scenario**: /api/chat forwards the user message to the thread.
    #[tokio::test]
    async fn chat_forwards_user_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/threads/t1/messages"))
            .and(body_partial_json(json!({
                "messages": [{"role": "user", "content": "hello"}]
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let res = app_for(&server.uri())
            .oneshot(json_request(
                "POST",
                "/api/chat",
                json!({"thread_id": "t1", "message": "hello"}),
            ))
            .await
            .unwrap();
        assert_eq!(json_body(res).await, json!({"success": true}));
    }

    /// **Scenario**: /api/stream names every missing field.
    #[tokio::test]
    async fn stream_reports_missing_fields() {
        let res = app_for("http://127.0.0.1:9")
            .oneshot(json_request("POST", "/api/stream", json!({})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(res).await,
            json!({"error": "Missing required fields: threadId, message"})
        );
    }

    /// **Scenario**: /api/stream pipes the upstream SSE body with stream headers.
    #[tokio::test]
    async fn stream_pipes_sse_body() {
        let server = MockServer::start().await;
        let sse = "event: metadata\ndata: {\"run_id\": \"r1\"}\n\n";
        Mock::given(method("POST"))
            .and(path("/threads/t1/runs/stream"))
            .and(body_partial_json(json!({
                "assistant_id": "react_agent",
                "stream_mode": ["messages-tuple", "messages"],
                "stream_subgraphs": true,
                "config": {"configurable": {"thread_id": "t1"}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
            .mount(&server)
            .await;

        let res = app_for(&server.uri())
            .oneshot(json_request(
                "POST",
                "/api/stream",
                json!({"threadId": "t1", "message": "hello"}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/event-stream"
        );
        let bytes = to_bytes(res.into_body(), 1024).await.unwrap();
        assert_eq!(&bytes[..], sse.as_bytes());
    }

    /// **Scenario**: Upstream refusal of the stream is 500 SSE_CONNECTION_FAILED.
    #[tokio::test]
    async fn stream_failure_has_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/threads/t1/runs/stream"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let res = app_for(&server.uri())
            .oneshot(json_request(
                "POST",
                "/api/stream",
                json!({"threadId": "t1", "message": "hello"}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(res).await["code"], "SSE_CONNECTION_FAILED");
    }

    /// **Scenario**: /api/debug/consolidate merges chunks into one stream_state.
    #[tokio::test]
    async fn debug_consolidate_merges_chunks() {
        let events = json!([
            {"event": "messages", "data": [{"type": "AIMessageChunk", "content": "Hel"}, {}]},
            {"event": "messages", "data": [{"type": "AIMessageChunk", "content": "lo"}, {}]}
        ]);
        let res = app_for("http://127.0.0.1:9")
            .oneshot(json_request("POST", "/api/debug/consolidate", events))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["event"], "stream_state");
        assert_eq!(body[0]["data"]["content"], "Hel lo");
    }

    /// **Scenario**: A non-array consolidate body is 400.
    #[tokio::test]
    async fn debug_consolidate_rejects_non_array() {
        let res = app_for("http://127.0.0.1:9")
            .oneshot(json_request("POST", "/api/debug/consolidate", json!({"x": 1})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
