//! Typed HTTP client for the LangGraph server API.
//!
//! [`LangGraphClient`] implements [`AgentBackend`] (threads, assistants, run streams) and
//! adds the raw `request_json` / `forward_stream` calls the HTTP proxy forwards through.
//! Uses async reqwest; every request carries `x-api-key` when configured.

mod sse;
mod types;

pub use sse::{decode_events, to_raw_event};
pub use types::{
    Assistant, AssistantSearch, RunInput, RunStreamPayload, Thread, ThreadSearch, ThreadState,
};

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::backend::{AgentBackend, RawEventStream};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::logging;

/// Body of a run stream request: payload plus the assistant to run.
#[derive(Serialize)]
struct RunStreamBody<'a> {
    assistant_id: &'a str,
    #[serde(flatten)]
    payload: &'a RunStreamPayload,
}

/// Client for one LangGraph server.
#[derive(Clone, Debug)]
pub struct LangGraphClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl LangGraphClient {
    /// Creates a client for the configured server.
    ///
    /// The config timeout applies to JSON requests only; run streams stay open until the
    /// server closes them.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        if config.api_url.trim().is_empty() {
            return Err(ClientError::MissingApiUrl);
        }
        let http = reqwest::Client::builder()
            .connect_timeout(config.timeout)
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        logging::log_request(method.as_str(), path);
        let mut req = self.http.request(method, self.url(path));
        if let Some(key) = &self.config.api_key {
            req = req.header("x-api-key", key);
        }
        req
    }

    /// Sends a JSON request (bounded by the config timeout) and checks the status.
    async fn send(&self, req: RequestBuilder, path: &str) -> Result<Response, ClientError> {
        let resp = req.timeout(self.config.timeout).send().await?;
        check_status(resp, path).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        path: &str,
    ) -> Result<T, ClientError> {
        let resp = self.send(req, path).await?;
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// `GET /threads/{id}`.
    pub async fn get_thread(&self, thread_id: &str) -> Result<Thread, ClientError> {
        let path = format!("/threads/{}", thread_id);
        self.send_json(self.request(Method::GET, &path), &path).await
    }

    /// `POST /threads/{id}/history`: past states, newest first.
    pub async fn get_thread_history(
        &self,
        thread_id: &str,
        limit: u32,
    ) -> Result<Vec<ThreadState>, ClientError> {
        let path = format!("/threads/{}/history", thread_id);
        let req = self
            .request(Method::POST, &path)
            .json(&serde_json::json!({ "limit": limit }));
        self.send_json(req, &path).await
    }

    /// Sends any JSON request and returns the JSON response; an empty body yields `null`.
    pub async fn request_json(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        let mut req = self.request(method, path);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = self.send(req, path).await?;
        let bytes = resp.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// POSTs a JSON body to a streaming endpoint and returns the open SSE response.
    pub async fn forward_stream(&self, path: &str, body: &Value) -> Result<Response, ClientError> {
        let resp = self
            .request(Method::POST, path)
            .header("Accept", "text/event-stream")
            .header("Cache-Control", "no-cache")
            .json(body)
            .send()
            .await?;
        check_status(resp, path).await
    }
}

/// Turns a non-2xx response into [`ClientError::Http`] with the response body.
async fn check_status(resp: Response, path: &str) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    logging::log_http_error(path, status.as_u16(), &body);
    Err(ClientError::Http {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl AgentBackend for LangGraphClient {
    async fn create_thread(&self, metadata: Option<Value>) -> Result<Thread, ClientError> {
        let path = "/threads";
        let mut body = serde_json::Map::new();
        if let Some(metadata) = metadata {
            body.insert("metadata".to_string(), metadata);
        }
        let req = self.request(Method::POST, path).json(&body);
        self.send_json(req, path).await
    }

    async fn search_threads(&self, query: &ThreadSearch) -> Result<Vec<Thread>, ClientError> {
        let path = "/threads/search";
        let req = self.request(Method::POST, path).json(query);
        self.send_json(req, path).await
    }

    async fn get_thread_state(&self, thread_id: &str) -> Result<ThreadState, ClientError> {
        let path = format!("/threads/{}/state", thread_id);
        self.send_json(self.request(Method::GET, &path), &path).await
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<(), ClientError> {
        let path = format!("/threads/{}", thread_id);
        self.send(self.request(Method::DELETE, &path), &path).await?;
        Ok(())
    }

    async fn search_assistants(
        &self,
        query: &AssistantSearch,
    ) -> Result<Vec<Assistant>, ClientError> {
        let path = "/assistants/search";
        let req = self.request(Method::POST, path).json(query);
        self.send_json(req, path).await
    }

    async fn stream_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        payload: &RunStreamPayload,
    ) -> Result<RawEventStream, ClientError> {
        let path = format!("/threads/{}/runs/stream", thread_id);
        let body = serde_json::to_value(RunStreamBody {
            assistant_id,
            payload,
        })?;
        logging::log_run_start(thread_id, assistant_id);
        let resp = self.forward_stream(&path, &body).await?;
        Ok(decode_events(resp.bytes_stream()))
    }
}
