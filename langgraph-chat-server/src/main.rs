//! HTTP proxy in front of a LangGraph server: `/api/threads*`, `/api/chat`, `/api/messages`,
//! `/api/stream` (SSE passthrough) and `/api/debug/consolidate`.
//!
//! Configure via env: LANGGRAPH_API_URL, LANGGRAPH_API_KEY, LANGGRAPH_GRAPH_ID,
//! LANGGRAPH_ASSISTANT_ID, LISTEN, LOG_FILE. See langgraph-chat's ClientConfig::from_env().
//! Load .env with dotenv.

mod error;
mod routes;

use std::sync::Arc;

use langgraph_chat::{load_dotenv, ClientConfig, LangGraphClient};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, info_span};

use crate::routes::{router, AppState};

/// Initializes tracing: always to stdout; if env `LOG_FILE` is set, also to that file (append, no ANSI).
fn init_tracing() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::Layer;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("info,langgraph_chat_server=debug,langgraph_chat=debug")
    });

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_filter(filter.clone());

    let registry = tracing_subscriber::registry().with(stdout_layer);

    if let Ok(path) = std::env::var("LOG_FILE") {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .with_filter(filter);
        registry.with(file_layer).init();
        tracing::info!(path = %path, "logging to file");
    } else {
        registry.init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    load_dotenv();
    init_tracing()?;

    let config = ClientConfig::from_env()?;
    info!(
        api_url = %config.api_url,
        graph_id = %config.graph_id,
        assistant_id = ?config.assistant_id,
        api_key_set = config.api_key.is_some(),
        "LangGraph config loaded"
    );
    let client = LangGraphClient::new(config)?;
    let state = Arc::new(AppState::new(client));

    let app = router(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<axum::body::Body>| {
                    info_span!("request", method = %req.method(), uri = %req.uri())
                }),
        )
        .layer(CorsLayer::permissive());

    let listen = std::env::var("LISTEN").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    info!("listening on http://{}", listen);
    let listener = tokio::net::TcpListener::bind(&listen).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
