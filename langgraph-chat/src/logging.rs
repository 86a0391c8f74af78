//! Logging helpers for client and session activity.
//!
//! With the `tracing` feature (default) events go through `tracing`; without it they are
//! written to stderr.

/// Log an outgoing API request.
pub fn log_request(method: &str, path: &str) {
    #[cfg(feature = "tracing")]
    tracing::debug!(method = method, path = path, "LangGraph API request");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[DEBUG] LangGraph API request: {} {}", method, path);
}

/// Log a non-2xx API response.
pub fn log_http_error(path: &str, status: u16, body: &str) {
    #[cfg(feature = "tracing")]
    tracing::warn!(path = path, status = status, body = body, "LangGraph API error response");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[WARN] LangGraph API error response: {} {} {}", path, status, body);
}

/// Log the start of a run stream.
pub fn log_run_start(thread_id: &str, assistant_id: &str) {
    #[cfg(feature = "tracing")]
    tracing::info!(thread_id = thread_id, assistant_id = assistant_id, "Run stream started");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[INFO] Run stream started: thread={} assistant={}", thread_id, assistant_id);
}

/// Log one received stream event.
pub fn log_stream_event(event: &str) {
    #[cfg(feature = "tracing")]
    tracing::trace!(event = event, "Stream event");

    #[cfg(not(feature = "tracing"))]
    let _ = event;
}

/// Log the end of a run stream.
pub fn log_run_complete(thread_id: &str, events: usize) {
    #[cfg(feature = "tracing")]
    tracing::info!(thread_id = thread_id, events = events, "Run stream complete");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[INFO] Run stream complete: thread={} events={}", thread_id, events);
}

/// Log a failure the caller recovers from (skipped thread, failed turn, ...).
pub fn log_recovered_error(context: &str, error: &crate::error::ClientError) {
    #[cfg(feature = "tracing")]
    tracing::error!(context = context, %error, "Recovered from error");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[ERROR] {}: {}", context, error);
}
