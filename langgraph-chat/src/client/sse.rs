//! Server-sent event decoding for run streams.
//!
//! Each SSE event becomes one [`RawEvent`]: the SSE `event:` field is the tag and the
//! `data:` payload is parsed as JSON (non-JSON payloads are kept as a JSON string).

use std::fmt::Display;

use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use serde_json::Value;

use crate::backend::RawEventStream;
use crate::error::ClientError;
use crate::logging;
use crate::stream::RawEvent;

/// Builds a [`RawEvent`] from one SSE event.
pub fn to_raw_event(event: &str, data: &str) -> RawEvent {
    let data = if data.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(data).unwrap_or_else(|_| Value::String(data.to_string()))
    };
    RawEvent::new(event, data)
}

/// Decodes an SSE byte stream into raw events; ends when the byte stream ends.
pub fn decode_events<S, B, E>(bytes: S) -> RawEventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    bytes
        .eventsource()
        .map(|item| match item {
            Ok(ev) => {
                logging::log_stream_event(&ev.event);
                Ok(to_raw_event(&ev.event, &ev.data))
            }
            Err(e) => Err(ClientError::Stream(e.to_string())),
        })
        .boxed()
}
