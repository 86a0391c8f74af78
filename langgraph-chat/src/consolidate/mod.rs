//! Consolidation of a raw run stream into display records.
//!
//! [`consolidate`] walks the raw events in order and merges each uninterrupted run of
//! `AIMessageChunk` tokens into one [`DisplayRecord::StreamState`], passes structural events
//! through as individual records, and inserts a [`DisplayRecord::Separator`] whenever the
//! thread changes. It is a pure function of its input and the injected [`Clock`]; callers
//! recompute it from the full raw buffer whenever the buffer changes.

mod clock;

pub use clock::{Clock, FixedClock, SystemClock};

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::stream::{MessageData, Metadata, RawEvent, StreamEvent};

/// Accumulated streaming output, emitted at each flush point.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StreamState {
    /// Whitespace-normalized concatenation of the chunk contents.
    pub content: String,
    /// Metadata of the last chunk seen (survives flushes).
    pub metadata: Option<Metadata>,
    /// Last state snapshot since the previous flush.
    pub state: Option<Value>,
    pub timestamp: String,
}

/// One display-ready record produced by [`consolidate`].
///
/// Serializes to the same `{event, data}` envelope as [`RawEvent`], keyed by [`DisplayRecord::tag`].
#[derive(Clone, Debug, PartialEq)]
pub enum DisplayRecord {
    /// Input `metadata` record, unchanged.
    Metadata(Value),
    /// Merged streaming chunks and/or pending state.
    StreamState(StreamState),
    /// Boundary between two threads.
    Separator { timestamp: String },
    /// Complete (non-chunk) message with normalized content.
    Messages {
        message: MessageData,
        metadata: Option<Metadata>,
    },
    /// State snapshot from an `updates` event.
    StateUpdate { state: Value, timestamp: String },
    /// Payload of an `events` event.
    Event { event: Value, timestamp: String },
    /// Any other tag; `event` is the original tag.
    Other {
        event: String,
        content: Value,
        timestamp: String,
    },
}

impl DisplayRecord {
    /// Event tag of this record.
    pub fn tag(&self) -> &str {
        match self {
            DisplayRecord::Metadata(_) => "metadata",
            DisplayRecord::StreamState(_) => "stream_state",
            DisplayRecord::Separator { .. } => "separator",
            DisplayRecord::Messages { .. } => "messages",
            DisplayRecord::StateUpdate { .. } => "state_update",
            DisplayRecord::Event { .. } => "event",
            DisplayRecord::Other { event, .. } => event,
        }
    }

    /// Timestamp stamped at consolidation time; input metadata records carry none.
    pub fn timestamp(&self) -> Option<&str> {
        match self {
            DisplayRecord::Metadata(_) | DisplayRecord::Messages { .. } => None,
            DisplayRecord::StreamState(s) => Some(&s.timestamp),
            DisplayRecord::Separator { timestamp }
            | DisplayRecord::StateUpdate { timestamp, .. }
            | DisplayRecord::Event { timestamp, .. }
            | DisplayRecord::Other { timestamp, .. } => Some(timestamp),
        }
    }

    /// `{event, data}` form of this record.
    pub fn to_raw(&self) -> RawEvent {
        let data = match self {
            DisplayRecord::Metadata(data) => data.clone(),
            DisplayRecord::StreamState(s) => {
                serde_json::to_value(s).unwrap_or(Value::Null)
            }
            DisplayRecord::Separator { timestamp } => {
                serde_json::json!({ "timestamp": timestamp })
            }
            DisplayRecord::Messages { message, metadata } => {
                let metadata = metadata
                    .as_ref()
                    .map(|m| Value::Object(m.0.clone()))
                    .unwrap_or(Value::Null);
                Value::Array(vec![Value::Object(message.0.clone()), metadata])
            }
            DisplayRecord::StateUpdate { state, timestamp } => {
                serde_json::json!({ "state": state, "timestamp": timestamp })
            }
            DisplayRecord::Event { event, timestamp } => {
                serde_json::json!({ "event": event, "timestamp": timestamp })
            }
            DisplayRecord::Other {
                content, timestamp, ..
            } => serde_json::json!({ "content": content, "timestamp": timestamp }),
        };
        RawEvent::new(self.tag(), data)
    }
}

impl Serialize for DisplayRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_raw().serialize(serializer)
    }
}

/// Collapses every whitespace run to a single space and trims both ends.
pub fn normalize_content(content: &str) -> String {
    content.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Kind of the previous input record, used to decide whether a chunk continues a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LastEvent {
    None,
    Metadata,
    Streaming,
    Message,
    State,
    Event,
    Other,
}

/// Running state of one consolidation pass.
struct Consolidator<'c, C: Clock + ?Sized> {
    clock: &'c C,
    output: Vec<DisplayRecord>,
    content: String,
    metadata: Option<Metadata>,
    thread_id: Option<String>,
    state: Option<Value>,
    last: LastEvent,
}

impl<'c, C: Clock + ?Sized> Consolidator<'c, C> {
    fn new(clock: &'c C) -> Self {
        Self {
            clock,
            output: Vec::new(),
            content: String::new(),
            metadata: None,
            thread_id: None,
            state: None,
            last: LastEvent::None,
        }
    }

    /// Emits one `stream_state` if content or state is pending, then resets both.
    fn flush(&mut self) {
        if self.content.is_empty() && self.state.is_none() {
            return;
        }
        let content = normalize_content(&self.content);
        self.output.push(DisplayRecord::StreamState(StreamState {
            content,
            metadata: self.metadata.clone(),
            state: self.state.take(),
            timestamp: self.clock.timestamp(),
        }));
        self.content.clear();
    }

    fn push(&mut self, event: &RawEvent) {
        match StreamEvent::from(event) {
            StreamEvent::Metadata { thread_id, data } => {
                if thread_id != self.thread_id {
                    self.flush();
                    if !self.output.is_empty() {
                        self.output.push(DisplayRecord::Separator {
                            timestamp: self.clock.timestamp(),
                        });
                    }
                    self.thread_id = thread_id;
                }
                self.output.push(DisplayRecord::Metadata(data));
                self.last = LastEvent::Metadata;
            }
            StreamEvent::Messages { message, metadata } => {
                if message.is_ai_chunk() {
                    let thread_id = metadata
                        .as_ref()
                        .and_then(|m| m.thread_id())
                        .map(String::from);
                    let text = message.text();
                    if self.last != LastEvent::Streaming || thread_id != self.thread_id {
                        self.flush();
                        self.content = text;
                    } else if !text.is_empty() {
                        if !self.content.is_empty() && !self.content.ends_with(' ') {
                            self.content.push(' ');
                        }
                        self.content.push_str(&text);
                    }
                    self.metadata = metadata;
                    self.last = LastEvent::Streaming;
                    self.thread_id = thread_id;
                } else {
                    self.flush();
                    let content = normalize_content(&message.text());
                    self.output.push(DisplayRecord::Messages {
                        message: message.with_content(content),
                        metadata,
                    });
                    self.last = LastEvent::Message;
                }
            }
            StreamEvent::Updates(data) => {
                self.state = if data.is_null() {
                    None
                } else {
                    Some(data.clone())
                };
                self.output.push(DisplayRecord::StateUpdate {
                    state: data,
                    timestamp: self.clock.timestamp(),
                });
                self.last = LastEvent::State;
            }
            StreamEvent::Events(data) => {
                self.output.push(DisplayRecord::Event {
                    event: data,
                    timestamp: self.clock.timestamp(),
                });
                self.last = LastEvent::Event;
            }
            StreamEvent::Other { event, data } => {
                self.output.push(DisplayRecord::Other {
                    event,
                    content: data,
                    timestamp: self.clock.timestamp(),
                });
                self.last = LastEvent::Other;
            }
        }
    }

    fn finish(mut self) -> Vec<DisplayRecord> {
        self.flush();
        self.output
    }
}

/// Turns an ordered raw run stream into ordered display records.
///
/// Consecutive `AIMessageChunk`s of the same thread merge into one `stream_state`; a thread
/// change flushes pending content and, unless the output is still empty, inserts a
/// `separator`. Chunks are joined with a single space unless the buffer already ends in one.
/// Missing fields are treated as empty; this never fails.
pub fn consolidate<C: Clock + ?Sized>(events: &[RawEvent], clock: &C) -> Vec<DisplayRecord> {
    let mut consolidator = Consolidator::new(clock);
    for event in events {
        consolidator.push(event);
    }
    consolidator.finish()
}
