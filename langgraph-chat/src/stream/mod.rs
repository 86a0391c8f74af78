//! Event records of a LangGraph run stream.
//!
//! A run stream is an ordered sequence of [`RawEvent`]s (`{event, data}`), one per
//! server-sent event. [`StreamEvent`] is the typed view used by the consolidator and the
//! chat session; building it never fails; malformed payloads degrade to empty defaults.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Stream mode selector sent with a run request: which kinds of events the server emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamMode {
    /// Full state after each step.
    #[serde(rename = "values")]
    Values,
    /// Complete and partial messages (`messages/partial`, `messages/complete`).
    #[serde(rename = "messages")]
    Messages,
    /// `[message chunk, metadata]` tuples, delivered as `messages` events.
    #[serde(rename = "messages-tuple")]
    MessagesTuple,
    /// Per-node state updates.
    #[serde(rename = "updates")]
    Updates,
    /// Callback events of the underlying runnables.
    #[serde(rename = "events")]
    Events,
    /// Checkpoint and task debug records.
    #[serde(rename = "debug")]
    Debug,
    /// Custom payloads written by nodes.
    #[serde(rename = "custom")]
    Custom,
}

impl StreamMode {
    /// Wire name of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamMode::Values => "values",
            StreamMode::Messages => "messages",
            StreamMode::MessagesTuple => "messages-tuple",
            StreamMode::Updates => "updates",
            StreamMode::Events => "events",
            StreamMode::Debug => "debug",
            StreamMode::Custom => "custom",
        }
    }
}

impl fmt::Display for StreamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "values" => Ok(StreamMode::Values),
            "messages" => Ok(StreamMode::Messages),
            "messages-tuple" | "messages_tuple" => Ok(StreamMode::MessagesTuple),
            "updates" => Ok(StreamMode::Updates),
            "events" => Ok(StreamMode::Events),
            "debug" => Ok(StreamMode::Debug),
            "custom" => Ok(StreamMode::Custom),
            other => Err(format!("unknown stream mode: {}", other)),
        }
    }
}

/// One record of a run stream, exactly as the server sent it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Event tag: `metadata`, `messages`, `updates`, `events`, or anything else.
    pub event: String,
    /// Event payload; shape depends on the tag.
    #[serde(default)]
    pub data: Value,
}

impl RawEvent {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }
}

/// Message content: plain text or a list of typed parts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
    Other(Value),
}

impl MessageContent {
    /// Text of this content; parts are concatenated, non-text values yield "".
    pub fn text(&self) -> String {
        match self {
            MessageContent::Text(s) => s.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<String>(),
            MessageContent::Other(_) => String::new(),
        }
    }
}

/// One element of a multi-part message content.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// First element of a `messages` tuple: a message or message chunk.
///
/// Kept as the original JSON object so passthrough records lose nothing; accessors read
/// the fields the chat layer cares about.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageData(pub Map<String, Value>);

impl MessageData {
    /// `type` field, e.g. `AIMessageChunk`, `ai`, `human`, `tool`.
    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    /// True for streaming assistant token chunks.
    pub fn is_ai_chunk(&self) -> bool {
        self.kind() == Some("AIMessageChunk")
    }

    /// Parsed `content`, if present and not null.
    pub fn content(&self) -> Option<MessageContent> {
        match self.0.get("content") {
            None | Some(Value::Null) => None,
            Some(v) => serde_json::from_value(v.clone()).ok(),
        }
    }

    /// Content text; missing content is "".
    pub fn text(&self) -> String {
        self.content().map(|c| c.text()).unwrap_or_default()
    }

    /// `response_metadata.finish_reason`, e.g. `stop` or `tool_calls`.
    pub fn finish_reason(&self) -> Option<&str> {
        self.0
            .get("response_metadata")
            .and_then(|m| m.get("finish_reason"))
            .and_then(Value::as_str)
    }

    /// True when `tool_calls` is present and non-empty.
    pub fn has_tool_calls(&self) -> bool {
        is_present(self.0.get("tool_calls"))
    }

    /// True when `additional_kwargs.tool_calls` is present and non-empty.
    pub fn has_additional_tool_calls(&self) -> bool {
        is_present(
            self.0
                .get("additional_kwargs")
                .and_then(|k| k.get("tool_calls")),
        )
    }

    /// Copy of this message with `content` replaced by the given text.
    pub fn with_content(&self, content: String) -> Self {
        let mut map = self.0.clone();
        map.insert("content".to_string(), Value::String(content));
        MessageData(map)
    }
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(_) => true,
    }
}

/// Second element of a `messages` tuple: run metadata for the chunk.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(pub Map<String, Value>);

impl Metadata {
    /// Thread the chunk belongs to; empty strings count as no thread.
    pub fn thread_id(&self) -> Option<&str> {
        self.0
            .get("thread_id")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Graph node that produced the chunk, e.g. `agent` or `tools`.
    pub fn langgraph_node(&self) -> Option<&str> {
        self.0.get("langgraph_node").and_then(Value::as_str)
    }
}

/// Thread id carried by a `metadata` event payload.
pub fn thread_id_of(data: &Value) -> Option<String> {
    data.get("thread_id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Typed view of a [`RawEvent`], dispatched on its tag.
#[derive(Clone, Debug, PartialEq)]
pub enum StreamEvent {
    /// Run started; `data` is the original payload.
    Metadata {
        thread_id: Option<String>,
        data: Value,
    },
    /// A message or message chunk with its run metadata.
    Messages {
        message: MessageData,
        metadata: Option<Metadata>,
    },
    /// State snapshot.
    Updates(Value),
    /// Runnable callback event.
    Events(Value),
    /// Any other tag, kept verbatim.
    Other { event: String, data: Value },
}

impl From<&RawEvent> for StreamEvent {
    fn from(raw: &RawEvent) -> Self {
        match raw.event.as_str() {
            "metadata" => StreamEvent::Metadata {
                thread_id: thread_id_of(&raw.data),
                data: raw.data.clone(),
            },
            "messages" => {
                let message = match raw.data.get(0) {
                    Some(Value::Object(map)) => MessageData(map.clone()),
                    _ => MessageData::default(),
                };
                let metadata = match raw.data.get(1) {
                    Some(Value::Object(map)) => Some(Metadata(map.clone())),
                    _ => None,
                };
                StreamEvent::Messages { message, metadata }
            }
            "updates" => StreamEvent::Updates(raw.data.clone()),
            "events" => StreamEvent::Events(raw.data.clone()),
            other => StreamEvent::Other {
                event: other.to_string(),
                data: raw.data.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// **Scenario**: A messages tuple yields typed message and metadata.
    #[test]
    fn messages_event_parses_tuple() {
        let raw = RawEvent::new(
            "messages",
            json!([
                {"type": "AIMessageChunk", "content": "Hi", "id": "m1"},
                {"thread_id": "t1", "langgraph_node": "agent"}
            ]),
        );
        match StreamEvent::from(&raw) {
            StreamEvent::Messages { message, metadata } => {
                assert!(message.is_ai_chunk());
                assert_eq!(message.text(), "Hi");
                let metadata = metadata.expect("metadata");
                assert_eq!(metadata.thread_id(), Some("t1"));
                assert_eq!(metadata.langgraph_node(), Some("agent"));
            }
            other => panic!("expected Messages, got {:?}", other),
        }
    }

    /// **Scenario**: Malformed messages payload degrades to defaults instead of failing.
    #[test]
    fn malformed_messages_payload_degrades() {
        let raw = RawEvent::new("messages", json!("not a tuple"));
        match StreamEvent::from(&raw) {
            StreamEvent::Messages { message, metadata } => {
                assert_eq!(message, MessageData::default());
                assert_eq!(message.text(), "");
                assert!(metadata.is_none());
            }
            other => panic!("expected Messages, got {:?}", other),
        }
    }

    /// **Scenario**: Metadata event with empty thread id has no thread.
    #[test]
    fn metadata_event_empty_thread_id_is_none() {
        let raw = RawEvent::new("metadata", json!({"thread_id": "", "run_id": "r1"}));
        match StreamEvent::from(&raw) {
            StreamEvent::Metadata { thread_id, data } => {
                assert_eq!(thread_id, None);
                assert_eq!(data["run_id"], "r1");
            }
            other => panic!("expected Metadata, got {:?}", other),
        }
    }

    /// **Scenario**: Unknown tags stay verbatim in Other.
    #[test]
    fn unknown_tag_is_other() {
        let raw = RawEvent::new("messages|agent:1", json!({"k": "v"}));
        assert_eq!(
            StreamEvent::from(&raw),
            StreamEvent::Other {
                event: "messages|agent:1".into(),
                data: json!({"k": "v"}),
            }
        );
    }

    /// **Scenario**: Content parts are joined by their text; non-text parts are skipped.
    #[test]
    fn content_parts_join_text() {
        let message = MessageData(
            json!({"content": [
                {"type": "text", "text": "Hel", "index": 0},
                {"type": "tool_use", "id": "x"},
                {"type": "text", "text": "lo", "index": 1}
            ]})
            .as_object()
            .cloned()
            .unwrap(),
        );
        assert_eq!(message.text(), "Hello");
    }

    /// **Scenario**: Empty tool_calls list does not count as tool calls.
    #[test]
    fn empty_tool_calls_is_not_present() {
        let with_empty = MessageData(json!({"tool_calls": []}).as_object().cloned().unwrap());
        let with_call = MessageData(
            json!({"tool_calls": [{"name": "search"}], "response_metadata": {"finish_reason": "tool_calls"}})
                .as_object()
                .cloned()
                .unwrap(),
        );
        assert!(!with_empty.has_tool_calls());
        assert!(with_call.has_tool_calls());
        assert_eq!(with_call.finish_reason(), Some("tool_calls"));
    }

    /// **Scenario**: StreamMode round-trips through its wire name.
    #[test]
    fn stream_mode_wire_names() {
        assert_eq!(StreamMode::MessagesTuple.as_str(), "messages-tuple");
        assert_eq!(
            serde_json::to_value(StreamMode::MessagesTuple).unwrap(),
            json!("messages-tuple")
        );
        assert_eq!("Updates".parse::<StreamMode>(), Ok(StreamMode::Updates));
        assert!("bogus".parse::<StreamMode>().is_err());
    }

    /// **Scenario**: RawEvent without data deserializes with null data.
    #[test]
    fn raw_event_missing_data_is_null() {
        let raw: RawEvent = serde_json::from_str(r#"{"event": "end"}"#).unwrap();
        assert_eq!(raw.event, "end");
        assert_eq!(raw.data, Value::Null);
    }
}
