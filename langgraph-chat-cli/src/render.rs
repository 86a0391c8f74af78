//! Plain-text rendering of chat messages and debug trace records.

use langgraph_chat::{ChatMessage, DisplayRecord, Role};
use serde_json::Value;

pub fn render_message(message: &ChatMessage) -> String {
    match message.role {
        Role::User => format!("[User] {}", message.content),
        Role::Assistant => format!("[Assistant] {}", message.content),
    }
}

fn compact(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

/// One record as text. Tags without a dedicated layout print their `{event, data}` form as
/// pretty JSON.
pub fn render_record(record: &DisplayRecord) -> String {
    match record {
        DisplayRecord::Metadata(data) => format!("[metadata] {}", compact(data)),
        DisplayRecord::StreamState(s) => {
            let mut line = format!("[stream_state {}]", s.timestamp);
            if let Some(node) = s.metadata.as_ref().and_then(|m| m.langgraph_node()) {
                line.push_str(&format!(" ({})", node));
            }
            line.push(' ');
            line.push_str(&s.content);
            if let Some(state) = &s.state {
                line.push_str(&format!("\n  state: {}", compact(state)));
            }
            line
        }
        DisplayRecord::Separator { timestamp } => {
            format!("==================== thread change {} ====================", timestamp)
        }
        DisplayRecord::Messages { message, .. } => format!(
            "[messages] {}: {}",
            message.kind().unwrap_or("message"),
            message.text()
        ),
        DisplayRecord::StateUpdate { state, timestamp } => {
            format!("[state_update {}] {}", timestamp, compact(state))
        }
        DisplayRecord::Event { event, timestamp } => {
            format!("[event {}] {}", timestamp, compact(event))
        }
        DisplayRecord::Other { .. } => {
            pretty(&serde_json::to_value(record).unwrap_or(Value::Null))
        }
    }
}

/// All records, one per line (pretty JSON records span several lines).
pub fn render_trace(records: &[DisplayRecord]) -> String {
    records
        .iter()
        .map(render_record)
        .collect::<Vec<_>>()
        .join("\n")
}
