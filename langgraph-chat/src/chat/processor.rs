//! Per-event classification of a run stream into reply content and tool sources.

use crate::stream::{RawEvent, StreamEvent};

/// What one stream event contributes to the conversation view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChunkKind {
    /// Assistant text. `completes_turn` is set on the chunk that ends the reply.
    Content { text: String, completes_turn: bool },
    /// Tool output or tool-call chunk text, shown as a source.
    Source(String),
    /// Nothing to show.
    Ignored,
}

/// Classifies one raw event.
///
/// Only `messages` events count. Tool activity (a node whose name contains `tool`,
/// `additional_kwargs.tool_calls`, or a `tool` message) is a source; `AIMessageChunk` and
/// `ai` messages are content. A chunk completes the turn when it carries
/// `finish_reason == "stop"` or comes from node `agent` without tool calls.
pub fn classify_chunk(event: &RawEvent) -> ChunkKind {
    let StreamEvent::Messages { message, metadata } = StreamEvent::from(event) else {
        return ChunkKind::Ignored;
    };
    let node = metadata.as_ref().and_then(|m| m.langgraph_node());

    let is_tool = node.is_some_and(|n| n.contains("tool"))
        || message.has_additional_tool_calls()
        || message.kind() == Some("tool");
    if is_tool {
        let text = message.text();
        return if text.is_empty() {
            ChunkKind::Ignored
        } else {
            ChunkKind::Source(text)
        };
    }

    match message.kind() {
        Some("AIMessageChunk") | Some("ai") => {
            let completes_turn = message.is_ai_chunk()
                && (message.finish_reason() == Some("stop")
                    || (node == Some("agent") && !message.has_tool_calls()));
            ChunkKind::Content {
                text: message.text(),
                completes_turn,
            }
        }
        _ => ChunkKind::Ignored,
    }
}
