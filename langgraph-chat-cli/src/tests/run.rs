//! Tests for the command entry points, driven with the mock backend.
//!
//! Scenarios: chat streams the reply and prints the trace on --debug; failures print the
//! apology; thread commands list/create/history/delete; trace parses arrays and JSON lines.

use std::sync::Arc;

use langgraph_chat::{
    AgentBackend, FixedClock, MockBackend, Thread, ThreadState, APOLOGY_MESSAGE,
};
use serde_json::json;

use crate::config::{CliConfig, RunOptions};
use crate::run::{parse_events, run_chat, run_threads, run_trace, ThreadsCommand};

fn output(buf: Vec<u8>) -> String {
    String::from_utf8(buf).expect("utf8")
}

/// **Scenario**: A chat turn streams the reply tokens and names the thread.
///
/// Given: mock backend replying "Hi there"  
/// When: run_chat("hello")  
/// Then: output is the user line, the streamed reply, and the thread id
#[tokio::test]
async fn chat_streams_reply() {
    let backend: Arc<dyn AgentBackend> = Arc::new(MockBackend::echo_reply("Hi there"));
    let config = CliConfig::mock(RunOptions::default());
    let mut out = Vec::new();

    let reply = run_chat(backend, &config, "hello", &mut out)
        .await
        .expect("chat");

    assert_eq!(reply.map(|m| m.content), Some("Hi there".to_string()));
    assert_eq!(
        output(out),
        "[User] hello\n[Assistant] Hi there\n(thread mock-thread-1)\n"
    );
}

/// **Scenario**: With debug on, the consolidated trace follows the reply.
#[tokio::test]
async fn chat_debug_prints_trace() {
    let backend: Arc<dyn AgentBackend> = Arc::new(MockBackend::echo_reply("Hi there"));
    let config = CliConfig::mock(RunOptions {
        debug: true,
        ..RunOptions::default()
    });
    let mut out = Vec::new();
    run_chat(backend, &config, "hello", &mut out)
        .await
        .expect("chat");

    let text = output(out);
    assert!(text.contains("--- debug trace ---"));
    assert!(text.contains("[metadata] {\"run_id\":\"mock-run\"}"));
    assert!(text.contains("(agent) Hi there"));
}

/// **Scenario**: A failed run prints the apology as the reply.
#[tokio::test]
async fn chat_failure_prints_apology() {
    let backend: Arc<dyn AgentBackend> = Arc::new(MockBackend::new().with_stream_error("reset"));
    let config = CliConfig::mock(RunOptions::default());
    let mut out = Vec::new();
    let reply = run_chat(backend, &config, "hello", &mut out)
        .await
        .expect("chat");
    assert_eq!(reply.map(|m| m.content), Some(APOLOGY_MESSAGE.to_string()));
    assert!(output(out).contains(&format!("[Assistant] {}\n", APOLOGY_MESSAGE)));
}

/// **Scenario**: Create, list, history and delete against one shared backend.
#[tokio::test]
async fn thread_commands_round_trip() {
    let backend = Arc::new(MockBackend::new().with_thread(
        Thread {
            thread_id: "t1".into(),
            created_at: Some("2024-01-01T00:00:00Z".into()),
            metadata: Some(json!({"graph_id": "react_agent"})),
            ..Thread::default()
        },
        ThreadState {
            values: json!({"messages": [
                {"type": "human", "content": "hi"},
                {"type": "ai", "content": "hello there"}
            ]}),
            ..ThreadState::default()
        },
    ));
    let dyn_backend: Arc<dyn AgentBackend> = backend.clone();
    let config = CliConfig::mock(RunOptions::default());

    let mut out = Vec::new();
    run_threads(dyn_backend.clone(), &config, ThreadsCommand::List, &mut out)
        .await
        .expect("list");
    assert_eq!(
        output(out),
        "t1  2024-01-01T00:00:00Z  2 messages  hello there\n"
    );

    let mut out = Vec::new();
    run_threads(dyn_backend.clone(), &config, ThreadsCommand::History("t1".into()), &mut out)
        .await
        .expect("history");
    assert_eq!(output(out), "[User] hi\n[Assistant] hello there\n");

    let mut out = Vec::new();
    run_threads(dyn_backend.clone(), &config, ThreadsCommand::Create, &mut out)
        .await
        .expect("create");
    assert_eq!(output(out), "mock-thread-1\n");

    let mut out = Vec::new();
    run_threads(dyn_backend.clone(), &config, ThreadsCommand::Delete("t1".into()), &mut out)
        .await
        .expect("delete");
    assert_eq!(output(out), "deleted t1\n");
    assert_eq!(backend.thread_ids(), vec!["mock-thread-1".to_string()]);

    let mut out = Vec::new();
    run_threads(dyn_backend, &config, ThreadsCommand::DeleteAll, &mut out)
        .await
        .expect("delete all");
    assert_eq!(output(out), "deleted 1 threads\n");
    assert!(backend.thread_ids().is_empty());
}

/// **Scenario**: An empty thread list says so.
#[tokio::test]
async fn empty_thread_list() {
    let backend: Arc<dyn AgentBackend> = Arc::new(MockBackend::new());
    let mut out = Vec::new();
    run_threads(
        backend,
        &CliConfig::mock(RunOptions::default()),
        ThreadsCommand::List,
        &mut out,
    )
    .await
    .expect("list");
    assert_eq!(output(out), "no threads\n");
}

/// **Scenario**: Events parse from a JSON array and from JSON lines alike.
#[test]
fn parse_events_accepts_array_and_lines() {
    let array = r#"[{"event": "metadata", "data": {"run_id": "r1"}}, {"event": "end"}]"#;
    let lines = "{\"event\": \"metadata\", \"data\": {\"run_id\": \"r1\"}}\n\n{\"event\": \"end\"}\n";
    let from_array = parse_events(array).expect("array");
    let from_lines = parse_events(lines).expect("lines");
    assert_eq!(from_array, from_lines);
    assert_eq!(from_array.len(), 2);
    assert!(from_array[1].data.is_null());
}

/// **Scenario**: A bad JSON line is reported with its line number.
#[test]
fn parse_events_reports_bad_line() {
    let err = parse_events("{\"event\": \"a\"}\nnot json\n").unwrap_err();
    assert!(err.to_string().starts_with("line 2:"), "{}", err);
}

/// **Scenario**: run_trace writes the consolidated trace and returns the record count.
#[test]
fn run_trace_renders_records() {
    let input = r#"[
        {"event": "messages", "data": [{"type": "AIMessageChunk", "content": "a"}, {}]},
        {"event": "messages", "data": [{"type": "AIMessageChunk", "content": "b"}, {}]}
    ]"#;
    let mut out = Vec::new();
    let count = run_trace(input, &FixedClock::from_millis(0), &mut out).expect("trace");
    assert_eq!(count, 1);
    assert_eq!(
        output(out),
        "[stream_state 1970-01-01T00:00:00.000Z] a b\n"
    );
}
