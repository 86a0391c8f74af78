//! Unit tests for langgraph-chat-cli, organized by module.
//!
//! Each submodule documents the behaviour under test.

mod run;
