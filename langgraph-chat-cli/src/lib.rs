//! langgraph-chat-cli library: chat turns, thread commands and trace rendering for the binary.
//!
//! Reads the LangGraph connection from env / .env, or runs against the in-memory mock backend.
//!
//! ## Usage
//!
//! ```rust,no_run,ignore
//! let config = langgraph_chat_cli::CliConfig::from_env(RunOptions::default())?;
//! let backend = langgraph_chat_cli::build_backend(&config)?;
//! langgraph_chat_cli::run_chat(backend, &config, "hello", &mut std::io::stdout()).await?;
//! ```

mod config;
mod render;
mod run;

pub use config::{CliConfig, Error, RunOptions};
pub use render::{render_message, render_record, render_trace};
pub use run::{build_backend, parse_events, run_chat, run_threads, run_trace, ThreadsCommand};

#[cfg(test)]
mod tests;
