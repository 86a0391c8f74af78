//! Per-invocation options taken from command-line flags.
//!
//! Combined with the env-based connection settings in [`CliConfig`](super::CliConfig).

/// Options for one CLI invocation. All default to off / unset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunOptions {
    /// Continue this thread instead of creating a new one.
    pub thread_id: Option<String>,
    /// Print the consolidated debug trace after a chat turn.
    pub debug: bool,
    /// Debug-level logging on stderr.
    pub verbose: bool,
    /// Use the in-memory mock backend; no server or env config needed.
    pub mock: bool,
}
