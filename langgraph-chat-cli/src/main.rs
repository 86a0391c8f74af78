//! langgraph-chat binary: chat with a LangGraph agent, manage threads, render debug traces.

use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use langgraph_chat::{load_dotenv, SystemClock};
use langgraph_chat_cli::{
    build_backend, run_chat, run_threads, run_trace, CliConfig, RunOptions, ThreadsCommand,
};

#[derive(Parser, Debug)]
#[command(name = "langgraph-chat")]
#[command(about = "Chat with a LangGraph agent server")]
struct Args {
    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use the in-memory mock backend instead of a server
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send one message and stream the reply
    Chat {
        /// User message (also accepted as positional words)
        #[arg(short, long, value_name = "TEXT")]
        message: Option<String>,

        /// Continue an existing thread
        #[arg(long, value_name = "ID")]
        thread_id: Option<String>,

        /// Print the consolidated debug trace after the reply
        #[arg(long)]
        debug: bool,

        /// Positional words: user message (when -m/--message is not used)
        #[arg(trailing_var_arg = true)]
        rest: Vec<String>,
    },
    /// Manage threads of the configured graph
    Threads {
        #[command(subcommand)]
        action: ThreadsAction,
    },
    /// Consolidate a raw event log (JSON array or JSON lines); reads stdin without FILE
    Trace { file: Option<PathBuf> },
}

#[derive(Subcommand, Debug)]
enum ThreadsAction {
    List,
    Create,
    History { thread_id: String },
    Delete { thread_id: String },
    DeleteAll,
}

impl From<ThreadsAction> for ThreadsCommand {
    fn from(action: ThreadsAction) -> Self {
        match action {
            ThreadsAction::List => ThreadsCommand::List,
            ThreadsAction::Create => ThreadsCommand::Create,
            ThreadsAction::History { thread_id } => ThreadsCommand::History(thread_id),
            ThreadsAction::Delete { thread_id } => ThreadsCommand::Delete(thread_id),
            ThreadsAction::DeleteAll => ThreadsCommand::DeleteAll,
        }
    }
}

fn get_message(message: Option<String>, rest: &[String]) -> String {
    if let Some(m) = message {
        return m;
    }
    rest.join(" ").trim().to_string()
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();
    load_dotenv();
    init_tracing(args.verbose);

    let mut stdout = std::io::stdout();
    match args.command {
        Command::Trace { file } => {
            let input = match file {
                Some(path) => std::fs::read_to_string(path)?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            if run_trace(&input, &SystemClock, &mut stdout)? == 0 {
                eprintln!("no events");
            }
        }
        Command::Chat {
            message,
            thread_id,
            debug,
            rest,
        } => {
            let input = get_message(message, &rest);
            if input.is_empty() {
                eprintln!("error: no message given");
                std::process::exit(2);
            }
            let config = CliConfig::from_env(RunOptions {
                thread_id,
                debug,
                verbose: args.verbose,
                mock: args.mock,
            })?;
            let backend = build_backend(&config)?;
            if run_chat(backend, &config, &input, &mut stdout).await?.is_none() {
                eprintln!("no reply");
                std::process::exit(1);
            }
        }
        Command::Threads { action } => {
            let config = CliConfig::from_env(RunOptions {
                verbose: args.verbose,
                mock: args.mock,
                ..RunOptions::default()
            })?;
            let backend = build_backend(&config)?;
            run_threads(backend, &config, action.into(), &mut stdout).await?;
        }
    }
    Ok(())
}
