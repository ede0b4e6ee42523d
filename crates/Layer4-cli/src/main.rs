//! Orca CLI - Main entry point

mod app;
mod cli;
mod render;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Orca - coding agent with reviewed actions and sub-agents
#[derive(Parser, Debug)]
#[command(name = "orca")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Prompt to run; without one, read prompts from stdin
    prompt: Option<String>,

    /// Scripted model responses (JSON array of turns)
    #[arg(short, long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Project directory (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout is the conversation
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let working_dir = match args.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    let mut app = app::App::build(working_dir, args.script.as_deref())?;

    let result = match args.prompt {
        Some(prompt) => cli::run_once(&mut app, &prompt).await,
        None => cli::repl(&mut app).await,
    };

    app.shutdown().await;
    result
}
