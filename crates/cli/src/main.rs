// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `flotilla`: operate a workstream coordinator from a terminal.
//!
//! Thin wiring over `flotilla-coordinator` -- every subcommand opens a
//! fresh `Coordinator` against the configured server and repo, performs
//! one operation, and exits. `watch` is the exception: it stays attached
//! and streams events until interrupted.

mod color;
mod commands;
mod exit_error;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use exit_error::ExitError;
use output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "flotilla",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_GIT_HASH"), ")"),
    about = "Drive parallel AI coding-agent workstreams from the command line",
    styles = color::styles()
)]
pub struct Cli {
    /// Base URL of the agent's HTTP+SSE endpoint.
    #[arg(long, env = "FLOTILLA_SERVER_URL", default_value = "http://127.0.0.1:4096", global = true)]
    server_base_url: String,

    /// Repository the coordinator provisions git worktrees under.
    #[arg(long, env = "FLOTILLA_REPO_PATH", default_value = ".", global = true)]
    repo_path: PathBuf,

    /// Run every workstream directly in the shared checkout instead of an
    /// isolated worktree.
    #[arg(long, global = true)]
    no_worktrees: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a workstream (does not start the agent working yet).
    Create { name: String, task: String },
    /// Start the agent working on a workstream's task.
    Start { id: String },
    /// Send a follow-up prompt to a running workstream.
    Prompt { id: String, text: String },
    /// Answer a pending permission request.
    Respond { id: String, option_id: String },
    /// Pause a running workstream.
    Pause { id: String },
    /// Resume a paused workstream.
    Resume { id: String },
    /// Disconnect a workstream and forget it.
    Stop {
        id: String,
        /// Also remove its git worktree.
        #[arg(long)]
        cleanup: bool,
    },
    /// List every known workstream.
    List,
    /// Show one workstream in detail.
    Show { id: String },
    /// Print a workstream's uncommitted diff.
    Diff { id: String },
    /// Print a workstream's working-copy status.
    Status { id: String },
    /// Commit a workstream's uncommitted changes.
    Commit { id: String, message: String },
    /// Stream live events from every workstream until interrupted.
    Watch,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).with_target(false).init();

    let cli = Cli::parse();
    if let Err(err) = commands::run(cli).await {
        match err.downcast::<ExitError>() {
            Ok(exit_error) => {
                eprintln!("{} {}", color::error("error:"), exit_error.message);
                std::process::exit(exit_error.code);
            }
            Err(other) => {
                eprintln!("{} {other:#}", color::error("error:"));
                std::process::exit(1);
            }
        }
    }
}
