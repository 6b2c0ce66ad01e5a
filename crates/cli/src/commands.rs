// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command handlers: build a `Coordinator`, dispatch on the subcommand,
//! print the result with `anyhow::Result` propagating failures up to
//! `main`'s exit-code handling.

use std::sync::Arc;

use flotilla_core::event::CoordinatorEvent;
use flotilla_core::workstream::WorkstreamId;
use flotilla_coordinator::{Coordinator, CoordinatorConfig};
use flotilla_transport::{HttpSseTransport, TransportClient};
use flotilla_worktree::GitWorktreeProvider;

use crate::exit_error::ExitError;
use crate::output::{self, OutputFormat};
use crate::{Cli, Command};

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let repo_path = cli.repo_path.canonicalize().unwrap_or(cli.repo_path.clone());
    let config = CoordinatorConfig {
        server_base_url: cli.server_base_url.clone(),
        repo_path,
        use_worktrees: !cli.no_worktrees,
    };
    let worktree = Arc::new(GitWorktreeProvider::new(config.repo_path.clone()));
    let base_url = cli.server_base_url.clone();
    let coordinator =
        Coordinator::new(config, worktree, move || Arc::new(HttpSseTransport::new(base_url.clone())) as Arc<dyn TransportClient>);

    match cli.command {
        Command::Create { name, task } => {
            let id = coordinator
                .create_workstream(&name, &task)
                .await
                .map_err(|e| ExitError::new(1, format!("failed to create workstream: {e}")))?;
            println!("{}", id.as_str());
        }
        Command::Start { id } => {
            coordinator
                .start_task(parse_id(&id))
                .await
                .map_err(|e| ExitError::new(1, format!("failed to start task: {e}")))?;
        }
        Command::Prompt { id, text } => {
            coordinator
                .send_prompt(parse_id(&id), &text)
                .await
                .map_err(|e| ExitError::new(1, format!("failed to send prompt: {e}")))?;
        }
        Command::Respond { id, option_id } => {
            coordinator
                .respond_to_permission(parse_id(&id), &option_id)
                .map_err(|e| ExitError::new(1, format!("failed to respond to permission: {e}")))?;
        }
        Command::Pause { id } => {
            coordinator
                .pause_workstream(parse_id(&id))
                .map_err(|e| ExitError::new(1, format!("failed to pause: {e}")))?;
        }
        Command::Resume { id } => {
            coordinator
                .resume_workstream(parse_id(&id))
                .map_err(|e| ExitError::new(1, format!("failed to resume: {e}")))?;
        }
        Command::Stop { id, cleanup } => {
            coordinator.stop_workstream(parse_id(&id), cleanup).await;
        }
        Command::List => {
            output::print_workstream_list(&coordinator.get_all_workstreams(), cli.format)?;
        }
        Command::Show { id } => {
            let workstream = coordinator
                .get_workstream(parse_id(&id))
                .ok_or_else(|| ExitError::new(1, format!("no workstream with id {id}")))?;
            output::print_workstream(&workstream, cli.format)?;
        }
        Command::Diff { id } => {
            print!("{}", coordinator.get_workstream_diff(parse_id(&id)).await);
        }
        Command::Status { id } => {
            print!("{}", coordinator.get_workstream_status(parse_id(&id)).await);
        }
        Command::Commit { id, message } => {
            let committed = coordinator.commit_workstream_changes(parse_id(&id), &message).await;
            if !committed {
                return Err(ExitError::new(1, "commit failed or nothing to commit").into());
            }
        }
        Command::Watch => watch(&coordinator, cli.format).await,
    }

    Ok(())
}

fn parse_id(raw: &str) -> WorkstreamId {
    WorkstreamId::from_string(raw)
}

async fn watch<C: flotilla_core::Clock + 'static>(coordinator: &Arc<Coordinator<C>>, format: OutputFormat) {
    let _subscription = coordinator.subscribe(Arc::new(move |id, event| {
        print_event(id, &event, format);
    }));
    println!("{}", crate::color::muted("watching for workstream events, press ctrl-c to stop"));
    let _ = tokio::signal::ctrl_c().await;
}

fn print_event(id: WorkstreamId, event: &CoordinatorEvent, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            if let Ok(body) = serde_json::to_string(event) {
                println!(r#"{{"workstreamId":"{}","event":{}}}"#, id.as_str(), body);
            }
        }
        OutputFormat::Text => match event {
            CoordinatorEvent::Message { message } => {
                println!("{} {}: {}", crate::color::context(id.as_str()), message.role, message.content)
            }
            CoordinatorEvent::StateChanged { state, activity } => {
                println!("{} [{}] {}", crate::color::context(id.as_str()), state, activity)
            }
            CoordinatorEvent::ToolCall { tool } => {
                println!("{} tool started: {}", crate::color::context(id.as_str()), tool.title)
            }
            CoordinatorEvent::ToolUpdate { tool, removed } => {
                let suffix = if *removed { " (done)" } else { "" };
                println!("{} tool {}: {}{}", crate::color::context(id.as_str()), tool.status, tool.title, suffix)
            }
            CoordinatorEvent::PermissionRequest { tool_title, options, .. } => {
                let choices: Vec<_> = options.iter().map(|o| o.id.as_str()).collect();
                println!(
                    "{} permission needed for \"{}\" [{}]",
                    crate::color::error(id.as_str()),
                    tool_title,
                    choices.join(", ")
                )
            }
            CoordinatorEvent::Notification { notification } => {
                println!("{} notification: {}", crate::color::context(id.as_str()), notification.title)
            }
            CoordinatorEvent::Error { message } => {
                println!("{} error: {}", crate::color::error(id.as_str()), message)
            }
        },
    }
}
