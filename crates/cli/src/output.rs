// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared rendering helpers for the command handlers in `commands.rs`.

use clap::ValueEnum;
use flotilla_core::workstream::Workstream;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn print_workstream(workstream: &Workstream, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            println!(
                "{}  {}  [{}]",
                crate::color::header(workstream.id.as_str()),
                workstream.name,
                workstream.state
            );
            println!("  {} {}", crate::color::muted("task:"), workstream.task);
            println!("  {} {}", crate::color::muted("activity:"), workstream.activity);
            if let Some(branch) = &workstream.branch_name {
                println!("  {} {}", crate::color::muted("branch:"), branch);
            }
            if !workstream.active_tools.is_empty() {
                println!("  {}", crate::color::muted("active tools:"));
                for tool in workstream.active_tools.values() {
                    println!("    - {} ({})", tool.title, tool.status);
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(workstream)?);
        }
    }
    Ok(())
}

pub fn print_workstream_list(workstreams: &[Workstream], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            if workstreams.is_empty() {
                println!("{}", crate::color::muted("no workstreams"));
                return Ok(());
            }
            for workstream in workstreams {
                println!(
                    "{}  {:<30}  {:<10}  {}",
                    crate::color::context(workstream.id.as_str()),
                    workstream.name,
                    workstream.state,
                    workstream.activity
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(workstreams)?);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
