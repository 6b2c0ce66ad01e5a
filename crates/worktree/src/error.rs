// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Internal failure detail for [`crate::provider::GitWorktreeProvider`].
//!
//! Every *public* operation on [`WorkingCopyProvider`] returns a falsy/empty result on
//! failure rather than propagating an error type -- the coordinator decides
//! policy. This enum exists only so the implementation can log a reason
//! before collapsing it to that falsy result.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorktreeError {
    #[error("not a git repository")]
    NotManaged,
    #[error("git {args:?} failed: {stderr}")]
    GitFailed { args: Vec<String>, stderr: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
