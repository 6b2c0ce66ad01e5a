// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The working-copy provider (C3): create a managed sub-directory, shell
//! out to `git worktree add`, and report success or failure back to the
//! caller directly rather than emitting an event onto a channel -- the
//! coordinator awaits `create`/`remove` and gets its answer inline, with
//! failure collapsing straight to the documented falsy return values.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::WorktreeError;

/// The managed sub-directory every worktree lives under, relative to the
/// repo root.
pub const WORKTREE_DIR: &str = ".goose-worktrees";
const BRANCH_PREFIX: &str = "goose/";
const DIFF_CAP_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingCopy {
    pub path: PathBuf,
    pub branch: String,
    pub commit: String,
}

#[async_trait]
pub trait WorkingCopyProvider: Send + Sync {
    /// `false` means "not a managed repository" -- the coordinator must
    /// then elide worktree creation and run all workstreams in the single
    /// shared checkout.
    async fn is_available(&self) -> bool;

    /// Creates the managed sub-directory and appends an ignore-file entry
    /// if one isn't already present. Best-effort; not atomic across
    /// concurrent processes (documented limitation).
    async fn ensure(&self);

    /// Idempotent: an existing working copy under `name` is forcibly
    /// removed and recreated. Returns `None` on any failure.
    async fn create(&self, name: &str, base_branch: Option<&str>) -> Option<WorkingCopy>;

    async fn remove(&self, name: &str);

    async fn list(&self) -> Vec<WorkingCopy>;

    /// Capped at 10 MiB; larger diffs yield `""`, never an error.
    async fn diff(&self, path: &Path) -> String;

    async fn status(&self, path: &Path) -> String;

    async fn commit(&self, path: &Path, message: &str) -> bool;
}

/// Git-backed implementation rooted at a single source repository.
pub struct GitWorktreeProvider {
    repo_root: PathBuf,
}

impl GitWorktreeProvider {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self { repo_root: repo_root.into() }
    }

    fn worktrees_dir(&self) -> PathBuf {
        self.repo_root.join(WORKTREE_DIR)
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.worktrees_dir().join(name)
    }

    fn branch_for(name: &str) -> String {
        format!("{BRANCH_PREFIX}{name}")
    }

    async fn run_git(&self, args: &[&str]) -> Result<String, WorktreeError> {
        let output = Command::new("git").arg("-C").arg(&self.repo_root).args(args).output().await?;
        if !output.status.success() {
            return Err(WorktreeError::GitFailed {
                args: args.iter().map(|s| s.to_string()).collect(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn current_branch(&self) -> String {
        self.run_git(&["rev-parse", "--abbrev-ref", "HEAD"]).await.unwrap_or_else(|_| "main".to_string())
    }

    async fn head_commit(&self, cwd: &Path) -> String {
        let output = Command::new("git").arg("-C").arg(cwd).args(["rev-parse", "HEAD"]).output().await;
        match output {
            Ok(o) if o.status.success() => String::from_utf8_lossy(&o.stdout).trim().to_string(),
            _ => String::new(),
        }
    }

    async fn create_inner(&self, name: &str, base_branch: Option<&str>) -> Result<WorkingCopy, WorktreeError> {
        let path = self.path_for(name);
        let branch = Self::branch_for(name);

        // Idempotent: force-remove any existing worktree under this name first.
        let _ = self.run_git(&["worktree", "remove", "--force", path.to_str().unwrap_or_default()]).await;
        tokio::fs::remove_dir_all(&path).await.ok();

        tokio::fs::create_dir_all(self.worktrees_dir()).await?;

        let base = match base_branch {
            Some(b) => b.to_string(),
            None => self.current_branch().await,
        };

        // Branch-create failure (e.g. it already exists) is ignored -- `git
        // worktree add -b` on an existing branch name fails, so fall back
        // to attaching the worktree to the existing branch instead.
        let path_str = path.to_str().ok_or_else(|| WorktreeError::GitFailed {
            args: vec!["worktree".to_string(), "add".to_string()],
            stderr: "non-utf8 path".to_string(),
        })?;
        if self.run_git(&["worktree", "add", "-b", &branch, path_str, &base]).await.is_err() {
            self.run_git(&["worktree", "add", path_str, &branch]).await?;
        }

        let commit = self.head_commit(&path).await;
        Ok(WorkingCopy { path, branch, commit })
    }
}

#[async_trait]
impl WorkingCopyProvider for GitWorktreeProvider {
    async fn is_available(&self) -> bool {
        self.run_git(&["rev-parse", "--is-inside-work-tree"]).await.map(|s| s == "true").unwrap_or(false)
    }

    async fn ensure(&self) {
        if tokio::fs::create_dir_all(self.worktrees_dir()).await.is_err() {
            return;
        }
        let gitignore = self.repo_root.join(".gitignore");
        let existing = tokio::fs::read_to_string(&gitignore).await.unwrap_or_default();
        let entry = format!("{WORKTREE_DIR}/");
        if existing.lines().any(|l| l.trim() == entry) {
            return;
        }
        let mut contents = existing;
        if !contents.is_empty() && !contents.ends_with('\n') {
            contents.push('\n');
        }
        contents.push_str(&entry);
        contents.push('\n');
        let _ = tokio::fs::write(&gitignore, contents).await;
    }

    async fn create(&self, name: &str, base_branch: Option<&str>) -> Option<WorkingCopy> {
        match self.create_inner(name, base_branch).await {
            Ok(wc) => Some(wc),
            Err(e) => {
                tracing::warn!(name, error = %e, "failed to create working copy");
                None
            }
        }
    }

    async fn remove(&self, name: &str) {
        let path = self.path_for(name);
        if let Err(e) = self.run_git(&["worktree", "remove", "--force", &path.to_string_lossy()]).await {
            tracing::warn!(name, error = %e, "failed to remove worktree, cleaning up directory only");
        }
        tokio::fs::remove_dir_all(&path).await.ok();
    }

    async fn list(&self) -> Vec<WorkingCopy> {
        let Ok(output) = self.run_git(&["worktree", "list", "--porcelain"]).await else {
            return Vec::new();
        };
        let mut result = Vec::new();
        let mut path: Option<PathBuf> = None;
        let mut commit = String::new();
        let mut branch = String::new();
        for line in output.lines() {
            if let Some(p) = line.strip_prefix("worktree ") {
                if let Some(prev) = path.take() {
                    if prev.starts_with(self.worktrees_dir()) {
                        result.push(WorkingCopy { path: prev, branch: branch.clone(), commit: commit.clone() });
                    }
                }
                path = Some(PathBuf::from(p));
                branch.clear();
                commit.clear();
            } else if let Some(c) = line.strip_prefix("HEAD ") {
                commit = c.to_string();
            } else if let Some(b) = line.strip_prefix("branch refs/heads/") {
                branch = b.to_string();
            }
        }
        if let Some(prev) = path {
            if prev.starts_with(self.worktrees_dir()) {
                result.push(WorkingCopy { path: prev, branch, commit });
            }
        }
        result
    }

    async fn diff(&self, path: &Path) -> String {
        let Ok(output) = Command::new("git").arg("-C").arg(path).arg("diff").output().await else {
            return String::new();
        };
        if !output.status.success() || output.stdout.len() > DIFF_CAP_BYTES {
            return String::new();
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    async fn status(&self, path: &Path) -> String {
        let Ok(output) = Command::new("git").arg("-C").arg(path).args(["status", "--short"]).output().await else {
            return String::new();
        };
        if !output.status.success() {
            return String::new();
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    async fn commit(&self, path: &Path, message: &str) -> bool {
        let add = Command::new("git").arg("-C").arg(path).args(["add", "-A"]).status().await;
        if !matches!(add, Ok(s) if s.success()) {
            return false;
        }
        let commit = Command::new("git").arg("-C").arg(path).args(["commit", "-m", message]).status().await;
        matches!(commit, Ok(s) if s.success())
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
