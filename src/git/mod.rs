//! Git Reconciler
//!
//! Captures repository state and manages checkpoints by driving the `git`
//! binary. Git stays the source of truth; nothing here caches repository state.

pub mod conflicts;
pub mod shell;
pub mod stash;
pub mod status;
#[cfg(test)]
pub(crate) mod testing;

pub use shell::ShellGit;

use crate::error::ApiError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Kind of change git reports for one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatusKind {
    Modified,
    Added,
    Deleted,
    Renamed,
    Copied,
    Untracked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitFileStatus {
    pub path: String,
    /// Source path of a rename or copy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orig_path: Option<String>,
    pub kind: FileStatusKind,
    pub staged: bool,
}

/// Parsed working tree status. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitStatus {
    pub files: Vec<GitFileStatus>,
    pub is_dirty: bool,
}

impl GitStatus {
    pub fn from_files(files: Vec<GitFileStatus>) -> Self {
        let is_dirty = files
            .iter()
            .any(|f| f.staged || f.kind != FileStatusKind::Untracked);
        Self { files, is_dirty }
    }

    fn paths_where(&self, pred: impl Fn(&GitFileStatus) -> bool) -> Vec<&str> {
        self.files
            .iter()
            .filter(|f| pred(f))
            .map(|f| f.path.as_str())
            .collect()
    }

    pub fn new_files(&self) -> Vec<&str> {
        self.paths_where(|f| f.kind == FileStatusKind::Added)
    }

    /// Modified, renamed and copied paths.
    pub fn modified_files(&self) -> Vec<&str> {
        self.paths_where(|f| {
            matches!(
                f.kind,
                FileStatusKind::Modified | FileStatusKind::Renamed | FileStatusKind::Copied
            )
        })
    }

    pub fn deleted_files(&self) -> Vec<&str> {
        self.paths_where(|f| f.kind == FileStatusKind::Deleted)
    }

    pub fn untracked_files(&self) -> Vec<&str> {
        self.paths_where(|f| f.kind == FileStatusKind::Untracked)
    }

    pub fn is_clean(&self) -> bool {
        self.files.is_empty()
    }
}

/// One entry of the repository's stash list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StashEntry {
    /// Commit hash of the stash
    pub id: String,
    /// Reflog name such as `stash@{0}`
    pub reference: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Not derivable from the stash list; always `unknown`
    pub branch: String,
}

/// Result of a checkpoint attempt. Failure here is an outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StashOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stash_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StashOutcome {
    pub fn created(entry: &StashEntry) -> Self {
        Self {
            success: true,
            stash_id: Some(entry.id.clone()),
            reference: Some(entry.reference.clone()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            stash_id: None,
            reference: None,
            error: Some(error.into()),
        }
    }
}

/// Result of reapplying a checkpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyOutcome {
    /// Paths still containing conflict markers
    pub conflicts: Vec<String>,
}

/// Operations against one repository, addressed by path on every call.
#[async_trait]
pub trait GitClient: Send + Sync {
    async fn is_repository(&self, repo: &Path) -> bool;

    /// Current branch name, or `HEAD` when detached.
    async fn current_branch(&self, repo: &Path) -> Result<String, ApiError>;

    async fn current_commit(&self, repo: &Path) -> Result<String, ApiError>;

    async fn repository_root(&self, repo: &Path) -> Result<PathBuf, ApiError>;

    async fn status(&self, repo: &Path) -> Result<GitStatus, ApiError>;

    async fn has_changes(&self, repo: &Path) -> Result<bool, ApiError> {
        Ok(!self.status(repo).await?.is_clean())
    }

    /// Whether both `user.name` and `user.email` resolve to non-empty values.
    async fn is_configured(&self, repo: &Path) -> Result<bool, ApiError>;

    /// Stage everything and commit. Returns the new commit hash.
    async fn commit_changes(&self, repo: &Path, message: &str) -> Result<String, ApiError>;

    async fn create_stash(
        &self,
        repo: &Path,
        message: Option<&str>,
    ) -> Result<StashOutcome, ApiError>;

    /// Apply a stash by hash or reference and report conflicted files.
    async fn apply_stash(&self, repo: &Path, id: &str) -> Result<ApplyOutcome, ApiError>;

    async fn list_stashes(&self, repo: &Path) -> Result<Vec<StashEntry>, ApiError>;

    async fn delete_stash(&self, repo: &Path, id: &str) -> Result<(), ApiError>;

    async fn checkout(&self, repo: &Path, branch: &str) -> Result<(), ApiError>;

    /// Throw away tracked changes (`reset --hard HEAD`).
    async fn discard_changes(&self, repo: &Path) -> Result<(), ApiError>;
}
