//! In-memory [`GitClient`] for orchestration tests.

use super::{
    ApplyOutcome, FileStatusKind, GitClient, GitFileStatus, GitStatus, StashEntry, StashOutcome,
};
use crate::error::ApiError;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct FakeState {
    pub is_repo: bool,
    pub branch: String,
    pub commit: String,
    pub dirty: Vec<String>,
    pub stashes: Vec<StashEntry>,
    /// Conflicts reported by the next apply
    pub apply_conflicts: Vec<String>,
    /// Make checkpoint creation report a soft failure
    pub stash_fails: bool,
    pub calls: Vec<String>,
}

pub struct FakeGit {
    pub state: Mutex<FakeState>,
}

impl FakeGit {
    pub fn repo(branch: &str, commit: &str) -> Self {
        Self {
            state: Mutex::new(FakeState {
                is_repo: true,
                branch: branch.to_string(),
                commit: commit.to_string(),
                ..Default::default()
            }),
        }
    }

    pub fn not_a_repo() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.state.lock().calls.push(call.into());
    }

    fn ensure_repo(&self, repo: &Path) -> Result<(), ApiError> {
        if self.state.lock().is_repo {
            Ok(())
        } else {
            Err(ApiError::GitNotRepository(repo.to_path_buf()))
        }
    }
}

#[async_trait]
impl GitClient for FakeGit {
    async fn is_repository(&self, _repo: &Path) -> bool {
        self.record("is_repository");
        self.state.lock().is_repo
    }

    async fn current_branch(&self, repo: &Path) -> Result<String, ApiError> {
        self.ensure_repo(repo)?;
        Ok(self.state.lock().branch.clone())
    }

    async fn current_commit(&self, repo: &Path) -> Result<String, ApiError> {
        self.ensure_repo(repo)?;
        Ok(self.state.lock().commit.clone())
    }

    async fn repository_root(&self, repo: &Path) -> Result<PathBuf, ApiError> {
        self.ensure_repo(repo)?;
        Ok(repo.to_path_buf())
    }

    async fn status(&self, repo: &Path) -> Result<GitStatus, ApiError> {
        self.ensure_repo(repo)?;
        self.record("status");
        let files = self
            .state
            .lock()
            .dirty
            .iter()
            .map(|p| GitFileStatus {
                path: p.clone(),
                orig_path: None,
                kind: FileStatusKind::Modified,
                staged: false,
            })
            .collect();
        Ok(GitStatus::from_files(files))
    }

    async fn is_configured(&self, repo: &Path) -> Result<bool, ApiError> {
        self.ensure_repo(repo)?;
        Ok(true)
    }

    async fn commit_changes(&self, repo: &Path, message: &str) -> Result<String, ApiError> {
        self.ensure_repo(repo)?;
        self.record(format!("commit {}", message));
        let mut state = self.state.lock();
        state.dirty.clear();
        state.commit = format!("{}+", state.commit);
        Ok(state.commit.clone())
    }

    async fn create_stash(
        &self,
        repo: &Path,
        message: Option<&str>,
    ) -> Result<StashOutcome, ApiError> {
        self.ensure_repo(repo)?;
        self.record("create_stash");
        let mut state = self.state.lock();
        if state.stash_fails || state.dirty.is_empty() {
            return Ok(StashOutcome::failed("No local changes to save"));
        }
        let entry = StashEntry {
            id: format!("{:040}", state.stashes.len() + 1),
            reference: "stash@{0}".to_string(),
            message: message.unwrap_or("checkpoint").to_string(),
            timestamp: Utc::now(),
            branch: "unknown".to_string(),
        };
        state.dirty.clear();
        state.stashes.insert(0, entry.clone());
        Ok(StashOutcome::created(&entry))
    }

    async fn apply_stash(&self, repo: &Path, id: &str) -> Result<ApplyOutcome, ApiError> {
        self.ensure_repo(repo)?;
        self.record(format!("apply_stash {}", id));
        let state = self.state.lock();
        if !state.stashes.iter().any(|s| s.id == id || s.reference == id) {
            return Err(ApiError::NotFound(format!("stash {}", id)));
        }
        Ok(ApplyOutcome {
            conflicts: state.apply_conflicts.clone(),
        })
    }

    async fn list_stashes(&self, repo: &Path) -> Result<Vec<StashEntry>, ApiError> {
        self.ensure_repo(repo)?;
        Ok(self.state.lock().stashes.clone())
    }

    async fn delete_stash(&self, repo: &Path, id: &str) -> Result<(), ApiError> {
        self.ensure_repo(repo)?;
        let mut state = self.state.lock();
        let before = state.stashes.len();
        state.stashes.retain(|s| s.id != id && s.reference != id);
        if state.stashes.len() == before {
            return Err(ApiError::NotFound(format!("stash {}", id)));
        }
        Ok(())
    }

    async fn checkout(&self, repo: &Path, branch: &str) -> Result<(), ApiError> {
        self.ensure_repo(repo)?;
        self.record(format!("checkout {}", branch));
        self.state.lock().branch = branch.to_string();
        Ok(())
    }

    async fn discard_changes(&self, repo: &Path) -> Result<(), ApiError> {
        self.ensure_repo(repo)?;
        self.record("discard_changes");
        self.state.lock().dirty.clear();
        Ok(())
    }
}
