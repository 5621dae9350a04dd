//! Session use cases: capture, edit, look up, export and import.

use super::domain::{FileState, GitSnapshot, Session};
use super::repository::SessionRepository;
use crate::config::preferences::PreferencesRepository;
use crate::error::{ApiError, StorageError};
use crate::git::GitClient;
use crate::project::{normalize_root, root_key};
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Input for [`SessionService::save`].
#[derive(Debug, Clone, Default)]
pub struct SaveSessionRequest {
    pub name: String,
    pub project_root: PathBuf,
    pub tags: Vec<String>,
    pub notes: Option<String>,
    pub files: Vec<FileState>,
    pub extensions: BTreeMap<String, serde_json::Value>,
    /// Checkpoint a dirty tree; `None` follows the preference
    pub auto_stash: Option<bool>,
}

/// Mutable session fields. `id`, `name` and `createdAt` never change.
#[derive(Debug, Clone, Default)]
pub struct SessionUpdate {
    pub tags: Option<Vec<String>>,
    pub notes: Option<Option<String>>,
    pub files: Option<Vec<FileState>>,
    /// Merged into the existing map; a `null` value removes the key
    pub extensions: BTreeMap<String, serde_json::Value>,
}

pub struct SessionService {
    repo: SessionRepository,
    git: Arc<dyn GitClient>,
    preferences: PreferencesRepository,
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

impl SessionService {
    pub fn new(
        repo: SessionRepository,
        git: Arc<dyn GitClient>,
        preferences: PreferencesRepository,
    ) -> Self {
        Self {
            repo,
            git,
            preferences,
        }
    }

    async fn capture_git(
        &self,
        root: &Path,
        name: &str,
        auto_stash: bool,
    ) -> Result<Option<GitSnapshot>, ApiError> {
        if !self.git.is_repository(root).await {
            return Ok(None);
        }
        let branch = self.git.current_branch(root).await?;
        let commit = self.git.current_commit(root).await?;
        let status = self.git.status(root).await?;

        let mut stash_id = None;
        if status.is_dirty && auto_stash {
            let outcome = self
                .git
                .create_stash(root, Some(&format!("devsnap session {}", name)))
                .await?;
            if outcome.success {
                stash_id = outcome.stash_id;
            } else {
                warn!(
                    session = name,
                    "Could not checkpoint dirty tree: {}",
                    outcome.error.as_deref().unwrap_or("unknown error")
                );
            }
        }

        Ok(Some(GitSnapshot {
            branch,
            commit,
            is_dirty: status.is_dirty,
            stash_id,
        }))
    }

    /// Capture the project's state under a new, unique name.
    pub async fn save(&self, request: SaveSessionRequest) -> Result<Session, ApiError> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::ValidationError(
                "Session name cannot be empty".to_string(),
            ));
        }
        if self.repo.find_by_name(&name)?.is_some() {
            return Err(ApiError::DuplicateEntity(format!("session '{}'", name)));
        }
        let root = normalize_root(&request.project_root)?;
        let auto_stash = match request.auto_stash {
            Some(flag) => flag,
            None => self.preferences.load()?.auto_stash_on_save,
        };

        let now = Utc::now();
        let mut session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            project_root: root,
            created_at: now,
            updated_at: now,
            tags: clean_tags(request.tags),
            notes: request.notes.filter(|n| !n.trim().is_empty()),
            files: request.files,
            git: None,
            extensions: request.extensions,
        };
        // Checked before any checkpoint exists.
        session.validate().map_err(ApiError::ValidationError)?;

        session.git = self
            .capture_git(Path::new(&session.project_root), &session.name, auto_stash)
            .await?;
        if let Err(e) = self.repo.save(&session) {
            if let Some(stash_id) = session.git.as_ref().and_then(|g| g.stash_id.as_deref()) {
                warn!(session = %session.name, stash = stash_id, "Session not saved; checkpoint left in the stash list");
            }
            return Err(e);
        }
        info!(session = %session.name, id = %session.id, "Saved session");
        Ok(session)
    }

    pub fn update(&self, id_or_name: &str, update: SessionUpdate) -> Result<Session, ApiError> {
        let mut session = self.get(id_or_name)?;
        if let Some(tags) = update.tags {
            session.tags = clean_tags(tags);
        }
        if let Some(notes) = update.notes {
            session.notes = notes.filter(|n| !n.trim().is_empty());
        }
        if let Some(files) = update.files {
            session.files = files;
        }
        for (key, value) in update.extensions {
            if value.is_null() {
                session.extensions.remove(&key);
            } else {
                session.extensions.insert(key, value);
            }
        }
        session.updated_at = Utc::now().max(session.created_at);
        session.validate().map_err(ApiError::ValidationError)?;
        self.repo.save(&session)?;
        Ok(session)
    }

    /// Look a session up by id, then by name.
    pub fn get(&self, id_or_name: &str) -> Result<Session, ApiError> {
        if let Some(session) = self.repo.get(id_or_name)? {
            return Ok(session);
        }
        self.repo
            .find_by_name(id_or_name)?
            .ok_or_else(|| ApiError::NotFound(format!("session '{}'", id_or_name)))
    }

    /// Sessions newest first, optionally limited to one project root.
    pub fn list(&self, project_root: Option<&Path>) -> Result<Vec<Session>, ApiError> {
        let filter = project_root.map(root_key);
        let mut sessions: Vec<Session> = self
            .repo
            .list()?
            .into_iter()
            .filter(|s| filter.as_ref().map_or(true, |root| &s.project_root == root))
            .collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    pub fn delete(&self, id_or_name: &str) -> Result<Session, ApiError> {
        let session = self.get(id_or_name)?;
        self.repo.delete(&session.id)?;
        info!(session = %session.name, "Deleted session");
        Ok(session)
    }

    /// Write a session as pretty JSON to `path`.
    pub fn export(&self, id_or_name: &str, path: &Path) -> Result<Session, ApiError> {
        let session = self.get(id_or_name)?;
        let json = serde_json::to_vec_pretty(&session).map_err(StorageError::from)?;
        std::fs::write(path, json).map_err(|e| StorageError::io(path, e))?;
        Ok(session)
    }

    /// Read a session exported elsewhere. Invalid content is reported, never repaired.
    pub fn import(&self, path: &Path) -> Result<Session, ApiError> {
        let bytes = std::fs::read(path).map_err(|e| StorageError::io(path, e))?;
        let session: Session =
            serde_json::from_slice(&bytes).map_err(|e| StorageError::SchemaInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        session.validate().map_err(|reason| StorageError::SchemaInvalid {
            path: path.to_path_buf(),
            reason,
        })?;

        if self.repo.get(&session.id)?.is_some() {
            return Err(ApiError::DuplicateEntity(format!("session id {}", session.id)));
        }
        if self.repo.find_by_name(&session.name)?.is_some() {
            return Err(ApiError::DuplicateEntity(format!("session '{}'", session.name)));
        }
        self.repo.save(&session)?;
        info!(session = %session.name, "Imported session");
        Ok(session)
    }
}
