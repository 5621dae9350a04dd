//! Session domain types: the saved snapshot and its file and git parts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorPosition {
    pub line: u32,
    pub column: u32,
}

/// An open editor file at save time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileState {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<CursorPosition>,
    /// First visible line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll: Option<u32>,
    #[serde(default)]
    pub is_active: bool,
}

/// Repository state captured with a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitSnapshot {
    pub branch: String,
    pub commit: String,
    pub is_dirty: bool,
    /// Checkpoint holding the dirty changes; may have been dropped since.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stash_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub name: String,
    pub project_root: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub files: Vec<FileState>,
    /// Absent when the project is not a git repository
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitSnapshot>,
    #[serde(default)]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl Session {
    /// Check fields that serde cannot.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.is_empty()
            || !self
                .id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(format!("Invalid session id '{}'", self.id));
        }
        if self.name.trim().is_empty() {
            return Err("Session name cannot be empty".to_string());
        }
        if self.project_root.trim().is_empty() {
            return Err(format!("Session '{}' has no project root", self.name));
        }
        if self.updated_at < self.created_at {
            return Err(format!(
                "Session '{}' was updated before it was created",
                self.name
            ));
        }
        if self.files.iter().filter(|f| f.is_active).count() > 1 {
            return Err(format!("Session '{}' has more than one active file", self.name));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_minimal_record_with_defaults() {
        let json = serde_json::json!({
            "id": "abc",
            "name": "morning",
            "projectRoot": "/work/app",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-02T00:00:00Z"
        });
        let session: Session = serde_json::from_value(json).unwrap();
        assert!(session.git.is_none());
        assert!(session.tags.is_empty());
        assert!(session.validate().is_ok());
    }

    #[test]
    fn git_snapshot_uses_camel_case() {
        let snapshot = GitSnapshot {
            branch: "main".to_string(),
            commit: "abc123".to_string(),
            is_dirty: true,
            stash_id: Some("deadbeef".to_string()),
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["isDirty"], true);
        assert_eq!(json["stashId"], "deadbeef");
    }
}
