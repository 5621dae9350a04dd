//! Conflict marker detection after a stash apply.

use super::{FileStatusKind, GitStatus};
use std::path::Path;

/// Whether `content` carries a full set of conflict markers.
pub fn has_conflict_markers(content: &str) -> bool {
    let mut ours = false;
    let mut sep = false;
    for line in content.lines() {
        if line.starts_with("<<<<<<<") {
            ours = true;
        } else if ours && line.trim_end() == "=======" {
            sep = true;
        } else if sep && line.starts_with(">>>>>>>") {
            return true;
        }
    }
    false
}

/// Scan modified files of `status` under `root` for conflict markers.
///
/// Unreadable files are skipped.
pub fn scan(root: &Path, status: &GitStatus) -> Vec<String> {
    status
        .files
        .iter()
        .filter(|f| {
            matches!(
                f.kind,
                FileStatusKind::Modified | FileStatusKind::Added | FileStatusKind::Renamed
            )
        })
        .filter(|f| {
            std::fs::read(root.join(&f.path))
                .map(|bytes| has_conflict_markers(&String::from_utf8_lossy(&bytes)))
                .unwrap_or(false)
        })
        .map(|f| f.path.clone())
        .collect()
}
