//! Project root normalization.
//!
//! Scripts and sessions are keyed by the textual form of a project root, so
//! every entry point funnels paths through here before touching storage.

use crate::error::ApiError;
use std::path::Path;

/// Canonical form of an existing project directory.
pub fn normalize_root(path: &Path) -> Result<String, ApiError> {
    let canonical = dunce::canonicalize(path).map_err(|_| {
        ApiError::ValidationError(format!("Project root does not exist: {}", path.display()))
    })?;
    if !canonical.is_dir() {
        return Err(ApiError::ValidationError(format!(
            "Project root is not a directory: {}",
            canonical.display()
        )));
    }
    Ok(canonical.to_string_lossy().into_owned())
}

/// Key for looking up a root that may no longer exist on disk.
pub fn root_key(path: &Path) -> String {
    dunce::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_requires_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();

        assert!(normalize_root(dir.path()).is_ok());
        assert!(matches!(
            normalize_root(&file),
            Err(ApiError::ValidationError(_))
        ));
        assert!(normalize_root(&dir.path().join("gone")).is_err());
    }

    #[test]
    fn root_key_matches_normalized_form_for_existing_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a");
        std::fs::create_dir(&nested).unwrap();
        let dotted = dir.path().join("a").join(".");
        assert_eq!(root_key(&dotted), normalize_root(&nested).unwrap());
        assert_eq!(root_key(Path::new("/no/such/root")), "/no/such/root");
    }
}
