//! MergeService: orchestrates sources, applies merge policy, deserializes to DevsnapConfig.

use crate::config::sources::{environment, global_file};
use crate::config::DevsnapConfig;
use crate::error::ApiError;
use config::File;
use std::path::Path;

use super::merge_policy;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Precedence: defaults (lowest) -> global file -> explicit file -> environment (highest).
    pub fn load(explicit: Option<&Path>) -> Result<DevsnapConfig, ApiError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = match explicit {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder,
        };
        let builder = environment::add_to_builder(builder)?;

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devsnap.toml");
        std::fs::write(
            &path,
            "[scripts]\ntimeout_ms = 1234\n\n[storage]\nroot = \"/tmp/devsnap-test\"\n",
        )
        .unwrap();

        let config = MergeService::load(Some(&path)).unwrap();
        assert_eq!(config.scripts.timeout_ms, 1234);
        assert_eq!(config.scripts.script_delay_ms, 500);
        assert_eq!(
            config.storage.root.as_deref(),
            Some(Path::new("/tmp/devsnap-test"))
        );
        assert!(!config.storage.encryption.enabled);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(MergeService::load(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
