//! Shared fixtures: throwaway git repositories and isolated configs.

use devsnap::config::DevsnapConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

pub fn git(repo: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A repository on branch `main` with one commit containing `README.md`.
pub fn init_repo(dir: &Path) -> PathBuf {
    git(dir, &["init", "-q"]);
    git(dir, &["checkout", "-q", "-b", "main"]);
    git(dir, &["config", "user.name", "Devsnap Test"]);
    git(dir, &["config", "user.email", "test@devsnap.invalid"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
    fs::write(dir.join("README.md"), "hello\n").unwrap();
    git(dir, &["add", "."]);
    git(dir, &["commit", "-q", "-m", "initial"]);
    dunce::canonicalize(dir).unwrap()
}

/// Config whose store lives under `store_root`.
pub fn config_with_store(store_root: &Path) -> DevsnapConfig {
    let mut config = DevsnapConfig::default();
    config.storage.root = Some(store_root.to_path_buf());
    config.scripts.script_delay_ms = 0;
    config
}
