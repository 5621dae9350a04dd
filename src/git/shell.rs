//! [`GitClient`] backed by the `git` command line.

use super::{conflicts, stash, status, ApplyOutcome, GitClient, GitStatus, StashEntry, StashOutcome};
use crate::error::{ApiError, StorageError};
use crate::process::group;
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Raw result of one git invocation.
struct GitOutput {
    success: bool,
    stdout: String,
    stderr: String,
}

#[derive(Debug, Clone)]
pub struct ShellGit {
    timeout: Duration,
}

impl ShellGit {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn describe(args: &[&str]) -> String {
        format!("git {}", args.join(" "))
    }

    /// Run git and return its output whatever the exit status.
    async fn run_raw(&self, repo: &Path, args: &[&str]) -> Result<GitOutput, ApiError> {
        if !repo.is_dir() {
            return Err(ApiError::GitNotRepository(repo.to_path_buf()));
        }
        debug!(repo = %repo.display(), "Running {}", Self::describe(args));

        let mut cmd = Command::new("git");
        cmd.args(args)
            .current_dir(repo)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        group::isolate(&mut cmd);
        let child = cmd.spawn().map_err(|e| ApiError::GitCommandFailed {
            command: Self::describe(args),
            stderr: format!("failed to run git: {}", e),
        })?;

        let output = match group::wait_or_kill(child, self.timeout).await {
            Ok(Some(output)) => output,
            Ok(None) => {
                warn!(repo = %repo.display(), "{} timed out and was killed", Self::describe(args));
                return Err(ApiError::Timeout {
                    command: Self::describe(args),
                    timeout_ms: self.timeout.as_millis() as u64,
                });
            }
            Err(e) => {
                return Err(ApiError::GitCommandFailed {
                    command: Self::describe(args),
                    stderr: e.to_string(),
                })
            }
        };

        Ok(GitOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Run git and fail on a non-zero exit.
    async fn run(&self, repo: &Path, args: &[&str]) -> Result<String, ApiError> {
        let output = self.run_raw(repo, args).await?;
        if output.success {
            return Ok(output.stdout);
        }
        if output.stderr.contains("not a git repository") {
            return Err(ApiError::GitNotRepository(repo.to_path_buf()));
        }
        Err(ApiError::GitCommandFailed {
            command: Self::describe(args),
            stderr: output.stderr.trim().to_string(),
        })
    }

    async fn config_value(&self, repo: &Path, key: &str) -> Result<Option<String>, ApiError> {
        let output = self.run_raw(repo, &["config", key]).await?;
        let value = output.stdout.trim();
        Ok((output.success && !value.is_empty()).then(|| value.to_string()))
    }

    async fn resolve_stash(&self, repo: &Path, id: &str) -> Result<StashEntry, ApiError> {
        let entries = self.list_stashes(repo).await?;
        stash::find(&entries, id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("stash {}", id)))
    }
}

#[async_trait]
impl GitClient for ShellGit {
    async fn is_repository(&self, repo: &Path) -> bool {
        matches!(
            self.run_raw(repo, &["rev-parse", "--git-dir"]).await,
            Ok(output) if output.success
        )
    }

    async fn current_branch(&self, repo: &Path) -> Result<String, ApiError> {
        let branch = self.run(repo, &["branch", "--show-current"]).await?;
        let branch = branch.trim();
        Ok(if branch.is_empty() { "HEAD" } else { branch }.to_string())
    }

    async fn current_commit(&self, repo: &Path) -> Result<String, ApiError> {
        Ok(self.run(repo, &["rev-parse", "HEAD"]).await?.trim().to_string())
    }

    async fn repository_root(&self, repo: &Path) -> Result<PathBuf, ApiError> {
        let root = self.run(repo, &["rev-parse", "--show-toplevel"]).await?;
        Ok(PathBuf::from(root.trim()))
    }

    async fn status(&self, repo: &Path) -> Result<GitStatus, ApiError> {
        let output = self.run(repo, &["status", "--porcelain"]).await?;
        Ok(status::parse_porcelain(&output))
    }

    async fn is_configured(&self, repo: &Path) -> Result<bool, ApiError> {
        Ok(self.config_value(repo, "user.name").await?.is_some()
            && self.config_value(repo, "user.email").await?.is_some())
    }

    async fn commit_changes(&self, repo: &Path, message: &str) -> Result<String, ApiError> {
        if message.trim().is_empty() {
            return Err(ApiError::ValidationError(
                "Commit message must not be empty".to_string(),
            ));
        }
        if !self.is_configured(repo).await? {
            return Err(ApiError::ValidationError(
                "git user.name and user.email must be configured before committing".to_string(),
            ));
        }
        if !self.has_changes(repo).await? {
            return Err(ApiError::ValidationError("Nothing to commit".to_string()));
        }

        self.run(repo, &["add", "."]).await?;
        // Exit 0 means the index matches HEAD.
        let staged = self.run_raw(repo, &["diff", "--cached", "--quiet"]).await?;
        if staged.success {
            return Err(ApiError::ValidationError(
                "Nothing staged after adding changes".to_string(),
            ));
        }

        // Removed on drop whatever the commit does.
        let mut message_file = tempfile::NamedTempFile::new()
            .map_err(|e| StorageError::io(std::env::temp_dir(), e))?;
        if let Err(e) = message_file
            .write_all(message.as_bytes())
            .and_then(|_| message_file.flush())
        {
            return Err(StorageError::io(message_file.path(), e).into());
        }
        let message_path = message_file.path().to_string_lossy().into_owned();

        self.run(repo, &["commit", "-F", &message_path]).await?;
        self.current_commit(repo).await
    }

    async fn create_stash(
        &self,
        repo: &Path,
        message: Option<&str>,
    ) -> Result<StashOutcome, ApiError> {
        let marker = stash::new_marker();
        let full_message = stash::checkpoint_message(message, &marker);

        match self
            .run(repo, &["stash", "push", "-u", "-m", &full_message])
            .await
        {
            Ok(stdout) if stdout.contains("No local changes to save") => {
                return Ok(StashOutcome::failed("No local changes to save"));
            }
            Ok(_) => {}
            Err(ApiError::GitCommandFailed { stderr, .. }) => {
                warn!("Checkpoint push failed: {}", stderr);
                return Ok(StashOutcome::failed(stderr));
            }
            Err(e) => return Err(e),
        }

        let entries = self.list_stashes(repo).await?;
        match entries.iter().find(|e| e.message.contains(&marker)) {
            Some(entry) => {
                debug!(stash = %entry.id, "Checkpoint created");
                Ok(StashOutcome::created(entry))
            }
            None => {
                warn!(marker = %marker, "Checkpoint pushed but not found in stash list");
                Ok(StashOutcome::failed(
                    "Checkpoint was not found after stash push",
                ))
            }
        }
    }

    async fn apply_stash(&self, repo: &Path, id: &str) -> Result<ApplyOutcome, ApiError> {
        let entry = self.resolve_stash(repo, id).await?;
        let output = self
            .run_raw(repo, &["stash", "apply", &entry.reference])
            .await?;

        if !output.success {
            let combined = format!("{}\n{}", output.stdout, output.stderr);
            // A conflicting apply exits non-zero but leaves markers to report.
            if !combined.contains("CONFLICT") {
                return Err(ApiError::GitCommandFailed {
                    command: format!("git stash apply {}", entry.reference),
                    stderr: output.stderr.trim().to_string(),
                });
            }
        }

        let root = self.repository_root(repo).await?;
        let status = self.status(repo).await?;
        let conflicts = conflicts::scan(&root, &status);
        if !conflicts.is_empty() {
            warn!(count = conflicts.len(), "Stash applied with conflicts");
        }
        Ok(ApplyOutcome { conflicts })
    }

    async fn list_stashes(&self, repo: &Path) -> Result<Vec<StashEntry>, ApiError> {
        let format = format!("--format={}", stash::LIST_FORMAT);
        let output = self.run(repo, &["stash", "list", &format]).await?;
        Ok(stash::parse_list(&output))
    }

    async fn delete_stash(&self, repo: &Path, id: &str) -> Result<(), ApiError> {
        let entry = self.resolve_stash(repo, id).await?;
        self.run(repo, &["stash", "drop", &entry.reference]).await?;
        Ok(())
    }

    async fn checkout(&self, repo: &Path, branch: &str) -> Result<(), ApiError> {
        let branch = branch.trim();
        if branch.is_empty() || branch.starts_with('-') {
            return Err(ApiError::ValidationError(format!(
                "Invalid branch name '{}'",
                branch
            )));
        }
        self.run(repo, &["checkout", branch]).await?;
        Ok(())
    }

    async fn discard_changes(&self, repo: &Path) -> Result<(), ApiError> {
        self.run(repo, &["reset", "--hard", "HEAD"]).await?;
        Ok(())
    }
}
