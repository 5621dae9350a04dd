//! Application wiring.
//!
//! Builds the service graph once from a loaded [`DevsnapConfig`]. Every
//! component receives its collaborators here; nothing looks them up later.

use crate::config::{DevsnapConfig, PreferencesRepository};
use crate::error::ApiError;
use crate::git::{GitClient, ShellGit};
use crate::ide::IdeLauncher;
use crate::process::shell::ShellProcessRunner;
use crate::process::terminal::TerminalLauncher;
use crate::process::ProcessRunner;
use crate::prompt::{DialoguerPrompt, PromptProvider, ScriptedPrompt};
use crate::script::{ExecutionEngine, ScriptCommandService, ScriptRepository};
use crate::session::{ResumeService, SessionRepository, SessionService};
use crate::store::{FsRecordStore, RecordStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Fully wired services.
pub struct AppContext {
    pub config: DevsnapConfig,
    pub store_root: PathBuf,
    pub store: Arc<dyn RecordStore>,
    pub git: Arc<dyn GitClient>,
    pub runner: Arc<dyn ProcessRunner>,
    pub prompt: Arc<dyn PromptProvider>,
    pub preferences: PreferencesRepository,
    pub scripts: Arc<ScriptCommandService>,
    pub engine: Arc<ExecutionEngine>,
    pub sessions: Arc<SessionService>,
    pub ide: Arc<IdeLauncher>,
    pub resume: ResumeService,
}

impl AppContext {
    /// Wire the real git, process and prompt implementations.
    pub fn new(config: DevsnapConfig, interactive: bool) -> Result<Self, ApiError> {
        let git: Arc<dyn GitClient> = Arc::new(ShellGit::new(config.git.timeout()));
        let launcher = TerminalLauncher::new(
            config.terminal.preferred.clone(),
            Duration::from_millis(config.terminal.launch_timeout_ms),
        );
        let runner: Arc<dyn ProcessRunner> = Arc::new(ShellProcessRunner::new(launcher));
        let prompt: Arc<dyn PromptProvider> = if interactive {
            Arc::new(DialoguerPrompt)
        } else {
            Arc::new(ScriptedPrompt::new())
        };
        Self::with_components(config, git, runner, prompt)
    }

    /// Wire the graph around caller-supplied collaborators.
    pub fn with_components(
        config: DevsnapConfig,
        git: Arc<dyn GitClient>,
        runner: Arc<dyn ProcessRunner>,
        prompt: Arc<dyn PromptProvider>,
    ) -> Result<Self, ApiError> {
        let store_root = config.storage.resolve_root()?;
        let store: Arc<dyn RecordStore> = match config.storage.resolve_passphrase()? {
            Some(passphrase) => Arc::new(FsRecordStore::open_encrypted(store_root.clone(), passphrase)?),
            None => Arc::new(FsRecordStore::open(store_root.clone())?),
        };
        debug!(root = %store_root.display(), "Opened record store");

        let preferences = PreferencesRepository::new(store.clone());
        let scripts = Arc::new(ScriptCommandService::new(ScriptRepository::new(
            store.clone(),
        )));
        let engine = Arc::new(ExecutionEngine::new(
            runner.clone(),
            Duration::from_millis(config.scripts.timeout_ms),
            Duration::from_millis(config.scripts.script_delay_ms),
        ));
        let sessions = Arc::new(SessionService::new(
            SessionRepository::new(store.clone()),
            git.clone(),
            preferences.clone(),
        ));
        let ide = Arc::new(IdeLauncher::new(runner.clone()));
        let resume = ResumeService::new(
            sessions.clone(),
            git.clone(),
            scripts.clone(),
            engine.clone(),
            ide.clone(),
            prompt.clone(),
            preferences.clone(),
        );

        Ok(Self {
            config,
            store_root,
            store,
            git,
            runner,
            prompt,
            preferences,
            scripts,
            engine,
            sessions,
            ide,
            resume,
        })
    }
}
