//! Session resume.
//!
//! Steps run in a fixed order: check repository, check dirty tree, switch
//! branch, reapply checkpoint, run scripts, open IDE. A hard failure halts the
//! remaining steps. Completed steps are not rolled back. The project root is
//! passed explicitly to every call; the process working directory is never
//! changed.

use super::domain::{GitSnapshot, Session};
use super::service::SessionService;
use crate::config::preferences::{PreferencesRepository, UserPreferences};
use crate::error::ApiError;
use crate::git::GitClient;
use crate::ide::IdeLauncher;
use crate::prompt::{Answer, PromptProvider, Question};
use crate::script::{
    CollectionRunReport, ExecutionEngine, ExecutionMode, LifecycleEvent, ScriptCommandService,
    ScriptRunReport,
};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// What to do with uncommitted changes before resuming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DirtyChoice {
    /// Checkpoint them
    Save,
    /// Throw tracked changes away
    Discard,
    Cancel,
}

impl DirtyChoice {
    const LABELS: [&'static str; 3] = [
        "Save changes to a checkpoint",
        "Discard changes",
        "Cancel resume",
    ];

    fn from_index(index: usize) -> Self {
        match index {
            0 => DirtyChoice::Save,
            1 => DirtyChoice::Discard,
            _ => DirtyChoice::Cancel,
        }
    }
}

impl std::str::FromStr for DirtyChoice {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "save" | "stash" => Ok(DirtyChoice::Save),
            "discard" => Ok(DirtyChoice::Discard),
            "cancel" => Ok(DirtyChoice::Cancel),
            other => Err(ApiError::ValidationError(format!(
                "Unknown dirty-tree choice '{}'. Expected save, discard or cancel",
                other
            ))),
        }
    }
}

/// Caller overrides; `None` falls back to preferences or a prompt.
#[derive(Debug, Clone, Default)]
pub struct ResumeOptions {
    pub dirty_choice: Option<DirtyChoice>,
    pub run_scripts: Option<bool>,
    pub open_ide: Option<bool>,
    pub ide: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResumeStep {
    CheckRepository,
    CheckDirty,
    BranchSwitch,
    StashApply,
    RunScripts,
    OpenIde,
}

impl fmt::Display for ResumeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResumeStep::CheckRepository => "check-repository",
            ResumeStep::CheckDirty => "check-dirty",
            ResumeStep::BranchSwitch => "branch-switch",
            ResumeStep::StashApply => "stash-apply",
            ResumeStep::RunScripts => "run-scripts",
            ResumeStep::OpenIde => "open-ide",
        };
        f.pad(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "detail", rename_all = "lowercase")]
pub enum StepOutcome {
    Done(String),
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub step: ResumeStep,
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ResumeOutcome {
    Completed,
    Cancelled,
    Halted { step: ResumeStep, error: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeReport {
    pub session_id: String,
    pub session_name: String,
    pub project_root: String,
    pub steps: Vec<StepRecord>,
    pub outcome: ResumeOutcome,
    pub script_runs: Vec<ScriptRunReport>,
    pub collection_runs: Vec<CollectionRunReport>,
    #[serde(skip)]
    pub failure: Option<ApiError>,
}

impl ResumeReport {
    fn new(session: &Session) -> Self {
        Self {
            session_id: session.id.clone(),
            session_name: session.name.clone(),
            project_root: session.project_root.clone(),
            steps: Vec::new(),
            outcome: ResumeOutcome::Completed,
            script_runs: Vec::new(),
            collection_runs: Vec::new(),
            failure: None,
        }
    }

    fn done(&mut self, step: ResumeStep, detail: impl Into<String>) {
        self.steps.push(StepRecord {
            step,
            outcome: StepOutcome::Done(detail.into()),
        });
    }

    fn skipped(&mut self, step: ResumeStep, reason: impl Into<String>) {
        self.steps.push(StepRecord {
            step,
            outcome: StepOutcome::Skipped(reason.into()),
        });
    }

    fn halt(mut self, step: ResumeStep, error: ApiError) -> Self {
        warn!(step = %step, "Resume halted: {}", error);
        self.steps.push(StepRecord {
            step,
            outcome: StepOutcome::Failed(error.to_string()),
        });
        self.outcome = ResumeOutcome::Halted {
            step,
            error: error.to_string(),
        };
        self.failure = Some(error);
        self
    }

    pub fn step(&self, step: ResumeStep) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.step == step).map(|s| &s.outcome)
    }

    /// Turn a halted resume into its error.
    pub fn into_result(mut self) -> Result<Self, ApiError> {
        match self.failure.take() {
            Some(error) => Err(error),
            None => Ok(self),
        }
    }
}

pub struct ResumeService {
    sessions: Arc<SessionService>,
    git: Arc<dyn GitClient>,
    scripts: Arc<ScriptCommandService>,
    engine: Arc<ExecutionEngine>,
    ide: Arc<IdeLauncher>,
    prompt: Arc<dyn PromptProvider>,
    preferences: PreferencesRepository,
}

impl ResumeService {
    pub fn new(
        sessions: Arc<SessionService>,
        git: Arc<dyn GitClient>,
        scripts: Arc<ScriptCommandService>,
        engine: Arc<ExecutionEngine>,
        ide: Arc<IdeLauncher>,
        prompt: Arc<dyn PromptProvider>,
        preferences: PreferencesRepository,
    ) -> Self {
        Self {
            sessions,
            git,
            scripts,
            engine,
            ide,
            prompt,
            preferences,
        }
    }

    async fn choose(&self, options: &ResumeOptions, status_summary: &str) -> Result<DirtyChoice, ApiError> {
        if let Some(choice) = options.dirty_choice {
            return Ok(choice);
        }
        let question = Question::select(
            "dirty_choice",
            format!("Working tree has uncommitted changes ({})", status_summary),
            &DirtyChoice::LABELS,
            0,
        );
        let answers = self.prompt.ask(&[question]).await?;
        match answers.get("dirty_choice") {
            Some(Answer::Index(i)) => Ok(DirtyChoice::from_index(*i)),
            Some(Answer::Text(text)) => text.parse(),
            _ => Err(ApiError::PromptError("No choice made".to_string())),
        }
    }

    /// Resume the session `id_or_name`.
    ///
    /// Errors before the first step (unknown session, missing project root)
    /// are returned directly; later failures are recorded in the report.
    pub async fn resume(
        &self,
        id_or_name: &str,
        options: ResumeOptions,
    ) -> Result<ResumeReport, ApiError> {
        let session = self.sessions.get(id_or_name)?;
        let root = PathBuf::from(&session.project_root);
        if !root.is_dir() {
            return Err(ApiError::ValidationError(format!(
                "Project root no longer exists: {}",
                root.display()
            )));
        }
        let preferences = self.preferences.load()?;
        let mut report = ResumeReport::new(&session);
        info!(session = %session.name, root = %root.display(), "Resuming session");

        if self.git.is_repository(&root).await {
            report.done(ResumeStep::CheckRepository, "git repository");
            match &session.git {
                Some(snapshot) => {
                    report = match self.reconcile(report, &root, snapshot, &options).await {
                        Ok(report) => report,
                        Err(report) => return Ok(report),
                    };
                }
                None => {
                    report.skipped(ResumeStep::CheckDirty, "session has no git snapshot");
                }
            }
        } else {
            report.skipped(ResumeStep::CheckRepository, "not a git repository");
        }

        report = match self.run_scripts(report, &root, &options, &preferences).await {
            Ok(report) => report,
            Err(report) => return Ok(report),
        };

        let report = match self.open_ide(report, &root, &options, &preferences).await {
            Ok(report) => report,
            Err(report) => return Ok(report),
        };
        info!(session = %session.name, "Resume completed");
        Ok(report)
    }

    /// Dirty check, branch switch and checkpoint reapply. `Err` carries a
    /// finished (halted or cancelled) report.
    async fn reconcile(
        &self,
        mut report: ResumeReport,
        root: &Path,
        snapshot: &GitSnapshot,
        options: &ResumeOptions,
    ) -> Result<ResumeReport, ResumeReport> {
        let status = match self.git.status(root).await {
            Ok(status) => status,
            Err(e) => return Err(report.halt(ResumeStep::CheckDirty, e)),
        };

        if !status.is_dirty {
            report.done(ResumeStep::CheckDirty, "clean");
        } else {
            let summary = format!("{} changed", status.files.len());
            let choice = match self.choose(options, &summary).await {
                Ok(choice) => choice,
                Err(e) => return Err(report.halt(ResumeStep::CheckDirty, e)),
            };
            match choice {
                DirtyChoice::Cancel => {
                    report.skipped(ResumeStep::CheckDirty, "cancelled by user");
                    report.outcome = ResumeOutcome::Cancelled;
                    return Err(report);
                }
                DirtyChoice::Discard => {
                    if let Err(e) = self.git.discard_changes(root).await {
                        return Err(report.halt(ResumeStep::CheckDirty, e));
                    }
                    report.done(ResumeStep::CheckDirty, "dirty: discarded changes");
                }
                DirtyChoice::Save => {
                    let message = format!("devsnap: before resuming {}", report.session_name);
                    match self.git.create_stash(root, Some(&message)).await {
                        Ok(outcome) if outcome.success => {
                            report.done(
                                ResumeStep::CheckDirty,
                                format!(
                                    "dirty: saved checkpoint {}",
                                    outcome.stash_id.unwrap_or_default()
                                ),
                            );
                        }
                        Ok(outcome) => {
                            let error = ApiError::GitCommandFailed {
                                command: "git stash push".to_string(),
                                stderr: outcome.error.unwrap_or_else(|| "checkpoint failed".to_string()),
                            };
                            return Err(report.halt(ResumeStep::CheckDirty, error));
                        }
                        Err(e) => return Err(report.halt(ResumeStep::CheckDirty, e)),
                    }
                }
            }
        }

        let current = match self.git.current_branch(root).await {
            Ok(branch) => branch,
            Err(e) => return Err(report.halt(ResumeStep::BranchSwitch, e)),
        };
        if snapshot.branch == "HEAD" {
            report.skipped(ResumeStep::BranchSwitch, "session was on a detached HEAD");
        } else if current == snapshot.branch {
            report.skipped(ResumeStep::BranchSwitch, format!("already on {}", current));
        } else {
            if let Err(e) = self.git.checkout(root, &snapshot.branch).await {
                return Err(report.halt(ResumeStep::BranchSwitch, e));
            }
            report.done(
                ResumeStep::BranchSwitch,
                format!("{} -> {}", current, snapshot.branch),
            );
        }

        match &snapshot.stash_id {
            None => report.skipped(ResumeStep::StashApply, "no checkpoint recorded"),
            Some(id) => match self.git.apply_stash(root, id).await {
                Ok(outcome) if outcome.conflicts.is_empty() => {
                    report.done(ResumeStep::StashApply, format!("applied {}", id));
                }
                Ok(outcome) => {
                    return Err(report.halt(
                        ResumeStep::StashApply,
                        ApiError::GitStashConflict(outcome.conflicts),
                    ));
                }
                Err(ApiError::NotFound(_)) => {
                    warn!(stash = %id, "Recorded checkpoint no longer exists");
                    report.skipped(ResumeStep::StashApply, format!("checkpoint {} not found", id));
                }
                Err(e) => return Err(report.halt(ResumeStep::StashApply, e)),
            },
        }

        Ok(report)
    }

    /// Run `resume` collections of the project, or every project script when
    /// there are none.
    async fn run_scripts(
        &self,
        mut report: ResumeReport,
        root: &Path,
        options: &ResumeOptions,
        preferences: &UserPreferences,
    ) -> Result<ResumeReport, ResumeReport> {
        if !options.run_scripts.unwrap_or(preferences.run_scripts_on_resume) {
            report.skipped(ResumeStep::RunScripts, "disabled");
            return Ok(report);
        }

        let collections = match self.scripts.list_collections(Some(root)) {
            Ok(all) => all
                .into_iter()
                .filter(|c| c.runs_on(LifecycleEvent::Resume))
                .collect::<Vec<_>>(),
            Err(e) => return Err(report.halt(ResumeStep::RunScripts, e)),
        };

        if !collections.is_empty() {
            let mut ran = 0;
            for collection in collections {
                if collection.execution_mode == ExecutionMode::Ide {
                    warn!(collection = %collection.name, "Skipping ide-mode collection");
                    continue;
                }
                let resolved = match self.scripts.resolve(&collection) {
                    Ok(resolved) => resolved,
                    Err(e) => return Err(report.halt(ResumeStep::RunScripts, e)),
                };
                let run = match self.engine.run_collection(&collection, resolved).await {
                    Ok(run) => run,
                    Err(e) => return Err(report.halt(ResumeStep::RunScripts, e)),
                };
                let failure = run.first_failure().cloned();
                report.collection_runs.push(run);
                ran += 1;
                if let Some(failed) = failure {
                    if let Err(e) = failed.into_result() {
                        return Err(report.halt(ResumeStep::RunScripts, e));
                    }
                }
            }
            report.done(ResumeStep::RunScripts, format!("{} collection(s)", ran));
            return Ok(report);
        }

        let scripts = match self.scripts.list(Some(root)) {
            Ok(scripts) => scripts,
            Err(e) => return Err(report.halt(ResumeStep::RunScripts, e)),
        };
        if scripts.is_empty() {
            report.skipped(ResumeStep::RunScripts, "no scripts for project");
            return Ok(report);
        }

        let mut ran = 0;
        for script in scripts {
            let run = match self.engine.run_script(&script).await {
                Ok(run) => run,
                Err(ApiError::UnsupportedExecutionMode(mode)) => {
                    warn!(script = %script.name, mode = %mode, "Skipping script");
                    continue;
                }
                Err(e) => return Err(report.halt(ResumeStep::RunScripts, e)),
            };
            let succeeded = run.succeeded();
            report.script_runs.push(run.clone());
            ran += 1;
            if !succeeded {
                if let Err(e) = run.into_result() {
                    return Err(report.halt(ResumeStep::RunScripts, e));
                }
            }
        }
        report.done(ResumeStep::RunScripts, format!("{} script(s)", ran));
        Ok(report)
    }

    async fn open_ide(
        &self,
        mut report: ResumeReport,
        root: &Path,
        options: &ResumeOptions,
        preferences: &UserPreferences,
    ) -> Result<ResumeReport, ResumeReport> {
        let wanted = options.open_ide.unwrap_or(preferences.open_ide_on_resume);
        let ide = options.ide.clone().or_else(|| preferences.default_ide.clone());
        match (wanted, ide) {
            (false, _) => report.skipped(ResumeStep::OpenIde, "disabled"),
            (true, None) => report.skipped(ResumeStep::OpenIde, "no IDE configured"),
            (true, Some(ide)) => {
                if let Err(e) = self.ide.open(&ide, root).await {
                    return Err(report.halt(ResumeStep::OpenIde, e));
                }
                report.done(ResumeStep::OpenIde, ide);
            }
        }
        Ok(report)
    }
}
