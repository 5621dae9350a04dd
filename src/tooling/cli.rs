//! CLI Tooling
//!
//! Command-line interface for sessions, scripts, terminal collections, git
//! state and preferences. Every command addresses a project directory
//! explicitly; the process working directory is only used as its default.

use super::format::{
    format_collection, format_collection_list, format_collection_run, format_git_status,
    format_resume_report, format_script, format_script_list, format_script_run,
    format_session, format_session_list, format_stash_list,
};
use crate::app::AppContext;
use crate::config::{ConfigLoader, DevsnapConfig, UserPreferences};
use crate::error::{ApiError, StorageError};
use crate::logging::LoggingOverrides;
use crate::prompt::{Answer, Question};
use crate::script::{
    ExecutionMode, LifecycleEvent, NewCollection, NewScript, ScriptBody, ScriptCommand,
};
use crate::session::{
    CursorPosition, DirtyChoice, FileState, ResumeOptions, ResumeOutcome, SaveSessionRequest,
    SessionUpdate,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::debug;

/// devsnap - save and resume development sessions
#[derive(Parser, Debug)]
#[command(name = "devsnap")]
#[command(about = "Save and resume development sessions: git state, open files and startup scripts")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project directory
    #[arg(long, global = true, default_value = ".")]
    pub project: PathBuf,

    /// Configuration file path (layered over the global config)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Never prompt; commands needing a choice fail instead
    #[arg(long, global = true)]
    pub non_interactive: bool,

    /// Enable verbose logging (default: off)
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn logging_overrides(&self) -> LoggingOverrides {
        LoggingOverrides {
            verbose: self.verbose,
            level: self.log_level.clone(),
            format: self.log_format.clone(),
            output: self.log_output.clone(),
            file: self.log_file.clone(),
        }
    }

    /// Load config from `--config` or the default layers.
    pub fn load_config(&self) -> Result<DevsnapConfig, ApiError> {
        match &self.config {
            Some(path) => ConfigLoader::load_from_file(path),
            None => ConfigLoader::load(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Save, resume and manage sessions
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
    /// Manage project scripts
    Script {
        #[command(subcommand)]
        command: ScriptCommands,
    },
    /// Manage terminal collections
    Collection {
        #[command(subcommand)]
        command: CollectionCommands,
    },
    /// Inspect repository state
    Git {
        #[command(subcommand)]
        command: GitCommands,
    },
    /// Show configuration or change preferences
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// Capture the project's current state
    Save {
        name: String,
        /// Tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Open file as path[:line[:column]] (repeatable, first is active)
        #[arg(long = "file")]
        files: Vec<String>,
        /// Checkpoint a dirty tree
        #[arg(long, conflicts_with = "no_stash")]
        stash: bool,
        /// Never checkpoint, whatever the preference says
        #[arg(long)]
        no_stash: bool,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Restore a saved session
    Resume {
        /// Session id or name
        session: String,
        /// What to do with uncommitted changes (save, discard, cancel)
        #[arg(long)]
        on_dirty: Option<DirtyChoice>,
        /// Do not run scripts
        #[arg(long)]
        skip_scripts: bool,
        /// Open the IDE after resuming
        #[arg(long)]
        open_ide: bool,
        /// IDE to open (implies --open-ide)
        #[arg(long)]
        ide: Option<String>,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List sessions
    List {
        /// Include sessions of every project
        #[arg(long)]
        all: bool,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show one session
    Show {
        session: String,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Change tags, notes, files or extension data
    Update {
        session: String,
        /// Replace tags (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long, conflicts_with = "clear_notes")]
        notes: Option<String>,
        #[arg(long)]
        clear_notes: bool,
        /// Replace open files; path[:line[:column]] (repeatable)
        #[arg(long = "file")]
        files: Vec<String>,
        /// Extension value as key=value; value parsed as JSON when possible
        #[arg(long = "set")]
        set: Vec<String>,
        /// Remove an extension key
        #[arg(long = "unset")]
        unset: Vec<String>,
    },
    /// Delete a session
    Delete {
        session: String,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
    /// Write a session to a JSON file
    Export { session: String, path: PathBuf },
    /// Read a session from a JSON file
    Import { path: PathBuf },
}

#[derive(Subcommand, Debug)]
pub enum ScriptCommands {
    /// Create a script from one or more commands
    Add {
        name: String,
        /// Command (repeatable, runs in the given order)
        #[arg(long = "command", required = true)]
        commands: Vec<String>,
        #[arg(long, default_value = "same-terminal")]
        mode: ExecutionMode,
        /// Close the terminal when the script finishes
        #[arg(long)]
        close: bool,
    },
    /// List scripts
    List {
        #[arg(long)]
        all: bool,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show one script
    Show {
        script: String,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Run a script
    Run {
        script: String,
        /// Override the script's execution mode
        #[arg(long)]
        mode: Option<ExecutionMode>,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Delete scripts
    Delete {
        #[arg(required = true)]
        scripts: Vec<String>,
        #[arg(long)]
        force: bool,
    },
    /// Delete every script and collection of the project
    Purge {
        #[arg(long)]
        force: bool,
    },
    /// Add a command to a script
    AddCommand {
        script: String,
        name: String,
        command: String,
        #[arg(long)]
        priority: Option<u32>,
    },
    /// Remove a command from a script
    RemoveCommand { script: String, name: String },
    /// Reorder a script's commands by name
    Reorder {
        script: String,
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum CollectionCommands {
    /// Create a collection of scripts
    Add {
        name: String,
        /// Script id, name or root::name (repeatable)
        #[arg(long = "script", required = true)]
        scripts: Vec<String>,
        /// Lifecycle event to run on (open, resume, none; repeatable)
        #[arg(long = "on")]
        lifecycle: Vec<LifecycleEvent>,
        #[arg(long, default_value = "new-terminals")]
        mode: ExecutionMode,
        #[arg(long)]
        close: bool,
    },
    /// List collections
    List {
        #[arg(long)]
        all: bool,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show one collection with its resolved scripts
    Show {
        collection: String,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Run every script of a collection
    Run {
        collection: String,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Delete a collection
    Delete {
        collection: String,
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum GitCommands {
    /// Working tree status
    Status {
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List stashes
    Stashes {
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Stage everything and commit
    Commit {
        #[arg(long, short)]
        message: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration and preferences
    Show {
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Set a preference
    Set { key: String, value: String },
}

/// Parse `path[:line[:column]]`.
pub fn parse_file_state(spec: &str) -> Result<FileState, ApiError> {
    let invalid = || ApiError::ValidationError(format!("Invalid file position '{}'", spec));
    let mut parts = spec.rsplitn(3, ':').collect::<Vec<_>>();
    parts.reverse();
    let numeric = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());

    let (path, cursor) = match parts.as_slice() {
        [path, line, column] if numeric(line) && numeric(column) => (
            path.to_string(),
            Some(CursorPosition {
                line: line.parse().map_err(|_| invalid())?,
                column: column.parse().map_err(|_| invalid())?,
            }),
        ),
        [head, path_tail, line] if numeric(line) => (
            format!("{}:{}", head, path_tail),
            Some(CursorPosition {
                line: line.parse().map_err(|_| invalid())?,
                column: 1,
            }),
        ),
        [path, line] if numeric(line) => (
            path.to_string(),
            Some(CursorPosition {
                line: line.parse().map_err(|_| invalid())?,
                column: 1,
            }),
        ),
        _ => (spec.to_string(), None),
    };
    if path.is_empty() {
        return Err(invalid());
    }
    Ok(FileState {
        path,
        cursor,
        scroll: None,
        is_active: false,
    })
}

fn parse_files(specs: &[String]) -> Result<Vec<FileState>, ApiError> {
    let mut files = specs
        .iter()
        .map(|s| parse_file_state(s))
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(first) = files.first_mut() {
        first.is_active = true;
    }
    Ok(files)
}

/// Parse `key=value`; the value is JSON when it parses, a string otherwise.
pub fn parse_extension(spec: &str) -> Result<(String, serde_json::Value), ApiError> {
    let (key, value) = spec.split_once('=').ok_or_else(|| {
        ApiError::ValidationError(format!("Expected key=value, got '{}'", spec))
    })?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ApiError::ValidationError(format!(
            "Extension key cannot be empty in '{}'",
            spec
        )));
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    Ok(serde_json::to_string_pretty(value).map_err(StorageError::from)?)
}

fn check_format(format: &str) -> Result<(), ApiError> {
    match format {
        "text" | "json" => Ok(()),
        other => Err(ApiError::ValidationError(format!(
            "Unknown output format '{}' (must be 'text' or 'json')",
            other
        ))),
    }
}

/// CLI context: the wired application plus the runtime driving it.
pub struct CliContext {
    app: AppContext,
    runtime: tokio::runtime::Runtime,
    project: PathBuf,
    interactive: bool,
}

impl CliContext {
    /// Create a CLI context from a loaded configuration.
    pub fn new(config: DevsnapConfig, project: PathBuf, non_interactive: bool) -> Result<Self, ApiError> {
        let interactive = !non_interactive && std::io::stdin().is_terminal();
        let app = AppContext::new(config, interactive)?;
        Self::with_app(app, project, interactive)
    }

    /// Create a CLI context around an already wired application.
    pub fn with_app(app: AppContext, project: PathBuf, interactive: bool) -> Result<Self, ApiError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| ApiError::ConfigError(format!("Failed to start async runtime: {}", e)))?;
        let project = dunce::canonicalize(&project).unwrap_or(project);
        Ok(Self {
            app,
            runtime,
            project,
            interactive,
        })
    }

    pub fn app(&self) -> &AppContext {
        &self.app
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        debug!(?command, project = %self.project.display(), "Executing command");
        match command {
            Commands::Session { command } => self.execute_session(command),
            Commands::Script { command } => self.execute_script(command),
            Commands::Collection { command } => self.execute_collection(command),
            Commands::Git { command } => self.execute_git(command),
            Commands::Config { command } => self.execute_config(command),
        }
    }

    fn confirm(&self, message: String, force: bool) -> Result<bool, ApiError> {
        if force {
            return Ok(true);
        }
        if !self.interactive {
            return Err(ApiError::ValidationError(
                "Refusing to delete without confirmation; pass --force".to_string(),
            ));
        }
        let answers = self
            .runtime
            .block_on(self.app.prompt.ask(&[Question::confirm("confirm", message, false)]))?;
        Ok(matches!(answers.get("confirm"), Some(Answer::Bool(true))))
    }

    fn execute_session(&self, command: &SessionCommands) -> Result<String, ApiError> {
        match command {
            SessionCommands::Save {
                name,
                tags,
                notes,
                files,
                stash,
                no_stash,
                format,
            } => {
                check_format(format)?;
                let auto_stash = match (*stash, *no_stash) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                };
                let request = SaveSessionRequest {
                    name: name.clone(),
                    project_root: self.project.clone(),
                    tags: tags.clone(),
                    notes: notes.clone(),
                    files: parse_files(files)?,
                    extensions: BTreeMap::new(),
                    auto_stash,
                };
                let session = self.runtime.block_on(self.app.sessions.save(request))?;
                if format == "json" {
                    return to_json(&session);
                }
                let mut out = format!("Saved session '{}' ({})", session.name, session.id);
                if let Some(stash) = session.git.as_ref().and_then(|g| g.stash_id.as_ref()) {
                    out.push_str(&format!("\nCheckpoint: {}", stash));
                }
                Ok(out)
            }
            SessionCommands::Resume {
                session,
                on_dirty,
                skip_scripts,
                open_ide,
                ide,
                format,
            } => {
                check_format(format)?;
                let options = ResumeOptions {
                    dirty_choice: *on_dirty,
                    run_scripts: if *skip_scripts { Some(false) } else { None },
                    open_ide: if *open_ide || ide.is_some() { Some(true) } else { None },
                    ide: ide.clone(),
                };
                let report = self.runtime.block_on(self.app.resume.resume(session, options))?;
                let text = if format == "json" {
                    to_json(&report)?
                } else {
                    format_resume_report(&report)
                };
                if matches!(report.outcome, ResumeOutcome::Halted { .. }) {
                    println!("{}", text);
                    report.into_result()?;
                }
                Ok(text)
            }
            SessionCommands::List { all, format } => {
                check_format(format)?;
                let filter = if *all { None } else { Some(self.project.as_path()) };
                let sessions = self.app.sessions.list(filter)?;
                if format == "json" {
                    return to_json(&sessions);
                }
                Ok(format_session_list(&sessions))
            }
            SessionCommands::Show { session, format } => {
                check_format(format)?;
                let session = self.app.sessions.get(session)?;
                if format == "json" {
                    return to_json(&session);
                }
                Ok(format_session(&session))
            }
            SessionCommands::Update {
                session,
                tags,
                notes,
                clear_notes,
                files,
                set,
                unset,
            } => {
                let mut extensions = BTreeMap::new();
                for spec in set {
                    let (key, value) = parse_extension(spec)?;
                    extensions.insert(key, value);
                }
                for key in unset {
                    extensions.insert(key.clone(), serde_json::Value::Null);
                }
                let update = SessionUpdate {
                    tags: if tags.is_empty() { None } else { Some(tags.clone()) },
                    notes: if *clear_notes {
                        Some(None)
                    } else {
                        notes.clone().map(Some)
                    },
                    files: if files.is_empty() {
                        None
                    } else {
                        Some(parse_files(files)?)
                    },
                    extensions,
                };
                let updated = self.app.sessions.update(session, update)?;
                Ok(format!("Updated session '{}'", updated.name))
            }
            SessionCommands::Delete { session, force } => {
                let target = self.app.sessions.get(session)?;
                if !self.confirm(format!("Delete session '{}'?", target.name), *force)? {
                    return Ok("Deletion cancelled".to_string());
                }
                let removed = self.app.sessions.delete(&target.id)?;
                Ok(format!("Deleted session '{}'", removed.name))
            }
            SessionCommands::Export { session, path } => {
                let exported = self.app.sessions.export(session, path)?;
                Ok(format!(
                    "Exported session '{}' to {}",
                    exported.name,
                    path.display()
                ))
            }
            SessionCommands::Import { path } => {
                let imported = self.app.sessions.import(path)?;
                Ok(format!("Imported session '{}' ({})", imported.name, imported.id))
            }
        }
    }

    fn execute_script(&self, command: &ScriptCommands) -> Result<String, ApiError> {
        let scripts = &self.app.scripts;
        let root = self.project.as_path();
        match command {
            ScriptCommands::Add {
                name,
                commands,
                mode,
                close,
            } => {
                let body = match commands.as_slice() {
                    [single] => ScriptBody::Single {
                        command: single.clone(),
                    },
                    many => ScriptBody::Sequence {
                        commands: many
                            .iter()
                            .enumerate()
                            .map(|(i, c)| ScriptCommand {
                                priority: i as u32 + 1,
                                name: format!("step{}", i + 1),
                                command: c.clone(),
                            })
                            .collect(),
                    },
                };
                let script = scripts.create(NewScript {
                    name: name.clone(),
                    root_path: root.to_path_buf(),
                    body,
                    execution_mode: *mode,
                    close_terminal_after_execution: *close,
                })?;
                Ok(format!("Created script '{}' ({})", script.name, script.id))
            }
            ScriptCommands::List { all, format } => {
                check_format(format)?;
                let list = scripts.list(if *all { None } else { Some(root) })?;
                if format == "json" {
                    return to_json(&list);
                }
                Ok(format_script_list(&list))
            }
            ScriptCommands::Show { script, format } => {
                check_format(format)?;
                let script = scripts.get(root, script)?;
                if format == "json" {
                    return to_json(&script);
                }
                Ok(format_script(&script))
            }
            ScriptCommands::Run {
                script,
                mode,
                format,
            } => {
                check_format(format)?;
                let script = scripts.get(root, script)?;
                let mode = mode.unwrap_or(script.execution_mode);
                let run = self.runtime.block_on(self.app.engine.run_script_as(
                    &script,
                    mode,
                    script.close_terminal_after_execution,
                ))?;
                let text = if format == "json" {
                    to_json(&run)?
                } else {
                    format_script_run(&run)
                };
                if !run.succeeded() {
                    println!("{}", text);
                    run.into_result()?;
                }
                Ok(text)
            }
            ScriptCommands::Delete { scripts: ids, force } => {
                if !self.confirm(format!("Delete {} script(s)?", ids.len()), *force)? {
                    return Ok("Deletion cancelled".to_string());
                }
                let removed = scripts.delete(root, ids)?;
                let names: Vec<&str> = removed.iter().map(|s| s.name.as_str()).collect();
                Ok(format!("Deleted: {}", names.join(", ")))
            }
            ScriptCommands::Purge { force } => {
                if !self.confirm(
                    format!("Delete every script and collection for {}?", root.display()),
                    *force,
                )? {
                    return Ok("Purge cancelled".to_string());
                }
                if scripts.purge_root(root)? {
                    Ok(format!("Purged scripts for {}", root.display()))
                } else {
                    Ok(format!("No scripts stored for {}", root.display()))
                }
            }
            ScriptCommands::AddCommand {
                script,
                name,
                command,
                priority,
            } => {
                let script = scripts.add_command(root, script, name, command, *priority)?;
                Ok(format_script(&script))
            }
            ScriptCommands::RemoveCommand { script, name } => {
                let script = scripts.remove_command(root, script, name)?;
                Ok(format_script(&script))
            }
            ScriptCommands::Reorder { script, names } => {
                let script = scripts.reorder(root, script, names)?;
                Ok(format_script(&script))
            }
        }
    }

    fn execute_collection(&self, command: &CollectionCommands) -> Result<String, ApiError> {
        let scripts = &self.app.scripts;
        let root = self.project.as_path();
        match command {
            CollectionCommands::Add {
                name,
                scripts: specs,
                lifecycle,
                mode,
                close,
            } => {
                let script_references = scripts.references_for(root, specs)?;
                let collection = scripts.create_collection(NewCollection {
                    name: name.clone(),
                    root_path: root.to_path_buf(),
                    lifecycle: lifecycle.clone(),
                    script_references,
                    execution_mode: *mode,
                    close_terminal_after_execution: *close,
                })?;
                Ok(format!(
                    "Created collection '{}' ({})",
                    collection.name, collection.id
                ))
            }
            CollectionCommands::List { all, format } => {
                check_format(format)?;
                let list = scripts.list_collections(if *all { None } else { Some(root) })?;
                if format == "json" {
                    return to_json(&list);
                }
                Ok(format_collection_list(&list))
            }
            CollectionCommands::Show { collection, format } => {
                check_format(format)?;
                let collection = scripts.get_collection(root, collection)?;
                let resolved = scripts.resolve(&collection)?;
                if format == "json" {
                    return to_json(&json!({
                        "collection": collection,
                        "resolved": resolved,
                    }));
                }
                Ok(format_collection(&collection, &resolved))
            }
            CollectionCommands::Run { collection, format } => {
                check_format(format)?;
                let collection = scripts.get_collection(root, collection)?;
                let resolved = scripts.resolve(&collection)?;
                let run = self
                    .runtime
                    .block_on(self.app.engine.run_collection(&collection, resolved))?;
                let text = if format == "json" {
                    to_json(&run)?
                } else {
                    format_collection_run(&run)
                };
                if let Some(failed) = run.first_failure() {
                    println!("{}", text);
                    failed.clone().into_result()?;
                }
                Ok(text)
            }
            CollectionCommands::Delete { collection, force } => {
                let target = scripts.get_collection(root, collection)?;
                if !self.confirm(format!("Delete collection '{}'?", target.name), *force)? {
                    return Ok("Deletion cancelled".to_string());
                }
                let removed = scripts.delete_collection(root, &target.id)?;
                Ok(format!("Deleted collection '{}'", removed.name))
            }
        }
    }

    fn execute_git(&self, command: &GitCommands) -> Result<String, ApiError> {
        let git = &self.app.git;
        let root = self.project.as_path();
        match command {
            GitCommands::Status { format } => {
                check_format(format)?;
                let (branch, status) = self.runtime.block_on(async {
                    let branch = git.current_branch(root).await?;
                    let status = git.status(root).await?;
                    Ok::<_, ApiError>((branch, status))
                })?;
                if format == "json" {
                    return to_json(&json!({ "branch": branch, "status": status }));
                }
                Ok(format!("On branch {}\n{}", branch, format_git_status(&status)))
            }
            GitCommands::Stashes { format } => {
                check_format(format)?;
                let stashes = self.runtime.block_on(git.list_stashes(root))?;
                if format == "json" {
                    return to_json(&stashes);
                }
                Ok(format_stash_list(&stashes))
            }
            GitCommands::Commit { message } => {
                let hash = self.runtime.block_on(git.commit_changes(root, message))?;
                Ok(format!("Committed {}", &hash[..hash.len().min(12)]))
            }
        }
    }

    fn execute_config(&self, command: &ConfigCommands) -> Result<String, ApiError> {
        match command {
            ConfigCommands::Show { format } => {
                check_format(format)?;
                let preferences = self.app.preferences.load()?;
                if format == "json" {
                    return to_json(&json!({
                        "config": self.app.config,
                        "storeRoot": self.app.store_root,
                        "preferences": preferences,
                    }));
                }
                let config = toml::to_string_pretty(&self.app.config)
                    .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e)))?;
                Ok(format!(
                    "# store: {}\n{}\n{}",
                    self.app.store_root.display(),
                    config,
                    format_preferences(&preferences)
                ))
            }
            ConfigCommands::Set { key, value } => {
                let preferences = self.app.preferences.set(key, value)?;
                Ok(format!("Preference updated\n{}", format_preferences(&preferences)))
            }
        }
    }
}

fn format_preferences(preferences: &UserPreferences) -> String {
    let mut out = String::from("[preferences]\n");
    out.push_str(&format!(
        "default_ide = {}\n",
        preferences.default_ide.as_deref().unwrap_or("none")
    ));
    out.push_str(&format!("auto_stash_on_save = {}\n", preferences.auto_stash_on_save));
    out.push_str(&format!(
        "run_scripts_on_resume = {}\n",
        preferences.run_scripts_on_resume
    ));
    out.push_str(&format!("open_ide_on_resume = {}", preferences.open_ide_on_resume));
    out
}
