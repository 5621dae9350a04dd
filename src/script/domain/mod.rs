//! Script and terminal collection domain types.

pub mod validation;

pub use validation::{validate_collection, validate_script};

use crate::error::ApiError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a script's commands are run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionMode {
    /// Run synchronously in this process, stopping at the first failure.
    #[default]
    SameTerminal,
    /// Hand the joined command line to a new terminal window.
    NewTerminals,
    /// Run inside an editor host; never executed here.
    Ide,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::SameTerminal => "same-terminal",
            ExecutionMode::NewTerminals => "new-terminals",
            ExecutionMode::Ide => "ide",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "same-terminal" => Ok(ExecutionMode::SameTerminal),
            "new-terminals" => Ok(ExecutionMode::NewTerminals),
            "ide" => Ok(ExecutionMode::Ide),
            other => Err(ApiError::ValidationError(format!(
                "Unknown execution mode '{}'. Expected same-terminal, new-terminals or ide",
                other
            ))),
        }
    }
}

/// When a terminal collection runs automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleEvent {
    Open,
    Resume,
    None,
}

impl FromStr for LifecycleEvent {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "open" => Ok(LifecycleEvent::Open),
            "resume" => Ok(LifecycleEvent::Resume),
            "none" => Ok(LifecycleEvent::None),
            other => Err(ApiError::ValidationError(format!(
                "Unknown lifecycle event '{}'. Expected open, resume or none",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptCommand {
    pub priority: u32,
    pub name: String,
    pub command: String,
}

/// What a script runs: one command, or a priority-ordered list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ScriptBody {
    Single { command: String },
    Sequence { commands: Vec<ScriptCommand> },
}

impl ScriptBody {
    /// Commands by ascending priority; ties keep insertion order.
    pub fn ordered_commands(&self) -> Vec<ScriptCommand> {
        match self {
            ScriptBody::Single { command } => vec![ScriptCommand {
                priority: 1,
                name: "main".to_string(),
                command: command.clone(),
            }],
            ScriptBody::Sequence { commands } => {
                let mut ordered = commands.clone();
                ordered.sort_by_key(|c| c.priority);
                ordered
            }
        }
    }

    pub fn command_count(&self) -> usize {
        match self {
            ScriptBody::Single { .. } => 1,
            ScriptBody::Sequence { commands } => commands.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    pub id: String,
    pub name: String,
    pub root_path: String,
    #[serde(flatten)]
    pub body: ScriptBody,
    #[serde(default)]
    pub execution_mode: ExecutionMode,
    #[serde(default)]
    pub close_terminal_after_execution: bool,
}

impl Script {
    pub fn reference(&self) -> ScriptReference {
        ScriptReference {
            id: self.id.clone(),
            root_path: self.root_path.clone(),
        }
    }
}

/// Weak link from a collection to a script.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptReference {
    pub id: String,
    pub root_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalCollection {
    pub id: String,
    pub name: String,
    pub root_path: String,
    #[serde(default)]
    pub lifecycle: Vec<LifecycleEvent>,
    #[serde(default)]
    pub script_references: Vec<ScriptReference>,
    #[serde(default)]
    pub close_terminal_after_execution: bool,
    #[serde(default)]
    pub execution_mode: ExecutionMode,
}

impl TerminalCollection {
    pub fn runs_on(&self, event: LifecycleEvent) -> bool {
        self.lifecycle.contains(&event)
    }
}

/// A collection reference after lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ResolvedReference {
    Resolved(Script),
    Dangling {
        id: String,
        #[serde(rename = "rootPath")]
        root_path: String,
    },
}

/// Per-project record: every script and collection under one root path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectScripts {
    #[serde(default)]
    pub root_path: String,
    #[serde(default)]
    pub scripts: Vec<Script>,
    #[serde(default)]
    pub terminal_collections: Vec<TerminalCollection>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl ProjectScripts {
    pub fn new(root_path: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
            ..Default::default()
        }
    }

    /// Find a script by id, then by name.
    pub fn find_script(&self, id_or_name: &str) -> Option<&Script> {
        self.scripts
            .iter()
            .find(|s| s.id == id_or_name)
            .or_else(|| self.scripts.iter().find(|s| s.name == id_or_name))
    }

    pub fn script_position(&self, id_or_name: &str) -> Option<usize> {
        self.scripts
            .iter()
            .position(|s| s.id == id_or_name)
            .or_else(|| self.scripts.iter().position(|s| s.name == id_or_name))
    }

    pub fn find_collection(&self, id_or_name: &str) -> Option<&TerminalCollection> {
        self.terminal_collections
            .iter()
            .find(|c| c.id == id_or_name)
            .or_else(|| self.terminal_collections.iter().find(|c| c.name == id_or_name))
    }

    pub fn collection_position(&self, id_or_name: &str) -> Option<usize> {
        self.terminal_collections
            .iter()
            .position(|c| c.id == id_or_name)
            .or_else(|| {
                self.terminal_collections
                    .iter()
                    .position(|c| c.name == id_or_name)
            })
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty() && self.terminal_collections.is_empty()
    }
}
