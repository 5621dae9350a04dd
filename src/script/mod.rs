//! Scripts and terminal collections, scoped by project root.

pub mod commands;
pub mod domain;
pub mod engine;
pub mod repository;

pub use commands::{CollectionUpdate, NewCollection, NewScript, ScriptCommandService, ScriptUpdate};
pub use domain::{
    ExecutionMode, LifecycleEvent, ProjectScripts, ResolvedReference, Script, ScriptBody,
    ScriptCommand, ScriptReference, TerminalCollection,
};
pub use engine::{CollectionRunReport, ExecutionEngine, ScriptRunReport, ScriptRunStatus};
pub use repository::ScriptRepository;
