//! devsnap: save and resume development sessions
//!
//! Captures a project's git state, open files and notes as named sessions,
//! manages per-project startup scripts and terminal collections, and restores
//! all of it on resume. Records live in a local, optionally encrypted store.

pub mod app;
pub mod config;
pub mod error;
pub mod git;
pub mod ide;
pub mod index;
pub mod logging;
pub mod process;
pub mod project;
pub mod prompt;
pub mod script;
pub mod session;
pub mod store;
pub mod tooling;
