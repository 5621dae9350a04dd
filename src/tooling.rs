//! Tooling & Integration Layer
//!
//! The command-line front end and its text formatting. All behaviour lives in
//! the library modules; this layer only parses arguments and renders results.

pub mod cli;
pub mod format;

pub use cli::{Cli, CliContext, Commands};
