//! Integration tests for devsnap

mod cli_parse;
mod git_integration;
mod resume_flow;
mod store_integration;
mod support;
