//! Format sessions, scripts, collections, git state and resume reports as text.

use crate::git::{GitStatus, StashEntry};
use crate::script::{
    CollectionRunReport, ResolvedReference, Script, ScriptBody, ScriptRunReport, ScriptRunStatus,
    TerminalCollection,
};
use crate::session::{ResumeOutcome, ResumeReport, Session, StepOutcome};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn short(id: &str) -> &str {
    &id[..id.len().min(8)]
}

pub fn format_session_list(sessions: &[Session]) -> String {
    if sessions.is_empty() {
        return "No sessions found.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Name", "ID", "Branch", "Updated", "Tags"]);
    for s in sessions {
        let branch = s
            .git
            .as_ref()
            .map(|g| {
                if g.is_dirty {
                    format!("{}*", g.branch)
                } else {
                    g.branch.clone()
                }
            })
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            s.name.clone(),
            short(&s.id).to_string(),
            branch,
            s.updated_at.format("%Y-%m-%d %H:%M").to_string(),
            s.tags.join(", "),
        ]);
    }
    format!("{}\n\nTotal: {} session(s)", table, sessions.len())
}

pub fn format_session(session: &Session) -> String {
    let mut out = format!("{}\n", format_section_heading(&format!("Session {}", session.name)));
    out.push_str(&format!("  ID: {}\n", session.id));
    out.push_str(&format!("  Project: {}\n", session.project_root));
    out.push_str(&format!("  Created: {}\n", session.created_at.to_rfc3339()));
    out.push_str(&format!("  Updated: {}\n", session.updated_at.to_rfc3339()));
    if !session.tags.is_empty() {
        out.push_str(&format!("  Tags: {}\n", session.tags.join(", ")));
    }
    if let Some(notes) = &session.notes {
        out.push_str(&format!("  Notes: {}\n", notes));
    }
    match &session.git {
        Some(git) => {
            out.push_str(&format!("\n{}\n", format_section_heading("Git")));
            out.push_str(&format!("  Branch: {}\n", git.branch));
            out.push_str(&format!("  Commit: {}\n", short(&git.commit)));
            out.push_str(&format!("  Dirty: {}\n", if git.is_dirty { "yes" } else { "no" }));
            if let Some(stash) = &git.stash_id {
                out.push_str(&format!("  Checkpoint: {}\n", short(stash)));
            }
        }
        None => out.push_str("  Git: not a repository\n"),
    }
    if !session.files.is_empty() {
        out.push_str(&format!("\n{}\n", format_section_heading("Files")));
        for file in &session.files {
            let marker = if file.is_active { "*" } else { " " };
            match file.cursor {
                Some(c) => out.push_str(&format!("  {} {}:{}:{}\n", marker, file.path, c.line, c.column)),
                None => out.push_str(&format!("  {} {}\n", marker, file.path)),
            }
        }
    }
    if !session.extensions.is_empty() {
        let keys: Vec<&str> = session.extensions.keys().map(String::as_str).collect();
        out.push_str(&format!("  Extensions: {}\n", keys.join(", ")));
    }
    out
}

fn body_summary(body: &ScriptBody) -> String {
    match body {
        ScriptBody::Single { command } => command.clone(),
        ScriptBody::Sequence { commands } => format!("{} commands", commands.len()),
    }
}

pub fn format_script_list(scripts: &[Script]) -> String {
    if scripts.is_empty() {
        return "No scripts found.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Name", "ID", "Mode", "Commands"]);
    for s in scripts {
        table.add_row(vec![
            s.name.clone(),
            short(&s.id).to_string(),
            s.execution_mode.to_string(),
            body_summary(&s.body),
        ]);
    }
    format!("{}\n\nTotal: {} script(s)", table, scripts.len())
}

pub fn format_script(script: &Script) -> String {
    let mut out = format!("{}\n", format_section_heading(&format!("Script {}", script.name)));
    out.push_str(&format!("  ID: {}\n", script.id));
    out.push_str(&format!("  Root: {}\n", script.root_path));
    out.push_str(&format!("  Mode: {}\n", script.execution_mode));
    out.push_str(&format!(
        "  Close terminal after run: {}\n\n",
        script.close_terminal_after_execution
    ));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Priority", "Name", "Command"]);
    for c in script.body.ordered_commands() {
        table.add_row(vec![c.priority.to_string(), c.name, c.command]);
    }
    out.push_str(&table.to_string());
    out
}

pub fn format_collection_list(collections: &[TerminalCollection]) -> String {
    if collections.is_empty() {
        return "No terminal collections found.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Name", "ID", "Mode", "Lifecycle", "Scripts"]);
    for c in collections {
        let lifecycle = c
            .lifecycle
            .iter()
            .map(|e| format!("{:?}", e).to_lowercase())
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            c.name.clone(),
            short(&c.id).to_string(),
            c.execution_mode.to_string(),
            lifecycle,
            c.script_references.len().to_string(),
        ]);
    }
    table.to_string()
}

pub fn format_collection(collection: &TerminalCollection, resolved: &[ResolvedReference]) -> String {
    let mut out = format!(
        "{}\n",
        format_section_heading(&format!("Collection {}", collection.name))
    );
    out.push_str(&format!("  ID: {}\n", collection.id));
    out.push_str(&format!("  Mode: {}\n", collection.execution_mode));
    out.push_str("  Scripts:\n");
    for reference in resolved {
        match reference {
            ResolvedReference::Resolved(script) => {
                out.push_str(&format!("    - {} ({})\n", script.name, short(&script.id)));
            }
            ResolvedReference::Dangling { id, root_path } => {
                out.push_str(&format!(
                    "    - {} {} in {}\n",
                    "missing".yellow(),
                    short(id),
                    root_path
                ));
            }
        }
    }
    out
}

pub fn format_script_run(run: &ScriptRunReport) -> String {
    let mut out = String::new();
    for c in &run.commands {
        let code = c
            .exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!("$ {}  (exit {}, {} ms)\n", c.command, code, c.duration_ms));
        if !c.stdout.is_empty() {
            out.push_str(&c.stdout);
            if !c.stdout.ends_with('\n') {
                out.push('\n');
            }
        }
    }
    let status = match &run.status {
        ScriptRunStatus::Completed => format!("{}", "completed".green()),
        ScriptRunStatus::Launched => format!("{}", "launched in new terminal".green()),
        ScriptRunStatus::Failed { command, reason } => {
            format!("{}: `{}` {}", "failed".red(), command, reason)
        }
    };
    out.push_str(&format!("{} {}", run.script_name.bold(), status));
    out
}

pub fn format_collection_run(run: &CollectionRunReport) -> String {
    let mut out = format!(
        "{}\n",
        format_section_heading(&format!("Collection {}", run.collection_name))
    );
    for script in &run.scripts {
        out.push_str(&format_script_run(script));
        out.push('\n');
    }
    for dangling in &run.dangling {
        out.push_str(&format!("{} {}\n", "skipped missing script".yellow(), dangling.id));
    }
    out
}

pub fn format_git_status(status: &GitStatus) -> String {
    if status.is_clean() {
        return "Working tree clean.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Status", "Staged", "Path"]);
    for f in &status.files {
        let path = match &f.orig_path {
            Some(orig) => format!("{} -> {}", orig, f.path),
            None => f.path.clone(),
        };
        table.add_row(vec![
            format!("{:?}", f.kind).to_lowercase(),
            if f.staged { "yes" } else { "no" }.to_string(),
            path,
        ]);
    }
    let dirty = if status.is_dirty { "dirty" } else { "untracked files only" };
    format!("{}\n\n{} file(s), {}", table, status.files.len(), dirty)
}

pub fn format_stash_list(stashes: &[StashEntry]) -> String {
    if stashes.is_empty() {
        return "No stashes.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Ref", "ID", "Created", "Message"]);
    for s in stashes {
        table.add_row(vec![
            s.reference.clone(),
            short(&s.id).to_string(),
            s.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            s.message.clone(),
        ]);
    }
    table.to_string()
}

pub fn format_resume_report(report: &ResumeReport) -> String {
    let mut out = format!(
        "{}\n",
        format_section_heading(&format!("Resume {}", report.session_name))
    );
    for step in &report.steps {
        let line = match &step.outcome {
            StepOutcome::Done(detail) => format!("  {} {:<16} {}", "ok".green(), step.step, detail),
            StepOutcome::Skipped(reason) => {
                format!("  {} {:<16} {}", "--".dimmed(), step.step, reason)
            }
            StepOutcome::Failed(error) => format!("  {} {:<16} {}", "!!".red(), step.step, error),
        };
        out.push_str(&line);
        out.push('\n');
    }
    for run in &report.script_runs {
        out.push_str(&format_script_run(run));
        out.push('\n');
    }
    for run in &report.collection_runs {
        out.push_str(&format_collection_run(run));
    }
    match &report.outcome {
        ResumeOutcome::Completed => out.push_str(&format!("\n{}", "Session resumed.".green())),
        ResumeOutcome::Cancelled => out.push_str(&format!("\n{}", "Resume cancelled.".yellow())),
        ResumeOutcome::Halted { step, error } => {
            out.push_str(&format!("\n{} at {}: {}", "Resume halted".red(), step, error))
        }
    }
    out
}
