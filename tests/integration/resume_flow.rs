//! Save and resume against a real repository and a real shell.

use crate::support::{config_with_store, git, git_available, init_repo};
use devsnap::app::AppContext;
use devsnap::script::{ExecutionMode, NewScript, ScriptBody, ScriptCommand};
use devsnap::session::{
    ResumeOptions, ResumeOutcome, ResumeStep, SaveSessionRequest, StepOutcome,
};
use std::fs;
use std::path::Path;

fn step(priority: u32, out: &Path, word: &str) -> ScriptCommand {
    ScriptCommand {
        priority,
        name: word.to_string(),
        command: format!("echo {} >> '{}'", word, out.display()),
    }
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread")]
async fn clean_session_resumes_and_runs_scripts_in_priority_order() {
    if !git_available() {
        return;
    }
    let store_dir = tempfile::tempdir().unwrap();
    let project_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let repo = init_repo(project_dir.path());
    let head = git(&repo, &["rev-parse", "HEAD"]);
    let out = out_dir.path().join("order.txt");

    let app = AppContext::new(config_with_store(store_dir.path()), false).unwrap();
    app.scripts
        .create(NewScript {
            name: "dev".to_string(),
            root_path: repo.clone(),
            body: ScriptBody::Sequence {
                commands: vec![
                    step(2, &out, "second"),
                    step(1, &out, "first"),
                    step(3, &out, "third"),
                ],
            },
            execution_mode: ExecutionMode::SameTerminal,
            close_terminal_after_execution: false,
        })
        .unwrap();

    let session = app
        .sessions
        .save(SaveSessionRequest {
            name: "morning".to_string(),
            project_root: repo.clone(),
            ..Default::default()
        })
        .await
        .unwrap();
    let snapshot = session.git.clone().unwrap();
    assert_eq!(snapshot.branch, "main");
    assert_eq!(snapshot.commit, head);
    assert!(!snapshot.is_dirty);

    let report = app
        .resume
        .resume("morning", ResumeOptions::default())
        .await
        .unwrap();

    assert_eq!(report.outcome, ResumeOutcome::Completed);
    assert_eq!(
        report.step(ResumeStep::CheckDirty),
        Some(&StepOutcome::Done("clean".to_string()))
    );
    assert!(matches!(
        report.step(ResumeStep::StashApply),
        Some(StepOutcome::Skipped(_))
    ));
    assert_eq!(
        fs::read_to_string(&out).unwrap(),
        "first\nsecond\nthird\n"
    );
    assert_eq!(report.script_runs.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn dirty_session_checkpoint_is_restored_on_its_branch() {
    if !git_available() {
        return;
    }
    let store_dir = tempfile::tempdir().unwrap();
    let project_dir = tempfile::tempdir().unwrap();
    let repo = init_repo(project_dir.path());
    git(&repo, &["branch", "feature"]);

    let app = AppContext::new(config_with_store(store_dir.path()), false).unwrap();
    fs::write(repo.join("README.md"), "half-finished thought\n").unwrap();

    let session = app
        .sessions
        .save(SaveSessionRequest {
            name: "wip".to_string(),
            project_root: repo.clone(),
            auto_stash: Some(true),
            ..Default::default()
        })
        .await
        .unwrap();
    let snapshot = session.git.unwrap();
    assert!(snapshot.is_dirty);
    assert!(snapshot.stash_id.is_some());
    assert_eq!(fs::read_to_string(repo.join("README.md")).unwrap(), "hello\n");

    git(&repo, &["checkout", "-q", "feature"]);

    let report = app
        .resume
        .resume(
            "wip",
            ResumeOptions {
                run_scripts: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .into_result()
        .unwrap();

    assert!(matches!(
        report.step(ResumeStep::BranchSwitch),
        Some(StepOutcome::Done(_))
    ));
    assert_eq!(git(&repo, &["branch", "--show-current"]), "main");
    assert_eq!(
        fs::read_to_string(repo.join("README.md")).unwrap(),
        "half-finished thought\n"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_project_root_fails_before_any_step() {
    let store_dir = tempfile::tempdir().unwrap();
    let project_dir = tempfile::tempdir().unwrap();
    let root = project_dir.path().join("app");
    fs::create_dir(&root).unwrap();

    let app = AppContext::new(config_with_store(store_dir.path()), false).unwrap();
    app.sessions
        .save(SaveSessionRequest {
            name: "gone".to_string(),
            project_root: root.clone(),
            ..Default::default()
        })
        .await
        .unwrap();
    fs::remove_dir(&root).unwrap();

    assert!(matches!(
        app.resume.resume("gone", ResumeOptions::default()).await,
        Err(devsnap::error::ApiError::ValidationError(_))
    ));
}
