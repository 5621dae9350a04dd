use crate::support::{git, git_available, init_repo};
use devsnap::error::ApiError;
use devsnap::git::{FileStatusKind, GitClient, ShellGit};
use std::fs;
use std::time::Duration;

fn client() -> ShellGit {
    ShellGit::new(Duration::from_secs(20))
}

#[tokio::test]
async fn reports_branch_commit_and_status() {
    if !git_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let repo = init_repo(dir.path());
    let git_client = client();

    assert!(git_client.is_repository(&repo).await);
    assert_eq!(git_client.current_branch(&repo).await.unwrap(), "main");
    assert_eq!(
        git_client.current_commit(&repo).await.unwrap(),
        git(&repo, &["rev-parse", "HEAD"])
    );
    assert!(git_client.status(&repo).await.unwrap().is_clean());

    fs::write(repo.join("README.md"), "changed\n").unwrap();
    fs::write(repo.join("notes.txt"), "new\n").unwrap();
    let status = git_client.status(&repo).await.unwrap();
    assert!(status.is_dirty);
    assert_eq!(status.modified_files(), vec!["README.md"]);
    assert_eq!(status.untracked_files(), vec!["notes.txt"]);
    assert!(status
        .files
        .iter()
        .all(|f| f.kind != FileStatusKind::Deleted));
}

#[tokio::test]
async fn plain_directory_is_not_a_repository() {
    if !git_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let git_client = client();
    assert!(!git_client.is_repository(dir.path()).await);
    assert!(matches!(
        git_client.status(dir.path()).await,
        Err(ApiError::GitNotRepository(_))
    ));
}

#[tokio::test]
async fn checkpoint_round_trip_restores_changes() {
    if !git_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let repo = init_repo(dir.path());
    let git_client = client();

    fs::write(repo.join("README.md"), "work in progress\n").unwrap();
    fs::write(repo.join("scratch.txt"), "untracked\n").unwrap();

    let outcome = git_client
        .create_stash(&repo, Some("before lunch"))
        .await
        .unwrap();
    assert!(outcome.success, "{:?}", outcome.error);
    let stash_id = outcome.stash_id.unwrap();
    assert!(git_client.status(&repo).await.unwrap().is_clean());

    let stashes = git_client.list_stashes(&repo).await.unwrap();
    assert_eq!(stashes.len(), 1);
    assert_eq!(stashes[0].id, stash_id);
    assert!(stashes[0].message.contains("before lunch"));

    let applied = git_client.apply_stash(&repo, &stash_id).await.unwrap();
    assert!(applied.conflicts.is_empty());
    assert_eq!(
        fs::read_to_string(repo.join("README.md")).unwrap(),
        "work in progress\n"
    );
    assert!(repo.join("scratch.txt").exists());

    // Apply keeps the stash; drop removes it.
    git_client.delete_stash(&repo, &stash_id).await.unwrap();
    assert!(git_client.list_stashes(&repo).await.unwrap().is_empty());
    assert!(matches!(
        git_client.apply_stash(&repo, &stash_id).await,
        Err(ApiError::NotFound(_))
    ));
}

#[tokio::test]
async fn checkpoint_of_clean_tree_is_a_soft_failure() {
    if !git_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let repo = init_repo(dir.path());
    let outcome = client().create_stash(&repo, None).await.unwrap();
    assert!(!outcome.success);
    assert!(outcome.stash_id.is_none());
    assert!(outcome.error.is_some());
}

#[tokio::test]
async fn conflicting_apply_reports_conflicted_files() {
    if !git_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let repo = init_repo(dir.path());
    let git_client = client();

    fs::write(repo.join("README.md"), "from the stash\n").unwrap();
    let stash_id = git_client
        .create_stash(&repo, None)
        .await
        .unwrap()
        .stash_id
        .unwrap();

    fs::write(repo.join("README.md"), "committed meanwhile\n").unwrap();
    git(&repo, &["commit", "-q", "-am", "diverge"]);

    let applied = git_client.apply_stash(&repo, &stash_id).await.unwrap();
    assert_eq!(applied.conflicts, vec!["README.md".to_string()]);
}

#[tokio::test]
async fn commit_stages_everything_and_returns_new_head() {
    if !git_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let repo = init_repo(dir.path());
    let git_client = client();

    assert!(matches!(
        git_client.commit_changes(&repo, "nothing").await,
        Err(ApiError::ValidationError(_))
    ));

    fs::write(repo.join("src.rs"), "fn main() {}\n").unwrap();
    let hash = git_client
        .commit_changes(&repo, "add src\n\nwith a body line")
        .await
        .unwrap();
    assert_eq!(hash, git(&repo, &["rev-parse", "HEAD"]));
    assert_eq!(git(&repo, &["log", "-1", "--format=%s"]), "add src");
    assert!(git_client.status(&repo).await.unwrap().is_clean());
}

#[tokio::test]
async fn checkout_and_discard() {
    if !git_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let repo = init_repo(dir.path());
    let git_client = client();
    git(&repo, &["branch", "feature"]);

    git_client.checkout(&repo, "feature").await.unwrap();
    assert_eq!(git_client.current_branch(&repo).await.unwrap(), "feature");
    assert!(matches!(
        git_client.checkout(&repo, "--orphan").await,
        Err(ApiError::ValidationError(_))
    ));

    fs::write(repo.join("README.md"), "scribble\n").unwrap();
    git_client.discard_changes(&repo).await.unwrap();
    assert_eq!(fs::read_to_string(repo.join("README.md")).unwrap(), "hello\n");
}
