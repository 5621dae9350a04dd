use clap::{CommandFactory, Parser};
use devsnap::session::DirtyChoice;
use devsnap::tooling::cli::{Cli, Commands, SessionCommands};

#[test]
fn parse_valid_command_matrix() {
    let cases: Vec<Vec<&str>> = vec![
        vec!["devsnap", "session", "save", "morning"],
        vec![
            "devsnap", "session", "save", "wip", "--tag", "parser", "--tag", "bug",
            "--file", "src/lib.rs:10:4", "--stash",
        ],
        vec!["devsnap", "session", "resume", "wip", "--on-dirty", "discard"],
        vec!["devsnap", "session", "resume", "wip", "--skip-scripts", "--ide", "code"],
        vec!["devsnap", "session", "list", "--all", "--format", "json"],
        vec!["devsnap", "session", "show", "wip"],
        vec!["devsnap", "session", "update", "wip", "--set", "theme=dark", "--unset", "old"],
        vec!["devsnap", "session", "delete", "wip", "--force"],
        vec!["devsnap", "session", "export", "wip", "/tmp/wip.json"],
        vec!["devsnap", "session", "import", "/tmp/wip.json"],
        vec!["devsnap", "script", "add", "dev", "--command", "npm install", "--command", "npm run dev"],
        vec!["devsnap", "script", "add", "serve", "--command", "make serve", "--mode", "new-terminals", "--close"],
        vec!["devsnap", "script", "list"],
        vec!["devsnap", "script", "show", "dev"],
        vec!["devsnap", "script", "run", "dev", "--mode", "same-terminal"],
        vec!["devsnap", "script", "delete", "dev", "serve", "--force"],
        vec!["devsnap", "script", "purge", "--force"],
        vec!["devsnap", "script", "add-command", "dev", "lint", "npm run lint", "--priority", "2"],
        vec!["devsnap", "script", "remove-command", "dev", "lint"],
        vec!["devsnap", "script", "reorder", "dev", "step2", "step1"],
        vec!["devsnap", "collection", "add", "boot", "--script", "dev", "--on", "resume"],
        vec!["devsnap", "collection", "list", "--all"],
        vec!["devsnap", "collection", "show", "boot"],
        vec!["devsnap", "collection", "run", "boot"],
        vec!["devsnap", "collection", "delete", "boot", "--force"],
        vec!["devsnap", "git", "status", "--format", "json"],
        vec!["devsnap", "git", "stashes"],
        vec!["devsnap", "git", "commit", "-m", "wip"],
        vec!["devsnap", "config", "show"],
        vec!["devsnap", "config", "set", "default_ide", "zed"],
        vec!["devsnap", "--project", "/work/app", "--verbose", "session", "list"],
        vec!["devsnap", "session", "list", "--log-level", "debug", "--non-interactive"],
    ];

    for args in cases {
        let parsed = Cli::try_parse_from(args.clone());
        assert!(parsed.is_ok(), "expected valid parse for args: {args:?}: {:?}", parsed.err());
    }
}

#[test]
fn parse_rejects_invalid_values() {
    let invalid: Vec<Vec<&str>> = vec![
        vec!["devsnap", "session", "resume", "wip", "--on-dirty", "maybe"],
        vec!["devsnap", "script", "add", "dev", "--command", "x", "--mode", "tmux"],
        vec!["devsnap", "script", "add", "dev"],
        vec!["devsnap", "collection", "add", "boot", "--script", "dev", "--on", "startup"],
        vec!["devsnap", "session", "save", "wip", "--stash", "--no-stash"],
        vec!["devsnap", "session", "update", "wip", "--notes", "x", "--clear-notes"],
        vec!["devsnap", "script", "delete"],
    ];
    for args in invalid {
        assert!(Cli::try_parse_from(args.clone()).is_err(), "expected rejection: {args:?}");
    }
}

#[test]
fn resume_flags_map_to_options() {
    let cli = Cli::try_parse_from([
        "devsnap", "session", "resume", "wip", "--on-dirty", "save", "--skip-scripts",
    ])
    .unwrap();
    match cli.command {
        Commands::Session {
            command:
                SessionCommands::Resume {
                    session,
                    on_dirty,
                    skip_scripts,
                    open_ide,
                    ..
                },
        } => {
            assert_eq!(session, "wip");
            assert_eq!(on_dirty, Some(DirtyChoice::Save));
            assert!(skip_scripts);
            assert!(!open_ide);
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn command_definition_is_consistent() {
    Cli::command().debug_assert();
}
