use crate::support::config_with_store;
use devsnap::app::AppContext;
use devsnap::error::{ApiError, StorageError};
use devsnap::script::{ExecutionMode, NewScript, ScriptBody};
use devsnap::store::{self, FsRecordStore, RecordStore};
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
struct Doc {
    #[serde(default)]
    items: Vec<String>,
}

#[test]
fn app_with_encryption_enabled_writes_only_ciphertext() {
    let dir = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    std::env::set_var("DEVSNAP_IT_STORE_PASSPHRASE", "correct horse");

    let mut config = config_with_store(dir.path());
    config.storage.encryption.enabled = true;
    config.storage.encryption.passphrase_env = "DEVSNAP_IT_STORE_PASSPHRASE".to_string();
    let app = AppContext::new(config.clone(), false).unwrap();

    app.scripts
        .create(NewScript {
            name: "build".to_string(),
            root_path: project.path().to_path_buf(),
            body: ScriptBody::Single {
                command: "cargo build --release".to_string(),
            },
            execution_mode: ExecutionMode::SameTerminal,
            close_terminal_after_execution: false,
        })
        .unwrap();
    app.preferences.set("default_ide", "zed").unwrap();

    let keys = app.store.list("").unwrap();
    assert!(keys.len() >= 3, "expected script, index and preference records: {keys:?}");
    for key in &keys {
        let raw = fs::read_to_string(app.store.locate(key).unwrap()).unwrap();
        assert!(raw.starts_with("DEVSNAP-ENC1:"), "{key} is not encrypted");
        assert!(!raw.contains("cargo build"));
    }

    // Reopening with the same passphrase sees everything.
    let reopened = AppContext::new(config, false).unwrap();
    assert_eq!(reopened.scripts.list(Some(project.path())).unwrap().len(), 1);
    assert_eq!(
        reopened.preferences.load().unwrap().default_ide.as_deref(),
        Some("zed")
    );

    // A plaintext store over the same root refuses to decrypt and never heals.
    let plain = FsRecordStore::open(dir.path()).unwrap();
    let key = keys.iter().find(|k| k.starts_with("config/")).unwrap();
    assert!(matches!(
        plain.read(key),
        Err(StorageError::DecryptionFailed(_))
    ));
    assert!(store::load_or_default::<Doc>(&plain, key).is_err());
    assert!(plain.exists(key));
}

#[test]
fn enabling_encryption_without_passphrase_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_with_store(dir.path());
    config.storage.encryption.enabled = true;
    config.storage.encryption.passphrase_env = "DEVSNAP_IT_UNSET_PASSPHRASE".to_string();
    assert!(matches!(
        AppContext::new(config, false),
        Err(ApiError::ConfigError(_))
    ));
}

#[test]
fn corrupt_bookkeeping_record_is_quarantined_and_reset() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsRecordStore::open(dir.path()).unwrap();
    store.write("index/scripts.json", b"{ not json").unwrap();

    let loaded = store::load_or_default::<Doc>(&store, "index/scripts.json").unwrap();
    assert!(loaded.was_healed());
    assert_eq!(loaded.into_inner(), Doc::default());

    let index_dir = dir.path().join("index");
    let quarantined: Vec<_> = fs::read_dir(&index_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.contains(".corrupt-"))
        .collect();
    assert_eq!(quarantined.len(), 1);
    assert_eq!(
        fs::read(index_dir.join(&quarantined[0])).unwrap(),
        b"{ not json"
    );
    assert_eq!(store.list("index/").unwrap(), vec!["index/scripts.json"]);
}
