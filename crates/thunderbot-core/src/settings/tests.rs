use super::watcher::{classify, debounce_changes, FileChange};
use super::*;
use notify::event::{CreateKind, DataChange, MetadataKind, ModifyKind, RemoveKind, RenameMode};
use notify::EventKind;
use std::time::Duration;
use tokio::sync::mpsc;

const FULL_SETTINGS: &str = r#"{
    "bot": {
        "answer_groups": true,
        "show_online_status": true,
        "log_messages": {
            "activated": true,
            "maximum_logsize_bytes": 2048,
            "directory": "logs"
        },
        "events": {
            "on_message_received": [
                {
                    "case_sensitivity": false,
                    "message_exact_text": ["oi", "olá"],
                    "message_contains_text": ["pizza"],
                    "answer_to_exact_text": "Hello!",
                    "answer_to_contains_text": "We sell pizza!"
                },
                {
                    "case_sensitivity": true,
                    "message_exact_text": ["Menu"],
                    "answer_to_exact_text": "See attached menu"
                }
            ]
        },
        "default_answer": {
            "answer": "Bye",
            "answer_by_timeofday_enabled": true,
            "answers": {
                "morning": "Good morning",
                "afternoon": "Good afternoon",
                "night": "Good night",
                "dawn": "Still up?"
            }
        }
    }
}"#;

fn temp_settings(name: &str, content: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("__thunderbot_test_{name}__"));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("settings.json");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_parse_full_settings() {
    let settings = parse(FULL_SETTINGS).unwrap();
    assert!(settings.answer_groups);
    assert!(settings.show_online_status);
    assert!(settings.logging.enabled);
    assert_eq!(settings.logging.max_size_bytes, 2048);
    assert_eq!(settings.logging.directory, "logs");

    let rules = settings.rules();
    assert_eq!(rules.len(), 2);
    assert!(!rules[0].case_sensitive);
    assert_eq!(rules[0].exact_texts, vec!["oi", "olá"]);
    assert_eq!(rules[0].contains_texts, vec!["pizza"]);
    assert_eq!(rules[0].answer_to_exact, "Hello!");
    assert_eq!(rules[0].answer_to_contains, "We sell pizza!");
    assert!(rules[1].case_sensitive);
    assert!(rules[1].contains_texts.is_empty());
    assert!(rules[1].answer_to_contains.is_empty());

    assert_eq!(settings.default_answer.text.as_deref(), Some("Bye"));
    assert!(settings.default_answer.by_time_of_day);
    assert_eq!(settings.default_answer.time_of_day.dawn, "Still up?");
}

#[test]
fn test_parse_minimal_settings_uses_defaults() {
    let settings = parse(r#"{"bot": {}}"#).unwrap();
    assert!(!settings.answer_groups);
    assert!(!settings.show_online_status);
    assert!(!settings.logging.enabled);
    assert_eq!(settings.logging.max_size_bytes, 0);
    assert_eq!(settings.logging.directory, ".");
    assert!(settings.rules().is_empty());
    assert!(settings.default_answer.text.is_none());
    assert!(!settings.default_answer.by_time_of_day);
}

#[test]
fn test_parse_log_size_as_numeric_string() {
    let settings = parse(
        r#"{"bot": {"log_messages": {"activated": true, "maximum_logsize_bytes": " 4096 "}}}"#,
    )
    .unwrap();
    assert_eq!(settings.logging.max_size_bytes, 4096);
}

#[test]
fn test_logging_without_cap_rotates_every_message() {
    let uncapped = parse(r#"{"bot": {"log_messages": {"activated": true}}}"#).unwrap();
    assert!(uncapped.logging.rotates_every_message());

    let disabled = parse(r#"{"bot": {"log_messages": {"activated": false}}}"#).unwrap();
    assert!(!disabled.logging.rotates_every_message());

    let capped = parse(FULL_SETTINGS).unwrap();
    assert!(!capped.logging.rotates_every_message());
}

#[test]
fn test_load_accepts_logging_without_cap() {
    let path = temp_settings(
        "uncapped_log",
        r#"{"bot": {"log_messages": {"activated": true}}}"#,
    );
    let settings = load(&path).unwrap();
    assert!(settings.logging.enabled);
    assert_eq!(settings.logging.max_size_bytes, 0);
}

#[test]
fn test_parse_log_size_rejects_garbage() {
    let result = parse(r#"{"bot": {"log_messages": {"maximum_logsize_bytes": "lots"}}}"#);
    assert!(matches!(result, Err(BotError::Settings(_))));

    let result = parse(r#"{"bot": {"log_messages": {"maximum_logsize_bytes": -5}}}"#);
    assert!(result.is_err(), "negative sizes must be rejected");
}

#[test]
fn test_parse_non_string_default_answer_is_absent() {
    for raw in ["42", "false", "null", "[\"a\"]", "{}"] {
        let doc = format!(r#"{{"bot": {{"default_answer": {{"answer": {raw}}}}}}}"#);
        let settings = parse(&doc).unwrap();
        assert!(
            settings.default_answer.text.is_none(),
            "answer {raw} should be read as absent"
        );
    }
}

#[test]
fn test_parse_rejects_missing_bot_object() {
    assert!(matches!(
        parse(r#"{"answer_groups": true}"#),
        Err(BotError::Settings(_))
    ));
}

#[test]
fn test_parse_rejects_malformed_json() {
    let err = parse("{ \"bot\": ").unwrap_err();
    assert!(err.to_string().contains("failed to parse settings"));
}

#[test]
fn test_load_missing_file_is_an_error() {
    let path = std::env::temp_dir().join("__thunderbot_test_missing__/settings.json");
    let err = load(&path).unwrap_err();
    assert!(err.to_string().contains("not found"), "got: {err}");
}

#[test]
fn test_store_open_and_snapshot() {
    let path = temp_settings("store_open", FULL_SETTINGS);
    let store = SettingsStore::open(&path).unwrap();
    assert_eq!(store.path(), path.as_path());
    assert_eq!(store.snapshot().rules().len(), 2);
}

#[test]
fn test_store_reload_replaces_snapshot() {
    let path = temp_settings("store_reload", FULL_SETTINGS);
    let mut store = SettingsStore::open(&path).unwrap();
    let before = store.snapshot();

    std::fs::write(&path, r#"{"bot": {"answer_groups": false}}"#).unwrap();
    let after = store.reload().unwrap();

    assert!(!after.answer_groups);
    assert!(after.rules().is_empty());
    // Snapshots handed out earlier are untouched.
    assert!(before.answer_groups);
    assert_eq!(before.rules().len(), 2);
}

#[test]
fn test_store_reload_failure_keeps_previous() {
    let path = temp_settings("store_reload_fail", FULL_SETTINGS);
    let mut store = SettingsStore::open(&path).unwrap();

    std::fs::write(&path, "{ not json").unwrap();
    assert!(store.reload().is_err());
    assert_eq!(store.snapshot().rules().len(), 2);

    std::fs::remove_file(&path).unwrap();
    assert!(store.reload().is_err());
    assert!(store.snapshot().answer_groups);
}

#[test]
fn test_classify_events() {
    assert_eq!(
        classify(&EventKind::Modify(ModifyKind::Data(DataChange::Content))),
        Some(FileChange::Modified)
    );
    assert_eq!(
        classify(&EventKind::Modify(ModifyKind::Any)),
        Some(FileChange::Modified)
    );
    assert_eq!(
        classify(&EventKind::Create(CreateKind::File)),
        Some(FileChange::Modified)
    );
    assert_eq!(
        classify(&EventKind::Modify(ModifyKind::Name(RenameMode::From))),
        Some(FileChange::Renamed)
    );
    assert_eq!(
        classify(&EventKind::Remove(RemoveKind::File)),
        Some(FileChange::Renamed)
    );
    assert_eq!(
        classify(&EventKind::Modify(ModifyKind::Metadata(MetadataKind::AccessTime))),
        None
    );
}

#[tokio::test]
async fn test_debounce_collapses_burst() {
    let (raw_tx, raw_rx) = mpsc::unbounded_channel();
    let (tx, mut rx) = mpsc::channel(8);
    tokio::spawn(debounce_changes(raw_rx, tx, Duration::from_millis(50)));

    for _ in 0..5 {
        raw_tx.send(FileChange::Modified).unwrap();
    }

    assert_eq!(rx.recv().await, Some(SettingsSignal::Changed));
    // Nothing else pending after the burst.
    let extra = tokio::time::timeout(Duration::from_millis(150), rx.recv()).await;
    assert!(extra.is_err(), "burst should produce exactly one signal");

    raw_tx.send(FileChange::Modified).unwrap();
    assert_eq!(rx.recv().await, Some(SettingsSignal::Changed));
}

#[tokio::test]
async fn test_debounce_rename_is_lost() {
    let (raw_tx, raw_rx) = mpsc::unbounded_channel();
    let (tx, mut rx) = mpsc::channel(8);
    tokio::spawn(debounce_changes(raw_rx, tx, Duration::from_millis(50)));

    raw_tx.send(FileChange::Modified).unwrap();
    raw_tx.send(FileChange::Renamed).unwrap();

    assert_eq!(rx.recv().await, Some(SettingsSignal::Lost));
    assert_eq!(rx.recv().await, None, "stream ends after Lost");
}

#[tokio::test]
async fn test_watch_reports_write_then_rename() {
    let path = temp_settings("watch_file", FULL_SETTINGS);
    let (_watcher, mut rx) = watch(&path, Duration::from_millis(100)).unwrap();

    std::fs::write(&path, FULL_SETTINGS.replace("Hello!", "Hi!")).unwrap();
    let signal = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
    assert_eq!(signal.unwrap(), Some(SettingsSignal::Changed));

    std::fs::rename(&path, path.with_extension("bak")).unwrap();
    // Late write notifications may still fold into one more reload before the rename lands.
    let lost = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match rx.recv().await {
                Some(SettingsSignal::Changed) => continue,
                other => break other,
            }
        }
    })
    .await;
    assert_eq!(lost.unwrap(), Some(SettingsSignal::Lost));
}
