//! Saving pending edits through a grid session.

mod common;

use std::sync::Arc;

use common::{ScriptedStore, annotation, session};
use fbg_model::{EditBuffer, NoticeKind, Notices, WriteErrorKind};
use fbg_persistence::EditMirror;
use tempfile::tempdir;

#[tokio::test(start_paused = true)]
async fn test_empty_save_makes_no_store_calls() {
    let store = Arc::new(ScriptedStore::default());
    let session = session(store.clone(), Notices::log_only(), None);
    session.open().await;
    let before = store.calls();

    let result = session.save().await;

    assert!(!result.success);
    assert_eq!(result.message.as_deref(), Some("no changes"));
    assert_eq!(store.calls(), before);
}

#[tokio::test(start_paused = true)]
async fn test_save_appends_next_version_and_clears_buffer() {
    let store = Arc::new(ScriptedStore::with_records(vec![annotation(
        "Acme",
        1,
        "ann",
        &[("status", "Open"), ("comments", "first call")],
    )]));
    let dir = tempdir().unwrap();
    let mirror = EditMirror::in_dir(dir.path());
    let session = session(store.clone(), Notices::log_only(), Some(mirror.clone()));
    session.open().await;

    assert!(session.edit("Acme", "status", "Done"));
    assert!(mirror.path().exists());
    assert_eq!(session.view().rows[0].overlay_text("status"), "Done");

    let result = session.save().await;
    assert!(result.success, "{:?}", result.errors);
    assert_eq!((result.success_count, result.total_count), (1, 1));
    assert_eq!(result.saved_keys, vec!["Acme".to_string()]);

    let history = store.records_for("Acme");
    assert_eq!(history.len(), 2);
    let saved = &history[1];
    assert_eq!(saved.version, 2);
    assert_eq!(saved.created_by, "ann");
    assert_eq!(saved.created_at, history[0].created_at);
    assert_eq!(saved.modified_by, "carol");
    assert_eq!(saved.session_id, "carol-session");
    assert_eq!(saved.field("status"), Some("Done"));
    assert_eq!(saved.field("comments"), Some("first call"));
    assert_eq!(saved.field("customer"), Some("Acme"));
    assert_eq!(saved.field("revenue"), Some("0"));

    let view = session.view();
    assert_eq!(view.pending_edits, 0);
    assert_eq!(view.rows[0].overlay_text("status"), "Done");
    assert!(!mirror.path().exists());
}

#[tokio::test(start_paused = true)]
async fn test_partial_failure_keeps_edit_buffer() {
    let store = Arc::new(ScriptedStore::default());
    store.fail_appends_for("Beta");
    let dir = tempdir().unwrap();
    let mirror = EditMirror::in_dir(dir.path());
    let (notices, mut receiver) = Notices::channel();
    let session = session(store.clone(), notices, Some(mirror.clone()));
    session.open().await;

    session.edit("Acme", "status", "Done");
    session.edit("Beta", "status", "Blocked");
    let result = session.save().await;

    assert!(!result.success);
    assert_eq!((result.success_count, result.total_count), (1, 2));
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].key, "Beta");
    assert_eq!(result.errors[0].kind, WriteErrorKind::AppendFailed);

    assert_eq!(session.pending_edits().len(), 2);
    assert!(mirror.path().exists());
    assert_eq!(store.records_for("Acme").len(), 1);
    assert_eq!(
        receiver.try_recv().unwrap().kind,
        NoticeKind::PartialBatchFailure
    );
}

#[tokio::test(start_paused = true)]
async fn test_version_conflict_rereads_history() {
    let store = Arc::new(ScriptedStore::default());
    store.race_once_for("Acme");
    let session = session(store.clone(), Notices::log_only(), None);
    session.open().await;

    session.edit("Acme", "comments", "ours");
    let result = session.save().await;

    assert!(result.success, "{:?}", result.errors);
    let history = store.records_for("Acme");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].modified_by, "rival");
    assert_eq!(history[1].version, 2);
    assert_eq!(history[1].modified_by, "carol");
    assert_eq!(history[1].created_by, "carol");
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_conflict_retries_fail_the_item() {
    let store = Arc::new(ScriptedStore::default());
    store.always_conflict_for("Acme");
    let (notices, mut receiver) = Notices::channel();
    let session = session(store.clone(), notices, None);
    session.open().await;

    session.edit("Acme", "status", "Done");
    let result = session.save().await;

    assert!(!result.success);
    assert_eq!(result.errors[0].kind, WriteErrorKind::VersionConflict);
    assert_eq!(
        receiver.try_recv().unwrap().kind,
        NoticeKind::VersionConflict
    );
    assert_eq!(
        receiver.try_recv().unwrap().kind,
        NoticeKind::PartialBatchFailure
    );
    assert_eq!(session.pending_edits().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_highest_version_fails_the_item_without_appending() {
    let mut latest = annotation("Acme", 1, "ann", &[("status", "Open")]);
    latest.version = u32::MAX;
    let store = Arc::new(ScriptedStore::with_records(vec![latest]));
    let session = session(store.clone(), Notices::log_only(), None);
    session.open().await;

    session.edit("Acme", "status", "Done");
    session.edit("Beta", "status", "Blocked");
    let result = session.save().await;

    assert!(!result.success);
    assert_eq!((result.success_count, result.total_count), (1, 2));
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].key, "Acme");
    assert_eq!(result.errors[0].kind, WriteErrorKind::VersionExhausted);
    assert_eq!(store.records_for("Acme").len(), 1);
    assert_eq!(store.records_for("Beta").len(), 1);
    assert_eq!(session.pending_edits().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_edits_for_rows_off_page_are_skipped() {
    let store = Arc::new(ScriptedStore::default());
    let session = session(store.clone(), Notices::log_only(), None);
    session.open().await;
    let before = store.calls();

    session.edit("customer-150", "status", "Done");
    let result = session.save().await;

    assert_eq!(result.message.as_deref(), Some("no changes"));
    assert_eq!(result.skipped_keys, vec!["customer-150".to_string()]);
    assert_eq!(store.calls(), before);
    assert_eq!(session.pending_edits().len(), 1);

    session.go_to_page(2).await.unwrap();
    assert!(session.save().await.success);
    assert!(session.pending_edits().is_empty());
}

#[tokio::test]
async fn test_mirrored_edits_are_restored() {
    let dir = tempdir().unwrap();
    let mirror = EditMirror::in_dir(dir.path());
    let mut changes = EditBuffer::new();
    changes.set("Beta", "comments", "from last time");
    mirror.store(&changes, "carol").unwrap();

    let session = session(
        Arc::new(ScriptedStore::default()),
        Notices::log_only(),
        Some(mirror),
    );
    assert_eq!(session.pending_edits(), changes);

    session.open().await;
    assert_eq!(
        session.view().rows[1].overlay_text("comments"),
        "from last time"
    );
}

#[tokio::test]
async fn test_unknown_overlay_is_rejected() {
    let session = session(Arc::new(ScriptedStore::default()), Notices::log_only(), None);
    assert!(!session.edit("Acme", "revenue", "1"));
    assert!(session.pending_edits().is_empty());
}
