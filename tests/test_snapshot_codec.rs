//! Integration tests for the durable snapshot codec.
//!
//! Tests cover:
//! - Round-trip persistence across store reopens
//! - Fresh defaults on missing or corrupt data
//! - Self-healing re-persist of coerced legacy snapshots
//! - Quota failures leaving the store untouched

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::*;

#[test]
fn test_round_trip_across_reopen() -> anyhow::Result<()> {
    // 1. Build some state
    let (mut store, dir) = create_test_store();
    let item = store.add_checklist_item(new_item("Buy milk"))?;
    store.toggle_checklist_item(item.id)?;
    let tag = store.add_tag(new_tag("Errands"))?;
    store.toggle_tag_on_item(EntityKind::Checklist, item.id, tag.id)?;
    store.add_note(new_note("Journal"))?;

    // 2. Reopen as a fresh process would
    let reopened = reopen_store(&dir);
    assert_eq!(*store.snapshot(), *reopened.snapshot());

    let state = reopened.snapshot();
    assert!(state.checklist[0].checked);
    assert_eq!(state.checklist[0].tags, vec![tag.id]);
    assert_eq!(state.notes[0].title, "Journal");

    Ok(())
}

#[test]
fn test_missing_snapshot_yields_defaults() -> anyhow::Result<()> {
    let (store, _dir) = create_test_store();
    let state = store.snapshot();
    assert!(!state.has_data());
    assert_eq!(state.schema_version, SCHEMA_VERSION);
    assert_eq!(state.settings.theme, Theme::Light);
    assert_eq!(state.settings.panel_layout.split_ratio, 50.0);
    assert_eq!(state.settings.panel_layout.collapsed, Collapsed::None);
    Ok(())
}

#[test]
fn test_corrupt_snapshot_yields_defaults() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    std::fs::write(dir.path().join("state.json"), "{not json at all")?;

    let store = Store::open(dir.path())?;
    assert!(!store.snapshot().has_data());
    assert_eq!(store.snapshot().schema_version, SCHEMA_VERSION);
    Ok(())
}

#[test]
fn test_load_heals_and_repersists_legacy_snapshot() -> anyhow::Result<()> {
    // 1. Legacy blob: bad id, unknown theme, out-of-range ratio
    let medium = MemoryMedium::new();
    medium.set_contents(
        r#"{
            "schemaVersion": 1,
            "settings": {"theme": "purple", "panelLayout": {"splitRatio": 250.0}},
            "checklist": [{"id": "todo-1", "title": "A", "descriptionHtml": ""}]
        }"#,
    );

    // 2. Load coerces every bad field
    let store = Store::with_medium(Box::new(medium.clone()));
    let state = store.snapshot();
    assert_eq!(state.schema_version, SCHEMA_VERSION);
    assert_eq!(state.settings.theme, Theme::Light);
    assert_eq!(state.settings.panel_layout.split_ratio, 100.0);
    assert!(is_canonical_id(&state.checklist[0].id.to_string()));

    // 3. The healed form was written straight back
    let healed: serde_json::Value =
        serde_json::from_str(&medium.contents().expect("nothing persisted"))?;
    assert_eq!(healed["schemaVersion"], SCHEMA_VERSION);
    assert_eq!(healed["settings"]["theme"], "light");
    assert_eq!(
        healed["checklist"][0]["id"],
        state.checklist[0].id.to_string()
    );

    Ok(())
}

#[test]
fn test_alarm_with_unreadable_schedule_is_dropped() -> anyhow::Result<()> {
    let medium = MemoryMedium::new();
    medium.set_contents(
        r#"{
            "schemaVersion": 2,
            "checklist": [{
                "id": "item-1", "title": "A", "descriptionHtml": "",
                "alarm": {"id": "alarm-1", "at": "tomorrow-ish", "repeat": "daily"}
            }]
        }"#,
    );

    let store = Store::with_medium(Box::new(medium));
    assert!(store.snapshot().checklist[0].alarm.is_none());
    Ok(())
}

#[test]
fn test_quota_failure_leaves_store_untouched() -> anyhow::Result<()> {
    // 1. One successful mutation while space remains
    let medium = QuotaMedium::new();
    let mut store = Store::with_medium(Box::new(medium.clone()));
    let item = store.add_checklist_item(new_item("Buy milk"))?;
    assert_eq!(store.undo_depth(), 1);

    let notified = Arc::new(AtomicUsize::new(0));
    let calls = Arc::clone(&notified);
    store.subscribe(move |_| {
        calls.fetch_add(1, Ordering::SeqCst);
    });

    // 2. The medium fills up; the next edit must fail loudly
    medium.set_full(true);
    let before = store.snapshot();
    let err = store
        .update_checklist_item(
            item.id,
            ChecklistItemUpdate {
                title: Some("Buy oat milk".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::QuotaExceeded));

    // 3. In-memory state, history, and listeners are all untouched
    assert!(Arc::ptr_eq(&before, &store.snapshot()));
    assert_eq!(store.undo_depth(), 1);
    assert_eq!(notified.load(Ordering::SeqCst), 0);

    // 4. Undo hits the same wall and also leaves everything in place
    let err = store.undo().unwrap_err();
    assert!(matches!(err, StoreError::QuotaExceeded));
    assert_eq!(store.undo_depth(), 1);
    assert!(!store.can_redo());

    // 5. Space returns; the held-back edit persists normally
    medium.set_full(false);
    store.update_checklist_item(
        item.id,
        ChecklistItemUpdate {
            title: Some("Buy oat milk".to_string()),
            ..Default::default()
        },
    )?;
    assert_eq!(store.snapshot().checklist[0].title, "Buy oat milk");
    assert_eq!(notified.load(Ordering::SeqCst), 1);

    Ok(())
}

#[test]
fn test_subscribers_run_in_registration_order() -> anyhow::Result<()> {
    // 1. Two listeners appending to one shared log
    let (mut store, _dir) = create_test_store();
    let log = Arc::new(std::sync::Mutex::new(Vec::new()));
    let first = Arc::clone(&log);
    store.subscribe(move |_| first.lock().expect("log lock").push("first"));
    let second = Arc::clone(&log);
    let id = store.subscribe(move |state| {
        second.lock().expect("log lock").push("second");
        assert_eq!(state.checklist.len(), 1);
    });

    store.add_checklist_item(new_item("Buy milk"))?;
    assert_eq!(*log.lock().expect("log lock"), vec!["first", "second"]);

    // 2. Unsubscribed listeners stop firing
    store.unsubscribe(id);
    store.add_checklist_item(new_item("Call home"))?;
    assert_eq!(
        *log.lock().expect("log lock"),
        vec!["first", "second", "first"]
    );

    Ok(())
}
