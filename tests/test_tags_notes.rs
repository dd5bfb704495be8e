//! Integration tests for tag definitions and note blocks.
//!
//! Tests cover:
//! - Tag create, rename, and color changes
//! - Cascading tag deletion across both collections
//! - Tag membership toggling without touching entity timestamps
//! - Note CRUD, pinning, and rich-content payloads

mod common;

use std::sync::Arc;

use common::*;
use serde_json::json;

#[test]
fn test_add_tag_appends_in_creation_order() -> anyhow::Result<()> {
    let (mut store, _dir) = create_test_store();
    let work = store.add_tag(new_tag("Work"))?;
    let home = store.add_tag(NewTagDef {
        title: "Home".to_string(),
        color_key: Some("slate".to_string()),
    })?;

    let state = store.snapshot();
    assert_eq!(state.tags.len(), 2);
    assert_eq!(state.tags[0].id, work.id);
    assert_eq!(state.tags[1].id, home.id);
    assert_eq!(home.color_key, Some("slate".to_string()));
    assert_eq!(work.color_key, None);
    // Tag edits never enter the undo history
    assert_eq!(store.undo_depth(), 0);
    Ok(())
}

#[test]
fn test_update_tag_renames_and_clears_color() -> anyhow::Result<()> {
    let (mut store, _dir) = create_test_store();
    let tag = store.add_tag(new_tag("Work"))?;

    store.update_tag(
        tag.id,
        TagDefUpdate {
            title: Some("Office".to_string()),
            color_key: Some(None),
        },
    )?;

    let state = store.snapshot();
    assert_eq!(state.tags[0].title, "Office");
    assert_eq!(state.tags[0].color_key, None);
    Ok(())
}

#[test]
fn test_delete_tag_cascades_into_entities() -> anyhow::Result<()> {
    // 1. Tag two items and a note
    let (mut store, _dir) = create_test_store();
    let tag = store.add_tag(new_tag("Errands"))?;
    let keep = store.add_tag(new_tag("Home"))?;
    let one = store.add_checklist_item(new_item("one"))?;
    let two = store.add_checklist_item(new_item("two"))?;
    let note = store.add_note(new_note("scratch"))?;
    for id in [one.id, two.id] {
        store.toggle_tag_on_item(EntityKind::Checklist, id, tag.id)?;
        store.toggle_tag_on_item(EntityKind::Checklist, id, keep.id)?;
    }
    store.toggle_tag_on_item(EntityKind::Note, note.id, tag.id)?;

    // 2. Deleting the definition strips every reference to it
    store.delete_tag(tag.id)?;
    let state = store.snapshot();
    assert_eq!(state.tags.len(), 1);
    assert_eq!(state.tags[0].id, keep.id);
    for item in &state.checklist {
        assert_eq!(item.tags, vec![keep.id]);
    }
    assert!(state.notes[0].tags.is_empty());

    // 3. Entities themselves survive untouched
    assert_eq!(state.checklist.len(), 2);
    assert_eq!(state.notes[0].title, "scratch");
    Ok(())
}

#[test]
fn test_toggle_tag_membership_round_trip() -> anyhow::Result<()> {
    let (mut store, _dir) = create_test_store();
    let tag = store.add_tag(new_tag("Errands"))?;
    let item = store.add_checklist_item(new_item("Buy milk"))?;
    let stamped = store.snapshot().checklist[0].updated_at;

    store.toggle_tag_on_item(EntityKind::Checklist, item.id, tag.id)?;
    assert_eq!(store.snapshot().checklist[0].tags, vec![tag.id]);

    store.toggle_tag_on_item(EntityKind::Checklist, item.id, tag.id)?;
    assert!(store.snapshot().checklist[0].tags.is_empty());

    // Membership flips are organizational, not edits to the entity
    assert_eq!(store.snapshot().checklist[0].updated_at, stamped);
    Ok(())
}

#[test]
fn test_note_add_update_delete() -> anyhow::Result<()> {
    // 1. A note with rich content attached
    let (mut store, _dir) = create_test_store();
    let note = store.add_note(NewNoteBlock {
        title: "Meeting".to_string(),
        html: "<p>agenda</p>".to_string(),
        content_json: Some(json!({"type": "doc", "content": []})),
    })?;
    assert_eq!(store.undo_depth(), 1);

    // 2. Partial update keeps untouched fields, records no undo
    store.update_note(
        note.id,
        NoteBlockUpdate {
            html: Some("<p>minutes</p>".to_string()),
            ..Default::default()
        },
    )?;
    let state = store.snapshot();
    assert_eq!(state.notes[0].title, "Meeting");
    assert_eq!(state.notes[0].html, "<p>minutes</p>");
    assert_eq!(
        state.notes[0].content_json,
        Some(json!({"type": "doc", "content": []}))
    );
    assert_eq!(store.undo_depth(), 1);

    // 3. Delete removes and is undoable
    store.delete_note(note.id)?;
    assert!(store.snapshot().notes.is_empty());
    assert_eq!(store.undo_depth(), 2);
    Ok(())
}

#[test]
fn test_pin_note_records_no_undo() -> anyhow::Result<()> {
    let (mut store, _dir) = create_test_store();
    let note = store.add_note(new_note("sticky"))?;
    let depth = store.undo_depth();

    store.pin_note(note.id)?;
    assert!(store.snapshot().notes[0].pinned);
    assert_eq!(store.undo_depth(), depth);

    store.pin_note(note.id)?;
    assert!(!store.snapshot().notes[0].pinned);
    Ok(())
}

#[test]
fn test_note_restore_and_reorder() -> anyhow::Result<()> {
    let (mut store, _dir) = create_test_store();
    let a = store.add_note(new_note("a"))?;
    let b = store.add_note(new_note("b"))?;

    // 1. Restore after delete lands at the end
    store.delete_note(a.id)?;
    store.restore_note(a.clone())?;
    let state = store.snapshot();
    assert_eq!(state.notes.len(), 2);
    assert_eq!(state.notes[1], a);

    // 2. Positional reorder rewrites the order fields
    store.reorder_notes(vec![a.clone(), b.clone()])?;
    let state = store.snapshot();
    assert_eq!(state.notes[0].id, a.id);
    assert_eq!(state.notes[0].order, 0);
    assert_eq!(state.notes[1].id, b.id);
    assert_eq!(state.notes[1].order, 1);
    Ok(())
}

#[test]
fn test_toggle_tag_on_unknown_entity_is_a_no_op() -> anyhow::Result<()> {
    let (mut store, _dir) = create_test_store();
    let tag = store.add_tag(new_tag("Errands"))?;
    let before = store.snapshot();

    store.toggle_tag_on_item(EntityKind::Note, uuid::Uuid::new_v4(), tag.id)?;
    assert!(Arc::ptr_eq(&before, &store.snapshot()));
    Ok(())
}
