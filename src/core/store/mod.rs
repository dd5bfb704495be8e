mod undo;

use std::collections::VecDeque;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::core::alarm::Alarm;
use crate::core::checklist::{ChecklistItem, ChecklistItemUpdate, NewChecklistItem};
use crate::core::id::generate_id;
use crate::core::note::{NewNoteBlock, NoteBlock, NoteBlockUpdate};
use crate::core::settings::SettingsUpdate;
use crate::core::snapshot::{FileMedium, Normalized, RawAppState, SnapshotMedium, SnapshotStore, normalize};
use crate::core::state::{AppState, EntityKind};
use crate::core::tag::{NewTagDef, TagDef, TagDefUpdate};
use crate::error::{ImportError, StoreError};
use crate::sync::SyncBackend;
use crate::sync::push::{PushRequest, run_push_worker};
use crate::sync::wire::RemoteState;
use undo::{RedoEntry, UNDO_MAX, UndoEntry, UndoKind, UndoPayload};

/// Handle returned by [`Store::subscribe`]; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

/// Where the store stands with respect to the remote backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// `bootstrap` has not run; mutations stay local.
    Uninitialized,
    /// Bootstrap failed; mutations stay local for the rest of this session.
    LocalOnly,
    /// Reconciled with the backend; every mutation schedules a push.
    Ready,
}

enum SyncLink {
    NotStarted,
    LocalOnly,
    Ready(SyncHandle),
}

struct SyncHandle {
    tx: mpsc::UnboundedSender<PushRequest>,
}

type Listener = Box<dyn FnMut(&AppState) + Send>;

/// The application store: owns the authoritative in-memory state, applies
/// mutations transactionally (persist first, then swap), keeps the undo and
/// redo stacks, notifies subscribers and schedules remote pushes.
///
/// All mutations apply to local state immediately; the remote side only ever
/// sees debounced full-snapshot replaces. The store works identically with
/// sync never bootstrapped, failed, or live.
pub struct Store {
    state: Arc<AppState>,
    codec: SnapshotStore,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_listener: u64,
    undo_stack: VecDeque<UndoEntry>,
    redo_stack: Vec<RedoEntry>,
    link: SyncLink,
}

impl Store {
    /// Open the store backed by `data_dir/state.json`, loading and healing
    /// whatever snapshot is already there.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)?;
        let medium = FileMedium::new(data_dir.join("state.json"));
        Ok(Self::with_medium(Box::new(medium)))
    }

    /// Open over an arbitrary snapshot medium.
    pub fn with_medium(medium: Box<dyn SnapshotMedium + Send>) -> Self {
        let codec = SnapshotStore::new(medium);
        let state = Arc::new(codec.load());
        Self {
            state,
            codec,
            listeners: Vec::new(),
            next_listener: 0,
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            link: SyncLink::NotStarted,
        }
    }

    /// Shared handle to the current state. Cheap; never blocks mutations.
    pub fn snapshot(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    pub fn sync_phase(&self) -> SyncPhase {
        match self.link {
            SyncLink::NotStarted => SyncPhase::Uninitialized,
            SyncLink::LocalOnly => SyncPhase::LocalOnly,
            SyncLink::Ready(_) => SyncPhase::Ready,
        }
    }

    // --- subscriptions -----------------------------------------------------

    /// Register a listener invoked synchronously after every committed
    /// change, in registration order. Listeners only ever observe states
    /// that were durably persisted.
    pub fn subscribe(&mut self, listener: impl FnMut(&AppState) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.listeners.retain(|(sid, _)| *sid != id);
    }

    // --- history introspection ---------------------------------------------

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Label of the change `undo` would revert, for UI affordances.
    pub fn last_undo_description(&self) -> Option<&'static str> {
        self.undo_stack.back().map(|e| e.description)
    }

    // --- commit plumbing ---------------------------------------------------

    /// Persist `next`, then swap it in, record history, notify listeners and
    /// schedule a push. A failed save leaves the store exactly as it was:
    /// same state, same stacks, no notification.
    fn commit(&mut self, next: AppState, entry: Option<UndoEntry>) -> Result<(), StoreError> {
        self.codec.save(&next)?;
        self.state = Arc::new(next);
        if let Some(entry) = entry {
            self.push_undo(entry);
        }
        self.notify();
        self.schedule_push();
        Ok(())
    }

    /// Whole-state replace for import and remote adoption: clears both
    /// history stacks and pushes immediately instead of debounced.
    fn install_state(&mut self, next: AppState) -> Result<(), StoreError> {
        self.codec.save(&next)?;
        self.state = Arc::new(next);
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.notify();
        self.push_now();
        Ok(())
    }

    fn push_undo(&mut self, entry: UndoEntry) {
        self.undo_stack.push_back(entry);
        while self.undo_stack.len() > UNDO_MAX {
            self.undo_stack.pop_front();
        }
        self.redo_stack.clear();
    }

    fn notify(&mut self) {
        let state = Arc::clone(&self.state);
        for (_, listener) in &mut self.listeners {
            listener(&state);
        }
    }

    fn schedule_push(&self) {
        if let SyncLink::Ready(handle) = &self.link {
            let _ = handle
                .tx
                .send(PushRequest::Update(RemoteState::from_state(&self.state)));
        }
    }

    fn push_now(&self) {
        if let SyncLink::Ready(handle) = &self.link {
            let _ = handle
                .tx
                .send(PushRequest::Immediate(RemoteState::from_state(&self.state)));
        }
    }

    fn entry(kind: UndoKind, description: &'static str, payload: UndoPayload) -> UndoEntry {
        UndoEntry {
            kind,
            description,
            payload,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    // --- checklist ---------------------------------------------------------

    /// Create a checklist item at the head of the list with the next order
    /// value. Returns the created item.
    pub fn add_checklist_item(&mut self, new: NewChecklistItem) -> Result<ChecklistItem, StoreError> {
        let now = OffsetDateTime::now_utc();
        let item = ChecklistItem {
            id: generate_id(),
            title: new.title,
            description_html: new.description_html,
            checked: false,
            pinned: false,
            archived: false,
            tags: Vec::new(),
            order: self.state.max_checklist_order() + 1,
            created_at: now,
            updated_at: now,
            alarm: None,
            _guard: (),
        };
        let mut next = (*self.state).clone();
        next.checklist.insert(0, item.clone());
        let entry = Self::entry(
            UndoKind::AddChecklist,
            "افزودن آیتم",
            UndoPayload::Checklist(item.clone()),
        );
        self.commit(next, Some(entry))?;
        Ok(item)
    }

    /// Apply a partial update, stamping `updated_at`. Unknown ids are
    /// ignored.
    pub fn update_checklist_item(
        &mut self,
        id: Uuid,
        update: ChecklistItemUpdate,
    ) -> Result<(), StoreError> {
        let Some(prior) = self.state.checklist_item(id).cloned() else {
            return Ok(());
        };
        let mut next = (*self.state).clone();
        if let Some(item) = next.checklist.iter_mut().find(|c| c.id == id) {
            apply_checklist_update(item, update);
            item.updated_at = OffsetDateTime::now_utc();
        }
        let entry = Self::entry(
            UndoKind::UpdateChecklist,
            "ویرایش آیتم",
            UndoPayload::Checklist(prior),
        );
        self.commit(next, Some(entry))?;
        Ok(())
    }

    /// Flip `checked`. A newly checked item takes the maximum order value
    /// plus one, which moves it to the tail of order-sorted views; unchecking
    /// leaves order alone.
    pub fn toggle_checklist_item(&mut self, id: Uuid) -> Result<(), StoreError> {
        let Some(prior) = self.state.checklist_item(id).cloned() else {
            return Ok(());
        };
        let max_order = self.state.max_checklist_order();
        let mut next = (*self.state).clone();
        if let Some(item) = next.checklist.iter_mut().find(|c| c.id == id) {
            item.checked = !item.checked;
            if item.checked {
                item.order = max_order + 1;
            }
            item.updated_at = OffsetDateTime::now_utc();
        }
        let entry = Self::entry(
            UndoKind::ToggleChecklist,
            "تغییر وضعیت",
            UndoPayload::Checklist(prior),
        );
        self.commit(next, Some(entry))?;
        Ok(())
    }

    /// Remove the item, keeping the deleted copy on the undo stack.
    pub fn delete_checklist_item(&mut self, id: Uuid) -> Result<(), StoreError> {
        let Some(prior) = self.state.checklist_item(id).cloned() else {
            return Ok(());
        };
        let mut next = (*self.state).clone();
        next.checklist.retain(|c| c.id != id);
        let entry = Self::entry(
            UndoKind::DeleteChecklist,
            "حذف آیتم",
            UndoPayload::Checklist(prior),
        );
        self.commit(next, Some(entry))?;
        Ok(())
    }

    /// Re-insert a previously deleted item at the end of the list. A no-op
    /// when an item with the same id already exists. Not undoable.
    pub fn restore_checklist_item(&mut self, item: ChecklistItem) -> Result<(), StoreError> {
        if self.state.checklist_item(item.id).is_some() {
            return Ok(());
        }
        let mut next = (*self.state).clone();
        next.checklist.push(item);
        self.commit(next, None)?;
        Ok(())
    }

    /// Flip the pinned flag.
    pub fn pin_checklist_item(&mut self, id: Uuid) -> Result<(), StoreError> {
        let Some(prior) = self.state.checklist_item(id).cloned() else {
            return Ok(());
        };
        let mut next = (*self.state).clone();
        if let Some(item) = next.checklist.iter_mut().find(|c| c.id == id) {
            item.pinned = !item.pinned;
            item.updated_at = OffsetDateTime::now_utc();
        }
        let entry = Self::entry(
            UndoKind::PinChecklist,
            "پین آیتم",
            UndoPayload::Checklist(prior),
        );
        self.commit(next, Some(entry))?;
        Ok(())
    }

    /// Replace the checklist with the supplied list, renumbering `order` to
    /// each entity's position. The list is taken as-is: items the caller
    /// leaves out are dropped from the store. Not undoable.
    pub fn reorder_checklist(&mut self, items: Vec<ChecklistItem>) -> Result<(), StoreError> {
        let mut next = (*self.state).clone();
        next.checklist = items
            .into_iter()
            .enumerate()
            .map(|(index, mut item)| {
                item.order = index as i64;
                item
            })
            .collect();
        self.commit(next, None)?;
        Ok(())
    }

    // --- notes -------------------------------------------------------------

    /// Create a note at the head of the notes list. Returns the created
    /// note.
    pub fn add_note(&mut self, new: NewNoteBlock) -> Result<NoteBlock, StoreError> {
        let now = OffsetDateTime::now_utc();
        let note = NoteBlock {
            id: generate_id(),
            title: new.title,
            html: new.html,
            content_json: new.content_json,
            pinned: false,
            archived: false,
            tags: Vec::new(),
            order: self.state.max_note_order() + 1,
            created_at: now,
            updated_at: now,
            alarm: None,
            _guard: (),
        };
        let mut next = (*self.state).clone();
        next.notes.insert(0, note.clone());
        let entry = Self::entry(
            UndoKind::AddNote,
            "یادداشت جدید",
            UndoPayload::Note(note.clone()),
        );
        self.commit(next, Some(entry))?;
        Ok(note)
    }

    /// Apply a partial update, stamping `updated_at`. Note edits are not
    /// undoable. Unknown ids are ignored.
    pub fn update_note(&mut self, id: Uuid, update: NoteBlockUpdate) -> Result<(), StoreError> {
        if self.state.note(id).is_none() {
            return Ok(());
        }
        let mut next = (*self.state).clone();
        if let Some(note) = next.notes.iter_mut().find(|n| n.id == id) {
            apply_note_update(note, update);
            note.updated_at = OffsetDateTime::now_utc();
        }
        self.commit(next, None)?;
        Ok(())
    }

    /// Remove the note, keeping the deleted copy on the undo stack.
    pub fn delete_note(&mut self, id: Uuid) -> Result<(), StoreError> {
        let Some(prior) = self.state.note(id).cloned() else {
            return Ok(());
        };
        let mut next = (*self.state).clone();
        next.notes.retain(|n| n.id != id);
        let entry = Self::entry(UndoKind::DeleteNote, "حذف یادداشت", UndoPayload::Note(prior));
        self.commit(next, Some(entry))?;
        Ok(())
    }

    /// Re-insert a previously deleted note at the end of the list. A no-op
    /// when a note with the same id already exists. Not undoable.
    pub fn restore_note(&mut self, note: NoteBlock) -> Result<(), StoreError> {
        if self.state.note(note.id).is_some() {
            return Ok(());
        }
        let mut next = (*self.state).clone();
        next.notes.push(note);
        self.commit(next, None)?;
        Ok(())
    }

    /// Flip the pinned flag. Not undoable.
    pub fn pin_note(&mut self, id: Uuid) -> Result<(), StoreError> {
        if self.state.note(id).is_none() {
            return Ok(());
        }
        let mut next = (*self.state).clone();
        if let Some(note) = next.notes.iter_mut().find(|n| n.id == id) {
            note.pinned = !note.pinned;
            note.updated_at = OffsetDateTime::now_utc();
        }
        self.commit(next, None)?;
        Ok(())
    }

    /// Replace the notes list with the supplied list, renumbering `order` to
    /// position. Same contract as [`Store::reorder_checklist`].
    pub fn reorder_notes(&mut self, notes: Vec<NoteBlock>) -> Result<(), StoreError> {
        let mut next = (*self.state).clone();
        next.notes = notes
            .into_iter()
            .enumerate()
            .map(|(index, mut note)| {
                note.order = index as i64;
                note
            })
            .collect();
        self.commit(next, None)?;
        Ok(())
    }

    // --- tags --------------------------------------------------------------

    /// Create a tag at the end of the tag list. Tag operations record no
    /// undo entries.
    pub fn add_tag(&mut self, new: NewTagDef) -> Result<TagDef, StoreError> {
        let tag = TagDef {
            id: generate_id(),
            title: new.title,
            color_key: new.color_key,
            _guard: (),
        };
        let mut next = (*self.state).clone();
        next.tags.push(tag.clone());
        self.commit(next, None)?;
        Ok(tag)
    }

    /// Rename a tag or change its color. Unknown ids are ignored.
    pub fn update_tag(&mut self, id: Uuid, update: TagDefUpdate) -> Result<(), StoreError> {
        if self.state.tag(id).is_none() {
            return Ok(());
        }
        let mut next = (*self.state).clone();
        if let Some(tag) = next.tags.iter_mut().find(|t| t.id == id) {
            if let Some(title) = update.title {
                tag.title = title;
            }
            if let Some(color_key) = update.color_key {
                tag.color_key = color_key;
            }
        }
        self.commit(next, None)?;
        Ok(())
    }

    /// Delete a tag and strip its id from every checklist item and note.
    /// The items themselves are untouched.
    pub fn delete_tag(&mut self, id: Uuid) -> Result<(), StoreError> {
        if self.state.tag(id).is_none() {
            return Ok(());
        }
        let mut next = (*self.state).clone();
        next.tags.retain(|t| t.id != id);
        for item in &mut next.checklist {
            item.tags.retain(|t| *t != id);
        }
        for note in &mut next.notes {
            note.tags.retain(|t| *t != id);
        }
        self.commit(next, None)?;
        Ok(())
    }

    /// Add the tag to the entity's tag set, or remove it when already
    /// present. Leaves `updated_at` alone.
    pub fn toggle_tag_on_item(
        &mut self,
        kind: EntityKind,
        entity_id: Uuid,
        tag_id: Uuid,
    ) -> Result<(), StoreError> {
        let mut next = (*self.state).clone();
        let tags = match kind {
            EntityKind::Checklist => match next.checklist.iter_mut().find(|c| c.id == entity_id) {
                Some(item) => &mut item.tags,
                None => return Ok(()),
            },
            EntityKind::Note => match next.notes.iter_mut().find(|n| n.id == entity_id) {
                Some(note) => &mut note.tags,
                None => return Ok(()),
            },
        };
        if let Some(pos) = tags.iter().position(|t| *t == tag_id) {
            tags.remove(pos);
        } else {
            tags.push(tag_id);
        }
        self.commit(next, None)?;
        Ok(())
    }

    // --- settings ----------------------------------------------------------

    /// Apply a partial settings update. Panel layout fields merge
    /// individually; the split ratio is clamped to 0-100. No undo.
    pub fn update_settings(&mut self, update: SettingsUpdate) -> Result<(), StoreError> {
        let mut next = (*self.state).clone();
        if let Some(theme) = update.theme {
            next.settings.theme = theme;
        }
        if let Some(digits) = update.use_persian_digits {
            next.settings.use_persian_digits = digits;
        }
        if let Some(layout) = update.panel_layout {
            if let Some(ratio) = layout.split_ratio {
                next.settings.panel_layout.split_ratio = ratio.clamp(0.0, 100.0);
            }
            if let Some(collapsed) = layout.collapsed {
                next.settings.panel_layout.collapsed = collapsed;
            }
        }
        self.commit(next, None)?;
        Ok(())
    }

    // --- alarms ------------------------------------------------------------

    /// Attach an alarm to the entity, or clear it with `None`. Stamps
    /// `updated_at`. No undo.
    pub fn set_alarm(
        &mut self,
        kind: EntityKind,
        entity_id: Uuid,
        alarm: Option<Alarm>,
    ) -> Result<(), StoreError> {
        self.mutate_alarm(kind, entity_id, |slot| {
            *slot = alarm;
            true
        })
    }

    /// Reschedule the alarm `minutes` from now. A no-op when the entity has
    /// no alarm.
    pub fn snooze_alarm(
        &mut self,
        kind: EntityKind,
        entity_id: Uuid,
        minutes: i64,
    ) -> Result<(), StoreError> {
        let now = OffsetDateTime::now_utc();
        self.mutate_alarm(kind, entity_id, |slot| match slot {
            Some(alarm) => {
                *alarm = alarm.snoozed(minutes, now);
                true
            }
            None => false,
        })
    }

    /// Mark a fired alarm handled: repeating alarms advance one period past
    /// their stored `at` and stay scheduled, one-shot alarms become
    /// dismissed. Either way `fired_at` records the dismissal instant.
    pub fn dismiss_alarm(&mut self, kind: EntityKind, entity_id: Uuid) -> Result<(), StoreError> {
        let now = OffsetDateTime::now_utc();
        self.mutate_alarm(kind, entity_id, |slot| match slot {
            Some(alarm) => {
                *alarm = alarm.dismissed(now);
                true
            }
            None => false,
        })
    }

    /// Run `mutate` against the entity's alarm slot; commits (and stamps
    /// `updated_at`) only when it returns true.
    fn mutate_alarm(
        &mut self,
        kind: EntityKind,
        entity_id: Uuid,
        mutate: impl FnOnce(&mut Option<Alarm>) -> bool,
    ) -> Result<(), StoreError> {
        let mut next = (*self.state).clone();
        let committed = match kind {
            EntityKind::Checklist => match next.checklist.iter_mut().find(|c| c.id == entity_id) {
                Some(item) => {
                    if mutate(&mut item.alarm) {
                        item.updated_at = OffsetDateTime::now_utc();
                        true
                    } else {
                        false
                    }
                }
                None => false,
            },
            EntityKind::Note => match next.notes.iter_mut().find(|n| n.id == entity_id) {
                Some(note) => {
                    if mutate(&mut note.alarm) {
                        note.updated_at = OffsetDateTime::now_utc();
                        true
                    } else {
                        false
                    }
                }
                None => false,
            },
        };
        if committed {
            self.commit(next, None)?;
        }
        Ok(())
    }

    // --- undo / redo -------------------------------------------------------

    /// Revert the most recent undoable change. Returns false when the undo
    /// stack is empty. The pre-undo state moves onto the redo stack.
    pub fn undo(&mut self) -> Result<bool, StoreError> {
        let Some(entry) = self.undo_stack.pop_back() else {
            return Ok(false);
        };
        let restored = match &entry.payload {
            UndoPayload::Checklist(item) => {
                let mut next = (*self.state).clone();
                match entry.kind {
                    UndoKind::AddChecklist => next.checklist.retain(|c| c.id != item.id),
                    UndoKind::DeleteChecklist => {
                        if next.checklist.iter().all(|c| c.id != item.id) {
                            next.checklist.push(item.clone());
                        }
                    }
                    _ => {
                        if let Some(slot) = next.checklist.iter_mut().find(|c| c.id == item.id) {
                            *slot = item.clone();
                        }
                    }
                }
                Arc::new(next)
            }
            UndoPayload::Note(note) => {
                let mut next = (*self.state).clone();
                match entry.kind {
                    UndoKind::AddNote => next.notes.retain(|n| n.id != note.id),
                    _ => {
                        if next.notes.iter().all(|n| n.id != note.id) {
                            next.notes.push(note.clone());
                        }
                    }
                }
                Arc::new(next)
            }
            UndoPayload::State(state) => Arc::clone(state),
        };
        if let Err(err) = self.codec.save(&restored) {
            self.undo_stack.push_back(entry);
            return Err(err);
        }
        let before = std::mem::replace(&mut self.state, restored);
        self.redo_stack.push(RedoEntry {
            kind: entry.kind,
            description: entry.description,
            state: before,
            timestamp: entry.timestamp,
        });
        self.notify();
        self.schedule_push();
        Ok(true)
    }

    /// Re-apply the most recently undone change by reinstating the snapshot
    /// captured when `undo` ran. Returns false when the redo stack is empty.
    pub fn redo(&mut self) -> Result<bool, StoreError> {
        let Some(entry) = self.redo_stack.pop() else {
            return Ok(false);
        };
        if let Err(err) = self.codec.save(&entry.state) {
            self.redo_stack.push(entry);
            return Err(err);
        }
        let before = std::mem::replace(&mut self.state, Arc::clone(&entry.state));
        self.undo_stack.push_back(UndoEntry {
            kind: entry.kind,
            description: entry.description,
            payload: UndoPayload::State(before),
            timestamp: OffsetDateTime::now_utc(),
        });
        while self.undo_stack.len() > UNDO_MAX {
            self.undo_stack.pop_front();
        }
        self.notify();
        self.schedule_push();
        Ok(true)
    }

    // --- export / import ---------------------------------------------------

    /// Pretty-printed JSON of the whole state plus an `exportedAt` stamp.
    pub fn export_data(&self) -> Result<String, StoreError> {
        let doc = ExportDocument {
            state: &self.state,
            exported_at: OffsetDateTime::now_utc(),
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    /// Replace the whole state from an export payload. The payload must
    /// parse and carry a schema version this build recognizes; on success
    /// both history stacks are cleared and, when sync is live, the imported
    /// state pushes immediately.
    pub fn import_data(&mut self, json: &str) -> Result<(), ImportError> {
        let raw: RawAppState =
            serde_json::from_str(json).map_err(|_| ImportError::InvalidFormat)?;
        if !raw.recognized_version() {
            return Err(ImportError::InvalidFormat);
        }
        let Normalized { state, .. } = normalize(raw);
        self.install_state(state)?;
        Ok(())
    }

    // --- sync --------------------------------------------------------------

    /// One-time reconciliation with the backend, then live push scheduling.
    /// Every failure path leaves the store fully usable offline; calling
    /// again after the first attempt is a no-op.
    pub async fn bootstrap<B>(&mut self, backend: B) -> Result<(), StoreError>
    where
        B: SyncBackend + Send + Sync + 'static,
    {
        if !matches!(self.link, SyncLink::NotStarted) {
            return Ok(());
        }
        if let Err(err) = backend.bootstrap_auth().await {
            tracing::warn!("sync disabled, no session: {err}");
            self.link = SyncLink::LocalOnly;
            return Ok(());
        }
        let remote = match backend.pull().await {
            Ok(remote) => remote,
            Err(err) => {
                tracing::warn!("sync disabled, pull failed: {err}");
                self.link = SyncLink::LocalOnly;
                return Ok(());
            }
        };
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_push_worker(backend, rx));
        self.link = SyncLink::Ready(SyncHandle { tx });
        match (self.state.has_data(), remote) {
            (false, Some(remote)) => {
                tracing::info!("adopting remote snapshot");
                let Normalized { state, .. } = normalize(remote.into_raw());
                self.install_state(state)?;
            }
            (true, _) => {
                tracing::info!("local snapshot wins, pushing");
                self.push_now();
            }
            (false, None) => {}
        }
        Ok(())
    }

    /// Wait until the worker has delivered any pending push. A no-op unless
    /// sync is live.
    pub async fn flush_sync(&self) {
        if let SyncLink::Ready(handle) = &self.link {
            let (done, ack) = oneshot::channel();
            if handle.tx.send(PushRequest::Flush(done)).is_ok() {
                let _ = ack.await;
            }
        }
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state)
            .field("undo_depth", &self.undo_stack.len())
            .field("redo_depth", &self.redo_stack.len())
            .field("sync_phase", &self.sync_phase())
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportDocument<'a> {
    #[serde(flatten)]
    state: &'a AppState,
    #[serde(with = "time::serde::rfc3339")]
    exported_at: OffsetDateTime,
}

fn apply_checklist_update(item: &mut ChecklistItem, update: ChecklistItemUpdate) {
    if let Some(title) = update.title {
        item.title = title;
    }
    if let Some(html) = update.description_html {
        item.description_html = html;
    }
    if let Some(checked) = update.checked {
        item.checked = checked;
    }
    if let Some(pinned) = update.pinned {
        item.pinned = pinned;
    }
    if let Some(archived) = update.archived {
        item.archived = archived;
    }
    if let Some(tags) = update.tags {
        item.tags = tags;
    }
    if let Some(order) = update.order {
        item.order = order;
    }
    if let Some(alarm) = update.alarm {
        item.alarm = alarm;
    }
}

fn apply_note_update(note: &mut NoteBlock, update: NoteBlockUpdate) {
    if let Some(title) = update.title {
        note.title = title;
    }
    if let Some(html) = update.html {
        note.html = html;
    }
    if let Some(content_json) = update.content_json {
        note.content_json = content_json;
    }
    if let Some(pinned) = update.pinned {
        note.pinned = pinned;
    }
    if let Some(archived) = update.archived {
        note.archived = archived;
    }
    if let Some(tags) = update.tags {
        note.tags = tags;
    }
    if let Some(order) = update.order {
        note.order = order;
    }
    if let Some(alarm) = update.alarm {
        note.alarm = alarm;
    }
}
