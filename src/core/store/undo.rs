use std::sync::Arc;

use time::OffsetDateTime;

use crate::core::checklist::ChecklistItem;
use crate::core::note::NoteBlock;
use crate::core::state::AppState;

/// History depth; pushing past this evicts the oldest entry.
pub(crate) const UNDO_MAX: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UndoKind {
    AddChecklist,
    UpdateChecklist,
    ToggleChecklist,
    DeleteChecklist,
    PinChecklist,
    AddNote,
    DeleteNote,
}

/// What was captured to reverse the change: the entity as it stood before
/// (for adds, the entity that was created), or a whole-state snapshot for
/// entries minted by `redo`.
#[derive(Debug, Clone)]
pub(crate) enum UndoPayload {
    Checklist(ChecklistItem),
    Note(NoteBlock),
    State(Arc<AppState>),
}

#[derive(Debug, Clone)]
pub(crate) struct UndoEntry {
    pub(crate) kind: UndoKind,
    pub(crate) description: &'static str,
    pub(crate) payload: UndoPayload,
    pub(crate) timestamp: OffsetDateTime,
}

/// Redo always reinstates the full snapshot captured when `undo` ran.
#[derive(Debug, Clone)]
pub(crate) struct RedoEntry {
    pub(crate) kind: UndoKind,
    pub(crate) description: &'static str,
    pub(crate) state: Arc<AppState>,
    pub(crate) timestamp: OffsetDateTime,
}
