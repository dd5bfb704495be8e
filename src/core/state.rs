use serde::Serialize;
use uuid::Uuid;

use crate::core::checklist::ChecklistItem;
use crate::core::note::NoteBlock;
use crate::core::settings::Settings;
use crate::core::tag::TagDef;

/// Snapshot schema emitted by this build. Older or unknown versions are
/// coerced on load, never rejected.
pub const SCHEMA_VERSION: u32 = 2;

/// Which entity collection an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Checklist,
    Note,
}

/// Root aggregate. One instance per session; every mutation goes through the
/// store, which replaces the whole value rather than editing in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub schema_version: u32,
    pub settings: Settings,
    pub tags: Vec<TagDef>,
    pub checklist: Vec<ChecklistItem>,
    pub notes: Vec<NoteBlock>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            settings: Settings::default(),
            tags: Vec::new(),
            checklist: Vec::new(),
            notes: Vec::new(),
        }
    }
}

impl AppState {
    /// Whether any of the three collections holds anything. Settings alone
    /// never count as data, for reconciliation purposes.
    pub fn has_data(&self) -> bool {
        !self.checklist.is_empty() || !self.notes.is_empty() || !self.tags.is_empty()
    }

    pub fn checklist_item(&self, id: Uuid) -> Option<&ChecklistItem> {
        self.checklist.iter().find(|c| c.id == id)
    }

    pub fn note(&self, id: Uuid) -> Option<&NoteBlock> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn tag(&self, id: Uuid) -> Option<&TagDef> {
        self.tags.iter().find(|t| t.id == id)
    }

    pub(crate) fn max_checklist_order(&self) -> i64 {
        self.checklist.iter().map(|c| c.order).max().unwrap_or(-1)
    }

    pub(crate) fn max_note_order(&self) -> i64 {
        self.notes.iter().map(|n| n.order).max().unwrap_or(-1)
    }
}
