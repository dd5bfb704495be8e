mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from noto for tests
pub use noto::{
    Alarm, AlarmRepeat, AlarmStatus, AppState, ChecklistItem, ChecklistItemUpdate, Collapsed,
    EntityKind, ImportError, NewChecklistItem, NewNoteBlock, NewTagDef, NoteBlockUpdate,
    SCHEMA_VERSION, SettingsUpdate, Store, StoreError, SyncPhase, TagDefUpdate, Theme,
    is_canonical_id,
};
