pub mod core;
pub mod error;
pub mod sync;

pub use crate::core::{
    Alarm, AlarmRepeat, AlarmStatus, AppState, ChecklistItem, ChecklistItemUpdate, Collapsed,
    EntityKind, FileMedium, NewChecklistItem, NewNoteBlock, NewTagDef, NoteBlock, NoteBlockUpdate,
    PanelLayout, PanelLayoutUpdate, SCHEMA_VERSION, Settings, SettingsUpdate, SnapshotMedium,
    Store, SubscriptionId, SyncPhase, TagDef, TagDefUpdate, Theme, generate_id, is_canonical_id,
};
pub use error::{ImportError, MediumError, StoreError};
pub use sync::{HttpSyncClient, RemoteState, SyncBackend, SyncError};
