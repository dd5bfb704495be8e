mod alarm;
mod checklist;
mod id;
mod note;
mod settings;
pub(crate) mod snapshot;
mod state;
mod store;
mod tag;

pub use alarm::{Alarm, AlarmRepeat, AlarmStatus};
pub use checklist::{ChecklistItem, ChecklistItemUpdate, NewChecklistItem};
pub use id::{generate_id, is_canonical_id};
pub use note::{NewNoteBlock, NoteBlock, NoteBlockUpdate};
pub use settings::{Collapsed, PanelLayout, PanelLayoutUpdate, Settings, SettingsUpdate, Theme};
pub use snapshot::{FileMedium, SnapshotMedium};
pub use state::{AppState, EntityKind, SCHEMA_VERSION};
pub use store::{Store, SubscriptionId, SyncPhase};
pub use tag::{NewTagDef, TagDef, TagDefUpdate};
