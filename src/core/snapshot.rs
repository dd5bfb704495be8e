use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tempfile::NamedTempFile;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::core::alarm::{Alarm, AlarmRepeat, AlarmStatus};
use crate::core::checklist::ChecklistItem;
use crate::core::id::IdRepair;
use crate::core::note::NoteBlock;
use crate::core::settings::{Collapsed, PanelLayout, Settings, Theme};
use crate::core::state::{AppState, SCHEMA_VERSION};
use crate::core::tag::TagDef;
use crate::error::{MediumError, StoreError};

/// Where the serialized snapshot lives. One blob, single writer.
pub trait SnapshotMedium {
    /// `Ok(None)` when nothing has been persisted yet.
    fn read(&self) -> Result<Option<String>, MediumError>;
    fn write(&self, blob: &str) -> Result<(), MediumError>;
}

/// Production medium: one JSON file, replaced atomically so a crash mid-write
/// never clobbers the previous snapshot.
#[derive(Debug)]
pub struct FileMedium {
    path: PathBuf,
}

impl FileMedium {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotMedium for FileMedium {
    fn read(&self) -> Result<Option<String>, MediumError> {
        match fs::read_to_string(&self.path) {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(MediumError::Io(err)),
        }
    }

    fn write(&self, blob: &str) -> Result<(), MediumError> {
        let dir = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut tmp = NamedTempFile::new_in(dir.unwrap_or(Path::new(".")))?;
        tmp.write_all(blob.as_bytes()).map_err(classify_io)?;
        tmp.as_file().sync_all().map_err(classify_io)?;
        tmp.persist(&self.path).map_err(|e| classify_io(e.error))?;
        Ok(())
    }
}

fn classify_io(err: std::io::Error) -> MediumError {
    match err.kind() {
        std::io::ErrorKind::StorageFull | std::io::ErrorKind::QuotaExceeded => {
            MediumError::QuotaExceeded
        }
        _ => MediumError::Io(err),
    }
}

/// Durable snapshot codec: load with defaulting + id repair, save verbatim.
pub(crate) struct SnapshotStore {
    medium: Box<dyn SnapshotMedium + Send>,
}

impl SnapshotStore {
    pub(crate) fn new(medium: Box<dyn SnapshotMedium + Send>) -> Self {
        Self { medium }
    }

    /// Never fails: missing, unreadable or corrupt data yields a fresh
    /// default state. Successful reads are normalized, repaired and then
    /// re-persisted, so corruption heals itself on the next load.
    pub(crate) fn load(&self) -> AppState {
        let blob = match self.medium.read() {
            Ok(Some(blob)) => blob,
            Ok(None) => return AppState::default(),
            Err(err) => {
                tracing::warn!("unreadable local snapshot, starting fresh: {err}");
                return AppState::default();
            }
        };
        let raw: RawAppState = match serde_json::from_str(&blob) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!("corrupt local snapshot, starting fresh: {err}");
                return AppState::default();
            }
        };
        let Normalized { state, changed } = normalize(raw);
        if changed {
            tracing::warn!("local snapshot repaired on load");
        }
        if let Err(err) = self.save(&state) {
            tracing::warn!("could not re-persist healed snapshot: {err}");
        }
        state
    }

    pub(crate) fn save(&self, state: &AppState) -> Result<(), StoreError> {
        let blob = serde_json::to_string(state)?;
        self.medium.write(&blob)?;
        Ok(())
    }
}

// Lenient decode layer. Persisted or imported blobs may predate the current
// schema, carry ids from legacy exports, or be hand-edited; every field here
// is individually defaulted so one bad value degrades just that value.

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawAppState {
    pub(crate) schema_version: Option<serde_json::Value>,
    pub(crate) settings: RawSettings,
    pub(crate) tags: Vec<RawTag>,
    pub(crate) checklist: Vec<RawChecklistItem>,
    pub(crate) notes: Vec<RawNoteBlock>,
}

impl RawAppState {
    pub(crate) fn recognized_version(&self) -> bool {
        self.schema_version.as_ref().and_then(|v| v.as_u64()) == Some(u64::from(SCHEMA_VERSION))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawSettings {
    pub(crate) theme: Option<String>,
    pub(crate) use_persian_digits: Option<bool>,
    pub(crate) panel_layout: RawPanelLayout,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawPanelLayout {
    pub(crate) split_ratio: Option<f64>,
    pub(crate) collapsed: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawTag {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) color_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawChecklistItem {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description_html: String,
    pub(crate) checked: bool,
    pub(crate) pinned: bool,
    pub(crate) archived: bool,
    pub(crate) tags: Vec<String>,
    pub(crate) order: Option<i64>,
    pub(crate) created_at: Option<String>,
    pub(crate) updated_at: Option<String>,
    pub(crate) alarm: Option<RawAlarm>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawNoteBlock {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) html: String,
    pub(crate) content_json: Option<serde_json::Value>,
    pub(crate) pinned: bool,
    pub(crate) archived: bool,
    pub(crate) tags: Vec<String>,
    pub(crate) order: Option<i64>,
    pub(crate) created_at: Option<String>,
    pub(crate) updated_at: Option<String>,
    pub(crate) alarm: Option<RawAlarm>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawAlarm {
    pub(crate) id: String,
    pub(crate) at: Option<String>,
    pub(crate) repeat: Option<String>,
    pub(crate) snooze_minutes: Option<i64>,
    pub(crate) fired_at: Option<String>,
    pub(crate) status: Option<String>,
}

pub(crate) struct Normalized {
    pub(crate) state: AppState,
    /// True when anything beyond plain defaulting happened: repaired ids,
    /// dropped references, coerced enum strings or timestamps.
    pub(crate) changed: bool,
}

/// Turn a lenient raw snapshot into the typed model. Identifier repair runs
/// in the same pass so that an entity id and every reference to it resolve
/// through one shared replacement map.
pub(crate) fn normalize(raw: RawAppState) -> Normalized {
    let now = OffsetDateTime::now_utc();
    let mut repair = IdRepair::new();
    let mut changed = !raw.recognized_version();

    let settings = settings_of(raw.settings, &mut changed);

    let tags: Vec<TagDef> = raw
        .tags
        .into_iter()
        .map(|t| TagDef {
            id: repair.entity_id(&t.id),
            title: t.title,
            color_key: t.color_key,
            _guard: (),
        })
        .collect();

    let checklist: Vec<ChecklistItem> = raw
        .checklist
        .into_iter()
        .map(|c| {
            let tags = c.tags.iter().filter_map(|t| repair.reference(t)).collect();
            let alarm = c.alarm.and_then(|a| alarm_of(a, &mut repair, &mut changed));
            ChecklistItem {
                id: repair.entity_id(&c.id),
                title: c.title,
                description_html: c.description_html,
                checked: c.checked,
                pinned: c.pinned,
                archived: c.archived,
                tags,
                order: order_of(c.order, &mut changed),
                created_at: timestamp_of(c.created_at, now, &mut changed),
                updated_at: timestamp_of(c.updated_at, now, &mut changed),
                alarm,
                _guard: (),
            }
        })
        .collect();

    let notes: Vec<NoteBlock> = raw
        .notes
        .into_iter()
        .map(|n| {
            let tags = n.tags.iter().filter_map(|t| repair.reference(t)).collect();
            let alarm = n.alarm.and_then(|a| alarm_of(a, &mut repair, &mut changed));
            NoteBlock {
                id: repair.entity_id(&n.id),
                title: n.title,
                html: n.html,
                content_json: n.content_json,
                pinned: n.pinned,
                archived: n.archived,
                tags,
                order: order_of(n.order, &mut changed),
                created_at: timestamp_of(n.created_at, now, &mut changed),
                updated_at: timestamp_of(n.updated_at, now, &mut changed),
                alarm,
                _guard: (),
            }
        })
        .collect();

    let changed = changed || repair.repaired_any();
    Normalized {
        state: AppState {
            schema_version: SCHEMA_VERSION,
            settings,
            tags,
            checklist,
            notes,
        },
        changed,
    }
}

fn settings_of(raw: RawSettings, changed: &mut bool) -> Settings {
    let theme = match raw.theme {
        Some(s) => {
            let theme = Theme::parse_lenient(&s);
            if theme.as_str() != s {
                *changed = true;
            }
            theme
        }
        None => Theme::Light,
    };
    let collapsed = match raw.panel_layout.collapsed {
        Some(s) => {
            let collapsed = Collapsed::parse_lenient(&s);
            if collapsed.as_str() != s {
                *changed = true;
            }
            collapsed
        }
        None => Collapsed::None,
    };
    let split_ratio = raw.panel_layout.split_ratio.unwrap_or(50.0);
    let clamped = split_ratio.clamp(0.0, 100.0);
    if clamped != split_ratio {
        *changed = true;
    }
    Settings {
        theme,
        use_persian_digits: raw.use_persian_digits.unwrap_or(false),
        panel_layout: PanelLayout {
            split_ratio: clamped,
            collapsed,
        },
    }
}

fn order_of(raw: Option<i64>, changed: &mut bool) -> i64 {
    match raw {
        Some(order) => order,
        None => {
            *changed = true;
            0
        }
    }
}

fn timestamp_of(raw: Option<String>, now: OffsetDateTime, changed: &mut bool) -> OffsetDateTime {
    if let Some(s) = raw.as_deref()
        && let Ok(ts) = OffsetDateTime::parse(s, &Rfc3339)
    {
        return ts;
    }
    *changed = true;
    now
}

fn alarm_of(raw: RawAlarm, repair: &mut IdRepair, changed: &mut bool) -> Option<Alarm> {
    let at = match raw.at.as_deref().map(|s| OffsetDateTime::parse(s, &Rfc3339)) {
        Some(Ok(ts)) => ts,
        _ => {
            tracing::warn!("dropping alarm with an unreadable schedule");
            *changed = true;
            return None;
        }
    };
    let repeat = match raw.repeat {
        Some(s) => {
            let repeat = AlarmRepeat::parse_lenient(&s);
            if repeat.as_str() != s {
                *changed = true;
            }
            repeat
        }
        None => AlarmRepeat::None,
    };
    let status = match raw.status {
        Some(s) => {
            let status = AlarmStatus::parse_lenient(&s);
            if status.as_str() != s {
                *changed = true;
            }
            status
        }
        None => AlarmStatus::Scheduled,
    };
    let fired_at = match raw.fired_at.as_deref() {
        Some(s) => match OffsetDateTime::parse(s, &Rfc3339) {
            Ok(ts) => Some(ts),
            Err(_) => {
                *changed = true;
                None
            }
        },
        None => None,
    };
    Some(Alarm {
        id: repair.entity_id(&raw.id),
        at,
        repeat,
        snooze_minutes: raw.snooze_minutes,
        fired_at,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_raw_normalizes_to_defaults() {
        let Normalized { state, changed } = normalize(RawAppState::default());
        assert_eq!(state, AppState::default());
        // The missing schema version counts as a coercion
        assert!(changed);
    }

    #[test]
    fn current_version_with_no_entities_is_clean() {
        let raw = RawAppState {
            schema_version: Some(json!(SCHEMA_VERSION)),
            ..RawAppState::default()
        };
        let Normalized { changed, .. } = normalize(raw);
        assert!(!changed);
    }

    #[test]
    fn unknown_enum_strings_coerce_to_defaults() {
        let raw = RawAppState {
            schema_version: Some(json!(SCHEMA_VERSION)),
            settings: RawSettings {
                theme: Some("purple".to_string()),
                panel_layout: RawPanelLayout {
                    collapsed: Some("sideways".to_string()),
                    ..RawPanelLayout::default()
                },
                ..RawSettings::default()
            },
            ..RawAppState::default()
        };
        let Normalized { state, changed } = normalize(raw);
        assert_eq!(state.settings.theme, Theme::Light);
        assert_eq!(state.settings.panel_layout.collapsed, Collapsed::None);
        assert!(changed);
    }

    #[test]
    fn split_ratio_clamps_to_local_scale() {
        for (stored, expected) in [(250.0, 100.0), (-3.0, 0.0), (62.5, 62.5)] {
            let raw = RawAppState {
                schema_version: Some(json!(SCHEMA_VERSION)),
                settings: RawSettings {
                    panel_layout: RawPanelLayout {
                        split_ratio: Some(stored),
                        ..RawPanelLayout::default()
                    },
                    ..RawSettings::default()
                },
                ..RawAppState::default()
            };
            let Normalized { state, changed } = normalize(raw);
            assert_eq!(state.settings.panel_layout.split_ratio, expected);
            assert_eq!(changed, stored != expected);
        }
    }

    #[test]
    fn missing_order_and_timestamps_are_stamped() {
        let raw = RawAppState {
            schema_version: Some(json!(SCHEMA_VERSION)),
            checklist: vec![RawChecklistItem {
                id: generate_test_id(),
                title: "a".to_string(),
                order: Some(7),
                created_at: Some("garbage".to_string()),
                ..RawChecklistItem::default()
            }],
            ..RawAppState::default()
        };
        let Normalized { state, changed } = normalize(raw);
        let item = &state.checklist[0];
        assert_eq!(item.order, 7);
        // Unparseable and absent timestamps both land on the same load instant
        assert_eq!(item.created_at, item.updated_at);
        assert!(changed);
    }

    #[test]
    fn alarm_fields_coerce_individually() {
        let raw_alarm = RawAlarm {
            id: generate_test_id(),
            at: Some("2025-01-01T09:00:00Z".to_string()),
            repeat: Some("hourly".to_string()),
            fired_at: Some("yesterday".to_string()),
            status: Some("snoozing".to_string()),
            ..RawAlarm::default()
        };
        let mut repair = IdRepair::new();
        let mut changed = false;
        let alarm = alarm_of(raw_alarm, &mut repair, &mut changed).unwrap();
        assert_eq!(alarm.repeat, AlarmRepeat::None);
        assert_eq!(alarm.status, AlarmStatus::Scheduled);
        assert_eq!(alarm.fired_at, None);
        assert!(changed);
    }

    #[test]
    fn alarm_without_readable_schedule_is_dropped() {
        let raw_alarm = RawAlarm {
            id: generate_test_id(),
            at: Some("someday".to_string()),
            ..RawAlarm::default()
        };
        let mut repair = IdRepair::new();
        let mut changed = false;
        assert!(alarm_of(raw_alarm, &mut repair, &mut changed).is_none());
        assert!(changed);
    }

    fn generate_test_id() -> String {
        crate::core::id::generate_id().to_string()
    }
}
