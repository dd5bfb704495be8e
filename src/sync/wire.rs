use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::core::snapshot::{
    RawAlarm, RawAppState, RawChecklistItem, RawNoteBlock, RawPanelLayout, RawSettings, RawTag,
};
use crate::core::{Alarm, AppState};

// Wire-shape DTOs for the remote snapshot contract. Stringly typed on
// purpose: the server stores whatever the last client pushed, so pulls have
// to tolerate shapes this build would not itself produce. Unlike the local
// model, the wire carries no timestamps, and `splitRatio` is a 0.2-0.8
// fraction instead of the local 0-100 percentage.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteState {
    pub schema_version: u32,
    pub settings: RemoteSettings,
    pub tags: Vec<RemoteTag>,
    pub checklist: Vec<RemoteChecklistItem>,
    pub notes: Vec<RemoteNoteBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteSettings {
    pub theme: String,
    pub use_persian_digits: bool,
    pub panel_layout: RemotePanelLayout,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            theme: "light".to_owned(),
            use_persian_digits: false,
            panel_layout: RemotePanelLayout::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemotePanelLayout {
    pub split_ratio: f64,
    pub collapsed: String,
}

impl Default for RemotePanelLayout {
    fn default() -> Self {
        Self {
            split_ratio: 0.5,
            collapsed: "none".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteTag {
    pub id: String,
    pub title: String,
    pub color_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteChecklistItem {
    pub id: String,
    pub title: String,
    pub description_html: String,
    pub checked: bool,
    pub pinned: bool,
    pub archived: bool,
    pub tags: Vec<String>,
    pub order: Option<i64>,
    pub alarm: Option<RemoteAlarm>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteNoteBlock {
    pub id: String,
    pub title: String,
    pub html: String,
    pub content_json: Option<serde_json::Value>,
    pub pinned: bool,
    pub archived: bool,
    pub tags: Vec<String>,
    pub order: Option<i64>,
    pub alarm: Option<RemoteAlarm>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteAlarm {
    pub id: String,
    pub at: String,
    pub repeat: String,
    pub snooze_minutes: Option<i64>,
    pub fired_at: Option<String>,
    pub status: String,
}

impl RemoteState {
    /// Map the local model onto the wire shape for a push.
    pub(crate) fn from_state(state: &AppState) -> Self {
        Self {
            schema_version: state.schema_version,
            settings: RemoteSettings {
                theme: state.settings.theme.as_str().to_owned(),
                use_persian_digits: state.settings.use_persian_digits,
                panel_layout: RemotePanelLayout {
                    split_ratio: (state.settings.panel_layout.split_ratio / 100.0).clamp(0.2, 0.8),
                    collapsed: state.settings.panel_layout.collapsed.as_str().to_owned(),
                },
            },
            tags: state
                .tags
                .iter()
                .map(|t| RemoteTag {
                    id: t.id.to_string(),
                    title: t.title.clone(),
                    color_key: t.color_key.clone(),
                })
                .collect(),
            checklist: state
                .checklist
                .iter()
                .map(|c| RemoteChecklistItem {
                    id: c.id.to_string(),
                    title: c.title.clone(),
                    description_html: c.description_html.clone(),
                    checked: c.checked,
                    pinned: c.pinned,
                    archived: c.archived,
                    tags: c.tags.iter().map(|t| t.to_string()).collect(),
                    order: Some(c.order),
                    alarm: c.alarm.as_ref().map(RemoteAlarm::from_alarm),
                })
                .collect(),
            notes: state
                .notes
                .iter()
                .map(|n| RemoteNoteBlock {
                    id: n.id.to_string(),
                    title: n.title.clone(),
                    html: n.html.clone(),
                    content_json: n.content_json.clone(),
                    pinned: n.pinned,
                    archived: n.archived,
                    tags: n.tags.iter().map(|t| t.to_string()).collect(),
                    order: Some(n.order),
                    alarm: n.alarm.as_ref().map(RemoteAlarm::from_alarm),
                })
                .collect(),
        }
    }

    /// Map a pulled snapshot into the lenient load shape so adoption runs
    /// through the same normalization and id repair as a local load. Missing
    /// orders fall back to the array index; entities get stamped with fresh
    /// timestamps because the wire carries none.
    pub(crate) fn into_raw(self) -> RawAppState {
        RawAppState {
            schema_version: Some(serde_json::Value::from(self.schema_version)),
            settings: RawSettings {
                theme: Some(self.settings.theme),
                use_persian_digits: Some(self.settings.use_persian_digits),
                panel_layout: RawPanelLayout {
                    split_ratio: Some(
                        self.settings.panel_layout.split_ratio.clamp(0.2, 0.8) * 100.0,
                    ),
                    collapsed: Some(self.settings.panel_layout.collapsed),
                },
            },
            tags: self
                .tags
                .into_iter()
                .map(|t| RawTag {
                    id: t.id,
                    title: t.title,
                    color_key: t.color_key,
                })
                .collect(),
            checklist: self
                .checklist
                .into_iter()
                .enumerate()
                .map(|(index, c)| RawChecklistItem {
                    id: c.id,
                    title: c.title,
                    description_html: c.description_html,
                    checked: c.checked,
                    pinned: c.pinned,
                    archived: c.archived,
                    tags: c.tags,
                    order: c.order.or(Some(index as i64)),
                    created_at: None,
                    updated_at: None,
                    alarm: c.alarm.map(RemoteAlarm::into_raw_alarm),
                })
                .collect(),
            notes: self
                .notes
                .into_iter()
                .enumerate()
                .map(|(index, n)| RawNoteBlock {
                    id: n.id,
                    title: n.title,
                    html: n.html,
                    content_json: n.content_json,
                    pinned: n.pinned,
                    archived: n.archived,
                    tags: n.tags,
                    order: n.order.or(Some(index as i64)),
                    created_at: None,
                    updated_at: None,
                    alarm: n.alarm.map(RemoteAlarm::into_raw_alarm),
                })
                .collect(),
        }
    }

    /// Settings alone never count as data; reconciliation only looks at the
    /// three collections.
    pub(crate) fn has_data(&self) -> bool {
        !self.tags.is_empty() || !self.checklist.is_empty() || !self.notes.is_empty()
    }
}

impl RemoteAlarm {
    fn from_alarm(alarm: &Alarm) -> Self {
        Self {
            id: alarm.id.to_string(),
            at: rfc3339_string(alarm.at),
            repeat: alarm.repeat.as_str().to_owned(),
            snooze_minutes: alarm.snooze_minutes,
            fired_at: alarm.fired_at.map(rfc3339_string),
            status: alarm.status.as_str().to_owned(),
        }
    }

    fn into_raw_alarm(self) -> RawAlarm {
        RawAlarm {
            id: self.id,
            at: Some(self.at),
            repeat: Some(self.repeat),
            snooze_minutes: self.snooze_minutes,
            fired_at: self.fired_at,
            status: Some(self.status),
        }
    }
}

fn rfc3339_string(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339).unwrap_or_else(|_| ts.to_string())
}
