use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::core::alarm::Alarm;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub id: Uuid,
    pub title: String,
    pub description_html: String,
    pub checked: bool,
    pub pinned: bool,
    pub archived: bool,
    /// References into `AppState::tags`; dangling entries are tolerated.
    pub tags: Vec<Uuid>,
    /// Dense ordering key, renormalized to 0..n-1 on explicit reorder.
    pub order: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alarm: Option<Alarm>,
    #[serde(skip)]
    pub(crate) _guard: (),
}

#[derive(Debug, Clone, Default)]
pub struct NewChecklistItem {
    pub title: String,
    pub description_html: String,
}

#[derive(Debug, Clone, Default)]
pub struct ChecklistItemUpdate {
    pub title: Option<String>,
    pub description_html: Option<String>,
    pub checked: Option<bool>,
    pub pinned: Option<bool>,
    pub archived: Option<bool>,
    pub tags: Option<Vec<Uuid>>,
    pub order: Option<i64>,
    /// `Some(None)` clears the alarm, `None` leaves it unchanged.
    pub alarm: Option<Option<Alarm>>,
}
