use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::core::alarm::Alarm;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteBlock {
    pub id: Uuid,
    pub title: String,
    pub html: String,
    /// Rich-text document tree, carried verbatim; the store never inspects it.
    pub content_json: Option<serde_json::Value>,
    pub pinned: bool,
    pub archived: bool,
    pub tags: Vec<Uuid>,
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
pub struct NewNoteBlock {
    pub title: String,
    pub html: String,
    pub content_json: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default)]
pub struct NoteBlockUpdate {
    pub title: Option<String>,
    pub html: Option<String>,
    /// `Some(None)` clears the document, `None` leaves it unchanged.
    pub content_json: Option<Option<serde_json::Value>>,
    pub pinned: Option<bool>,
    pub archived: Option<bool>,
    pub tags: Option<Vec<Uuid>>,
    pub order: Option<i64>,
    /// `Some(None)` clears the alarm, `None` leaves it unchanged.
    pub alarm: Option<Option<Alarm>>,
}
