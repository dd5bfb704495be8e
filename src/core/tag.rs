use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagDef {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_key: Option<String>,
    #[serde(skip)]
    pub(crate) _guard: (),
}

#[derive(Debug, Clone)]
pub struct NewTagDef {
    pub title: String,
    pub color_key: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TagDefUpdate {
    pub title: Option<String>,
    /// `Some(None)` clears the color, `None` leaves it unchanged.
    pub color_key: Option<Option<String>>,
}
