use serde::Serialize;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::core::id::generate_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmRepeat {
    None,
    Daily,
    Weekly,
}

impl AlarmRepeat {
    /// Unknown strings fall back to `None`.
    pub(crate) fn parse_lenient(s: &str) -> Self {
        match s {
            "daily" => AlarmRepeat::Daily,
            "weekly" => AlarmRepeat::Weekly,
            _ => AlarmRepeat::None,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            AlarmRepeat::None => "none",
            AlarmRepeat::Daily => "daily",
            AlarmRepeat::Weekly => "weekly",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmStatus {
    Scheduled,
    Fired,
    Dismissed,
    Missed,
}

impl AlarmStatus {
    /// Unknown strings fall back to `Scheduled`.
    pub(crate) fn parse_lenient(s: &str) -> Self {
        match s {
            "fired" => AlarmStatus::Fired,
            "dismissed" => AlarmStatus::Dismissed,
            "missed" => AlarmStatus::Missed,
            _ => AlarmStatus::Scheduled,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            AlarmStatus::Scheduled => "scheduled",
            AlarmStatus::Fired => "fired",
            AlarmStatus::Dismissed => "dismissed",
            AlarmStatus::Missed => "missed",
        }
    }
}

/// A reminder embedded in a checklist item or note. At most one per entity;
/// delivery is somebody else's job, the store only keeps the schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
    pub repeat: AlarmRepeat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snooze_minutes: Option<i64>,
    #[serde(
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub fired_at: Option<OffsetDateTime>,
    pub status: AlarmStatus,
}

impl Alarm {
    pub fn new(at: OffsetDateTime, repeat: AlarmRepeat) -> Self {
        Self {
            id: generate_id(),
            at,
            repeat,
            snooze_minutes: None,
            fired_at: None,
            status: AlarmStatus::Scheduled,
        }
    }

    /// Where a repeating alarm lands after being dismissed: one day or one
    /// week past the stored `at`, never relative to the dismissal time.
    pub fn next_occurrence(&self) -> Option<OffsetDateTime> {
        match self.repeat {
            AlarmRepeat::Daily => Some(self.at + Duration::days(1)),
            AlarmRepeat::Weekly => Some(self.at + Duration::days(7)),
            AlarmRepeat::None => None,
        }
    }

    /// Reschedule `minutes` from `now`.
    pub fn snoozed(&self, minutes: i64, now: OffsetDateTime) -> Self {
        Self {
            at: now + Duration::minutes(minutes),
            snooze_minutes: Some(minutes),
            status: AlarmStatus::Scheduled,
            ..self.clone()
        }
    }

    /// Dismiss at `now`: repeating alarms advance to the next occurrence and
    /// stay scheduled, one-shot alarms become dismissed. Either way the
    /// firing instant is recorded.
    pub fn dismissed(&self, now: OffsetDateTime) -> Self {
        match self.next_occurrence() {
            Some(next) => Self {
                at: next,
                status: AlarmStatus::Scheduled,
                fired_at: Some(now),
                ..self.clone()
            },
            None => Self {
                status: AlarmStatus::Dismissed,
                fired_at: Some(now),
                ..self.clone()
            },
        }
    }
}
