//! Event types.
//!
//! `EventDraft` is what callers submit (no id yet), `Event` is what the store
//! holds. Updates are expressed as typed patches: every field is optional and
//! applied one by one, so a patch can never overwrite `id` or `repeat.id`.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{EventError, EventResult};

/// How a series repeats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatType {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RepeatType {
    pub fn is_recurring(self) -> bool {
        self != RepeatType::None
    }
}

/// Repeat rule attached to every event.
///
/// `id` is the series identifier: set on every occurrence generated from one
/// template, absent on standalone events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatRule {
    #[serde(rename = "type")]
    pub kind: RepeatType,
    #[serde(default)]
    pub interval: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl RepeatRule {
    /// Rule for a standalone (non-repeating) event.
    pub fn none() -> Self {
        RepeatRule {
            kind: RepeatType::None,
            interval: 0,
            end_date: None,
            id: None,
        }
    }

    pub fn new(kind: RepeatType, interval: u32, end_date: Option<NaiveDate>) -> Self {
        RepeatRule {
            kind,
            interval,
            end_date,
            id: None,
        }
    }

    pub fn is_recurring(&self) -> bool {
        self.kind.is_recurring()
    }
}

impl Default for RepeatRule {
    fn default() -> Self {
        RepeatRule::none()
    }
}

/// A stored calendar occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub description: String,
    pub location: String,
    pub category: String,
    pub repeat: RepeatRule,
    pub notification_time: u32,
}

/// An event submitted for creation, before id assignment and expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    pub title: String,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub description: String,
    pub location: String,
    pub category: String,
    pub repeat: RepeatRule,
    pub notification_time: u32,
}

impl EventDraft {
    /// Minimal draft; free-text fields start empty and the event does not repeat.
    pub fn new(
        title: impl Into<String>,
        date: NaiveDate,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        EventDraft {
            title: title.into(),
            date,
            start_time: start_time.into(),
            end_time: end_time.into(),
            description: String::new(),
            location: String::new(),
            category: String::new(),
            repeat: RepeatRule::none(),
            notification_time: 0,
        }
    }

    pub fn with_repeat(mut self, repeat: RepeatRule) -> Self {
        self.repeat = repeat;
        self
    }

    /// Check field-level rules that do not depend on a series id.
    pub fn validate(&self) -> EventResult<()> {
        validate_fields(&self.title, &self.start_time, &self.end_time)?;
        if self.repeat.is_recurring() && self.repeat.interval < 1 {
            return Err(EventError::validation(format!(
                "repeat interval must be at least 1, got {}",
                self.repeat.interval
            )));
        }
        Ok(())
    }

    pub fn into_event(self, id: String) -> Event {
        Event {
            id,
            title: self.title,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            description: self.description,
            location: self.location,
            category: self.category,
            repeat: self.repeat,
            notification_time: self.notification_time,
        }
    }
}

impl Event {
    /// Whether this event belongs to a series.
    pub fn series_id(&self) -> Option<&str> {
        if self.repeat.is_recurring() {
            self.repeat.id.as_deref()
        } else {
            None
        }
    }

    /// Check every rule a stored event must satisfy, including
    /// `repeat.id` being present exactly when the event repeats.
    pub fn validate(&self) -> EventResult<()> {
        validate_fields(&self.title, &self.start_time, &self.end_time)?;

        match (self.repeat.is_recurring(), self.repeat.id.is_some()) {
            (true, false) => Err(EventError::validation(format!(
                "event {} repeats but has no series id",
                self.id
            ))),
            (false, true) => Err(EventError::validation(format!(
                "event {} does not repeat but carries series id",
                self.id
            ))),
            (true, true) if self.repeat.interval < 1 => Err(EventError::validation(format!(
                "repeat interval must be at least 1, got {}",
                self.repeat.interval
            ))),
            _ => Ok(()),
        }
    }
}

/// Field-level patch for one event. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<RepeatPatch>,
}

/// Nested patch for the repeat rule. There is no way to set `repeat.id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatPatch {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<RepeatType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl EventPatch {
    pub fn title(title: impl Into<String>) -> Self {
        EventPatch {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Patch that takes an occurrence out of its series.
    pub fn detach() -> Self {
        EventPatch {
            repeat: Some(RepeatPatch {
                kind: Some(RepeatType::None),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

/// A patch addressed to one event, as sent in batch updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventUpdate {
    pub id: String,
    #[serde(flatten)]
    pub patch: EventPatch,
}

impl EventUpdate {
    pub fn new(id: impl Into<String>, patch: EventPatch) -> Self {
        EventUpdate {
            id: id.into(),
            patch,
        }
    }
}

/// Parse a time-of-day string (`HH:MM` or `HH:MM:SS`).
pub fn parse_time_of_day(s: &str) -> EventResult<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| EventError::validation(format!("invalid time '{}'. Expected HH:MM", s)))
}

fn validate_fields(title: &str, start_time: &str, end_time: &str) -> EventResult<()> {
    if title.trim().is_empty() {
        return Err(EventError::validation("title is required"));
    }

    let start = parse_time_of_day(start_time)?;
    let end = parse_time_of_day(end_time)?;
    if start >= end {
        return Err(EventError::validation(format!(
            "start time {} must be before end time {}",
            start_time, end_time
        )));
    }

    Ok(())
}
