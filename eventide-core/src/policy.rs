//! Mutation rules for single occurrences and whole series.
//!
//! An occurrence is either detached (`repeat.type = none`, no series id) or a
//! member of exactly one series. The only transition is member -> detached,
//! through a single-occurrence update that sets `repeat.type` to `none`.
//! Series-wide patches carry per-occurrence fields only: `date` and the
//! repeat rule never propagate across a series.

use crate::error::{EventError, EventResult};
use crate::event::{Event, EventPatch, EventUpdate, RepeatPatch, RepeatRule};

/// Ids of the events in series `repeat_id`, in store order.
///
/// Detached events never match, even if they once belonged to the series.
pub fn series_members(events: &[Event], repeat_id: &str) -> Vec<String> {
    events
        .iter()
        .filter(|event| event.series_id() == Some(repeat_id))
        .map(|event| event.id.clone())
        .collect()
}

/// Apply a patch to one event, returning the new record.
///
/// Fields are replaced one at a time; `id` and `repeat.id` are never taken
/// from the patch. Setting `repeat.type` to `none` on a series member detaches
/// it; a member may move its own `endDate` but keeps the series' type and
/// interval.
pub fn apply_patch(event: &Event, patch: &EventPatch) -> EventResult<Event> {
    let mut next = event.clone();

    if let Some(title) = &patch.title {
        next.title = title.clone();
    }
    if let Some(date) = patch.date {
        next.date = date;
    }
    if let Some(start_time) = &patch.start_time {
        next.start_time = start_time.clone();
    }
    if let Some(end_time) = &patch.end_time {
        next.end_time = end_time.clone();
    }
    if let Some(description) = &patch.description {
        next.description = description.clone();
    }
    if let Some(location) = &patch.location {
        next.location = location.clone();
    }
    if let Some(category) = &patch.category {
        next.category = category.clone();
    }
    if let Some(notification_time) = patch.notification_time {
        next.notification_time = notification_time;
    }
    if let Some(repeat) = &patch.repeat {
        next.repeat = merge_repeat(event, repeat)?;
    }

    next.validate()?;
    Ok(next)
}

fn merge_repeat(event: &Event, patch: &RepeatPatch) -> EventResult<RepeatRule> {
    let current = &event.repeat;
    let kind = patch.kind.unwrap_or(current.kind);

    match (current.is_recurring(), kind.is_recurring()) {
        // Detach: the occurrence leaves its series for good.
        (true, false) => Ok(RepeatRule::none()),
        (false, false) => Ok(RepeatRule {
            interval: patch.interval.unwrap_or(current.interval),
            ..RepeatRule::none()
        }),
        (false, true) => Err(EventError::validation(format!(
            "event {} does not repeat; series can only be joined at creation",
            event.id
        ))),
        (true, true) => {
            let interval = patch.interval.unwrap_or(current.interval);
            if kind != current.kind || interval != current.interval {
                return Err(EventError::validation(format!(
                    "repeat type and interval of event {} are shared with its series; \
                     it can only be detached",
                    event.id
                )));
            }
            Ok(RepeatRule {
                end_date: patch.end_date.or(current.end_date),
                ..current.clone()
            })
        }
    }
}

/// The part of a patch that may propagate across a series.
pub fn series_patch(patch: &EventPatch) -> EventPatch {
    EventPatch {
        date: None,
        repeat: None,
        ..patch.clone()
    }
}

/// Fan a series-wide patch out to one update per member.
pub fn series_updates(member_ids: &[String], patch: &EventPatch) -> Vec<EventUpdate> {
    let patch = series_patch(patch);
    member_ids
        .iter()
        .map(|id| EventUpdate::new(id.clone(), patch.clone()))
        .collect()
}

/// Members of a series must keep strictly increasing dates in store order.
pub fn check_series_order(events: &[Event], repeat_id: &str) -> EventResult<()> {
    let mut previous: Option<&Event> = None;
    for event in events.iter().filter(|e| e.series_id() == Some(repeat_id)) {
        if let Some(prev) = previous
            && prev.date >= event.date
        {
            return Err(EventError::validation(format!(
                "event {} on {} would not follow event {} on {} in series {}",
                event.id, event.date, prev.id, prev.date, repeat_id
            )));
        }
        previous = Some(event);
    }
    Ok(())
}
