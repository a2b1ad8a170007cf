//! Authoritative event collection.
//!
//! Ids are decimal strings handed out from a monotonic counter, so an id is
//! never reused after deletion. Every mutation is staged on a copy of the
//! collection, checked in full, optionally written to the snapshot file, and
//! only then swapped in. A failed call leaves the store exactly as it was.

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::error::{EventError, EventResult};
use crate::event::{Event, EventDraft, EventPatch, EventUpdate};
use crate::policy;
use crate::snapshot::SnapshotFile;

#[derive(Debug)]
pub struct EventStore {
    events: Vec<Event>,
    next_id: u64,
    snapshot: Option<SnapshotFile>,
}

impl Default for EventStore {
    fn default() -> Self {
        EventStore::in_memory()
    }
}

impl EventStore {
    pub fn in_memory() -> Self {
        EventStore {
            events: Vec::new(),
            next_id: 1,
            snapshot: None,
        }
    }

    /// Seed an in-memory store with existing records.
    pub fn with_events(events: Vec<Event>) -> EventResult<Self> {
        let next_id = next_id_after(&events, 1)?;
        Ok(EventStore {
            events,
            next_id,
            snapshot: None,
        })
    }

    /// Open a store backed by a JSON snapshot file. A missing file is an
    /// empty store; the file is created on the first mutation.
    pub fn open(path: impl Into<PathBuf>) -> EventResult<Self> {
        let file = SnapshotFile::new(path);
        let snapshot = file.load()?.unwrap_or_default();
        let next_id = next_id_after(&snapshot.events, snapshot.next_id)?;

        info!(
            path = %file.path().display(),
            events = snapshot.events.len(),
            next_id,
            "loaded event snapshot"
        );

        Ok(EventStore {
            events: snapshot.events,
            next_id,
            snapshot: Some(file),
        })
    }

    /// All events in insertion order.
    pub fn list(&self) -> &[Event] {
        &self.events
    }

    pub fn get(&self, id: &str) -> EventResult<&Event> {
        self.events
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| EventError::NotFound(id.to_string()))
    }

    pub fn create(&mut self, draft: EventDraft) -> EventResult<Event> {
        self.create_many(vec![draft])?
            .pop()
            .ok_or_else(|| EventError::validation("nothing was created"))
    }

    /// Create several events at once. Ids follow input order with no gaps;
    /// if any draft is invalid nothing is inserted.
    pub fn create_many(&mut self, drafts: Vec<EventDraft>) -> EventResult<Vec<Event>> {
        let mut next_id = self.next_id;
        let created: Vec<Event> = drafts
            .into_iter()
            .map(|draft| {
                let event = draft.into_event(next_id.to_string());
                next_id += 1;
                event
            })
            .collect();

        for event in &created {
            event.validate()?;
        }

        let mut staged = self.events.clone();
        staged.extend(created.iter().cloned());
        self.commit(staged, next_id)?;

        info!(count = created.len(), "created events");
        Ok(created)
    }

    pub fn update(&mut self, id: &str, patch: EventPatch) -> EventResult<Event> {
        self.update_many(vec![EventUpdate::new(id, patch)])?
            .pop()
            .ok_or_else(|| EventError::NotFound(id.to_string()))
    }

    /// Apply several patches as one unit.
    ///
    /// Every referenced id must exist before anything is touched; a missing
    /// id fails the whole call with `NotFound`. Patches are then applied in
    /// order on a staged copy and committed only if all of them are valid.
    pub fn update_many(&mut self, updates: Vec<EventUpdate>) -> EventResult<Vec<Event>> {
        self.ensure_all_exist(updates.iter().map(|u| u.id.as_str()))?;

        let mut staged = self.events.clone();
        let mut touched: Vec<usize> = Vec::new();
        let mut series: HashSet<String> = HashSet::new();

        for update in &updates {
            let pos = position(&staged, &update.id)
                .ok_or_else(|| EventError::NotFound(update.id.clone()))?;
            let next = policy::apply_patch(&staged[pos], &update.patch)?;

            if let Some(repeat_id) = next.series_id() {
                series.insert(repeat_id.to_string());
            }
            staged[pos] = next;
            if !touched.contains(&pos) {
                touched.push(pos);
            }
        }

        for repeat_id in &series {
            policy::check_series_order(&staged, repeat_id)?;
        }

        let updated = touched.iter().map(|&pos| staged[pos].clone()).collect();
        self.commit(staged, self.next_id)?;

        info!(count = touched.len(), "updated events");
        Ok(updated)
    }

    pub fn delete(&mut self, id: &str) -> EventResult<()> {
        self.delete_many(&[id.to_string()])?;
        Ok(())
    }

    /// Remove several events as one unit; a missing id fails the whole call.
    /// Returns the removed records.
    pub fn delete_many(&mut self, ids: &[String]) -> EventResult<Vec<Event>> {
        self.ensure_all_exist(ids.iter().map(String::as_str))?;

        let doomed: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let (removed, staged): (Vec<Event>, Vec<Event>) = self
            .events
            .iter()
            .cloned()
            .partition(|e| doomed.contains(e.id.as_str()));

        self.commit(staged, self.next_id)?;

        info!(count = removed.len(), "deleted events");
        Ok(removed)
    }

    fn ensure_all_exist<'a>(&self, ids: impl Iterator<Item = &'a str>) -> EventResult<()> {
        let missing: Vec<&str> = ids.filter(|id| position(&self.events, id).is_none()).collect();
        if missing.is_empty() {
            return Ok(());
        }

        warn!(missing = ?missing, "rejected batch referencing unknown events");
        Err(EventError::NotFound(missing.join(", ")))
    }

    /// Persist (if backed by a file) and then swap in the staged state.
    fn commit(&mut self, events: Vec<Event>, next_id: u64) -> EventResult<()> {
        if let Some(file) = &self.snapshot {
            file.save(next_id, &events)?;
        }
        self.events = events;
        self.next_id = next_id;
        Ok(())
    }
}

fn position(events: &[Event], id: &str) -> Option<usize> {
    events.iter().position(|e| e.id == id)
}

/// First id that cannot collide with `events`, never below `floor`.
///
/// Loaded records must satisfy the same invariants mutations keep: valid
/// fields, unique ids and series in strictly increasing date order.
fn next_id_after(events: &[Event], floor: u64) -> EventResult<u64> {
    let mut seen = HashSet::new();
    let mut series = HashSet::new();
    for event in events {
        event.validate()?;
        if !seen.insert(event.id.as_str()) {
            return Err(EventError::validation(format!("duplicate event id {}", event.id)));
        }
        if let Some(repeat_id) = event.series_id()
            && series.insert(repeat_id)
        {
            policy::check_series_order(events, repeat_id)?;
        }
    }

    let highest = events
        .iter()
        .filter_map(|e| e.id.parse::<u64>().ok())
        .max()
        .unwrap_or(0);

    Ok(floor.max(highest + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{RepeatRule, RepeatType};
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, d).unwrap()
    }

    fn draft(title: &str, day: u32) -> EventDraft {
        EventDraft::new(title, date(day), "09:00", "10:00")
    }

    fn member(id: &str, day: u32) -> Event {
        let mut event = draft("Sync", day)
            .with_repeat(RepeatRule::new(RepeatType::Daily, 1, Some(date(17))))
            .into_event(id.to_string());
        event.repeat.id = Some("r1".to_string());
        event
    }

    fn series_store() -> EventStore {
        EventStore::with_events(vec![member("1", 15), member("2", 16), member("3", 17)]).unwrap()
    }

    #[test]
    fn test_create_assigns_sequential_ids() {
        let mut store = EventStore::in_memory();
        let first = store.create(draft("A", 15)).unwrap();
        let rest = store.create_many(vec![draft("B", 16), draft("C", 17)]).unwrap();

        assert_eq!(first.id, "1");
        assert_eq!(rest.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(), vec!["2", "3"]);
        assert_eq!(store.list().len(), 3);
    }

    #[test]
    fn test_create_many_is_all_or_nothing() {
        let mut store = EventStore::in_memory();
        let mut bad = draft("Bad", 16);
        bad.end_time = "08:00".to_string();

        let result = store.create_many(vec![draft("A", 15), bad]);
        assert!(matches!(result, Err(EventError::Validation(_))));
        assert!(store.list().is_empty());

        let created = store.create(draft("A", 15)).unwrap();
        assert_eq!(created.id, "1");
    }

    #[test]
    fn test_create_rejects_recurring_without_series_id() {
        let mut store = EventStore::in_memory();
        let result = store.create(
            draft("Daily", 15).with_repeat(RepeatRule::new(RepeatType::Daily, 1, None)),
        );
        assert!(matches!(result, Err(EventError::Validation(_))));
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut store = EventStore::in_memory();
        store.create(draft("A", 15)).unwrap();
        let b = store.create(draft("B", 16)).unwrap();
        store.delete(&b.id).unwrap();

        let c = store.create(draft("C", 17)).unwrap();
        assert_eq!(c.id, "3");
    }

    #[test]
    fn test_get_and_missing() {
        let store = series_store();
        assert_eq!(store.get("2").unwrap().date, date(16));
        assert!(matches!(store.get("9"), Err(EventError::NotFound(_))));
    }

    #[test]
    fn test_update_missing_id() {
        let mut store = series_store();
        let result = store.update("9", EventPatch::title("X"));
        assert!(matches!(result, Err(EventError::NotFound(_))));
    }

    #[test]
    fn test_update_many_applies_every_patch() {
        let mut store = series_store();
        let updates = ["1", "2", "3"]
            .iter()
            .map(|id| EventUpdate::new(*id, EventPatch::title("X")))
            .collect();

        let updated = store.update_many(updates).unwrap();
        assert_eq!(updated.len(), 3);
        assert!(store.list().iter().all(|e| e.title == "X"));
        assert_eq!(
            store.list().iter().map(|e| e.date).collect::<Vec<_>>(),
            vec![date(15), date(16), date(17)]
        );
    }

    #[test]
    fn test_update_many_with_unknown_id_changes_nothing() {
        let mut store = series_store();
        let before = store.list().to_vec();
        let updates = vec![
            EventUpdate::new("1", EventPatch::title("X")),
            EventUpdate::new("2", EventPatch::title("X")),
            EventUpdate::new("3", EventPatch::title("X")),
            EventUpdate::new("42", EventPatch::title("X")),
        ];

        let result = store.update_many(updates);
        assert!(matches!(result, Err(EventError::NotFound(ref id)) if id == "42"));
        assert_eq!(store.list(), before.as_slice());
    }

    #[test]
    fn test_update_many_with_invalid_patch_changes_nothing() {
        let mut store = series_store();
        let before = store.list().to_vec();
        let bad = EventPatch {
            start_time: Some("23:00".to_string()),
            ..Default::default()
        };

        let result = store.update_many(vec![
            EventUpdate::new("1", EventPatch::title("X")),
            EventUpdate::new("2", bad),
        ]);
        assert!(matches!(result, Err(EventError::Validation(_))));
        assert_eq!(store.list(), before.as_slice());
    }

    #[test]
    fn test_moving_member_past_sibling_is_rejected() {
        let mut store = series_store();
        let patch = EventPatch {
            date: Some(date(20)),
            ..Default::default()
        };
        assert!(matches!(store.update("1", patch), Err(EventError::Validation(_))));
    }

    #[test]
    fn test_delete_keeps_siblings_series_id() {
        let mut store = series_store();
        store.delete("2").unwrap();

        let remaining = store.list();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().all(|e| e.repeat.id.as_deref() == Some("r1")));
    }

    #[test]
    fn test_delete_missing_id() {
        let mut store = series_store();
        assert!(matches!(store.delete("9"), Err(EventError::NotFound(_))));
        assert_eq!(store.list().len(), 3);
    }

    #[test]
    fn test_delete_many_is_all_or_nothing() {
        let mut store = series_store();
        let result = store.delete_many(&["1".to_string(), "9".to_string()]);
        assert!(matches!(result, Err(EventError::NotFound(_))));
        assert_eq!(store.list().len(), 3);

        let removed = store.delete_many(&["1".to_string(), "3".to_string()]).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(store.list()[0].id, "2");
    }

    #[test]
    fn test_with_events_rejects_duplicate_ids() {
        let result = EventStore::with_events(vec![member("1", 15), member("1", 16)]);
        assert!(matches!(result, Err(EventError::Validation(_))));
    }

    #[test]
    fn test_with_events_rejects_out_of_order_series() {
        let result = EventStore::with_events(vec![member("1", 16), member("2", 15)]);
        assert!(matches!(result, Err(EventError::Validation(_))));
    }

    #[test]
    fn test_open_rejects_out_of_order_series() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        SnapshotFile::new(&path)
            .save(3, &[member("1", 17), member("2", 16)])
            .unwrap();

        assert!(matches!(
            EventStore::open(&path),
            Err(EventError::Validation(_))
        ));
    }

    #[test]
    fn test_with_events_continues_after_highest_id() {
        let mut store = series_store();
        let created = store.create(draft("A", 20)).unwrap();
        assert_eq!(created.id, "4");
    }

    #[test]
    fn test_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");

        {
            let mut store = EventStore::open(&path).unwrap();
            store.create(draft("A", 15)).unwrap();
            let b = store.create(draft("B", 16)).unwrap();
            store.delete(&b.id).unwrap();
        }

        let mut reopened = EventStore::open(&path).unwrap();
        assert_eq!(reopened.list().len(), 1);
        assert_eq!(reopened.list()[0].title, "A");

        let c = reopened.create(draft("C", 17)).unwrap();
        assert_eq!(c.id, "3");
    }
}
