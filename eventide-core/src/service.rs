//! Event use-case service.
//!
//! Composes the store, the recurrence expander and the mutation policy into
//! the operations callers use. The service is synchronous; callers that
//! share it across tasks serialise mutations behind a lock.

use tracing::info;

use crate::error::{EventError, EventResult};
use crate::event::{Event, EventDraft, EventPatch, EventUpdate};
use crate::policy;
use crate::recurrence::RecurrenceExpander;
use crate::store::EventStore;

#[derive(Debug, Default)]
pub struct EventService {
    store: EventStore,
    expander: RecurrenceExpander,
}

impl EventService {
    pub fn new(store: EventStore, expander: RecurrenceExpander) -> Self {
        EventService { store, expander }
    }

    pub fn list_all(&self) -> &[Event] {
        self.store.list()
    }

    pub fn get(&self, id: &str) -> EventResult<&Event> {
        self.store.get(id)
    }

    /// Create one template: a standalone event, or every occurrence of a
    /// repeating one. Returns the created events in date order.
    ///
    /// A repeating template whose rule produces no occurrence is rejected.
    pub fn create_single(&mut self, mut template: EventDraft) -> EventResult<Vec<Event>> {
        if !template.repeat.is_recurring() {
            template.repeat.id = None;
            return Ok(vec![self.store.create(template)?]);
        }

        let occurrences = self.expander.expand(&template)?;
        if occurrences.is_empty() {
            return Err(EventError::validation(format!(
                "repeat rule produces no occurrences between {} and {}",
                template.date,
                template
                    .repeat
                    .end_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "the horizon".to_string())
            )));
        }

        let created = self.store.create_many(occurrences)?;
        if let Some(series) = created.first().and_then(|e| e.series_id()) {
            info!(series, occurrences = created.len(), "created series");
        }
        Ok(created)
    }

    /// Expand and create several templates in one store call; if any
    /// template is invalid nothing is created. Empty series are allowed.
    /// Returns the full collection afterwards.
    pub fn create_batch(&mut self, templates: Vec<EventDraft>) -> EventResult<&[Event]> {
        let mut drafts = Vec::new();
        for template in &templates {
            drafts.extend(self.expander.expand(template)?);
        }

        let created = self.store.create_many(drafts)?;
        info!(
            templates = templates.len(),
            created = created.len(),
            "created event batch"
        );
        Ok(self.store.list())
    }

    pub fn update_single(&mut self, id: &str, patch: EventPatch) -> EventResult<Event> {
        let before = self.store.get(id)?.series_id().map(str::to_string);
        let updated = self.store.update(id, patch)?;

        if let Some(series) = before
            && updated.series_id().is_none()
        {
            info!(id, series = %series, "detached occurrence from series");
        }
        Ok(updated)
    }

    /// Apply several patches; all ids must exist or nothing changes.
    pub fn update_batch(&mut self, updates: Vec<EventUpdate>) -> EventResult<Vec<Event>> {
        self.store.update_many(updates)
    }

    /// Patch every member of a series through the batch path. `date` and
    /// the repeat rule are not propagated. An unknown series updates nothing.
    pub fn update_series(&mut self, repeat_id: &str, patch: EventPatch) -> EventResult<Vec<Event>> {
        let members = policy::series_members(self.store.list(), repeat_id);
        if members.is_empty() {
            return Ok(Vec::new());
        }

        let updated = self
            .store
            .update_many(policy::series_updates(&members, &patch))?;
        info!(series = repeat_id, count = updated.len(), "updated series");
        Ok(updated)
    }

    pub fn delete_single(&mut self, id: &str) -> EventResult<()> {
        self.store.delete(id)
    }

    /// Delete several events; all ids must exist or nothing is removed.
    pub fn delete_batch(&mut self, ids: &[String]) -> EventResult<usize> {
        Ok(self.store.delete_many(ids)?.len())
    }

    /// Delete every member of a series. An unknown series is a no-op.
    pub fn delete_series(&mut self, repeat_id: &str) -> EventResult<usize> {
        let members = policy::series_members(self.store.list(), repeat_id);
        if members.is_empty() {
            return Ok(0);
        }

        let removed = self.store.delete_many(&members)?;
        info!(series = repeat_id, count = removed.len(), "deleted series");
        Ok(removed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{RepeatRule, RepeatType};
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, d).unwrap()
    }

    fn standup() -> EventDraft {
        EventDraft::new("Standup", date(15), "09:00", "09:15").with_repeat(RepeatRule::new(
            RepeatType::Daily,
            1,
            Some(date(17)),
        ))
    }

    fn lunch() -> EventDraft {
        EventDraft::new("Lunch", date(15), "12:00", "13:00")
    }

    #[test]
    fn test_create_single_standalone() {
        let mut service = EventService::default();
        let created = service.create_single(lunch()).unwrap();

        assert_eq!(created.len(), 1);
        assert_eq!(created[0].repeat.id, None);
        assert_eq!(service.list_all().len(), 1);
    }

    #[test]
    fn test_create_single_drops_series_id_on_standalone() {
        let mut service = EventService::default();
        let mut template = lunch();
        template.repeat.id = Some("bogus".to_string());

        let created = service.create_single(template).unwrap();
        assert_eq!(created[0].repeat.id, None);
    }

    #[test]
    fn test_create_single_expands_series() {
        let mut service = EventService::default();
        let created = service.create_single(standup()).unwrap();

        assert_eq!(created.len(), 3);
        assert_eq!(
            created.iter().map(|e| e.date).collect::<Vec<_>>(),
            vec![date(15), date(16), date(17)]
        );
        let series = created[0].repeat.id.clone();
        assert!(series.is_some());
        assert!(created.iter().all(|e| e.repeat.id == series));
        assert_eq!(
            created.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(),
            vec!["1", "2", "3"]
        );
    }

    #[test]
    fn test_create_single_rejects_empty_series() {
        let mut service = EventService::default();
        let mut template = standup();
        template.repeat.end_date = Some(date(1));

        assert!(matches!(
            service.create_single(template),
            Err(EventError::Validation(_))
        ));
        assert!(service.list_all().is_empty());
    }

    #[test]
    fn test_create_batch_returns_full_collection() {
        let mut service = EventService::default();
        service.create_single(lunch()).unwrap();

        let mut empty_series = standup();
        empty_series.repeat.end_date = Some(date(1));

        let all = service
            .create_batch(vec![standup(), lunch(), empty_series])
            .unwrap();
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn test_create_batch_fails_fast() {
        let mut service = EventService::default();
        let mut bad = lunch();
        bad.title = String::new();

        assert!(service.create_batch(vec![standup(), bad]).is_err());
        assert!(service.list_all().is_empty());
    }

    #[test]
    fn test_detach_one_member() {
        let mut service = EventService::default();
        let created = service.create_single(standup()).unwrap();
        let series = created[0].repeat.id.clone();

        let detached = service
            .update_single(&created[1].id, EventPatch::detach())
            .unwrap();
        assert_eq!(detached.repeat.id, None);
        assert_eq!(detached.repeat.kind, RepeatType::None);

        let others: Vec<_> = service
            .list_all()
            .iter()
            .filter(|e| e.id != detached.id)
            .collect();
        assert!(others.iter().all(|e| e.repeat.id == series));
    }

    #[test]
    fn test_update_series_keeps_dates() {
        let mut service = EventService::default();
        let created = service.create_single(standup()).unwrap();
        let series = created[0].repeat.id.clone().unwrap();
        service.create_single(lunch()).unwrap();

        let patch = EventPatch {
            title: Some("X".to_string()),
            location: Some("Room B".to_string()),
            date: Some(date(30)),
            ..Default::default()
        };
        let updated = service.update_series(&series, patch).unwrap();

        assert_eq!(updated.len(), 3);
        assert!(updated.iter().all(|e| e.title == "X" && e.location == "Room B"));
        assert_eq!(
            updated.iter().map(|e| e.date).collect::<Vec<_>>(),
            vec![date(15), date(16), date(17)]
        );
        assert_eq!(service.get("4").unwrap().title, "Lunch");
    }

    #[test]
    fn test_update_series_skips_detached_members() {
        let mut service = EventService::default();
        let created = service.create_single(standup()).unwrap();
        let series = created[0].repeat.id.clone().unwrap();
        service
            .update_single(&created[0].id, EventPatch::detach())
            .unwrap();

        let updated = service
            .update_series(&series, EventPatch::title("X"))
            .unwrap();
        assert_eq!(updated.len(), 2);
        assert_eq!(service.get(&created[0].id).unwrap().title, "Standup");
    }

    #[test]
    fn test_unknown_series_is_a_no_op() {
        let mut service = EventService::default();
        service.create_single(standup()).unwrap();

        assert!(service
            .update_series("missing", EventPatch::title("X"))
            .unwrap()
            .is_empty());
        assert_eq!(service.delete_series("missing").unwrap(), 0);
        assert_eq!(service.list_all().len(), 3);
    }

    #[test]
    fn test_delete_single_member() {
        let mut service = EventService::default();
        let created = service.create_single(standup()).unwrap();
        let series = created[0].repeat.id.clone();

        service.delete_single(&created[0].id).unwrap();
        assert_eq!(service.list_all().len(), 2);
        assert!(service.list_all().iter().all(|e| e.repeat.id == series));
    }

    #[test]
    fn test_delete_series() {
        let mut service = EventService::default();
        let created = service.create_single(standup()).unwrap();
        service.create_single(lunch()).unwrap();
        let series = created[0].repeat.id.clone().unwrap();

        assert_eq!(service.delete_series(&series).unwrap(), 3);
        assert_eq!(service.list_all().len(), 1);
        assert_eq!(service.list_all()[0].title, "Lunch");
    }

    #[test]
    fn test_delete_batch_requires_every_id() {
        let mut service = EventService::default();
        service.create_single(standup()).unwrap();

        let result = service.delete_batch(&["1".to_string(), "8".to_string()]);
        assert!(matches!(result, Err(EventError::NotFound(_))));
        assert_eq!(service.list_all().len(), 3);

        assert_eq!(service.delete_batch(&["1".to_string(), "2".to_string()]).unwrap(), 2);
    }
}
