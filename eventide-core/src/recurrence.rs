//! Recurrence expansion.
//!
//! Turns one template with a repeating rule into the full, dated list of
//! occurrences that make up a series. Rules are evaluated as RFC 5545
//! RRULEs anchored at midnight UTC on the template date. Monthly and yearly
//! steps keep the template's day of month; a step landing on a day the
//! target month does not have (Jan 31 + 1 month, Feb 29 in a common year)
//! produces no occurrence.

use chrono::{Days, NaiveDate};
use rrule::RRuleSet;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{EventError, EventResult};
use crate::event::{EventDraft, RepeatType};

pub const DEFAULT_MAX_OCCURRENCES: usize = 1000;
pub const DEFAULT_HORIZON_DAYS: u32 = 730;

/// Safety limits for expansion.
///
/// `horizon_days` bounds series without an `endDate`; `max_occurrences`
/// bounds every series regardless of `endDate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceLimits {
    #[serde(default = "default_max_occurrences")]
    pub max_occurrences: usize,
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
}

fn default_max_occurrences() -> usize {
    DEFAULT_MAX_OCCURRENCES
}

fn default_horizon_days() -> u32 {
    DEFAULT_HORIZON_DAYS
}

impl Default for RecurrenceLimits {
    fn default() -> Self {
        RecurrenceLimits {
            max_occurrences: DEFAULT_MAX_OCCURRENCES,
            horizon_days: DEFAULT_HORIZON_DAYS,
        }
    }
}

impl RecurrenceLimits {
    pub fn validate(&self) -> EventResult<()> {
        if self.max_occurrences == 0 {
            return Err(EventError::validation("max_occurrences must be at least 1"));
        }
        if self.horizon_days == 0 {
            return Err(EventError::validation("horizon_days must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecurrenceExpander {
    limits: RecurrenceLimits,
}

impl RecurrenceExpander {
    pub fn new(limits: RecurrenceLimits) -> Self {
        RecurrenceExpander { limits }
    }

    /// Expand a template into its occurrences, eagerly.
    ///
    /// - A non-repeating template yields itself, with `repeat.id` cleared.
    /// - A repeating template yields every occurrence up to `endDate`
    ///   (inclusive) or the horizon, all sharing one fresh `repeat.id`.
    /// - An `endDate` before `date` yields an empty list.
    pub fn expand(&self, template: &EventDraft) -> EventResult<Vec<EventDraft>> {
        template.validate()?;

        let rule = &template.repeat;
        if !rule.is_recurring() {
            let mut single = template.clone();
            single.repeat.id = None;
            return Ok(vec![single]);
        }

        let until = self.until(template.date, rule.end_date);
        let dates = self.occurrence_dates(template.date, rule.kind, rule.interval, until)?;

        let series_id = Uuid::new_v4().to_string();
        debug!(
            series = %series_id,
            kind = ?rule.kind,
            interval = rule.interval,
            %until,
            occurrences = dates.len(),
            "expanded recurring template"
        );

        let occurrences = dates
            .into_iter()
            .map(|date| {
                let mut occurrence = template.clone();
                occurrence.date = date;
                occurrence.repeat.id = Some(series_id.clone());
                occurrence
            })
            .collect();

        Ok(occurrences)
    }

    /// Last date (inclusive) an occurrence may fall on.
    fn until(&self, start: NaiveDate, end_date: Option<NaiveDate>) -> NaiveDate {
        end_date.unwrap_or_else(|| {
            start
                .checked_add_days(Days::new(u64::from(self.limits.horizon_days)))
                .unwrap_or(NaiveDate::MAX)
        })
    }
}

/// RRULE frequency name for a repeating kind.
fn frequency(kind: RepeatType) -> Option<&'static str> {
    match kind {
        RepeatType::None => None,
        RepeatType::Daily => Some("DAILY"),
        RepeatType::Weekly => Some("WEEKLY"),
        RepeatType::Monthly => Some("MONTHLY"),
        RepeatType::Yearly => Some("YEARLY"),
    }
}

/// Build an iCalendar DTSTART/RRULE pair for the rrule crate parser.
///
/// All-day occurrences are anchored at midnight UTC, so an `UNTIL` of
/// midnight on the last day keeps that day inclusive.
fn build_rrule_string(start: NaiveDate, freq: &str, interval: u32, until: NaiveDate) -> String {
    format!(
        "DTSTART:{}T000000Z\nRRULE:FREQ={};INTERVAL={};UNTIL={}T000000Z",
        start.format("%Y%m%d"),
        freq,
        interval,
        until.format("%Y%m%d")
    )
}

impl RecurrenceExpander {
    /// Dates produced by the rule from `start` up to and including `until`,
    /// capped at `max_occurrences`.
    fn occurrence_dates(
        &self,
        start: NaiveDate,
        kind: RepeatType,
        interval: u32,
        until: NaiveDate,
    ) -> EventResult<Vec<NaiveDate>> {
        if until < start {
            return Ok(Vec::new());
        }
        let Some(freq) = frequency(kind) else {
            return Ok(vec![start]);
        };

        let rrule_str = build_rrule_string(start, freq, interval, until);
        let rrule_set: RRuleSet = rrule_str.parse().map_err(|e| {
            EventError::validation(format!("invalid repeat rule starting {}: {}", start, e))
        })?;

        let limit = u16::try_from(self.limits.max_occurrences).unwrap_or(u16::MAX);
        let result = rrule_set.all(limit);

        Ok(result.dates.iter().map(|dt| dt.date_naive()).collect())
    }
}
