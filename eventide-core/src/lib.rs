//! Core types and rules for the eventide calendar service.
//!
//! - `event`: the `Event` record, creation templates and typed patches
//! - `recurrence`: expansion of a template into a dated series
//! - `policy`: single-occurrence vs series-wide mutation rules
//! - `store`: authoritative event collection with id assignment
//! - `service`: create/list/update/delete operations composed from the above

pub mod error;
pub mod event;
pub mod policy;
pub mod recurrence;
pub mod service;
pub mod snapshot;
pub mod store;

pub use error::{EventError, EventResult};
pub use event::*;
pub use recurrence::{RecurrenceExpander, RecurrenceLimits};
pub use service::EventService;
pub use store::EventStore;
