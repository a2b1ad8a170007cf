use std::sync::Arc;

use anyhow::{Context, Result};
use eventide_core::{EventService, EventStore, RecurrenceExpander};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::ServerConfig;

/// Shared application state
///
/// One service owns the store; handlers read under the read lock and
/// mutate under the write lock, so mutations never interleave.
#[derive(Clone)]
pub struct AppState {
    service: Arc<RwLock<EventService>>,
}

impl AppState {
    pub fn new(service: EventService) -> Self {
        AppState {
            service: Arc::new(RwLock::new(service)),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let store = match &config.data_file {
            Some(path) => EventStore::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?,
            None => EventStore::in_memory(),
        };
        let expander = RecurrenceExpander::new(config.recurrence);

        Ok(AppState::new(EventService::new(store, expander)))
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, EventService> {
        self.service.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, EventService> {
        self.service.write().await
    }
}
