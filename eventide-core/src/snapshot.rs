//! JSON snapshot persistence for the event store.
//!
//! The file holds the whole collection plus the next id to hand out:
//! `{ "nextId": 5, "events": [...] }`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EventError, EventResult};
use crate::event::Event;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub next_id: u64,
    pub events: Vec<Event>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotRef<'a> {
    next_id: u64,
    events: &'a [Event],
}

/// A snapshot file on disk.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SnapshotFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot, or `None` if the file does not exist yet.
    pub fn load(&self) -> EventResult<Option<Snapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)?;
        let snapshot: Snapshot = serde_json::from_str(&content).map_err(|e| {
            EventError::Serialization(format!("{}: {}", self.path.display(), e))
        })?;

        Ok(Some(snapshot))
    }

    /// Write the snapshot through a temporary file so readers never see a
    /// half-written collection.
    pub fn save(&self, next_id: u64, events: &[Event]) -> EventResult<()> {
        let content = serde_json::to_string_pretty(&SnapshotRef { next_id, events })
            .map_err(|e| EventError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;

        Ok(())
    }
}
