//! Incremental processing state.
//!
//! One batch run owns one `ProcessingState` value with an explicit load/save
//! lifecycle: read once at startup, written after every completed unit so a
//! hard interruption loses at most the in-flight unit. Workers never touch
//! the state file; the driver thread is its single writer.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use udoc_core::{Result, UdocError};

/// Lifecycle of one processing unit (file, page, or folder).
///
/// `Failed` is a side-state, not terminal: a failed unit returns control to
/// the driver loop and may be retried on a later run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Unseen,
    InProgress,
    Done,
    Failed,
}

/// A recorded per-unit failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitFailure {
    pub unit: String,
    pub message: String,
}

/// Persisted completion map plus resume cursor.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProcessingState {
    #[serde(default)]
    units: BTreeMap<String, UnitStatus>,
    /// Id of the unit that completed most recently.
    #[serde(default)]
    cursor: Option<String>,
    #[serde(default)]
    failures: Vec<UnitFailure>,
    #[serde(default)]
    last_update: Option<i64>,
}

impl ProcessingState {
    /// Loads persisted state, or starts fresh when the file is absent.
    ///
    /// An unreadable state file degrades to a fresh state with a warning:
    /// the worst outcome is reprocessing work that skip-existing will catch.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path)
            .map_err(UdocError::from)
            .and_then(|raw| serde_json::from_str(&raw).map_err(UdocError::from))
        {
            Ok(state) => state,
            Err(err) => {
                log::warn!("could not read state file {}: {err}", path.display());
                Self::default()
            }
        }
    }

    /// Writes the state file whole. One retry on failure, then
    /// [`UdocError::Persistence`]: a batch whose state cannot be saved is not
    /// resumable and must stop.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.last_update = Some(chrono::Utc::now().timestamp());
        let body = serde_json::to_string_pretty(self)?;
        if let Err(first) = std::fs::write(path, &body) {
            log::warn!("state write failed, retrying once: {first}");
            std::fs::write(path, &body).map_err(|second| {
                UdocError::Persistence(format!("{}: {second}", path.display()))
            })?;
        }
        Ok(())
    }

    #[must_use]
    pub fn status(&self, unit: &str) -> UnitStatus {
        self.units.get(unit).copied().unwrap_or(UnitStatus::Unseen)
    }

    #[must_use]
    pub fn is_done(&self, unit: &str) -> bool {
        self.status(unit) == UnitStatus::Done
    }

    #[must_use]
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    #[must_use]
    pub fn failures(&self) -> &[UnitFailure] {
        &self.failures
    }

    pub fn mark_in_progress(&mut self, unit: &str) {
        self.units.insert(unit.to_string(), UnitStatus::InProgress);
    }

    pub fn mark_done(&mut self, unit: &str) {
        self.units.insert(unit.to_string(), UnitStatus::Done);
        self.cursor = Some(unit.to_string());
    }

    pub fn mark_failed(&mut self, unit: &str, message: &str) {
        self.units.insert(unit.to_string(), UnitStatus::Failed);
        self.failures.push(UnitFailure {
            unit: unit.to_string(),
            message: message.to_string(),
        });
        self.cursor = Some(unit.to_string());
    }

    /// Index of the first unit to process when resuming over `unit_ids`.
    ///
    /// Units up to and including the recorded cursor are skipped. A cursor
    /// that no longer appears in the list (inputs changed between runs)
    /// degrades to processing from the start.
    #[must_use]
    pub fn resume_position(&self, unit_ids: &[String]) -> usize {
        match &self.cursor {
            Some(cursor) => match unit_ids.iter().position(|id| id == cursor) {
                Some(pos) => pos + 1,
                None => {
                    log::info!("resume cursor '{cursor}' not in current unit list, starting over");
                    0
                }
            },
            None => 0,
        }
    }
}
