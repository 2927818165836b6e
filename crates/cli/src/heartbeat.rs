//! File heartbeat for external watchdogs.

use chrono::{DateTime, Utc};
use co2mon_session::HeartbeatSink;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Writes the unix timestamp of the last Ok reading to a file.
///
/// Write failures are logged and otherwise ignored; a missing heartbeat is
/// the signal the watchdog is looking for.
#[derive(Debug, Clone)]
pub struct FileHeartbeat {
    path: PathBuf,
}

impl FileHeartbeat {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HeartbeatSink for FileHeartbeat {
    fn record_heartbeat(&mut self, at: DateTime<Utc>) {
        if let Err(e) = std::fs::write(&self.path, format!("{}\n", at.timestamp())) {
            warn!("Failed to write heartbeat to {}: {}", self.path.display(), e);
        }
    }
}
