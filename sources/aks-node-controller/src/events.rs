//! Event files picked up by the Azure VM guest agent.

use chrono::{DateTime, Local};
use log::error;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

const EVENT_VERSION: &str = "1.23";
const EVENT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Informational,
    Error,
}

impl EventLevel {
    fn as_str(&self) -> &'static str {
        match self {
            EventLevel::Informational => "Informational",
            EventLevel::Error => "Error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GuestAgentEvent {
    pub timestamp: String,
    pub operation_id: String,
    pub version: String,
    pub task_name: String,
    pub event_level: String,
    pub message: String,
    pub event_pid: String,
    pub event_tid: String,
}

/// Writes one JSON file per event into `dir`.
#[derive(Debug, Clone)]
pub struct EventLogger {
    dir: PathBuf,
}

impl EventLogger {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Records that `task_name` ran from `start` to `end`.  Errors are logged, never returned.
    pub fn log_event(
        &self,
        task_name: &str,
        message: &str,
        level: EventLevel,
        start: DateTime<Local>,
        end: DateTime<Local>,
    ) {
        if let Err(e) = fs::DirBuilder::new()
            .recursive(true)
            .mode(0o755)
            .create(&self.dir)
        {
            error!(
                "Failed to create events directory '{}': {}",
                self.dir.display(),
                e
            );
            return;
        }

        let start_str = start.format(EVENT_TIME_FORMAT).to_string();
        let end_str = end.format(EVENT_TIME_FORMAT).to_string();
        let timing = format!(
            "startTime={} endTime={} durationMs={}",
            start_str,
            end_str,
            (end - start).num_milliseconds()
        );
        let message = if message.is_empty() {
            timing
        } else {
            format!("{} | {}", message, timing)
        };

        let event = GuestAgentEvent {
            timestamp: start_str,
            operation_id: end_str,
            version: EVENT_VERSION.to_string(),
            task_name: task_name.to_string(),
            event_level: level.as_str().to_string(),
            message,
            event_pid: "0".to_string(),
            event_tid: "0".to_string(),
        };
        let data = match serde_json::to_vec(&event) {
            Ok(data) => data,
            Err(e) => {
                error!("Failed to serialize guest agent event: {}", e);
                return;
            }
        };

        // Nanosecond file names keep events from one boot unique and in creation order.
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let path = self.dir.join(format!("{}.json", nanos));
        let written = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o644)
            .open(&path)
            .and_then(|mut f| f.write_all(&data));
        if let Err(e) = written {
            error!(
                "Failed to write guest agent event file '{}': {}",
                path.display(),
                e
            );
        }
    }

    /// Reads back every event in the directory, oldest first.
    pub fn events(&self) -> Vec<GuestAgentEvent> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                error!(
                    "Failed to read events directory '{}': {}",
                    self.dir.display(),
                    e
                );
                return Vec::new();
            }
        };
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().map_or(false, |ext| ext == "json"))
            .collect();
        paths.sort();

        paths
            .iter()
            .filter_map(|p| {
                fs::read(p)
                    .ok()
                    .and_then(|data| serde_json::from_slice(&data).ok())
            })
            .collect()
    }
}
