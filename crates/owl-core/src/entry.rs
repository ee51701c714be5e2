//! Log entry data model and snapshot capture.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One open window as reported by a [`Capturer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppRecord {
    pub title: String,
    pub path: String,
    /// Emitted only when true.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_active: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A single captured log entry.
///
/// Serialized without a tag: the `time` / `timestamp` key tells the two
/// shapes apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogEntry {
    Active {
        time: i64,
        apps: Vec<AppRecord>,
    },
    Idle {
        timestamp: i64,
        #[serde(rename = "durationSinceLastInput")]
        duration_since_last_input: u64,
    },
}

impl LogEntry {
    pub fn is_idle(&self) -> bool {
        matches!(self, LogEntry::Idle { .. })
    }

    /// Unix seconds at which the entry was captured.
    pub fn unix_time(&self) -> i64 {
        match self {
            LogEntry::Active { time, .. } => *time,
            LogEntry::Idle { timestamp, .. } => *timestamp,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Source of activity snapshots, implemented per platform or backend.
pub trait Capturer {
    /// Enumerate the visible top-level windows.
    fn open_windows(&mut self) -> Result<Vec<AppRecord>>;

    /// Seconds since the last keyboard or mouse input.
    fn seconds_since_last_input(&mut self) -> Result<u64>;
}

impl<C: Capturer + ?Sized> Capturer for Box<C> {
    fn open_windows(&mut self) -> Result<Vec<AppRecord>> {
        (**self).open_windows()
    }

    fn seconds_since_last_input(&mut self) -> Result<u64> {
        (**self).seconds_since_last_input()
    }
}

/// Take one snapshot at `now`, skipping window enumeration when idle.
pub fn snapshot<C: Capturer + ?Sized>(
    capturer: &mut C,
    idle_threshold: u64,
    now: i64,
) -> Result<LogEntry> {
    let idle = capturer.seconds_since_last_input()?;
    if idle > idle_threshold {
        return Ok(LogEntry::Idle {
            timestamp: now,
            duration_since_last_input: idle,
        });
    }

    Ok(LogEntry::Active {
        time: now,
        apps: capturer.open_windows()?,
    })
}
