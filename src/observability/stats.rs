//! Process-wide dispatch counters.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Counters shared by every request; all updates are atomic.
#[derive(Debug)]
pub struct Stats {
    started: DateTime<Utc>,
    forwards: AtomicU64,
    failures: AtomicU64,
    sequence: AtomicU64,
}

/// JSON body of `/stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatsSnapshot {
    pub uptime: String,
    pub forwards: u64,
    pub failures: u64,
}

impl Stats {
    pub fn new() -> Self {
        Self {
            started: Utc::now(),
            forwards: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            sequence: AtomicU64::new(0),
        }
    }

    /// Count a successful forward; returns its log sequence number.
    pub fn record_forward(&self) -> u64 {
        self.forwards.fetch_add(1, Ordering::Relaxed);
        self.next_sequence()
    }

    /// Count a request that had no target; returns its log sequence number.
    pub fn record_failure(&self) -> u64 {
        self.failures.fetch_add(1, Ordering::Relaxed);
        self.next_sequence()
    }

    pub fn forwards(&self) -> u64 {
        self.forwards.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            uptime: self.started.format("%d %b %y %H:%M UTC").to_string(),
            forwards: self.forwards(),
            failures: self.failures(),
        }
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}
