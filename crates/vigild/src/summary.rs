//! One-line fleet summaries for the daemon log.

use std::time::Duration;

use vigil_core::{Snapshot, StatusColor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetSummary {
    pub up: usize,
    pub flapping: usize,
    pub down: usize,
    /// Endpoints currently red, in name order.
    pub down_names: Vec<String>,
    pub outages: usize,
    pub last_cycle: Option<String>,
}

impl FleetSummary {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let counts = snapshot.status_counts();
        let down_names = snapshot
            .status
            .iter()
            .filter(|(_, color)| **color == StatusColor::Red)
            .map(|(name, _)| name.clone())
            .collect();
        Self {
            up: counts.green,
            flapping: counts.yellow,
            down: counts.red,
            down_names,
            outages: snapshot.outage_events.len(),
            last_cycle: snapshot.latest_timestamp().map(str::to_string),
        }
    }
}

/// Whether the latest snapshot is older than `tolerance` periods.
pub fn is_stale(staleness: Option<Duration>, interval: Duration, tolerance: u32) -> bool {
    match staleness {
        Some(age) => age > interval.saturating_mul(tolerance),
        None => false,
    }
}
