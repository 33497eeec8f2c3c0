//! Snapshot types shared between the health engine and its readers.
//!
//! A [`Snapshot`] is the complete, immutable view published after every
//! cycle. Its serde shape is the wire format consumed by the JSON route,
//! the report renderer and the dashboard.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Traffic-light classification of an endpoint's latest samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    /// Up, and unchanged since the previous cycle.
    Green,
    /// The latest cycle changed state (flapping).
    Yellow,
    /// Down, and unchanged since the previous cycle.
    Red,
}

impl StatusColor {
    /// Classify a sample history, oldest first.
    ///
    /// Only the last two samples matter. With fewer than two samples the
    /// color is green if the latest is up, otherwise red.
    pub fn classify(samples: &[bool]) -> Self {
        match samples {
            [.., prev, last] if prev != last => StatusColor::Yellow,
            [.., true] => StatusColor::Green,
            _ => StatusColor::Red,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusColor::Green => "green",
            StatusColor::Yellow => "yellow",
            StatusColor::Red => "red",
        }
    }
}

impl std::fmt::Display for StatusColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An endpoint whose accumulated downtime reached the outage threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutageEvent {
    /// Formatted cycle timestamp.
    pub time: String,
    pub name: String,
    /// Contiguous down-seconds at the time of the cycle.
    pub downtime_seconds: u64,
}

/// An endpoint whose state changed between two consecutive cycles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlapEvent {
    pub time: String,
    pub name: String,
}

/// Point-in-time view of the whole fleet.
///
/// Produced once per cycle and never mutated after publication. The
/// default value is the well-formed empty snapshot served before the
/// first cycle completes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Cycle timestamps, oldest first.
    pub timestamps: Vec<String>,
    /// Per-endpoint samples aligned with `timestamps` (1 = up, 0 = down).
    pub series: BTreeMap<String, Vec<u8>>,
    pub status: BTreeMap<String, StatusColor>,
    /// Outages observed in the cycle that produced this snapshot.
    pub outage_events: Vec<OutageEvent>,
    /// Flaps observed in the cycle that produced this snapshot.
    pub flap_events: Vec<FlapEvent>,
}

/// Up/flapping/down tally over a snapshot's status map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub green: usize,
    pub yellow: usize,
    pub red: usize,
}

impl Snapshot {
    /// The empty snapshot (no cycles recorded yet).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Timestamp of the cycle that produced this snapshot.
    pub fn latest_timestamp(&self) -> Option<&str> {
        self.timestamps.last().map(String::as_str)
    }

    pub fn status_of(&self, name: &str) -> Option<StatusColor> {
        self.status.get(name).copied()
    }

    /// Most recent sample for an endpoint.
    pub fn latest_sample(&self, name: &str) -> Option<bool> {
        self.series
            .get(name)
            .and_then(|samples| samples.last())
            .map(|s| *s == 1)
    }

    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for color in self.status.values() {
            match color {
                StatusColor::Green => counts.green += 1,
                StatusColor::Yellow => counts.yellow += 1,
                StatusColor::Red => counts.red += 1,
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_single_sample() {
        assert_eq!(StatusColor::classify(&[true]), StatusColor::Green);
        assert_eq!(StatusColor::classify(&[false]), StatusColor::Red);
    }

    #[test]
    fn classify_transition_is_yellow() {
        assert_eq!(StatusColor::classify(&[true, false]), StatusColor::Yellow);
        assert_eq!(StatusColor::classify(&[false, true]), StatusColor::Yellow);
    }

    #[test]
    fn classify_steady_state() {
        assert_eq!(StatusColor::classify(&[true, false, false]), StatusColor::Red);
        assert_eq!(StatusColor::classify(&[false, true, true]), StatusColor::Green);
    }

    #[test]
    fn classify_empty_is_red() {
        assert_eq!(StatusColor::classify(&[]), StatusColor::Red);
    }

    #[test]
    fn empty_snapshot_wire_shape() {
        let json = serde_json::to_value(Snapshot::empty()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "timestamps": [],
                "series": {},
                "status": {},
                "outageEvents": [],
                "flapEvents": [],
            })
        );
    }

    #[test]
    fn populated_snapshot_wire_shape() {
        let mut snap = Snapshot::empty();
        snap.timestamps.push("10:00:05".to_string());
        snap.series.insert("api".to_string(), vec![0]);
        snap.status.insert("api".to_string(), StatusColor::Red);
        snap.outage_events.push(OutageEvent {
            time: "10:00:05".to_string(),
            name: "api".to_string(),
            downtime_seconds: 5,
        });
        snap.flap_events.push(FlapEvent {
            time: "10:00:05".to_string(),
            name: "api".to_string(),
        });

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["series"]["api"], serde_json::json!([0]));
        assert_eq!(json["status"]["api"], "red");
        assert_eq!(json["outageEvents"][0]["downtimeSeconds"], 5);
        assert_eq!(json["flapEvents"][0]["name"], "api");

        let back: Snapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn status_counts_and_latest_sample() {
        let mut snap = Snapshot::empty();
        snap.series.insert("a".to_string(), vec![1, 1]);
        snap.series.insert("b".to_string(), vec![1, 0]);
        snap.status.insert("a".to_string(), StatusColor::Green);
        snap.status.insert("b".to_string(), StatusColor::Yellow);

        let counts = snap.status_counts();
        assert_eq!(counts, StatusCounts { green: 1, yellow: 1, red: 0 });
        assert_eq!(snap.latest_sample("a"), Some(true));
        assert_eq!(snap.latest_sample("b"), Some(false));
        assert_eq!(snap.latest_sample("missing"), None);
    }
}
