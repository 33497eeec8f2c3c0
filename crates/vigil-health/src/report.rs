//! Outage/flap report data derived from a snapshot.
//!
//! This is the data a report renderer lays out: headline counts, the
//! endpoints with the most outages, and the event tables sorted by time.

use std::collections::HashSet;
use std::fmt;

use vigil_core::{FlapEvent, OutageEvent, Snapshot};

/// How many endpoints the "most outages" table lists.
pub const TOP_OUTAGES: usize = 5;

/// One row of the "most outages" table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutageTally {
    pub name: String,
    pub outages: usize,
    /// Sum of `downtime_seconds` across this endpoint's outage events.
    pub downtime_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub total_events: usize,
    pub total_outages: usize,
    pub total_flaps: usize,
    /// Distinct endpoints appearing in any event.
    pub affected_endpoints: usize,
    /// Up to [`TOP_OUTAGES`] endpoints by descending outage count.
    pub top_outages: Vec<OutageTally>,
    /// Outage events sorted by time, then name.
    pub outages: Vec<OutageEvent>,
    /// Flap events sorted by time, then name.
    pub flaps: Vec<FlapEvent>,
}

impl ReportSummary {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let affected: HashSet<&str> = snapshot
            .outage_events
            .iter()
            .map(|e| e.name.as_str())
            .chain(snapshot.flap_events.iter().map(|e| e.name.as_str()))
            .collect();

        // First-seen order is kept for ties by the stable sort below.
        let mut tallies: Vec<OutageTally> = Vec::new();
        for event in &snapshot.outage_events {
            match tallies.iter_mut().find(|t| t.name == event.name) {
                Some(tally) => {
                    tally.outages += 1;
                    tally.downtime_seconds += event.downtime_seconds;
                }
                None => tallies.push(OutageTally {
                    name: event.name.clone(),
                    outages: 1,
                    downtime_seconds: event.downtime_seconds,
                }),
            }
        }
        tallies.sort_by(|a, b| b.outages.cmp(&a.outages));
        tallies.truncate(TOP_OUTAGES);

        let mut outages = snapshot.outage_events.clone();
        outages.sort_by(|a, b| (&a.time, &a.name).cmp(&(&b.time, &b.name)));
        let mut flaps = snapshot.flap_events.clone();
        flaps.sort_by(|a, b| (&a.time, &a.name).cmp(&(&b.time, &b.name)));

        Self {
            total_events: outages.len() + flaps.len(),
            total_outages: outages.len(),
            total_flaps: flaps.len(),
            affected_endpoints: affected.len(),
            top_outages: tallies,
            outages,
            flaps,
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.total_events == 0
    }
}

impl fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "events: {}  outages: {}  flaps: {}  affected endpoints: {}",
            self.total_events, self.total_outages, self.total_flaps, self.affected_endpoints
        )?;

        writeln!(f)?;
        writeln!(f, "Top {TOP_OUTAGES} endpoints by outages")?;
        writeln!(f, "{:<40} {:>8} {:>14}", "ENDPOINT", "OUTAGES", "DOWNTIME (s)")?;
        if self.top_outages.is_empty() {
            writeln!(f, "{:<40} {:>8} {:>14}", "-", 0, 0)?;
        }
        for tally in &self.top_outages {
            writeln!(
                f,
                "{:<40} {:>8} {:>14}",
                tally.name, tally.outages, tally.downtime_seconds
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Outages")?;
        if self.outages.is_empty() {
            writeln!(f, "  no outages recorded")?;
        }
        for event in &self.outages {
            writeln!(
                f,
                "  {:<20} {:<40} {:>6} s",
                event.time, event.name, event.downtime_seconds
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Flaps")?;
        if self.flaps.is_empty() {
            writeln!(f, "  no flaps recorded")?;
        }
        for event in &self.flaps {
            writeln!(f, "  {:<20} {}", event.time, event.name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outage(time: &str, name: &str, secs: u64) -> OutageEvent {
        OutageEvent {
            time: time.to_string(),
            name: name.to_string(),
            downtime_seconds: secs,
        }
    }

    fn flap(time: &str, name: &str) -> FlapEvent {
        FlapEvent {
            time: time.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn empty_snapshot_is_quiet() {
        let summary = ReportSummary::from_snapshot(&Snapshot::empty());
        assert!(summary.is_quiet());
        assert_eq!(summary.affected_endpoints, 0);
        assert!(summary.top_outages.is_empty());

        let text = summary.to_string();
        assert!(text.contains("no outages recorded"));
        assert!(text.contains("no flaps recorded"));
    }

    #[test]
    fn counts_and_affected_endpoints() {
        let mut snap = Snapshot::empty();
        snap.outage_events = vec![outage("10:00:10", "b", 5), outage("10:00:10", "a", 10)];
        snap.flap_events = vec![flap("10:00:10", "c"), flap("10:00:10", "b")];

        let summary = ReportSummary::from_snapshot(&snap);
        assert_eq!(summary.total_events, 4);
        assert_eq!(summary.total_outages, 2);
        assert_eq!(summary.total_flaps, 2);
        assert_eq!(summary.affected_endpoints, 3);
    }

    #[test]
    fn events_sorted_by_time_then_name() {
        let mut snap = Snapshot::empty();
        snap.outage_events = vec![
            outage("10:00:15", "a", 10),
            outage("10:00:10", "b", 5),
            outage("10:00:10", "a", 5),
        ];

        let summary = ReportSummary::from_snapshot(&snap);
        let order: Vec<(&str, &str)> = summary
            .outages
            .iter()
            .map(|e| (e.time.as_str(), e.name.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![("10:00:10", "a"), ("10:00:10", "b"), ("10:00:15", "a")]
        );
    }

    #[test]
    fn top_outages_ranked_and_capped() {
        let mut snap = Snapshot::empty();
        for (name, count) in [("a", 1), ("b", 3), ("c", 2), ("d", 1), ("e", 1), ("f", 4)] {
            for i in 0..count {
                snap.outage_events.push(outage("t", name, 5 * (i + 1)));
            }
        }

        let summary = ReportSummary::from_snapshot(&snap);
        let names: Vec<&str> = summary.top_outages.iter().map(|t| t.name.as_str()).collect();
        // Ties (a, d, e) keep first-seen order; the fifth slot goes to a.
        assert_eq!(names, vec!["f", "b", "c", "a", "d"]);
        assert_eq!(summary.top_outages[0].outages, 4);
        assert_eq!(summary.top_outages[0].downtime_seconds, 5 + 10 + 15 + 20);
    }

    #[test]
    fn display_lists_rows() {
        let mut snap = Snapshot::empty();
        snap.outage_events = vec![outage("10:00:10", "Confresa", 15)];
        snap.flap_events = vec![flap("10:00:00", "Vila Bela")];

        let text = ReportSummary::from_snapshot(&snap).to_string();
        assert!(text.contains("events: 2"));
        assert!(text.contains("Confresa"));
        assert!(text.contains("15 s"));
        assert!(text.contains("Vila Bela"));
    }
}
