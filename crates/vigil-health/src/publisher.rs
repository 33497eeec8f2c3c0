//! Atomic publication of the latest snapshot.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use tokio::time::Instant;

use vigil_core::Snapshot;

struct Published {
    snapshot: Arc<Snapshot>,
    at: Option<Instant>,
}

/// Holds the process-wide "latest" snapshot.
///
/// Writers swap an `Arc` under a write lock held only for the swap, so a
/// reader sees either the old or the new snapshot in full. The lock does
/// not poison, so reads cannot fail.
pub struct SnapshotPublisher {
    latest: RwLock<Published>,
    count: AtomicU64,
}

impl Default for SnapshotPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotPublisher {
    /// A publisher serving the empty snapshot.
    pub fn new() -> Self {
        Self {
            latest: RwLock::new(Published {
                snapshot: Arc::new(Snapshot::empty()),
                at: None,
            }),
            count: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, snapshot: Snapshot) {
        let next = Published {
            snapshot: Arc::new(snapshot),
            at: Some(Instant::now()),
        };
        let previous = std::mem::replace(&mut *self.latest.write(), next);
        self.count.fetch_add(1, Ordering::Relaxed);
        // The old snapshot is dropped outside the lock.
        drop(previous);
    }

    /// Copy of the latest snapshot, or the empty snapshot before the
    /// first publication.
    pub fn get_latest(&self) -> Snapshot {
        Snapshot::clone(&self.latest_shared())
    }

    /// Shared handle to the latest snapshot, without copying it.
    pub fn latest_shared(&self) -> Arc<Snapshot> {
        Arc::clone(&self.latest.read().snapshot)
    }

    /// Time since the last publication.
    pub fn staleness(&self) -> Option<Duration> {
        self.latest.read().at.map(|at| at.elapsed())
    }

    pub fn published_count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::StatusColor;

    fn snapshot_with(timestamps: &[&str]) -> Snapshot {
        let mut snap = Snapshot::empty();
        snap.timestamps = timestamps.iter().map(|t| t.to_string()).collect();
        snap.series.insert("a".to_string(), vec![1; timestamps.len()]);
        snap.status.insert("a".to_string(), StatusColor::Green);
        snap
    }

    #[test]
    fn empty_before_first_publish() {
        let publisher = SnapshotPublisher::new();
        let latest = publisher.get_latest();
        assert!(latest.is_empty());
        assert!(latest.series.is_empty());
        assert!(latest.status.is_empty());
        assert!(latest.outage_events.is_empty());
        assert!(latest.flap_events.is_empty());
        assert_eq!(publisher.staleness(), None);
        assert_eq!(publisher.published_count(), 0);
    }

    #[test]
    fn publish_replaces_latest() {
        let publisher = SnapshotPublisher::new();
        publisher.publish(snapshot_with(&["t1"]));
        publisher.publish(snapshot_with(&["t1", "t2"]));

        let latest = publisher.get_latest();
        assert_eq!(latest.latest_timestamp(), Some("t2"));
        assert_eq!(publisher.published_count(), 2);
        assert!(publisher.staleness().is_some());
    }

    #[test]
    fn readers_hold_independent_copies() {
        let publisher = SnapshotPublisher::new();
        publisher.publish(snapshot_with(&["t1"]));

        let mut copy = publisher.get_latest();
        copy.timestamps.clear();

        assert_eq!(publisher.get_latest().timestamps, vec!["t1".to_string()]);
    }

    #[test]
    fn concurrent_readers_never_see_a_mix() {
        let publisher = Arc::new(SnapshotPublisher::new());

        let writer = {
            let publisher = Arc::clone(&publisher);
            std::thread::spawn(move || {
                for n in 1..=200 {
                    let stamps: Vec<String> = (0..n).map(|i| format!("t{i}")).collect();
                    let refs: Vec<&str> = stamps.iter().map(String::as_str).collect();
                    publisher.publish(snapshot_with(&refs));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let publisher = Arc::clone(&publisher);
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        let snap = publisher.get_latest();
                        let len = snap.timestamps.len();
                        let series_len = snap.series.get("a").map_or(0, Vec::len);
                        assert_eq!(len, series_len);
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(publisher.get_latest().timestamps.len(), 200);
    }
}
