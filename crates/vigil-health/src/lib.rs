//! vigil-health — the background health-check engine.
//!
//! Probes a fixed fleet of HTTP endpoints on a fixed period, keeps a
//! bounded rolling history per endpoint, derives status colors, flaps and
//! outages, and publishes an immutable snapshot after every cycle.
//!
//! # Architecture
//!
//! ```text
//! Monitor (background loop, started once)
//!   ├── Scheduler::tick()
//!   │   ├── capture one timestamp for the cycle
//!   │   └── Probe × N, at most max_concurrency in flight → OutcomeMap
//!   ├── HistoryStore::update() → Snapshot
//!   │   ├── ring buffers (samples, timestamps), FIFO eviction
//!   │   ├── downtime counters, oscillation flags
//!   │   └── status colors, outage + flap events
//!   └── SnapshotPublisher::publish()
//!
//! Readers
//!   └── MonitorSource::latest_snapshot() → copy of the latest Snapshot
//! ```
//!
//! # Failure handling
//!
//! Probes never fail: errors and timeouts count as down. A cycle that
//! panics is logged and skipped, and the previous snapshot stays
//! published. The loop itself never exits.

pub mod checker;
pub mod clock;
pub mod error;
pub mod history;
pub mod monitor;
pub mod publisher;
pub mod report;
pub mod ring;
pub mod scheduler;
pub mod source;

pub use checker::{HttpProber, OutcomeMap, Probe, ProbeOutcome};
pub use clock::{Clock, SteppingClock, SystemClock};
pub use error::{CycleError, HealthError, HealthResult};
pub use history::HistoryStore;
pub use monitor::Monitor;
pub use publisher::SnapshotPublisher;
pub use report::ReportSummary;
pub use ring::RingBuffer;
pub use scheduler::{CycleOutcome, Scheduler};
pub use source::{MonitorSource, NullMonitorSource, SharedSource};
