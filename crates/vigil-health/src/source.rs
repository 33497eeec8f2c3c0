//! The read/start interface handed to hosting layers.
//!
//! A host picks its implementation explicitly at startup: the live
//! [`Monitor`], or [`NullMonitorSource`] when monitoring is disabled.

use std::sync::Arc;

use vigil_core::Snapshot;

use crate::monitor::Monitor;

pub trait MonitorSource: Send + Sync {
    /// Latest snapshot. Never fails; empty until the first cycle.
    fn latest_snapshot(&self) -> Snapshot;

    /// Start background monitoring if it is not already running.
    /// Returns `true` if this call started it.
    fn ensure_started(&self) -> bool;
}

pub type SharedSource = Arc<dyn MonitorSource>;

impl MonitorSource for Monitor {
    fn latest_snapshot(&self) -> Snapshot {
        Monitor::latest_snapshot(self)
    }

    fn ensure_started(&self) -> bool {
        Monitor::ensure_started(self)
    }
}

/// Source that never starts and always serves the empty snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMonitorSource;

impl MonitorSource for NullMonitorSource {
    fn latest_snapshot(&self) -> Snapshot {
        Snapshot::empty()
    }

    fn ensure_started(&self) -> bool {
        false
    }
}
