//! The background loop that drives cycles and publishes snapshots.
//!
//! A `Monitor` owns the scheduler, the history store and the publisher.
//! It is a cheap `Clone` handle; every clone drives and reads the same
//! state. The loop is started at most once, however many times
//! [`Monitor::ensure_started`] is called.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use vigil_core::{EndpointRegistry, MonitorSettings, Snapshot, VigilConfig};

use crate::checker::{HttpProber, Probe};
use crate::clock::{Clock, SystemClock};
use crate::error::{CycleError, HealthResult};
use crate::history::HistoryStore;
use crate::publisher::SnapshotPublisher;
use crate::scheduler::Scheduler;

struct MonitorInner {
    scheduler: Scheduler,
    /// Held for a whole cycle, which keeps cycles strictly sequential.
    store: tokio::sync::Mutex<HistoryStore>,
    publisher: SnapshotPublisher,
    interval: Duration,
    /// `Some` once the loop has been spawned.
    background: Mutex<Option<JoinHandle<()>>>,
}

/// Handle to the health engine.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<MonitorInner>,
}

impl Monitor {
    /// Build a monitor that probes over HTTP using wall-clock time.
    pub fn new(registry: EndpointRegistry, settings: &MonitorSettings) -> HealthResult<Self> {
        let prober = HttpProber::new(settings)?;
        Ok(Self::with_parts(
            registry,
            settings,
            Arc::new(prober),
            Arc::new(SystemClock),
        ))
    }

    pub fn from_config(config: &VigilConfig) -> HealthResult<Self> {
        let settings = config.settings()?;
        let registry = config.registry()?;
        Self::new(registry, &settings)
    }

    /// Build a monitor from explicit parts.
    pub fn with_parts(
        registry: EndpointRegistry,
        settings: &MonitorSettings,
        prober: Arc<dyn Probe>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = HistoryStore::from_settings(&registry, settings);
        let scheduler = Scheduler::new(Arc::new(registry), prober, clock, settings);
        Self {
            inner: Arc::new(MonitorInner {
                scheduler,
                store: tokio::sync::Mutex::new(store),
                publisher: SnapshotPublisher::new(),
                interval: settings.interval,
                background: Mutex::new(None),
            }),
        }
    }

    pub fn registry(&self) -> &EndpointRegistry {
        self.inner.scheduler.registry()
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Spawn the background loop unless it is already running.
    ///
    /// Returns `true` only for the call that spawned it. Must be called
    /// from within a Tokio runtime; outside one it logs and returns
    /// `false` without marking the loop as started.
    pub fn ensure_started(&self) -> bool {
        let mut background = self.inner.background.lock();
        if background.is_some() {
            return false;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                error!(error = %e, "cannot start monitor loop outside a tokio runtime");
                return false;
            }
        };

        let monitor = self.clone();
        *background = Some(runtime.spawn(async move { monitor.run_loop().await }));

        info!(
            endpoints = self.registry().len(),
            interval_secs = self.inner.interval.as_secs(),
            max_concurrency = self.inner.scheduler.max_concurrency(),
            "monitor loop started"
        );
        true
    }

    pub fn is_started(&self) -> bool {
        self.inner.background.lock().is_some()
    }

    /// Run one full cycle: probe, fold into history, publish.
    pub async fn run_cycle(&self) -> Snapshot {
        let mut store = self.inner.store.lock().await;
        let cycle = self.inner.scheduler.tick().await;
        let snapshot = store.update(&cycle.timestamp, &cycle.outcomes);
        drop(store);

        self.inner.publisher.publish(snapshot.clone());
        snapshot
    }

    /// Run one cycle, turning a panic into a [`CycleError`].
    ///
    /// On error nothing is published, so the previous snapshot stays
    /// current.
    pub async fn try_cycle(&self) -> Result<Snapshot, CycleError> {
        AssertUnwindSafe(self.run_cycle())
            .catch_unwind()
            .await
            .map_err(|payload| CycleError::Panicked(panic_message(payload.as_ref())))
    }

    /// Cycle, sleep, repeat. A failed cycle is logged and skipped.
    async fn run_loop(self) {
        loop {
            match self.try_cycle().await {
                Ok(snapshot) => {
                    let counts = snapshot.status_counts();
                    debug!(
                        timestamp = snapshot.latest_timestamp().unwrap_or_default(),
                        up = counts.green,
                        flapping = counts.yellow,
                        down = counts.red,
                        outages = snapshot.outage_events.len(),
                        "cycle complete"
                    );
                }
                Err(e) => error!(error = %e, "monitor cycle failed; keeping previous snapshot"),
            }
            tokio::time::sleep(self.inner.interval).await;
        }
    }

    /// Copy of the latest published snapshot, or the empty snapshot.
    pub fn latest_snapshot(&self) -> Snapshot {
        self.inner.publisher.get_latest()
    }

    /// Shared handle to the latest snapshot, without copying it.
    pub fn latest_shared(&self) -> Arc<Snapshot> {
        self.inner.publisher.latest_shared()
    }

    /// Time since the last publication, `None` before the first one.
    pub fn staleness(&self) -> Option<Duration> {
        self.inner.publisher.staleness()
    }

    pub fn cycles_published(&self) -> u64 {
        self.inner.publisher.published_count()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
