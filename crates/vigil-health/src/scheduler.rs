//! Cycle fan-out: one probe per endpoint, bounded parallelism.

use std::sync::Arc;

use chrono::FixedOffset;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use vigil_core::{EndpointRegistry, MonitorSettings};

use crate::checker::{OutcomeMap, Probe, ProbeOutcome};
use crate::clock::{Clock, format_timestamp};

/// The raw result of one cycle, before it is folded into history.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    /// Timestamp shared by every endpoint in the cycle.
    pub timestamp: String,
    pub outcomes: OutcomeMap,
}

/// Probes the whole registry once per tick.
///
/// At most `max_concurrency` probes are in flight; the rest wait for a
/// permit. A tick returns only after every probe has finished or timed
/// out.
pub struct Scheduler {
    registry: Arc<EndpointRegistry>,
    prober: Arc<dyn Probe>,
    clock: Arc<dyn Clock>,
    permits: Arc<Semaphore>,
    max_concurrency: usize,
    utc_offset: FixedOffset,
    time_format: String,
}

impl Scheduler {
    pub fn new(
        registry: Arc<EndpointRegistry>,
        prober: Arc<dyn Probe>,
        clock: Arc<dyn Clock>,
        settings: &MonitorSettings,
    ) -> Self {
        let max_concurrency = settings.max_concurrency.max(1);
        Self {
            registry,
            prober,
            clock,
            permits: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
            utc_offset: settings.utc_offset,
            time_format: settings.time_format.clone(),
        }
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Run one cycle: capture the timestamp, then probe every endpoint.
    pub async fn tick(&self) -> CycleOutcome {
        let timestamp = format_timestamp(self.clock.now(), self.utc_offset, &self.time_format);
        let outcomes = self.probe_all().await;
        CycleOutcome {
            timestamp,
            outcomes,
        }
    }

    /// Probe every registered endpoint and collect the outcomes.
    ///
    /// A probe task that panics is logged and left out of the map.
    pub async fn probe_all(&self) -> OutcomeMap {
        let mut tasks = JoinSet::new();

        for endpoint in self.registry.iter() {
            let prober = Arc::clone(&self.prober);
            let permits = Arc::clone(&self.permits);
            let name = endpoint.name.clone();
            let url = endpoint.url.clone();

            tasks.spawn(async move {
                let outcome = match permits.acquire_owned().await {
                    Ok(_permit) => prober.probe(&url).await,
                    // The semaphore is never closed.
                    Err(_) => ProbeOutcome::Unreachable,
                };
                debug!(endpoint = %name, ?outcome, "probe finished");
                (name, outcome)
            });
        }

        let mut outcomes = OutcomeMap::with_capacity(self.registry.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((name, outcome)) => {
                    outcomes.insert(name, outcome);
                }
                Err(e) => warn!(error = %e, "probe task failed"),
            }
        }

        outcomes
    }
}
