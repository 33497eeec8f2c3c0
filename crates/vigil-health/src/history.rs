//! Rolling per-endpoint history and the state derived from it.
//!
//! The `HistoryStore` is the single owner of every mutable buffer: one
//! sample ring per endpoint, a shared ring of cycle timestamps, and the
//! per-endpoint downtime counters. Each call to [`HistoryStore::update`]
//! is one discrete time step and returns a fresh [`Snapshot`] built from
//! copies, never from references into the live buffers.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use tracing::{debug, info, warn};

use vigil_core::{
    EndpointRegistry, FlapEvent, MonitorSettings, OutageEvent, Snapshot, StatusColor,
};

use crate::checker::OutcomeMap;
use crate::ring::RingBuffer;

/// Mutable state for one endpoint.
#[derive(Debug)]
struct EndpointHistory {
    samples: RingBuffer<bool>,
    /// Contiguous down-seconds; zero while up.
    downtime_secs: u64,
    /// Whether the latest sample differs from the one before it.
    oscillating: bool,
}

impl EndpointHistory {
    fn new(capacity: usize) -> Self {
        Self {
            samples: RingBuffer::new(capacity),
            downtime_secs: 0,
            oscillating: false,
        }
    }
}

/// Owns the rolling windows and derives status, flaps and outages.
#[derive(Debug)]
pub struct HistoryStore {
    /// Endpoint names in registry order.
    order: Vec<String>,
    endpoints: HashMap<String, EndpointHistory>,
    timestamps: RingBuffer<String>,
    period: Duration,
    outage_threshold: Duration,
}

impl HistoryStore {
    /// Create a store for the given endpoint names.
    ///
    /// `period` is added to an endpoint's downtime for every down cycle;
    /// outage events are emitted once downtime reaches `outage_threshold`.
    pub fn new<I, S>(names: I, capacity: usize, period: Duration, outage_threshold: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let order: Vec<String> = names.into_iter().map(Into::into).collect();
        let endpoints = order
            .iter()
            .map(|name| (name.clone(), EndpointHistory::new(capacity)))
            .collect();
        Self {
            order,
            endpoints,
            timestamps: RingBuffer::new(capacity),
            period,
            outage_threshold,
        }
    }

    pub fn from_settings(registry: &EndpointRegistry, settings: &MonitorSettings) -> Self {
        Self::new(
            registry.names(),
            settings.history_len,
            settings.interval,
            settings.outage_threshold,
        )
    }

    /// Record one cycle and return the resulting snapshot.
    ///
    /// Every registered endpoint gains exactly one sample and the shared
    /// time index gains exactly one timestamp, so all buffers stay the
    /// same length. An endpoint missing from `outcomes` is recorded as
    /// down; names not in the store are ignored.
    ///
    /// Outcomes are resolved before any buffer is touched, and the
    /// timestamp is pushed last, once every endpoint has its sample.
    pub fn update(&mut self, timestamp: &str, outcomes: &OutcomeMap) -> Snapshot {
        for name in outcomes.keys() {
            if !self.endpoints.contains_key(name) {
                warn!(endpoint = %name, "ignoring outcome for unregistered endpoint");
            }
        }

        let resolved: Vec<bool> = self
            .order
            .iter()
            .map(|name| match outcomes.get(name) {
                Some(outcome) => outcome.is_up(),
                None => {
                    warn!(endpoint = %name, "no probe outcome this cycle; counting as down");
                    false
                }
            })
            .collect();

        let period_secs = self.period.as_secs();
        let mut outage_events = Vec::new();
        let mut flap_events = Vec::new();

        for (name, up) in self.order.iter().zip(resolved) {
            let Some(history) = self.endpoints.get_mut(name) else {
                continue;
            };

            let previous = history.samples.last().copied();
            history.samples.push(up);
            history.oscillating = previous.is_some_and(|prev| prev != up);

            let was_in_outage = Duration::from_secs(history.downtime_secs) >= self.outage_threshold;
            let downtime_before = history.downtime_secs;
            history.downtime_secs = if up {
                0
            } else {
                history.downtime_secs.saturating_add(period_secs)
            };

            if history.oscillating {
                if up {
                    info!(endpoint = %name, downtime_secs = downtime_before, "endpoint recovered");
                } else {
                    warn!(endpoint = %name, "endpoint went down");
                }
                flap_events.push(FlapEvent {
                    time: timestamp.to_string(),
                    name: name.clone(),
                });
            }

            if Duration::from_secs(history.downtime_secs) >= self.outage_threshold {
                if !was_in_outage {
                    warn!(
                        endpoint = %name,
                        downtime_secs = history.downtime_secs,
                        "endpoint outage threshold reached"
                    );
                }
                outage_events.push(OutageEvent {
                    time: timestamp.to_string(),
                    name: name.clone(),
                    downtime_seconds: history.downtime_secs,
                });
            }
        }

        self.timestamps.push(timestamp.to_string());

        let mut series = BTreeMap::new();
        let mut status = BTreeMap::new();
        for name in &self.order {
            if let Some(history) = self.endpoints.get(name) {
                let samples = history.samples.to_vec();
                status.insert(name.clone(), StatusColor::classify(&samples));
                series.insert(name.clone(), samples.into_iter().map(u8::from).collect::<Vec<u8>>());
            }
        }

        debug!(
            %timestamp,
            endpoints = self.order.len(),
            outages = outage_events.len(),
            flaps = flap_events.len(),
            "history updated"
        );

        Snapshot {
            timestamps: self.timestamps.to_vec(),
            series,
            status,
            outage_events,
            flap_events,
        }
    }

    /// Number of cycles currently held in the time index.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.timestamps.capacity()
    }

    pub fn downtime_secs(&self, name: &str) -> Option<u64> {
        self.endpoints.get(name).map(|h| h.downtime_secs)
    }

    pub fn is_oscillating(&self, name: &str) -> Option<bool> {
        self.endpoints.get(name).map(|h| h.oscillating)
    }

    /// Copy of an endpoint's samples, oldest first.
    pub fn samples(&self, name: &str) -> Option<Vec<bool>> {
        self.endpoints.get(name).map(|h| h.samples.to_vec())
    }

    pub fn sample_len(&self, name: &str) -> Option<usize> {
        self.endpoints.get(name).map(|h| h.samples.len())
    }
}
