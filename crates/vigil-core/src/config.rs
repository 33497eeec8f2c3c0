//! vigil.toml configuration parser.

use std::path::Path;
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use crate::duration::parse_duration;
use crate::error::{ConfigError, ConfigResult};
use crate::registry::{Endpoint, EndpointRegistry};

pub const DEFAULT_INTERVAL: &str = "5s";
pub const DEFAULT_TIMEOUT: &str = "4s";
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;
pub const DEFAULT_HISTORY_LEN: usize = 100;
pub const DEFAULT_OUTAGE_THRESHOLD: &str = "5s";
/// Cuiabá time. A fixed offset rather than a zone: Mato Grosso has not
/// observed daylight saving since 2019, so `America/Cuiaba` is UTC-4 all
/// year. A fleet in a zone with DST needs its offset changed by hand.
pub const DEFAULT_UTC_OFFSET: &str = "-04:00";
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S";

/// Upper bound for `interval`, `timeout` and `outage_threshold`.
pub const MAX_DURATION: Duration = Duration::from_secs(24 * 3600);
pub const MAX_CONCURRENCY: usize = 1024;
pub const MAX_HISTORY_LEN: usize = 100_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VigilConfig {
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default, rename = "endpoint")]
    pub endpoints: Vec<EndpointConfig>,
}

/// The `[monitor]` table, as written in the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub interval: String,
    pub timeout: String,
    pub max_concurrency: usize,
    pub history_len: usize,
    pub outage_threshold: String,
    pub utc_offset: String,
    pub time_format: String,
    pub user_agent: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL.to_string(),
            timeout: DEFAULT_TIMEOUT.to_string(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            history_len: DEFAULT_HISTORY_LEN,
            outage_threshold: DEFAULT_OUTAGE_THRESHOLD.to_string(),
            utc_offset: DEFAULT_UTC_OFFSET.to_string(),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            user_agent: concat!("vigil/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub name: String,
    pub url: String,
}

/// Validated monitor parameters.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Cycle period. Whole seconds, since downtime is counted in seconds.
    pub interval: Duration,
    /// Per-probe timeout.
    pub timeout: Duration,
    /// Maximum probes in flight within one cycle.
    pub max_concurrency: usize,
    /// Capacity of every rolling buffer.
    pub history_len: usize,
    /// Downtime at which outage events start being emitted.
    pub outage_threshold: Duration,
    /// Offset applied to cycle timestamps. Fixed, so it does not follow
    /// daylight saving transitions.
    pub utc_offset: FixedOffset,
    pub time_format: String,
    pub user_agent: String,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(4),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            history_len: DEFAULT_HISTORY_LEN,
            outage_threshold: Duration::from_secs(5),
            utc_offset: FixedOffset::west_opt(4 * 3600).unwrap_or(utc()),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            user_agent: MonitorConfig::default().user_agent,
        }
    }
}

impl VigilConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Check every section, returning the first problem found.
    pub fn validate(&self) -> ConfigResult<()> {
        self.settings()?;
        self.registry()?;
        Ok(())
    }

    /// Build the immutable endpoint registry.
    pub fn registry(&self) -> ConfigResult<EndpointRegistry> {
        if self.endpoints.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one [[endpoint]] is required".to_string(),
            ));
        }
        let endpoints = self
            .endpoints
            .iter()
            .map(|e| Endpoint::new(&e.name, &e.url))
            .collect();
        EndpointRegistry::new(endpoints)
    }

    /// Resolve the `[monitor]` table into typed settings.
    pub fn settings(&self) -> ConfigResult<MonitorSettings> {
        let m = &self.monitor;

        let interval = duration_field("interval", &m.interval)?;
        if interval.subsec_nanos() != 0 {
            return Err(ConfigError::Invalid(format!(
                "interval must be a whole number of seconds, got {}",
                m.interval
            )));
        }
        let timeout = duration_field("timeout", &m.timeout)?;
        let outage_threshold = duration_field("outage_threshold", &m.outage_threshold)?;

        if !(1..=MAX_CONCURRENCY).contains(&m.max_concurrency) {
            return Err(ConfigError::Invalid(format!(
                "max_concurrency must be between 1 and {MAX_CONCURRENCY}, got {}",
                m.max_concurrency
            )));
        }
        if !(1..=MAX_HISTORY_LEN).contains(&m.history_len) {
            return Err(ConfigError::Invalid(format!(
                "history_len must be between 1 and {MAX_HISTORY_LEN}, got {}",
                m.history_len
            )));
        }

        let utc_offset = parse_utc_offset(&m.utc_offset).ok_or_else(|| {
            ConfigError::Invalid(format!("utc_offset must look like -04:00, got {}", m.utc_offset))
        })?;

        if m.time_format.is_empty()
            || StrftimeItems::new(&m.time_format).any(|item| matches!(item, Item::Error))
        {
            return Err(ConfigError::Invalid(format!(
                "time_format is not a valid strftime pattern: {}",
                m.time_format
            )));
        }

        Ok(MonitorSettings {
            interval,
            timeout,
            max_concurrency: m.max_concurrency,
            history_len: m.history_len,
            outage_threshold,
            utc_offset,
            time_format: m.time_format.clone(),
            user_agent: m.user_agent.clone(),
        })
    }
}

/// Parse a duration that must be non-zero and at most [`MAX_DURATION`].
fn duration_field(field: &'static str, value: &str) -> ConfigResult<Duration> {
    let duration = parse_duration(value).ok_or_else(|| ConfigError::InvalidDuration {
        field,
        value: value.to_string(),
    })?;
    if duration.is_zero() || duration > MAX_DURATION {
        return Err(ConfigError::Invalid(format!(
            "{field} must be > 0 and at most {}s, got {value}",
            MAX_DURATION.as_secs()
        )));
    }
    Ok(duration)
}

fn utc() -> FixedOffset {
    Utc.fix()
}

/// Parse "+HH:MM", "-HH:MM", "+HHMM" or "Z".
fn parse_utc_offset(s: &str) -> Option<FixedOffset> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return Some(utc());
    }
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 && rest.is_ascii() => rest.split_at(2),
        None => return None,
    };
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
