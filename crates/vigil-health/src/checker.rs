//! Reachability probes.
//!
//! A probe never fails: transport errors, timeouts and any status other than 200
//! all collapse into a down [`ProbeOutcome`]. There is no retry; the next
//! cycle is the retry.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::debug;

use vigil_core::MonitorSettings;

use crate::error::{HealthError, HealthResult};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outcome of every probe in one cycle: endpoint name → outcome.
pub type OutcomeMap = HashMap<String, ProbeOutcome>;

/// Result of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The target answered 200 OK.
    Up,
    /// The target answered with any other status.
    Down,
    /// No response: connection error or timeout.
    Unreachable,
}

impl ProbeOutcome {
    pub fn is_up(self) -> bool {
        self == ProbeOutcome::Up
    }
}

impl From<bool> for ProbeOutcome {
    fn from(up: bool) -> Self {
        if up { ProbeOutcome::Up } else { ProbeOutcome::Down }
    }
}

/// Something that can check one target.
///
/// Implementations must be total: every call resolves to an outcome.
pub trait Probe: Send + Sync {
    fn probe<'a>(&'a self, target: &'a str) -> BoxFuture<'a, ProbeOutcome>;
}

/// HTTP GET prober backed by one pooled client.
///
/// The client is shared by every probe in a cycle and keeps idle
/// connections between cycles.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(settings: &MonitorSettings) -> HealthResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .connect_timeout(settings.timeout)
            .pool_max_idle_per_host(settings.max_concurrency)
            .pool_idle_timeout(settings.interval.saturating_mul(6))
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(HealthError::Client)?;
        Ok(Self::with_client(client, settings.timeout))
    }

    /// Wrap an existing client. `timeout` bounds the whole probe,
    /// including reading the body.
    pub fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Perform one GET against `url`.
    pub async fn check(&self, url: &str) -> ProbeOutcome {
        let result = tokio::time::timeout(self.timeout, async {
            let resp = match self.client.get(url).send().await {
                Ok(resp) => resp,
                Err(e) => {
                    debug!(error = %e, %url, "probe request failed");
                    return ProbeOutcome::Unreachable;
                }
            };

            let status = resp.status();
            // Drain the body so the connection goes back to the pool.
            if let Err(e) = resp.bytes().await {
                debug!(error = %e, %url, "probe body read failed");
            }

            if status == reqwest::StatusCode::OK {
                ProbeOutcome::Up
            } else {
                debug!(%status, %url, "probe answered non-200");
                ProbeOutcome::Down
            }
        })
        .await;

        match result {
            Ok(outcome) => outcome,
            Err(_) => {
                debug!(%url, timeout_ms = self.timeout.as_millis() as u64, "probe timed out");
                ProbeOutcome::Unreachable
            }
        }
    }
}

impl Probe for HttpProber {
    fn probe<'a>(&'a self, target: &'a str) -> BoxFuture<'a, ProbeOutcome> {
        Box::pin(self.check(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn prober(timeout: Duration) -> HttpProber {
        let settings = MonitorSettings {
            timeout,
            ..MonitorSettings::default()
        };
        HttpProber::new(&settings).unwrap()
    }

    #[tokio::test]
    async fn ok_response_is_up() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let outcome = prober(Duration::from_secs(2)).check(&format!("{}/", server.uri())).await;
        assert_eq!(outcome, ProbeOutcome::Up);
    }

    #[test]
    fn client_builds_with_huge_interval() {
        let settings = MonitorSettings {
            interval: Duration::from_secs(u64::MAX / 2),
            ..MonitorSettings::default()
        };
        assert!(HttpProber::new(&settings).is_ok());
    }

    #[tokio::test]
    async fn no_content_is_down() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let outcome = prober(Duration::from_secs(2)).check(&server.uri()).await;
        assert_eq!(outcome, ProbeOutcome::Down);
    }

    #[tokio::test]
    async fn server_error_is_down() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let outcome = prober(Duration::from_secs(2)).check(&server.uri()).await;
        assert_eq!(outcome, ProbeOutcome::Down);
        assert!(!outcome.is_up());
    }

    #[tokio::test]
    async fn not_found_is_down() {
        let server = MockServer::start().await;

        // No mocks mounted: wiremock answers 404.
        let outcome = prober(Duration::from_secs(2)).check(&server.uri()).await;
        assert_eq!(outcome, ProbeOutcome::Down);
    }

    #[tokio::test]
    async fn slow_response_is_unreachable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let outcome = prober(Duration::from_millis(200)).check(&server.uri()).await;
        assert_eq!(outcome, ProbeOutcome::Unreachable);
    }

    #[tokio::test]
    async fn closed_port_is_unreachable() {
        // Port 1 won't be listening.
        let outcome = prober(Duration::from_millis(500)).check("http://127.0.0.1:1/").await;
        assert_eq!(outcome, ProbeOutcome::Unreachable);
    }

    #[tokio::test]
    async fn probe_trait_delegates_to_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let prober: Box<dyn Probe> = Box::new(prober(Duration::from_secs(2)));
        let uri = server.uri();
        assert_eq!(prober.probe(&uri).await, ProbeOutcome::Up);
    }

    #[test]
    fn outcome_from_bool() {
        assert_eq!(ProbeOutcome::from(true), ProbeOutcome::Up);
        assert_eq!(ProbeOutcome::from(false), ProbeOutcome::Down);
        assert!(!ProbeOutcome::Unreachable.is_up());
    }
}
