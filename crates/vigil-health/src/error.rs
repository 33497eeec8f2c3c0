//! Health engine error types.
//!
//! Probe failures are not errors: they become a down [`ProbeOutcome`].
//! Only startup problems and whole-cycle faults are represented here.
//!
//! [`ProbeOutcome`]: crate::checker::ProbeOutcome

use thiserror::Error;

use vigil_core::ConfigError;

/// Errors raised while assembling the health engine.
#[derive(Debug, Error)]
pub enum HealthError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

pub type HealthResult<T> = Result<T, HealthError>;

/// An unexpected fault inside one monitor cycle.
///
/// The cycle is skipped and the previously published snapshot stays
/// current.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("cycle panicked: {0}")]
    Panicked(String),
}
