//! vigil-core — shared types for the Vigil endpoint monitor.
//!
//! Holds the `vigil.toml` configuration model, the immutable
//! [`EndpointRegistry`] of monitored targets, and the [`Snapshot`] wire
//! types published by the health engine.

pub mod config;
pub mod duration;
pub mod error;
pub mod registry;
pub mod types;

pub use config::{MonitorSettings, VigilConfig};
pub use duration::parse_duration;
pub use error::{ConfigError, ConfigResult};
pub use registry::{Endpoint, EndpointRegistry};
pub use types::*;
