//! Telemetry source connectors.

mod motive;

pub use motive::{MotiveConfig, MotiveTelemetry};
