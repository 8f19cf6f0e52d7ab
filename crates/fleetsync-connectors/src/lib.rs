//! # fleetsync-connectors
//!
//! Connectors to the external systems fleetsync reconciles between: the
//! fleet-tracking telemetry provider and the asset-management directory.
//!
//! This crate defines the connector traits, the shared single-attempt HTTP
//! client, and the concrete connector implementations, plus in-memory mocks
//! for testing the reconciliation logic without a network.

pub mod directory;
pub mod http;
pub mod mock;
pub mod secure_string;
pub mod telemetry;
pub mod traits;

pub use directory::{AccelixConfig, AccelixDirectory};
pub use http::HttpClient;
pub use secure_string::SecureString;
pub use telemetry::{MotiveConfig, MotiveTelemetry};
pub use traits::{
    AssetDirectory, AssetRecord, AuthConfig, Connector, ConnectorConfig, ConnectorError,
    ConnectorHealth, ConnectorResult, GeoPosition, MeterState, TelemetryRecord, TelemetrySource,
    ZoneRef,
};
