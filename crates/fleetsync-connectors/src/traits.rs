//! Connector trait definitions for fleetsync.
//!
//! This module defines the interfaces the reconciliation engine talks to,
//! the error taxonomy for connector operations, and the wire-facing data
//! model shared by both external systems.

use crate::secure_string::SecureString;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur in connectors.
#[derive(Error, Debug, Clone)]
pub enum ConnectorError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Health status of a connector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorHealth {
    /// Connector is healthy and operational.
    Healthy,
    /// Connector is unhealthy and not operational.
    Unhealthy(String),
    /// Health status is unknown.
    Unknown,
}

/// Configuration for a connector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Connector name/identifier.
    pub name: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Authentication configuration.
    pub auth: AuthConfig,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Additional headers to include.
    pub headers: HashMap<String, String>,
}

/// Authentication configuration.
///
/// Credential fields use [`SecureString`] so sensitive data is zeroized
/// from memory when no longer needed. Both upstream APIs authenticate with
/// a static header credential, so these are the only supported schemes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// No authentication.
    None,
    /// API key sent in a named header.
    ApiKey {
        /// The API key (zeroized on drop).
        key: SecureString,
        /// The header name to use for the API key.
        header_name: String,
    },
    /// Session token sent in the `Cookie` header.
    Cookie {
        /// The cookie value (zeroized on drop).
        value: SecureString,
    },
}

/// Base trait for all connectors.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Returns the connector name.
    fn name(&self) -> &str;

    /// Returns the connector type (e.g., "telemetry", "directory").
    fn connector_type(&self) -> &str;

    /// Checks the health of the connector.
    async fn health_check(&self) -> ConnectorResult<ConnectorHealth>;
}

/// A geographic position.
///
/// Wire forms disagree on the longitude key: the telemetry provider sends
/// `lon`, the asset directory stores `long`. Deserialization accepts both.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    #[serde(alias = "long")]
    pub lon: f64,
}

impl GeoPosition {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Leniently parses a position from a raw JSON value.
    ///
    /// Accepts `lat` plus either `lon` or `long`. Anything else (null,
    /// missing keys, non-numeric values) yields `None` — malformed
    /// positions are recovered, never raised.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let obj = value.as_object()?;
        let lat = obj.get("lat")?.as_f64()?;
        let lon = obj.get("lon").or_else(|| obj.get("long"))?.as_f64()?;
        Some(Self { lat, lon })
    }
}

/// A single vehicle report from the telemetry provider.
///
/// Produced fresh each run and treated as immutable once fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryRecord {
    /// Vehicle label as reported by the provider (e.g., "T12 Reno").
    pub vehicle_label: String,
    /// Odometer reading in kilometers; `None` when the provider has no
    /// current reading for this vehicle.
    pub odometer_km: Option<f64>,
    /// Last reported position, if any.
    pub position: Option<GeoPosition>,
}

impl TelemetryRecord {
    /// The leading whitespace-delimited token of the vehicle label, used
    /// as the join key against asset descriptions.
    pub fn short_code(&self) -> &str {
        self.vehicle_label
            .split_whitespace()
            .next()
            .unwrap_or(&self.vehicle_label)
    }
}

/// Current mileage-meter state of an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterState {
    /// Stable identifier of the meter sub-record.
    pub meter_id: String,
    /// Current meter value in miles.
    pub current_value_miles: f64,
}

/// A terminal zone assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRef {
    /// Facility identifier (e.g., "ABQ").
    pub zone_id: String,
    /// Human-readable facility label.
    pub label: String,
}

/// An asset record from the asset directory.
///
/// Owned exclusively by the directory; fleetsync reads snapshots and writes
/// partial updates, never deletes. Listing reads never include meter state
/// (`current_meter` is populated only by a per-asset detail fetch).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Opaque, stable asset identifier.
    pub id: String,
    /// Free-text description, conventionally "<shortCode> - <name>".
    pub description: String,
    /// Identifier of the asset's type.
    pub asset_type_id: String,
    /// Current meter state, when known.
    pub current_meter: Option<MeterState>,
    /// Last recorded geolocation, when known.
    pub current_geolocation: Option<GeoPosition>,
    /// Current terminal zone assignment, when known.
    pub current_zone: Option<ZoneRef>,
}

/// Fleet-tracking telemetry source (read-only).
#[async_trait]
pub trait TelemetrySource: Connector {
    /// Fetches the current position and odometer reading for every vehicle,
    /// accumulating all pages before returning.
    async fn fetch_positions(&self) -> ConnectorResult<Vec<TelemetryRecord>>;
}

/// Asset-management directory (read/write).
#[async_trait]
pub trait AssetDirectory: Connector {
    /// Lists all non-deleted assets of the given type, accumulating all
    /// pages before returning. Returned records carry no meter state.
    async fn list_assets(&self, asset_type: &str) -> ConnectorResult<Vec<AssetRecord>>;

    /// Fetches the asset's current meter state. Returns `None` when the
    /// asset has no meter sub-record yet.
    async fn fetch_meter_state(&self, asset_id: &str) -> ConnectorResult<Option<MeterState>>;

    /// Attaches a new mileage meter to the asset, seeded with the given
    /// value. One-time bootstrap per asset.
    async fn create_meter(
        &self,
        asset_id: &str,
        description: &str,
        initial_value_miles: f64,
    ) -> ConnectorResult<()>;

    /// Appends a reading record, timestamped at write time, to the asset's
    /// existing meter and updates its current value.
    async fn append_reading(
        &self,
        asset_id: &str,
        meter_id: &str,
        value_miles: f64,
    ) -> ConnectorResult<()>;

    /// Updates the asset's last-known geolocation.
    async fn update_geolocation(
        &self,
        asset_id: &str,
        position: &GeoPosition,
    ) -> ConnectorResult<()>;

    /// Sets the asset's terminal zone assignment.
    async fn set_zone(&self, asset_id: &str, zone: &ZoneRef) -> ConnectorResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_short_code() {
        let record = TelemetryRecord {
            vehicle_label: "T12 Reno".to_string(),
            odometer_km: Some(100.0),
            position: None,
        };
        assert_eq!(record.short_code(), "T12");
    }

    #[test]
    fn test_short_code_single_token() {
        let record = TelemetryRecord {
            vehicle_label: "C19".to_string(),
            odometer_km: None,
            position: None,
        };
        assert_eq!(record.short_code(), "C19");
    }

    #[test]
    fn test_geo_position_accepts_both_longitude_keys() {
        let lon = GeoPosition::from_value(&json!({"lat": 35.08, "lon": -106.65}));
        assert_eq!(lon, Some(GeoPosition::new(35.08, -106.65)));

        let long = GeoPosition::from_value(&json!({"lat": 35.08, "long": -106.65}));
        assert_eq!(long, Some(GeoPosition::new(35.08, -106.65)));
    }

    #[test]
    fn test_geo_position_malformed_is_none() {
        assert_eq!(GeoPosition::from_value(&json!({})), None);
        assert_eq!(GeoPosition::from_value(&json!(null)), None);
        assert_eq!(GeoPosition::from_value(&json!({"lat": 35.08})), None);
        assert_eq!(GeoPosition::from_value(&json!({"lat": "x", "lon": 1.0})), None);
    }

    #[test]
    fn test_geo_position_deserialize_long_alias() {
        let pos: GeoPosition = serde_json::from_value(json!({"lat": 37.2, "long": -80.4})).unwrap();
        assert_eq!(pos.lon, -80.4);
    }
}
