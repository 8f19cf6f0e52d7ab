//! Motive telemetry connector.
//!
//! Fetches current vehicle positions and odometer readings from the Motive
//! fleet-tracking API (`/v2/vehicle_locations`). Odometer values are
//! reported in kilometers; a vehicle without a `current_location` has no
//! reading this run.

use crate::http::HttpClient;
use crate::traits::{
    Connector, ConnectorConfig, ConnectorError, ConnectorHealth, ConnectorResult, GeoPosition,
    TelemetryRecord, TelemetrySource,
};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, instrument};

const DEFAULT_PAGE_SIZE: u32 = 100;

/// Motive connector configuration.
#[derive(Debug, Clone)]
pub struct MotiveConfig {
    pub connector: ConnectorConfig,
    /// Vehicles fetched per page.
    pub page_size: u32,
}

impl MotiveConfig {
    pub fn new(connector: ConnectorConfig) -> Self {
        Self {
            connector,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Motive telemetry connector.
pub struct MotiveTelemetry {
    config: MotiveConfig,
    client: HttpClient,
}

#[derive(Debug, Deserialize)]
struct VehicleLocationsPage {
    #[serde(default)]
    vehicles: Vec<VehicleEntry>,
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
struct VehicleEntry {
    vehicle: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    per_page: u32,
    page_no: u32,
    total: u32,
}

impl MotiveTelemetry {
    pub fn new(config: MotiveConfig) -> ConnectorResult<Self> {
        let client = HttpClient::new(config.connector.clone())?;
        info!(
            base_url = %config.connector.base_url,
            "Motive telemetry connector initialized"
        );
        Ok(Self { config, client })
    }

    /// Maps one `vehicle` object from the wire into a [`TelemetryRecord`].
    ///
    /// Returns `None` when the entry carries no vehicle number at all; a
    /// missing `current_location` still yields a record, just without an
    /// odometer value or position.
    fn parse_vehicle(vehicle: &serde_json::Value) -> Option<TelemetryRecord> {
        let label = vehicle.get("number")?.as_str()?.to_string();

        let location = vehicle.get("current_location").filter(|v| !v.is_null());
        let odometer_km = location.and_then(|loc| loc.get("odometer")).and_then(|v| v.as_f64());
        let position = location.and_then(GeoPosition::from_value);

        Some(TelemetryRecord {
            vehicle_label: label,
            odometer_km,
            position,
        })
    }
}

#[async_trait]
impl Connector for MotiveTelemetry {
    fn name(&self) -> &str {
        &self.config.connector.name
    }

    fn connector_type(&self) -> &str {
        "telemetry"
    }

    async fn health_check(&self) -> ConnectorResult<ConnectorHealth> {
        match self.client.get("/v2/vehicle_locations?per_page=1").await {
            Ok(_) => Ok(ConnectorHealth::Healthy),
            Err(ConnectorError::AuthenticationFailed(e)) => {
                Ok(ConnectorHealth::Unhealthy(format!("Auth failed: {}", e)))
            }
            Err(e) => Ok(ConnectorHealth::Unhealthy(e.to_string())),
        }
    }
}

#[async_trait]
impl TelemetrySource for MotiveTelemetry {
    /// Fetches every vehicle position, page by page, into one snapshot.
    #[instrument(skip(self))]
    async fn fetch_positions(&self) -> ConnectorResult<Vec<TelemetryRecord>> {
        let mut records = Vec::new();
        let mut page_no = 1u32;

        loop {
            let path = format!(
                "/v2/vehicle_locations?per_page={}&page_no={}",
                self.config.page_size, page_no
            );
            let page: VehicleLocationsPage = self.client.get_json(&path).await?;

            let fetched = page.vehicles.len();
            for entry in &page.vehicles {
                if let Some(record) = Self::parse_vehicle(&entry.vehicle) {
                    records.push(record);
                }
            }
            debug!(page_no, fetched, "fetched telemetry page");

            let done = match page.pagination {
                Some(p) => (p.page_no * p.per_page) >= p.total,
                None => true,
            };
            if done || fetched == 0 {
                break;
            }
            page_no += 1;
        }

        info!(count = records.len(), "telemetry snapshot complete");
        Ok(records)
    }
}
