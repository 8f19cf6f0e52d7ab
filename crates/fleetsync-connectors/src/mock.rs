//! In-memory connector doubles for testing.
//!
//! `MockTelemetrySource` serves a canned snapshot; `MockAssetDirectory`
//! keeps meter state in memory, records every write it receives, and can
//! inject failures per asset or per write kind so run loops can be tested
//! for log-and-continue behavior.

use crate::traits::{
    AssetDirectory, AssetRecord, Connector, ConnectorError, ConnectorHealth, ConnectorResult,
    GeoPosition, MeterState, TelemetryRecord, TelemetrySource, ZoneRef,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mock telemetry source serving a fixed snapshot.
pub struct MockTelemetrySource {
    name: String,
    records: Vec<TelemetryRecord>,
}

impl MockTelemetrySource {
    pub fn new(records: Vec<TelemetryRecord>) -> Self {
        Self {
            name: "mock-telemetry".to_string(),
            records,
        }
    }
}

#[async_trait]
impl Connector for MockTelemetrySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn connector_type(&self) -> &str {
        "telemetry"
    }

    async fn health_check(&self) -> ConnectorResult<ConnectorHealth> {
        Ok(ConnectorHealth::Healthy)
    }
}

#[async_trait]
impl TelemetrySource for MockTelemetrySource {
    async fn fetch_positions(&self) -> ConnectorResult<Vec<TelemetryRecord>> {
        Ok(self.records.clone())
    }
}

/// A write issued against the mock directory.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedWrite {
    CreateMeter {
        asset_id: String,
        value_miles: f64,
    },
    AppendReading {
        asset_id: String,
        meter_id: String,
        value_miles: f64,
    },
    UpdateGeolocation {
        asset_id: String,
        position: GeoPosition,
    },
    SetZone {
        asset_id: String,
        zone_id: String,
    },
}

#[derive(Default)]
struct MockDirectoryState {
    assets: Vec<AssetRecord>,
    meters: HashMap<String, MeterState>,
    writes: Vec<RecordedWrite>,
    next_meter_id: u32,
}

/// Mock asset directory with write recording and failure injection.
pub struct MockAssetDirectory {
    name: String,
    state: Arc<RwLock<MockDirectoryState>>,
    fail_meter_fetch_for: HashSet<String>,
    fail_geolocation_writes: bool,
    fail_zone_writes_for: HashSet<String>,
}

impl MockAssetDirectory {
    pub fn new(assets: Vec<AssetRecord>) -> Self {
        let meters = assets
            .iter()
            .filter_map(|a| a.current_meter.clone().map(|m| (a.id.clone(), m)))
            .collect();

        Self {
            name: "mock-directory".to_string(),
            state: Arc::new(RwLock::new(MockDirectoryState {
                assets,
                meters,
                writes: Vec::new(),
                next_meter_id: 1,
            })),
            fail_meter_fetch_for: HashSet::new(),
            fail_geolocation_writes: false,
            fail_zone_writes_for: HashSet::new(),
        }
    }

    /// Makes `fetch_meter_state` fail for the given asset.
    pub fn fail_meter_fetch_for(mut self, asset_id: &str) -> Self {
        self.fail_meter_fetch_for.insert(asset_id.to_string());
        self
    }

    /// Makes every geolocation write fail.
    pub fn fail_geolocation_writes(mut self) -> Self {
        self.fail_geolocation_writes = true;
        self
    }

    /// Makes `set_zone` fail for the given asset.
    pub fn fail_zone_write_for(mut self, asset_id: &str) -> Self {
        self.fail_zone_writes_for.insert(asset_id.to_string());
        self
    }

    /// Returns every write recorded so far, in order.
    pub async fn writes(&self) -> Vec<RecordedWrite> {
        self.state.read().await.writes.clone()
    }

    /// Returns the writes recorded against one asset, in order.
    pub async fn writes_for(&self, asset_id: &str) -> Vec<RecordedWrite> {
        self.state
            .read()
            .await
            .writes
            .iter()
            .filter(|w| match w {
                RecordedWrite::CreateMeter { asset_id: a, .. }
                | RecordedWrite::AppendReading { asset_id: a, .. }
                | RecordedWrite::UpdateGeolocation { asset_id: a, .. }
                | RecordedWrite::SetZone { asset_id: a, .. } => a == asset_id,
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Connector for MockAssetDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    fn connector_type(&self) -> &str {
        "directory"
    }

    async fn health_check(&self) -> ConnectorResult<ConnectorHealth> {
        Ok(ConnectorHealth::Healthy)
    }
}

#[async_trait]
impl AssetDirectory for MockAssetDirectory {
    async fn list_assets(&self, asset_type: &str) -> ConnectorResult<Vec<AssetRecord>> {
        Ok(self
            .state
            .read()
            .await
            .assets
            .iter()
            .filter(|a| a.asset_type_id == asset_type)
            .cloned()
            .collect())
    }

    async fn fetch_meter_state(&self, asset_id: &str) -> ConnectorResult<Option<MeterState>> {
        if self.fail_meter_fetch_for.contains(asset_id) {
            return Err(ConnectorError::RequestFailed("status 500".to_string()));
        }
        Ok(self.state.read().await.meters.get(asset_id).cloned())
    }

    async fn create_meter(
        &self,
        asset_id: &str,
        _description: &str,
        initial_value_miles: f64,
    ) -> ConnectorResult<()> {
        let mut state = self.state.write().await;
        let meter_id = format!("meter-{:03}", state.next_meter_id);
        state.next_meter_id += 1;

        state.meters.insert(
            asset_id.to_string(),
            MeterState {
                meter_id,
                current_value_miles: initial_value_miles,
            },
        );
        state.writes.push(RecordedWrite::CreateMeter {
            asset_id: asset_id.to_string(),
            value_miles: initial_value_miles,
        });
        Ok(())
    }

    async fn append_reading(
        &self,
        asset_id: &str,
        meter_id: &str,
        value_miles: f64,
    ) -> ConnectorResult<()> {
        let mut state = self.state.write().await;
        match state.meters.get_mut(asset_id) {
            Some(meter) if meter.meter_id == meter_id => {
                meter.current_value_miles = value_miles;
            }
            _ => {
                return Err(ConnectorError::NotFound(format!(
                    "No meter {} on asset {}",
                    meter_id, asset_id
                )))
            }
        }
        state.writes.push(RecordedWrite::AppendReading {
            asset_id: asset_id.to_string(),
            meter_id: meter_id.to_string(),
            value_miles,
        });
        Ok(())
    }

    async fn update_geolocation(
        &self,
        asset_id: &str,
        position: &GeoPosition,
    ) -> ConnectorResult<()> {
        if self.fail_geolocation_writes {
            return Err(ConnectorError::RequestFailed("status 502".to_string()));
        }
        self.state
            .write()
            .await
            .writes
            .push(RecordedWrite::UpdateGeolocation {
                asset_id: asset_id.to_string(),
                position: *position,
            });
        Ok(())
    }

    async fn set_zone(&self, asset_id: &str, zone: &ZoneRef) -> ConnectorResult<()> {
        if self.fail_zone_writes_for.contains(asset_id) {
            return Err(ConnectorError::RequestFailed("status 500".to_string()));
        }
        self.state.write().await.writes.push(RecordedWrite::SetZone {
            asset_id: asset_id.to_string(),
            zone_id: zone.zone_id.clone(),
        });
        Ok(())
    }
}

/// Creates a test asset with no meter, geolocation, or zone.
pub fn sample_asset(id: &str, description: &str, asset_type_id: &str) -> AssetRecord {
    AssetRecord {
        id: id.to_string(),
        description: description.to_string(),
        asset_type_id: asset_type_id.to_string(),
        current_meter: None,
        current_geolocation: None,
        current_zone: None,
    }
}

/// Creates a test telemetry record.
pub fn sample_telemetry(label: &str, odometer_km: Option<f64>, position: Option<GeoPosition>) -> TelemetryRecord {
    TelemetryRecord {
        vehicle_label: label.to_string(),
        odometer_km,
        position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_directory_meter_lifecycle() {
        let directory = MockAssetDirectory::new(vec![sample_asset("a-1", "T12 - Desert Hauler", "truck")]);

        assert!(directory.fetch_meter_state("a-1").await.unwrap().is_none());

        directory.create_meter("a-1", "T12 - Desert Hauler", 62.14).await.unwrap();
        let meter = directory.fetch_meter_state("a-1").await.unwrap().unwrap();
        assert_eq!(meter.current_value_miles, 62.14);

        directory
            .append_reading("a-1", &meter.meter_id, 75.0)
            .await
            .unwrap();
        let meter = directory.fetch_meter_state("a-1").await.unwrap().unwrap();
        assert_eq!(meter.current_value_miles, 75.0);

        assert_eq!(directory.writes().await.len(), 2);
    }

    #[tokio::test]
    async fn test_mock_directory_failure_injection() {
        let directory = MockAssetDirectory::new(vec![sample_asset("a-1", "T12 - Desert Hauler", "truck")])
            .fail_meter_fetch_for("a-1");

        assert!(directory.fetch_meter_state("a-1").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_telemetry_snapshot() {
        let source = MockTelemetrySource::new(vec![sample_telemetry("T12 Reno", Some(100.0), None)]);
        let records = source.fetch_positions().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].short_code(), "T12");
    }
}
