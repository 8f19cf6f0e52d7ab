//! Accelix asset directory connector.
//!
//! Talks to the Accelix entities API: `search-paged` listings,
//! `includeRelated` detail reads for meter state, and partial-update `PUT`
//! writes for meter creation, reading appends, geolocation, and terminal
//! zone assignment.

use crate::http::HttpClient;
use crate::traits::{
    AssetDirectory, AssetRecord, Connector, ConnectorConfig, ConnectorError, ConnectorHealth,
    ConnectorResult, GeoPosition, MeterState, ZoneRef,
};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, instrument};

/// Meter type attached when bootstrapping an asset's odometer meter.
const ODOMETER_METER_TYPE_ID: &str = "6330cf04-5555-44b7-aad8-a843d9e438d1";

const DEFAULT_PAGE_SIZE: u32 = 50;

/// Accelix connector configuration.
#[derive(Debug, Clone)]
pub struct AccelixConfig {
    pub connector: ConnectorConfig,
    /// Site identifier within the tenant (e.g., "def").
    pub site: String,
    /// Assets fetched per listing page.
    pub page_size: u32,
}

impl AccelixConfig {
    pub fn new(connector: ConnectorConfig, site: String) -> Self {
        Self {
            connector,
            site,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Accelix asset directory connector.
pub struct AccelixDirectory {
    config: AccelixConfig,
    client: HttpClient,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    data: Vec<serde_json::Value>,
    #[serde(rename = "totalPages", default)]
    total_pages: u32,
}

impl AccelixDirectory {
    pub fn new(config: AccelixConfig) -> ConnectorResult<Self> {
        let client = HttpClient::new(config.connector.clone())?;
        info!(
            base_url = %config.connector.base_url,
            site = %config.site,
            "Accelix directory connector initialized"
        );
        Ok(Self { config, client })
    }

    fn assets_path(&self, asset_id: &str) -> String {
        format!(
            "/api/entities/{}/Assets/{}",
            self.config.site,
            urlencoding::encode(asset_id)
        )
    }

    fn search_body(&self, asset_type: &str, page: u32) -> serde_json::Value {
        json!({
            "select": [
                {"name": "id"},
                {"name": "c_description"},
                {"name": "c_assettype"},
                {"name": "geolocation"},
                {"name": "c_terminalZone"}
            ],
            "filter": {
                "and": [
                    {"name": "isDeleted", "op": "isfalse"},
                    {"name": "c_assettype", "op": "eq", "value": asset_type}
                ]
            },
            "order": [],
            "pageSize": self.config.page_size,
            "page": page,
            "fkExpansion": true
        })
    }

    /// Maps one listing row into an [`AssetRecord`].
    ///
    /// Rows without an id or description are unusable and dropped. The
    /// geolocation and zone fields parse leniently; meter state is never
    /// present in listings.
    fn parse_asset_row(row: &serde_json::Value) -> Option<AssetRecord> {
        let id = row.get("id")?.as_str()?.to_string();
        let description = row.get("c_description")?.as_str()?.to_string();

        let asset_type_id = row
            .get("c_assettype")
            .and_then(|t| t.get("id"))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let current_geolocation = row.get("geolocation").and_then(GeoPosition::from_value);

        let current_zone = row.get("c_terminalZone").and_then(|z| {
            Some(ZoneRef {
                zone_id: z.get("id")?.as_str()?.to_string(),
                label: z
                    .get("title")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
            })
        });

        Some(AssetRecord {
            id,
            description,
            asset_type_id,
            current_meter: None,
            current_geolocation,
            current_zone,
        })
    }

    /// Extracts meter state from an `includeRelated` detail response.
    fn parse_meter_state(detail: &serde_json::Value) -> Option<MeterState> {
        let meter = detail
            .get("related")?
            .get("AssetMeters")?
            .as_array()?
            .first()?
            .get("properties")?;

        Some(MeterState {
            meter_id: meter.get("id")?.as_str()?.to_string(),
            current_value_miles: meter.get("currentValue")?.as_f64()?,
        })
    }
}

#[async_trait]
impl Connector for AccelixDirectory {
    fn name(&self) -> &str {
        &self.config.connector.name
    }

    fn connector_type(&self) -> &str {
        "directory"
    }

    async fn health_check(&self) -> ConnectorResult<ConnectorHealth> {
        let path = format!("/api/entities/{}/Assets/search-paged", self.config.site);
        let body = json!({
            "select": [{"name": "id"}],
            "filter": {"and": [{"name": "isDeleted", "op": "isfalse"}]},
            "order": [],
            "pageSize": 1,
            "page": 0,
            "fkExpansion": false
        });

        match self.client.post(&path, &body).await {
            Ok(_) => Ok(ConnectorHealth::Healthy),
            Err(ConnectorError::AuthenticationFailed(e)) => {
                Ok(ConnectorHealth::Unhealthy(format!("Auth failed: {}", e)))
            }
            Err(e) => Ok(ConnectorHealth::Unhealthy(e.to_string())),
        }
    }
}

#[async_trait]
impl AssetDirectory for AccelixDirectory {
    /// Accumulates every listing page into one snapshot before returning.
    #[instrument(skip(self))]
    async fn list_assets(&self, asset_type: &str) -> ConnectorResult<Vec<AssetRecord>> {
        let path = format!("/api/entities/{}/Assets/search-paged", self.config.site);

        let first: SearchPage = self
            .client
            .post_json(&path, &self.search_body(asset_type, 0))
            .await?;
        let total_pages = first.total_pages;
        let mut rows = first.data;

        for page in 1..total_pages {
            let next: SearchPage = self
                .client
                .post_json(&path, &self.search_body(asset_type, page))
                .await?;
            rows.extend(next.data);
            debug!(page, total_pages, "fetched asset listing page");
        }

        let assets: Vec<AssetRecord> = rows.iter().filter_map(Self::parse_asset_row).collect();
        info!(count = assets.len(), asset_type, "asset snapshot complete");
        Ok(assets)
    }

    #[instrument(skip(self))]
    async fn fetch_meter_state(&self, asset_id: &str) -> ConnectorResult<Option<MeterState>> {
        let path = format!("{}?includeRelated=true", self.assets_path(asset_id));
        let detail: serde_json::Value = self.client.get_json(&path).await?;
        Ok(Self::parse_meter_state(&detail))
    }

    #[instrument(skip(self))]
    async fn create_meter(
        &self,
        asset_id: &str,
        description: &str,
        initial_value_miles: f64,
    ) -> ConnectorResult<()> {
        let payload = json!({
            "occurredOn": Utc::now().to_rfc3339(),
            "properties": {"id": asset_id},
            "related": {
                "AssetMeters": [{
                    "properties": {
                        "meterId": {
                            "entity": "Meters",
                            "id": ODOMETER_METER_TYPE_ID,
                            "isDeleted": false,
                            "title": "Miles"
                        },
                        "description": format!("Odometer {}", description),
                        "currentValue": initial_value_miles,
                        "tempId": 1
                    },
                    "related": {"AssetMeterReadings": []},
                    "deleted": false
                }]
            },
            "deleted": false
        });

        self.client.put(&self.assets_path(asset_id), &payload).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn append_reading(
        &self,
        asset_id: &str,
        meter_id: &str,
        value_miles: f64,
    ) -> ConnectorResult<()> {
        let now = Utc::now().to_rfc3339();
        let payload = json!({
            "occurredOn": now,
            "properties": {"id": asset_id},
            "related": {
                "AssetMeters": [{
                    "properties": {
                        "id": meter_id,
                        "currentValue": value_miles,
                        "tempId": 1
                    },
                    "related": {
                        "AssetMeterReadings": [{
                            "properties": {
                                "value": value_miles,
                                "readingOn": now,
                                "tempId": 1
                            },
                            "deleted": false
                        }]
                    },
                    "deleted": false
                }]
            },
            "deleted": false
        });

        self.client.put(&self.assets_path(asset_id), &payload).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn update_geolocation(
        &self,
        asset_id: &str,
        position: &GeoPosition,
    ) -> ConnectorResult<()> {
        // The directory stores longitude under "long".
        let payload = json!({
            "geolocation": {"lat": position.lat, "long": position.lon}
        });

        self.client.put(&self.assets_path(asset_id), &payload).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_zone(&self, asset_id: &str, zone: &ZoneRef) -> ConnectorResult<()> {
        let payload = json!({
            "c_terminalZone": {
                "entity": "TerminalZones",
                "id": zone.zone_id,
                "isDeleted": false,
                "title": zone.label
            }
        });

        self.client.put(&self.assets_path(asset_id), &payload).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_asset_row() {
        let row = json!({
            "id": "a-1",
            "c_description": "T12 - Desert Hauler",
            "c_assettype": {"id": "b6d90bff", "title": "Freightliner"},
            "geolocation": {"lat": 35.08, "long": -106.65},
            "c_terminalZone": {"id": "ABQ", "title": "Albuquerque"}
        });

        let asset = AccelixDirectory::parse_asset_row(&row).unwrap();
        assert_eq!(asset.id, "a-1");
        assert_eq!(asset.description, "T12 - Desert Hauler");
        assert_eq!(asset.asset_type_id, "b6d90bff");
        assert!(asset.current_meter.is_none());
        assert_eq!(
            asset.current_geolocation,
            Some(GeoPosition::new(35.08, -106.65))
        );
        assert_eq!(asset.current_zone.as_ref().unwrap().zone_id, "ABQ");
    }

    #[test]
    fn test_parse_asset_row_minimal() {
        let row = json!({
            "id": "a-2",
            "c_description": "C19 - Mill Mountain",
            "c_assettype": null,
            "geolocation": null,
            "c_terminalZone": null
        });

        let asset = AccelixDirectory::parse_asset_row(&row).unwrap();
        assert_eq!(asset.asset_type_id, "");
        assert!(asset.current_geolocation.is_none());
        assert!(asset.current_zone.is_none());
    }

    #[test]
    fn test_parse_asset_row_missing_id_dropped() {
        let row = json!({"c_description": "T12 - Desert Hauler"});
        assert!(AccelixDirectory::parse_asset_row(&row).is_none());
    }

    #[test]
    fn test_parse_meter_state() {
        let detail = json!({
            "properties": {"id": "a-1", "c_description": "T12 - Desert Hauler"},
            "related": {
                "AssetMeters": [{
                    "properties": {"id": "m-9", "currentValue": 62.14}
                }]
            }
        });

        let meter = AccelixDirectory::parse_meter_state(&detail).unwrap();
        assert_eq!(meter.meter_id, "m-9");
        assert_eq!(meter.current_value_miles, 62.14);
    }

    #[test]
    fn test_parse_meter_state_no_meter() {
        let detail = json!({
            "properties": {"id": "a-1"},
            "related": {"AssetMeters": []}
        });
        assert!(AccelixDirectory::parse_meter_state(&detail).is_none());
    }
}
