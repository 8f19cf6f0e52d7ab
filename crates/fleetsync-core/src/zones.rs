//! Terminal zone classification.
//!
//! Assigns each asset to its nearest terminal facility by great-circle
//! distance against a fixed, compiled-in registry. The registry spans a
//! continent, so a true haversine distance is required; the registry is
//! small enough that a linear scan is the whole algorithm.

use fleetsync_connectors::{AssetDirectory, AssetRecord, GeoPosition, ZoneRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// A terminal facility in the fixed registry.
#[derive(Debug, Clone, Copy)]
pub struct Facility {
    pub zone_id: &'static str,
    pub label: &'static str,
    pub lat: f64,
    pub lon: f64,
}

/// The compiled-in facility registry. Order matters: distance ties are
/// broken by the first minimum in registry order.
pub const FACILITIES: &[Facility] = &[
    Facility { zone_id: "ABQ", label: "Albuquerque", lat: 35.0844, lon: -106.6504 },
    Facility { zone_id: "BCB", label: "Blacksburg", lat: 37.2296, lon: -80.4139 },
    Facility { zone_id: "DFW", label: "Dallas-Fort Worth", lat: 32.8998, lon: -97.0403 },
    Facility { zone_id: "UPG", label: "Uvalde Proving Grounds", lat: 29.2097, lon: -99.7862 },
    Facility { zone_id: "PDX", label: "Portland", lat: 45.5152, lon: -122.6784 },
];

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine great-circle distance between two points, in kilometers.
fn haversine_km(a: &GeoPosition, b: &GeoPosition) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Finds the nearest facility to a position.
///
/// `None` input (absent or malformed position) yields `None` — logged,
/// never raised. Deterministic: identical input always returns the same
/// facility, ties broken by registry order.
pub fn nearest_zone(position: Option<&GeoPosition>) -> Option<ZoneRef> {
    let position = match position {
        Some(p) => p,
        None => {
            info!("no usable position, leaving asset unclassified");
            return None;
        }
    };

    let mut best: Option<(&Facility, f64)> = None;
    for facility in FACILITIES {
        let there = GeoPosition::new(facility.lat, facility.lon);
        let distance = haversine_km(position, &there);
        // Strict less-than keeps the first minimum on ties.
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((facility, distance));
        }
    }

    best.map(|(facility, _)| ZoneRef {
        zone_id: facility.zone_id.to_string(),
        label: facility.label.to_string(),
    })
}

/// Outcome counts for one zone assignment pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneSummary {
    /// Assets classified and written.
    pub assigned: u64,
    /// Assets with no usable position; no write issued.
    pub unclassified: u64,
    /// Zone writes that failed (logged, not retried).
    pub write_errors: u64,
    /// When the pass completed.
    pub completed_at: DateTime<Utc>,
}

impl ZoneSummary {
    pub fn is_clean(&self) -> bool {
        self.write_errors == 0
    }
}

/// Drives zone assignment against an asset directory.
pub struct ZoneClassifier<'a> {
    directory: &'a dyn AssetDirectory,
}

impl<'a> ZoneClassifier<'a> {
    pub fn new(directory: &'a dyn AssetDirectory) -> Self {
        Self { directory }
    }

    /// Classifies every asset and writes each non-null result.
    ///
    /// The write fires even when the asset's current zone already matches:
    /// the remote partial update is idempotent, and the listing snapshot's
    /// zone field may be stale. Write failures are logged with the asset
    /// id and the pass continues.
    pub async fn run(&self, assets: &[AssetRecord]) -> ZoneSummary {
        let mut summary = ZoneSummary {
            assigned: 0,
            unclassified: 0,
            write_errors: 0,
            completed_at: Utc::now(),
        };

        for asset in assets {
            let Some(zone) = nearest_zone(asset.current_geolocation.as_ref()) else {
                summary.unclassified += 1;
                continue;
            };

            match self.directory.set_zone(&asset.id, &zone).await {
                Ok(()) => {
                    info!(asset = %asset.id, zone = %zone.zone_id, "zone assigned");
                    summary.assigned += 1;
                }
                Err(e) => {
                    warn!(asset = %asset.id, error = %e, "zone write failed");
                    summary.write_errors += 1;
                }
            }
        }

        summary.completed_at = Utc::now();
        info!(
            assigned = summary.assigned,
            unclassified = summary.unclassified,
            write_errors = summary.write_errors,
            "zone assignment pass complete"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetsync_connectors::mock::{sample_asset, MockAssetDirectory, RecordedWrite};

    #[test]
    fn test_exact_facility_coordinates_return_that_facility() {
        for facility in FACILITIES {
            let position = GeoPosition::new(facility.lat, facility.lon);
            let zone = nearest_zone(Some(&position)).unwrap();
            assert_eq!(zone.zone_id, facility.zone_id);

            let there = GeoPosition::new(facility.lat, facility.lon);
            assert_eq!(haversine_km(&position, &there), 0.0);
        }
    }

    #[test]
    fn test_nearest_zone_deterministic() {
        let position = GeoPosition::new(35.08, -106.65);
        let first = nearest_zone(Some(&position));
        let second = nearest_zone(Some(&position));
        assert_eq!(first, second);
        assert_eq!(first.unwrap().zone_id, "ABQ");
    }

    #[test]
    fn test_none_position_unclassified() {
        assert_eq!(nearest_zone(None), None);
    }

    #[test]
    fn test_malformed_position_parses_to_none_and_stays_unclassified() {
        let malformed = GeoPosition::from_value(&serde_json::json!({}));
        assert_eq!(nearest_zone(malformed.as_ref()), None);
    }

    #[test]
    fn test_continental_distances_pick_the_right_coast() {
        // Near Portland; Euclidean-on-degrees would also get this right,
        // but the Virginia/New Mexico split below would not be as safe.
        let near_pdx = GeoPosition::new(45.0, -122.0);
        assert_eq!(nearest_zone(Some(&near_pdx)).unwrap().zone_id, "PDX");

        let near_bcb = GeoPosition::new(37.0, -80.0);
        assert_eq!(nearest_zone(Some(&near_bcb)).unwrap().zone_id, "BCB");
    }

    #[test]
    fn test_haversine_known_distance() {
        // Albuquerque to Dallas-Fort Worth is roughly 930 km.
        let abq = GeoPosition::new(35.0844, -106.6504);
        let dfw = GeoPosition::new(32.8998, -97.0403);
        let d = haversine_km(&abq, &dfw);
        assert!((900.0..960.0).contains(&d), "got {}", d);
    }

    #[tokio::test]
    async fn test_run_writes_every_classified_asset() {
        let mut classified = sample_asset("a-1", "T12 - Desert Hauler", "truck");
        classified.current_geolocation = Some(GeoPosition::new(35.08, -106.65));
        // Already carries the right zone; the write still fires.
        classified.current_zone = Some(ZoneRef {
            zone_id: "ABQ".to_string(),
            label: "Albuquerque".to_string(),
        });

        let unclassified = sample_asset("a-2", "C19 - Mill Mountain", "truck");

        let assets = vec![classified, unclassified];
        let directory = MockAssetDirectory::new(assets.clone());

        let summary = ZoneClassifier::new(&directory).run(&assets).await;
        assert_eq!(summary.assigned, 1);
        assert_eq!(summary.unclassified, 1);

        let writes = directory.writes().await;
        assert_eq!(writes.len(), 1);
        assert_eq!(
            writes[0],
            RecordedWrite::SetZone {
                asset_id: "a-1".to_string(),
                zone_id: "ABQ".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_run_continues_past_write_failure() {
        let mut a1 = sample_asset("a-1", "T12 - Desert Hauler", "truck");
        a1.current_geolocation = Some(GeoPosition::new(35.08, -106.65));
        let mut a2 = sample_asset("a-2", "C19 - Mill Mountain", "truck");
        a2.current_geolocation = Some(GeoPosition::new(37.22, -80.41));

        let assets = vec![a1, a2];
        let directory = MockAssetDirectory::new(assets.clone()).fail_zone_write_for("a-1");

        let summary = ZoneClassifier::new(&directory).run(&assets).await;
        assert_eq!(summary.write_errors, 1);
        assert_eq!(summary.assigned, 1);
        assert_eq!(directory.writes_for("a-2").await.len(), 1);
    }
}
