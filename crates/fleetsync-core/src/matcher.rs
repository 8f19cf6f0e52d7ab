//! Telemetry-to-asset matching.
//!
//! Pairs each telemetry record with an asset by testing whether the
//! vehicle's short code (leading token of its label) occurs as a substring
//! of the asset description. The strategy sits behind the [`Matcher`]
//! trait so a stricter join (exact token, regex, id-based) can replace the
//! heuristic without touching the reconciliation engine.

use fleetsync_connectors::{AssetRecord, TelemetryRecord};
use tracing::{debug, info};

/// A telemetry record paired with the asset it describes.
#[derive(Debug, Clone, Copy)]
pub struct MatchedPair<'a> {
    pub asset: &'a AssetRecord,
    pub telemetry: &'a TelemetryRecord,
}

/// Pluggable telemetry-to-asset matching strategy.
pub trait Matcher {
    /// Pairs telemetry records with assets. Each asset appears in the
    /// result at most once; pairs are returned in asset input order.
    fn pair<'a>(
        &self,
        telemetry: &'a [TelemetryRecord],
        assets: &'a [AssetRecord],
    ) -> Vec<MatchedPair<'a>>;
}

/// Substring heuristic: an asset matches when its description contains the
/// telemetry record's short code.
///
/// Telemetry is iterated outer, assets inner. For one telemetry record the
/// first asset (input order) whose description contains the short code
/// wins; when several telemetry records match the same asset, the last one
/// overwrites the earlier pairing. A short code occurring as a coincidental
/// substring of an unrelated word produces a false match — an accepted
/// limitation of the heuristic.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortCodeMatcher;

impl Matcher for ShortCodeMatcher {
    fn pair<'a>(
        &self,
        telemetry: &'a [TelemetryRecord],
        assets: &'a [AssetRecord],
    ) -> Vec<MatchedPair<'a>> {
        // One slot per asset; a later telemetry match overwrites it.
        let mut slots: Vec<Option<&TelemetryRecord>> = vec![None; assets.len()];

        for record in telemetry {
            if record.odometer_km.is_none() {
                info!(
                    vehicle = %record.vehicle_label,
                    "no odometer reading this run, skipping"
                );
                continue;
            }

            let code = record.short_code();
            match assets.iter().position(|a| a.description.contains(code)) {
                Some(idx) => {
                    if slots[idx].is_some() {
                        debug!(
                            vehicle = %record.vehicle_label,
                            asset = %assets[idx].description,
                            "asset already paired, overwriting with later telemetry"
                        );
                    }
                    slots[idx] = Some(record);
                }
                None => {
                    debug!(vehicle = %record.vehicle_label, code, "no matching asset");
                }
            }
        }

        assets
            .iter()
            .zip(slots)
            .filter_map(|(asset, slot)| slot.map(|telemetry| MatchedPair { asset, telemetry }))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetsync_connectors::mock::{sample_asset, sample_telemetry};

    #[test]
    fn test_short_code_matches_description_substring() {
        let telemetry = vec![sample_telemetry("T12 Reno", Some(100.0), None)];
        let assets = vec![sample_asset("a-1", "T12 - Desert Hauler", "truck")];

        let pairs = ShortCodeMatcher.pair(&telemetry, &assets);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].asset.id, "a-1");
        assert_eq!(pairs[0].telemetry.vehicle_label, "T12 Reno");
    }

    #[test]
    fn test_telemetry_without_odometer_is_skipped() {
        let telemetry = vec![sample_telemetry("T12 Reno", None, None)];
        let assets = vec![sample_asset("a-1", "T12 - Desert Hauler", "truck")];

        assert!(ShortCodeMatcher.pair(&telemetry, &assets).is_empty());
    }

    #[test]
    fn test_unmatched_telemetry_and_assets_excluded() {
        let telemetry = vec![
            sample_telemetry("T12 Reno", Some(100.0), None),
            sample_telemetry("Z99 Nowhere", Some(50.0), None),
        ];
        let assets = vec![
            sample_asset("a-1", "T12 - Desert Hauler", "truck"),
            sample_asset("a-2", "C19 - Mill Mountain", "truck"),
        ];

        let pairs = ShortCodeMatcher.pair(&telemetry, &assets);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].asset.id, "a-1");
    }

    #[test]
    fn test_first_asset_wins_for_one_telemetry_record() {
        let telemetry = vec![sample_telemetry("T1 Reno", Some(100.0), None)];
        // Both descriptions contain "T1"; input order decides.
        let assets = vec![
            sample_asset("a-1", "T1 - Desert Hauler", "truck"),
            sample_asset("a-2", "T10 - Mill Mountain", "truck"),
        ];

        let pairs = ShortCodeMatcher.pair(&telemetry, &assets);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].asset.id, "a-1");
    }

    #[test]
    fn test_last_telemetry_match_wins_per_asset() {
        let telemetry = vec![
            sample_telemetry("T12 Reno", Some(100.0), None),
            sample_telemetry("T12 Spare", Some(200.0), None),
        ];
        let assets = vec![sample_asset("a-1", "T12 - Desert Hauler", "truck")];

        let pairs = ShortCodeMatcher.pair(&telemetry, &assets);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].telemetry.odometer_km, Some(200.0));
    }

    #[test]
    fn test_coincidental_substring_matches() {
        // "T1" occurs inside "T12" — the heuristic accepts this.
        let telemetry = vec![sample_telemetry("T1 Reno", Some(100.0), None)];
        let assets = vec![sample_asset("a-1", "T12 - Desert Hauler", "truck")];

        let pairs = ShortCodeMatcher.pair(&telemetry, &assets);
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn test_pairs_in_asset_input_order() {
        let telemetry = vec![
            sample_telemetry("C19 Roanoke", Some(50.0), None),
            sample_telemetry("T12 Reno", Some(100.0), None),
        ];
        let assets = vec![
            sample_asset("a-1", "T12 - Desert Hauler", "truck"),
            sample_asset("a-2", "C19 - Mill Mountain", "truck"),
        ];

        let pairs = ShortCodeMatcher.pair(&telemetry, &assets);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].asset.id, "a-1");
        assert_eq!(pairs[1].asset.id, "a-2");
    }
}
