//! The reconciliation engine.
//!
//! For each matched telemetry/asset pair: convert the odometer reading to
//! miles, fetch the asset's current meter state fresh from the directory,
//! decide between no-op, append-reading, and create-meter, and issue the
//! corresponding writes. Per-item failures are logged and counted; they
//! never abort the run.

use crate::matcher::MatchedPair;
use crate::units::km_to_miles;
use chrono::{DateTime, Utc};
use fleetsync_connectors::{AssetDirectory, GeoPosition, MeterState};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// What to do for one asset this run. Computed per asset per run; never
/// stored.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconciliationDecision {
    /// No write needed.
    Skip { reason: &'static str },
    /// Append a reading to the existing meter and update the asset's
    /// position.
    AppendReading {
        meter_id: String,
        value_miles: f64,
        position: Option<GeoPosition>,
    },
    /// Bootstrap a meter on an asset that has none yet.
    CreateMeter { asset_id: String, value_miles: f64 },
}

/// Decides the action for one asset given its freshly fetched meter state.
///
/// The stored-value comparison is exact: the stored value was produced by
/// the same [`km_to_miles`] conversion on a previous run, so "no movement"
/// reproduces bit-identical values.
pub fn decide(
    asset_id: &str,
    meter: Option<&MeterState>,
    odometer_km: f64,
    position: Option<GeoPosition>,
) -> ReconciliationDecision {
    let value_miles = km_to_miles(odometer_km);

    match meter {
        None => ReconciliationDecision::CreateMeter {
            asset_id: asset_id.to_string(),
            value_miles,
        },
        Some(m) if m.current_value_miles == value_miles => ReconciliationDecision::Skip {
            reason: "no movement since last run",
        },
        Some(m) => ReconciliationDecision::AppendReading {
            meter_id: m.meter_id.clone(),
            value_miles,
            position,
        },
    }
}

/// Outcome counts for one reconciliation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileSummary {
    /// Matched pairs processed.
    pub matched: u64,
    /// Assets skipped because the stored value already matched.
    pub skipped: u64,
    /// Readings appended to existing meters.
    pub readings_appended: u64,
    /// Meters bootstrapped on meterless assets.
    pub meters_created: u64,
    /// Per-asset meter-state fetches that failed (asset abandoned).
    pub fetch_errors: u64,
    /// Writes that failed (logged, not retried).
    pub write_errors: u64,
    /// When the run completed.
    pub completed_at: DateTime<Utc>,
}

impl ReconcileSummary {
    fn new() -> Self {
        Self {
            matched: 0,
            skipped: 0,
            readings_appended: 0,
            meters_created: 0,
            fetch_errors: 0,
            write_errors: 0,
            completed_at: Utc::now(),
        }
    }

    /// Whether the run finished without any per-item failures.
    pub fn is_clean(&self) -> bool {
        self.fetch_errors == 0 && self.write_errors == 0
    }
}

/// Drives reconciliation against an asset directory, one asset at a time.
pub struct ReconciliationEngine<'a> {
    directory: &'a dyn AssetDirectory,
}

impl<'a> ReconciliationEngine<'a> {
    pub fn new(directory: &'a dyn AssetDirectory) -> Self {
        Self { directory }
    }

    /// Reconciles every matched pair sequentially.
    ///
    /// A failed meter-state fetch abandons that one asset; a failed write
    /// is logged with the asset's description and counted. Either way the
    /// run continues with the next asset.
    pub async fn run(&self, pairs: &[MatchedPair<'_>]) -> ReconcileSummary {
        let mut summary = ReconcileSummary::new();

        for pair in pairs {
            summary.matched += 1;

            // The listing snapshot never carries meter state, so a fresh
            // detail read is required per asset.
            let meter = match self.directory.fetch_meter_state(&pair.asset.id).await {
                Ok(meter) => meter,
                Err(e) => {
                    warn!(
                        asset = %pair.asset.description,
                        error = %e,
                        "meter state fetch failed, abandoning asset"
                    );
                    summary.fetch_errors += 1;
                    continue;
                }
            };

            // Matched pairs always carry an odometer value.
            let Some(odometer_km) = pair.telemetry.odometer_km else {
                continue;
            };

            let decision = decide(
                &pair.asset.id,
                meter.as_ref(),
                odometer_km,
                pair.telemetry.position,
            );
            self.apply(pair, decision, &mut summary).await;
        }

        summary.completed_at = Utc::now();
        info!(
            matched = summary.matched,
            skipped = summary.skipped,
            readings_appended = summary.readings_appended,
            meters_created = summary.meters_created,
            fetch_errors = summary.fetch_errors,
            write_errors = summary.write_errors,
            "reconciliation run complete"
        );
        summary
    }

    async fn apply(
        &self,
        pair: &MatchedPair<'_>,
        decision: ReconciliationDecision,
        summary: &mut ReconcileSummary,
    ) {
        match decision {
            ReconciliationDecision::Skip { reason } => {
                info!(asset = %pair.asset.description, reason, "skipped");
                summary.skipped += 1;
            }

            ReconciliationDecision::CreateMeter {
                asset_id,
                value_miles,
            } => {
                match self
                    .directory
                    .create_meter(&asset_id, &pair.asset.description, value_miles)
                    .await
                {
                    Ok(()) => {
                        info!(
                            asset = %pair.asset.description,
                            value_miles,
                            "meter created"
                        );
                        summary.meters_created += 1;
                    }
                    Err(e) => {
                        warn!(
                            asset = %pair.asset.description,
                            error = %e,
                            "meter creation failed"
                        );
                        summary.write_errors += 1;
                    }
                }
            }

            ReconciliationDecision::AppendReading {
                meter_id,
                value_miles,
                position,
            } => {
                // Two independent, non-transactional writes. One may
                // succeed while the other fails; both outcomes are logged
                // and the asset is left in a valid (if inconsistent)
                // state. No retry.
                match self
                    .directory
                    .append_reading(&pair.asset.id, &meter_id, value_miles)
                    .await
                {
                    Ok(()) => {
                        info!(
                            asset = %pair.asset.description,
                            value_miles,
                            "reading appended"
                        );
                        summary.readings_appended += 1;
                    }
                    Err(e) => {
                        warn!(
                            asset = %pair.asset.description,
                            error = %e,
                            "reading append failed"
                        );
                        summary.write_errors += 1;
                    }
                }

                if let Some(position) = position {
                    if let Err(e) = self
                        .directory
                        .update_geolocation(&pair.asset.id, &position)
                        .await
                    {
                        warn!(
                            asset = %pair.asset.description,
                            error = %e,
                            "geolocation update failed"
                        );
                        summary.write_errors += 1;
                    }
                }
            }
        }
    }
}
