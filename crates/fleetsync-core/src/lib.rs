//! # fleetsync-core
//!
//! Core reconciliation logic for fleetsync: telemetry-to-asset matching,
//! unit conversion, idempotent meter update decisioning, and the
//! nearest-facility terminal zone classifier.
//!
//! Network access is behind the connector traits from
//! `fleetsync-connectors`; everything here either is pure or drives those
//! traits strictly sequentially.

pub mod engine;
pub mod matcher;
pub mod units;
pub mod zones;

pub use engine::{ReconciliationDecision, ReconciliationEngine, ReconcileSummary};
pub use matcher::{MatchedPair, Matcher, ShortCodeMatcher};
pub use units::km_to_miles;
pub use zones::{nearest_zone, Facility, ZoneClassifier, ZoneSummary, FACILITIES};
