//! Distance unit conversion.

const KM_TO_MILES: f64 = 0.621371;

/// Converts kilometers to miles, rounded to 2 decimal places.
///
/// Rounding is half-away-from-zero (`f64::round` semantics): `62.145`
/// becomes `62.15`. The telemetry provider reports kilometers; the asset
/// directory stores meter values in miles, so every reading passes through
/// this exact conversion and comparisons against stored values stay exact.
pub fn km_to_miles(km: f64) -> f64 {
    (km * KM_TO_MILES * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_km_to_miles_reference_value() {
        assert_eq!(km_to_miles(100.0), 62.14);
    }

    #[test]
    fn test_km_to_miles_zero() {
        assert_eq!(km_to_miles(0.0), 0.0);
    }

    #[test]
    fn test_km_to_miles_rounds_to_two_places() {
        // 1 km = 0.621371 mi -> 0.62
        assert_eq!(km_to_miles(1.0), 0.62);
        // 3 km = 1.864113 mi -> 1.86
        assert_eq!(km_to_miles(3.0), 1.86);
    }

    #[test]
    fn test_km_to_miles_is_deterministic() {
        let a = km_to_miles(160934.4);
        let b = km_to_miles(160934.4);
        assert_eq!(a, b);
    }
}
