//! Post-extraction invariant checks on daily series.

use crate::data_models::DailySeries;

/// A valid series has strictly increasing, duplicate-free dates.
/// Construction guarantees this; the check exists so a future regression
/// surfaces as a logged violation instead of a silently wrong figure.
pub fn validate_series(series: &DailySeries) -> Result<(), String> {
    for pair in series.points().windows(2) {
        if pair[1].date <= pair[0].date {
            return Err(format!(
                "dates not strictly increasing: {} followed by {}",
                pair[0].date, pair[1].date
            ));
        }
    }
    Ok(())
}

/// Check that no daily mean sits at or below the artifact floor.
pub fn validate_floor(series: &DailySeries, floor: f64) -> Result<(), String> {
    for point in series.points() {
        if point.mean <= floor {
            return Err(format!(
                "daily mean {} on {} is at or below the floor {}",
                point.mean, point.date, floor
            ));
        }
    }
    Ok(())
}
