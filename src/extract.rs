use crate::data_models::DailySeries;
use crate::discovery::SimFile;
use crate::errors::PipelineError;
use crate::measurements::MeasurementSource;
use crate::metric::Metric;
use crate::parsers::sim_parser::parse_sim_file;
use crate::validation::{validate_floor, validate_series};
use log::warn;

/// Extract the simulated and measured daily series for one simulation file.
///
/// The two series are returned un-joined: they align only by shared date
/// values at render time, and a date covered by one side but not the other
/// simply leaves a gap in that side's line or markers.
///
/// A parse failure aborts this file (the caller logs and moves on to the
/// rest of the set); a key with no measurements yields an empty measured
/// series so the panel still renders the simulated data.
pub fn extract(
    sim_file: &SimFile,
    source: &dyn MeasurementSource,
    metric: Metric,
    reference_year: i32,
) -> Result<(DailySeries, DailySeries), PipelineError> {
    let records = parse_sim_file(&sim_file.path, reference_year)
        .map_err(|e| PipelineError::Parse(e, sim_file.path.clone()))?;
    crate::metrics::METRICS
        .lock()
        .record_simulated_records(records.len() as u64);

    let mut simulated = DailySeries::from_values(
        records.iter().map(|r| (r.date, metric.derived_value(r))),
        false,
    );
    if let Some(floor) = metric.spec().daily_floor {
        simulated.retain_above(floor);
        if let Err(message) = validate_floor(&simulated, floor) {
            warn!(
                "Simulated series for {} violates the artifact floor: {}",
                sim_file.key, message
            );
        }
    }

    let measured = match source.daily_series(&sim_file.key) {
        Ok(series) => series,
        Err(e) if e.is_missing_measurement() => {
            warn!(
                "{}; panel for {} renders simulated data only",
                e, sim_file.key
            );
            DailySeries::default()
        }
        Err(e) => return Err(e),
    };

    if let Err(message) = validate_series(&simulated) {
        warn!(
            "Simulated series for {} failed validation: {}",
            sim_file.key, message
        );
    }
    if let Err(message) = validate_series(&measured) {
        warn!(
            "Measured series for {} failed validation: {}",
            sim_file.key, message
        );
    }

    Ok((simulated, measured))
}
