use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Irrigation treatment arm. Simulation filenames carry the lower-case code
/// (`ww`/`wl`); workbook sheet names carry the upper-case form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Treatment {
    WellWatered,
    WaterLimited,
}

impl Treatment {
    pub fn parse(s: &str) -> Option<Treatment> {
        match s.trim().to_lowercase().as_str() {
            "ww" => Some(Treatment::WellWatered),
            "wl" => Some(Treatment::WaterLimited),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Treatment::WellWatered => "ww",
            Treatment::WaterLimited => "wl",
        }
    }

    pub fn sheet_code(&self) -> &'static str {
        match self {
            Treatment::WellWatered => "WW",
            Treatment::WaterLimited => "WL",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Treatment::WellWatered => "Well Watered",
            Treatment::WaterLimited => "Water Limited",
        }
    }
}

impl fmt::Display for Treatment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The (genotype, treatment) pair a simulation file encodes in its name.
/// Parsed once at discovery time and used as the join key against the
/// measurement source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesKey {
    pub genotype: String,
    pub treatment: Treatment,
}

impl SeriesKey {
    pub fn new(genotype: impl Into<String>, treatment: Treatment) -> Self {
        Self {
            genotype: genotype.into(),
            treatment,
        }
    }

    /// Workbook sheet name derived from the key, e.g. `UGA230_WW`.
    pub fn sheet_name(&self) -> String {
        format!("{}_{}", self.genotype, self.treatment.sheet_code())
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.genotype, self.treatment)
    }
}

/// One row of a simulated output table, after header promotion and token
/// parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRecord {
    pub day_of_year: u32,
    pub date: NaiveDate,
    pub lai: f64,
    pub t_shaded: f64,
    pub t_sunlit: f64,
}

impl SimulationRecord {
    /// Single canopy temperature: arithmetic mean of the shaded and sunlit
    /// readings.
    pub fn canopy_temp(&self) -> f64 {
        (self.t_shaded + self.t_sunlit) / 2.0
    }
}

/// One row of a field-measurement table after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    pub date: NaiveDate,
    pub genotype: String,
    pub treatment: Treatment,
    pub value: f64,
    pub position: Option<String>,
}

/// One aggregated day of a series. `std_dev` is the sample standard
/// deviation and is absent when fewer than two observations back the day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub mean: f64,
    pub std_dev: Option<f64>,
}

/// Daily aggregation of one (genotype, treatment) series. Sorted ascending
/// by date with at most one point per date, by construction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DailySeries {
    points: Vec<DailyPoint>,
}

impl DailySeries {
    /// Group raw (date, value) observations by date and reduce each group to
    /// its mean (and, when `with_std` is set, its sample standard deviation).
    pub fn from_values(values: impl IntoIterator<Item = (NaiveDate, f64)>, with_std: bool) -> Self {
        let mut groups: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        for (date, value) in values {
            groups.entry(date).or_default().push(value);
        }
        let points = groups
            .into_iter()
            .map(|(date, group)| DailyPoint {
                date,
                mean: mean(&group),
                std_dev: if with_std { sample_std_dev(&group) } else { None },
            })
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[DailyPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Drop every day whose mean is at or below `floor`. Readings down there
    /// are logging artifacts, not physical temperatures.
    pub fn retain_above(&mut self, floor: f64) {
        self.points.retain(|p| p.mean > floor);
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date)),
            _ => None,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n − 1 denominator); `None` below two samples.
fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 7, day).unwrap()
    }

    #[test]
    fn treatment_codes_round_trip() {
        assert_eq!(Treatment::parse("ww"), Some(Treatment::WellWatered));
        assert_eq!(Treatment::parse("WL"), Some(Treatment::WaterLimited));
        assert_eq!(Treatment::parse("dry"), None);
        assert_eq!(Treatment::WellWatered.sheet_code(), "WW");
    }

    #[test]
    fn sheet_name_derives_from_key() {
        let key = SeriesKey::new("UGA230", Treatment::WellWatered);
        assert_eq!(key.sheet_name(), "UGA230_WW");
    }

    #[test]
    fn same_date_values_reduce_to_mean() {
        let series = DailySeries::from_values([(d(1), 2.0), (d(1), 3.0)], false);
        assert_eq!(series.len(), 1);
        assert_relative_eq!(series.points()[0].mean, 2.5);
        assert_eq!(series.points()[0].std_dev, None);
    }

    #[test]
    fn sample_std_dev_of_three_values() {
        let series = DailySeries::from_values([(d(1), 1.0), (d(1), 2.0), (d(1), 3.0)], true);
        assert_relative_eq!(series.points()[0].std_dev.unwrap(), 1.0);
    }

    #[test]
    fn single_observation_has_no_std_dev() {
        let series = DailySeries::from_values([(d(1), 4.2)], true);
        assert_eq!(series.points()[0].std_dev, None);
    }

    #[test]
    fn dates_are_strictly_increasing_and_unique() {
        let series = DailySeries::from_values(
            [(d(3), 1.0), (d(1), 2.0), (d(2), 3.0), (d(1), 4.0)],
            false,
        );
        let dates: Vec<_> = series.points().iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![d(1), d(2), d(3)]);
    }

    #[test]
    fn floor_drops_at_or_below_and_keeps_above() {
        let mut series = DailySeries::from_values(
            [(d(1), -15.0), (d(2), -10.0), (d(3), -9.9), (d(4), 25.0)],
            false,
        );
        series.retain_above(-10.0);
        let means: Vec<_> = series.points().iter().map(|p| p.mean).collect();
        assert_eq!(means, vec![-9.9, 25.0]);
    }

    #[test]
    fn aggregation_is_deterministic() {
        let values = [(d(2), 1.5), (d(1), 2.5), (d(2), 3.5)];
        let a = DailySeries::from_values(values, true);
        let b = DailySeries::from_values(values, true);
        assert_eq!(a, b);
    }
}
