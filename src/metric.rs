use crate::data_models::SimulationRecord;
use clap::ValueEnum;

/// Which simulated-vs-measured comparison to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Metric {
    /// Leaf area index against the flat measurement CSV.
    Lai,
    /// Canopy temperature against the per-sheet workbook exports.
    CanopyTemp,
}

/// Per-metric configuration: how the per-row value derives from a
/// simulation record, which daily means are artifacts, and how the panels
/// are labelled and bounded.
#[derive(Debug, Clone, Copy)]
pub struct MetricSpec {
    pub name: &'static str,
    pub axis_label: &'static str,
    pub simulated_label: &'static str,
    pub measured_label: &'static str,
    /// Fixed panel y-range shared by every subplot.
    pub y_range: (f64, f64),
    /// Daily means at or below this are dropped from the simulated series.
    pub daily_floor: Option<f64>,
    /// Whether measured days carry a sample standard deviation (error bars).
    pub measured_std: bool,
}

const LAI_SPEC: MetricSpec = MetricSpec {
    name: "lai",
    axis_label: "LAI (Leaf Area Index)",
    simulated_label: "Simulated LAI",
    measured_label: "Measured LAI",
    y_range: (0.5, 6.8),
    daily_floor: None,
    measured_std: true,
};

const CANOPY_TEMP_SPEC: MetricSpec = MetricSpec {
    name: "canopy-temp",
    axis_label: "Canopy Temp",
    simulated_label: "Simulated Canopy Temperature",
    measured_label: "Measured Canopy Temperature",
    y_range: (20.0, 42.0),
    daily_floor: Some(-10.0),
    measured_std: false,
};

impl Metric {
    pub fn spec(&self) -> &'static MetricSpec {
        match self {
            Metric::Lai => &LAI_SPEC,
            Metric::CanopyTemp => &CANOPY_TEMP_SPEC,
        }
    }

    /// Per-row derived value fed into the daily aggregation.
    pub fn derived_value(&self, record: &SimulationRecord) -> f64 {
        match self {
            Metric::Lai => record.lai,
            Metric::CanopyTemp => record.canopy_temp(),
        }
    }

    /// Simulation files known to be bad for this comparison, skipped by
    /// default on top of any user-supplied exclusions.
    pub fn default_exclusions(&self) -> &'static [&'static str] {
        match self {
            Metric::Lai => &[],
            Metric::CanopyTemp => &[
                "cotton_avg_soil_geno_VC_DeltaPine16_wl.sim",
                "cotton_avg_soil_geno_VC_DeltaPine16_ww.sim",
                "cotton_avg_soil_geno_VC_Virescentnankeen_wl.sim",
                "cotton_avg_soil_geno_VC_Virescentnankeen_ww.sim",
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn canopy_temp_is_mean_of_shaded_and_sunlit() {
        let record = SimulationRecord {
            day_of_year: 180,
            date: NaiveDate::from_ymd_opt(2023, 6, 29).unwrap(),
            lai: 3.1,
            t_shaded: 28.0,
            t_sunlit: 34.0,
        };
        assert_eq!(Metric::CanopyTemp.derived_value(&record), 31.0);
        assert_eq!(Metric::Lai.derived_value(&record), 3.1);
    }

    #[test]
    fn only_canopy_temp_has_a_floor() {
        assert_eq!(Metric::Lai.spec().daily_floor, None);
        assert_eq!(Metric::CanopyTemp.spec().daily_floor, Some(-10.0));
    }
}
