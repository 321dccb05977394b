use crate::data_models::{DailySeries, MeasurementRecord, SeriesKey, Treatment};
use crate::errors::{ParseError, PipelineError};
use crate::parsers::measurement_parser::{parse_canopy_sheet, parse_lai_csv};
use crate::utils::{normalize_genotype, parse_measurement_date};
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// A source of measured daily series, keyed by (genotype, treatment).
/// A key with no measurements yields `MissingMeasurementMatch`, which the
/// caller renders as an empty panel rather than a failure.
pub trait MeasurementSource: Sync {
    fn daily_series(&self, key: &SeriesKey) -> Result<DailySeries, PipelineError>;
    fn name(&self) -> &str;
}

/// The flat LAI measurement CSV, loaded and normalized once. Rows taken at
/// the "Top" sensor position are not representative ground truth and never
/// enter any series.
pub struct LaiCsv {
    source_name: String,
    records: Vec<MeasurementRecord>,
}

impl LaiCsv {
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let rows = parse_lai_csv(path)
            .map_err(|e| PipelineError::Parse(e, path.to_path_buf()))?;

        let mut records = Vec::new();
        for (row_index, row) in rows.into_iter().enumerate() {
            let file_row_num = row_index + 2;
            if row.position.as_deref() == Some("Top") {
                continue;
            }
            let Some(value) = row.lai else {
                continue;
            };
            let Some(treatment) = Treatment::parse(&row.treatment) else {
                warn!(
                    "Unrecognized treatment '{}' in {} at row {}; row skipped",
                    row.treatment,
                    path.display(),
                    file_row_num
                );
                continue;
            };
            let date = parse_measurement_date(&row.date_time)
                .map_err(|message| {
                    PipelineError::Parse(
                        ParseError::Timestamp {
                            path: path.to_path_buf(),
                            row: file_row_num,
                            value: row.date_time.clone(),
                            message,
                        },
                        path.to_path_buf(),
                    )
                })?;
            records.push(MeasurementRecord {
                date,
                genotype: normalize_genotype(&row.entry),
                treatment,
                value,
                position: row.position,
            });
        }
        crate::metrics::METRICS
            .lock()
            .record_measured_records(records.len() as u64);
        debug!(
            "Loaded {} usable LAI measurement rows from {}",
            records.len(),
            path.display()
        );

        Ok(Self {
            source_name: path.display().to_string(),
            records,
        })
    }
}

impl MeasurementSource for LaiCsv {
    fn daily_series(&self, key: &SeriesKey) -> Result<DailySeries, PipelineError> {
        let values: Vec<_> = self
            .records
            .iter()
            .filter(|r| r.genotype == key.genotype && r.treatment == key.treatment)
            .map(|r| (r.date, r.value))
            .collect();
        if values.is_empty() {
            return Err(PipelineError::MissingMeasurementMatch {
                genotype: key.genotype.clone(),
                treatment: key.treatment.code().to_string(),
                source_name: self.source_name.clone(),
            });
        }
        Ok(DailySeries::from_values(values, true))
    }

    fn name(&self) -> &str {
        &self.source_name
    }
}

/// The canopy-temperature workbook, consumed as a directory of per-sheet
/// CSV exports named `<genotype>_<TREATMENT>.csv`. Sheets are read on
/// demand, one per key.
pub struct TemperatureWorkbook {
    dir: PathBuf,
    source_name: String,
}

impl TemperatureWorkbook {
    pub fn open(dir: &Path) -> Result<Self, PipelineError> {
        if !dir.is_dir() {
            return Err(PipelineError::Config(format!(
                "workbook sheet directory not found at {}",
                dir.display()
            )));
        }
        Ok(Self {
            dir: dir.to_path_buf(),
            source_name: dir.display().to_string(),
        })
    }

    fn sheet_path(&self, key: &SeriesKey) -> PathBuf {
        self.dir.join(format!("{}.csv", key.sheet_name()))
    }
}

impl MeasurementSource for TemperatureWorkbook {
    fn daily_series(&self, key: &SeriesKey) -> Result<DailySeries, PipelineError> {
        let path = self.sheet_path(key);
        if !path.is_file() {
            return Err(PipelineError::MissingMeasurementMatch {
                genotype: key.genotype.clone(),
                treatment: key.treatment.code().to_string(),
                source_name: self.source_name.clone(),
            });
        }
        let readings =
            parse_canopy_sheet(&path).map_err(|e| PipelineError::Parse(e, path.clone()))?;
        crate::metrics::METRICS
            .lock()
            .record_measured_records(readings.len() as u64);
        Ok(DailySeries::from_values(readings, false))
    }

    fn name(&self) -> &str {
        &self.source_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;

    const LAI_CSV: &str = "\
Entry,Treatment,Date and Time,Position,Leaf Area Index [LAI]
Tipo Chaco,WW,2023-07-01 09:15:00,Bottom,1.0
Tipo Chaco,WW,2023-07-01 09:20:00,Middle,2.0
Tipo Chaco,WW,2023-07-01 09:25:00,Top,9.0
Tipo Chaco,WW,2023-07-01 09:30:00,Bottom,3.0
Tipo Chaco,WL,2023-07-01 11:00:00,Bottom,0.8
Pronto,WW,2023-07-03 09:00:00,Bottom,2.2
";

    fn lai_fixture() -> (tempfile::NamedTempFile, LaiCsv) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(LAI_CSV.as_bytes()).unwrap();
        let source = LaiCsv::load(file.path()).unwrap();
        (file, source)
    }

    #[test]
    fn top_position_rows_never_contribute() {
        let (_file, source) = lai_fixture();
        let key = SeriesKey::new("TipoChaco", Treatment::WellWatered);
        let series = source.daily_series(&key).unwrap();
        assert_eq!(series.len(), 1);
        // Mean of 1.0, 2.0, 3.0 -- the Top row's 9.0 is excluded.
        assert_eq!(series.points()[0].mean, 2.0);
        assert_eq!(series.points()[0].std_dev, Some(1.0));
    }

    #[test]
    fn series_are_scoped_to_one_key() {
        let (_file, source) = lai_fixture();
        let wl = source
            .daily_series(&SeriesKey::new("TipoChaco", Treatment::WaterLimited))
            .unwrap();
        assert_eq!(wl.len(), 1);
        assert_eq!(wl.points()[0].mean, 0.8);
    }

    #[test]
    fn absent_key_is_missing_measurement_match() {
        let (_file, source) = lai_fixture();
        let err = source
            .daily_series(&SeriesKey::new("Coker310", Treatment::WellWatered))
            .unwrap_err();
        assert!(err.is_missing_measurement());
    }

    #[test]
    fn genotype_names_normalize_to_the_simulation_spelling() {
        let (_file, source) = lai_fixture();
        // "Tipo Chaco" in the CSV is addressable as "TipoChaco".
        assert!(source
            .daily_series(&SeriesKey::new("TipoChaco", Treatment::WellWatered))
            .is_ok());
        assert!(source
            .daily_series(&SeriesKey::new("Tipo Chaco", Treatment::WellWatered))
            .is_err());
    }

    #[test]
    fn workbook_selects_sheet_by_derived_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("UGA230_WW.csv"),
            "date_time,canopy_temp\n\
             2023-07-01 12:00:00,30.0\n\
             2023-07-01 14:00:00,34.0\n\
             2023-07-02 12:00:00,29.0\n",
        )
        .unwrap();
        let workbook = TemperatureWorkbook::open(dir.path()).unwrap();
        let series = workbook
            .daily_series(&SeriesKey::new("UGA230", Treatment::WellWatered))
            .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.points()[0].mean, 32.0);
        assert_eq!(series.points()[0].std_dev, None);
    }

    #[test]
    fn missing_sheet_is_missing_measurement_match() {
        let dir = tempfile::tempdir().unwrap();
        let workbook = TemperatureWorkbook::open(dir.path()).unwrap();
        let err = workbook
            .daily_series(&SeriesKey::new("UGA230", Treatment::WaterLimited))
            .unwrap_err();
        assert!(err.is_missing_measurement());
    }
}
