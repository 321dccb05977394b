use crate::errors::ParseError;
use crate::utils::parse_measurement_date;
use chrono::NaiveDate;
use csv::ReaderBuilder;
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

/// Raw row of the flat LAI measurement CSV. Column names are taken verbatim
/// from the field-survey export.
#[derive(Debug, Deserialize)]
pub struct LaiCsvRow {
    #[serde(rename = "Entry")]
    pub entry: String,
    #[serde(rename = "Treatment")]
    pub treatment: String,
    #[serde(rename = "Date and Time")]
    pub date_time: String,
    #[serde(rename = "Position")]
    pub position: Option<String>,
    #[serde(rename = "Leaf Area Index [LAI]")]
    pub lai: Option<f64>,
}

/// Raw row of one exported canopy-temperature workbook sheet.
#[derive(Debug, Deserialize)]
pub struct CanopyTempRow {
    pub date_time: String,
    pub canopy_temp: Option<f64>,
}

/// Read the LAI measurement CSV into raw rows. Normalization (genotype
/// lookup, treatment casing, position filter) happens in the measurement
/// source, not here.
pub fn parse_lai_csv(path: &Path) -> Result<Vec<LaiCsvRow>, ParseError> {
    let file = File::open(path).map_err(|e| ParseError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
    let mut rows = Vec::new();
    for result in reader.deserialize::<LaiCsvRow>() {
        let row = result.map_err(|e| ParseError::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Read one workbook sheet export into (date, reading) pairs. Rows without
/// a reading are dropped; a bad timestamp is a malformed-input error for
/// the sheet.
pub fn parse_canopy_sheet(path: &Path) -> Result<Vec<(NaiveDate, f64)>, ParseError> {
    let file = File::open(path).map_err(|e| ParseError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
    let mut readings = Vec::new();
    for (row_index, result) in reader.deserialize::<CanopyTempRow>().enumerate() {
        let file_row_num = row_index + 2;
        let row = result.map_err(|e| ParseError::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;
        let Some(value) = row.canopy_temp else {
            continue;
        };
        let date = parse_measurement_date(&row.date_time).map_err(|message| {
            ParseError::Timestamp {
                path: path.to_path_buf(),
                row: file_row_num,
                value: row.date_time.clone(),
                message,
            }
        })?;
        readings.push((date, value));
    }
    Ok(readings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn lai_csv_columns_deserialize_by_header_name() {
        let file = write_csv(
            "Entry,Treatment,Date and Time,Position,Leaf Area Index [LAI]\n\
             Tipo Chaco,WW,2023-07-01 09:15:00,Bottom,2.4\n\
             Tipo Chaco,WW,2023-07-01 09:20:00,Top,5.0\n\
             Pronto,WL,2023-07-02 10:00:00,,\n",
        );
        let rows = parse_lai_csv(file.path()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].entry, "Tipo Chaco");
        assert_eq!(rows[1].position.as_deref(), Some("Top"));
        assert_eq!(rows[2].lai, None);
    }

    #[test]
    fn canopy_sheet_drops_empty_readings() {
        let file = write_csv(
            "date_time,canopy_temp\n\
             2023-07-01 12:00:00,31.5\n\
             2023-07-01 13:00:00,\n\
             2023-07-02 12:00:00,33.0\n",
        );
        let readings = parse_canopy_sheet(file.path()).unwrap();
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].1, 31.5);
    }

    #[test]
    fn bad_sheet_timestamp_is_malformed_input() {
        let file = write_csv("date_time,canopy_temp\nnot-a-time,31.5\n");
        assert!(matches!(
            parse_canopy_sheet(file.path()),
            Err(ParseError::Timestamp { .. })
        ));
    }
}
