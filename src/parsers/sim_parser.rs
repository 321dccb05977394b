use crate::data_models::SimulationRecord;
use crate::errors::ParseError;
use crate::utils::{date_from_doy, day_of_year_from_token};
use csv::{ReaderBuilder, StringRecord};
use log::warn;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// Parse a tab-delimited simulation output table.
///
/// The writer of these files puts the column names in the first data row
/// rather than a real header row, so the first record is promoted to the
/// header and everything after it is data. Required columns: `ti`, `LAI`,
/// `Tshd`, `Tsun`. The `ti` token carries day-of-year as its second
/// colon-separated field, which combines with `reference_year` into a
/// calendar date.
pub fn parse_sim_file(
    path: &Path,
    reference_year: i32,
) -> Result<Vec<SimulationRecord>, ParseError> {
    let file = File::open(path).map_err(|e| ParseError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut records = reader.records();

    // --- Promote the first raw row to the header ---
    let header = match records.next() {
        Some(Ok(record)) => record,
        Some(Err(e)) => {
            return Err(ParseError::Csv {
                path: path.to_path_buf(),
                source: e,
            })
        }
        None => {
            return Err(ParseError::EmptyTable {
                path: path.to_path_buf(),
            })
        }
    };

    let mut header_map: HashMap<String, usize> = HashMap::new();
    for (index, name) in header.iter().enumerate() {
        header_map.insert(name.trim().to_string(), index);
    }
    let column_index = |column: &str| -> Result<usize, ParseError> {
        header_map
            .get(column)
            .copied()
            .ok_or_else(|| ParseError::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            })
    };
    let ti_index = column_index("ti")?;
    let lai_index = column_index("LAI")?;
    let tshd_index = column_index("Tshd")?;
    let tsun_index = column_index("Tsun")?;

    // --- Data row processing ---
    let mut parsed_records = Vec::new();
    for (row_index, result) in records.enumerate() {
        // Header occupied row 1 of the raw file.
        let file_row_num = row_index + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(
                    "Failed to read record at file row {} in {}: {}",
                    file_row_num,
                    path.display(),
                    e
                );
                continue;
            }
        };
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        let token = field(&record, ti_index).unwrap_or_default();
        let day_of_year = day_of_year_from_token(token).map_err(|message| ParseError::DayToken {
            path: path.to_path_buf(),
            row: file_row_num,
            token: token.to_string(),
            message,
        })?;
        let date =
            date_from_doy(reference_year, day_of_year).map_err(|message| ParseError::DayToken {
                path: path.to_path_buf(),
                row: file_row_num,
                token: token.to_string(),
                message,
            })?;

        parsed_records.push(SimulationRecord {
            day_of_year,
            date,
            lai: parse_float(&record, lai_index, "LAI", path, file_row_num)?,
            t_shaded: parse_float(&record, tshd_index, "Tshd", path, file_row_num)?,
            t_sunlit: parse_float(&record, tsun_index, "Tsun", path, file_row_num)?,
        });
    }

    Ok(parsed_records)
}

fn field<'r>(record: &'r StringRecord, index: usize) -> Option<&'r str> {
    record.get(index).map(str::trim)
}

fn parse_float(
    record: &StringRecord,
    index: usize,
    column: &str,
    path: &Path,
    row: usize,
) -> Result<f64, ParseError> {
    let raw = field(record, index).unwrap_or_default();
    raw.parse::<f64>().map_err(|_| ParseError::Float {
        path: path.to_path_buf(),
        row,
        column: column.to_string(),
        value: raw.to_string(),
    })
}
