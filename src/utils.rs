use chrono::NaiveDate;

/// Fixed genotype spelling corrections applied to the measurement source so
/// its entries match the names embedded in simulation filenames.
pub const GENOTYPE_REPLACEMENTS: &[(&str, &str)] = &[
    ("UGA230", "UGA230"),
    ("Pronto", "Pronto"),
    ("Tipo Chaco", "TipoChaco"),
    ("Virescent nankeen", "Virescentnankeen"),
    ("Coker 310", "Coker310"),
    ("DeltaPine 16", "DeltaPine16"),
];

/// Normalize a genotype name for use as a join key: apply the fixed lookup
/// table, otherwise collapse and drop all whitespace. Idempotent.
pub fn normalize_genotype(name: &str) -> String {
    let trimmed = name.trim();
    for (from, to) in GENOTYPE_REPLACEMENTS {
        if trimmed == *from {
            return (*to).to_string();
        }
    }
    trimmed.split_whitespace().collect::<Vec<_>>().concat()
}

/// Extract the day-of-year from a simulated day-index token of the form
/// `<prefix>:<day-of-year>`.
pub fn day_of_year_from_token(token: &str) -> Result<u32, String> {
    let field = token
        .split(':')
        .nth(1)
        .ok_or_else(|| format!("token '{}' has no ':'-separated day field", token))?;
    field
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("day field '{}' is not an integer: {}", field, e))
}

/// Combine a reference year with a day-of-year into a calendar date.
pub fn date_from_doy(year: i32, doy: u32) -> Result<NaiveDate, String> {
    NaiveDate::from_yo_opt(year, doy)
        .ok_or_else(|| format!("day-of-year {} is out of range for year {}", doy, year))
}

const MEASUREMENT_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const MEASUREMENT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Parse a field-logger timestamp and reduce it to its calendar date.
/// The loggers are not consistent about the format, so a small set of
/// known layouts is tried in order.
pub fn parse_measurement_date(value: &str) -> Result<NaiveDate, String> {
    let trimmed = value.trim();
    for format in MEASUREMENT_DATETIME_FORMATS {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(dt.date());
        }
    }
    for format in MEASUREMENT_DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(d);
        }
    }
    Err(format!(
        "timestamp '{}' does not match any known measurement format",
        trimmed
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genotype_lookup_table_is_total() {
        for (from, to) in GENOTYPE_REPLACEMENTS {
            assert_eq!(normalize_genotype(from), *to);
        }
    }

    #[test]
    fn genotype_normalization_is_idempotent() {
        for (from, _) in GENOTYPE_REPLACEMENTS {
            let once = normalize_genotype(from);
            assert_eq!(normalize_genotype(&once), once);
        }
        let once = normalize_genotype("  Some   Unlisted  Name ");
        assert_eq!(once, "SomeUnlistedName");
        assert_eq!(normalize_genotype(&once), once);
    }

    #[test]
    fn day_token_second_field_is_used() {
        assert_eq!(day_of_year_from_token("1:180").unwrap(), 180);
        assert_eq!(day_of_year_from_token("run2:33:extra").unwrap(), 33);
        assert!(day_of_year_from_token("180").is_err());
        assert!(day_of_year_from_token("1:abc").is_err());
    }

    #[test]
    fn doy_combines_with_reference_year() {
        assert_eq!(
            date_from_doy(2023, 180).unwrap(),
            NaiveDate::from_ymd_opt(2023, 6, 29).unwrap()
        );
        assert!(date_from_doy(2023, 366).is_err());
        assert!(date_from_doy(2024, 366).is_ok());
    }

    #[test]
    fn measurement_timestamps_reduce_to_dates() {
        let expected = NaiveDate::from_ymd_opt(2022, 7, 14).unwrap();
        assert_eq!(parse_measurement_date("2022-07-14 10:30:00").unwrap(), expected);
        assert_eq!(parse_measurement_date("07/14/2022 10:30").unwrap(), expected);
        assert_eq!(parse_measurement_date("2022-07-14").unwrap(), expected);
        assert!(parse_measurement_date("not a date").is_err());
    }
}
