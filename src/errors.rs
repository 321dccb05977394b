use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error reading data file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Error reading CSV record in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Filename '{name}' does not match the *_VC_<genotype>_<treatment>{suffix} pattern")]
    MalformedFilename { name: String, suffix: String },
    #[error("Simulation table {path} has no header row to promote")]
    EmptyTable { path: PathBuf },
    #[error("Required column '{column}' not found in {path}")]
    MissingColumn { path: PathBuf, column: String },
    #[error("Malformed day-index token '{token}' in {path} at row {row}: {message}")]
    DayToken {
        path: PathBuf,
        row: usize,
        token: String,
        message: String,
    },
    #[error("Timestamp parsing error in {path} at row {row} for value '{value}': {message}")]
    Timestamp {
        path: PathBuf,
        row: usize,
        value: String,
        message: String,
    },
    #[error("Float parse failed for column '{column}' ('{value}') in {path} at row {row}")]
    Float {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration loading failed: {0}")]
    Config(String),
    #[error("Failed to parse run config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to scan working directory {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Parsing failed for {1}: {0}")]
    Parse(ParseError, PathBuf),
    #[error("No measurements for genotype '{genotype}' treatment '{treatment}' in {source_name}")]
    MissingMeasurementMatch {
        genotype: String,
        treatment: String,
        source_name: String,
    },
    #[error("No comparison series could be extracted from {dir}")]
    NoSeriesExtracted { dir: PathBuf },
    #[error("Figure rendering failed: {0}")]
    Render(String),
}

impl PipelineError {
    /// Missing-measurement failures render an empty panel; everything else
    /// aborts the file they belong to.
    pub fn is_missing_measurement(&self) -> bool {
        matches!(self, PipelineError::MissingMeasurementMatch { .. })
    }
}
