use crate::data_models::{SeriesKey, Treatment};
use crate::errors::{ParseError, PipelineError};
use log::{info, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A discovered simulation file with its key parsed out of the filename.
/// The pattern is parsed exactly once, here; nothing downstream re-matches
/// the filename.
#[derive(Debug, Clone)]
pub struct SimFile {
    pub path: PathBuf,
    pub key: SeriesKey,
}

/// Parse a simulation filename of the form
/// `*_VC_<genotype>_<treatment><suffix>` into its key.
pub fn parse_sim_filename(name: &str, suffix: &str) -> Result<SeriesKey, ParseError> {
    let malformed = || ParseError::MalformedFilename {
        name: name.to_string(),
        suffix: suffix.to_string(),
    };
    let stem = name.strip_suffix(suffix).ok_or_else(malformed)?;
    let (_, rest) = stem.split_once("_VC_").ok_or_else(malformed)?;
    let (genotype, treatment) = rest.split_once('_').ok_or_else(malformed)?;
    if genotype.is_empty() {
        return Err(malformed());
    }
    let treatment = Treatment::parse(treatment).ok_or_else(malformed)?;
    Ok(SeriesKey::new(genotype, treatment))
}

/// Scan `dir` for simulation files, skip the exclusion list, parse each
/// filename key, and order the result well-watered first, then
/// water-limited (stable within each arm).
///
/// Files whose names do not match the pattern are logged and skipped; the
/// rest of the set still processes.
pub fn discover(dir: &Path, suffix: &str, exclude: &[String]) -> Result<Vec<SimFile>, PipelineError> {
    let mut matched: Vec<SimFile> = Vec::new();

    for entry in WalkDir::new(dir).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| PipelineError::Scan {
            path: dir.to_path_buf(),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.ends_with(suffix) {
            continue;
        }
        if exclude.iter().any(|excluded| excluded == &name) {
            info!("Skipping excluded simulation file {}", name);
            continue;
        }
        match parse_sim_filename(&name, suffix) {
            Ok(key) => matched.push(SimFile {
                path: entry.into_path(),
                key,
            }),
            Err(e) => {
                warn!("Skipping unparseable simulation file: {}", e);
                crate::metrics::METRICS.lock().record_file_failure();
            }
        }
    }

    // Well-watered panels fill the top row, so their files go first.
    let (ww, wl): (Vec<SimFile>, Vec<SimFile>) = matched
        .into_iter()
        .partition(|f| f.key.treatment == Treatment::WellWatered);
    let mut ordered = ww;
    ordered.extend(wl);

    info!(
        "Discovered {} simulation files in {}",
        ordered.len(),
        dir.display()
    );
    Ok(ordered)
}
