use crate::errors::PipelineError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Calendar year combined with simulated day-of-year values when no year is
/// given. Inherited approximation: the simulation tables carry no year at
/// all, so every run maps onto a single nominal season.
pub const DEFAULT_REFERENCE_YEAR: i32 = 2023;

/// Filename suffix that marks simulation output tables.
pub const DEFAULT_SIM_SUFFIX: &str = ".sim";

/// Optional run configuration loaded from a JSON file. Every field has a
/// default so a partial file is fine; command-line flags win on conflict.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RunConfig {
    #[serde(default = "default_suffix")]
    pub sim_suffix: String,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub reference_year: Option<i32>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            sim_suffix: default_suffix(),
            exclude: Vec::new(),
            reference_year: None,
        }
    }
}

fn default_suffix() -> String {
    DEFAULT_SIM_SUFFIX.to_string()
}

/// Load a run configuration from a JSON file.
pub fn load_run_config(path: &Path) -> Result<RunConfig, PipelineError> {
    if !path.exists() {
        return Err(PipelineError::Config(format!(
            "run config not found at {}",
            path.display()
        )));
    }
    let file = File::open(path).map_err(|e| {
        PipelineError::Config(format!("failed to open run config {}: {}", path.display(), e))
    })?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| PipelineError::ConfigParse {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_config_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"exclude": ["bad_file_VC_X_ww.sim"]}}"#).unwrap();
        let config = load_run_config(file.path()).unwrap();
        assert_eq!(config.sim_suffix, ".sim");
        assert_eq!(config.exclude, vec!["bad_file_VC_X_ww.sim".to_string()]);
        assert_eq!(config.reference_year, None);
    }

    #[test]
    fn missing_config_is_a_config_error() {
        let err = load_run_config(Path::new("/nonexistent/run.json")).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
