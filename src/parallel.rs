use crate::data_models::{DailySeries, SeriesKey};
use crate::discovery::SimFile;
use crate::extract;
use crate::measurements::MeasurementSource;
use crate::metric::Metric;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;

/// Result of extracting one simulation file: the series pair on success,
/// the error string otherwise. Either way the panel keeps its grid slot.
#[derive(Debug)]
pub struct PanelResult {
    pub key: SeriesKey,
    pub file_path: String,
    pub simulated: DailySeries,
    pub measured: DailySeries,
    pub error: Option<String>,
}

impl PanelResult {
    pub fn is_extracted(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-file extraction fan-out using Rayon. Iterations are independent, so
/// parallel execution changes nothing observable; results come back in
/// input order either way.
pub struct ExtractionRunner {
    num_workers: usize,
    sequential: bool,
}

impl ExtractionRunner {
    pub fn new() -> Self {
        let num_workers = num_cpus::get();
        info!("Initializing ExtractionRunner with {} workers", num_workers);
        Self {
            num_workers,
            sequential: false,
        }
    }

    pub fn sequential() -> Self {
        info!("Initializing sequential ExtractionRunner");
        Self {
            num_workers: 1,
            sequential: true,
        }
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    pub fn run(
        &self,
        files: &[SimFile],
        source: &dyn MeasurementSource,
        metric: Metric,
        reference_year: i32,
    ) -> Vec<PanelResult> {
        let total_files = files.len();
        info!("Starting extraction of {} files", total_files);

        let progress = Arc::new(ProgressBar::new(total_files as u64));
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                .unwrap()
                .progress_chars("#>-"),
        );

        let extract_one = |file: &SimFile| -> PanelResult {
            let start = Instant::now();
            crate::metrics::METRICS.lock().record_file_attempt();
            let file_path = file.path.to_string_lossy().to_string();
            let progress = Arc::clone(&progress);

            let result = match extract::extract(file, source, metric, reference_year) {
                Ok((simulated, measured)) => {
                    info!(
                        "Extracted {} simulated / {} measured days from {} in {}ms",
                        simulated.len(),
                        measured.len(),
                        file_path,
                        start.elapsed().as_millis()
                    );
                    crate::metrics::METRICS.lock().record_file_extracted();
                    PanelResult {
                        key: file.key.clone(),
                        file_path,
                        simulated,
                        measured,
                        error: None,
                    }
                }
                Err(e) => {
                    error!("Failed to extract {}: {}", file_path, e);
                    crate::metrics::METRICS.lock().record_file_failure();
                    PanelResult {
                        key: file.key.clone(),
                        file_path,
                        simulated: DailySeries::default(),
                        measured: DailySeries::default(),
                        error: Some(e.to_string()),
                    }
                }
            };

            progress.inc(1);
            result
        };

        let results: Vec<PanelResult> = if self.sequential {
            files.iter().map(extract_one).collect()
        } else {
            files.par_iter().map(extract_one).collect()
        };

        progress.finish_with_message("Extraction completed");
        results
    }
}

impl Default for ExtractionRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_models::Treatment;
    use crate::measurements::LaiCsv;
    use std::fs;
    use std::io::Write;

    #[test]
    fn runner_reports_worker_count() {
        let runner = ExtractionRunner::new();
        assert!(runner.num_workers() > 0);
    }

    #[test]
    fn failed_files_keep_their_slot_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("cotton_VC_Pronto_ww.sim");
        fs::write(&good, "ti\tLAI\tTshd\tTsun\n1:182\t2.0\t28.0\t34.0\n").unwrap();
        let bad = dir.path().join("cotton_VC_UGA230_ww.sim");
        fs::write(&bad, "ti\tLAI\tTshd\n1:182\t2.0\t28.0\n").unwrap();

        let mut csv = tempfile::NamedTempFile::new().unwrap();
        csv.write_all(
            b"Entry,Treatment,Date and Time,Position,Leaf Area Index [LAI]\n\
              Pronto,WW,2023-07-01 09:00:00,Bottom,2.0\n",
        )
        .unwrap();
        let source = LaiCsv::load(csv.path()).unwrap();

        let files = vec![
            SimFile {
                path: good,
                key: SeriesKey::new("Pronto", Treatment::WellWatered),
            },
            SimFile {
                path: bad,
                key: SeriesKey::new("UGA230", Treatment::WellWatered),
            },
        ];

        let results = ExtractionRunner::sequential().run(&files, &source, Metric::Lai, 2023);
        assert_eq!(results.len(), 2);
        assert!(results[0].is_extracted());
        assert!(!results[1].is_extracted());
        assert_eq!(results[1].key.genotype, "UGA230");
        assert!(results[1].error.as_deref().unwrap().contains("Tsun"));
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = Vec::new();
        for genotype in ["Pronto", "UGA230", "Coker310"] {
            let path = dir.path().join(format!("cotton_VC_{}_ww.sim", genotype));
            fs::write(&path, "ti\tLAI\tTshd\tTsun\n1:182\t2.0\t28.0\t34.0\n").unwrap();
            files.push(SimFile {
                path,
                key: SeriesKey::new(genotype, Treatment::WellWatered),
            });
        }
        let mut csv = tempfile::NamedTempFile::new().unwrap();
        csv.write_all(
            b"Entry,Treatment,Date and Time,Position,Leaf Area Index [LAI]\n\
              Pronto,WW,2023-07-01 09:00:00,Bottom,2.0\n",
        )
        .unwrap();
        let source = LaiCsv::load(csv.path()).unwrap();

        let parallel = ExtractionRunner::new().run(&files, &source, Metric::Lai, 2023);
        let sequential = ExtractionRunner::sequential().run(&files, &source, Metric::Lai, 2023);
        let keys = |r: &[PanelResult]| r.iter().map(|p| p.key.clone()).collect::<Vec<_>>();
        assert_eq!(keys(&parallel), keys(&sequential));
        for (a, b) in parallel.iter().zip(&sequential) {
            assert_eq!(a.simulated, b.simulated);
            assert_eq!(a.measured, b.measured);
        }
    }
}
