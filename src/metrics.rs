use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Global metrics instance
pub static METRICS: Lazy<Mutex<Metrics>> = Lazy::new(|| Mutex::new(Metrics::new()));

/// Run metrics tracker
#[derive(Debug, Default)]
pub struct Metrics {
    pub total_files_attempted: u64,
    pub total_files_extracted: u64,
    pub total_files_failed: u64,
    pub total_simulated_records: u64,
    pub total_measured_records: u64,
    pub panels_rendered: u64,
    pub processing_times: HashMap<String, Duration>,
    pub start_time: Option<Instant>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    pub fn record_file_attempt(&mut self) {
        self.total_files_attempted += 1;
    }

    pub fn record_file_extracted(&mut self) {
        self.total_files_extracted += 1;
    }

    pub fn record_file_failure(&mut self) {
        self.total_files_failed += 1;
    }

    pub fn record_simulated_records(&mut self, count: u64) {
        self.total_simulated_records += count;
    }

    pub fn record_measured_records(&mut self, count: u64) {
        self.total_measured_records += count;
    }

    pub fn record_panels_rendered(&mut self, count: u64) {
        self.panels_rendered += count;
    }

    pub fn record_processing_time(&mut self, operation: String, duration: Duration) {
        self.processing_times.insert(operation, duration);
    }

    pub fn get_total_duration(&self) -> Duration {
        self.start_time
            .map(|start| start.elapsed())
            .unwrap_or_default()
    }

    pub fn print_summary(&self) {
        let duration = self.get_total_duration();
        println!("\n========== Comparison Run Summary ==========");
        println!("Total Duration: {:.2?}", duration);
        println!("Files Attempted: {}", self.total_files_attempted);
        println!("Files Extracted: {}", self.total_files_extracted);
        println!("Files Failed: {}", self.total_files_failed);
        println!("Simulated Records Parsed: {}", self.total_simulated_records);
        println!("Measured Records Parsed: {}", self.total_measured_records);
        println!("Panels Rendered: {}", self.panels_rendered);

        if !self.processing_times.is_empty() {
            println!("\nProcessing Times:");
            for (op, duration) in &self.processing_times {
                println!("  {}: {:.2?}", op, duration);
            }
        }
        println!("============================================\n");
    }
}

/// Helper macro to time an operation
#[macro_export]
macro_rules! time_operation {
    ($name:expr, $op:expr) => {{
        let start = std::time::Instant::now();
        let result = $op;
        let duration = start.elapsed();
        $crate::metrics::METRICS
            .lock()
            .record_processing_time($name.to_string(), duration);
        result
    }};
}
