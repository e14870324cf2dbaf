//! Console logging backend.

use super::logger::{MetricLogger, Metrics};

/// Logger that reports metrics through `tracing` at info level.
#[derive(Default)]
pub struct ConsoleLogger;

impl ConsoleLogger {
    pub fn new() -> Self {
        Self
    }
}

impl MetricLogger for ConsoleLogger {
    fn log_scalar(&self, name: &str, value: f64, step: u64) {
        tracing::info!(step, name, value, "metric");
    }

    fn log_metrics(&self, metrics: &Metrics, step: u64) {
        // One line per call instead of one per metric.
        let line = metrics
            .iter()
            .map(|(key, value)| format!("{}={:.4}", key, value))
            .collect::<Vec<_>>()
            .join(", ");

        tracing::info!(step, "{}", line);
    }
}
