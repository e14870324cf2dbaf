//! Metric logger traits and composites.

use std::collections::BTreeMap;

/// Metrics keyed by name, iterated in name order
pub type Metrics = BTreeMap<String, f64>;

/// Trait for logging training metrics to various backends.
pub trait MetricLogger: Send + Sync {
    /// Log a scalar value (e.g. smoothed reward).
    fn log_scalar(&self, name: &str, value: f64, step: u64);

    /// Log a set of metrics sharing one step.
    fn log_metrics(&self, metrics: &Metrics, step: u64);

    /// Close the logger and flush any pending writes.
    fn close(&self) {}
}

/// A logger that does nothing.
pub struct NoOpLogger;

impl MetricLogger for NoOpLogger {
    fn log_scalar(&self, _name: &str, _value: f64, _step: u64) {}
    fn log_metrics(&self, _metrics: &Metrics, _step: u64) {}
}

/// A composite logger that dispatches to multiple backends.
#[derive(Default)]
pub struct CompositeLogger {
    loggers: Vec<Box<dyn MetricLogger>>,
}

impl CompositeLogger {
    pub fn new(loggers: Vec<Box<dyn MetricLogger>>) -> Self {
        Self { loggers }
    }

    pub fn add(&mut self, logger: Box<dyn MetricLogger>) {
        self.loggers.push(logger);
    }

    pub fn len(&self) -> usize {
        self.loggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loggers.is_empty()
    }
}

impl MetricLogger for CompositeLogger {
    fn log_scalar(&self, name: &str, value: f64, step: u64) {
        for logger in &self.loggers {
            logger.log_scalar(name, value, step);
        }
    }

    fn log_metrics(&self, metrics: &Metrics, step: u64) {
        for logger in &self.loggers {
            logger.log_metrics(metrics, step);
        }
    }

    fn close(&self) {
        for logger in &self.loggers {
            logger.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder {
        seen: Arc<Mutex<Vec<(String, f64, u64)>>>,
    }

    impl MetricLogger for Recorder {
        fn log_scalar(&self, name: &str, value: f64, step: u64) {
            self.seen.lock().unwrap().push((name.to_string(), value, step));
        }

        fn log_metrics(&self, metrics: &Metrics, step: u64) {
            for (name, value) in metrics {
                self.log_scalar(name, *value, step);
            }
        }
    }

    #[test]
    fn test_composite_fans_out() {
        let a = Recorder::default();
        let b = Recorder::default();
        let composite = CompositeLogger::new(vec![Box::new(a.clone()), Box::new(b.clone())]);

        let mut metrics = Metrics::new();
        metrics.insert("reward".to_string(), 1.5);
        metrics.insert("episodes".to_string(), 3.0);
        composite.log_metrics(&metrics, 10);
        composite.log_scalar("length", 7.0, 11);

        for recorder in [a, b] {
            let seen = recorder.seen.lock().unwrap();
            assert_eq!(seen.len(), 3);
            assert_eq!(seen[0], ("episodes".to_string(), 3.0, 10));
            assert_eq!(seen[2], ("length".to_string(), 7.0, 11));
        }
    }
}
