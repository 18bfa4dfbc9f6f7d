//! Training callbacks

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Dataset name used by the backend for the training split
pub const LEARN: &str = "learn";
/// Dataset name used by the backend for the evaluation split
pub const VALIDATION: &str = "validation";

/// Metric histories reported by the backend after each boosting iteration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IterationInfo {
    /// Zero-based iteration number
    pub iteration: usize,
    /// dataset -> metric -> value per iteration so far
    pub metrics: BTreeMap<String, BTreeMap<String, Vec<f64>>>,
}

impl IterationInfo {
    /// Latest value of `metric` on `dataset`
    pub fn last(&self, dataset: &str, metric: &str) -> Option<f64> {
        self.metrics
            .get(dataset)
            .and_then(|metrics| metrics.get(metric))
            .and_then(|history| history.last().copied())
    }

    /// Append one value to a metric history
    pub fn push(&mut self, dataset: &str, metric: &str, value: f64) {
        self.metrics
            .entry(dataset.to_string())
            .or_default()
            .entry(metric.to_string())
            .or_default()
            .push(value);
    }
}

/// Hook invoked by the backend after every iteration
pub trait TrainingCallback {
    /// Return `false` to stop training
    fn after_iteration(&mut self, info: &IterationInfo) -> bool;
}

/// Stops training once learn and validation scores drift apart.
///
/// Training continues while `|validation - learn| < threshold` for the
/// latest iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsoluteDifferenceCallback {
    pub metric: String,
    pub threshold: f64,
}

impl AbsoluteDifferenceCallback {
    pub fn new(metric: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            threshold: 0.01,
        }
    }

    /// Builder method to set the stopping threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }
}

impl TrainingCallback for AbsoluteDifferenceCallback {
    fn after_iteration(&mut self, info: &IterationInfo) -> bool {
        let learn = info.last(LEARN, &self.metric);
        let validation = info.last(VALIDATION, &self.metric);

        match (learn, validation) {
            (Some(learn), Some(validation)) => (validation - learn).abs() < self.threshold,
            _ => {
                warn!(
                    metric = %self.metric,
                    iteration = info.iteration,
                    "Metric history missing, continuing training"
                );
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(learn: f64, validation: f64) -> IterationInfo {
        let mut info = IterationInfo::default();
        info.push(LEARN, "Logloss", 0.9);
        info.push(LEARN, "Logloss", learn);
        info.push(VALIDATION, "Logloss", 0.9);
        info.push(VALIDATION, "Logloss", validation);
        info.iteration = 1;
        info
    }

    #[test]
    fn test_continues_within_threshold() {
        let mut callback = AbsoluteDifferenceCallback::new("Logloss");
        assert!(callback.after_iteration(&info(0.50, 0.505)));
    }

    #[test]
    fn test_stops_beyond_threshold() {
        let mut callback = AbsoluteDifferenceCallback::new("Logloss").with_threshold(0.05);
        assert!(!callback.after_iteration(&info(0.30, 0.40)));
        assert!(!callback.after_iteration(&info(0.40, 0.30)));
    }

    #[test]
    fn test_missing_metric_continues() {
        let mut callback = AbsoluteDifferenceCallback::new("AUC");
        assert!(callback.after_iteration(&info(0.3, 0.9)));
    }

    #[test]
    fn test_last_value() {
        let info = info(0.4, 0.45);
        assert_eq!(info.last(LEARN, "Logloss"), Some(0.4));
        assert_eq!(info.last("test", "Logloss"), None);
    }
}
