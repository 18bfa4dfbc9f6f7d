//! Scikit-learn training job configuration

use super::TrainingSession;
use crate::error::{Result, ToolboxError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Instance type that runs the job on the local machine
pub const LOCAL_INSTANCE_TYPE: &str = "local";

/// Longest base job name accepted
const MAX_BASE_JOB_NAME_LEN: usize = 30;

/// Metric scraped from the training job's logs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDefinition {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Regex")]
    pub regex: String,
}

impl MetricDefinition {
    pub fn new(name: impl Into<String>, regex: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            regex: regex.into(),
        }
    }

    /// `Score: <float>`, as printed by training scripts
    pub fn score() -> Self {
        Self::new("Score", r"Score: ([-]?[0-9\.]+)")
    }

    /// Parse this metric out of one log line
    pub fn extract(&self, line: &str) -> Result<Option<f64>> {
        let re = Regex::new(&self.regex).map_err(|e| ToolboxError::InvalidParameter {
            name: format!("metric_definitions.{}", self.name),
            value: self.regex.clone(),
            reason: e.to_string(),
        })?;
        Ok(re
            .captures(line)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok()))
    }
}

/// What the caller specifies about a job; everything else is defaulted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SklearnJobSpec {
    /// Directory with the training script (and optionally requirements)
    pub source_dir: String,
    pub hyperparameters: Map<String, Value>,
    /// Paths to extra dependencies uploaded with the source
    pub dependencies: Vec<String>,
    pub instance_type: String,
    pub use_spot_instances: bool,
    /// Estimator arguments that replace the defaults
    pub overrides: Map<String, Value>,
}

impl SklearnJobSpec {
    pub fn new(source_dir: impl Into<String>, instance_type: impl Into<String>) -> Self {
        Self {
            source_dir: source_dir.into(),
            instance_type: instance_type.into(),
            ..Default::default()
        }
    }

    pub fn with_hyperparameters(mut self, hyperparameters: Map<String, Value>) -> Self {
        self.hyperparameters = hyperparameters;
        self
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_spot_instances(mut self, use_spot_instances: bool) -> Self {
        self.use_spot_instances = use_spot_instances;
        self
    }

    pub fn with_overrides(mut self, overrides: Map<String, Value>) -> Self {
        self.overrides = overrides;
        self
    }

    /// Whether the job runs on the local machine
    pub fn is_local(&self) -> bool {
        self.instance_type == LOCAL_INSTANCE_TYPE
    }
}

/// Fully resolved estimator arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SklearnEstimatorConfig {
    pub entry_point: String,
    pub framework_version: String,
    pub source_dir: String,
    pub hyperparameters: Map<String, Value>,
    pub code_location: String,
    pub dependencies: Vec<String>,
    pub role: String,
    pub instance_count: u32,
    pub instance_type: String,
    pub output_path: String,
    pub base_job_name: String,
    /// Hand the session to the estimator; off in local mode
    pub attach_session: bool,
    pub metric_definitions: Vec<MetricDefinition>,
    pub use_spot_instances: bool,
    /// Seconds to wait for spot capacity plus training
    pub max_wait: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_profiler: Option<bool>,
    /// Estimator arguments without a typed field
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SklearnEstimatorConfig {
    /// Fill in defaults for `spec` using the session's bucket and role, then
    /// apply its overrides.
    pub fn resolve<S>(spec: &SklearnJobSpec, session: &S) -> Result<Self>
    where
        S: TrainingSession + ?Sized,
    {
        let bucket = session.default_bucket()?;
        let role = session.execution_role()?;
        let base_job_name = base_job_name(&spec.source_dir);
        let local = spec.is_local();

        let config = Self {
            entry_point: "script.py".to_string(),
            framework_version: "0.23-1".to_string(),
            source_dir: spec.source_dir.clone(),
            hyperparameters: spec.hyperparameters.clone(),
            code_location: format!("s3://{}/", bucket),
            dependencies: spec.dependencies.clone(),
            role,
            instance_count: 1,
            instance_type: spec.instance_type.clone(),
            output_path: format!("s3://{}/{}", bucket, base_job_name),
            base_job_name,
            attach_session: !local,
            metric_definitions: vec![MetricDefinition::score()],
            use_spot_instances: spec.use_spot_instances && !local,
            max_wait: 60 * 60,
            disable_profiler: if local { None } else { Some(true) },
            extra: Map::new(),
        };
        config.with_overrides(&spec.overrides)
    }

    /// Replace fields by name; unknown names are kept in `extra`
    pub fn with_overrides(self, overrides: &Map<String, Value>) -> Result<Self> {
        if overrides.is_empty() {
            return Ok(self);
        }
        let mut merged = match serde_json::to_value(&self)? {
            Value::Object(map) => map,
            _ => {
                return Err(ToolboxError::SerializationError(
                    "estimator config is not an object".to_string(),
                ))
            }
        };
        for (key, value) in overrides {
            merged.insert(key.clone(), value.clone());
        }
        Ok(serde_json::from_value(Value::Object(merged))?)
    }

    /// Whether the job runs on the local machine
    pub fn is_local(&self) -> bool {
        self.instance_type == LOCAL_INSTANCE_TYPE
    }
}

/// Source directory name made job-name safe: `_` -> `-`, at most 30 chars
pub fn base_job_name(source_dir: &str) -> String {
    source_dir
        .replace('_', "-")
        .chars()
        .take(MAX_BASE_JOB_NAME_LEN)
        .collect()
}
