//! Managed training jobs
//!
//! [`SklearnEstimator`] resolves a full set of estimator arguments from a
//! short [`SklearnJobSpec`] and submits jobs through a [`TrainingJobClient`].
//! Submission and execution belong to the client; its errors are returned
//! unchanged.

mod config;

pub use config::{
    base_job_name, MetricDefinition, SklearnEstimatorConfig, SklearnJobSpec, LOCAL_INSTANCE_TYPE,
};

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::info;

/// Account-level facts the defaults are built from
pub trait TrainingSession {
    /// Bucket for code and model artefacts
    fn default_bucket(&self) -> Result<String>;

    /// Role the training job runs as
    fn execution_role(&self) -> Result<String>;
}

/// Status of a submitted job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobStatus {
    InProgress,
    Completed { model_artifacts: Option<String> },
    Failed { reason: String },
    Stopped,
}

/// A job as reported back by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingJob {
    pub job_name: String,
    pub status: JobStatus,
    pub submitted_at: DateTime<Utc>,
}

/// Submits a training job for a resolved estimator config
pub trait TrainingJobClient {
    type Error;

    /// `inputs` maps channel names to data locations
    fn fit(
        &self,
        config: &SklearnEstimatorConfig,
        inputs: &BTreeMap<String, String>,
        fit_options: &Map<String, Value>,
    ) -> std::result::Result<TrainingJob, Self::Error>;
}

/// Scikit-learn estimator with defaults filled in
pub struct SklearnEstimator<C: TrainingJobClient> {
    client: C,
    config: SklearnEstimatorConfig,
    jobs: Vec<TrainingJob>,
}

impl<C: TrainingJobClient> SklearnEstimator<C> {
    /// Resolve the estimator arguments for `spec` against `session`
    pub fn new<S>(client: C, session: &S, spec: &SklearnJobSpec) -> Result<Self>
    where
        S: TrainingSession + ?Sized,
    {
        let config = SklearnEstimatorConfig::resolve(spec, session)?;
        Ok(Self::from_config(client, config))
    }

    /// Use already resolved arguments
    pub fn from_config(client: C, config: SklearnEstimatorConfig) -> Self {
        Self {
            client,
            config,
            jobs: Vec::new(),
        }
    }

    pub fn config(&self) -> &SklearnEstimatorConfig {
        &self.config
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Submit a job reading from `inputs`
    pub fn fit(
        &mut self,
        inputs: &BTreeMap<String, String>,
        fit_options: &Map<String, Value>,
    ) -> std::result::Result<&TrainingJob, C::Error> {
        info!(
            base_job_name = %self.config.base_job_name,
            instance_type = %self.config.instance_type,
            spot = self.config.use_spot_instances,
            channels = inputs.len(),
            "Submitting training job"
        );
        let job = self.client.fit(&self.config, inputs, fit_options)?;
        info!(job_name = %job.job_name, status = ?job.status, "Training job submitted");
        self.jobs.push(job);
        Ok(&self.jobs[self.jobs.len() - 1])
    }

    /// Most recent job, if any
    pub fn latest_job(&self) -> Option<&TrainingJob> {
        self.jobs.last()
    }

    /// Every job submitted through this estimator, oldest first
    pub fn jobs(&self) -> &[TrainingJob] {
        &self.jobs
    }
}
