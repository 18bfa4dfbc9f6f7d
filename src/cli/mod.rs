//! Skylar Toolbox CLI Module
//!
//! Command-line access to parameter reconciliation, column listings and
//! training-job configuration.

use clap::{Parser, Subcommand};
use colored::*;
use polars::prelude::DataFrame;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::catboost::{update_params, ColumnKind, FeatureSchema, ParameterSet};
use crate::sagemaker::{SklearnEstimatorConfig, SklearnJobSpec, TrainingSession};
use crate::utils::{format_sequence, time_callable, DataLoader};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn muted(s: &str) -> ColoredString { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString    { s.truecolor(100, 210, 120) }

fn step_ok(msg: &str) {
    eprintln!("  {} {}", ok("✓"), msg);
}

fn section(title: &str) {
    eprintln!();
    eprintln!("  {}", title.white().bold());
    eprintln!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "skylar")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CatBoost parameter reconciliation and training-job defaults")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconcile categorical features and monotone constraints against a data file
    Reconcile {
        /// Parameter set (JSON object)
        #[arg(short, long)]
        params: PathBuf,

        /// Feature matrix (CSV, TSV, Parquet or JSON)
        #[arg(short, long)]
        data: PathBuf,

        /// Write the reconciled parameters here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the columns of a data file with their declared kinds
    Columns {
        /// Feature matrix (CSV, TSV, Parquet or JSON)
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Resolve the estimator arguments of a scikit-learn training job
    JobConfig {
        /// Directory with the training script
        #[arg(long)]
        source_dir: String,

        /// Instance type ("local" runs on this machine)
        #[arg(long, default_value = "ml.m5.large")]
        instance_type: String,

        /// Artefact bucket
        #[arg(long)]
        bucket: String,

        /// Execution role
        #[arg(long)]
        role: String,

        /// Use spot instances (ignored in local mode)
        #[arg(long)]
        spot: bool,

        /// Extra dependency paths
        #[arg(long = "dependency")]
        dependencies: Vec<String>,

        /// Hyperparameters (JSON object)
        #[arg(long)]
        hyperparameters: Option<PathBuf>,

        /// Estimator argument overrides (JSON object)
        #[arg(long)]
        overrides: Option<PathBuf>,
    },
}

/// Session whose bucket and role come from the command line
pub struct StaticSession {
    pub bucket: String,
    pub role: String,
}

impl TrainingSession for StaticSession {
    fn default_bucket(&self) -> crate::Result<String> {
        Ok(self.bucket.clone())
    }

    fn execution_role(&self) -> crate::Result<String> {
        Ok(self.role.clone())
    }
}

/// Load a data file, detecting the format from its extension
pub fn load_data(path: &Path) -> anyhow::Result<DataFrame> {
    let name = format!("load {}", path.display());
    let df = time_callable(&name, || DataLoader::new().load_auto(path))?;
    Ok(df)
}

fn read_json_object(path: &Path) -> anyhow::Result<Map<String, Value>> {
    let json = std::fs::read_to_string(path)?;
    match serde_json::from_str(&json)? {
        Value::Object(map) => Ok(map),
        other => anyhow::bail!(
            "{}: expected a JSON object, found {}",
            path.display(),
            other
        ),
    }
}

pub fn cmd_reconcile(params_path: &Path, data_path: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    section("Reconcile parameters");

    let mut params = ParameterSet::load(params_path)?;
    let df = load_data(data_path)?;
    step_ok(&format!("Loaded {} rows x {} columns", df.height(), df.width()));

    let before = params.categorical_features.len();
    update_params(&mut params, &df);
    step_ok(&format!(
        "cat_features {} -> {}, monotone_constraints {}",
        before,
        params.categorical_features.len(),
        params.monotone_constraints.len()
    ));

    match output {
        Some(path) => {
            params.save(path)?;
            step_ok(&format!("Wrote {}", path.display()));
        }
        None => println!("{}", serde_json::to_string_pretty(&params)?),
    }
    Ok(())
}

pub fn cmd_columns(data_path: &Path) -> anyhow::Result<()> {
    let df = load_data(data_path)?;
    let rows: Vec<String> = df
        .column_names()
        .into_iter()
        .map(|name| {
            let kind = match df.column_kind(&name) {
                Some(ColumnKind::Categorical) => "categorical",
                _ => "numeric",
            };
            format!("{} {}", name, muted(&format!("({})", kind)))
        })
        .collect();
    println!("{}", format_sequence("columns", rows));
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_job_config(
    source_dir: &str,
    instance_type: &str,
    bucket: &str,
    role: &str,
    spot: bool,
    dependencies: &[String],
    hyperparameters: Option<&Path>,
    overrides: Option<&Path>,
) -> anyhow::Result<()> {
    let mut spec = SklearnJobSpec::new(source_dir, instance_type)
        .with_spot_instances(spot)
        .with_dependencies(dependencies.iter().cloned());
    if let Some(path) = hyperparameters {
        spec = spec.with_hyperparameters(read_json_object(path)?);
    }
    if let Some(path) = overrides {
        spec = spec.with_overrides(read_json_object(path)?);
    }

    let session = StaticSession {
        bucket: bucket.to_string(),
        role: role.to_string(),
    };
    let config = SklearnEstimatorConfig::resolve(&spec, &session)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reconcile() {
        let cli = Cli::try_parse_from([
            "skylar", "reconcile", "--params", "p.json", "--data", "d.csv",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Reconcile { output: None, .. }));
    }

    #[test]
    fn test_parse_job_config() {
        let cli = Cli::try_parse_from([
            "skylar",
            "job-config",
            "--source-dir",
            "churn_model",
            "--bucket",
            "b",
            "--role",
            "r",
            "--spot",
            "--dependency",
            "lib/a",
            "--dependency",
            "lib/b",
        ])
        .unwrap();
        match cli.command {
            Commands::JobConfig { instance_type, spot, dependencies, .. } => {
                assert_eq!(instance_type, "ml.m5.large");
                assert!(spot);
                assert_eq!(dependencies, vec!["lib/a", "lib/b"]);
            }
            _ => panic!("expected job-config"),
        }
    }

    #[test]
    fn test_reconcile_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let params_path = dir.path().join("params.json");
        let data_path = dir.path().join("data.csv");
        let output_path = dir.path().join("out.json");
        std::fs::write(
            &params_path,
            r#"{"cat_features": ["city"], "monotone_constraints": {"age": 1, "tenure": -1}, "depth": 6}"#,
        )
        .unwrap();
        std::fs::write(&data_path, "age,country\n31,PT\n45,ES\n").unwrap();

        cmd_reconcile(&params_path, &data_path, Some(&output_path)).unwrap();

        let params = ParameterSet::load(&output_path).unwrap();
        assert_eq!(params.categorical_features, vec!["country"]);
        assert_eq!(params.monotone_constraints.len(), 1);
        assert_eq!(params.get("depth"), Some(&serde_json::json!(6)));
    }

    #[test]
    fn test_read_json_object_rejects_arrays() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "[1, 2]").unwrap();
        assert!(read_json_object(file.path()).is_err());
    }
}
