//! Boosting parameter sets
//!
//! A [`ParameterSet`] mirrors the keyword parameters accepted by a
//! CatBoost-style estimator. The two keys the toolbox reasons about,
//! `cat_features` and `monotone_constraints`, are typed; everything else is
//! carried through as raw JSON so that the set can be handed to the backend
//! unchanged.

use crate::error::{Result, ToolboxError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// Direction a model's prediction must follow along one feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum MonotoneConstraint {
    /// Non-increasing (-1)
    Decreasing,
    /// No constraint (0)
    Unconstrained,
    /// Non-decreasing (+1)
    Increasing,
}

impl MonotoneConstraint {
    /// Integer code understood by the boosting library
    pub fn as_i8(self) -> i8 {
        match self {
            MonotoneConstraint::Decreasing => -1,
            MonotoneConstraint::Unconstrained => 0,
            MonotoneConstraint::Increasing => 1,
        }
    }
}

impl TryFrom<i8> for MonotoneConstraint {
    type Error = ToolboxError;

    fn try_from(value: i8) -> Result<Self> {
        match value {
            -1 => Ok(MonotoneConstraint::Decreasing),
            0 => Ok(MonotoneConstraint::Unconstrained),
            1 => Ok(MonotoneConstraint::Increasing),
            other => Err(ToolboxError::InvalidParameter {
                name: "monotone_constraints".to_string(),
                value: other.to_string(),
                reason: "expected -1, 0 or 1".to_string(),
            }),
        }
    }
}

impl From<MonotoneConstraint> for i8 {
    fn from(constraint: MonotoneConstraint) -> Self {
        constraint.as_i8()
    }
}

/// Column name -> monotonicity direction
pub type ConstraintMap = BTreeMap<String, MonotoneConstraint>;

/// Keyword parameters of a boosting estimator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    /// Columns treated as categorical by the backend
    #[serde(rename = "cat_features", alias = "categorical_features", default)]
    pub categorical_features: Vec<String>,

    /// Per-column monotonicity directives
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub monotone_constraints: ConstraintMap,

    /// Every other parameter, passed through verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ParameterSet {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set categorical features
    pub fn with_categorical_features<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categorical_features = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to add one monotone constraint
    pub fn with_monotone_constraint(
        mut self,
        column: impl Into<String>,
        constraint: MonotoneConstraint,
    ) -> Self {
        self.monotone_constraints.insert(column.into(), constraint);
        self
    }

    /// Builder method to set an arbitrary parameter
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Set an arbitrary (untyped) parameter
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.extra.insert(key.into(), value.into());
    }

    /// Get an arbitrary (untyped) parameter
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Whether an untyped parameter is present
    pub fn contains(&self, key: &str) -> bool {
        self.extra.contains_key(key)
    }

    /// Fill in every untyped key of `defaults` that is absent here.
    ///
    /// Typed keys are taken from `defaults` only when empty here.
    pub fn merge_defaults(&mut self, defaults: &ParameterSet) {
        for (key, value) in &defaults.extra {
            self.extra.entry(key.clone()).or_insert_with(|| value.clone());
        }
        if self.categorical_features.is_empty() {
            self.categorical_features = defaults.categorical_features.clone();
        }
        if self.monotone_constraints.is_empty() {
            self.monotone_constraints = defaults.monotone_constraints.clone();
        }
    }

    /// Flatten into a single JSON object, as passed to the backend
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Save to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Parameters the toolbox fits with unless told otherwise:
/// early stopping on a 20% holdout, keeping the best iteration.
pub fn default_params() -> ParameterSet {
    ParameterSet::new()
        .with("early_stopping_rounds", 10)
        .with("eval_fraction", 0.2)
        .with(
            "train_dir",
            std::env::temp_dir().to_string_lossy().into_owned(),
        )
        .with("use_best_model", true)
        .with("verbose", 100)
}
