//! Parameter reconciliation before a fit
//!
//! Estimators are often configured once and then fitted inside a pipeline
//! whose preprocessing steps add or drop columns. Before each fit the
//! categorical-feature list and the monotone constraints are brought back in
//! line with the columns actually present:
//!
//! - categorical features = (previous list ∩ current columns) ∪ (columns
//!   whose declared type is categorical), in column order;
//! - monotone constraints on removed columns are dropped. New constraints are
//!   never derived from column types; monotonicity has to be explicit.

use super::features::{ColumnKind, FeatureSchema};
use super::params::ParameterSet;
use std::collections::HashSet;

/// Reconcile `params` against the columns of `features`, in place.
///
/// Only `cat_features` and `monotone_constraints` are rewritten; every other
/// key is left untouched. The call is total and idempotent and does no
/// logging.
pub fn update_params<S>(params: &mut ParameterSet, features: &S)
where
    S: FeatureSchema + ?Sized,
{
    let columns = features.column_names();
    let present: HashSet<&str> = columns.iter().map(String::as_str).collect();
    let previous: HashSet<&str> = params
        .categorical_features
        .iter()
        .map(String::as_str)
        .collect();

    let categorical: Vec<String> = columns
        .iter()
        .filter(|name| {
            previous.contains(name.as_str())
                || features.column_kind(name) == Some(ColumnKind::Categorical)
        })
        .cloned()
        .collect();

    // An empty map stays empty, so retain is a no-op there.
    params
        .monotone_constraints
        .retain(|name, _| present.contains(name.as_str()));
    params.categorical_features = categorical;
}

impl ParameterSet {
    /// Value-returning form of [`update_params`]
    pub fn reconciled<S>(mut self, features: &S) -> Self
    where
        S: FeatureSchema + ?Sized,
    {
        update_params(&mut self, features);
        self
    }
}
