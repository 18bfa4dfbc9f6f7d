//! Estimator wrappers that reconcile parameters before fitting
//!
//! [`CatBoostClassifier`] and [`CatBoostRegressor`] own a [`ParameterSet`]
//! and a [`BoostingBackend`]. Each `fit` call first runs
//! [`update_params`](super::reconcile::update_params) against the incoming
//! feature matrix, then hands the reconciled set to the backend. Backend
//! errors are returned as-is.

use super::callback::TrainingCallback;
use super::params::{default_params, ParameterSet};
use super::reconcile::update_params;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Learning task of a wrapped estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Task {
    Classification,
    Regression,
}

/// Per-call fit arguments forwarded to the backend
#[derive(Default)]
pub struct FitOptions {
    /// Held-out features and labels for early stopping / best-model selection
    pub eval_set: Option<(DataFrame, Series)>,
    /// Per-row weights
    pub sample_weight: Option<Series>,
    /// Hooks called after every boosting iteration
    pub callbacks: Vec<Box<dyn TrainingCallback + Send>>,
    /// Any other keyword argument of the backend's fit routine
    pub extra: Map<String, Value>,
}

impl FitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the evaluation set
    pub fn with_eval_set(mut self, features: DataFrame, labels: Series) -> Self {
        self.eval_set = Some((features, labels));
        self
    }

    /// Builder method to set sample weights
    pub fn with_sample_weight(mut self, weights: Series) -> Self {
        self.sample_weight = Some(weights);
        self
    }

    /// Builder method to register a callback
    pub fn with_callback(mut self, callback: impl TrainingCallback + Send + 'static) -> Self {
        self.callbacks.push(Box::new(callback));
        self
    }

    /// Builder method to set an extra fit argument
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// The wrapped boosting library's fit entry point
pub trait BoostingBackend {
    /// Trained model handle
    type Model;
    /// Backend failure, surfaced unchanged by the wrappers
    type Error;

    fn fit(
        &self,
        task: Task,
        features: &DataFrame,
        labels: &Series,
        params: &ParameterSet,
        options: &mut FitOptions,
    ) -> std::result::Result<Self::Model, Self::Error>;
}

/// Shared state of the classifier and regressor wrappers
struct ReconcilingEstimator<B: BoostingBackend> {
    task: Task,
    backend: B,
    params: ParameterSet,
    model: Option<B::Model>,
}

impl<B: BoostingBackend> ReconcilingEstimator<B> {
    fn new(task: Task, backend: B, params: ParameterSet) -> Self {
        Self {
            task,
            backend,
            params,
            model: None,
        }
    }

    fn fit(
        &mut self,
        features: &DataFrame,
        labels: &Series,
        mut options: FitOptions,
    ) -> std::result::Result<&B::Model, B::Error> {
        update_params(&mut self.params, features);
        debug!(
            task = ?self.task,
            cat_features = ?self.params.categorical_features,
            monotone_constraints = self.params.monotone_constraints.len(),
            n_rows = features.height(),
            n_cols = features.width(),
            "Reconciled parameters before fit"
        );

        let model = self
            .backend
            .fit(self.task, features, labels, &self.params, &mut options)?;
        Ok(self.model.insert(model))
    }
}

// ============ CatBoost Classifier ============

/// Classifier wrapper deriving categorical features and constraints per fit
pub struct CatBoostClassifier<B: BoostingBackend> {
    inner: ReconcilingEstimator<B>,
}

impl<B: BoostingBackend> CatBoostClassifier<B> {
    pub fn new(backend: B, params: ParameterSet) -> Self {
        Self {
            inner: ReconcilingEstimator::new(Task::Classification, backend, params),
        }
    }

    /// Create with [`default_params`] filled in under `params`
    pub fn with_default_params(backend: B, mut params: ParameterSet) -> Self {
        params.merge_defaults(&default_params());
        Self::new(backend, params)
    }

    /// Reconcile parameters against `features`, then fit through the backend
    pub fn fit(
        &mut self,
        features: &DataFrame,
        labels: &Series,
        options: FitOptions,
    ) -> std::result::Result<&B::Model, B::Error> {
        self.inner.fit(features, labels, options)
    }

    pub fn params(&self) -> &ParameterSet {
        &self.inner.params
    }

    pub fn set_params(&mut self, params: ParameterSet) {
        self.inner.params = params;
    }

    /// Model from the last successful fit
    pub fn model(&self) -> Option<&B::Model> {
        self.inner.model.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.inner.backend
    }
}

// ============ CatBoost Regressor ============

/// Regressor wrapper deriving categorical features and constraints per fit
pub struct CatBoostRegressor<B: BoostingBackend> {
    inner: ReconcilingEstimator<B>,
}

impl<B: BoostingBackend> CatBoostRegressor<B> {
    pub fn new(backend: B, params: ParameterSet) -> Self {
        Self {
            inner: ReconcilingEstimator::new(Task::Regression, backend, params),
        }
    }

    /// Create with [`default_params`] filled in under `params`
    pub fn with_default_params(backend: B, mut params: ParameterSet) -> Self {
        params.merge_defaults(&default_params());
        Self::new(backend, params)
    }

    /// Reconcile parameters against `features`, then fit through the backend
    pub fn fit(
        &mut self,
        features: &DataFrame,
        labels: &Series,
        options: FitOptions,
    ) -> std::result::Result<&B::Model, B::Error> {
        self.inner.fit(features, labels, options)
    }

    pub fn params(&self) -> &ParameterSet {
        &self.inner.params
    }

    pub fn set_params(&mut self, params: ParameterSet) {
        self.inner.params = params;
    }

    /// Model from the last successful fit
    pub fn model(&self) -> Option<&B::Model> {
        self.inner.model.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.inner.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catboost::callback::{AbsoluteDifferenceCallback, IterationInfo};
    use crate::catboost::params::MonotoneConstraint;
    use std::cell::RefCell;

    /// Records what it was asked to fit with
    #[derive(Default)]
    struct RecordingBackend {
        seen: RefCell<Vec<(Task, ParameterSet)>>,
    }

    impl BoostingBackend for RecordingBackend {
        type Model = usize;
        type Error = String;

        fn fit(
            &self,
            task: Task,
            features: &DataFrame,
            _labels: &Series,
            params: &ParameterSet,
            options: &mut FitOptions,
        ) -> std::result::Result<usize, String> {
            let info = IterationInfo::default();
            for callback in options.callbacks.iter_mut() {
                callback.after_iteration(&info);
            }
            self.seen.borrow_mut().push((task, params.clone()));
            Ok(features.width())
        }
    }

    struct FailingBackend;

    impl BoostingBackend for FailingBackend {
        type Model = ();
        type Error = String;

        fn fit(
            &self,
            _task: Task,
            _features: &DataFrame,
            _labels: &Series,
            _params: &ParameterSet,
            _options: &mut FitOptions,
        ) -> std::result::Result<(), String> {
            Err("label column contains NaN".to_string())
        }
    }

    fn data() -> (DataFrame, Series) {
        let x = df!(
            "age" => &[31.0, 45.0, 27.0],
            "country" => &["PT", "ES", "PT"]
        )
        .unwrap();
        let y = Series::new("target".into(), &[0.0, 1.0, 0.0]);
        (x, y)
    }

    #[test]
    fn test_classifier_reconciles_before_fit() {
        let params = ParameterSet::new()
            .with_categorical_features(["city"])
            .with_monotone_constraint("age", MonotoneConstraint::Increasing)
            .with_monotone_constraint("tenure", MonotoneConstraint::Decreasing);
        let mut model = CatBoostClassifier::new(RecordingBackend::default(), params);
        let (x, y) = data();

        let fitted = *model.fit(&x, &y, FitOptions::new()).unwrap();
        assert_eq!(fitted, 2);

        let seen = model.backend().seen.borrow();
        let (task, passed) = &seen[0];
        assert_eq!(*task, Task::Classification);
        assert_eq!(passed.categorical_features, vec!["country"]);
        assert_eq!(passed.monotone_constraints.len(), 1);
        assert_eq!(model.params(), passed);
        assert_eq!(model.model(), Some(&2));
    }

    #[test]
    fn test_regressor_refits_on_new_columns() {
        let mut model = CatBoostRegressor::new(RecordingBackend::default(), ParameterSet::new());
        let (x, y) = data();
        model.fit(&x, &y, FitOptions::new()).unwrap();

        let x2 = df!("age" => &[1.0, 2.0, 3.0], "segment" => &["a", "b", "c"]).unwrap();
        model.fit(&x2, &y, FitOptions::new()).unwrap();

        let seen = model.backend().seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, Task::Regression);
        assert_eq!(seen[1].1.categorical_features, vec!["segment"]);
    }

    #[test]
    fn test_backend_error_is_propagated_unchanged() {
        let mut model = CatBoostClassifier::new(FailingBackend, ParameterSet::new());
        let (x, y) = data();
        let err = model.fit(&x, &y, FitOptions::new()).unwrap_err();
        assert_eq!(err, "label column contains NaN");
        assert!(model.model().is_none());
    }

    #[test]
    fn test_default_params_are_merged() {
        let model = CatBoostRegressor::with_default_params(
            RecordingBackend::default(),
            ParameterSet::new().with("verbose", 0),
        );
        assert_eq!(model.params().get("verbose"), Some(&serde_json::json!(0)));
        assert!(model.params().contains("use_best_model"));
    }

    #[test]
    fn test_callbacks_are_forwarded() {
        let mut model = CatBoostClassifier::new(RecordingBackend::default(), ParameterSet::new());
        let (x, y) = data();
        let options = FitOptions::new()
            .with_callback(AbsoluteDifferenceCallback::new("Logloss"))
            .with("plot", false);
        assert_eq!(options.callbacks.len(), 1);
        model.fit(&x, &y, options).unwrap();
    }
}
