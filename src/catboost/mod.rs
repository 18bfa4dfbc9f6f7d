//! CatBoost convenience layer
//!
//! - [`params`] - parameter sets, monotone constraints, default parameters
//! - [`features`] - column names and declared kinds of a feature matrix
//! - [`reconcile`] - re-deriving categorical features and constraints before a fit
//! - [`estimator`] - classifier/regressor wrappers over a boosting backend
//! - [`callback`] - training callbacks
//! - [`inspector`] - metrics, curves, importances and interactions of a trained model
//! - [`monoforest`] - polynomial decomposition tables

pub mod callback;
pub mod estimator;
pub mod features;
pub mod inspector;
pub mod monoforest;
pub mod params;
pub mod reconcile;

pub use callback::{AbsoluteDifferenceCallback, IterationInfo, TrainingCallback};
pub use estimator::{BoostingBackend, CatBoostClassifier, CatBoostRegressor, FitOptions, Task};
pub use features::{ColumnKind, ColumnTypes, FeatureSchema};
pub use inspector::{
    CatBoostInspector, FeatureInteraction, FnrCurve, ImportanceType, InspectableModel,
    Inspection, Pool, RocCurve,
};
pub use monoforest::{BinarySplit, MonoForestInspector, MonoForestModel, Polynom};
pub use params::{default_params, ConstraintMap, MonotoneConstraint, ParameterSet};
pub use reconcile::update_params;
