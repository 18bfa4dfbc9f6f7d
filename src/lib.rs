//! Skylar Toolbox - convenience layer over CatBoost-style boosting and
//! managed training jobs
//!
//! # Modules
//!
//! ## Boosting
//! - [`catboost`] - parameter reconciliation, estimator wrappers, callbacks,
//!   model and monoforest inspectors
//! - [`plot`] - renderer-independent figure descriptions
//!
//! ## Training jobs
//! - [`sagemaker`] - scikit-learn training job defaults and submission
//!
//! ## Utilities
//! - [`utils`] - numbered-list printing, call timing, data loading
//! - [`cli`] - command-line interface

// Core error handling
pub mod error;

pub mod catboost;
pub mod plot;
pub mod sagemaker;
pub mod utils;

pub mod cli;

pub use error::{Result, ToolboxError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Result, ToolboxError};

    pub use crate::catboost::{
        default_params, update_params, AbsoluteDifferenceCallback, BoostingBackend,
        CatBoostClassifier, CatBoostInspector, CatBoostRegressor, ColumnKind, ColumnTypes,
        FeatureSchema, FitOptions, ImportanceType, InspectableModel, MonoForestInspector,
        MonoForestModel, MonotoneConstraint, ParameterSet, TrainingCallback,
    };

    pub use crate::plot::Figure;

    pub use crate::sagemaker::{
        SklearnEstimator, SklearnEstimatorConfig, SklearnJobSpec, TrainingJobClient,
        TrainingSession,
    };

    pub use crate::utils::{print_sequence, time_callable, DataLoader, Timer};
}
