//! Error types for the toolbox

use thiserror::Error;

/// Result type alias for toolbox operations
pub type Result<T> = std::result::Result<T, ToolboxError>;

/// Main error type for the toolbox
///
/// Failures raised by a wrapped boosting backend or training-job client are
/// not translated into this type; they surface through the collaborator's
/// own associated error type.
#[derive(Error, Debug)]
pub enum ToolboxError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Inspector not fitted")]
    NotFitted,

    #[error("Model error: {0}")]
    Model(String),

    #[error("Training session error: {0}")]
    Session(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ToolboxError {
    /// Wrap a model-side failure, keeping its message
    pub fn model(err: impl std::fmt::Display) -> Self {
        ToolboxError::Model(err.to_string())
    }
}

impl From<polars::error::PolarsError> for ToolboxError {
    fn from(err: polars::error::PolarsError) -> Self {
        ToolboxError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for ToolboxError {
    fn from(err: serde_json::Error) -> Self {
        ToolboxError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ToolboxError::ConfigError("no declared type for column 'x'".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: no declared type for column 'x'"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ToolboxError = io_err.into();
        assert!(matches!(err, ToolboxError::IoError(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: ToolboxError = json_err.into();
        assert!(matches!(err, ToolboxError::SerializationError(_)));
    }
}
