use thiserror::Error;

/// Custom error type for engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// Requested model is not present in the registry
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// An artifact file could not be read or parsed at load time
    #[error("artifact load error: {0}")]
    ArtifactLoad(String),

    /// A loaded artifact cannot serve the request (e.g. dimension mismatch)
    #[error("artifact unavailable: {0}")]
    ArtifactUnavailable(String),

    /// Explainer output does not match a recognized attribution shape
    #[error("explainer unavailable: {0}")]
    ExplainerUnavailable(String),

    /// Invalid configuration (bad descriptor, missing required artifact)
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Patient record not found in storage
    #[error("record not found: {0}")]
    RecordNotFound(String),

    /// Validation errors (e.g., probability out of range)
    #[error("validation error: {0}")]
    Validation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::ModelNotFound("xgboost".to_string());
        assert_eq!(err.to_string(), "model not found: xgboost");

        let err = EngineError::ArtifactLoad("missing file".to_string());
        assert_eq!(err.to_string(), "artifact load error: missing file");

        let err = EngineError::ExplainerUnavailable("bad shape".to_string());
        assert_eq!(err.to_string(), "explainer unavailable: bad shape");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<EngineError>();
        assert_sync::<EngineError>();
    }

    #[test]
    fn test_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: EngineError = io.into();
        assert!(matches!(err, EngineError::Io(_)));
    }
}
