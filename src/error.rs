//! Error types for model compilation

use thiserror::Error;

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Fatal errors. Per-definition problems never end up here, they are
/// recorded as [`crate::graph::Diagnostics`] instead.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid swagger specification. Must be a 2.0. Currently {0}")]
    UnsupportedVersion(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_message() {
        let err = ModelError::UnsupportedVersion("3.0.1".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid swagger specification. Must be a 2.0. Currently 3.0.1"
        );
    }
}
