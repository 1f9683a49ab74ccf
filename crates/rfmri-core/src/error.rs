//! Error types for core volume and coordinate-mapping operations.

use thiserror::Error;

/// Main error type for core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// An array has the wrong number of dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Shape mismatch between arrays that must agree.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// A coordinate mapping contains no assigned voxels.
    #[error("Empty coordinate mapping: {0}")]
    EmptyMapping(String),

    /// An affine matrix could not be inverted.
    #[error("Singular affine: {0}")]
    SingularAffine(String),

    /// Invalid argument to an operation.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Create a dimension mismatch error.
    pub fn dimension_mismatch(msg: impl Into<String>) -> Self {
        Self::DimensionMismatch(msg.into())
    }

    /// Create an empty mapping error.
    pub fn empty_mapping(msg: impl Into<String>) -> Self {
        Self::EmptyMapping(msg.into())
    }

    /// Create a singular affine error.
    pub fn singular_affine(msg: impl Into<String>) -> Self {
        Self::SingularAffine(msg.into())
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = CoreError::dimension_mismatch("expected 3 dimensions");
        assert!(matches!(err, CoreError::DimensionMismatch(_)));
    }

    #[test]
    fn test_error_display() {
        let err = CoreError::empty_mapping("no assigned voxels");
        assert_eq!(err.to_string(), "Empty coordinate mapping: no assigned voxels");
    }

    #[test]
    fn test_shape_mismatch() {
        let err = CoreError::ShapeMismatch {
            expected: vec![10, 10, 10],
            actual: vec![5, 5, 5],
        };
        let err_str = err.to_string();
        assert!(err_str.contains("expected"));
        assert!(err_str.contains("got"));
    }
}
