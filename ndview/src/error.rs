use thiserror::Error;

/// Errors raised by tensor construction, indexing and broadcasting.
///
/// Every failure is reported by the call that detects it and leaves existing tensors untouched.
#[derive(Debug, Error)]
pub enum TensorError {
    /// A shape argument is not an extent, a sequence of non-negative integers or a shape buffer.
    #[error("Bad Shape Specifier: {0}")]
    BadShapeSpecifier(String),

    /// Input data is not a rectangular sequence of numbers.
    #[error("Bad Data: {0}")]
    BadData(String),

    #[error("Shape Size Mismatch: shape {shape:?} holds {expected} elements, but got {actual}")]
    ShapeSizeMismatch {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    /// Two shapes disagree on an axis where neither side has extent 1.
    #[error("Unbroadcastable Shapes: axis {axis} has conflicting sizes {left} and {right}")]
    UnbroadcastableShapes {
        axis: usize,
        left: usize,
        right: usize,
    },

    #[error("Invalid Slice Specifier: {0}")]
    InvalidSliceSpecifier(String),

    #[error("Insufficient Indices: expected {expected}, got {actual}")]
    InsufficientIndices { expected: usize, actual: usize },

    /// A tensor value was assigned to a single element.
    #[error("Non-Scalar Single Set: cannot assign a value of shape {0:?} to a single element")]
    NonScalarSingleSet(Vec<usize>),

    #[error("Index Out of Bounds: {0}")]
    IndexOutOfBounds(String),

    #[error("Shape Mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Unsupported Operation: {0}")]
    UnsupportedOperation(String),

    #[cfg(feature = "serde")]
    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),
}
