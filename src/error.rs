//! Error type shared by every stage of the shading pipeline.

#[cfg(feature = "python")]
use pyo3::{exceptions::PyValueError, PyErr};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ShadeError {
    /// Normalization was asked to stretch a field whose minimum equals its maximum.
    #[error("degenerate shade field: every facet accumulated {value}")]
    DegenerateInput { value: f64 },

    #[error("shade field has no comparable values")]
    UndefinedExtent,

    #[error("height grid must be at least 2x2, got {rows}x{cols}")]
    GridTooSmall { rows: usize, cols: usize },

    #[error("non-finite elevation {value} at ({row}, {col})")]
    NonFiniteElevation { row: usize, col: usize, value: f32 },

    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ShadeError {
    pub fn invalid_config<T: ToString>(msg: T) -> Self {
        ShadeError::InvalidConfig(msg.to_string())
    }
}

#[cfg(feature = "python")]
impl From<ShadeError> for PyErr {
    fn from(err: ShadeError) -> Self {
        PyValueError::new_err(err.to_string())
    }
}

pub type ShadeResult<T> = Result<T, ShadeError>;
