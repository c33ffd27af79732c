//! Error types for the EMF converter
//!
//! Structural errors are the only kind that surface from [`crate::convert`].
//! Bounds and image errors are absorbed by the render pass: a bounds error
//! raises the drawing state's error flag and stops the walk, an image error
//! is replaced by a placeholder picture.

use thiserror::Error;

/// Error type for conversion operations
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Structural error: {0}")]
    Structural(String),

    #[error("Out of bounds: {0}")]
    Bounds(String),

    #[error("Image decode error: {0}")]
    ImageDecode(String),

    #[error("Invalid options: {0}")]
    Options(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for conversion operations
pub type Result<T> = std::result::Result<T, ConvertError>;

impl ConvertError {
    pub(crate) fn bounds(what: impl Into<String>) -> Self {
        ConvertError::Bounds(what.into())
    }

    pub(crate) fn structural(what: impl Into<String>) -> Self {
        ConvertError::Structural(what.into())
    }
}

impl From<serde_json::Error> for ConvertError {
    fn from(err: serde_json::Error) -> Self {
        ConvertError::Options(err.to_string())
    }
}

impl From<image::ImageError> for ConvertError {
    fn from(err: image::ImageError) -> Self {
        ConvertError::ImageDecode(err.to_string())
    }
}

/// Conversion from ConvertError to PyErr
#[cfg(feature = "python")]
impl From<ConvertError> for pyo3::PyErr {
    fn from(err: ConvertError) -> Self {
        match err {
            ConvertError::Io(e) => pyo3::PyErr::new::<pyo3::exceptions::PyIOError, _>(e.to_string()),
            other => pyo3::PyErr::new::<pyo3::exceptions::PyValueError, _>(other.to_string()),
        }
    }
}
