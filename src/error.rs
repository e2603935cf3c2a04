//! Error types.
//!
//! [`Error`] covers every failure the crate reports itself. Failures inside a
//! codec back end are carried as [`CodecError`] and surface unchanged through
//! [`Error::Codec`], except during decode dispatch where they only cause the
//! next codec to be tried.

use thiserror::Error;

use crate::PixelFormat;

/// Boxed error used as the source of a [`CodecError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors from pixel buffer, dispatch and negotiation operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A pixel format name did not match any known format.
    #[error("invalid pixel format {0:?}")]
    UnknownPixelFormat(String),

    /// Stride is smaller than `width * bytes_per_pixel`.
    #[error("stride too short: {stride} < {min}")]
    StrideTooSmall { stride: usize, min: usize },

    /// Width, height and stride do not describe an addressable region.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Supplied byte region is smaller than the layout requires.
    #[error("image data too small: {len} bytes, need {required}")]
    InsufficientData { len: usize, required: usize },

    /// Row index outside `[0, height)`.
    #[error("row {y} out of bounds (height: {height})")]
    RowOutOfBounds { y: u32, height: u32 },

    /// Copy between buffers of different pixel formats.
    #[error("can't copy pixels between different pixel types ({source_format} -> {target_format})")]
    PixelTypeMismatch {
        source_format: PixelFormat,
        target_format: PixelFormat,
    },

    /// No registered codec could decode the input.
    #[error("unsupported image file")]
    UnsupportedFormat,

    /// The requested media type has no codec in the catalog.
    #[error("no codec registered for {0}")]
    CodecUnavailable(String),

    /// The encoder declared no pixel formats at all.
    #[error("codec accepts no pixel formats")]
    NoEncodableFormat,

    /// Failure reported by a codec or other collaborator.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A blocking worker task did not complete.
    #[error("worker task failed: {0}")]
    Worker(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Opaque failure from a codec back end.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CodecError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl CodecError {
    /// Create an error with a message only.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create an error wrapping an underlying cause.
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// The error message, without the source chain.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<image::ImageError> for CodecError {
    fn from(err: image::ImageError) -> Self {
        Self::with_source(err.to_string(), err)
    }
}
