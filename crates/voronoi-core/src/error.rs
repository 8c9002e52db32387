//! Error types for voronoi-core operations.
//!
//! This module provides the error type shared by the image buffer and site
//! collection: the handful of ways a caller can hand the core malformed
//! data before any tessellation work starts.
//!
//! # Dependencies
//!
//! - [`thiserror`] - derive macro for `Display`/`std::error::Error`
//!
//! # Used By
//!
//! - [`crate::image::Image`] - buffer construction
//! - [`crate::site::SiteCollection`] - site bookkeeping
//! - `voronoi-sampler`, `voronoi-compute`, `voronoi-engine` - re-exported via `#[from]`

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the foundational image and site types.
#[derive(Debug, Error)]
pub enum Error {
    /// Width or height is zero, or `width * height` overflows `usize`.
    #[error("invalid image dimensions {width}x{height}: {reason}")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
        /// Why the dimensions are invalid.
        reason: String,
    },

    /// A raw pixel buffer's length doesn't match `width * height * 4`.
    #[error("pixel buffer length mismatch: expected {expected} bytes, got {got}")]
    BufferLengthMismatch {
        /// Expected length in bytes (`width * height * 4`).
        expected: usize,
        /// Actual length supplied.
        got: usize,
    },

    /// Catch-all for errors that don't fit another variant.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::BufferLengthMismatch`] error.
    #[inline]
    pub fn buffer_length_mismatch(expected: usize, got: usize) -> Self {
        Self::BufferLengthMismatch { expected, got }
    }

    /// Creates an [`Error::Other`] error.
    #[inline]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}
