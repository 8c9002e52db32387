//! Voronoi tessellation compute backends.
//!
//! `voronoi-compute` turns `(image, sites)` into a [`voronoi_core::VoronoiResult`]:
//! per-pixel nearest-site assignment plus per-cell color, area, and centroid.
//! Two backends implement the same contract:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                  ComputeBackend trait                     │
//! ├───────────────────────────┬─────────────────────────────-─┤
//! │       CpuBackend          │         WgpuBackend           │
//! │  bucket-queue jump flood  │   inverted-cone rasterization │
//! │  (rayon accumulation)     │   (feature = "wgpu")          │
//! └───────────────────────────┴─────────────────────────────-─┘
//! ```
//!
//! # Quick start
//!
//! ```ignore
//! use voronoi_compute::{Backend, create_backend};
//!
//! let backend = create_backend(Backend::Auto)?;
//! let result = backend.tessellate(&image, &sites)?;
//! ```
//!
//! # Feature flags
//!
//! - `wgpu` - enable the GPU cone-rendering backend

pub mod backend;

pub use backend::{create_backend, describe_backends, detect_backends, select_best_backend, Backend, BackendInfo, ComputeBackend};

use thiserror::Error;

/// Errors raised while selecting or running a compute backend.
#[derive(Debug, Error)]
pub enum ComputeError {
    /// No suitable GPU adapter was found.
    #[error("no suitable GPU adapter found")]
    NoAdapter,

    /// The requested backend is not available in this build or on this machine.
    #[error("backend not available: {0}")]
    BackendNotAvailable(String),

    /// GPU device/queue creation failed.
    #[error("failed to create device: {0}")]
    DeviceCreation(String),

    /// GPU buffer allocation failed.
    #[error("failed to create buffer: {0}")]
    BufferCreation(String),

    /// Shader module failed to compile.
    #[error("failed to compile shader: {0}")]
    ShaderCompilation(String),

    /// Image dimensions are degenerate (zero width or height).
    #[error("invalid dimensions: {0}x{1}")]
    InvalidDimensions(u32, u32),

    /// A backend-internal operation failed for a reason not covered above.
    #[error("compute operation failed: {0}")]
    OperationFailed(String),

    /// Underlying `voronoi-core` error (malformed image/sites/result shape).
    #[error(transparent)]
    Core(#[from] voronoi_core::Error),
}

impl ComputeError {
    /// True if this error means a GPU backend could not be used at all, and
    /// callers should fall back to the CPU backend.
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(self, Self::NoAdapter | Self::BackendNotAvailable(_) | Self::DeviceCreation(_))
    }
}

/// Result type alias using [`ComputeError`] as the error type.
pub type ComputeResult<T> = Result<T, ComputeError>;
