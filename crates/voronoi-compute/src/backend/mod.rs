//! Compute backends for Voronoi tessellation.
//!
//! Provides a CPU (rayon) backend and an optional wgpu backend with
//! automatic selection between them.

mod cpu_backend;
mod detect;

#[cfg(feature = "wgpu")]
mod wgpu_backend;

pub use cpu_backend::CpuBackend;
pub use detect::{describe_backends, detect_backends, select_best_backend, BackendInfo};

#[cfg(feature = "wgpu")]
pub use wgpu_backend::WgpuBackend;

use crate::ComputeResult;
use voronoi_core::{Image, SiteCollection, VoronoiResult};

/// Available compute backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Auto-select the best available backend (wgpu > CPU).
    #[default]
    Auto,
    /// CPU backend: bucket-queue jump flood, rayon-parallel accumulation.
    Cpu,
    /// GPU backend via wgpu: inverted-cone rasterization.
    Wgpu,
}

impl Backend {
    /// Check if this backend is available on the current system.
    pub fn is_available(&self) -> bool {
        match self {
            Self::Auto => true,
            Self::Cpu => true,
            #[cfg(feature = "wgpu")]
            Self::Wgpu => WgpuBackend::is_available(),
            #[cfg(not(feature = "wgpu"))]
            Self::Wgpu => false,
        }
    }
}

/// Computes a [`VoronoiResult`] from an image and a site collection.
///
/// Both realizations must agree on `cell_of` up to tie-breaking tolerance:
/// ties affect at most a measure-zero pixel set, so tests allow a small
/// disagreement fraction rather than requiring bit-for-bit equality across
/// backends.
pub trait ComputeBackend: Send + Sync {
    /// Backend name, for logging and diagnostics.
    fn name(&self) -> &'static str;

    /// Runs one tessellation pass.
    ///
    /// For every pixel `p` at its center, `cell_of[p]` is the index of the
    /// site minimizing squared Euclidean distance to `p`, ties broken by
    /// lowest index. Empty cells fall back to the RGB at the site's own
    /// pixel, or mid-gray if that pixel is out of bounds.
    fn tessellate(&self, image: &Image, sites: &SiteCollection) -> ComputeResult<VoronoiResult>;
}

/// Creates a backend instance.
pub fn create_backend(backend: Backend) -> ComputeResult<Box<dyn ComputeBackend>> {
    match backend {
        Backend::Auto => {
            let best = select_best_backend();
            create_backend(best)
        }
        Backend::Cpu => Ok(Box::new(CpuBackend::new())),
        Backend::Wgpu => {
            #[cfg(feature = "wgpu")]
            {
                Ok(Box::new(WgpuBackend::new()?))
            }
            #[cfg(not(feature = "wgpu"))]
            {
                Err(crate::ComputeError::BackendNotAvailable("wgpu feature not enabled".to_string()))
            }
        }
    }
}
