//! # voronoi-core
//!
//! Foundational types shared across the Voronoi tessellation workspace.
//!
//! - [`Image`] - owned RGBA8 input buffer
//! - [`Site`], [`SiteCollection`] - tessellation generator points, stored
//!   struct-of-arrays for cache locality in the physics/compute hot paths
//! - [`Prng`] - the deterministic Mulberry32 stream every stochastic
//!   component (sampler, physics, split/merge) draws from
//! - [`VoronoiResult`] - per-pixel assignment and per-cell statistics
//!   produced by a tessellation pass
//! - [`Error`] - the error type shared by the types above
//!
//! ## Crate structure
//!
//! This crate is the foundation of the workspace and has no internal
//! dependencies. Every other crate depends on `voronoi-core`:
//!
//! ```text
//! voronoi-core (this crate)
//!    ^
//!    |
//!    +-- voronoi-sampler (initial site placement)
//!    +-- voronoi-compute (nearest-site assignment, CPU/GPU backends)
//!    +-- voronoi-physics (per-frame motion, split/merge)
//!    +-- voronoi-engine  (orchestration, history)
//!    +-- voronoi-cli, voronoi-view (hosts)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod image;
pub mod prng;
pub mod result;
pub mod site;

pub use error::{Error, Result};
pub use image::Image;
pub use prng::Prng;
pub use result::VoronoiResult;
pub use site::{Site, SiteCollection, DEFAULT_N_MAX};

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```
/// use voronoi_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::image::Image;
    pub use crate::prng::Prng;
    pub use crate::result::VoronoiResult;
    pub use crate::site::{Site, SiteCollection, DEFAULT_N_MAX};
}
