//! # voronoi-physics
//!
//! Per-frame site motion and gradual count control.
//!
//! - [`physics::step`] - Ornstein-Uhlenbeck velocity steering, optional
//!   Lloyd-style centroid pull, reflective image-boundary handling
//! - [`count::CountController`] - exponential-rate split/merge toward a
//!   target site count
//!
//! # Used By
//!
//! - `voronoi-engine` - `Engine::step`, `Engine::adjust_count`

#![warn(missing_docs)]

pub mod count;
pub mod error;
pub mod physics;

pub use count::{CountController, FrameStats, SplitStrategy};
pub use error::{Error, Result};
pub use physics::step;
