//! # voronoi-engine
//!
//! Orchestrates sampling, physics, compute, and history into a single
//! running Voronoi animation.
//!
//! - [`Engine`] - owns the image, sites, PRNG, backend, and history; the
//!   single entry point a host drives frame by frame
//! - [`HistoryRing`] - bounded, bidirectional frame history for scrubbing
//!
//! # Used By
//!
//! - `voronoi-cli` - offline grow/hold/fade video-renderer host
//! - `voronoi-view` - interactive `eframe`/`egui` viewer host

#![warn(missing_docs)]

pub mod engine;
pub mod error;
pub mod history;

pub use engine::Engine;
pub use error::{Error, Result};
pub use history::HistoryRing;
