//! Error type for `voronoi-engine`.

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by [`crate::Engine`].
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration value is invalid: `N > W*H`, `N == 0` at compute
    /// time, an empty image, or a negative parameter where non-negative is
    /// required.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A GPU backend failed to initialize; the engine falls back to CPU
    /// for the rest of the session after logging this once.
    #[error("backend unavailable, falling back to CPU: {0}")]
    BackendUnavailable(String),

    /// Allocation failed for a buffer sized by image or site dimensions.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Error from the sampler crate.
    #[error(transparent)]
    Sampler(#[from] voronoi_sampler::Error),

    /// Error from the compute backend crate.
    #[error(transparent)]
    Compute(#[from] voronoi_compute::ComputeError),

    /// Error from the physics/count-control crate.
    #[error(transparent)]
    Physics(#[from] voronoi_physics::Error),

    /// Error from the foundational core crate.
    #[error(transparent)]
    Core(#[from] voronoi_core::Error),
}

impl Error {
    /// Creates an [`Error::InvalidConfig`] error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// True if this is an [`Error::InvalidConfig`] error.
    pub fn is_invalid_config(&self) -> bool {
        matches!(self, Self::InvalidConfig(_))
    }

    /// True if this is a [`Error::BackendUnavailable`] error.
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_predicate() {
        let err = Error::invalid_config("N exceeds pixel count");
        assert!(err.is_invalid_config());
        assert!(err.to_string().contains("N exceeds pixel count"));
    }
}
