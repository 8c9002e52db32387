//! Error type for `voronoi-physics`.

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by [`crate::count::CountController`].
///
/// Physics itself (O-U steering, boundary reflection) never fails per the
/// system design: positions and velocities are always clamped/renormalized
/// rather than rejected.
#[derive(Debug, Error)]
pub enum Error {
    /// A target count of zero was requested; at least one site must remain.
    #[error("target site count must be at least 1, got {0}")]
    ZeroTarget(usize),

    /// The requested target exceeds the collection's configured `n_max`.
    #[error("target site count {target} exceeds n_max {n_max}")]
    TargetExceedsNMax {
        /// Requested target.
        target: usize,
        /// Configured maximum.
        n_max: usize,
    },
}

impl Error {
    /// True if this is a [`Error::TargetExceedsNMax`] error.
    pub fn is_target_exceeds_n_max(&self) -> bool {
        matches!(self, Self::TargetExceedsNMax { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_target_message() {
        assert!(Error::ZeroTarget(0).to_string().contains('0'));
    }

    #[test]
    fn target_exceeds_n_max_predicate() {
        let err = Error::TargetExceedsNMax { target: 100, n_max: 50 };
        assert!(err.is_target_exceeds_n_max());
    }
}
