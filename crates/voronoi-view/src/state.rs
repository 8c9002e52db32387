//! Viewer parameter state and persistence.
//!
//! Stores the per-frame parameter tuple the UI exposes as live sliders,
//! plus the subset worth remembering between sessions via eframe storage.

use serde::{Deserialize, Serialize};

/// Default site speed, pixels/second.
pub const DEFAULT_SPEED: f64 = 40.0;
/// Default physics timestep, seconds.
pub const DEFAULT_DT: f64 = 1.0 / 60.0;
/// Default Lloyd centroid-pull strength.
pub const DEFAULT_PULL: f64 = 0.1;
/// Default Ornstein-Uhlenbeck drift coefficient.
pub const DEFAULT_THETA: f64 = 1.5;
/// Default Ornstein-Uhlenbeck wander coefficient.
pub const DEFAULT_SIGMA: f64 = 1.0;
/// Default target site count for the count controller.
pub const DEFAULT_TARGET: usize = 64;
/// Default doubling/halving time for the count controller, seconds.
pub const DEFAULT_DOUBLING_TIME: f64 = 3.0;

/// Split strategy exposed in the UI combo box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SplitStrategyChoice {
    /// Split the largest cell.
    #[default]
    Max,
    /// Split at the farthest unassigned-weight point.
    Far,
    /// Split a uniformly random cell.
    Random,
}

impl SplitStrategyChoice {
    /// Display label for the combo box.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Max => "Max area",
            Self::Far => "Farthest point",
            Self::Random => "Random",
        }
    }

    /// All choices, for iterating a combo box.
    pub const fn all() -> &'static [Self] {
        &[Self::Max, Self::Far, Self::Random]
    }
}

impl From<SplitStrategyChoice> for voronoi_physics::SplitStrategy {
    fn from(c: SplitStrategyChoice) -> Self {
        match c {
            SplitStrategyChoice::Max => Self::Max,
            SplitStrategyChoice::Far => Self::Far,
            SplitStrategyChoice::Random => Self::Random,
        }
    }
}

/// Live, UI-editable per-frame parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Params {
    /// Site speed, pixels/second.
    pub speed: f64,
    /// Physics timestep, seconds.
    pub dt: f64,
    /// Lloyd centroid-pull strength, `[0, 1]`.
    pub pull: f64,
    /// Ornstein-Uhlenbeck drift coefficient.
    pub theta: f64,
    /// Ornstein-Uhlenbeck wander coefficient.
    pub sigma: f64,
    /// Target site count.
    pub target: usize,
    /// Doubling/halving time toward `target`, seconds.
    pub doubling_time: f64,
    /// Split strategy used while growing toward `target`.
    pub strategy: SplitStrategyChoice,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
            dt: DEFAULT_DT,
            pull: DEFAULT_PULL,
            theta: DEFAULT_THETA,
            sigma: DEFAULT_SIGMA,
            target: DEFAULT_TARGET,
            doubling_time: DEFAULT_DOUBLING_TIME,
            strategy: SplitStrategyChoice::Max,
        }
    }
}

/// Settings persisted between sessions via eframe storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerPersistence {
    /// Last used speed.
    pub speed: f64,
    /// Last used pull strength.
    pub pull: f64,
    /// Last used theta.
    pub theta: f64,
    /// Last used sigma.
    pub sigma: f64,
    /// Last used target site count.
    pub target: usize,
}

impl Default for ViewerPersistence {
    fn default() -> Self {
        let p = Params::default();
        Self { speed: p.speed, pull: p.pull, theta: p.theta, sigma: p.sigma, target: p.target }
    }
}

impl ViewerPersistence {
    /// Applies persisted values onto a fresh [`Params`].
    pub fn apply(&self, params: &mut Params) {
        params.speed = self.speed;
        params.pull = self.pull;
        params.theta = self.theta;
        params.sigma = self.sigma;
        params.target = self.target;
    }

    /// Captures the persistable subset of `params`.
    pub fn from_params(params: &Params) -> Self {
        Self { speed: params.speed, pull: params.pull, theta: params.theta, sigma: params.sigma, target: params.target }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_round_trips_through_params() {
        let mut params = Params { speed: 99.0, ..Default::default() };
        let saved = ViewerPersistence::from_params(&params);
        params.speed = 1.0;
        saved.apply(&mut params);
        assert_eq!(params.speed, 99.0);
    }

    #[test]
    fn strategy_choice_converts_to_physics_strategy() {
        let s: voronoi_physics::SplitStrategy = SplitStrategyChoice::Far.into();
        assert_eq!(s, voronoi_physics::SplitStrategy::Far);
    }
}
