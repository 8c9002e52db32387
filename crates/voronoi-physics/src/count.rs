//! Gradual split/merge count control.
//!
//! [`CountController`] grows or shrinks a [`SiteCollection`] toward a target
//! count at an exponential rate, one split or merge at a time, driven by a
//! fractional accumulator so that sub-integer rates still produce smooth
//! long-run behavior.
//!
//! # Used By
//!
//! - `voronoi-engine` - `Engine::adjust_count`

use std::collections::HashSet;

use voronoi_core::{Prng, Site, SiteCollection};

use crate::error::{Error, Result};

/// How a split chooses its source site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitStrategy {
    /// Largest `cell_area` not yet split this call; falls back to random
    /// once every site has been split once.
    #[default]
    Max,
    /// Insert at the farthest unassigned-weight point; source is that
    /// point's current owner.
    Far,
    /// Uniform random site.
    Random,
}

/// Per-site statistics a controller step needs, sourced from the current
/// frame's [`voronoi_core::VoronoiResult`].
#[derive(Debug, Clone, Copy)]
pub struct FrameStats<'a> {
    /// Pixel area per site, indexed by site.
    pub cell_area: &'a [u32],
    /// The farthest point's pixel coordinates and its owning site.
    pub farthest_point: (u32, u32),
    /// Owning site index per pixel, row-major (needed to resolve
    /// `farthest_point`'s owner for the `Far` strategy).
    pub cell_of: &'a [u32],
    /// Image width, needed to index into `cell_of`.
    pub width: u32,
}

/// Sampling cap for merge-candidate scans once `N > 100`.
const MERGE_SAMPLE_CAP: usize = 100;

/// Exponential-rate split/merge controller.
#[derive(Debug, Clone, Default)]
pub struct CountController {
    accumulator: f64,
}

impl CountController {
    /// A fresh controller with no accumulated fractional progress.
    pub fn new() -> Self {
        Self { accumulator: 0.0 }
    }

    /// Advances the site count toward `target` by one `Δt` worth of
    /// exponential progress, performing zero or more split/merge operations.
    ///
    /// Returns the number of split/merge operations actually performed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroTarget`] if `target == 0`, or
    /// [`Error::TargetExceedsNMax`] if `target` exceeds `sites.n_max()`.
    pub fn step(
        &mut self,
        sites: &mut SiteCollection,
        target: usize,
        doubling_time: f64,
        dt: f64,
        strategy: SplitStrategy,
        stats: Option<FrameStats<'_>>,
        rng: &mut Prng,
    ) -> Result<usize> {
        if target == 0 {
            return Err(Error::ZeroTarget(target));
        }
        if target > sites.n_max() {
            return Err(Error::TargetExceedsNMax { target, n_max: sites.n_max() });
        }
        if sites.len() == target {
            self.accumulator = 0.0;
            return Ok(0);
        }

        if doubling_time <= 0.0 {
            let mut ops = 0;
            let mut already_split = HashSet::new();
            while sites.len() != target {
                self.apply_one(sites, target, strategy, &stats, &mut already_split, rng);
                ops += 1;
            }
            self.accumulator = 0.0;
            return Ok(ops);
        }

        let rho = std::f64::consts::LN_2 / doubling_time;
        self.accumulator += sites.len() as f64 * rho * dt;

        let mut ops = 0;
        let mut already_split = HashSet::new();
        while self.accumulator >= 1.0 && sites.len() != target {
            self.apply_one(sites, target, strategy, &stats, &mut already_split, rng);
            self.accumulator -= 1.0;
            ops += 1;
        }
        Ok(ops)
    }

    fn apply_one(
        &mut self,
        sites: &mut SiteCollection,
        target: usize,
        strategy: SplitStrategy,
        stats: &Option<FrameStats<'_>>,
        already_split: &mut HashSet<usize>,
        rng: &mut Prng,
    ) {
        if sites.len() < target {
            self.split_one(sites, strategy, stats, already_split, rng);
        } else {
            self.merge_one(sites, rng);
        }
    }

    fn split_one(&mut self, sites: &mut SiteCollection, strategy: SplitStrategy, stats: &Option<FrameStats<'_>>, already_split: &mut HashSet<usize>, rng: &mut Prng) {
        let n = sites.len();
        let (source, spawn_pos) = match strategy {
            SplitStrategy::Max => {
                let area = stats.map(|s| s.cell_area);
                let pick = area.and_then(|area| {
                    let mut best: Option<(usize, u32)> = None;
                    for i in (0..n).filter(|i| !already_split.contains(i)) {
                        let a = area.get(i).copied().unwrap_or(0);
                        if best.is_none_or(|(_, best_a)| a > best_a) {
                            best = Some((i, a));
                        }
                    }
                    best.map(|(i, _)| i)
                });
                let source = pick.unwrap_or_else(|| rng.next_index(n));
                let s = sites.get(source);
                (source, (s.x, s.y))
            }
            SplitStrategy::Far => match stats {
                Some(s) => {
                    let (fx, fy) = s.farthest_point;
                    let pixel = fy as usize * s.width as usize + fx as usize;
                    let owner = s.cell_of.get(pixel).copied().unwrap_or(0) as usize;
                    (owner, (fx as f64 + 0.5, fy as f64 + 0.5))
                }
                None => {
                    let source = rng.next_index(n);
                    let s = sites.get(source);
                    (source, (s.x, s.y))
                }
            },
            SplitStrategy::Random => {
                let source = rng.next_index(n);
                let s = sites.get(source);
                (source, (s.x, s.y))
            }
        };

        already_split.insert(source);

        let angle = rng.next_range(0.0, std::f64::consts::TAU);
        let (ux, uy) = (angle.cos(), angle.sin());

        sites.vxs_mut()[source] = ux;
        sites.vys_mut()[source] = uy;

        sites.push(Site {
            x: spawn_pos.0,
            y: spawn_pos.1,
            vx: -ux,
            vy: -uy,
        });
    }

    fn merge_one(&mut self, sites: &mut SiteCollection, rng: &mut Prng) {
        let n = sites.len();
        if n <= 1 {
            return;
        }
        let xs = sites.xs().to_vec();
        let ys = sites.ys().to_vec();

        let nearest_neighbor_dist2 = |i: usize| -> f64 {
            (0..n)
                .filter(|&j| j != i)
                .map(|j| {
                    let dx = xs[i] - xs[j];
                    let dy = ys[i] - ys[j];
                    dx * dx + dy * dy
                })
                .fold(f64::INFINITY, f64::min)
        };

        let candidates: Vec<usize> = if n > MERGE_SAMPLE_CAP {
            (0..MERGE_SAMPLE_CAP).map(|_| rng.next_index(n)).collect()
        } else {
            (0..n).collect()
        };

        let target = candidates
            .into_iter()
            .map(|i| (i, nearest_neighbor_dist2(i)))
            .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap_or(0);

        sites.remove(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sites_at(positions: &[(f64, f64)]) -> SiteCollection {
        let mut sites = SiteCollection::new();
        for &(x, y) in positions {
            sites.push(Site { x, y, vx: 1.0, vy: 0.0 });
        }
        sites
    }

    #[test]
    fn rejects_zero_target() {
        let mut sites = sites_at(&[(0.0, 0.0)]);
        let mut ctrl = CountController::new();
        let mut rng = Prng::new(0);
        let err = ctrl.step(&mut sites, 0, 1.0, 0.1, SplitStrategy::Random, None, &mut rng).unwrap_err();
        assert!(matches!(err, Error::ZeroTarget(0)));
    }

    #[test]
    fn instant_batch_split_with_zero_doubling_time() {
        let mut sites = sites_at(&[(1.0, 1.0)]);
        let mut ctrl = CountController::new();
        let mut rng = Prng::new(1);
        let ops = ctrl.step(&mut sites, 8, 0.0, 0.1, SplitStrategy::Random, None, &mut rng).unwrap();
        assert_eq!(sites.len(), 8);
        assert_eq!(ops, 7);
    }

    #[test]
    fn instant_batch_merge_with_zero_doubling_time() {
        let mut sites = sites_at(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (10.0, 10.0)]);
        let mut ctrl = CountController::new();
        let mut rng = Prng::new(2);
        ctrl.step(&mut sites, 1, 0.0, 0.1, SplitStrategy::Random, None, &mut rng).unwrap();
        assert_eq!(sites.len(), 1);
    }

    #[test]
    fn gradual_growth_accumulates_fractionally() {
        let mut sites = sites_at(&[(1.0, 1.0)]);
        let mut ctrl = CountController::new();
        let mut rng = Prng::new(3);
        // With a long doubling time and a tiny step, no single call should
        // produce an op yet.
        let ops = ctrl.step(&mut sites, 4, 100.0, 0.001, SplitStrategy::Random, None, &mut rng).unwrap();
        assert_eq!(ops, 0);
        assert_eq!(sites.len(), 1);
    }

    #[test]
    fn merge_removes_the_densest_pair_member() {
        // Two sites are nearly coincident; a third is far away. The merge
        // should remove one of the close pair, not the isolated site.
        let mut sites = sites_at(&[(10.0, 10.0), (10.1, 10.0), (500.0, 500.0)]);
        let mut ctrl = CountController::new();
        let mut rng = Prng::new(4);
        ctrl.step(&mut sites, 2, 0.0, 0.1, SplitStrategy::Random, None, &mut rng).unwrap();
        assert_eq!(sites.len(), 2);
        let remaining_far = sites.xs().iter().any(|&x| x > 400.0);
        assert!(remaining_far, "the isolated site should have survived the merge");
    }

    #[test]
    fn split_gives_parent_and_child_opposing_velocities() {
        let mut sites = sites_at(&[(5.0, 5.0)]);
        let mut ctrl = CountController::new();
        let mut rng = Prng::new(5);
        ctrl.step(&mut sites, 2, 0.0, 0.1, SplitStrategy::Random, None, &mut rng).unwrap();
        assert_eq!(sites.len(), 2);
        let a = sites.get(0);
        let b = sites.get(1);
        assert!((a.vx + b.vx).abs() < 1e-9);
        assert!((a.vy + b.vy).abs() < 1e-9);
    }
}
