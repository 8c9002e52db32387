//! [`Engine`]: the single entry point orchestrating sampling, physics,
//! compute, and history into a running Voronoi animation.
//!
//! A host (interactive UI or offline video renderer) feeds it an image and
//! per-frame parameters and consumes the [`VoronoiResult`] it renders
//! however it likes. The Engine owns the image buffer, site collection,
//! PRNG, compute backend, and history ring exclusively; nothing it returns
//! outlives the next mutating call.

use tracing::{debug, warn};

use voronoi_compute::{create_backend, Backend, ComputeBackend};
use voronoi_core::{Image, Prng, Site, SiteCollection, VoronoiResult};
use voronoi_physics::{CountController, FrameStats, SplitStrategy};
use voronoi_sampler::SiteSampler;

use crate::error::{Error, Result};
use crate::history::HistoryRing;

/// A pending split/merge target, set by [`Engine::adjust_count`] and
/// consumed frame-by-frame from within [`Engine::step`] until reached.
#[derive(Debug, Clone, Copy)]
struct CountTarget {
    target: usize,
    doubling_time: f64,
    strategy: SplitStrategy,
}

/// Orchestrates a running Voronoi animation.
///
/// Construct with [`Engine::new`], load an image and sites, then drive it
/// frame by frame with [`Engine::step`] and [`Engine::compute`].
pub struct Engine {
    image: Option<Image>,
    sites: SiteCollection,
    prng: Prng,
    backend: Box<dyn ComputeBackend>,
    count_controller: CountController,
    pending_count: Option<CountTarget>,
    history: HistoryRing,
    last_result: Option<VoronoiResult>,
    /// `true` until the first `step` call after a (re)seed completes; used
    /// to suppress centroid pull for that one frame (no prior centroids
    /// exist yet).
    first_step_after_reseed: bool,
}

impl Engine {
    /// Builds an engine with no image and no sites, using `backend` for
    /// tessellation (`Backend::Auto` picks the best available at
    /// construction time, falling back to CPU if GPU init fails).
    ///
    /// # Errors
    ///
    /// Propagates backend construction failure from `voronoi-compute`.
    pub fn new(backend: Backend) -> Result<Self> {
        let backend = match create_backend(backend) {
            Ok(b) => b,
            Err(e) if e.is_backend_unavailable() => {
                warn!(error = %e, "requested backend unavailable, falling back to CPU");
                create_backend(Backend::Cpu)?
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            image: None,
            sites: SiteCollection::new(),
            prng: Prng::new(0),
            backend,
            count_controller: CountController::new(),
            pending_count: None,
            history: HistoryRing::new(),
            last_result: None,
            first_step_after_reseed: true,
        })
    }

    /// Current image dimensions, if one has been set.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.image.as_ref().map(|img| (img.width(), img.height()))
    }

    /// Current site count.
    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    /// Replaces the source image.
    ///
    /// Site positions are preserved even if they now fall outside the new
    /// rectangle; the next [`Engine::step`] silently clamps them back in,
    /// rather than reseeding. This follows the system's own documented
    /// preference for clamping over reseeding on an image swap.
    pub fn set_image(&mut self, rgba: Vec<u8>, width: u32, height: u32) -> Result<()> {
        let image = Image::new(rgba, width, height)?;
        debug!(width, height, "image set");
        self.image = Some(image);
        Ok(())
    }

    /// Replaces the site set by re-running brightness-weighted sampling
    /// over the current image, assigning each new site a random unit
    /// velocity, and clearing history.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if no image is set. Propagates the
    /// sampler's error if `n == 0` or `n` exceeds the pixel count.
    pub fn set_sites_from_sampler(&mut self, n: usize, inverse_bias: bool, seed: u32) -> Result<()> {
        let image = self.image.as_ref().ok_or_else(|| Error::invalid_config("set_sites_from_sampler called with no image set"))?;
        let points = SiteSampler::new(inverse_bias, seed).sample(image, n)?;
        let mut velocity_rng = Prng::new(seed).derive(seed, 1);
        let mut sites = SiteCollection::new();
        for p in points {
            let angle = velocity_rng.next_range(0.0, std::f64::consts::TAU);
            sites.push(Site { x: p.x, y: p.y, vx: angle.cos(), vy: angle.sin() });
        }
        self.sites = sites;
        self.prng = Prng::new(seed);
        self.reset_after_reseed();
        debug!(n, inverse_bias, seed, "sites (re)seeded from sampler");
        Ok(())
    }

    /// Replaces the site set with caller-supplied positions. Velocities are
    /// assigned random unit directions seeded by `seed`. History is cleared.
    pub fn set_sites(&mut self, positions: &[(f64, f64)], seed: u32) -> Result<()> {
        let mut velocity_rng = Prng::new(seed).derive(seed, 1);
        let mut sites = SiteCollection::new();
        for &(x, y) in positions {
            let angle = velocity_rng.next_range(0.0, std::f64::consts::TAU);
            sites.push(Site { x, y, vx: angle.cos(), vy: angle.sin() });
        }
        self.sites = sites;
        self.prng = Prng::new(seed);
        self.reset_after_reseed();
        debug!(n = positions.len(), seed, "sites set explicitly");
        Ok(())
    }

    fn reset_after_reseed(&mut self) {
        self.history.clear();
        self.count_controller = CountController::new();
        self.pending_count = None;
        self.last_result = None;
        self.first_step_after_reseed = true;
        if self.image.is_some() {
            self.history.push(self.sites.xs().to_vec(), self.sites.ys().to_vec());
        }
    }

    /// Advances one physics step, running the pending split/merge tick (if
    /// [`Engine::adjust_count`] left one pending) against the previous
    /// frame's cell statistics, then appends the resulting positions to
    /// history.
    ///
    /// Centroid pull is suppressed (treated as `pull = 0`) on the first
    /// step after sites are (re)seeded, since no previous-frame centroids
    /// exist yet to pull toward.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if no image is set or there are no
    /// sites.
    pub fn step(&mut self, speed: f64, dt: f64, pull: f64, theta: f64, sigma: f64) -> Result<()> {
        let (width, height) = self.dimensions().ok_or_else(|| Error::invalid_config("step called with no image set"))?;
        if self.sites.is_empty() {
            return Err(Error::invalid_config("step called with no sites"));
        }

        let centroids: Option<Vec<(f64, f64)>> =
            if self.first_step_after_reseed { None } else { self.last_result.as_ref().map(|r| r.cell_centroid().to_vec()) };
        let effective_pull = if self.first_step_after_reseed { 0.0 } else { pull };

        voronoi_physics::step(&mut self.sites, speed, dt, effective_pull, theta, sigma, centroids.as_deref(), width, height, &mut self.prng);
        self.first_step_after_reseed = false;

        if let Some(pending) = self.pending_count {
            self.run_count_tick(pending, dt)?;
        }

        self.history.push(self.sites.xs().to_vec(), self.sites.ys().to_vec());
        Ok(())
    }

    /// Configures (or re-configures) the gradual split/merge target and
    /// immediately performs one tick of progress toward it, using the cell
    /// areas from the most recently computed frame (or none, on the first
    /// call after a reseed, in which case the `Max`/`Far` strategies fall
    /// back to a random source).
    ///
    /// The target stays pending across subsequent [`Engine::step`] calls
    /// until reached.
    ///
    /// # Errors
    ///
    /// Propagates [`voronoi_physics::Error`] for `target == 0` or
    /// `target > n_max`.
    pub fn adjust_count(&mut self, target: usize, doubling_time: f64, dt: f64, strategy: SplitStrategy) -> Result<usize> {
        let pending = CountTarget { target, doubling_time, strategy };
        self.pending_count = Some(pending);
        let ops = self.run_count_tick(pending, dt)?;
        Ok(ops)
    }

    fn run_count_tick(&mut self, pending: CountTarget, dt: f64) -> Result<usize> {
        let last_result = self.last_result.as_ref();
        let width = self.dimensions().map(|(w, _)| w).unwrap_or(0);
        let stats = last_result.map(|r| FrameStats {
            cell_area: r.cell_area(),
            farthest_point: r.farthest_point(),
            cell_of: r.cell_of(),
            width,
        });
        let ops = self.count_controller.step(&mut self.sites, pending.target, pending.doubling_time, dt, pending.strategy, stats, &mut self.prng)?;
        if self.sites.len() == pending.target {
            self.pending_count = None;
        }
        Ok(ops)
    }

    /// Runs one tessellation pass over the current (or, when scrubbing
    /// behind the history head, the historically recorded) site positions,
    /// caching the result for the next frame's centroid-pull and
    /// count-adjust calls.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if no image is set or there are no
    /// sites. Propagates backend failures.
    pub fn compute(&mut self) -> Result<VoronoiResult> {
        let image = self.image.as_ref().ok_or_else(|| Error::invalid_config("compute called with no image set"))?;
        if self.sites.is_empty() {
            return Err(Error::invalid_config("compute called with no sites"));
        }

        let view_sites = match self.history.current() {
            Some(snapshot) if !self.history.is_at_head() => {
                let n = snapshot.xs.len();
                SiteCollection::from_parts(snapshot.xs.clone(), snapshot.ys.clone(), vec![0.0; n], vec![0.0; n], self.sites.n_max())
            }
            _ => self.sites.clone(),
        };

        let result = self.backend.tessellate(image, &view_sites)?;
        if self.history.is_at_head() {
            self.last_result = Some(result.clone());
        }
        Ok(result)
    }

    /// Moves the scrub cursor one frame earlier. No-op (returns `false`) if
    /// already at the oldest retained frame.
    pub fn step_back(&mut self) -> bool {
        self.history.step_back()
    }

    /// Moves the scrub cursor one frame later. At the head, this runs a
    /// full physics step using `speed, dt, pull, theta, sigma` (identical
    /// to calling [`Engine::step`]); behind the head, it just advances the
    /// cursor with no physics.
    #[allow(clippy::too_many_arguments)]
    pub fn step_forward(&mut self, speed: f64, dt: f64, pull: f64, theta: f64, sigma: f64) -> Result<()> {
        if self.history.is_at_head() {
            self.step(speed, dt, pull, theta, sigma)
        } else {
            self.history.advance_within_ring();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voronoi_compute::Backend;

    fn checkerboard(w: u32, h: u32) -> (Vec<u8>, u32, u32) {
        let mut data = Vec::with_capacity(w as usize * h as usize * 4);
        for y in 0..h {
            for x in 0..w {
                let v = if (x + y) % 2 == 0 { 220u8 } else { 30u8 };
                data.extend_from_slice(&[v, v, v, 255]);
            }
        }
        (data, w, h)
    }

    fn fresh_engine(w: u32, h: u32, n: usize) -> Engine {
        let mut engine = Engine::new(Backend::Cpu).unwrap();
        let (data, width, height) = checkerboard(w, h);
        engine.set_image(data, width, height).unwrap();
        engine.set_sites_from_sampler(n, false, 1).unwrap();
        engine
    }

    #[test]
    fn compute_fails_without_image() {
        let mut engine = Engine::new(Backend::Cpu).unwrap();
        let err = engine.compute().unwrap_err();
        assert!(err.is_invalid_config());
    }

    #[test]
    fn set_sites_from_sampler_rejects_too_many() {
        let mut engine = Engine::new(Backend::Cpu).unwrap();
        let (data, width, height) = checkerboard(4, 4);
        engine.set_image(data, width, height).unwrap();
        assert!(engine.set_sites_from_sampler(1000, false, 0).is_err());
    }

    #[test]
    fn step_then_compute_produces_a_result_covering_every_pixel() {
        let mut engine = fresh_engine(16, 16, 6);
        engine.step(5.0, 0.1, 0.0, 1.0, 1.0).unwrap();
        let result = engine.compute().unwrap();
        assert_eq!(result.cell_of().len(), 16 * 16);
        assert_eq!(result.site_count(), 6);
    }

    #[test]
    fn step_back_then_forward_reproduces_identical_cell_of() {
        let mut engine = fresh_engine(12, 12, 4);
        for _ in 0..5 {
            engine.step(4.0, 0.1, 0.0, 1.0, 1.0).unwrap();
            engine.compute().unwrap();
        }
        let before = engine.compute().unwrap();
        assert!(engine.step_back());
        assert!(engine.step_back());
        engine.step_forward(4.0, 0.1, 0.0, 1.0, 1.0).unwrap();
        engine.step_forward(4.0, 0.1, 0.0, 1.0, 1.0).unwrap();
        let after = engine.compute().unwrap();
        assert_eq!(before.cell_of(), after.cell_of());
    }

    #[test]
    fn adjust_count_grows_toward_target_over_several_steps() {
        let mut engine = fresh_engine(24, 24, 2);
        for _ in 0..20 {
            engine.adjust_count(8, 0.2, 0.05, SplitStrategy::Max).unwrap();
            engine.step(4.0, 0.05, 0.0, 1.0, 1.0).unwrap();
            engine.compute().unwrap();
        }
        assert_eq!(engine.site_count(), 8);
    }

    #[test]
    fn first_step_after_reseed_ignores_pull() {
        // With no previous centroids, a nonzero pull must behave exactly
        // like pull = 0 on the very first step.
        let mut engine_a = fresh_engine(10, 10, 3);
        let mut engine_b = fresh_engine(10, 10, 3);
        engine_a.step(5.0, 0.1, 0.0, 1.0, 1.0).unwrap();
        engine_b.step(5.0, 0.1, 0.9, 1.0, 1.0).unwrap();
        assert_eq!(engine_a.sites.xs(), engine_b.sites.xs());
    }
}
