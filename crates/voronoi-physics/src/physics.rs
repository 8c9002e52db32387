//! Ornstein-Uhlenbeck site steering.
//!
//! One call to [`step`] advances every site by `Δt` seconds: the velocity
//! direction mean-reverts toward a pull target (or holds its own direction
//! when no pull is active) plus a Gaussian wander term, then the position
//! advances at `speed` along the renormalized direction, then the image
//! boundary reflects any site that would leave it.
//!
//! # Used By
//!
//! - `voronoi-engine` - `Engine::step`

use voronoi_core::{Prng, SiteCollection};

#[inline]
fn normalize(x: f64, y: f64) -> (f64, f64) {
    let norm = (x * x + y * y).sqrt();
    if norm > 1e-12 {
        (x / norm, y / norm)
    } else {
        (1.0, 0.0)
    }
}

/// Advances every site in `sites` by one physics step.
///
/// `centroids`, when present, is indexed by site and supplies the previous
/// frame's cell centroid for the Lloyd-style pull term; pass `None` on the
/// first step after (re)seeding, since no prior centroids exist yet.
#[allow(clippy::too_many_arguments)]
pub fn step(
    sites: &mut SiteCollection,
    speed: f64,
    dt: f64,
    pull: f64,
    theta: f64,
    sigma: f64,
    centroids: Option<&[(f64, f64)]>,
    width: u32,
    height: u32,
    rng: &mut Prng,
) {
    let n = sites.len();
    let w = width as f64;
    let h = height as f64;

    for i in 0..n {
        let site = sites.get(i);
        let (vx, vy) = (site.vx, site.vy);

        let v_target = match centroids.filter(|_| pull > 0.0).map(|c| c[i]) {
            Some((cx, cy)) => {
                let (dx, dy) = normalize(cx - site.x, cy - site.y);
                let blend_x = vx * (1.0 - pull) + dx * pull;
                let blend_y = vy * (1.0 - pull) + dy * pull;
                normalize(blend_x, blend_y)
            }
            None => (vx, vy),
        };

        let (perp_x, perp_y) = normalize(-vy, vx);
        let wander = rng.next_standard_normal();

        let new_vx = vx + theta * (v_target.0 - vx) * dt + sigma * wander * dt.sqrt() * perp_x;
        let new_vy = vy + theta * (v_target.1 - vy) * dt + sigma * wander * dt.sqrt() * perp_y;
        let (new_vx, new_vy) = normalize(new_vx, new_vy);

        let mut new_x = site.x + new_vx * speed * dt;
        let mut new_y = site.y + new_vy * speed * dt;
        let mut out_vx = new_vx;
        let mut out_vy = new_vy;

        if new_x < 0.0 {
            new_x = -new_x;
            out_vx = -out_vx;
        } else if new_x >= w {
            new_x = 2.0 * w - new_x;
            out_vx = -out_vx;
        }
        new_x = new_x.clamp(0.0, (w - 1e-9).max(0.0));

        if new_y < 0.0 {
            new_y = -new_y;
            out_vy = -out_vy;
        } else if new_y >= h {
            new_y = 2.0 * h - new_y;
            out_vy = -out_vy;
        }
        new_y = new_y.clamp(0.0, (h - 1e-9).max(0.0));

        sites.xs_mut()[i] = new_x;
        sites.ys_mut()[i] = new_y;
        sites.vxs_mut()[i] = out_vx;
        sites.vys_mut()[i] = out_vy;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voronoi_core::Site;

    #[test]
    fn velocity_stays_unit_length() {
        let mut sites = SiteCollection::new();
        sites.push(Site { x: 50.0, y: 50.0, vx: 1.0, vy: 0.0 });
        let mut rng = Prng::new(7);
        for _ in 0..50 {
            step(&mut sites, 10.0, 0.01, 0.0, 3.0, 3.0, None, 100, 100, &mut rng);
            let s = sites.get(0);
            let norm = (s.vx * s.vx + s.vy * s.vy).sqrt();
            assert!((norm - 1.0).abs() < 1e-6, "norm={norm}");
        }
    }

    #[test]
    fn stays_in_bounds_after_step() {
        let mut sites = SiteCollection::new();
        sites.push(Site { x: 1.0, y: 1.0, vx: -1.0, vy: -1.0 });
        let mut rng = Prng::new(3);
        for _ in 0..200 {
            step(&mut sites, 50.0, 0.05, 0.0, 2.0, 2.0, None, 20, 20, &mut rng);
            let s = sites.get(0);
            assert!(s.x >= 0.0 && s.x < 20.0);
            assert!(s.y >= 0.0 && s.y < 20.0);
        }
    }

    #[test]
    fn reflective_boundary_matches_closed_form() {
        let mut sites = SiteCollection::new();
        sites.push(Site { x: 0.0, y: 0.0, vx: -1.0, vy: 0.0 });
        let mut rng = Prng::new(0);
        // theta = sigma = 0 so the velocity direction never changes except
        // via the reflective wall.
        step(&mut sites, 5.0, 1.0, 0.0, 0.0, 0.0, None, 100, 100, &mut rng);
        let s = sites.get(0);
        assert!((s.x - 5.0).abs() < 1e-9);
        assert_eq!(s.y, 0.0);
        assert!((s.vx - 1.0).abs() < 1e-9);
    }

    #[test]
    fn deterministic_given_same_seed() {
        let mut a = SiteCollection::new();
        a.push(Site { x: 10.0, y: 10.0, vx: 0.6, vy: 0.8 });
        let mut b = a.clone();
        let mut rng_a = Prng::new(99);
        let mut rng_b = Prng::new(99);
        for _ in 0..20 {
            step(&mut a, 8.0, 0.02, 0.2, 1.5, 1.0, None, 50, 50, &mut rng_a);
            step(&mut b, 8.0, 0.02, 0.2, 1.5, 1.0, None, 50, 50, &mut rng_b);
        }
        assert_eq!(a.get(0).x, b.get(0).x);
        assert_eq!(a.get(0).vy, b.get(0).vy);
    }
}
