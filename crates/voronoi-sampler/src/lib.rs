//! Brightness-weighted rejection sampling of Voronoi generator sites.
//!
//! [`SiteSampler`] turns a source image into an initial, deterministic set of
//! `N` site positions: pixels are drawn uniformly, accepted with probability
//! proportional to their weight, and on acceptance suppress their own
//! neighborhood so later draws spread out. No Poisson-disk machinery is
//! involved; the spatial separation falls out of the suppression step alone.
//!
//! # Dependencies
//!
//! - `voronoi-core` - [`Image`], [`Prng`]
//!
//! # Used By
//!
//! - `voronoi-engine` - `Engine::set_sites_from_sampler`

#![warn(missing_docs)]

use thiserror::Error;
use voronoi_core::{Image, Prng};

/// Errors raised by [`SiteSampler`].
#[derive(Debug, Error)]
pub enum Error {
    /// Requested site count exceeds the number of pixels available to draw.
    #[error("cannot sample {requested} sites from an image with only {available} pixels")]
    TooManySites {
        /// Requested site count.
        requested: usize,
        /// Pixels available (`width * height`).
        available: usize,
    },

    /// Requested zero sites.
    #[error("site count must be at least 1")]
    ZeroSites,
}

impl Error {
    /// True if this is a [`Error::TooManySites`] error.
    pub fn is_too_many_sites(&self) -> bool {
        matches!(self, Self::TooManySites { .. })
    }
}

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// A sampled site: a pixel position the caller will turn into a [`voronoi_core::Site`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampledPoint {
    /// X coordinate, pixel-center offset (`x + 0.5`).
    pub x: f64,
    /// Y coordinate, pixel-center offset (`y + 0.5`).
    pub y: f64,
}

/// Brightness-weighted rejection sampler over an [`Image`].
#[derive(Debug, Clone, Copy)]
pub struct SiteSampler {
    inverse_bias: bool,
    seed: u32,
}

impl SiteSampler {
    /// Creates a sampler. When `inverse_bias` is `false`, bright pixels are
    /// favored; when `true`, dark pixels are favored.
    pub fn new(inverse_bias: bool, seed: u32) -> Self {
        Self { inverse_bias, seed }
    }

    /// Draws `n` distinct sites from `image`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroSites`] if `n == 0`, or [`Error::TooManySites`]
    /// if `n` exceeds the image's pixel count.
    pub fn sample(&self, image: &Image, n: usize) -> Result<Vec<SampledPoint>> {
        if n == 0 {
            return Err(Error::ZeroSites);
        }
        let available = image.pixel_count();
        if n > available {
            return Err(Error::TooManySites { requested: n, available });
        }

        let mut weights: Vec<u16> = (0..available)
            .map(|i| {
                let b = image.brightness_at_index(i);
                if self.inverse_bias {
                    257 - b
                } else {
                    b
                }
            })
            .collect();

        let width = image.width();
        let height = image.height();
        let mut prng = Prng::new(self.seed);
        let mut accepted: Vec<SampledPoint> = Vec::with_capacity(n);
        let mut accepted_flags = vec![false; available];

        while accepted.len() < n {
            let i = prng.next_index(available);
            let u = prng.next_range(0.0, 256.0);
            if accepted_flags[i] {
                continue;
            }
            let w_before = weights[i];
            if w_before == 0 {
                continue;
            }
            if u > w_before as f64 {
                continue;
            }

            accepted_flags[i] = true;
            let (x, y) = image.xy_of(i);
            accepted.push(SampledPoint {
                x: x as f64 + 0.5,
                y: y as f64 + 0.5,
            });

            weights[i] = 0;
            let r = ((w_before as f64).log2().floor() as i64 + 1).max(1);
            let x0 = (x as i64 - r).max(0);
            let x1 = (x as i64 + r).min(width as i64 - 1);
            let y0 = (y as i64 - r).max(0);
            let y1 = (y as i64 + r).min(height as i64 - 1);
            for yy in y0..=y1 {
                for xx in x0..=x1 {
                    let idx = yy as usize * width as usize + xx as usize;
                    weights[idx] /= 2;
                }
            }
        }

        Ok(accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_image(width: u32, height: u32) -> Image {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..height {
            for x in 0..width {
                let v = ((x as f64 / (width.max(2) - 1) as f64) * 255.0) as u8;
                data.extend_from_slice(&[v, v, v, 255]);
            }
        }
        Image::new(data, width, height).unwrap()
    }

    #[test]
    fn rejects_zero_sites() {
        let img = gradient_image(4, 4);
        let sampler = SiteSampler::new(false, 0);
        assert!(matches!(sampler.sample(&img, 0), Err(Error::ZeroSites)));
    }

    #[test]
    fn rejects_too_many_sites() {
        let img = gradient_image(2, 2);
        let sampler = SiteSampler::new(false, 0);
        let err = sampler.sample(&img, 5).unwrap_err();
        assert!(err.is_too_many_sites());
    }

    #[test]
    fn produces_distinct_points() {
        let img = gradient_image(10, 10);
        let sampler = SiteSampler::new(false, 42);
        let points = sampler.sample(&img, 20).unwrap();
        assert_eq!(points.len(), 20);
        for i in 0..points.len() {
            for j in (i + 1)..points.len() {
                assert!(points[i] != points[j] || points[i].x != points[j].x);
            }
        }
    }

    #[test]
    fn deterministic_given_same_seed() {
        let img = gradient_image(10, 10);
        let a = SiteSampler::new(false, 7).sample(&img, 15).unwrap();
        let b = SiteSampler::new(false, 7).sample(&img, 15).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn bias_direction_shifts_mean_x() {
        // Brightness rises left-to-right, so favoring bright pixels should
        // shift the mean x of sampled sites to the right of favoring dark.
        let img = gradient_image(10, 10);
        let bright = SiteSampler::new(false, 1).sample(&img, 10).unwrap();
        let dark = SiteSampler::new(true, 1).sample(&img, 10).unwrap();
        let mean = |pts: &[SampledPoint]| pts.iter().map(|p| p.x).sum::<f64>() / pts.len() as f64;
        assert!(mean(&bright) > mean(&dark));
    }
}
