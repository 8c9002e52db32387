//! Output of a single tessellation pass: per-pixel assignment plus
//! per-cell statistics.
//!
//! [`VoronoiResult`] is what `voronoi-compute` produces and what
//! `voronoi-engine`/`voronoi-cli`/`voronoi-view` read to draw a frame. It is
//! deliberately backend-agnostic: both the CPU bucket-queue backend and the
//! GPU cone-rendering backend populate the same shape.
//!
//! # Used By
//!
//! - `voronoi-compute` - produced by `ComputeBackend::tessellate`
//! - `voronoi-engine` - consumed for rendering, centroid-pull physics, and
//!   the "far" split strategy

use crate::error::{Error, Result};

/// Per-pixel assignment and per-cell statistics for one tessellation pass.
///
/// `cell_of` is row-major and aligned with the source image: `cell_of[i]` is
/// the site index owning pixel `i`. The per-cell vectors are indexed by
/// site index and have length equal to the site count passed in.
#[derive(Debug, Clone)]
pub struct VoronoiResult {
    width: u32,
    height: u32,
    cell_of: Vec<u32>,
    cell_color: Vec<[u8; 3]>,
    cell_area: Vec<u32>,
    cell_centroid: Vec<(f64, f64)>,
    farthest_point: (u32, u32),
}

impl VoronoiResult {
    /// Builds a result, validating that every vector has the shape implied
    /// by `width * height` and `site_count`, and that `farthest_point` lies
    /// within the image rectangle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferLengthMismatch`] if `cell_of.len() !=
    /// width * height`, [`Error::Other`] if any per-cell vector's length
    /// doesn't match `site_count`, or if `farthest_point` is out of bounds.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        width: u32,
        height: u32,
        site_count: usize,
        cell_of: Vec<u32>,
        cell_color: Vec<[u8; 3]>,
        cell_area: Vec<u32>,
        cell_centroid: Vec<(f64, f64)>,
        farthest_point: (u32, u32),
    ) -> Result<Self> {
        let expected_pixels = width as usize * height as usize;
        if cell_of.len() != expected_pixels {
            return Err(Error::buffer_length_mismatch(expected_pixels, cell_of.len()));
        }
        for (name, len) in [
            ("cell_color", cell_color.len()),
            ("cell_area", cell_area.len()),
            ("cell_centroid", cell_centroid.len()),
        ] {
            if len != site_count {
                return Err(Error::other(format!(
                    "{name} has length {len}, expected site_count {site_count}"
                )));
            }
        }
        if farthest_point.0 >= width || farthest_point.1 >= height {
            return Err(Error::other(format!(
                "farthest_point {farthest_point:?} lies outside {width}x{height}"
            )));
        }
        Ok(Self {
            width,
            height,
            cell_of,
            cell_color,
            cell_area,
            cell_centroid,
            farthest_point,
        })
    }

    /// Image width the assignment was computed over.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height the assignment was computed over.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of sites this result has per-cell statistics for.
    #[inline]
    pub fn site_count(&self) -> usize {
        self.cell_color.len()
    }

    /// Row-major owning-site index per pixel.
    #[inline]
    pub fn cell_of(&self) -> &[u32] {
        &self.cell_of
    }

    /// Owning site index for pixel `(x, y)`.
    #[inline]
    pub fn cell_of_at(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.cell_of[y as usize * self.width as usize + x as usize])
    }

    /// Mean RGB color of each cell, indexed by site.
    #[inline]
    pub fn cell_color(&self) -> &[[u8; 3]] {
        &self.cell_color
    }

    /// Pixel area of each cell, indexed by site.
    #[inline]
    pub fn cell_area(&self) -> &[u32] {
        &self.cell_area
    }

    /// Centroid `(x, y)` of each cell, indexed by site.
    #[inline]
    pub fn cell_centroid(&self) -> &[(f64, f64)] {
        &self.cell_centroid
    }

    /// The pixel whose nearest site is maximally distant. Feeds the "far"
    /// split strategy: the new site is placed here, and its source is
    /// `cell_of_at(farthest_point)`.
    #[inline]
    pub fn farthest_point(&self) -> (u32, u32) {
        self.farthest_point
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(site_count: usize) -> VoronoiResult {
        VoronoiResult::new(
            2,
            2,
            site_count,
            vec![0, 0, 0, 0],
            vec![[10, 20, 30]; site_count],
            vec![4; site_count],
            vec![(0.5, 0.5); site_count],
            (1, 1),
        )
        .unwrap()
    }

    #[test]
    fn rejects_mismatched_cell_of_length() {
        let result = VoronoiResult::new(2, 2, 1, vec![0, 0, 0], vec![[0, 0, 0]], vec![3], vec![(0.0, 0.0)], (0, 0));
        assert!(result.is_err());
    }

    #[test]
    fn rejects_mismatched_percell_length() {
        let result = VoronoiResult::new(2, 2, 2, vec![0, 0, 0, 0], vec![[0, 0, 0]], vec![4, 0], vec![(0.0, 0.0); 2], (0, 0));
        assert!(result.is_err());
    }

    #[test]
    fn rejects_out_of_bounds_farthest_point() {
        let result = VoronoiResult::new(2, 2, 1, vec![0, 0, 0, 0], vec![[0, 0, 0]], vec![4], vec![(0.0, 0.0)], (5, 5));
        assert!(result.is_err());
    }

    #[test]
    fn cell_of_at_respects_bounds() {
        let r = sample(1);
        assert_eq!(r.cell_of_at(0, 0), Some(0));
        assert_eq!(r.cell_of_at(5, 5), None);
    }

    #[test]
    fn farthest_point_accessor() {
        let r = sample(1);
        assert_eq!(r.farthest_point(), (1, 1));
    }
}
