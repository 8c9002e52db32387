//! CPU backend: bucket-queue jump flood for exact L2 Voronoi assignment.
//!
//! The flood itself runs on a single priority cursor (it is inherently
//! sequential — each pop can enqueue work for the next bucket); the
//! color/area/centroid accumulation pass afterward is embarrassingly
//! parallel and runs over `rayon`-parallel pixel chunks, matching the
//! strip-parallel reduction shape this workspace's own per-pixel passes use.

use rayon::prelude::*;

use super::ComputeBackend;
use crate::{ComputeError, ComputeResult};
use voronoi_core::{Image, SiteCollection, VoronoiResult};

/// CPU tessellation backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuBackend;

impl CpuBackend {
    /// Creates a CPU backend. Stateless; always available.
    pub fn new() -> Self {
        Self
    }
}

#[inline]
fn dist2(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    let dx = ax - bx;
    let dy = ay - by;
    dx * dx + dy * dy
}

#[inline]
fn neighbors4(x: u32, y: u32, width: u32, height: u32) -> [Option<(u32, u32)>; 4] {
    [
        if x > 0 { Some((x - 1, y)) } else { None },
        if x + 1 < width { Some((x + 1, y)) } else { None },
        if y > 0 { Some((x, y - 1)) } else { None },
        if y + 1 < height { Some((x, y + 1)) } else { None },
    ]
}

/// Runs the bucket-queue expansion, returning `(cell_of, best_dist2)`.
///
/// `best_dist2[p]` is the squared distance from pixel `p`'s center to the
/// site that claimed it; it also doubles as the "how far did the flood
/// have to reach" measure used to find the farthest point.
fn flood(image: &Image, xs: &[f64], ys: &[f64]) -> (Vec<u32>, Vec<f64>) {
    let width = image.width();
    let height = image.height();
    let pixel_count = image.pixel_count();

    // Bucket key is floor(dist^2); the grid diagonal bounds every possible
    // squared distance a flood step can produce.
    let max_bucket = width as u64 * width as u64 + height as u64 * height as u64;
    let max_bucket = max_bucket as usize;

    let mut buckets: Vec<Vec<(u32, u32)>> = vec![Vec::new(); max_bucket + 1];
    let mut best_dist2 = vec![f64::INFINITY; pixel_count];
    let mut cell_of = vec![u32::MAX; pixel_count];

    let bucket_key = |d2: f64, floor: usize| -> usize { (d2.floor() as usize).clamp(floor, max_bucket) };

    // Seed: every site's home pixel.
    for (site_idx, (&sx, &sy)) in xs.iter().zip(ys.iter()).enumerate() {
        let px = (sx.floor() as i64).clamp(0, width as i64 - 1) as u32;
        let py = (sy.floor() as i64).clamp(0, height as i64 - 1) as u32;
        let pixel = py as usize * width as usize + px as usize;
        let d2 = dist2(px as f64 + 0.5, py as f64 + 0.5, sx, sy);
        if d2 < best_dist2[pixel] {
            best_dist2[pixel] = d2;
            buckets[bucket_key(d2, 0)].push((pixel as u32, site_idx as u32));
        }
    }

    let mut cursor = 0usize;
    while cursor <= max_bucket {
        if buckets[cursor].is_empty() {
            cursor += 1;
            continue;
        }
        let entries = std::mem::take(&mut buckets[cursor]);
        for (pixel, site) in entries {
            let pixel = pixel as usize;
            if cell_of[pixel] != u32::MAX {
                continue;
            }
            cell_of[pixel] = site;
            let (x, y) = image.xy_of(pixel);
            let sx = xs[site as usize];
            let sy = ys[site as usize];
            for neighbor in neighbors4(x, y, width, height).into_iter().flatten() {
                let (nx, ny) = neighbor;
                let npixel = ny as usize * width as usize + nx as usize;
                if cell_of[npixel] != u32::MAX {
                    continue;
                }
                let d2 = dist2(nx as f64 + 0.5, ny as f64 + 0.5, sx, sy);
                if d2 < best_dist2[npixel] {
                    best_dist2[npixel] = d2;
                    // Distance is monotone non-decreasing outward from a
                    // site, so the target bucket is always >= cursor; the
                    // `floor` clamp only guards floating-point edge cases.
                    buckets[bucket_key(d2, cursor)].push((npixel as u32, site));
                }
            }
        }
        cursor += 1;
    }

    // Disconnected leftovers shouldn't occur on a fully-connected grid with
    // at least one site, but fall back to brute force for robustness.
    for pixel in 0..pixel_count {
        if cell_of[pixel] != u32::MAX {
            continue;
        }
        let (x, y) = image.xy_of(pixel);
        let (cx, cy) = (x as f64 + 0.5, y as f64 + 0.5);
        let mut best_site = 0u32;
        let mut best_d2 = f64::INFINITY;
        for (i, (&sx, &sy)) in xs.iter().zip(ys.iter()).enumerate() {
            let d2 = dist2(cx, cy, sx, sy);
            if d2 < best_d2 {
                best_d2 = d2;
                best_site = i as u32;
            }
        }
        cell_of[pixel] = best_site;
        best_dist2[pixel] = best_d2;
    }

    (cell_of, best_dist2)
}

impl ComputeBackend for CpuBackend {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn tessellate(&self, image: &Image, sites: &SiteCollection) -> ComputeResult<VoronoiResult> {
        let width = image.width();
        let height = image.height();
        if width == 0 || height == 0 {
            return Err(ComputeError::InvalidDimensions(width, height));
        }
        let n = sites.len();
        if n == 0 {
            return Err(ComputeError::OperationFailed("cannot tessellate with zero sites".into()));
        }

        let xs = sites.xs();
        let ys = sites.ys();
        let (cell_of, best_dist2) = flood(image, xs, ys);

        // Per-strip accumulation, reduced with rayon: each strip produces
        // partial (sum_r, sum_g, sum_b, area, sum_x, sum_y) per site, which
        // fold/reduce combines across strips.
        let row_bytes = width as usize;
        let strips: Vec<&[u32]> = cell_of.chunks(row_bytes).collect();

        #[derive(Clone)]
        struct Accum {
            sum_rgb: Vec<[u64; 3]>,
            area: Vec<u32>,
            sum_xy: Vec<(f64, f64)>,
        }

        let empty_accum = || Accum {
            sum_rgb: vec![[0u64; 3]; n],
            area: vec![0u32; n],
            sum_xy: vec![(0.0, 0.0); n],
        };

        let combined = strips
            .par_iter()
            .enumerate()
            .map(|(row, row_cells)| {
                let mut acc = empty_accum();
                for (col, &site) in row_cells.iter().enumerate() {
                    let site = site as usize;
                    let pixel_idx = row * row_bytes + col;
                    let rgb = image.rgb_at_index(pixel_idx);
                    acc.sum_rgb[site][0] += rgb[0] as u64;
                    acc.sum_rgb[site][1] += rgb[1] as u64;
                    acc.sum_rgb[site][2] += rgb[2] as u64;
                    acc.area[site] += 1;
                    acc.sum_xy[site].0 += col as f64 + 0.5;
                    acc.sum_xy[site].1 += row as f64 + 0.5;
                }
                acc
            })
            .reduce(empty_accum, |mut a, b| {
                for i in 0..n {
                    a.sum_rgb[i][0] += b.sum_rgb[i][0];
                    a.sum_rgb[i][1] += b.sum_rgb[i][1];
                    a.sum_rgb[i][2] += b.sum_rgb[i][2];
                    a.area[i] += b.area[i];
                    a.sum_xy[i].0 += b.sum_xy[i].0;
                    a.sum_xy[i].1 += b.sum_xy[i].1;
                }
                a
            });

        let mut cell_color = Vec::with_capacity(n);
        let mut cell_centroid = Vec::with_capacity(n);
        for i in 0..n {
            let area = combined.area[i];
            if area == 0 {
                let px = (xs[i].floor() as i64).clamp(0, width as i64 - 1) as u32;
                let py = (ys[i].floor() as i64).clamp(0, height as i64 - 1) as u32;
                let fallback = image.rgb_at(px, py).unwrap_or([128, 128, 128]);
                cell_color.push(fallback);
                cell_centroid.push((xs[i], ys[i]));
            } else {
                let [r, g, b] = combined.sum_rgb[i];
                cell_color.push([(r / area as u64) as u8, (g / area as u64) as u8, (b / area as u64) as u8]);
                let (sx, sy) = combined.sum_xy[i];
                cell_centroid.push((sx / area as f64, sy / area as f64));
            }
        }

        let farthest_pixel = best_dist2
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let farthest_point = image.xy_of(farthest_pixel);

        VoronoiResult::new(width, height, n, cell_of, cell_color, combined.area, cell_centroid, farthest_point)
            .map_err(ComputeError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voronoi_core::Site;

    fn solid_image(width: u32, height: u32, rgb: [u8; 3]) -> Image {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
        }
        Image::new(data, width, height).unwrap()
    }

    #[test]
    fn single_site_claims_every_pixel() {
        let image = solid_image(4, 4, [128, 128, 128]);
        let mut sites = SiteCollection::new();
        sites.push(Site { x: 2.0, y: 2.0, vx: 1.0, vy: 0.0 });

        let backend = CpuBackend::new();
        let result = backend.tessellate(&image, &sites).unwrap();

        assert!(result.cell_of().iter().all(|&c| c == 0));
        assert_eq!(result.cell_area(), &[16]);
        assert_eq!(result.cell_color(), &[[128, 128, 128]]);
    }

    #[test]
    fn two_pixel_image_splits_evenly() {
        let mut data = Vec::new();
        data.extend_from_slice(&[0, 0, 0, 255]);
        data.extend_from_slice(&[255, 255, 255, 255]);
        let image = Image::new(data, 2, 1).unwrap();

        let mut sites = SiteCollection::new();
        sites.push(Site { x: 0.5, y: 0.5, vx: 1.0, vy: 0.0 });
        sites.push(Site { x: 1.5, y: 0.5, vx: 1.0, vy: 0.0 });

        let backend = CpuBackend::new();
        let result = backend.tessellate(&image, &sites).unwrap();

        assert_eq!(result.cell_of(), &[0, 1]);
        assert_eq!(result.cell_color(), &[[0, 0, 0], [255, 255, 255]]);
        assert_eq!(result.cell_area(), &[1, 1]);
    }

    #[test]
    fn area_sums_to_pixel_count() {
        let image = solid_image(10, 10, [64, 32, 200]);
        let mut sites = SiteCollection::new();
        for i in 0..5 {
            sites.push(Site { x: (i as f64) * 2.0 + 1.0, y: 5.0, vx: 1.0, vy: 0.0 });
        }
        let backend = CpuBackend::new();
        let result = backend.tessellate(&image, &sites).unwrap();
        let total: u32 = result.cell_area().iter().sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn rejects_zero_sites() {
        let image = solid_image(2, 2, [0, 0, 0]);
        let sites = SiteCollection::new();
        let backend = CpuBackend::new();
        assert!(backend.tessellate(&image, &sites).is_err());
    }

    #[test]
    fn assignment_matches_nearest_site_by_brute_force() {
        let image = solid_image(8, 8, [10, 10, 10]);
        let mut sites = SiteCollection::new();
        sites.push(Site { x: 1.0, y: 1.0, vx: 1.0, vy: 0.0 });
        sites.push(Site { x: 6.0, y: 6.0, vx: 1.0, vy: 0.0 });
        sites.push(Site { x: 1.0, y: 6.0, vx: 1.0, vy: 0.0 });

        let backend = CpuBackend::new();
        let result = backend.tessellate(&image, &sites).unwrap();

        let xs = sites.xs();
        let ys = sites.ys();
        for y in 0..8u32 {
            for x in 0..8u32 {
                let (cx, cy) = (x as f64 + 0.5, y as f64 + 0.5);
                let expected = (0..3)
                    .map(|i| (i, dist2(cx, cy, xs[i], ys[i])))
                    .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
                    .map(|(i, _)| i as u32)
                    .unwrap();
                assert_eq!(result.cell_of_at(x, y).unwrap(), expected);
            }
        }
    }
}
