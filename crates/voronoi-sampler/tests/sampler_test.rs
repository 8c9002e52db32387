//! Determinism and brightness-bias scenarios for `SiteSampler`.

use voronoi_core::Image;
use voronoi_sampler::SiteSampler;

fn gradient_image(width: u32, height: u32) -> Image {
    let mut data = Vec::with_capacity(width as usize * height as usize * 4);
    for _ in 0..height {
        for x in 0..width {
            let v = (x as f64 / (width - 1) as f64 * 255.0) as u8;
            data.extend_from_slice(&[v, v, v, 255]);
        }
    }
    Image::new(data, width, height).unwrap()
}

/// Invariant 8: sampling twice with identical inputs yields the identical
/// ordered list.
#[test]
fn invariant8_sampling_is_deterministic() {
    let image = gradient_image(10, 10);
    let sampler = SiteSampler::new(false, 1234);

    let a = sampler.sample(&image, 15).unwrap();
    let b = sampler.sample(&image, 15).unwrap();

    assert_eq!(a, b);
}

/// S5: on a left-to-right brightness gradient, bright-biased sampling skews
/// toward higher x than dark-biased sampling on the same image and seed.
#[test]
fn s5_inverse_bias_shifts_mean_x_toward_darker_pixels() {
    let image = gradient_image(10, 10);

    let bright = SiteSampler::new(false, 5).sample(&image, 10).unwrap();
    let dark = SiteSampler::new(true, 5).sample(&image, 10).unwrap();

    let mean_x = |points: &[voronoi_sampler::SampledPoint]| points.iter().map(|p| p.x).sum::<f64>() / points.len() as f64;

    assert!(mean_x(&bright) > mean_x(&dark), "bright-biased mean x should exceed dark-biased mean x");
}

#[test]
fn rejects_zero_sites() {
    let image = gradient_image(4, 4);
    let err = SiteSampler::new(false, 1).sample(&image, 0).unwrap_err();
    assert!(matches!(err, voronoi_sampler::Error::ZeroSites));
}

#[test]
fn rejects_more_sites_than_pixels() {
    let image = gradient_image(2, 2);
    let err = SiteSampler::new(false, 1).sample(&image, 5).unwrap_err();
    assert!(err.is_too_many_sites());
}
