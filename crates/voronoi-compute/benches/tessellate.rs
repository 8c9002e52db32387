use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use voronoi_compute::{create_backend, Backend};
use voronoi_core::{Image, Site, SiteCollection};

fn checkerboard(width: u32, height: u32) -> Image {
    let mut data = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        for x in 0..width {
            let v = if (x + y) % 2 == 0 { 220 } else { 30 };
            data.extend_from_slice(&[v, v, v, 255]);
        }
    }
    Image::new(data, width, height).unwrap()
}

fn sites_grid(width: u32, height: u32, n: usize) -> SiteCollection {
    let mut sites = SiteCollection::new();
    let cols = (n as f64).sqrt().ceil() as u32;
    for i in 0..n {
        let col = i as u32 % cols;
        let row = i as u32 / cols;
        let x = (col as f64 + 0.5) * width as f64 / cols as f64;
        let y = (row as f64 + 0.5) * height as f64 / cols as f64;
        sites.push(Site { x, y, vx: 1.0, vy: 0.0 });
    }
    sites
}

fn bench_cpu_tessellate(c: &mut Criterion) {
    let backend = create_backend(Backend::Cpu).unwrap();
    let mut group = c.benchmark_group("cpu_tessellate");
    for &(size, n) in &[(128u32, 32usize), (256, 128), (512, 512)] {
        let image = checkerboard(size, size);
        let sites = sites_grid(size, size, n);
        group.bench_with_input(BenchmarkId::from_parameter(format!("{size}x{size}_n{n}")), &(image, sites), |b, (image, sites)| {
            b.iter(|| backend.tessellate(image, sites).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_cpu_tessellate);
criterion_main!(benches);
