//! voronoi - offline grow/hold/fade Voronoi animation renderer.
//!
//! Drives a [`voronoi_engine::Engine`] through the three phases of the
//! video-renderer host contract (grow, hold, fade) and writes one PNG per
//! frame into an output directory, as a stand-in for a real video encoder
//! process (which remains the responsibility of an external tool: pipe the
//! frames into `ffmpeg` or similar).

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use voronoi_compute::Backend;
use voronoi_engine::Engine;
use voronoi_physics::SplitStrategy;

/// Global logger instance for file logging, mirroring this codebase's
/// existing CLI convention of a file sink alongside `tracing`'s stderr path.
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

struct Logger {
    file: std::fs::File,
}

impl Logger {
    fn new(path: &PathBuf) -> std::io::Result<Self> {
        let file = std::fs::File::options().append(true).create(true).open(path)?;
        Ok(Self { file })
    }

    fn log(&mut self, msg: &str) {
        let _ = writeln!(self.file, "{msg}");
    }
}

fn log(msg: &str) {
    eprintln!("{msg}");
    if let Ok(mut guard) = LOGGER.lock() {
        if let Some(ref mut logger) = *guard {
            logger.log(msg);
        }
    }
}

fn default_log_path() -> PathBuf {
    if let Ok(exe_path) = std::env::current_exe() {
        let mut log_path = exe_path;
        log_path.set_extension("log");
        log_path
    } else {
        PathBuf::from("voronoi.log")
    }
}

/// Initializes `tracing` based on verbosity level, logging to `log_path` if
/// given, otherwise to stderr once `verbose > 0`.
fn init_tracing(verbose: u8, log_path: Option<&PathBuf>) {
    let filter = match verbose {
        0 => "warn",
        1 => "voronoi=info",
        2 => "voronoi=debug",
        _ => "voronoi=trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if let Some(path) = log_path {
        let log_dir = path.parent().unwrap_or(Path::new("."));
        let log_filename = path.file_name().unwrap_or(std::ffi::OsStr::new("voronoi.log"));
        let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .with_ansi(false)
            .with_writer(file_appender)
            .init();
    } else if verbose > 0 {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .init();
    }
}

#[derive(Parser)]
#[command(name = "voronoi")]
#[command(author, version, about = "Render a Voronoi-tessellation animation of a source image")]
#[command(long_about = "
Drives a brightness-sampled, physics-animated Voronoi tessellation through
grow, hold, and fade phases and writes one PNG frame per tick.

Example:
  voronoi photo.png --out-dir frames --grow-n 400 --grow-seconds 4 \\
      --hold-seconds 3 --fade-seconds 2 --fps 30
")]
struct Cli {
    /// Source image (any format the `image` crate can decode).
    input: PathBuf,

    /// Directory frames are written into, as `frame_000000.png`, ... Created
    /// if it doesn't exist.
    #[arg(long, default_value = "frames")]
    out_dir: PathBuf,

    /// Frames per second; determines Δt for every phase.
    #[arg(long, default_value = "30")]
    fps: u32,

    /// Initial site count before the grow phase begins.
    #[arg(long, default_value = "8")]
    initial_sites: usize,

    /// Target site count at the end of the grow phase.
    #[arg(long, default_value = "256")]
    grow_n: usize,

    /// Grow phase duration in seconds.
    #[arg(long, default_value = "4.0")]
    grow_seconds: f64,

    /// Hold phase duration in seconds (physics-only, no count change).
    #[arg(long, default_value = "3.0")]
    hold_seconds: f64,

    /// Fade phase duration in seconds (blend toward the source image).
    #[arg(long, default_value = "2.0")]
    fade_seconds: f64,

    /// Site speed, pixels/second.
    #[arg(long, default_value = "40.0")]
    speed: f64,

    /// Lloyd centroid-pull strength, `[0, 1]`.
    #[arg(long, default_value = "0.1")]
    pull: f64,

    /// Ornstein-Uhlenbeck drift coefficient θ.
    #[arg(long, default_value = "1.5")]
    theta: f64,

    /// Ornstein-Uhlenbeck wander coefficient σ.
    #[arg(long, default_value = "1.0")]
    sigma: f64,

    /// Split strategy used during the grow phase.
    #[arg(long, value_enum, default_value = "max")]
    split_strategy: CliSplitStrategy,

    /// Favor dark pixels instead of bright ones when sampling initial sites.
    #[arg(long)]
    inverse_bias: bool,

    /// PRNG seed; identical seeds reproduce identical animations.
    #[arg(long, default_value = "0")]
    seed: u32,

    /// Compute backend: auto, cpu, or wgpu. Overridden by `VORONOI_BACKEND`
    /// if that environment variable is set.
    #[arg(long, value_enum, default_value = "auto")]
    backend: CliBackend,

    /// Verbose output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Write a log file alongside the binary (or to a custom path).
    #[arg(short = 'l', long = "log")]
    log: Option<Option<PathBuf>>,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum CliSplitStrategy {
    Max,
    Far,
    Random,
}

impl From<CliSplitStrategy> for SplitStrategy {
    fn from(s: CliSplitStrategy) -> Self {
        match s {
            CliSplitStrategy::Max => SplitStrategy::Max,
            CliSplitStrategy::Far => SplitStrategy::Far,
            CliSplitStrategy::Random => SplitStrategy::Random,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum CliBackend {
    Auto,
    Cpu,
    Wgpu,
}

impl From<CliBackend> for Backend {
    fn from(b: CliBackend) -> Self {
        match b {
            CliBackend::Auto => Backend::Auto,
            CliBackend::Cpu => Backend::Cpu,
            CliBackend::Wgpu => Backend::Wgpu,
        }
    }
}

fn resolve_backend(cli_backend: CliBackend) -> Backend {
    match std::env::var("VORONOI_BACKEND").as_deref() {
        Ok("cpu") => Backend::Cpu,
        Ok("wgpu") => Backend::Wgpu,
        Ok("auto") => Backend::Auto,
        _ => cli_backend.into(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = match &cli.log {
        Some(Some(path)) => Some(path.clone()),
        Some(None) => Some(default_log_path()),
        None => None,
    };
    init_tracing(cli.verbose, log_path.as_ref());
    if let Some(ref path) = log_path {
        if let Ok(logger) = Logger::new(path) {
            if let Ok(mut guard) = LOGGER.lock() {
                *guard = Some(logger);
            }
            if cli.verbose > 0 {
                log(&format!("logging to: {}", path.display()));
            }
        }
    }

    fs::create_dir_all(&cli.out_dir).with_context(|| format!("creating output directory {}", cli.out_dir.display()))?;

    let decoded = image::ImageReader::open(&cli.input)
        .with_context(|| format!("opening {}", cli.input.display()))?
        .decode()
        .with_context(|| format!("decoding {}", cli.input.display()))?
        .to_rgba8();
    let (width, height) = (decoded.width(), decoded.height());
    let rgba = decoded.into_raw();

    let backend = resolve_backend(cli.backend);
    let mut engine = Engine::new(backend).context("constructing engine")?;
    engine.set_image(rgba.clone(), width, height).context("setting source image")?;
    engine
        .set_sites_from_sampler(cli.initial_sites, cli.inverse_bias, cli.seed)
        .context("sampling initial sites")?;

    let dt = 1.0 / cli.fps as f64;
    let mut frame_index: u64 = 0;

    log(&format!("grow phase: {} -> {} sites over {}s", cli.initial_sites, cli.grow_n, cli.grow_seconds));
    run_grow_phase(&mut engine, &cli, dt, &mut frame_index)?;

    log(&format!("hold phase: {}s at N = {}", cli.hold_seconds, engine.site_count()));
    run_hold_phase(&mut engine, &cli, dt, &mut frame_index)?;

    log(&format!("fade phase: {}s blending toward the source image", cli.fade_seconds));
    run_fade_phase(&mut engine, &cli, dt, &rgba, width, height, &mut frame_index)?;

    log(&format!("wrote {frame_index} frames to {}", cli.out_dir.display()));
    Ok(())
}

fn run_grow_phase(engine: &mut Engine, cli: &Cli, dt: f64, frame_index: &mut u64) -> Result<()> {
    let n_frames = (cli.grow_seconds * cli.fps as f64).round().max(0.0) as u64;
    let n_current = engine.site_count().max(1);
    if cli.grow_n != n_current && n_frames > 0 {
        let ratio = cli.grow_n as f64 / n_current as f64;
        let tau = if ratio > 1.0 {
            cli.grow_seconds / ratio.log2()
        } else if ratio < 1.0 {
            cli.grow_seconds / (1.0 / ratio).log2()
        } else {
            cli.grow_seconds.max(1e-6)
        };
        engine
            .adjust_count(cli.grow_n, tau, dt, cli.split_strategy.into())
            .context("starting grow-phase count target")?;
    }

    for _ in 0..n_frames {
        engine.step(cli.speed, dt, cli.pull, cli.theta, cli.sigma)?;
        let result = engine.compute()?;
        write_voronoi_frame(&result, cli, frame_index)?;
    }
    Ok(())
}

fn run_hold_phase(engine: &mut Engine, cli: &Cli, dt: f64, frame_index: &mut u64) -> Result<()> {
    let n_frames = (cli.hold_seconds * cli.fps as f64).round().max(0.0) as u64;
    for _ in 0..n_frames {
        engine.step(cli.speed, dt, cli.pull, cli.theta, cli.sigma)?;
        let result = engine.compute()?;
        write_voronoi_frame(&result, cli, frame_index)?;
    }
    Ok(())
}

fn run_fade_phase(engine: &mut Engine, cli: &Cli, dt: f64, source_rgba: &[u8], width: u32, height: u32, frame_index: &mut u64) -> Result<()> {
    let n_frames = (cli.fade_seconds * cli.fps as f64).round().max(1.0) as u64;
    for i in 0..n_frames {
        engine.step(cli.speed, dt, cli.pull, cli.theta, cli.sigma)?;
        let result = engine.compute()?;
        let alpha = (i + 1) as f32 / n_frames as f32;
        write_blended_frame(&result, source_rgba, width, height, alpha, cli, frame_index)?;
    }
    Ok(())
}

/// Paints a [`voronoi_core::VoronoiResult`] to an RGB image buffer using
/// each pixel's `cell_color`.
fn voronoi_to_rgb(result: &voronoi_core::VoronoiResult) -> image::RgbImage {
    let (w, h) = (result.width(), result.height());
    let mut img = image::RgbImage::new(w, h);
    for (i, px) in img.pixels_mut().enumerate() {
        let site = result.cell_of()[i] as usize;
        let [r, g, b] = result.cell_color()[site];
        *px = image::Rgb([r, g, b]);
    }
    img
}

fn write_voronoi_frame(result: &voronoi_core::VoronoiResult, cli: &Cli, frame_index: &mut u64) -> Result<()> {
    let img = voronoi_to_rgb(result);
    save_frame(&img, cli, frame_index)
}

fn write_blended_frame(result: &voronoi_core::VoronoiResult, source_rgba: &[u8], width: u32, height: u32, alpha: f32, cli: &Cli, frame_index: &mut u64) -> Result<()> {
    let voronoi = voronoi_to_rgb(result);
    let mut out = image::RgbImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let v = voronoi.get_pixel(x, y).0;
            let base = (y as usize * width as usize + x as usize) * 4;
            let s = [source_rgba[base], source_rgba[base + 1], source_rgba[base + 2]];
            let blend = |a: u8, b: u8| -> u8 { (a as f32 * (1.0 - alpha) + b as f32 * alpha).round() as u8 };
            out.put_pixel(x, y, image::Rgb([blend(v[0], s[0]), blend(v[1], s[1]), blend(v[2], s[2])]));
        }
    }
    save_frame(&out, cli, frame_index)
}

fn save_frame(img: &image::RgbImage, cli: &Cli, frame_index: &mut u64) -> Result<()> {
    let path = cli.out_dir.join(format!("frame_{:06}.png", *frame_index));
    img.save(&path).with_context(|| format!("writing {}", path.display()))?;
    *frame_index += 1;
    Ok(())
}
