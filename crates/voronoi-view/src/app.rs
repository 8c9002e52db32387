//! Main viewer application: loads an image, runs the Engine live at the
//! UI's frame rate, and paints `cell_of`/`cell_color` to a texture.

use std::path::PathBuf;

use egui::{Color32, ColorImage, TextureHandle, TextureOptions};

use voronoi_compute::Backend;
use voronoi_core::VoronoiResult;
use voronoi_engine::Engine;

use crate::state::{Params, SplitStrategyChoice, ViewerPersistence};

/// Configuration for launching the viewer.
#[derive(Debug, Clone, Default)]
pub struct ViewerConfig {
    /// Compute backend to request (`Backend::Auto` picks the best available).
    pub backend: Backend,
    /// Initial site count before the first frame.
    pub initial_sites: usize,
    /// PRNG seed for reproducible sampling and physics.
    pub seed: u32,
    /// Favor dark pixels instead of bright ones when sampling initial sites.
    pub inverse_bias: bool,
}

/// Interactive Voronoi-tessellation viewer.
pub struct ViewerApp {
    engine: Engine,
    image_path: Option<PathBuf>,
    source_dims: Option<(u32, u32)>,

    params: Params,
    playing: bool,
    seed: u32,
    inverse_bias: bool,

    texture: Option<TextureHandle>,
    pending_image: Option<ColorImage>,
    error: Option<String>,
}

impl ViewerApp {
    /// Creates a new viewer application.
    ///
    /// Loads `image_path` if given; otherwise the viewer starts idle until
    /// a file is opened or dropped onto the window.
    pub fn new(cc: &eframe::CreationContext<'_>, image_path: Option<PathBuf>, config: ViewerConfig) -> Self {
        let engine = Engine::new(config.backend).expect("CPU backend construction is infallible");

        let persistence: ViewerPersistence = cc.storage.and_then(|s| eframe::get_value(s, "voronoi_viewer_state")).unwrap_or_default();
        let mut params = Params { target: config.initial_sites.max(1), ..Params::default() };
        persistence.apply(&mut params);

        let mut app = Self {
            engine,
            image_path: None,
            source_dims: None,
            params,
            playing: true,
            seed: config.seed,
            inverse_bias: config.inverse_bias,
            texture: None,
            pending_image: None,
            error: None,
        };

        if let Some(path) = image_path {
            app.load_image(&path);
        }
        app
    }

    fn load_image(&mut self, path: &std::path::Path) {
        match image::ImageReader::open(path).and_then(|r| r.with_guessed_format()) {
            Ok(reader) => match reader.decode() {
                Ok(decoded) => {
                    let rgba = decoded.to_rgba8();
                    let (width, height) = (rgba.width(), rgba.height());
                    let data = rgba.into_raw();
                    if let Err(e) = self.engine.set_image(data, width, height) {
                        self.error = Some(format!("invalid image: {e}"));
                        return;
                    }
                    let n = self.params.target.min((width as usize * height as usize).max(1));
                    if let Err(e) = self.engine.set_sites_from_sampler(n, self.inverse_bias, self.seed) {
                        self.error = Some(format!("failed to sample sites: {e}"));
                        return;
                    }
                    self.source_dims = Some((width, height));
                    self.image_path = Some(path.to_path_buf());
                    self.error = None;
                }
                Err(e) => self.error = Some(format!("failed to decode {}: {e}", path.display())),
            },
            Err(e) => self.error = Some(format!("failed to open {}: {e}", path.display())),
        }
    }

    fn reseed(&mut self) {
        self.seed = self.seed.wrapping_add(1);
        if self.source_dims.is_some() {
            let n = self.params.target.max(1);
            if let Err(e) = self.engine.set_sites_from_sampler(n, self.inverse_bias, self.seed) {
                self.error = Some(format!("failed to reseed: {e}"));
            }
        }
    }

    fn advance_frame(&mut self) {
        if self.source_dims.is_none() {
            return;
        }
        let p = self.params;
        if let Err(e) = self.engine.adjust_count(p.target, p.doubling_time, p.dt, p.strategy.into()) {
            self.error = Some(format!("count controller error: {e}"));
            return;
        }
        if let Err(e) = self.engine.step(p.speed, p.dt, p.pull, p.theta, p.sigma) {
            self.error = Some(format!("physics error: {e}"));
            return;
        }
        match self.engine.compute() {
            Ok(result) => self.paint(&result),
            Err(e) => self.error = Some(format!("compute error: {e}")),
        }
    }

    fn paint(&mut self, result: &VoronoiResult) {
        self.error = None;
        let (w, h) = (result.width() as usize, result.height() as usize);
        let mut pixels = Vec::with_capacity(w * h);
        for &site in result.cell_of() {
            let [r, g, b] = result.cell_color()[site as usize];
            pixels.push(Color32::from_rgb(r, g, b));
        }
        self.pending_image = Some(ColorImage { size: [w, h], pixels });
    }

    fn draw_controls(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button(if self.playing { "Pause" } else { "Play" }).clicked() {
                    self.playing = !self.playing;
                }
                if ui.button("Reseed").clicked() {
                    self.reseed();
                }
                if ui.button("Open...").clicked() {
                    self.open_file_dialog();
                }
                ui.separator();
                if let Some((w, h)) = self.source_dims {
                    let name = self.image_path.as_ref().and_then(|p| p.file_name()).and_then(|n| n.to_str()).unwrap_or("?");
                    ui.label(format!("{name} - {w}x{h}, N = {}", self.engine.site_count()));
                }
            });
            ui.horizontal_wrapped(|ui| {
                ui.add(egui::Slider::new(&mut self.params.speed, 0.0..=300.0).text("speed"));
                ui.add(egui::Slider::new(&mut self.params.pull, 0.0..=1.0).text("pull"));
                ui.add(egui::Slider::new(&mut self.params.theta, 0.0..=10.0).text("theta"));
                ui.add(egui::Slider::new(&mut self.params.sigma, 0.0..=10.0).text("sigma"));
            });
            ui.horizontal_wrapped(|ui| {
                ui.add(egui::Slider::new(&mut self.params.target, 1..=20_000).logarithmic(true).text("target N"));
                ui.add(egui::Slider::new(&mut self.params.doubling_time, 0.1..=30.0).text("doubling time (s)"));
                egui::ComboBox::from_id_salt("strategy")
                    .selected_text(self.params.strategy.label())
                    .show_ui(ui, |ui| {
                        for &choice in SplitStrategyChoice::all() {
                            ui.selectable_value(&mut self.params.strategy, choice, choice.label());
                        }
                    });
            });
        });
    }

    fn draw_hints(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("hints").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(err) = &self.error {
                    ui.colored_label(Color32::RED, err);
                } else {
                    ui.label("Space: play/pause | O: open | R: reseed | Esc: exit");
                }
            });
        });
    }

    fn draw_canvas(&mut self, ctx: &egui::Context) {
        if let Some(image) = self.pending_image.take() {
            self.texture = Some(ctx.load_texture("voronoi_frame", image, TextureOptions::NEAREST));
        }
        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_size();
            if let Some(texture) = &self.texture {
                let tex_size = texture.size_vec2();
                let scale = (available.x / tex_size.x).min(available.y / tex_size.y).max(0.01);
                let (rect, _response) = ui.allocate_exact_size(available, egui::Sense::hover());
                let painted_size = tex_size * scale;
                let top_left = rect.center() - painted_size / 2.0;
                let image_rect = egui::Rect::from_min_size(top_left, painted_size);
                ui.painter().image(texture.id(), image_rect, egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)), Color32::WHITE);
            } else {
                ui.centered_and_justified(|ui| {
                    ui.label("Double-click or drag an image file to begin");
                });
            }
        });
    }

    fn open_file_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new().add_filter("Images", &["png", "jpg", "jpeg", "bmp", "gif"]).pick_file() {
            self.load_image(&path);
        }
    }

    fn handle_input(&mut self, ctx: &egui::Context) -> bool {
        let mut exit = false;
        let mut toggle_play = false;
        let mut open_file = false;
        let mut reseed = false;
        let mut dropped_path = None;
        ctx.input(|i| {
            if i.key_pressed(egui::Key::Escape) {
                exit = true;
            }
            if i.key_pressed(egui::Key::Space) {
                toggle_play = true;
            }
            if i.key_pressed(egui::Key::O) {
                open_file = true;
            }
            if i.key_pressed(egui::Key::R) {
                reseed = true;
            }
            if let Some(file) = i.raw.dropped_files.first() {
                dropped_path = file.path.clone();
            }
        });
        if toggle_play {
            self.playing = !self.playing;
        }
        if open_file {
            self.open_file_dialog();
        }
        if reseed {
            self.reseed();
        }
        if let Some(path) = dropped_path {
            self.load_image(&path);
        }
        exit
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.handle_input(ctx) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }

        if self.playing {
            self.advance_frame();
        }

        self.draw_controls(ctx);
        self.draw_hints(ctx);
        self.draw_canvas(ctx);

        if self.playing {
            ctx.request_repaint();
        }
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let persistence = ViewerPersistence::from_params(&self.params);
        eframe::set_value(storage, "voronoi_viewer_state", &persistence);
    }
}
