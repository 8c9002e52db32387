//! # voronoi-view
//!
//! Interactive viewer for the brightness-weighted Voronoi tessellation
//! animation: load an image, watch sites split/merge/drift live, and tune
//! the physics and count-controller parameters with sliders.
//!
//! # Quick Start
//!
//! ```ignore
//! use voronoi_view::{run, ViewerConfig};
//! use std::path::PathBuf;
//!
//! let config = ViewerConfig::default();
//! let exit_code = run(Some(PathBuf::from("image.png")), config);
//! ```
//!
//! # Keyboard Shortcuts
//!
//! | Key | Action |
//! |-----|--------|
//! | `Space` | Play / pause |
//! | `O` | Open file dialog |
//! | `R` | Reseed sites |
//! | `Esc` | Exit |

#![warn(missing_docs)]
#![warn(clippy::all)]

mod app;
mod state;

pub use app::{ViewerApp, ViewerConfig};
pub use state::{Params, SplitStrategyChoice, ViewerPersistence};

use std::path::{Path, PathBuf};

/// Run the Voronoi animation viewer.
///
/// Creates an eframe window and enters the event loop. If `path` is given
/// and exists, it is loaded as the starting image; otherwise the viewer
/// opens idle until a file is opened or dropped onto the window.
///
/// Returns exit code: 0 for success, 1 for error.
pub fn run<P: AsRef<Path>>(path: Option<P>, config: ViewerConfig) -> i32 {
    let path = path.map(|p| p.as_ref().to_path_buf());

    if let Some(path) = &path {
        if !path.exists() {
            eprintln!("Error: File not found: {}", path.display());
            return 1;
        }
    }

    let title = path.as_ref().map_or_else(
        || "voronoi view".to_string(),
        |p| format!("voronoi view - {}", p.file_name().and_then(|n| n.to_str()).unwrap_or("image")),
    );

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(&title)
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([640.0, 480.0]),
        persistence_path: persistence_path(),
        ..Default::default()
    };

    let result = eframe::run_native(
        &title,
        native_options,
        Box::new(move |cc| Ok(Box::new(ViewerApp::new(cc, path, config)))),
    );

    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Viewer error: {e}");
            1
        }
    }
}

/// Get platform-specific persistence path.
fn persistence_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("voronoi-rs").join("viewer"))
}
