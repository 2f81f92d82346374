use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::canvas::ChunkedTexture;
use crate::io::{self, DEFAULT_JPEG_QUALITY, SaveFormat};
use crate::jobs::{RenderQueue, RenderRequest};
use crate::ops::glyph::GlyphStamp;
use crate::ops::tiles::{MAX_TILE_SIZE, MIN_TILE_SIZE, TileSize};
use crate::settings::Settings;
use crate::state::Session;

/// Height reserved below the canvases for the control strip.
pub const CONTROL_STRIP_HEIGHT: f32 = 100.0;

const APP_TITLE: &str = "ASCII Art Generator";

/// Size of each canvas for a given window size: half the width, full height
/// minus the control strip.
pub fn canvas_size(window: egui::Vec2) -> egui::Vec2 {
    egui::vec2(
        (window.x / 2.0).max(0.0),
        (window.y - CONTROL_STRIP_HEIGHT).max(0.0),
    )
}

pub struct TilerApp {
    session: Session,
    renderer: RenderQueue,
    settings: Settings,

    /// Bound to the slider widget; pushed into the session on change.
    slider_value: u32,

    /// Source texture tagged with the session revision it was built from.
    source_texture: Option<(u64, ChunkedTexture)>,
    rendered_texture: Option<ChunkedTexture>,

    window_title: String,

    /// True only on the very first update() call.
    first_frame: bool,
}

impl TilerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: Settings) -> Self {
        let glyph = GlyphStamp::load(&settings.glyph_font);
        let (image, origin) = io::load_startup_image(&settings.default_image);
        let tile_size = TileSize::default();
        let session = Session::from_startup(image, origin, tile_size, settings.debounce);
        let renderer = RenderQueue::new(Arc::new(glyph)).with_repaint(cc.egui_ctx.clone());

        Self {
            slider_value: tile_size.get(),
            session,
            renderer,
            settings,
            source_texture: None,
            rendered_texture: None,
            window_title: String::new(),
            first_frame: true,
        }
    }

    fn submit(&mut self, request: RenderRequest) {
        let tile_size = request.tile_size;
        let generation = self.renderer.submit(request);
        crate::log_info!("Render #{} started ({})", generation, tile_size);
    }

    /// Load button: ask for a file, then load it.
    fn handle_load(&mut self) {
        if let Some(path) = io::pick_open_path() {
            self.open_path(&path);
        }
    }

    /// Load `path` into the session. Failures are logged and leave everything as it was.
    fn open_path(&mut self, path: &Path) {
        match self.session.load_path(path, Instant::now()) {
            Ok(Some(request)) => self.submit(request),
            Ok(None) => {}
            Err(e) => crate::log_err!("Failed to open image {}: {}", path.display(), e),
        }
    }

    fn handle_slider(&mut self, value: u32) {
        match self.session.set_tile_size(value, Instant::now()) {
            Ok(Some(request)) => self.submit(request),
            Ok(None) => {}
            Err(e) => crate::log_err!("{}", e),
        }
    }

    /// Save button: render synchronously at the current tile size, then write
    /// to the chosen path in the format its extension names.
    fn handle_save(&mut self) {
        let image = self.session.render_now(self.renderer.glyph());
        let Some(path) = io::pick_save_path() else {
            return;
        };
        if let Err(e) = save_to(&image, &path) {
            crate::log_err!("Failed to save {}: {}", path.display(), e);
        }
    }

    /// Install the newest finished render, if any.
    fn poll_renders(&mut self, ctx: &egui::Context) {
        if let Some(result) = self.renderer.drain_latest() {
            self.rendered_texture = Some(ChunkedTexture::upload(ctx, "rendered", &result.image));
        }
    }

    fn sync_source_texture(&mut self, ctx: &egui::Context) {
        let revision = self.session.source_revision();
        if self
            .source_texture
            .as_ref()
            .is_some_and(|(rev, _)| *rev == revision)
        {
            return;
        }
        let texture = ChunkedTexture::upload(ctx, "source", self.session.source());
        self.source_texture = Some((revision, texture));
    }

    fn sync_title(&mut self, ctx: &egui::Context) {
        let title = match self.session.source_path().and_then(|p| p.file_name()) {
            Some(name) => format!("{} - {}", APP_TITLE, name.to_string_lossy()),
            None => APP_TITLE.to_string(),
        };
        if title != self.window_title {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title.clone()));
            self.window_title = title;
        }
    }

    fn controls_ui(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_centered(|ui| {
            if ui.button("Load image").clicked() {
                self.handle_load();
            }

            ui.add_space(24.0);
            let slider = ui.add(
                egui::Slider::new(&mut self.slider_value, MIN_TILE_SIZE..=MAX_TILE_SIZE)
                    .text("Tile size"),
            );
            if slider.changed() {
                self.handle_slider(self.slider_value);
            }
            if self.renderer.pending_jobs() > 0 {
                ui.spinner();
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Save ASCII art").clicked() {
                    self.handle_save();
                }
            });
        });
    }

    fn canvases_ui(&self, ui: &mut egui::Ui, size: egui::Vec2) {
        let source = self.source_texture.as_ref().map(|(_, tex)| tex);
        let rendered = self.rendered_texture.as_ref();
        ui.columns(2, |cols| {
            canvas(&mut cols[0], "source_canvas", source, size);
            canvas(&mut cols[1], "rendered_canvas", rendered, size);
        });
    }
}

/// Write `image` to `path`, choosing the encoder from the extension.
pub fn save_to(image: &RgbaImage, path: &Path) -> Result<(), crate::error::TilerError> {
    let format = SaveFormat::from_path(path)?;
    io::encode_and_write(image, path, format, DEFAULT_JPEG_QUALITY)?;
    crate::log_info!("Image saved as {}", path.display());
    Ok(())
}

/// A scrollable view of one texture at 1:1 scale.
fn canvas(ui: &mut egui::Ui, id: &str, texture: Option<&ChunkedTexture>, size: egui::Vec2) {
    egui::ScrollArea::both()
        .id_source(id)
        .max_width(size.x)
        .max_height(size.y)
        .auto_shrink([false, false])
        .show(ui, |ui| match texture {
            Some(tex) => tex.show(ui),
            None => {
                ui.allocate_space(egui::vec2(1.0, 1.0));
            }
        });
}

fn dropped_paths(ctx: &egui::Context) -> Vec<PathBuf> {
    ctx.input(|i| {
        i.raw
            .dropped_files
            .iter()
            .filter_map(|f| f.path.clone())
            .collect()
    })
}

impl eframe::App for TilerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.first_frame {
            self.first_frame = false;
            ctx.send_viewport_cmd(egui::ViewportCommand::Maximized(true));
            if let Some(request) = self.session.request_update(Instant::now()) {
                self.submit(request);
            }
        }

        // Only the first dropped file is opened; there is one source image.
        if let Some(path) = dropped_paths(ctx).into_iter().next() {
            self.open_path(&path);
        }

        self.poll_renders(ctx);
        self.sync_source_texture(ctx);
        self.sync_title(ctx);

        egui::TopBottomPanel::bottom("controls")
            .exact_height(CONTROL_STRIP_HEIGHT)
            .show(ctx, |ui| self.controls_ui(ui));

        let size = canvas_size(ctx.screen_rect().size());
        egui::CentralPanel::default().show(ctx, |ui| self.canvases_ui(ui, size));

        // Keep polling the render queue even when no input arrives.
        ctx.request_repaint_after(self.settings.poll_interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvases_split_the_window_width() {
        let size = canvas_size(egui::vec2(1600.0, 900.0));
        assert_eq!(size, egui::vec2(800.0, 800.0));
    }

    #[test]
    fn tiny_windows_never_produce_negative_canvases() {
        let size = canvas_size(egui::vec2(10.0, 40.0));
        assert_eq!(size, egui::vec2(5.0, 0.0));
    }

    #[test]
    fn save_to_rejects_unknown_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let img = RgbaImage::new(4, 4);
        let bad = dir.path().join("out.tiff");
        assert!(save_to(&img, &bad).is_err());
        assert!(!bad.exists());
        let good = dir.path().join("out.png");
        save_to(&img, &good).unwrap();
        assert!(good.exists());
    }
}
