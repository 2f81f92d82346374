use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::TilerError;
use crate::jobs::RenderRequest;
use crate::ops::gate::UpdateGate;
use crate::ops::glyph::GlyphStamp;
use crate::ops::tiles::{TileSize, render_tiles};

/// Whether the user (or the startup default) has supplied a real image yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourcePhase {
    /// Showing the blank placeholder.
    Empty,
    Loaded { path: PathBuf },
}

/// Interactive state of one window: the source image, the tile size and the
/// gate in front of the render jobs. All mutation goes through these methods.
pub struct Session {
    source: Arc<RgbaImage>,
    phase: SourcePhase,
    tile_size: TileSize,
    gate: UpdateGate,
    /// Bumped whenever `source` is replaced, so views know to re-upload it.
    source_revision: u64,
}

impl Session {
    pub fn new(source: RgbaImage, phase: SourcePhase, tile_size: TileSize, debounce: Duration) -> Self {
        Self {
            source: Arc::new(source),
            phase,
            tile_size,
            gate: UpdateGate::new(debounce),
            source_revision: 1,
        }
    }

    /// Session showing the startup image, or the placeholder if `origin` is `None`.
    pub fn from_startup(
        image: RgbaImage,
        origin: Option<PathBuf>,
        tile_size: TileSize,
        debounce: Duration,
    ) -> Self {
        let phase = match origin {
            Some(path) => SourcePhase::Loaded { path },
            None => SourcePhase::Empty,
        };
        Self::new(image, phase, tile_size, debounce)
    }

    pub fn source(&self) -> &Arc<RgbaImage> {
        &self.source
    }

    pub fn phase(&self) -> &SourcePhase {
        &self.phase
    }

    pub fn source_path(&self) -> Option<&Path> {
        match &self.phase {
            SourcePhase::Loaded { path } => Some(path),
            SourcePhase::Empty => None,
        }
    }

    pub fn tile_size(&self) -> TileSize {
        self.tile_size
    }

    pub fn source_revision(&self) -> u64 {
        self.source_revision
    }

    /// Gate an update request. `Some` means a render job should be started.
    pub fn request_update(&mut self, now: Instant) -> Option<RenderRequest> {
        if !self.gate.try_accept(now) {
            return None;
        }
        Some(RenderRequest {
            source: Arc::clone(&self.source),
            tile_size: self.tile_size,
        })
    }

    /// Decode `path` into the source image. On any failure nothing changes.
    pub fn load_path(&mut self, path: &Path, now: Instant) -> Result<Option<RenderRequest>, TilerError> {
        let image = crate::io::load_image(path)?;
        crate::log_info!(
            "Loaded {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        self.source = Arc::new(image);
        self.phase = SourcePhase::Loaded {
            path: path.to_path_buf(),
        };
        self.source_revision += 1;
        Ok(self.request_update(now))
    }

    /// Apply a new slider value. The tile size changes even when the render
    /// request is dropped by the gate.
    pub fn set_tile_size(&mut self, pixels: u32, now: Instant) -> Result<Option<RenderRequest>, TilerError> {
        self.tile_size = TileSize::new(pixels)?;
        Ok(self.request_update(now))
    }

    /// Render the current source synchronously at the current tile size.
    pub fn render_now(&self, glyph: &GlyphStamp) -> RgbaImage {
        render_tiles(&self.source, self.tile_size, glyph)
    }
}
