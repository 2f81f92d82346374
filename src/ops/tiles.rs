// ============================================================================
// TILE RENDERER: rayon-parallelized block rendering
// ============================================================================
//
// The image is cut into a grid of `tile_w × tile_h` cells (the last row and
// column are clipped by the image edge). Each cell is flattened to the color
// of its top-left source pixel and the block glyph is stamped over it in that
// same color.
//
// Work is split into horizontal bands one tile-row tall, so every band owns a
// disjoint slice of the output buffer.
// ============================================================================

use image::RgbaImage;
use rayon::prelude::*;

use crate::error::TilerError;
use crate::ops::glyph::GlyphStamp;

/// Smallest and largest values offered by the size slider.
pub const MIN_TILE_SIZE: u32 = 1;
pub const MAX_TILE_SIZE: u32 = 50;
pub const DEFAULT_TILE_SIZE: u32 = 10;

/// Edge length of a tile in pixels. Always at least 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileSize(u32);

impl TileSize {
    pub fn new(pixels: u32) -> Result<Self, TilerError> {
        if pixels < MIN_TILE_SIZE {
            return Err(TilerError::InvalidTileSize(pixels));
        }
        Ok(Self(pixels))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for TileSize {
    fn default() -> Self {
        Self(DEFAULT_TILE_SIZE)
    }
}

impl std::fmt::Display for TileSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}px", self.0)
    }
}

/// Render square tiles of `tile` pixels. See [`render_tiles_wh`].
pub fn render_tiles(source: &RgbaImage, tile: TileSize, glyph: &GlyphStamp) -> RgbaImage {
    render_tiles_wh(source, tile, tile, glyph)
}

/// Render `source` as a grid of solid tiles with the glyph stamped on each.
///
/// The source is never modified; the result has the same dimensions.
pub fn render_tiles_wh(
    source: &RgbaImage,
    tile_w: TileSize,
    tile_h: TileSize,
    glyph: &GlyphStamp,
) -> RgbaImage {
    let w = source.width();
    let h = source.height();
    let mut out = RgbaImage::new(w, h);
    if w == 0 || h == 0 {
        return out;
    }

    let stride = w as usize * 4;
    let tw = tile_w.get().min(w) as usize;
    let band_rows = tile_h.get().min(h) as usize;
    let src_raw = source.as_raw();

    out.par_chunks_mut(stride * band_rows)
        .enumerate()
        .for_each(|(band, band_out)| {
            let y0 = band * band_rows;
            let rows = band_out.len() / stride;

            let mut x0 = 0usize;
            while x0 < w as usize {
                let x1 = (x0 + tw).min(w as usize);
                let si = y0 * stride + x0 * 4;
                let fill = [
                    src_raw[si],
                    src_raw[si + 1],
                    src_raw[si + 2],
                    src_raw[si + 3],
                ];
                fill_tile(band_out, stride, x0, x1, rows, fill);
                // The glyph takes the tile's own color.
                stamp_glyph(band_out, stride, x0, x1, rows, fill, glyph);
                x0 = x1;
            }
        });

    out
}

fn fill_tile(band: &mut [u8], stride: usize, x0: usize, x1: usize, rows: usize, color: [u8; 4]) {
    for ry in 0..rows {
        let row = &mut band[ry * stride..(ry + 1) * stride];
        for px in row[x0 * 4..x1 * 4].chunks_exact_mut(4) {
            px.copy_from_slice(&color);
        }
    }
}

/// Alpha-blend the glyph over the tile, clipped to the tile rectangle.
fn stamp_glyph(
    band: &mut [u8],
    stride: usize,
    x0: usize,
    x1: usize,
    rows: usize,
    color: [u8; 4],
    glyph: &GlyphStamp,
) {
    let rows = rows.min(glyph.height() as usize);
    let x_end = x1.min(x0 + glyph.width() as usize);
    for ry in 0..rows {
        for x in x0..x_end {
            let cov = glyph.coverage((x - x0) as u32, ry as u32);
            if cov <= 0.0 {
                continue;
            }
            let pi = ry * stride + x * 4;
            for c in 0..4 {
                band[pi + c] = blend_channel(band[pi + c], color[c], cov);
            }
        }
    }
}

#[inline]
fn blend_channel(dst: u8, src: u8, cov: f32) -> u8 {
    let d = dst as f32;
    (d + (src as f32 - d) * cov).round().clamp(0.0, 255.0) as u8
}
