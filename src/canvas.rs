// ============================================================================
// CHUNKED TEXTURE: an image uploaded as a grid of GPU textures
// ============================================================================
//
// GPU backends reject textures wider or taller than `max_texture_side`, so a
// large image is cut into chunks no bigger than that and painted piecewise
// inside the canvas rect.
// ============================================================================

use egui::{Color32, Pos2, Rect, Vec2};
use image::RgbaImage;

/// Preferred chunk edge; lowered to the backend limit when that is smaller.
pub const TEXTURE_CHUNK: u32 = 2048;

struct TextureChunk {
    /// Top-left corner of the chunk in image pixels.
    offset: Vec2,
    size: Vec2,
    texture: egui::TextureHandle,
}

pub struct ChunkedTexture {
    size: Vec2,
    chunks: Vec<TextureChunk>,
}

impl ChunkedTexture {
    /// Upload `image` as chunks that fit the context's texture limit.
    pub fn upload(ctx: &egui::Context, name: &str, image: &RgbaImage) -> Self {
        let max_side = ctx.input(|i| i.max_texture_side);
        let chunk = chunk_side(max_side);
        let (w, h) = image.dimensions();

        let mut chunks = Vec::new();
        for y0 in (0..h).step_by(chunk as usize) {
            for x0 in (0..w).step_by(chunk as usize) {
                let cw = chunk.min(w - x0);
                let ch = chunk.min(h - y0);
                let region = image::imageops::crop_imm(image, x0, y0, cw, ch).to_image();
                let pixels = egui::ColorImage::from_rgba_unmultiplied(
                    [cw as usize, ch as usize],
                    region.as_raw(),
                );
                let texture = ctx.load_texture(
                    format!("{}_{}_{}", name, x0, y0),
                    pixels,
                    egui::TextureOptions::NEAREST,
                );
                chunks.push(TextureChunk {
                    offset: Vec2::new(x0 as f32, y0 as f32),
                    size: Vec2::new(cw as f32, ch as f32),
                    texture,
                });
            }
        }

        if chunks.len() > 1 {
            crate::log_info!(
                "{} image {}x{} split into {} textures (limit {})",
                name,
                w,
                h,
                chunks.len(),
                max_side
            );
        }

        Self {
            size: Vec2::new(w as f32, h as f32),
            chunks,
        }
    }

    /// Allocate the image's full size in `ui` and paint the visible chunks.
    pub fn show(&self, ui: &mut egui::Ui) {
        let (rect, _) = ui.allocate_exact_size(self.size, egui::Sense::hover());
        let clip = ui.clip_rect();
        let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
        for chunk in &self.chunks {
            let target = Rect::from_min_size(rect.min + chunk.offset, chunk.size);
            if clip.intersects(target) {
                ui.painter()
                    .image(chunk.texture.id(), target, uv, Color32::WHITE);
            }
        }
    }
}

/// Edge length of one chunk for a backend limit of `max_side`.
fn chunk_side(max_side: usize) -> u32 {
    let limit = u32::try_from(max_side).unwrap_or(u32::MAX);
    TEXTURE_CHUNK.min(limit).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn context_with_limit(max_side: usize) -> egui::Context {
        let ctx = egui::Context::default();
        ctx.begin_frame(egui::RawInput {
            max_texture_side: Some(max_side),
            ..Default::default()
        });
        ctx
    }

    #[test]
    fn chunk_side_respects_backend_limit() {
        assert_eq!(chunk_side(16384), TEXTURE_CHUNK);
        assert_eq!(chunk_side(64), 64);
        assert_eq!(chunk_side(0), 1);
    }

    #[test]
    fn oversized_image_is_split_below_texture_limit() {
        let ctx = context_with_limit(64);
        let img = RgbaImage::from_pixel(150, 70, Rgba([9, 8, 7, 255]));

        let tex = ChunkedTexture::upload(&ctx, "big", &img);

        assert_eq!(tex.size, Vec2::new(150.0, 70.0));
        assert_eq!(tex.chunks.len(), 3 * 2);
        for chunk in &tex.chunks {
            let [w, h] = chunk.texture.size();
            assert!(w <= 64 && h <= 64, "chunk {}x{}", w, h);
            assert_eq!(chunk.size, Vec2::new(w as f32, h as f32));
        }
        let covered: f32 = tex.chunks.iter().map(|c| c.size.x * c.size.y).sum();
        assert_eq!(covered, 150.0 * 70.0);
        let _ = ctx.end_frame();
    }

    #[test]
    fn small_image_is_one_texture() {
        let ctx = context_with_limit(2048);
        let img = RgbaImage::new(100, 100);
        let tex = ChunkedTexture::upload(&ctx, "small", &img);
        assert_eq!(tex.chunks.len(), 1);
        assert_eq!(tex.chunks[0].offset, Vec2::ZERO);
        let _ = ctx.end_frame();
    }
}
