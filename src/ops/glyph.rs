use ab_glyph::{Font, FontArc, GlyphId, ScaleFont, point};

/// The decorative character stamped over every tile.
pub const BLOCK_GLYPH: char = '█';

/// Pixel height the glyph is rasterized at.
pub const GLYPH_PX: f32 = 11.0;

/// Cell size of the solid fallback stamp (a bitmap default-font cell).
const FALLBACK_CELL: (u32, u32) = (6, 11);

/// A rasterized glyph as a coverage grid anchored at the tile's top-left corner.
///
/// Built once at startup and shared read-only by every render job.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphStamp {
    width: u32,
    height: u32,
    coverage: Vec<f32>,
}

impl GlyphStamp {
    /// A fully opaque rectangle, which is what `█` looks like in any font.
    pub fn solid_block(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            coverage: vec![1.0; width as usize * height as usize],
        }
    }

    /// Build a stamp from a row-major coverage grid. `None` if the grid size is wrong.
    pub fn from_coverage(width: u32, height: u32, coverage: Vec<f32>) -> Option<Self> {
        if coverage.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            coverage: coverage.into_iter().map(|c| c.clamp(0.0, 1.0)).collect(),
        })
    }

    /// The stamp used when no usable system font exists.
    pub fn fallback() -> Self {
        Self::solid_block(FALLBACK_CELL.0, FALLBACK_CELL.1)
    }

    /// Rasterize `ch` from `font` with its ascent line on row 0.
    /// Returns `None` when the font has no glyph for `ch` or the outline is empty.
    pub fn rasterize(font: &FontArc, ch: char, px: f32) -> Option<Self> {
        let glyph_id = font.glyph_id(ch);
        if glyph_id == GlyphId(0) {
            return None;
        }
        let ascent = font.as_scaled(px).ascent();
        let glyph = glyph_id.with_scale_and_position(px, point(0.0, ascent));
        let outlined = font.outline_glyph(glyph)?;
        let bounds = outlined.px_bounds();

        let width = bounds.max.x.ceil().max(0.0) as u32;
        let height = bounds.max.y.ceil().max(0.0) as u32;
        if width == 0 || height == 0 {
            return None;
        }

        let mut coverage = vec![0.0f32; width as usize * height as usize];
        let (bx, by) = (bounds.min.x.floor() as i32, bounds.min.y.floor() as i32);
        outlined.draw(|px, py, cov| {
            let x = bx + px as i32;
            let y = by + py as i32;
            if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
                let idx = y as usize * width as usize + x as usize;
                coverage[idx] = coverage[idx].max(cov);
            }
        });

        Some(Self {
            width,
            height,
            coverage,
        })
    }

    /// Rasterize the block glyph from the named system font, falling back to a
    /// solid cell if the font is missing or lacks the character.
    pub fn load(font_family: &str) -> Self {
        match load_system_font(font_family) {
            Some(font) => match Self::rasterize(&font, BLOCK_GLYPH, GLYPH_PX) {
                Some(stamp) => {
                    crate::log_info!(
                        "Glyph stamp rasterized from \"{}\" ({}x{})",
                        font_family,
                        stamp.width,
                        stamp.height
                    );
                    stamp
                }
                None => {
                    crate::log_warn!(
                        "Font \"{}\" has no '{}' glyph, using solid block",
                        font_family,
                        BLOCK_GLYPH
                    );
                    Self::fallback()
                }
            },
            None => {
                crate::log_warn!("Font \"{}\" not found, using solid block", font_family);
                Self::fallback()
            }
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Coverage in `0.0..=1.0` at an offset from the tile origin; 0 outside the stamp.
    #[inline]
    pub fn coverage(&self, dx: u32, dy: u32) -> f32 {
        if dx >= self.width || dy >= self.height {
            return 0.0;
        }
        self.coverage[dy as usize * self.width as usize + dx as usize]
    }
}

/// Load a regular-weight font by family name, trying the generic monospace
/// family if the named one is absent.
pub fn load_system_font(family: &str) -> Option<FontArc> {
    use font_kit::family_name::FamilyName;
    use font_kit::properties::Properties;
    use font_kit::source::SystemSource;

    let source = SystemSource::new();
    let handle = source
        .select_best_match(
            &[FamilyName::Title(family.to_string()), FamilyName::Monospace],
            &Properties::new(),
        )
        .ok()?;

    let font_data = handle.load().ok()?;
    let bytes = font_data.copy_font_data()?;
    FontArc::try_from_vec((*bytes).clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_block_is_opaque_inside_and_empty_outside() {
        let stamp = GlyphStamp::solid_block(3, 4);
        assert_eq!(stamp.coverage(0, 0), 1.0);
        assert_eq!(stamp.coverage(2, 3), 1.0);
        assert_eq!(stamp.coverage(3, 0), 0.0);
        assert_eq!(stamp.coverage(0, 4), 0.0);
    }

    #[test]
    fn fallback_matches_default_font_cell() {
        let stamp = GlyphStamp::fallback();
        assert_eq!((stamp.width(), stamp.height()), (6, 11));
    }

    #[test]
    fn coverage_grid_must_match_dimensions() {
        assert!(GlyphStamp::from_coverage(2, 2, vec![1.0; 3]).is_none());
        let stamp = GlyphStamp::from_coverage(2, 1, vec![-1.0, 2.0]).unwrap();
        assert_eq!(stamp.coverage(0, 0), 0.0);
        assert_eq!(stamp.coverage(1, 0), 1.0);
    }
}
