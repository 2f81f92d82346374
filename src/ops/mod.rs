pub mod gate;
pub mod glyph;
pub mod tiles;
