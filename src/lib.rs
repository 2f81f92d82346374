//! AsciiTiler: turn an image into a grid of solid-color glyph tiles.
//!
//! The binary in `main.rs` is a thin launcher; everything it drives lives here
//! so the headless CLI and the tests share one code path.

pub mod logger;

pub mod app;
pub mod canvas;
pub mod cli;
pub mod error;
pub mod io;
pub mod jobs;
pub mod ops;
pub mod settings;
pub mod state;
