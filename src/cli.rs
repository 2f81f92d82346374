// ============================================================================
// AsciiTiler CLI: headless single-image rendering
// ============================================================================
//
// Usage examples:
//   asciitiler --input photo.png --output tiles.png
//   asciitiler -i photo.jpg -o tiles.jpg --tile-size 16 --quality 85
//   asciitiler -i photo.bmp -o tiles --format gif
//
// No window is opened. The render runs on the calling thread (the tile
// renderer still fans out over the rayon pool).

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::error::TilerError;
use crate::io::{SaveFormat, encode_and_write, load_image};
use crate::ops::glyph::GlyphStamp;
use crate::ops::tiles::{DEFAULT_TILE_SIZE, TileSize, render_tiles};
use crate::settings::Settings;

/// AsciiTiler headless renderer.
///
/// Render one image as solid glyph tiles without opening the GUI.
#[derive(Parser, Debug)]
#[command(
    name = "asciitiler",
    about = "AsciiTiler headless tile renderer",
    long_about = "Render an image as a grid of solid-color glyph tiles without\n\
                  opening the GUI. Reads PNG, JPEG, BMP and GIF; writes the same.\n\n\
                  Example:\n  \
                  asciitiler --input photo.png --output tiles.png --tile-size 12"
)]
pub struct CliArgs {
    /// Input image file.
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Output image file. Without an extension, `--format` (or png) decides it.
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Tile edge length in pixels (at least 1).
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_TILE_SIZE,
        value_parser = clap::value_parser!(u32).range(1..),
        value_name = "PIXELS"
    )]
    pub tile_size: u32,

    /// Output format: png, jpeg, bmp, gif. Inferred from --output when omitted.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// JPEG quality (1-100).
    #[arg(
        short,
        long,
        default_value_t = crate::io::DEFAULT_JPEG_QUALITY,
        value_parser = clap::value_parser!(u8).range(1..=100),
        value_name = "1-100"
    )]
    pub quality: u8,

    /// Print timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Returns `true` when a headless flag is present in the real process arguments.
    /// Used by `main()` to route before creating an eframe window.
    pub fn is_cli_mode() -> bool {
        is_cli_args(std::env::args().skip(1))
    }
}

fn is_cli_args<I: IntoIterator<Item = String>>(args: I) -> bool {
    args.into_iter()
        .any(|a| a == "--input" || a == "-i" || a.starts_with("--input="))
}

/// Run the headless render and return an OS exit code.
pub fn run(args: CliArgs) -> ExitCode {
    let start = Instant::now();
    match run_one(&args) {
        Ok(output) => {
            if args.verbose {
                println!(
                    "{} → {} ({:.0}ms)",
                    args.input.display(),
                    output.display(),
                    start.elapsed().as_secs_f64() * 1000.0
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_one(args: &CliArgs) -> Result<PathBuf, TilerError> {
    let tile = TileSize::new(args.tile_size)?;
    let (output, format) = resolve_output(&args.output, args.format.as_deref())?;

    let source = load_image(&args.input)?;
    let glyph = GlyphStamp::load(&Settings::load().glyph_font);
    let rendered = render_tiles(&source, tile, &glyph);

    encode_and_write(&rendered, &output, format, args.quality)?;
    Ok(output)
}

/// Choose the output format from `--format` or the output extension, and
/// give the path that extension if it has none.
fn resolve_output(output: &Path, format_arg: Option<&str>) -> Result<(PathBuf, SaveFormat), TilerError> {
    let format = match format_arg {
        Some(f) => SaveFormat::from_extension(f)
            .ok_or_else(|| TilerError::UnsupportedFormat(PathBuf::from(f)))?,
        None if output.extension().is_none() => SaveFormat::default(),
        None => SaveFormat::from_path(output)?,
    };

    let path = if output.extension().is_none() {
        output.with_extension(format.extension())
    } else {
        output.to_path_buf()
    };
    Ok((path, format))
}
