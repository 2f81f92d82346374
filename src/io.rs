use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageEncoder, Rgba, RgbaImage};
use rfd::FileDialog;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::TilerError;

/// Extensions offered by the open dialog.
pub const OPEN_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif"];

/// Size of the blank image shown when nothing has been loaded.
pub const PLACEHOLDER_SIZE: (u32, u32) = (100, 100);

/// Default JPEG quality for dialog saves.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Output formats the save dialog offers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SaveFormat {
    #[default]
    Png,
    Jpeg,
    Bmp,
    Gif,
}

impl SaveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Png => "png",
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Bmp => "bmp",
            SaveFormat::Gif => "gif",
        }
    }

    /// Every extension accepted for this format, canonical one first.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            SaveFormat::Png => &["png"],
            SaveFormat::Jpeg => &["jpg", "jpeg"],
            SaveFormat::Bmp => &["bmp"],
            SaveFormat::Gif => &["gif"],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SaveFormat::Png => "PNG files",
            SaveFormat::Jpeg => "JPEG files",
            SaveFormat::Bmp => "BMP files",
            SaveFormat::Gif => "GIF files",
        }
    }

    pub fn all() -> &'static [SaveFormat] {
        &[
            SaveFormat::Png,
            SaveFormat::Jpeg,
            SaveFormat::Bmp,
            SaveFormat::Gif,
        ]
    }

    /// Match a file extension (case-insensitive, without the dot).
    pub fn from_extension(ext: &str) -> Option<SaveFormat> {
        match ext.to_lowercase().as_str() {
            "png" => Some(SaveFormat::Png),
            "jpg" | "jpeg" => Some(SaveFormat::Jpeg),
            "bmp" => Some(SaveFormat::Bmp),
            "gif" => Some(SaveFormat::Gif),
            _ => None,
        }
    }

    /// Infer the format from a path's extension.
    pub fn from_path(path: &Path) -> Result<SaveFormat, TilerError> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(SaveFormat::from_extension)
            .ok_or_else(|| TilerError::UnsupportedFormat(path.to_path_buf()))
    }
}

/// Blank white image used until something is loaded.
pub fn placeholder_image() -> RgbaImage {
    RgbaImage::from_pixel(
        PLACEHOLDER_SIZE.0,
        PLACEHOLDER_SIZE.1,
        Rgba([255, 255, 255, 255]),
    )
}

/// Decode an image file. The format is sniffed from the content, so files
/// without an extension decode too.
pub fn load_image(path: &Path) -> Result<RgbaImage, TilerError> {
    let reader = image::io::Reader::open(path)?.with_guessed_format()?;
    Ok(reader.decode()?.to_rgba8())
}

/// Load the startup image, substituting the placeholder when it cannot be read.
/// Returns the image and, if it came from disk, its path.
pub fn load_startup_image(path: &Path) -> (RgbaImage, Option<PathBuf>) {
    match load_image(path) {
        Ok(img) => {
            crate::log_info!(
                "Default image loaded: {} ({}x{})",
                path.display(),
                img.width(),
                img.height()
            );
            (img, Some(path.to_path_buf()))
        }
        Err(e) if e.is_not_found() => {
            crate::log_info!("No default image at {}, using placeholder", path.display());
            (placeholder_image(), None)
        }
        Err(e) => {
            crate::log_err!(
                "Default image {} could not be decoded ({}), using placeholder",
                path.display(),
                e
            );
            (placeholder_image(), None)
        }
    }
}

/// Load the window icon. `None` (logged) if the file is missing or unreadable.
pub fn load_icon_rgba(path: &Path) -> Option<(Vec<u8>, u32, u32)> {
    match load_image(path) {
        Ok(img) => {
            let (w, h) = img.dimensions();
            Some((img.into_raw(), w, h))
        }
        Err(e) => {
            crate::log_warn!("Failed to load application icon {}: {}", path.display(), e);
            None
        }
    }
}

/// Encode and write an image to a file.
pub fn encode_and_write(
    image: &RgbaImage,
    path: &Path,
    format: SaveFormat,
    quality: u8,
) -> Result<(), TilerError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    match format {
        SaveFormat::Png => {
            PngEncoder::new(&mut writer).write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
        SaveFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb_image = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100)).write_image(
                rgb_image.as_raw(),
                rgb_image.width(),
                rgb_image.height(),
                image::ColorType::Rgb8,
            )?;
        }
        SaveFormat::Bmp => {
            BmpEncoder::new(&mut writer).write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
        SaveFormat::Gif => encode_static_gif(image, &mut writer)?,
    }

    writer.flush()?;
    Ok(())
}

/// Encode a single static GIF from an RGBA image.
fn encode_static_gif<W: Write>(image: &RgbaImage, writer: W) -> Result<(), TilerError> {
    if image.width() > u16::MAX as u32 || image.height() > u16::MAX as u32 {
        return Err(TilerError::Encode(
            "Image dimensions exceed GIF maximum (65535×65535)".to_string(),
        ));
    }
    let (w, h) = (image.width() as u16, image.height() as u16);
    let (palette, indexed) = quantize_rgba(image, 256);

    let mut encoder = gif::Encoder::new(writer, w, h, &palette)
        .map_err(|e| TilerError::Encode(format!("GIF encoder init error: {}", e)))?;

    let frame = gif::Frame {
        width: w,
        height: h,
        buffer: std::borrow::Cow::Borrowed(&indexed),
        ..Default::default()
    };
    encoder
        .write_frame(&frame)
        .map_err(|e| TilerError::Encode(format!("GIF write error: {}", e)))?;

    Ok(())
}

/// Quantize an RGBA image to indexed color (palette + indices).
/// The palette is flat `[R,G,B, R,G,B, ...]` as the gif crate expects.
fn quantize_rgba(image: &RgbaImage, max_colors: usize) -> (Vec<u8>, Vec<u8>) {
    let nq = color_quant::NeuQuant::new(10, max_colors, image.as_raw());

    let mut palette = Vec::with_capacity(max_colors * 3);
    for i in 0..max_colors {
        match nq.lookup(i) {
            Some(color) => palette.extend_from_slice(&color[..3]),
            None => palette.extend_from_slice(&[0, 0, 0]),
        }
    }

    let indices = image
        .pixels()
        .map(|p| nq.index_of(&p.0) as u8)
        .collect();

    (palette, indices)
}

// ============================================================================
// NATIVE DIALOGS
// ============================================================================

/// Ask the user for an image to open. `None` if the dialog was cancelled.
pub fn pick_open_path() -> Option<PathBuf> {
    FileDialog::new()
        .add_filter("Image files", OPEN_EXTENSIONS)
        .pick_file()
}

/// Ask the user where to save. A path without an extension gets `.png`.
pub fn pick_save_path() -> Option<PathBuf> {
    let mut dialog = FileDialog::new().set_file_name("ascii_art.png");
    for format in SaveFormat::all() {
        dialog = dialog.add_filter(format.label(), format.extensions());
    }
    dialog.save_file().map(with_default_extension)
}

/// Append `.png` to a path with no extension.
pub fn with_default_extension(path: PathBuf) -> PathBuf {
    if path.extension().is_some() {
        path
    } else {
        path.with_extension(SaveFormat::default().extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            if (x / 4 + y / 4) % 2 == 0 {
                Rgba([200, 30, 30, 255])
            } else {
                Rgba([20, 20, 220, 255])
            }
        })
    }

    #[test]
    fn format_is_inferred_from_extension() {
        assert_eq!(SaveFormat::from_path(Path::new("a/b.PNG")).ok(), Some(SaveFormat::Png));
        assert_eq!(SaveFormat::from_path(Path::new("x.jpeg")).ok(), Some(SaveFormat::Jpeg));
        assert_eq!(SaveFormat::from_path(Path::new("x.jpg")).ok(), Some(SaveFormat::Jpeg));
        assert_eq!(SaveFormat::from_path(Path::new("x.bmp")).ok(), Some(SaveFormat::Bmp));
        assert_eq!(SaveFormat::from_path(Path::new("x.gif")).ok(), Some(SaveFormat::Gif));
        assert!(matches!(
            SaveFormat::from_path(Path::new("x.tiff")),
            Err(TilerError::UnsupportedFormat(_))
        ));
        assert!(SaveFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn missing_extension_defaults_to_png() {
        assert_eq!(
            with_default_extension(PathBuf::from("out/art")),
            PathBuf::from("out/art.png")
        );
        assert_eq!(
            with_default_extension(PathBuf::from("out/art.bmp")),
            PathBuf::from("out/art.bmp")
        );
    }

    #[test]
    fn placeholder_is_white_100_square() {
        let img = placeholder_image();
        assert_eq!(img.dimensions(), (100, 100));
        assert!(img.pixels().all(|p| *p == Rgba([255, 255, 255, 255])));
    }

    #[test]
    fn lossless_formats_write_readable_files() {
        let dir = tempfile::tempdir().unwrap();
        let img = checker(16, 12);
        for format in [SaveFormat::Png, SaveFormat::Bmp] {
            let path = dir.path().join(format!("out.{}", format.extension()));
            encode_and_write(&img, &path, format, DEFAULT_JPEG_QUALITY).unwrap();
            let back = load_image(&path).unwrap();
            assert_eq!(back, img, "{:?}", format);
        }
    }

    #[test]
    fn jpeg_and_gif_keep_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let img = checker(33, 17);
        for format in [SaveFormat::Jpeg, SaveFormat::Gif] {
            let path = dir.path().join(format!("out.{}", format.extension()));
            encode_and_write(&img, &path, format, DEFAULT_JPEG_QUALITY).unwrap();
            let back = load_image(&path).unwrap();
            assert_eq!(back.dimensions(), (33, 17), "{:?}", format);
        }
    }

    #[test]
    fn content_sniffing_decodes_extensionless_files() {
        let dir = tempfile::tempdir().unwrap();
        let img = checker(8, 8);
        let png_path = dir.path().join("tmp.png");
        encode_and_write(&img, &png_path, SaveFormat::Png, 90).unwrap();
        let bare = dir.path().join("read");
        std::fs::rename(&png_path, &bare).unwrap();
        assert_eq!(load_image(&bare).unwrap(), img);
    }

    #[test]
    fn missing_file_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_image(&dir.path().join("nope.png")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn startup_image_falls_back_to_placeholder() {
        let dir = tempfile::tempdir().unwrap();

        let (img, origin) = load_startup_image(&dir.path().join("read"));
        assert_eq!(img, placeholder_image());
        assert!(origin.is_none());

        let corrupt = dir.path().join("corrupt");
        std::fs::write(&corrupt, b"definitely not an image").unwrap();
        let (img, origin) = load_startup_image(&corrupt);
        assert_eq!(img, placeholder_image());
        assert!(origin.is_none());
    }

    #[test]
    fn startup_image_is_used_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("start.png");
        let img = checker(10, 6);
        encode_and_write(&img, &path, SaveFormat::Png, 90).unwrap();
        let (loaded, origin) = load_startup_image(&path);
        assert_eq!(loaded, img);
        assert_eq!(origin, Some(path));
    }
}
