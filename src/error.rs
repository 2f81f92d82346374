use std::path::PathBuf;

/// Error type shared by the renderer, file I/O and the headless runner.
#[derive(Debug)]
pub enum TilerError {
    /// Tile width/height of zero. Raised before a render is ever started.
    InvalidTileSize(u32),
    Io(std::io::Error),
    Image(image::ImageError),
    Encode(String),
    UnsupportedFormat(PathBuf),
}

impl TilerError {
    /// True when the underlying cause is a missing file.
    pub fn is_not_found(&self) -> bool {
        match self {
            TilerError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            TilerError::Image(image::ImageError::IoError(e)) => {
                e.kind() == std::io::ErrorKind::NotFound
            }
            _ => false,
        }
    }
}

impl std::fmt::Display for TilerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TilerError::InvalidTileSize(n) => {
                write!(f, "Invalid tile size {}: must be at least 1 pixel", n)
            }
            TilerError::Io(e) => write!(f, "I/O error: {}", e),
            TilerError::Image(e) => write!(f, "Image error: {}", e),
            TilerError::Encode(e) => write!(f, "Encode error: {}", e),
            TilerError::UnsupportedFormat(p) => {
                write!(f, "Unsupported output format: {}", p.display())
            }
        }
    }
}

impl std::error::Error for TilerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TilerError::Io(e) => Some(e),
            TilerError::Image(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TilerError {
    fn from(e: std::io::Error) -> Self {
        TilerError::Io(e)
    }
}

impl From<image::ImageError> for TilerError {
    fn from(e: image::ImageError) -> Self {
        TilerError::Image(e)
    }
}
