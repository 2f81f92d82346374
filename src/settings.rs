// ============================================================================
// SETTINGS: plain `key=value` file in the platform config directory
// ============================================================================
//
// Read-only. The app never writes this file, and none of its keys touch the
// session state (the slider always starts at the default tile size).

use std::path::PathBuf;
use std::time::Duration;

use crate::ops::gate::DEFAULT_THRESHOLD;

/// Interval at which the UI polls the render queue.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// Minimum spacing between accepted render requests.
    pub debounce: Duration,
    /// Re-arm interval of the queue poll.
    pub poll_interval: Duration,
    /// Window icon, loaded at startup if present.
    pub icon_path: PathBuf,
    /// Image shown before the user opens anything.
    pub default_image: PathBuf,
    /// Font family the block glyph is rasterized from.
    pub glyph_font: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_THRESHOLD,
            poll_interval: DEFAULT_POLL_INTERVAL,
            icon_path: PathBuf::from("icon").join("app_icon.png"),
            default_image: PathBuf::from("read"),
            glyph_font: "DejaVu Sans Mono".to_string(),
        }
    }
}

impl Settings {
    pub(crate) fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA")
                .or_else(|_| std::env::var("USERPROFILE"))
                .ok()?;
            return Some(
                PathBuf::from(appdata)
                    .join("AsciiTiler")
                    .join("asciitiler_settings.cfg"),
            );
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").ok()?;
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("AsciiTiler")
                    .join("asciitiler_settings.cfg"),
            );
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let config_dir = match std::env::var("XDG_CONFIG_HOME") {
                Ok(dir) => PathBuf::from(dir),
                Err(_) => PathBuf::from(std::env::var("HOME").ok()?).join(".config"),
            };
            Some(config_dir.join("asciitiler").join("asciitiler_settings.cfg"))
        }
    }

    /// Load from the config file, or defaults if there is none.
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            return Self::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(_) => Self::default(),
        }
    }

    /// Parse `key=value` lines. Unknown keys and bad values are ignored.
    pub fn parse(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else { continue };
            let val = val.trim();
            match key.trim() {
                "debounce_ms" => {
                    if let Ok(v) = val.parse::<u64>() {
                        s.debounce = Duration::from_millis(v);
                    }
                }
                "poll_interval_ms" => {
                    if let Ok(v) = val.parse::<u64>()
                        && v > 0
                    {
                        s.poll_interval = Duration::from_millis(v);
                    }
                }
                "icon_path" if !val.is_empty() => s.icon_path = PathBuf::from(val),
                "default_image" if !val.is_empty() => s.default_image = PathBuf::from(val),
                "glyph_font" if !val.is_empty() => s.glyph_font = val.to_string(),
                _ => {}
            }
        }
        s
    }
}
