use crate::draw::model::{Color, SketchTool};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlaySettings {
    #[serde(default = "default_quick_colors")]
    pub quick_colors: Vec<Color>,
    #[serde(default = "default_last_tool")]
    pub last_tool: SketchTool,
    #[serde(default = "default_last_color")]
    pub last_color: Color,
    #[serde(default = "default_last_width")]
    pub last_width: u32,
    #[serde(default = "default_marker_ttl_ms")]
    pub marker_ttl_ms: u64,
    #[serde(default = "default_screen_capture_limit_secs")]
    pub screen_capture_limit_secs: u64,
    #[serde(default = "default_notice_duration_secs")]
    pub notice_duration_secs: u64,
    #[serde(default)]
    pub debug_logging: bool,
}

fn default_quick_colors() -> Vec<Color> {
    vec![
        Color::rgba(255, 51, 51, 255),
        Color::rgba(255, 153, 51, 255),
        Color::rgba(255, 230, 64, 255),
        Color::rgba(61, 220, 132, 255),
        Color::rgba(0, 168, 255, 255),
        Color::rgba(180, 102, 255, 255),
        Color::rgba(0, 0, 0, 255),
        Color::rgba(255, 255, 255, 255),
    ]
}

fn default_last_tool() -> SketchTool {
    SketchTool::Pencil
}

fn default_last_color() -> Color {
    Color::rgba(255, 51, 51, 255)
}

fn default_last_width() -> u32 {
    4
}

fn default_marker_ttl_ms() -> u64 {
    3000
}

fn default_screen_capture_limit_secs() -> u64 {
    5 * 60
}

fn default_notice_duration_secs() -> u64 {
    4
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            quick_colors: default_quick_colors(),
            last_tool: default_last_tool(),
            last_color: default_last_color(),
            last_width: default_last_width(),
            marker_ttl_ms: default_marker_ttl_ms(),
            screen_capture_limit_secs: default_screen_capture_limit_secs(),
            notice_duration_secs: default_notice_duration_secs(),
            debug_logging: false,
        }
    }
}

impl OverlaySettings {
    /// Clamp out-of-range values back to their defaults. Returns true when
    /// anything changed.
    pub fn sanitize(&mut self) -> bool {
        let mut changed = false;
        if self.marker_ttl_ms == 0 {
            self.marker_ttl_ms = default_marker_ttl_ms();
            changed = true;
        }
        if self.screen_capture_limit_secs == 0 {
            self.screen_capture_limit_secs = default_screen_capture_limit_secs();
            changed = true;
        }
        if self.last_width == 0 {
            self.last_width = default_last_width();
            changed = true;
        }
        if self.quick_colors.is_empty() {
            self.quick_colors = default_quick_colors();
            changed = true;
        }
        changed
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read settings file {}", path.display()))?;
        let mut settings: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parse settings file {}", path.display()))?;
        settings.sanitize();
        Ok(settings)
    }

    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(err) => {
                tracing::debug!(?err, "using default overlay settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create settings dir {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize overlay settings")?;
        fs::write(path, json).with_context(|| format!("write settings file {}", path.display()))
    }
}

/// Settings live in the platform config directory, falling back to the
/// working directory when it is unavailable.
pub fn settings_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tag_overlay")
        .join(SETTINGS_FILE)
}

#[cfg(test)]
mod tests {
    use super::OverlaySettings;
    use crate::draw::model::SketchTool;

    #[test]
    fn serde_roundtrip_preserves_settings() {
        let mut settings = OverlaySettings::default();
        settings.last_tool = SketchTool::Arrow;
        settings.marker_ttl_ms = 5000;
        let json = serde_json::to_string(&settings).expect("serialize");
        let decoded: OverlaySettings = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded, settings);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let decoded: OverlaySettings =
            serde_json::from_str("{\"last_width\": 9}").expect("partial settings");
        assert_eq!(decoded.last_width, 9);
        assert_eq!(decoded.marker_ttl_ms, 3000);
        assert_eq!(decoded.screen_capture_limit_secs, 300);
        assert_eq!(decoded.quick_colors.len(), 8);
    }

    #[test]
    fn sanitize_restores_out_of_range_values() {
        let mut settings = OverlaySettings {
            marker_ttl_ms: 0,
            screen_capture_limit_secs: 0,
            last_width: 0,
            quick_colors: vec![],
            ..OverlaySettings::default()
        };
        assert!(settings.sanitize());
        assert_eq!(settings.marker_ttl_ms, 3000);
        assert_eq!(settings.screen_capture_limit_secs, 300);
        assert_eq!(settings.last_width, 4);
        assert!(!settings.quick_colors.is_empty());
        assert!(!settings.sanitize(), "second pass finds nothing to fix");
    }

    #[test]
    fn load_and_save_round_trip_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        let mut settings = OverlaySettings::default();
        settings.debug_logging = true;
        settings.save(&path).expect("save");

        let loaded = OverlaySettings::load(&path).expect("load");
        assert_eq!(loaded, settings);
    }

    #[test]
    fn load_or_default_tolerates_a_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = OverlaySettings::load_or_default(&dir.path().join("absent.json"));
        assert_eq!(settings, OverlaySettings::default());
    }
}
