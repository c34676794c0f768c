//! Configuration schema types for `pixology.toml`
//!
//! Every section is optional; missing keys take the engine defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::history::DEFAULT_CAPACITY;
use crate::paint::FillOptions;
use crate::playback::{clamp_fps, DEFAULT_FPS, MAX_FPS, MIN_FPS};
use crate::preview::OnionConfig;
use crate::snapshot::MAX_DIMENSION;

/// Size of newly created canvases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: usize,
    pub height: usize,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self { width: 16, height: 16 }
    }
}

/// Undo history bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum undo entries kept per canvas
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { capacity: DEFAULT_CAPACITY }
    }
}

/// Default flood fill behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillConfig {
    /// Euclidean RGB distance accepted as "same color"
    pub tolerance: f64,
    pub contiguous: bool,
    /// Match against the composite instead of the target layer
    pub sample_all_layers: bool,
}

impl Default for FillConfig {
    fn default() -> Self {
        let options = FillOptions::default();
        Self {
            tolerance: options.tolerance,
            contiguous: options.contiguous,
            sample_all_layers: options.sample_all_layers,
        }
    }
}

impl FillConfig {
    pub fn options(&self) -> FillOptions {
        FillOptions {
            tolerance: self.tolerance,
            contiguous: self.contiguous,
            sample_all_layers: self.sample_all_layers,
        }
    }
}

/// Playback rate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Frames per second, clamped into 1..=120 when used
    pub fps: u32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self { fps: DEFAULT_FPS }
    }
}

impl PlaybackConfig {
    pub fn effective_fps(&self) -> u32 {
        clamp_fps(self.fps)
    }
}

/// Notice collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Append notices to `log_path`
    pub collect_notices: bool,
    pub log_path: PathBuf,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { collect_notices: false, log_path: PathBuf::from(".pixology/notices.jsonl") }
    }
}

/// Complete `pixology.toml` contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PixologyConfig {
    pub canvas: CanvasConfig,
    pub history: HistoryConfig,
    pub fill: FillConfig,
    pub playback: PlaybackConfig,
    pub onion: OnionConfig,
    pub telemetry: TelemetryConfig,
}

/// A config validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "onion.fade")
    pub field: String,
    pub message: String,
}

impl ConfigValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self { field: field.to_string(), message: message.into() }
    }
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pixology.toml: '{}' {}", self.field, self.message)
    }
}

impl PixologyConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();
        let dimension = format!("must be between 1 and {}", MAX_DIMENSION);

        if !(1..=MAX_DIMENSION).contains(&self.canvas.width) {
            errors.push(ConfigValidationError::new("canvas.width", dimension.clone()));
        }
        if !(1..=MAX_DIMENSION).contains(&self.canvas.height) {
            errors.push(ConfigValidationError::new("canvas.height", dimension));
        }

        if self.history.capacity == 0 {
            errors.push(ConfigValidationError::new("history.capacity", "must be a positive integer"));
        }

        if !self.fill.tolerance.is_finite() || self.fill.tolerance < 0.0 {
            errors.push(ConfigValidationError::new("fill.tolerance", "must be zero or positive"));
        }

        // out-of-range fps is clamped, not rejected
        if self.playback.fps != self.playback.effective_fps() {
            log::debug!(
                "playback.fps {} outside {}..={}, clamping",
                self.playback.fps,
                MIN_FPS,
                MAX_FPS
            );
        }

        if !(0.0..=1.0).contains(&self.onion.fade) {
            errors.push(ConfigValidationError::new("onion.fade", "must be between 0 and 1"));
        }
        if !(0.0..=1.0).contains(&self.onion.tint_alpha) {
            errors.push(ConfigValidationError::new("onion.tint_alpha", "must be between 0 and 1"));
        }

        if self.telemetry.collect_notices && self.telemetry.log_path.as_os_str().is_empty() {
            errors.push(ConfigValidationError::new(
                "telemetry.log_path",
                "must be set when collect_notices is enabled",
            ));
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::preview::OnionMode;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: PixologyConfig = toml::from_str("").unwrap();
        assert_eq!(config, PixologyConfig::default());
        assert_eq!(config.canvas.width, 16);
        assert_eq!(config.history.capacity, 100);
        assert_eq!(config.playback.fps, 12);
        assert!(config.is_valid());
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r##"
[canvas]
width = 32
height = 24

[history]
capacity = 50

[fill]
tolerance = 12.5
contiguous = false
sample_all_layers = true

[playback]
fps = 24

[onion]
enabled = false
prev = 1
next = 3
fade = 0.25
mode = "tint"
prev_tint = "#f00"
next_tint = "#00FF00"
tint_alpha = 0.5

[telemetry]
collect_notices = true
log_path = "logs/notices.jsonl"
"##;
        let config: PixologyConfig = toml::from_str(toml).unwrap();

        assert_eq!((config.canvas.width, config.canvas.height), (32, 24));
        assert_eq!(config.history.capacity, 50);
        let fill = config.fill.options();
        assert_eq!(fill.tolerance, 12.5);
        assert!(!fill.contiguous);
        assert!(fill.sample_all_layers);
        assert_eq!(config.playback.fps, 24);
        assert!(!config.onion.enabled);
        assert_eq!((config.onion.prev, config.onion.next), (1, 3));
        assert_eq!(config.onion.mode, OnionMode::Tint);
        assert_eq!(config.onion.prev_tint, Rgb::new(255, 0, 0));
        assert_eq!(config.onion.next_tint, Rgb::new(0, 255, 0));
        assert!(config.telemetry.collect_notices);
        assert_eq!(config.telemetry.log_path, PathBuf::from("logs/notices.jsonl"));
        assert!(config.is_valid());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: PixologyConfig = toml::from_str("[onion]\nprev = 4\n").unwrap();
        assert_eq!(config.onion.prev, 4);
        assert_eq!(config.onion.next, 2);
        assert_eq!(config.onion.fade, 0.5);
    }

    #[test]
    fn test_validation_dimensions() {
        let config: PixologyConfig = toml::from_str("[canvas]\nwidth = 0\nheight = 600\n").unwrap();
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.field == "canvas.width"));
        assert!(errors.iter().any(|e| e.field == "canvas.height"));
    }

    #[test]
    fn test_validation_ranges() {
        let toml = r#"
[history]
capacity = 0
[fill]
tolerance = -1.0
[onion]
fade = 1.5
tint_alpha = 2.0
"#;
        let config: PixologyConfig = toml::from_str(toml).unwrap();
        let fields: Vec<String> = config.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["history.capacity", "fill.tolerance", "onion.fade", "onion.tint_alpha"]
        );
    }

    #[test]
    fn test_fps_is_clamped_not_rejected() {
        let config: PixologyConfig = toml::from_str("[playback]\nfps = 500\n").unwrap();
        assert!(config.is_valid());
        assert_eq!(config.playback.effective_fps(), 120);
    }

    #[test]
    fn test_invalid_tint_is_parse_error() {
        let result: Result<PixologyConfig, _> = toml::from_str("[onion]\nprev_tint = \"nope\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_error_display() {
        let err = ConfigValidationError::new("onion.fade", "must be between 0 and 1");
        assert_eq!(err.to_string(), "pixology.toml: 'onion.fade' must be between 0 and 1");
    }
}
