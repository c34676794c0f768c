//! Configuration loading and discovery for `pixology.toml`

use super::schema::PixologyConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up during discovery.
pub const CONFIG_FILE: &str = "pixology.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse pixology.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub width: Option<usize>,
    pub height: Option<usize>,
    pub tolerance: Option<f64>,
    pub sample_all_layers: Option<bool>,
    pub fps: Option<u32>,
    /// Force onion skin on or off
    pub onion: Option<bool>,
    pub collect_notices: Option<bool>,
}

/// Find pixology.toml by walking up from the current working directory.
///
/// Search order:
/// 1. Walk up from current directory looking for pixology.toml
/// 2. Check XDG_CONFIG_HOME/pixology/pixology.toml (or ~/.config/pixology/pixology.toml)
pub fn find_config() -> Option<PathBuf> {
    if let Ok(cwd) = env::current_dir() {
        if let Some(path) = find_config_from(cwd) {
            return Some(path);
        }
    }

    find_xdg_config()
}

/// Find pixology.toml in the XDG config directory.
pub fn find_xdg_config() -> Option<PathBuf> {
    let xdg_config = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;

    let config_path = xdg_config.join("pixology").join(CONFIG_FILE);
    config_path.exists().then_some(config_path)
}

/// Find pixology.toml by walking up from `start`.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration.
///
/// An explicit `path` must exist. Without one, discovery runs and a missing
/// file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<PixologyConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(PixologyConfig::default()),
    }
}

fn load_config_file(path: &Path) -> Result<PixologyConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: PixologyConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    log::debug!("loaded config from {}", path.display());
    Ok(config)
}

/// Merge CLI overrides into a configuration. CLI arguments win.
pub fn merge_cli_overrides(config: &mut PixologyConfig, overrides: &CliOverrides) {
    if let Some(width) = overrides.width {
        config.canvas.width = width;
    }
    if let Some(height) = overrides.height {
        config.canvas.height = height;
    }
    if let Some(tolerance) = overrides.tolerance {
        config.fill.tolerance = tolerance;
    }
    if let Some(sample_all) = overrides.sample_all_layers {
        config.fill.sample_all_layers = sample_all;
    }
    if let Some(fps) = overrides.fps {
        config.playback.fps = fps;
    }
    if let Some(onion) = overrides.onion {
        config.onion.enabled = onion;
    }
    if let Some(collect) = overrides.collect_notices {
        config.telemetry.collect_notices = collect;
    }
}
