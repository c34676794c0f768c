//! `pixology sequence`, `pixology preview` and `pixology export`

use std::path::Path;
use std::process::ExitCode;

use crate::config::CliOverrides;
use crate::error::EngineError;
use crate::output::{save_png, scale_image, tile_frames};
use crate::playback::Player;
use crate::preview::{rasterize, render_preview, OnionConfig};
use crate::timeline::{build_play_sequence, BlockId};

use super::project::Project;
use super::{load_settings, notice_log, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

fn load_project(file: &Path, capacity: usize) -> Result<Project, ExitCode> {
    Project::load(file, capacity).map_err(|e| {
        eprintln!("Error: {}: {}", file.display(), e);
        ExitCode::from(EXIT_ERROR)
    })
}

fn join_indices(indices: &[usize]) -> String {
    indices.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(" ")
}

/// Execute the sequence command
pub fn run_sequence(
    config_path: Option<&Path>,
    file: &Path,
    block_key: &str,
    ticks: Option<u32>,
    fps: Option<u32>,
) -> ExitCode {
    let overrides = CliOverrides { fps, ..Default::default() };
    let config = match load_settings(config_path, &overrides) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let project = match load_project(file, config.history.capacity) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let Project::Animated { frames, timeline } = &project else {
        eprintln!("Error: '{}' is not an animated project", file.display());
        return ExitCode::from(EXIT_INVALID_ARGS);
    };

    let log = notice_log(&config);
    let label = file.display().to_string();
    let Some(block) = timeline.find(block_key) else {
        let missing = EngineError::BlockNotFound(BlockId::new(block_key));
        let notice = log.report("sequence", Some(&label), &missing);
        eprintln!("Notice: {}", notice.message);
        return ExitCode::from(EXIT_ERROR);
    };

    let sequence = build_play_sequence(block, frames.len());
    match serde_json::to_string(&sequence) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    }

    let Some(ticks) = ticks else {
        return ExitCode::from(EXIT_SUCCESS);
    };

    let mut player = Player::new(config.playback.effective_fps());
    player.select(block, frames.len());
    if let Err(e) = player.toggle_play() {
        let notice = log.report("sequence", Some(&label), &e);
        eprintln!("Notice: {}", notice.message);
        return ExitCode::from(EXIT_ERROR);
    }

    let period = player.frame_period();
    let mut shown: Vec<usize> = player.current_frame().into_iter().collect();
    for _ in 0..ticks {
        shown.extend(player.advance(period));
    }
    player.stop();
    println!("playback @{}fps: {}", player.fps(), join_indices(&shown));
    ExitCode::from(EXIT_SUCCESS)
}

/// Execute the preview command
pub fn run_preview(
    config_path: Option<&Path>,
    file: &Path,
    frame: usize,
    scale: u32,
    no_onion: bool,
    output: &Path,
) -> ExitCode {
    let overrides = CliOverrides { onion: no_onion.then_some(false), ..Default::default() };
    let config = match load_settings(config_path, &overrides) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let project = match load_project(file, config.history.capacity) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let image = match &project {
        Project::Static(canvas) => {
            if frame != 1 {
                eprintln!("Error: static projects have a single frame");
                return ExitCode::from(EXIT_INVALID_ARGS);
            }
            rasterize(canvas.store(), scale)
        }
        Project::Animated { frames, .. } => {
            if frame == 0 || frame > frames.len() {
                eprintln!(
                    "Error: frame {} out of range (project has {} frames)",
                    frame,
                    frames.len()
                );
                return ExitCode::from(EXIT_INVALID_ARGS);
            }
            let onion: &OnionConfig = &config.onion;
            render_preview(frames, frame - 1, onion, scale)
        }
    };

    match save_png(&image, output) {
        Ok(()) => {
            eprintln!("Saved: {}", output.display());
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Execute the export command
pub fn run_export(
    config_path: Option<&Path>,
    file: &Path,
    scale: u32,
    cols: Option<u32>,
    output: &Path,
) -> ExitCode {
    let config = match load_settings(config_path, &CliOverrides::default()) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let project = match load_project(file, config.history.capacity) {
        Ok(p) => p,
        Err(code) => return code,
    };

    if project.snapshot().is_empty() {
        eprintln!("Error: nothing to export, every cell of '{}' is transparent", file.display());
        return ExitCode::from(EXIT_ERROR);
    }

    let image = match &project {
        Project::Static(canvas) => rasterize(canvas.store(), 1),
        Project::Animated { frames, .. } => {
            let images: Vec<_> =
                frames.frames().iter().map(|f| rasterize(f.canvas.store(), 1)).collect();
            tile_frames(&images, cols)
        }
    };

    match save_png(&scale_image(image, scale), output) {
        Ok(()) => {
            eprintln!("Saved: {}", output.display());
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
