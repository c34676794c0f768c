//! `pixology new` and `pixology info`

use std::path::Path;
use std::process::ExitCode;

use crate::config::CliOverrides;
use crate::editor::Canvas;
use crate::frames::FrameStore;
use crate::raster::LayerStore;
use crate::timeline::{build_play_sequence, Timeline};

use super::project::Project;
use super::{load_settings, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Execute the new command
pub fn run_new(
    config_path: Option<&Path>,
    file: &Path,
    width: Option<usize>,
    height: Option<usize>,
    animated: bool,
    frames: u32,
    force: bool,
) -> ExitCode {
    let overrides = CliOverrides { width, height, ..Default::default() };
    let config = match load_settings(config_path, &overrides) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let errors: Vec<_> =
        config.validate().into_iter().filter(|e| e.field.starts_with("canvas.")).collect();
    if !errors.is_empty() {
        for e in errors {
            eprintln!("Error: {}", e);
        }
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    if file.exists() && !force {
        eprintln!("Error: '{}' already exists (use --force to overwrite)", file.display());
        return ExitCode::from(EXIT_ERROR);
    }

    let (w, h) = (config.canvas.width, config.canvas.height);
    let capacity = config.history.capacity;
    let project = if animated {
        let mut store = FrameStore::with_capacity(w, h, capacity);
        for _ in 1..frames {
            store.add_frame();
        }
        if let Err(e) = store.select(0) {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
        Project::Animated { frames: store, timeline: Timeline::new() }
    } else {
        Project::Static(Canvas::with_capacity(w, h, capacity))
    };

    match project.save(file) {
        Ok(()) => {
            eprintln!("Created: {} ({}x{})", file.display(), w, h);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn print_layers(store: &LayerStore, indent: &str) {
    for layer in store.layers() {
        let mut flags = vec![if layer.visible { "visible" } else { "hidden" }];
        if layer.locked {
            flags.push("locked");
        }
        if store.active_id() == Some(&layer.id) {
            flags.push("selected");
        }
        let painted = layer.pixels().painted_cells().count();
        println!(
            "{}{} \"{}\" [{}] {} painted",
            indent,
            layer.id,
            layer.name,
            flags.join(", "),
            painted
        );
    }
}

/// Execute the info command
pub fn run_info(config_path: Option<&Path>, file: &Path) -> ExitCode {
    let config = match load_settings(config_path, &CliOverrides::default()) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let project = match Project::load(file, config.history.capacity) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}: {}", file.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let empty = project.snapshot().is_empty();
    match &project {
        Project::Static(canvas) => {
            println!("{}: {}x{} static", file.display(), canvas.width(), canvas.height());
            println!("Layers: {}", canvas.store().len());
            print_layers(canvas.store(), "  ");
        }
        Project::Animated { frames, timeline } => {
            println!("{}: {}x{} animated", file.display(), frames.width(), frames.height());
            println!("Frames: {}", frames.len());
            for frame in frames.frames() {
                println!("  {} ({})", frame.name, frame.id);
                print_layers(frame.canvas.store(), "    ");
            }
            println!("Animations: {}", timeline.len());
            for block in timeline.blocks() {
                let steps = build_play_sequence(block, frames.len()).len();
                println!(
                    "  {} \"{}\" {} refs={:?} steps={}",
                    block.id, block.name, block.loop_mode, block.frames, steps
                );
            }
        }
    }
    println!("Empty: {}", if empty { "yes" } else { "no" });
    ExitCode::from(EXIT_SUCCESS)
}
