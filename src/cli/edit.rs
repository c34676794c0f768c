//! `pixology paint` and `pixology animate`

use std::path::Path;
use std::process::ExitCode;

use crate::color::Color;
use crate::config::CliOverrides;
use crate::editor::Canvas;
use crate::error::EngineError;
use crate::paint::FillOptions;
use crate::raster::LayerId;

use super::project::Project;
use super::{
    load_settings, notice_log, parse_cell, parse_cell_assignment, parse_loop_mode, EXIT_ERROR,
    EXIT_INVALID_ARGS, EXIT_SUCCESS,
};

/// Raw edit arguments, in the order they are applied.
pub struct PaintOps<'a> {
    pub set: &'a [String],
    pub erase: &'a [String],
    pub fill: &'a [String],
}

struct ParsedOps {
    set: Vec<(usize, usize, Color)>,
    erase: Vec<(usize, usize)>,
    fill: Vec<(usize, usize, Color)>,
}

impl PaintOps<'_> {
    fn parse(&self) -> Result<ParsedOps, String> {
        Ok(ParsedOps {
            set: self.set.iter().map(|s| parse_cell_assignment(s)).collect::<Result<_, _>>()?,
            erase: self.erase.iter().map(|s| parse_cell(s)).collect::<Result<_, _>>()?,
            fill: self.fill.iter().map(|s| parse_cell_assignment(s)).collect::<Result<_, _>>()?,
        })
    }

    fn is_empty(&self) -> bool {
        self.set.is_empty() && self.erase.is_empty() && self.fill.is_empty()
    }
}

fn paint_cells(canvas: &mut Canvas, ops: &ParsedOps) -> Result<usize, EngineError> {
    let mut changed = 0;
    for &(row, col, color) in &ops.set {
        changed += usize::from(canvas.paint_cell(row, col, color)?);
    }
    for &(row, col) in &ops.erase {
        changed += usize::from(canvas.erase_cell(row, col)?);
    }
    Ok(changed)
}

/// Apply the edits; returns the number of cells written.
fn apply(canvas: &mut Canvas, ops: &ParsedOps, options: &FillOptions) -> Result<usize, EngineError> {
    // set/erase edits form one stroke, closed even when one fails
    canvas.begin_stroke();
    let stroke = paint_cells(canvas, ops);
    canvas.end_stroke();
    let mut changed = stroke?;

    for &(row, col, color) in &ops.fill {
        changed += canvas.flood_fill(row, col, color, options)?;
    }
    Ok(changed)
}

/// Execute the paint command
pub fn run_paint(
    config_path: Option<&Path>,
    file: &Path,
    layer: Option<&str>,
    frame: Option<usize>,
    ops: &PaintOps<'_>,
    tolerance: Option<f64>,
    sample_all: bool,
    global: bool,
    output: Option<&Path>,
) -> ExitCode {
    if ops.is_empty() {
        eprintln!("Error: nothing to do (use --set, --erase or --fill)");
        return ExitCode::from(EXIT_INVALID_ARGS);
    }
    let parsed = match ops.parse() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let overrides = CliOverrides {
        tolerance,
        sample_all_layers: sample_all.then_some(true),
        ..Default::default()
    };
    let config = match load_settings(config_path, &overrides) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let mut options = config.fill.options();
    if global {
        options.contiguous = false;
    }
    if !options.tolerance.is_finite() || options.tolerance < 0.0 {
        eprintln!("Error: --tolerance must be zero or positive");
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let mut project = match Project::load(file, config.history.capacity) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}: {}", file.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let canvas = match project.canvas_mut(frame) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let log = notice_log(&config);
    let file_label = file.display().to_string();
    let result = match layer {
        Some(id) => canvas.select_layer(&LayerId::new(id)),
        None => Ok(()),
    }
    .and_then(|()| apply(canvas, &parsed, &options));

    let changed = match result {
        Ok(n) => n,
        Err(e) => {
            let notice = log.report("paint", Some(&file_label), &e);
            eprintln!("Notice: {}", notice.message);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let target = output.unwrap_or(file);
    match project.save(target) {
        Ok(()) => {
            eprintln!("Wrote: {} ({} cell(s) written)", target.display(), changed);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Execute the animate command
pub fn run_animate(
    config_path: Option<&Path>,
    file: &Path,
    name: Option<&str>,
    frames: &[u32],
    loop_mode: &str,
    output: Option<&Path>,
) -> ExitCode {
    let mode = match parse_loop_mode(loop_mode) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };
    let config = match load_settings(config_path, &CliOverrides::default()) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let mut project = match Project::load(file, config.history.capacity) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}: {}", file.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let Project::Animated { frames: store, timeline } = &mut project else {
        eprintln!("Error: '{}' is not an animated project", file.display());
        return ExitCode::from(EXIT_INVALID_ARGS);
    };

    let id = timeline.add_block();
    let result = frames
        .iter()
        .try_for_each(|&n| timeline.add_frame_ref(&id, n, store.len()))
        .and_then(|()| timeline.set_loop_mode(&id, mode))
        .and_then(|()| match name {
            Some(n) => timeline.rename_block(&id, n),
            None => Ok(()),
        });
    if let Err(e) = result {
        let notice = notice_log(&config).report("animate", Some(&file.display().to_string()), &e);
        eprintln!("Notice: {}", notice.message);
        return ExitCode::from(EXIT_ERROR);
    }
    let label = timeline.block(&id).map(|b| b.name.clone()).unwrap_or_default();

    let target = output.unwrap_or(file);
    match project.save(target) {
        Ok(()) => {
            eprintln!("Added animation \"{}\" ({}) to {}", label, id, target.display());
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
