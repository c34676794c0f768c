//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations. Every command reads and writes
//! project snapshots (JSON) and applies edits through the engine, so locked
//! or hidden layers and empty animations are reported the same way an
//! interactive editor would report them.

mod edit;
mod info;
mod project;
mod render;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::color::{parse_cell_color, Color};
use crate::config::{load_config, merge_cli_overrides, CliOverrides, PixologyConfig};
use crate::telemetry::NoticeLog;
use crate::timeline::LoopMode;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Pixology - layered pixel-art editing and animation preview
#[derive(Parser)]
#[command(name = "pixology")]
#[command(about = "Pixology - edit layered pixel-art projects and preview animations")]
#[command(version)]
pub struct Cli {
    /// Config file (default: discover pixology.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a blank project file
    New {
        /// Project file to create
        file: PathBuf,

        /// Canvas width in cells (default from config)
        #[arg(long)]
        width: Option<usize>,

        /// Canvas height in cells (default from config)
        #[arg(long)]
        height: Option<usize>,

        /// Create an animated project
        #[arg(long)]
        animated: bool,

        /// Number of blank frames in an animated project
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..=1000))]
        frames: u32,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show project dimensions, layers, frames and animations
    Info {
        /// Project file
        file: PathBuf,
    },

    /// Paint, erase or flood fill cells.
    /// Edits apply in order: --set, then --erase, then --fill.
    Paint {
        /// Project file to modify
        file: PathBuf,

        /// Layer id to edit (default: the selected layer)
        #[arg(short, long)]
        layer: Option<String>,

        /// Frame number to edit in an animated project (1-based)
        #[arg(long)]
        frame: Option<usize>,

        /// Paint one cell: row,col=COLOR (e.g. --set 0,0=#FF0000)
        #[arg(long, value_name = "ROW,COL=COLOR")]
        set: Vec<String>,

        /// Erase one cell: row,col
        #[arg(long, value_name = "ROW,COL")]
        erase: Vec<String>,

        /// Flood fill from a seed: row,col=COLOR
        #[arg(long, value_name = "ROW,COL=COLOR")]
        fill: Vec<String>,

        /// Fill color-match tolerance (RGB distance)
        #[arg(long)]
        tolerance: Option<f64>,

        /// Match fill against all visible layers
        #[arg(long)]
        sample_all: bool,

        /// Fill every matching cell, not just the connected region
        #[arg(long)]
        global: bool,

        /// Output file (default: overwrite input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Add an animation block to an animated project
    Animate {
        /// Project file to modify
        file: PathBuf,

        /// Block name (default: "untitled animation N")
        #[arg(long)]
        name: Option<String>,

        /// Frame numbers, comma separated (e.g. 1,2,3,2)
        #[arg(long, value_delimiter = ',')]
        frames: Vec<u32>,

        /// Loop mode: forward, backward or pingpong
        #[arg(long, default_value = "forward")]
        loop_mode: String,

        /// Output file (default: overwrite input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print an animation block's play sequence (zero-based frame indices)
    Sequence {
        /// Project file
        file: PathBuf,

        /// Block id or name
        #[arg(short, long)]
        block: String,

        /// Also simulate this many playback ticks and print the frames shown
        #[arg(long)]
        ticks: Option<u32>,

        /// Playback rate for the simulation (default from config)
        #[arg(long)]
        fps: Option<u32>,
    },

    /// Render one frame with onion skin to PNG
    Preview {
        /// Project file
        file: PathBuf,

        /// Frame number (1-based)
        #[arg(long, default_value = "1")]
        frame: usize,

        /// Scale output by integer factor
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..=64))]
        scale: u32,

        /// Disable onion skin
        #[arg(long)]
        no_onion: bool,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Export the composited project to PNG (frames tiled into a sheet)
    Export {
        /// Project file
        file: PathBuf,

        /// Scale output by integer factor
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..=64))]
        scale: u32,

        /// Columns in the frame sheet (default: square grid)
        #[arg(long)]
        cols: Option<u32>,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Load config, apply CLI overrides, and report failures on stderr.
pub(crate) fn load_settings(
    path: Option<&Path>,
    overrides: &CliOverrides,
) -> Result<PixologyConfig, ExitCode> {
    match load_config(path) {
        Ok(mut config) => {
            merge_cli_overrides(&mut config, overrides);
            Ok(config)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Err(ExitCode::from(EXIT_ERROR))
        }
    }
}

pub(crate) fn notice_log(config: &PixologyConfig) -> NoticeLog {
    NoticeLog::new(&config.telemetry.log_path, config.telemetry.collect_notices)
}

/// Parse `row,col`.
pub(crate) fn parse_cell(s: &str) -> Result<(usize, usize), String> {
    let (row, col) =
        s.split_once(',').ok_or_else(|| format!("expected ROW,COL but got '{}'", s))?;
    let row = row.trim().parse().map_err(|_| format!("invalid row in '{}'", s))?;
    let col = col.trim().parse().map_err(|_| format!("invalid column in '{}'", s))?;
    Ok((row, col))
}

/// Parse `row,col=COLOR`, where COLOR may be `transparent`.
pub(crate) fn parse_cell_assignment(s: &str) -> Result<(usize, usize, Color), String> {
    let (cell, color) =
        s.split_once('=').ok_or_else(|| format!("expected ROW,COL=COLOR but got '{}'", s))?;
    let (row, col) = parse_cell(cell)?;
    let color = parse_cell_color(color).map_err(|e| format!("'{}': {}", s, e))?;
    Ok((row, col, color))
}

pub(crate) fn parse_loop_mode(s: &str) -> Result<LoopMode, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "forward" => Ok(LoopMode::Forward),
        "backward" => Ok(LoopMode::Backward),
        "pingpong" | "ping-pong" => Ok(LoopMode::PingPong),
        other => Err(format!("unknown loop mode '{}' (forward, backward, pingpong)", other)),
    }
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::New { file, width, height, animated, frames, force } => {
            info::run_new(config, &file, width, height, animated, frames, force)
        }
        Commands::Info { file } => info::run_info(config, &file),
        Commands::Paint {
            file,
            layer,
            frame,
            set,
            erase,
            fill,
            tolerance,
            sample_all,
            global,
            output,
        } => edit::run_paint(
            config,
            &file,
            layer.as_deref(),
            frame,
            &edit::PaintOps { set: &set, erase: &erase, fill: &fill },
            tolerance,
            sample_all,
            global,
            output.as_deref(),
        ),
        Commands::Animate { file, name, frames, loop_mode, output } => edit::run_animate(
            config,
            &file,
            name.as_deref(),
            &frames,
            &loop_mode,
            output.as_deref(),
        ),
        Commands::Sequence { file, block, ticks, fps } => {
            render::run_sequence(config, &file, &block, ticks, fps)
        }
        Commands::Preview { file, frame, scale, no_onion, output } => {
            render::run_preview(config, &file, frame, scale, no_onion, &output)
        }
        Commands::Export { file, scale, cols, output } => {
            render::run_export(config, &file, scale, cols, &output)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;

    #[test]
    fn test_parse_cell() {
        assert_eq!(parse_cell("3, 4"), Ok((3, 4)));
        assert!(parse_cell("3").is_err());
        assert!(parse_cell("-1,2").is_err());
    }

    #[test]
    fn test_parse_cell_assignment() {
        assert_eq!(parse_cell_assignment("0,1=#ff0000"), Ok((0, 1, Some(Rgb::new(255, 0, 0)))));
        assert_eq!(parse_cell_assignment("2,2=transparent"), Ok((2, 2, None)));
        assert_eq!(parse_cell_assignment("1,1=blue"), Ok((1, 1, Some(Rgb::new(0, 0, 255)))));
        assert!(parse_cell_assignment("1,1").is_err());
        assert!(parse_cell_assignment("1,1=#12").is_err());
    }

    #[test]
    fn test_parse_loop_mode() {
        assert_eq!(parse_loop_mode("PingPong"), Ok(LoopMode::PingPong));
        assert_eq!(parse_loop_mode("backward"), Ok(LoopMode::Backward));
        assert!(parse_loop_mode("sideways").is_err());
    }

    #[test]
    fn test_cli_parses_paint() {
        let cli = Cli::try_parse_from([
            "pixology", "paint", "a.json", "--set", "0,0=#FF0000", "--fill", "1,1=#00FF00",
            "--tolerance", "5",
        ])
        .unwrap();
        match cli.command {
            Commands::Paint { set, fill, tolerance, .. } => {
                assert_eq!(set, vec!["0,0=#FF0000"]);
                assert_eq!(fill, vec!["1,1=#00FF00"]);
                assert_eq!(tolerance, Some(5.0));
            }
            _ => panic!("expected paint command"),
        }
    }

    #[test]
    fn test_cli_parses_animate_frames() {
        let cli =
            Cli::try_parse_from(["pixology", "animate", "a.json", "--frames", "1,2,3,2"]).unwrap();
        match cli.command {
            Commands::Animate { frames, loop_mode, .. } => {
                assert_eq!(frames, vec![1, 2, 3, 2]);
                assert_eq!(loop_mode, "forward");
            }
            _ => panic!("expected animate command"),
        }
    }
}
