//! CLI integration tests for the `pixology` binary.
//!
//! Each test works in its own temp directory and passes an explicit
//! `--config` so results do not depend on any pixology.toml on the machine.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// Run pixology with the given arguments and return (stdout, stderr, exit code).
fn run(dir: &TempDir, args: &[&str]) -> (String, String, i32) {
    let config = dir.path().join("pixology.toml");
    if !config.exists() {
        std::fs::write(&config, "[canvas]\nwidth = 4\nheight = 3\n").unwrap();
    }
    let output = Command::new(env!("CARGO_BIN_EXE_pixology"))
        .args(args)
        .arg("--config")
        .arg(&config)
        .current_dir(dir.path())
        .output()
        .expect("Failed to execute pixology");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.code().unwrap_or(-1))
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn new_project(dir: &TempDir, name: &str, extra: &[&str]) -> PathBuf {
    let path = dir.path().join(name);
    let mut args = vec!["new", path.to_str().unwrap()];
    args.extend_from_slice(extra);
    let (_, stderr, code) = run(dir, &args);
    assert_eq!(code, 0, "new failed: {}", stderr);
    path
}

#[test]
fn test_new_uses_config_size() {
    let dir = TempDir::new().unwrap();
    let path = new_project(&dir, "art.json", &[]);
    let json = read_json(&path);
    assert_eq!(json["width"], 4);
    assert_eq!(json["height"], 3);
    assert_eq!(json["layers"][0]["name"], "Layer 1");
    assert_eq!(json["layers"][0]["pixels"].as_array().unwrap().len(), 3);
}

#[test]
fn test_new_refuses_overwrite_and_bad_size() {
    let dir = TempDir::new().unwrap();
    let path = new_project(&dir, "art.json", &[]);
    let (_, stderr, code) = run(&dir, &["new", path.to_str().unwrap()]);
    assert_eq!(code, 1);
    assert!(stderr.contains("already exists"));

    let other = dir.path().join("big.json");
    let (_, _, code) = run(&dir, &["new", other.to_str().unwrap(), "--width", "600"]);
    assert_eq!(code, 2);
    assert!(!other.exists());
}

#[test]
fn test_paint_set_and_fill() {
    let dir = TempDir::new().unwrap();
    let path = new_project(&dir, "art.json", &[]);
    let file = path.to_str().unwrap();

    let (_, stderr, code) = run(&dir, &["paint", file, "--set", "0,0=#ff0000", "--set", "9,9=#ff0000"]);
    assert_eq!(code, 0, "{}", stderr);
    let json = read_json(&path);
    assert_eq!(json["layers"][0]["pixels"][0][0], "#FF0000");

    let (_, stderr, code) = run(&dir, &["paint", file, "--fill", "2,3=#00FF00"]);
    assert_eq!(code, 0, "{}", stderr);
    let json = read_json(&path);
    let pixels = &json["layers"][0]["pixels"];
    assert_eq!(pixels[0][0], "#FF0000");
    assert_eq!(pixels[0][1], "#00FF00");
    assert_eq!(pixels[2][3], "#00FF00");
}

#[test]
fn test_paint_to_output_leaves_input() {
    let dir = TempDir::new().unwrap();
    let path = new_project(&dir, "art.json", &[]);
    let out = dir.path().join("out").join("edited.json");
    let (_, _, code) = run(
        &dir,
        &["paint", path.to_str().unwrap(), "--set", "1,1=blue", "-o", out.to_str().unwrap()],
    );
    assert_eq!(code, 0);
    assert!(read_json(&path)["layers"][0]["pixels"][1][1].is_null());
    assert_eq!(read_json(&out)["layers"][0]["pixels"][1][1], "#0000FF");
}

#[test]
fn test_paint_locked_layer_reports_notice() {
    let dir = TempDir::new().unwrap();
    let path = new_project(&dir, "art.json", &[]);
    let mut json = read_json(&path);
    json["layers"][0]["locked"] = serde_json::Value::Bool(true);
    std::fs::write(&path, serde_json::to_string(&json).unwrap()).unwrap();

    let (_, stderr, code) = run(&dir, &["paint", path.to_str().unwrap(), "--set", "0,0=#FF0000"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Notice: layer 'Layer 1' is locked"), "{}", stderr);
    assert!(read_json(&path)["layers"][0]["pixels"][0][0].is_null());
}

#[test]
fn test_paint_invalid_arguments() {
    let dir = TempDir::new().unwrap();
    let path = new_project(&dir, "art.json", &[]);
    let file = path.to_str().unwrap();

    let (_, _, code) = run(&dir, &["paint", file]);
    assert_eq!(code, 2);
    let (_, _, code) = run(&dir, &["paint", file, "--set", "0,0"]);
    assert_eq!(code, 2);
    let (_, _, code) = run(&dir, &["paint", file, "--set", "0,0=#GG0000"]);
    assert_eq!(code, 2);
    let (_, _, code) = run(&dir, &["paint", file, "--frame", "1", "--set", "0,0=#FFF"]);
    assert_eq!(code, 2);
}

#[test]
fn test_animate_and_sequence() {
    let dir = TempDir::new().unwrap();
    let path = new_project(&dir, "walk.json", &["--animated", "--frames", "3"]);
    let file = path.to_str().unwrap();

    let (_, stderr, code) = run(
        &dir,
        &["animate", file, "--name", "walk", "--frames", "1,2,3", "--loop-mode", "pingpong"],
    );
    assert_eq!(code, 0, "{}", stderr);
    let json = read_json(&path);
    assert_eq!(json["animations"][0]["name"], "walk");
    assert_eq!(json["animations"][0]["loopMode"], "pingpong");

    let (stdout, _, code) = run(&dir, &["sequence", file, "--block", "walk", "--ticks", "4"]);
    assert_eq!(code, 0);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "[0,1,2,1]");
    assert_eq!(lines[1], "playback @12fps: 0 1 2 1 0");
}

#[test]
fn test_animate_rejects_invalid_frame_number() {
    let dir = TempDir::new().unwrap();
    let path = new_project(&dir, "walk.json", &["--animated", "--frames", "2"]);
    let (_, stderr, code) = run(&dir, &["animate", path.to_str().unwrap(), "--frames", "1,5"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("frame number 5 is invalid"), "{}", stderr);
    assert!(read_json(&path)["animations"].as_array().unwrap().is_empty());
}

#[test]
fn test_sequence_unknown_and_empty_blocks() {
    let dir = TempDir::new().unwrap();
    let path = new_project(&dir, "walk.json", &["--animated"]);
    let file = path.to_str().unwrap();

    let (_, stderr, code) = run(&dir, &["sequence", file, "--block", "nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("not found"));

    let (_, _, code) = run(&dir, &["animate", file]);
    assert_eq!(code, 0);
    let (stdout, stderr, code) =
        run(&dir, &["sequence", file, "--block", "untitled animation 1", "--ticks", "2"]);
    assert_eq!(code, 1);
    assert!(stdout.starts_with("[]"));
    assert!(stderr.contains("has no playable frames"), "{}", stderr);
}

#[test]
fn test_preview_writes_png() {
    let dir = TempDir::new().unwrap();
    let path = new_project(&dir, "walk.json", &["--animated", "--frames", "2"]);
    let file = path.to_str().unwrap();
    let (_, _, code) = run(&dir, &["paint", file, "--frame", "1", "--set", "0,0=#00FF00"]);
    assert_eq!(code, 0);

    let png = dir.path().join("preview.png");
    let (_, stderr, code) =
        run(&dir, &["preview", file, "--frame", "2", "--scale", "2", "-o", png.to_str().unwrap()]);
    assert_eq!(code, 0, "{}", stderr);
    let image = image::open(&png).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (8, 6));
    let ghost = image.get_pixel(0, 0);
    assert_eq!(ghost[1], 255);
    assert!(ghost[3] > 0 && ghost[3] < 255);

    let plain = dir.path().join("plain.png");
    let (_, _, code) = run(
        &dir,
        &["preview", file, "--frame", "2", "--no-onion", "-o", plain.to_str().unwrap()],
    );
    assert_eq!(code, 0);
    assert_eq!(image::open(&plain).unwrap().to_rgba8().get_pixel(0, 0)[3], 0);

    let (_, _, code) = run(&dir, &["preview", file, "--frame", "3", "-o", plain.to_str().unwrap()]);
    assert_eq!(code, 2);
}

#[test]
fn test_export_empty_and_tiled() {
    let dir = TempDir::new().unwrap();
    let path = new_project(&dir, "walk.json", &["--animated", "--frames", "2"]);
    let file = path.to_str().unwrap();
    let png = dir.path().join("sheet.png");

    let (_, stderr, code) = run(&dir, &["export", file, "-o", png.to_str().unwrap()]);
    assert_eq!(code, 1);
    assert!(stderr.contains("nothing to export"));
    assert!(!png.exists());

    let (_, _, code) = run(&dir, &["paint", file, "--frame", "2", "--set", "2,3=#0000FF"]);
    assert_eq!(code, 0);
    let (_, stderr, code) = run(&dir, &["export", file, "-o", png.to_str().unwrap()]);
    assert_eq!(code, 0, "{}", stderr);
    let sheet = image::open(&png).unwrap().to_rgba8();
    assert_eq!(sheet.dimensions(), (8, 3));
    assert_eq!(*sheet.get_pixel(7, 2), image::Rgba([0, 0, 255, 255]));
}

#[test]
fn test_info_lists_layers() {
    let dir = TempDir::new().unwrap();
    let path = new_project(&dir, "art.json", &[]);
    let (stdout, _, code) = run(&dir, &["info", path.to_str().unwrap()]);
    assert_eq!(code, 0);
    assert!(stdout.contains("4x3 static"));
    assert!(stdout.contains("layer-1 \"Layer 1\" [visible, selected] 0 painted"));
    assert!(stdout.contains("Empty: yes"));
}
