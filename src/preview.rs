//! Preview compositor with onion skinning.
//!
//! Renders one frame's composite into an RGBA image, optionally with ghost
//! copies of neighbouring frames beneath it. Ghost indices wrap around the
//! frame store, and the current frame is always drawn last without tint.

use image::{Rgba, RgbaImage};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::frames::FrameStore;
use crate::raster::LayerStore;

/// Opacity of the nearest ghost before fading.
pub const GHOST_BASE_ALPHA: f32 = 0.6;

/// How ghost frames are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnionMode {
    /// The ghost's own colors at a distance-faded alpha
    #[default]
    Alpha,
    /// A flat tint color over the ghost's painted cells
    Tint,
}

/// Onion skin settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnionConfig {
    pub enabled: bool,
    /// Ghosts drawn before the current frame
    pub prev: u32,
    /// Ghosts drawn after the current frame
    pub next: u32,
    /// Per-step falloff in 0..=1
    pub fade: f32,
    pub mode: OnionMode,
    pub prev_tint: Rgb,
    pub next_tint: Rgb,
    pub tint_alpha: f32,
}

impl Default for OnionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prev: 2,
            next: 2,
            fade: 0.5,
            mode: OnionMode::Alpha,
            prev_tint: Rgb::new(255, 80, 80),
            next_tint: Rgb::new(80, 255, 120),
            tint_alpha: 0.35,
        }
    }
}

impl OnionConfig {
    /// Same settings with ghosts turned off.
    pub fn disabled() -> Self {
        Self { enabled: false, ..Self::default() }
    }
}

/// Alpha of the ghost `distance` frames away: `0.6 * (1 - fade)^distance`.
pub fn ghost_alpha(distance: u32, fade: f32) -> f32 {
    let falloff = (1.0 - fade.clamp(0.0, 1.0)).powi(distance as i32);
    (GHOST_BASE_ALPHA * falloff).clamp(0.0, 1.0)
}

/// Rasterize a layer store's composite, each cell becoming a `scale`-sized
/// square. Absent cells stay fully transparent.
pub fn rasterize(store: &LayerStore, scale: u32) -> RgbaImage {
    let scale = scale.max(1);
    let width = store.width() as u32 * scale;
    let height = store.height() as u32 * scale;
    let mut image = RgbaImage::new(width, height);

    for row in 0..store.height() {
        for col in 0..store.width() {
            let Some(rgb) = store.composite_at(row, col) else {
                continue;
            };
            let pixel = rgb.to_rgba(255);
            let x0 = col as u32 * scale;
            let y0 = row as u32 * scale;
            for dy in 0..scale {
                for dx in 0..scale {
                    image.put_pixel(x0 + dx, y0 + dy, pixel);
                }
            }
        }
    }
    image
}

/// Scale a ghost's alpha by `opacity`.
fn fade_image(image: &RgbaImage, opacity: f32) -> RgbaImage {
    let mut result = image.clone();
    for pixel in result.pixels_mut() {
        if pixel[3] > 0 {
            pixel[3] = (pixel[3] as f32 * opacity).round().clamp(0.0, 255.0) as u8;
        }
    }
    result
}

/// Replace every painted pixel with the flat tint at `opacity`.
fn apply_tint(image: &RgbaImage, tint: Rgb, opacity: f32) -> RgbaImage {
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    let mut result = image.clone();
    for pixel in result.pixels_mut() {
        if pixel[3] > 0 {
            *pixel = tint.to_rgba(alpha);
        }
    }
    result
}

/// Source-over for one straight-alpha pixel.
fn blend_over(dest: &mut Rgba<u8>, src: &Rgba<u8>) {
    let sa = src[3] as f32 / 255.0;
    if sa <= 0.0 {
        return;
    }
    let da = dest[3] as f32 / 255.0 * (1.0 - sa);
    let out_a = sa + da;
    for ch in 0..3 {
        let mixed = (src[ch] as f32 * sa + dest[ch] as f32 * da) / out_a;
        dest[ch] = mixed.round().clamp(0.0, 255.0) as u8;
    }
    dest[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

/// Draw `layer` onto `canvas`; sizes must agree.
fn draw_layer(canvas: &mut RgbaImage, layer: &RgbaImage) {
    if canvas.dimensions() != layer.dimensions() {
        return;
    }
    for (dest, src) in canvas.pixels_mut().zip(layer.pixels()) {
        match src[3] {
            0 => {}
            255 => *dest = *src,
            _ => blend_over(dest, src),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Ghost {
    index: usize,
    alpha: f32,
    tint: Option<Rgb>,
}

/// Ghosts in draw order: previous farthest-first, then next farthest-first.
fn ghost_plan(index: usize, frame_count: usize, config: &OnionConfig) -> Vec<Ghost> {
    if !config.enabled || frame_count == 0 {
        return Vec::new();
    }

    let ghost = |index: usize, distance: u32, tint: Rgb| match config.mode {
        OnionMode::Alpha => Ghost { index, alpha: ghost_alpha(distance, config.fade), tint: None },
        OnionMode::Tint => Ghost { index, alpha: config.tint_alpha, tint: Some(tint) },
    };

    let mut plan = Vec::with_capacity((config.prev + config.next) as usize);
    for k in (1..=config.prev).rev() {
        let back = k as usize % frame_count;
        let idx = (index + frame_count - back) % frame_count;
        plan.push(ghost(idx, k, config.prev_tint));
    }
    for k in (1..=config.next).rev() {
        let idx = (index + k as usize) % frame_count;
        plan.push(ghost(idx, k, config.next_tint));
    }
    plan
}

/// Composite rendered frame images with onion skin around `index`.
///
/// `index` wraps into range. With no frames the result is a transparent
/// `width x height` image.
pub fn render_onion_skin(
    frames: &[RgbaImage],
    index: usize,
    config: &OnionConfig,
    width: u32,
    height: u32,
) -> RgbaImage {
    let mut result = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    if frames.is_empty() {
        return result;
    }
    let index = index % frames.len();

    let ghosts: Vec<RgbaImage> = ghost_plan(index, frames.len(), config)
        .par_iter()
        .map(|g| match g.tint {
            Some(tint) => apply_tint(&frames[g.index], tint, g.alpha),
            None => fade_image(&frames[g.index], g.alpha),
        })
        .collect();

    for ghost in &ghosts {
        draw_layer(&mut result, ghost);
    }
    draw_layer(&mut result, &frames[index]);
    result
}

/// Render the preview of frame `index` from a frame store.
pub fn render_preview(
    store: &FrameStore,
    index: usize,
    config: &OnionConfig,
    scale: u32,
) -> RgbaImage {
    let scale = scale.max(1);
    let width = store.width() as u32 * scale;
    let height = store.height() as u32 * scale;
    if store.is_empty() {
        return RgbaImage::new(width, height);
    }

    let index = index % store.len();
    let mut needed: Vec<usize> = ghost_plan(index, store.len(), config)
        .into_iter()
        .map(|g| g.index)
        .collect();
    needed.push(index);

    // only frames that appear get rasterized; others stay empty placeholders
    let images: Vec<RgbaImage> = (0..store.len())
        .into_par_iter()
        .map(|i| match store.frame(i) {
            Some(frame) if needed.contains(&i) => rasterize(frame.canvas.store(), scale),
            _ => RgbaImage::new(width, height),
        })
        .collect();

    log::debug!("preview frame {} with {} ghost(s)", index, needed.len() - 1);
    render_onion_skin(&images, index, config, width, height)
}
