//! PNG output, upscaling and frame tiling

use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use std::io;
use std::path::Path;

/// Error type for output operations
#[derive(Debug)]
pub enum OutputError {
    /// IO error during file operations
    Io(io::Error),
    /// Image encoding error
    Image(image::ImageError),
}

impl std::fmt::Display for OutputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputError::Io(e) => write!(f, "IO error: {}", e),
            OutputError::Image(e) => write!(f, "Image error: {}", e),
        }
    }
}

impl std::error::Error for OutputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OutputError::Io(e) => Some(e),
            OutputError::Image(e) => Some(e),
        }
    }
}

impl From<io::Error> for OutputError {
    fn from(e: io::Error) -> Self {
        OutputError::Io(e)
    }
}

impl From<image::ImageError> for OutputError {
    fn from(e: image::ImageError) -> Self {
        OutputError::Image(e)
    }
}

/// Save an RGBA image as PNG, creating parent directories as needed.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    image.save_with_format(path, image::ImageFormat::Png)?;
    log::info!("wrote {}x{} image to {}", image.width(), image.height(), path.display());
    Ok(())
}

/// Scale an image by an integer factor with nearest-neighbour sampling, so
/// cell edges stay crisp.
pub fn scale_image(image: RgbaImage, factor: u32) -> RgbaImage {
    if factor <= 1 {
        return image;
    }
    let (w, h) = image.dimensions();
    image::imageops::resize(&image, w * factor, h * factor, FilterType::Nearest)
}

/// Tile equally sized frame images into a grid, left to right then top to
/// bottom.
///
/// `cols` defaults to the smallest square grid that fits every frame.
///
/// ```
/// use image::RgbaImage;
/// use pixology::output::tile_frames;
///
/// let frame = RgbaImage::new(2, 3);
/// let sheet = tile_frames(&[frame.clone(), frame.clone(), frame], None);
/// assert_eq!(sheet.dimensions(), (4, 6));
/// ```
pub fn tile_frames(frames: &[RgbaImage], cols: Option<u32>) -> RgbaImage {
    let Some(first) = frames.first() else {
        return RgbaImage::new(0, 0);
    };
    let (fw, fh) = first.dimensions();
    let count = frames.len() as u32;
    let columns = cols.unwrap_or_else(|| (count as f64).sqrt().ceil() as u32).clamp(1, count);
    let rows = count.div_ceil(columns);

    let mut sheet = RgbaImage::from_pixel(columns * fw, rows * fh, Rgba([0, 0, 0, 0]));
    for (i, frame) in frames.iter().enumerate() {
        let x0 = (i as u32 % columns) * fw;
        let y0 = (i as u32 / columns) * fh;
        for (x, y, pixel) in frame.enumerate_pixels() {
            if x < fw && y < fh {
                sheet.put_pixel(x0 + x, y0 + y, *pixel);
            }
        }
    }
    sheet
}
