use image::RgbaImage;
use image::imageops::{self, FilterType};
use std::path::Path;

use crate::error::LibraryError;

/// Decodes an image file into RGBA8.
pub fn load_image(path: &Path) -> Result<RgbaImage, LibraryError> {
    if !path.is_file() {
        return Err(LibraryError::SourceImageMissing(path.to_path_buf()));
    }
    let image = image::open(path)?;
    Ok(image.to_rgba8())
}

/// Downscales to fit within `max_dimension` on the longer side, keeping the aspect ratio.
/// Images that already fit are copied unchanged.
pub fn thumbnail(image: &RgbaImage, max_dimension: u32) -> RgbaImage {
    let (w, h) = image.dimensions();
    let max_dimension = max_dimension.max(1);
    if w <= max_dimension && h <= max_dimension {
        return image.clone();
    }

    let scale = max_dimension as f64 / w.max(h) as f64;
    let new_w = ((w as f64 * scale).round() as u32).clamp(1, max_dimension);
    let new_h = ((h as f64 * scale).round() as u32).clamp(1, max_dimension);
    imageops::resize(image, new_w, new_h, FilterType::Lanczos3)
}
