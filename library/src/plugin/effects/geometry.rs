use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::error::LibraryError;
use crate::model::project::property::Settings;

/// Largest side a resize may produce.
pub const MAX_DIMENSION: u32 = 16_384;

/// Scales by `width`/`height` percentages. With `keep_aspect` the height follows the width.
///
/// Fails instead of allocating when either side would exceed [`MAX_DIMENSION`].
pub fn resize(image: &RgbaImage, settings: &Settings) -> Result<RgbaImage, LibraryError> {
    let width_pct = settings.get_f64("width").unwrap_or(100.0).max(0.0);
    let keep_aspect = settings.get_bool("keep_aspect").unwrap_or(true);
    let height_pct = if keep_aspect {
        width_pct
    } else {
        settings.get_f64("height").unwrap_or(100.0).max(0.0)
    };

    let (w, h) = image.dimensions();
    let new_w = scaled(w, width_pct);
    let new_h = scaled(h, height_pct);
    if new_w > MAX_DIMENSION as u64 || new_h > MAX_DIMENSION as u64 {
        return Err(LibraryError::ImageTooLarge {
            width: new_w,
            height: new_h,
        });
    }
    let (new_w, new_h) = (new_w as u32, new_h as u32);
    if (new_w, new_h) == (w, h) {
        return Ok(image.clone());
    }
    Ok(imageops::resize(image, new_w, new_h, FilterType::Lanczos3))
}

fn scaled(size: u32, percent: f64) -> u64 {
    ((size as f64 * percent / 100.0).round() as u64).max(1)
}

/// Rotates counter-clockwise about the center, keeping the canvas size.
/// Uncovered pixels are transparent.
pub fn rotate(image: &RgbaImage, settings: &Settings) -> RgbaImage {
    let angle = settings.get_f64("angle").unwrap_or(0.0).rem_euclid(360.0);
    let (w, h) = image.dimensions();

    if angle == 0.0 {
        return image.clone();
    }
    if angle == 180.0 {
        return imageops::rotate180(image);
    }
    if w == h && angle == 90.0 {
        return imageops::rotate270(image);
    }
    if w == h && angle == 270.0 {
        return imageops::rotate90(image);
    }

    let (sin, cos) = angle.to_radians().sin_cos();
    let cx = w as f64 / 2.0;
    let cy = h as f64 / 2.0;
    RgbaImage::from_fn(w, h, |x, y| {
        let dx = x as f64 + 0.5 - cx;
        let dy = y as f64 + 0.5 - cy;
        let sx = dx * cos - dy * sin + cx - 0.5;
        let sy = dx * sin + dy * cos + cy - 0.5;
        sample_bilinear(image, sx, sy)
    })
}

fn sample_bilinear(image: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    let (w, h) = image.dimensions();
    if x < -0.5 || y < -0.5 || x > w as f64 - 0.5 || y > h as f64 - 0.5 {
        return Rgba([0, 0, 0, 0]);
    }

    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let fetch = |px: f64, py: f64| -> [f64; 4] {
        let px = px.clamp(0.0, (w - 1) as f64) as u32;
        let py = py.clamp(0.0, (h - 1) as f64) as u32;
        image.get_pixel(px, py).0.map(f64::from)
    };

    let tl = fetch(x0, y0);
    let tr = fetch(x0 + 1.0, y0);
    let bl = fetch(x0, y0 + 1.0);
    let br = fetch(x0 + 1.0, y0 + 1.0);
    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = tl[c] + (tr[c] - tl[c]) * fx;
        let bottom = bl[c] + (br[c] - bl[c]) * fx;
        out[c] = (top + (bottom - top) * fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgba(out)
}

/// Removes `left`/`top`/`right`/`bottom` pixels, always keeping at least one pixel.
pub fn crop(image: &RgbaImage, settings: &Settings) -> RgbaImage {
    let (w, h) = image.dimensions();
    let inset = |key: &str| settings.get_i64(key).unwrap_or(0).max(0) as u32;

    let left = inset("left").min(w.saturating_sub(1));
    let top = inset("top").min(h.saturating_sub(1));
    let width = w.saturating_sub(left).saturating_sub(inset("right")).max(1);
    let height = h.saturating_sub(top).saturating_sub(inset("bottom")).max(1);
    if (left, top, width, height) == (0, 0, w, h) {
        return image.clone();
    }
    imageops::crop_imm(image, left, top, width, height).to_image()
}

pub fn flip(image: &RgbaImage, settings: &Settings) -> RgbaImage {
    let mut out = image.clone();
    if settings.get_bool("horizontal").unwrap_or(false) {
        out = imageops::flip_horizontal(&out);
    }
    if settings.get_bool("vertical").unwrap_or(false) {
        out = imageops::flip_vertical(&out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| Rgba([(x * 10) as u8, (y * 10) as u8, 0, 255]))
    }

    #[test]
    fn test_resize_keeps_aspect_by_default() {
        let out = resize(&gradient(20, 10), &Settings::new().with("width", 50)).unwrap();
        assert_eq!(out.dimensions(), (10, 5));
    }

    #[test]
    fn test_resize_independent_axes() {
        let settings = Settings::new()
            .with("width", 50)
            .with("height", 200)
            .with("keep_aspect", false);
        let out = resize(&gradient(20, 10), &settings).unwrap();
        assert_eq!(out.dimensions(), (10, 20));
    }

    #[test]
    fn test_resize_never_collapses_to_zero() {
        let out = resize(&gradient(3, 3), &Settings::new().with("width", 1)).unwrap();
        assert_eq!(out.dimensions(), (1, 1));
    }

    #[test]
    fn test_resize_refuses_oversized_output() {
        let image = RgbaImage::new(2000, 10);
        let result = resize(&image, &Settings::new().with("width", 1000));
        assert!(matches!(
            result,
            Err(LibraryError::ImageTooLarge { width: 20000, height: 100 })
        ));
    }

    #[test]
    fn test_rotate_180_is_exact() {
        let image = gradient(4, 3);
        let out = rotate(&image, &Settings::new().with("angle", 180));
        assert_eq!(out.get_pixel(0, 0), image.get_pixel(3, 2));
    }

    #[test]
    fn test_rotate_90_counter_clockwise_on_square() {
        let image = gradient(3, 3);
        let out = rotate(&image, &Settings::new().with("angle", 90));
        // Top-right corner moves to the top-left
        assert_eq!(out.get_pixel(0, 0), image.get_pixel(2, 0));
    }

    #[test]
    fn test_rotate_arbitrary_keeps_canvas_and_clears_corners() {
        let image = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let out = rotate(&image, &Settings::new().with("angle", 45));
        assert_eq!(out.dimensions(), (10, 10));
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(5, 5), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_crop_clamps_to_one_pixel() {
        let settings = Settings::new().with("left", 2).with("right", 100);
        let out = crop(&gradient(4, 4), &settings);
        assert_eq!(out.dimensions(), (1, 4));
    }

    #[test]
    fn test_flip_horizontal() {
        let image = gradient(3, 1);
        let out = flip(&image, &Settings::new().with("horizontal", true));
        assert_eq!(out.get_pixel(0, 0), image.get_pixel(2, 0));
    }
}
