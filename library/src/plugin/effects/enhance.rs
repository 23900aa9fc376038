//! Enhancement transforms.
//!
//! Brightness, contrast and sharpness interpolate between the image and a degenerate
//! version of it (black, mean gray, smoothed) by a factor, where a factor of 1.0 leaves
//! the image unchanged. Alpha is never touched by these three.

use image::{Rgba, RgbaImage, imageops};

use crate::model::project::property::Settings;

/// Smoothing kernel used as the degenerate image for sharpness.
const SMOOTH_KERNEL: [f32; 9] = [1.0, 1.0, 1.0, 1.0, 5.0, 1.0, 1.0, 1.0, 1.0];

fn factor(settings: &Settings, divisor: f64) -> f64 {
    settings.get_f64("percentage").unwrap_or(divisor) / divisor
}

fn blend_channel(degenerate: u8, original: u8, factor: f64) -> u8 {
    let d = degenerate as f64;
    (d + (original as f64 - d) * factor).round().clamp(0.0, 255.0) as u8
}

fn blend_with(image: &RgbaImage, degenerate: impl Fn(u32, u32) -> [u8; 3], factor: f64) -> RgbaImage {
    if (factor - 1.0).abs() < f64::EPSILON {
        return image.clone();
    }
    RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        let Rgba([r, g, b, a]) = *image.get_pixel(x, y);
        let [dr, dg, db] = degenerate(x, y);
        Rgba([
            blend_channel(dr, r, factor),
            blend_channel(dg, g, factor),
            blend_channel(db, b, factor),
            a,
        ])
    })
}

pub fn brightness(image: &RgbaImage, settings: &Settings) -> RgbaImage {
    blend_with(image, |_, _| [0, 0, 0], factor(settings, 100.0))
}

pub fn contrast(image: &RgbaImage, settings: &Settings) -> RgbaImage {
    let mean = mean_luminance(image);
    blend_with(image, |_, _| [mean, mean, mean], factor(settings, 100.0))
}

/// Sharpness factor is `percentage / 25`; 25 % leaves the image as is.
pub fn sharpness(image: &RgbaImage, settings: &Settings) -> RgbaImage {
    let factor = factor(settings, 25.0);
    if (factor - 1.0).abs() < f64::EPSILON {
        return image.clone();
    }
    let smoothed = imageops::filter3x3(image, &SMOOTH_KERNEL);
    blend_with(
        image,
        |x, y| {
            let Rgba([r, g, b, _]) = *smoothed.get_pixel(x, y);
            [r, g, b]
        },
        factor,
    )
}

/// Scales alpha by `percentage / 100`.
pub fn opacity(image: &RgbaImage, settings: &Settings) -> RgbaImage {
    let factor = factor(settings, 100.0).clamp(0.0, 1.0);
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        pixel[3] = (pixel[3] as f64 * factor).round() as u8;
    }
    out
}

/// Rounded mean of the ITU-R 601 luma over all pixels.
fn mean_luminance(image: &RgbaImage) -> u8 {
    let count = image.width() as u64 * image.height() as u64;
    if count == 0 {
        return 0;
    }
    let total: u64 = image
        .pixels()
        .map(|Rgba([r, g, b, _])| (*r as u64 * 299 + *g as u64 * 587 + *b as u64 * 114) / 1000)
        .sum();
    ((total as f64 / count as f64) + 0.5) as u8
}
