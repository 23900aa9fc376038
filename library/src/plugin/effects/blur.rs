use image::RgbaImage;
use image::imageops;

use crate::model::project::property::Settings;

/// Gaussian blur with `radius` used as sigma. A radius of zero is the identity.
pub fn blur(image: &RgbaImage, settings: &Settings) -> RgbaImage {
    let radius = settings.get_f64("radius").unwrap_or(0.0);
    if radius <= 0.0 {
        return image.clone();
    }
    imageops::blur(image, radius as f32)
}
