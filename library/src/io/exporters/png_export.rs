use crate::error::LibraryError;
use image::ImageEncoder;
use image::RgbaImage;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

pub fn export_png(path: &Path, image: &RgbaImage) -> Result<(), LibraryError> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let encoder =
        PngEncoder::new_with_quality(writer, CompressionType::Fast, FilterType::NoFilter);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(())
}
