//! Writing rendered output to disk.

pub mod png_export;

use image::{DynamicImage, ImageFormat, RgbaImage};
use log::info;
use std::path::{Path, PathBuf};

use crate::error::LibraryError;

pub use self::png_export::export_png;

/// Appends `.{extension}` unless `path` already carries an extension.
pub fn with_default_extension(path: &Path, extension: &str) -> PathBuf {
    match path.extension() {
        Some(ext) if !ext.is_empty() => path.to_path_buf(),
        _ => path.with_extension(extension.trim_start_matches('.')),
    }
}

/// Saves `image`, choosing the encoder from the file extension.
///
/// An unusable target (missing directory, no permission, unknown format) is reported as
/// [`LibraryError::InvalidLocation`].
pub fn export_image(path: &Path, image: &RgbaImage) -> Result<(), LibraryError> {
    let invalid = |_| LibraryError::InvalidLocation(path.to_path_buf());
    let format = ImageFormat::from_path(path).map_err(invalid)?;

    let result = match format {
        ImageFormat::Png => export_png(path, image),
        // Formats without alpha get an RGB copy
        ImageFormat::Jpeg | ImageFormat::Bmp => DynamicImage::ImageRgba8(image.clone())
            .to_rgb8()
            .save_with_format(path, format)
            .map_err(LibraryError::from),
        _ => image.save_with_format(path, format).map_err(LibraryError::from),
    };

    result.map_err(|e| match e {
        LibraryError::Io(_) | LibraryError::Image(_) => LibraryError::InvalidLocation(path.to_path_buf()),
        other => other,
    })?;
    info!("Exported {}x{} image to {}", image.width(), image.height(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_extension_only_when_missing() {
        assert_eq!(with_default_extension(Path::new("out"), "png"), PathBuf::from("out.png"));
        assert_eq!(with_default_extension(Path::new("out.jpg"), "png"), PathBuf::from("out.jpg"));
        assert_eq!(
            with_default_extension(Path::new("proj"), ".cresliant"),
            PathBuf::from("proj.cresliant")
        );
    }

    #[test]
    fn test_export_into_missing_directory_is_invalid_location() {
        let image = RgbaImage::new(2, 2);
        let err = export_image(Path::new("/no/such/dir/out.png"), &image).unwrap_err();
        assert!(matches!(err, LibraryError::InvalidLocation(_)));
    }
}
