//! Header-only inspection of uploaded image files.

use std::io::Cursor;

use image::ImageReader;

use crate::error::CoreError;

/// Format and dimensions read from an image header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub content_type: &'static str,
    /// Canonical file extension for the detected format.
    pub extension: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Detect the format and dimensions of an uploaded file without decoding
/// the pixel data. Non-image uploads are a validation error.
pub fn inspect_image(bytes: &[u8]) -> Result<ImageInfo, CoreError> {
    let not_an_image = || CoreError::Validation("Uploaded file is not a supported image".into());

    let format = image::guess_format(bytes).map_err(|_| not_an_image())?;
    let (width, height) = ImageReader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(|_| not_an_image())?;

    Ok(ImageInfo {
        content_type: format.to_mime_type(),
        extension: format.extensions_str().first().copied().unwrap_or("bin"),
        width,
        height,
    })
}
