//! Image encoding service
//!
//! Decoded bitmaps are embedded as PNG. The encoder sits behind a trait so a
//! caller can substitute its own.

use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;

use crate::dib::Bitmap;
use crate::error::{ConvertError, Result};

/// Transparent 5x5 PNG emitted when a bitmap cannot be decoded.
pub const PLACEHOLDER_PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAUAAAAFCAYAAACNbyblAAAABGdBTUEAALGPC/xhBQAAAAZiS0dEAP8A/wD/oL2nkwAAAAlwSFlzAAALEwAACxMBAJqcGAAAAAd0SU1FB+ABFREtOJX7FAkAAAAIdEVYdENvbW1lbnQA9syWvwAAAAxJREFUCNdjYKATAAAAaQABwB3y+AAAAABJRU5ErkJggg==";

/// Data URI of the placeholder image.
pub fn placeholder_uri() -> String {
    format!("data:image/png;base64,{}", PLACEHOLDER_PNG_BASE64)
}

pub trait ImageCodec {
    /// Encode an RGBA bitmap as PNG bytes.
    fn encode_png(&self, bitmap: &Bitmap) -> Result<Vec<u8>>;
}

/// PNG encoder backed by the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct PngCodec;

impl ImageCodec for PngCodec {
    fn encode_png(&self, bitmap: &Bitmap) -> Result<Vec<u8>> {
        let img = RgbaImage::from_raw(bitmap.width, bitmap.height, bitmap.rgba.clone())
            .ok_or_else(|| {
                ConvertError::ImageDecode(format!(
                    "pixel buffer does not match {}x{}",
                    bitmap.width, bitmap.height
                ))
            })?;
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_png_signature() {
        let bitmap = Bitmap { width: 2, height: 1, rgba: vec![255, 0, 0, 255, 0, 255, 0, 255] };
        let png = PngCodec.encode_png(&bitmap).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_encode_png_rejects_short_buffer() {
        let bitmap = Bitmap { width: 2, height: 2, rgba: vec![0; 4] };
        assert!(matches!(PngCodec.encode_png(&bitmap), Err(ConvertError::ImageDecode(_))));
    }

    #[test]
    fn test_placeholder_uri() {
        assert!(placeholder_uri().starts_with("data:image/png;base64,iVBORw0KGgo"));
    }
}
