//! PNG encoding and content hashing for the sprite sheet.

use std::io::Cursor;

use image::{ImageFormat, RgbaImage};
use md5::{Digest, Md5};

use crate::error::{LoadError, Result};

/// Encode the canvas as PNG.
///
/// Encoder settings are fixed, so equal pixels give equal bytes.
pub fn encode_png(canvas: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    canvas
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| LoadError::Encode {
            message: e.to_string(),
        })?;
    Ok(bytes)
}

/// Lowercase hex MD5 digest of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_content_hash_known_value() {
        assert_eq!(content_hash(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(content_hash(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn test_encode_png_signature() {
        let canvas = RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 4]));
        let bytes = encode_png(&canvas).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_encode_png_preserves_alpha() {
        let mut canvas = RgbaImage::new(2, 1);
        canvas.put_pixel(1, 0, Rgba([255, 0, 0, 128]));

        let decoded = image::load_from_memory(&encode_png(&canvas).unwrap())
            .unwrap()
            .to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0).0, [0, 0, 0, 0]);
        assert_eq!(decoded.get_pixel(1, 0).0, [255, 0, 0, 128]);
    }
}
