//! Image transforms applied to every synced sprite: decode, trim transparent
//! margins, box-scale, and re-encode as PNG.
//!
//! Everything here is synchronous and CPU-bound; async callers should run it
//! on a blocking thread.

pub mod error;
mod scale;
mod trim;

pub use crate::scale::{scale, scaled_dimensions};
pub use crate::trim::{Bounds, bounding_box, trim};
pub use image::{Rgba, RgbaImage};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use image::ImageFormat;
use std::io::Cursor;

/// Decode any supported image format into 8-bit RGBA.
pub fn decode(bytes: &[u8]) -> Result<RgbaImage> {
    let image = image::load_from_memory(bytes).or_raise(|| ErrorKind::Decode)?;
    Ok(image.into_rgba8())
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png).or_raise(|| ErrorKind::Encode)?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_round_trip() {
        let image = RgbaImage::from_fn(4, 3, |x, y| Rgba([x as u8 * 60, y as u8 * 80, 5, 255 - x as u8]));
        let bytes = encode_png(&image).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        assert_eq!(decode(&bytes).unwrap(), image);
    }

    #[test]
    fn test_decode_garbage() {
        let err = decode(b"definitely not a png").unwrap_err();
        assert_eq!(*err, ErrorKind::Decode);
    }
}
