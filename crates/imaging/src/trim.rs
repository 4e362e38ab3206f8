use crate::error::{ErrorKind, Result};
use image::{RgbaImage, imageops};

/// An axis-aligned rectangle within an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Smallest rectangle containing every pixel with a non-zero alpha, or `None`
/// when there is no such pixel (including zero-sized images).
pub fn bounding_box(image: &RgbaImage) -> Option<Bounds> {
    let (width, height) = image.dimensions();
    let (mut min_x, mut min_y) = (u32::MAX, u32::MAX);
    let (mut max_x, mut max_y) = (0u32, 0u32);
    let mut found = false;

    for (y, row) in image.enumerate_rows() {
        let mut row_has_content = false;
        for (x, _, pixel) in row {
            if pixel.0[3] == 0 {
                continue;
            }
            row_has_content = true;
            min_x = min_x.min(x);
            max_x = max_x.max(x);
        }
        if row_has_content {
            found = true;
            min_y = min_y.min(y);
            max_y = y;
        }
    }

    if !found || width == 0 || height == 0 {
        return None;
    }
    Some(Bounds {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    })
}

/// Crop away fully-transparent margins.
///
/// Pixels inside the bounding box are copied through untouched.
///
/// # Errors
/// [`FullyTransparent`](ErrorKind::FullyTransparent) when no pixel has a
/// non-zero alpha; a zero-sized image is never returned.
pub fn trim(image: &RgbaImage) -> Result<RgbaImage> {
    let Some(Bounds { x, y, width, height }) = bounding_box(image) else {
        exn::bail!(ErrorKind::FullyTransparent);
    };
    if (x, y, width, height) == (0, 0, image.width(), image.height()) {
        return Ok(image.clone());
    }
    Ok(imageops::crop_imm(image, x, y, width, height).to_image())
}
