//! Box (area-averaging) resampling.
//!
//! Every output pixel is the coverage-weighted mean of the source pixels its
//! footprint overlaps. For integer upscales each output pixel lands inside a
//! single source pixel, so edges stay crisp. Colour is averaged premultiplied
//! by alpha so transparent pixels don't bleed their (meaningless) colour into
//! their neighbours.

use crate::error::{ErrorKind, Result};
use image::{Rgba, RgbaImage};

/// Output dimensions for `factor`: each side rounded to the nearest pixel.
///
/// # Errors
/// [`InvalidScale`](ErrorKind::InvalidScale) when `factor` is not a positive
/// finite number, or a side would round to zero or overflow.
pub fn scaled_dimensions(width: u32, height: u32, factor: f64) -> Result<(u32, u32)> {
    if !factor.is_finite() || factor <= 0.0 {
        exn::bail!(ErrorKind::InvalidScale(format!("factor must be positive and finite, got {factor}")));
    }
    let side = |len: u32| -> Result<u32> {
        let scaled = (f64::from(len) * factor).round();
        if scaled < 1.0 || scaled > f64::from(u32::MAX) {
            exn::bail!(ErrorKind::InvalidScale(format!(
                "{width}x{height} scaled by {factor} has a side of {scaled} pixels"
            )));
        }
        Ok(scaled as u32)
    };
    Ok((side(width)?, side(height)?))
}

/// Resize `image` by `factor` using a box filter.
///
/// A factor that leaves the dimensions unchanged returns an identical copy.
pub fn scale(image: &RgbaImage, factor: f64) -> Result<RgbaImage> {
    let (width, height) = image.dimensions();
    let (out_width, out_height) = scaled_dimensions(width, height, factor)?;
    if (out_width, out_height) == (width, height) {
        return Ok(image.clone());
    }

    let premultiplied: Vec<[f32; 4]> = image.pixels().map(premultiply).collect();
    let horizontal = resample_rows(&premultiplied, width, height, &contributions(width, out_width));
    let vertical = resample_columns(&horizontal, out_width, &contributions(height, out_height));

    let mut output = RgbaImage::new(out_width, out_height);
    for (pixel, value) in output.pixels_mut().zip(vertical) {
        *pixel = unpremultiply(value);
    }
    tracing::trace!(width, height, out_width, out_height, "Scaled image");
    Ok(output)
}

/// The source pixels feeding one output pixel along a single axis.
struct Contribution {
    first: usize,
    weights: Vec<f32>,
}

fn contributions(src: u32, dst: u32) -> Vec<Contribution> {
    let edge = |i: u32| (u64::from(i) * u64::from(src)) as f64 / f64::from(dst);
    (0..dst)
        .map(|i| {
            let (lo, hi) = (edge(i), edge(i + 1));
            let first = lo.floor() as u32;
            let last = (hi.ceil() as u32).clamp(first + 1, src);
            let mut weights: Vec<f32> = (first..last)
                .map(|s| (hi.min(f64::from(s) + 1.0) - lo.max(f64::from(s))).max(0.0) as f32)
                .collect();
            let total: f32 = weights.iter().sum();
            if total > 0.0 {
                weights.iter_mut().for_each(|w| *w /= total);
            }
            Contribution {
                first: first as usize,
                weights,
            }
        })
        .collect()
}

fn resample_rows(src: &[[f32; 4]], width: u32, height: u32, columns: &[Contribution]) -> Vec<[f32; 4]> {
    let width = width as usize;
    let mut out = Vec::with_capacity(columns.len() * height as usize);
    for row in src.chunks_exact(width) {
        for c in columns {
            out.push(weighted_sum(c.weights.iter().enumerate().map(|(k, w)| (row[c.first + k], *w))));
        }
    }
    out
}

fn resample_columns(src: &[[f32; 4]], width: u32, rows: &[Contribution]) -> Vec<[f32; 4]> {
    let width = width as usize;
    let mut out = Vec::with_capacity(rows.len() * width);
    for r in rows {
        for x in 0..width {
            out.push(weighted_sum(
                r.weights.iter().enumerate().map(|(k, w)| (src[(r.first + k) * width + x], *w)),
            ));
        }
    }
    out
}

fn weighted_sum(samples: impl Iterator<Item = ([f32; 4], f32)>) -> [f32; 4] {
    samples.fold([0.0; 4], |mut acc, (px, w)| {
        for (a, p) in acc.iter_mut().zip(px) {
            *a += p * w;
        }
        acc
    })
}

fn premultiply(pixel: &Rgba<u8>) -> [f32; 4] {
    let [r, g, b, a] = pixel.0.map(f32::from);
    let alpha = a / 255.0;
    [r * alpha, g * alpha, b * alpha, a]
}

fn unpremultiply(value: [f32; 4]) -> Rgba<u8> {
    let [r, g, b, a] = value;
    let to_u8 = |v: f32| v.round().clamp(0.0, 255.0) as u8;
    let alpha = to_u8(a);
    if alpha == 0 {
        return Rgba([0, 0, 0, 0]);
    }
    let inverse = 255.0 / a;
    Rgba([to_u8(r * inverse), to_u8(g * inverse), to_u8(b * inverse), alpha])
}
