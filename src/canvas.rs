//! Pixel-level drawing helpers on `image::RgbaImage`.
//!
//! All drawing in the crate goes through these helpers so coverage blending
//! behaves the same for code modules, label bands and glyphs.

use image::{Rgba, RgbaImage};

use crate::style::Color;

/// Blend `color` over the pixel at (x, y) with the given coverage (0..=1).
///
/// Out-of-bounds coordinates are ignored.
pub fn blend_pixel(canvas: &mut RgbaImage, x: i64, y: i64, color: Color, coverage: f32) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    let src_a = (color.a as f32 / 255.0) * coverage.clamp(0.0, 1.0);
    if src_a <= 0.0 {
        return;
    }

    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        return;
    }

    let mix = |s: u8, d: u8| {
        let v = (s as f32 * src_a + d as f32 * dst_a * (1.0 - src_a)) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };
    *dst = Rgba([
        mix(color.r, dst[0]),
        mix(color.g, dst[1]),
        mix(color.b, dst[2]),
        (out_a * 255.0).round() as u8,
    ]);
}

/// Fill an axis-aligned rectangle given in fractional pixels.
///
/// Edges are snapped to whole pixels (round-half-up), so adjacent rectangles
/// never overlap or leave seams.
pub fn fill_rect(canvas: &mut RgbaImage, x: f32, y: f32, width: f32, height: f32, color: Color) {
    let x0 = x.round().max(0.0) as u32;
    let y0 = y.round().max(0.0) as u32;
    let x1 = ((x + width).round().max(0.0) as u32).min(canvas.width());
    let y1 = ((y + height).round().max(0.0) as u32).min(canvas.height());

    for py in y0..y1 {
        for px in x0..x1 {
            blend_pixel(canvas, px as i64, py as i64, color, 1.0);
        }
    }
}

/// Replace every pixel with `color` (no blending).
pub fn clear(canvas: &mut RgbaImage, color: Color) {
    let rgba = color.to_rgba();
    for pixel in canvas.pixels_mut() {
        *pixel = rgba;
    }
}
