//! Built-in label font based on the Spleen 12×24 bitmap font.
//!
//! Glyphs are scaled to the requested pixel size with 3×3 supersampling.
//! Bold weights are synthesized by smearing each glyph row to the right,
//! italic by shearing around the baseline.

use image::RgbaImage;
use spleen_font::{FONT_12X24, PSF2Font};

use super::{FontDescriptor, FontMetricsProvider, TextMetrics, TextPainter};
use crate::canvas::blend_pixel;
use crate::style::{Color, FontWeight};

const CELL_WIDTH: usize = 12;
const CELL_HEIGHT: usize = 24;

/// Rows above the baseline in a Spleen 12×24 cell.
const BASELINE_ROW: f32 = 19.0;

/// Horizontal shear per source row for synthesized italics.
const ITALIC_SLANT: f32 = 0.2;

const SUPERSAMPLE: usize = 3;

/// Monochrome glyph in source (unscaled) pixels.
#[derive(Debug, Clone)]
struct Glyph {
    width: usize,
    bits: Vec<bool>,
}

impl Glyph {
    fn get(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= CELL_HEIGHT as i64 {
            return false;
        }
        self.bits[y as usize * self.width + x as usize]
    }

    /// Rows that contain at least one set pixel, as (first, last).
    fn ink_rows(&self) -> Option<(usize, usize)> {
        let has_ink = |row: usize| self.bits[row * self.width..(row + 1) * self.width]
            .iter()
            .any(|&b| b);
        let first = (0..CELL_HEIGHT).find(|&r| has_ink(r))?;
        let last = (0..CELL_HEIGHT).rev().find(|&r| has_ink(r))?;
        Some((first, last))
    }
}

/// Spleen-backed [`TextPainter`]. Ignores the font family.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitmapFont;

impl BitmapFont {
    pub fn new() -> Self {
        Self
    }

    /// Extra columns added by synthetic emboldening.
    fn embolden(weight: FontWeight) -> usize {
        match weight {
            FontWeight::Normal => 0,
            FontWeight::Bold => 1,
            FontWeight::ExtraBold => 2,
        }
    }

    fn glyph(ch: char, weight: FontWeight) -> Glyph {
        let mut base = vec![false; CELL_WIDTH * CELL_HEIGHT];

        let found = PSF2Font::new(FONT_12X24).ok().and_then(|mut font| {
            let utf8 = ch.to_string();
            let spleen_glyph = font.glyph_for_utf8(utf8.as_bytes())?;
            for (row_y, row) in spleen_glyph.enumerate() {
                for (col_x, on) in row.enumerate() {
                    if row_y < CELL_HEIGHT && col_x < CELL_WIDTH {
                        base[row_y * CELL_WIDTH + col_x] = on;
                    }
                }
            }
            Some(())
        });

        if found.is_none() && !ch.is_whitespace() {
            draw_box(&mut base);
        }

        let extra = Self::embolden(weight);
        let width = CELL_WIDTH + extra;
        let mut bits = vec![false; width * CELL_HEIGHT];
        for y in 0..CELL_HEIGHT {
            for x in 0..width {
                bits[y * width + x] = (0..=extra).any(|shift| {
                    x >= shift && x - shift < CELL_WIDTH && base[y * CELL_WIDTH + x - shift]
                });
            }
        }
        Glyph { width, bits }
    }

    fn layout(text: &str, weight: FontWeight) -> (Vec<(Glyph, usize)>, usize) {
        let mut caret = 0;
        let glyphs = text
            .chars()
            .map(|ch| {
                let glyph = Self::glyph(ch, weight);
                let origin = caret;
                caret += glyph.width;
                (glyph, origin)
            })
            .collect();
        (glyphs, caret)
    }

    fn scale(font: &FontDescriptor) -> f32 {
        font.size.max(0.0) / CELL_HEIGHT as f32
    }

    fn slant(font: &FontDescriptor) -> f32 {
        if font.italic { ITALIC_SLANT } else { 0.0 }
    }
}

impl FontMetricsProvider for BitmapFont {
    fn measure(&self, font: &FontDescriptor, text: &str) -> TextMetrics {
        let scale = Self::scale(font);
        let (glyphs, advance) = Self::layout(text, font.weight);

        let ink = glyphs
            .iter()
            .filter_map(|(g, _)| g.ink_rows())
            .reduce(|(a0, a1), (b0, b1)| (a0.min(b0), a1.max(b1)));

        let (ascent_rows, descent_rows) = match ink {
            Some((first, last)) => (BASELINE_ROW - first as f32, last as f32 + 1.0 - BASELINE_ROW),
            None => (BASELINE_ROW, CELL_HEIGHT as f32 - BASELINE_ROW),
        };

        TextMetrics {
            ascent: (ascent_rows * scale).max(0.0),
            descent: (descent_rows * scale).max(0.0),
            width: (advance as f32 + Self::slant(font) * BASELINE_ROW) * scale,
        }
    }
}

impl TextPainter for BitmapFont {
    fn draw_text(
        &self,
        canvas: &mut RgbaImage,
        font: &FontDescriptor,
        text: &str,
        center_x: f32,
        baseline_y: f32,
        color: Color,
    ) {
        let scale = Self::scale(font);
        if scale <= 0.0 {
            return;
        }
        let slant = Self::slant(font);
        let (glyphs, advance) = Self::layout(text, font.weight);
        let total_width = (advance as f32 + slant * BASELINE_ROW) * scale;
        let left = center_x - total_width / 2.0;
        let top = baseline_y - BASELINE_ROW * scale;
        let slant_px = (slant * BASELINE_ROW * scale).ceil() as i64;

        let (canvas_w, canvas_h) = (canvas.width() as i64, canvas.height() as i64);
        let y_start = (top.floor() as i64).max(0);
        let y_end = ((top + CELL_HEIGHT as f32 * scale).ceil() as i64).min(canvas_h);

        for (glyph, origin) in &glyphs {
            let gx0 = left + *origin as f32 * scale;
            // Only the part of the glyph box that lands on the canvas
            let x_start = (gx0.floor() as i64).max(0);
            let x_end = ((gx0 + glyph.width as f32 * scale).ceil() as i64 + slant_px).min(canvas_w);

            for py in y_start..y_end {
                for px in x_start..x_end {
                    let mut hits = 0;
                    for sy in 0..SUPERSAMPLE {
                        for sx in 0..SUPERSAMPLE {
                            let fx = px as f32 + (sx as f32 + 0.5) / SUPERSAMPLE as f32;
                            let fy = py as f32 + (sy as f32 + 0.5) / SUPERSAMPLE as f32;
                            let v = (fy - top) / scale;
                            let u = (fx - gx0) / scale - slant * (BASELINE_ROW - v);
                            if glyph.get(u.floor() as i64, v.floor() as i64) {
                                hits += 1;
                            }
                        }
                    }
                    if hits > 0 {
                        let coverage = hits as f32 / (SUPERSAMPLE * SUPERSAMPLE) as f32;
                        blend_pixel(canvas, px, py, color, coverage);
                    }
                }
            }
        }
    }
}

/// Outline box for characters missing from the font.
fn draw_box(bits: &mut [bool]) {
    for x in 0..CELL_WIDTH {
        bits[4 * CELL_WIDTH + x] = true;
        bits[(BASELINE_ROW as usize - 1) * CELL_WIDTH + x] = true;
    }
    for y in 4..BASELINE_ROW as usize {
        bits[y * CELL_WIDTH] = true;
        bits[y * CELL_WIDTH + CELL_WIDTH - 1] = true;
    }
}
