//! TTF/OTF label fonts via ab_glyph.
//!
//! Fonts are registered per family, weight and style. A request picks the
//! face of the same family with matching style first and closest weight
//! second. Families without any registered face fall back to [`BitmapFont`].

use ab_glyph::{Font, FontArc, GlyphId, ScaleFont, point};
use image::RgbaImage;
use std::path::Path;

use super::{BitmapFont, FontDescriptor, FontMetricsProvider, TextMetrics, TextPainter};
use crate::canvas::blend_pixel;
use crate::error::ResourceError;
use crate::style::{Color, FontWeight};

struct FontFace {
    family: String,
    weight: FontWeight,
    italic: bool,
    font: FontArc,
}

/// A set of loaded font faces.
#[derive(Default)]
pub struct TtfFontBook {
    faces: Vec<FontFace>,
    fallback: BitmapFont,
}

impl TtfFontBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a face from raw font bytes.
    pub fn add_font(
        &mut self,
        family: &str,
        weight: FontWeight,
        italic: bool,
        bytes: Vec<u8>,
    ) -> Result<(), ResourceError> {
        let font = FontArc::try_from_vec(bytes).map_err(|e| ResourceError::Font(e.to_string()))?;
        self.faces.push(FontFace {
            family: family.trim().to_lowercase(),
            weight,
            italic,
            font,
        });
        Ok(())
    }

    /// Register a face from a font file.
    pub fn load_file(
        &mut self,
        family: &str,
        weight: FontWeight,
        italic: bool,
        path: &Path,
    ) -> Result<(), ResourceError> {
        let bytes = std::fs::read(path)
            .map_err(|e| ResourceError::Font(format!("{}: {}", path.display(), e)))?;
        self.add_font(family, weight, italic, bytes)?;
        log::info!(
            "Registered font {} {} {}from {}",
            family,
            weight,
            if italic { "italic " } else { "" },
            path.display()
        );
        Ok(())
    }

    /// Registered faces as `(family, weight, italic)`.
    pub fn faces(&self) -> Vec<(String, FontWeight, bool)> {
        self.faces
            .iter()
            .map(|f| (f.family.clone(), f.weight, f.italic))
            .collect()
    }

    fn select(&self, request: &FontDescriptor) -> Option<&FontArc> {
        let family = request.family.trim().to_lowercase();
        self.faces
            .iter()
            .filter(|face| face.family == family)
            .min_by_key(|face| {
                let style_miss = u16::from(face.italic != request.italic) * 1000;
                style_miss + face.weight.numeric().abs_diff(request.weight.numeric())
            })
            .map(|face| &face.font)
    }
}

/// Glyph ids and pen positions for a single line, starting at x = 0.
fn layout(font: &FontArc, size: f32, text: &str) -> (Vec<(GlyphId, f32)>, f32) {
    let scaled = font.as_scaled(size);
    let mut glyphs = Vec::new();
    let mut caret_x = 0.0f32;
    let mut previous: Option<GlyphId> = None;

    for ch in text.chars() {
        let glyph_id = font.glyph_id(ch);
        if let Some(prev) = previous {
            caret_x += scaled.kern(prev, glyph_id);
        }
        glyphs.push((glyph_id, caret_x));
        caret_x += scaled.h_advance(glyph_id);
        previous = Some(glyph_id);
    }

    (glyphs, caret_x)
}

impl FontMetricsProvider for TtfFontBook {
    fn measure(&self, request: &FontDescriptor, text: &str) -> TextMetrics {
        let Some(font) = self.select(request) else {
            return self.fallback.measure(request, text);
        };

        let (glyphs, width) = layout(font, request.size, text);
        let mut ink: Option<(f32, f32)> = None;
        for (glyph_id, x) in glyphs {
            let glyph = glyph_id.with_scale_and_position(request.size, point(x, 0.0));
            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                ink = Some(match ink {
                    Some((top, bottom)) => (top.min(bounds.min.y), bottom.max(bounds.max.y)),
                    None => (bounds.min.y, bounds.max.y),
                });
            }
        }

        let (ascent, descent) = match ink {
            Some((top, bottom)) => (-top, bottom),
            None => {
                let scaled = font.as_scaled(request.size);
                (scaled.ascent(), -scaled.descent())
            }
        };

        TextMetrics {
            ascent: ascent.max(0.0),
            descent: descent.max(0.0),
            width,
        }
    }
}

impl TextPainter for TtfFontBook {
    fn draw_text(
        &self,
        canvas: &mut RgbaImage,
        request: &FontDescriptor,
        text: &str,
        center_x: f32,
        baseline_y: f32,
        color: Color,
    ) {
        let Some(font) = self.select(request) else {
            self.fallback
                .draw_text(canvas, request, text, center_x, baseline_y, color);
            return;
        };

        let (glyphs, width) = layout(font, request.size, text);
        let left = center_x - width / 2.0;

        for (glyph_id, x) in glyphs {
            let glyph = glyph_id.with_scale_and_position(request.size, point(left + x, baseline_y));
            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|px, py, coverage| {
                    let x = px as i64 + bounds.min.x as i64;
                    let y = py as i64 + bounds.min.y as i64;
                    blend_pixel(canvas, x, y, color, coverage);
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(family: &str) -> FontDescriptor {
        FontDescriptor {
            family: family.into(),
            size: 20.0,
            weight: FontWeight::Bold,
            italic: false,
        }
    }

    #[test]
    fn test_unknown_family_falls_back_to_bitmap() {
        let book = TtfFontBook::new();
        let req = request("Nonexistent");
        assert_eq!(book.measure(&req, "abc"), BitmapFont.measure(&req, "abc"));
    }

    #[test]
    fn test_invalid_font_bytes_rejected() {
        let mut book = TtfFontBook::new();
        let result = book.add_font("Broken", FontWeight::Normal, false, b"not a font".to_vec());
        assert!(matches!(result, Err(ResourceError::Font(_))));
        assert!(book.faces().is_empty());
    }

    #[test]
    fn test_missing_file_rejected() {
        let mut book = TtfFontBook::new();
        let result = book.load_file(
            "Lexend",
            FontWeight::Bold,
            false,
            Path::new("/nonexistent/font.ttf"),
        );
        assert!(result.is_err());
    }
}
