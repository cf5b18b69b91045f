//! # Text Measurement and Drawing
//!
//! The label compositor never rasterizes text itself. It asks a
//! [`FontMetricsProvider`] for the ink extents of a string and a
//! [`TextPainter`] to draw it.
//!
//! Two implementations ship with the crate:
//!
//! | Type | Source | Notes |
//! |------|--------|-------|
//! | [`BitmapFont`] | Spleen 12×24 bitmap font | Always available, weight and italic are synthesized |
//! | [`TtfFontBook`] | TTF/OTF files registered per family | Falls back to [`BitmapFont`] for unknown families |

mod bitmap;
mod ttf;

pub use bitmap::BitmapFont;
pub use ttf::TtfFontBook;

use image::RgbaImage;
use std::fmt;

use crate::style::{Color, FontWeight, LabelStyle};

/// A font request: family, pixel size, weight and style.
///
/// `Display` renders it as a CSS font shorthand, e.g.
/// `"italic 700 53.333332px Lexend"`.
#[derive(Debug, Clone, PartialEq)]
pub struct FontDescriptor {
    pub family: String,
    pub size: f32,
    pub weight: FontWeight,
    pub italic: bool,
}

impl FontDescriptor {
    /// Descriptor for a label at an already-scaled pixel size.
    pub fn for_label(label: &LabelStyle, size: f32) -> Self {
        Self {
            family: label.font_family.clone(),
            size,
            weight: label.weight,
            italic: label.italic,
        }
    }
}

impl fmt::Display for FontDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let style = if self.italic { "italic" } else { "normal" };
        write!(
            f,
            "{} {} {}px {}",
            style,
            self.weight.numeric(),
            self.size,
            self.family
        )
    }
}

/// Ink extents of a string, in pixels.
///
/// `ascent` is measured up from the baseline and `descent` down from it,
/// both as tight bounds of the drawn glyphs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub width: f32,
}

impl TextMetrics {
    pub fn height(&self) -> f32 {
        self.ascent + self.descent
    }
}

/// Measures text without drawing it.
pub trait FontMetricsProvider: Send + Sync {
    fn measure(&self, font: &FontDescriptor, text: &str) -> TextMetrics;
}

/// Draws text onto a canvas.
pub trait TextPainter: FontMetricsProvider {
    /// Draw `text` horizontally centered on `center_x` with its baseline at `baseline_y`.
    fn draw_text(
        &self,
        canvas: &mut RgbaImage,
        font: &FontDescriptor,
        text: &str,
        center_x: f32,
        baseline_y: f32,
        color: Color,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_string() {
        let label = LabelStyle {
            italic: true,
            ..Default::default()
        };
        let font = FontDescriptor::for_label(&label, 32.0);
        assert_eq!(font.to_string(), "italic 700 32px Lexend");

        let label = LabelStyle {
            weight: FontWeight::Normal,
            font_family: "Courier New".into(),
            ..Default::default()
        };
        assert_eq!(
            FontDescriptor::for_label(&label, 16.5).to_string(),
            "normal 400 16.5px Courier New"
        );
    }
}
