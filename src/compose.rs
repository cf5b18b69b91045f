//! # Label Compositing
//!
//! Draws a text caption under a rendered code.
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────────────┐  ─┬─
//! │                      │   │ code height
//! │      code image      │   │
//! │                      │   │
//! ├──────────────────────┤  ─┼─
//! │                      │   │ margin × scale
//! ├──────────────────────┤  ─┼─
//! │       padding        │   │ 10 × scale, only with a band color
//! │     Label  text      │   │ ascent + descent
//! │       padding        │   │
//! └──────────────────────┘  ─┴─
//! ```
//!
//! Font size, margin and padding are given at preview resolution and are
//! multiplied by `export_px / preview_px`, so a label keeps its proportions at
//! any export size. Negative sizes count as zero. Labels whose scaled font
//! or composed canvas exceed [`MAX_LABEL_FONT_PX`] / [`MAX_CANVAS_PIXELS`] are
//! rejected with a [`RenderError`] instead of being allocated.

use image::RgbaImage;
use std::fmt;

use crate::canvas::{clear, fill_rect};
use crate::error::RenderError;
use crate::render::{CodeMatrixRenderer, decode_raster, encode_raster};
use crate::style::{Color, DEFAULT_PREVIEW_SIZE, ExportFormat, LabelStyle, StyleConfig};
use crate::text::{FontDescriptor, TextPainter};

/// Vertical padding above and below the text when the band has a color.
pub const LABEL_BACKGROUND_PADDING: f32 = 10.0;

/// Largest scaled label font size that is drawn.
pub const MAX_LABEL_FONT_PX: f32 = 4096.0;

/// Largest composed canvas, in pixels.
pub const MAX_CANVAS_PIXELS: u64 = 64 * 1024 * 1024;

/// Export resolution relative to the resolution label sizes were chosen at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleContext {
    pub export_px: u32,
    pub preview_px: u32,
}

impl ScaleContext {
    pub fn new(export_px: u32, preview_px: u32) -> Self {
        Self {
            export_px,
            preview_px,
        }
    }

    /// Multiplier for label measurements. A zero preview size counts as 300.
    pub fn factor(&self) -> f32 {
        let preview = if self.preview_px == 0 {
            DEFAULT_PREVIEW_SIZE
        } else {
            self.preview_px
        };
        self.export_px as f32 / preview as f32
    }
}

/// Informational condition attached to a successful result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Note {
    /// A label was requested for a vector export and left out.
    LabelOmittedForVector,
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Note::LabelOmittedForVector => {
                write!(f, "Labels are not supported for SVG export; exported without label")
            }
        }
    }
}

/// A code with its label, encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: ExportFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeOutcome {
    /// Label drawn under the code.
    Composed(ComposedImage),
    /// Blank label text; the input bytes are returned untouched.
    Unlabeled(Vec<u8>),
    /// Vector output cannot carry a label; the input bytes are returned untouched.
    VectorSkipped { bytes: Vec<u8>, note: Note },
}

impl ComposeOutcome {
    pub fn bytes(&self) -> &[u8] {
        match self {
            ComposeOutcome::Composed(image) => &image.bytes,
            ComposeOutcome::Unlabeled(bytes) => bytes,
            ComposeOutcome::VectorSkipped { bytes, .. } => bytes,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            ComposeOutcome::Composed(image) => image.bytes,
            ComposeOutcome::Unlabeled(bytes) => bytes,
            ComposeOutcome::VectorSkipped { bytes, .. } => bytes,
        }
    }

    pub fn note(&self) -> Option<Note> {
        match self {
            ComposeOutcome::VectorSkipped { note, .. } => Some(*note),
            _ => None,
        }
    }
}

/// Label geometry in output pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelLayout {
    pub font: FontDescriptor,
    pub margin: f32,
    pub padding: f32,
    pub ascent: f32,
    pub band_height: f32,
}

/// Draws labels with a [`TextPainter`].
pub struct LabelCompositor<'a> {
    painter: &'a dyn TextPainter,
}

impl<'a> LabelCompositor<'a> {
    pub fn new(painter: &'a dyn TextPainter) -> Self {
        Self { painter }
    }

    /// Scaled font and band measurements for a label.
    pub fn layout(&self, label: &LabelStyle, scale: ScaleContext) -> LabelLayout {
        let factor = scale.factor();
        let font = FontDescriptor::for_label(label, (label.font_size * factor).max(0.0));
        let padding = if label.background.is_some() {
            LABEL_BACKGROUND_PADDING * factor
        } else {
            0.0
        };
        let metrics = self.painter.measure(&font, &label.text);
        log::debug!(
            "Label font \"{}\": ascent {:.1}, descent {:.1}, width {:.1}",
            font,
            metrics.ascent,
            metrics.descent,
            metrics.width
        );
        LabelLayout {
            font,
            margin: (label.margin_top * factor).max(0.0),
            padding,
            ascent: metrics.ascent,
            band_height: metrics.height() + 2.0 * padding,
        }
    }

    /// Put `label` under the encoded code image and re-encode in `format`.
    ///
    /// `background` is the code's background, used to fill the canvas for
    /// formats without alpha.
    pub fn compose(
        &self,
        code_image: &[u8],
        label: &LabelStyle,
        scale: ScaleContext,
        format: ExportFormat,
        background: Color,
    ) -> Result<ComposeOutcome, RenderError> {
        if !label.has_text() {
            return Ok(ComposeOutcome::Unlabeled(code_image.to_vec()));
        }
        if format.is_vector() {
            log::info!("{}", Note::LabelOmittedForVector);
            return Ok(ComposeOutcome::VectorSkipped {
                bytes: code_image.to_vec(),
                note: Note::LabelOmittedForVector,
            });
        }

        let code = decode_raster(code_image)?;
        let canvas = self.draw(&code, label, scale, format, background)?;
        let bytes = encode_raster(&canvas, format, background)?;
        Ok(ComposeOutcome::Composed(ComposedImage {
            bytes,
            width: canvas.width(),
            height: canvas.height(),
            format,
        }))
    }

    /// Build the labeled canvas.
    pub fn draw(
        &self,
        code: &RgbaImage,
        label: &LabelStyle,
        scale: ScaleContext,
        format: ExportFormat,
        background: Color,
    ) -> Result<RgbaImage, RenderError> {
        let layout = self.layout(label, scale);
        if !layout.font.size.is_finite() || layout.font.size > MAX_LABEL_FONT_PX {
            return Err(RenderError::LabelTooLarge {
                size: layout.font.size,
                limit: MAX_LABEL_FONT_PX,
            });
        }

        let (width, code_height) = code.dimensions();
        let band_top = code_height as f32 + layout.margin;
        let height = (band_top as f64 + layout.band_height as f64).ceil();
        if !height.is_finite() || height * width as f64 > MAX_CANVAS_PIXELS as f64 {
            return Err(RenderError::CanvasTooLarge {
                width,
                height: height.min(u64::MAX as f64) as u64,
                limit: MAX_CANVAS_PIXELS,
            });
        }
        let height = height as u32;

        let mut canvas = RgbaImage::new(width, height);
        if !format.supports_alpha() {
            clear(&mut canvas, background);
        }
        image::imageops::overlay(&mut canvas, code, 0, 0);

        if let Some(band) = label.background {
            fill_rect(&mut canvas, 0.0, band_top, width as f32, layout.band_height, band);
        }

        let baseline = band_top + layout.padding + layout.ascent;
        self.painter.draw_text(
            &mut canvas,
            &layout.font,
            &label.text,
            width as f32 / 2.0,
            baseline,
            label.color,
        );
        Ok(canvas)
    }
}

/// Add `label` under `code_image`; see [`LabelCompositor::compose`].
pub fn compose_labeled_image(
    painter: &dyn TextPainter,
    code_image: &[u8],
    label: &LabelStyle,
    scale: ScaleContext,
    format: ExportFormat,
    background: Color,
) -> Result<ComposeOutcome, RenderError> {
    LabelCompositor::new(painter).compose(code_image, label, scale, format, background)
}

/// Render `payload` as a `size`×`size` code and add the label.
///
/// Label sizes are scaled from the style's preview size to `size`.
pub fn render_labeled(
    renderer: &dyn CodeMatrixRenderer,
    painter: &dyn TextPainter,
    style: &StyleConfig,
    label: &LabelStyle,
    payload: &str,
    size: u32,
    format: ExportFormat,
) -> Result<ComposeOutcome, RenderError> {
    let code = renderer.render(style, payload, size, size, format)?;
    if code.is_empty() {
        return Err(RenderError::Empty);
    }
    let scale = ScaleContext::new(size, style.preview_size());
    LabelCompositor::new(painter).compose(&code, label, scale, format, style.background)
}
