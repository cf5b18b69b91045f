//! Styled QR code renderer built on the `qrcode` crate.
//!
//! ## Layout
//!
//! ```text
//! module = floor(min(width, height) - 2 × margin) / count)
//! origin = centered in the canvas
//!
//! ┌──────────── canvas ────────────┐
//! │ margin                         │
//! │   ┌ frame ┐ dots...  ┌ frame ┐ │
//! │   │ ▣     │          │     ▣ │ │
//! │   └───────┘  [logo]  └───────┘ │
//! │   ┌ frame ┐                    │
//! │   │ ▣     │ dots...            │
//! │   └───────┘                    │
//! └────────────────────────────────┘
//! ```
//!
//! The three finder patterns are drawn with the corner-square and corner-dot
//! regions; every other dark module is drawn with the dots region. Modules
//! under the logo are skipped when the logo asks for it.

use base64::Engine;
use image::{RgbaImage, imageops::FilterType};
use qrcode::{EcLevel, QrCode};
use simple_xml_builder::XMLElement;

use super::CodeMatrixRenderer;
use super::encode::encode_raster;
use super::geometry::{
    Figure, Neighbors, Rect, corner_dot_figure, corner_square_figure, dot_figure,
};
use crate::canvas::{blend_pixel, clear};
use crate::error::RenderError;
use crate::style::{Color, ExportFormat, GradientDescriptor, GradientKind, Paint, StyleConfig};

const SUPERSAMPLE: usize = 3;

/// Side of a finder pattern, in modules.
const FINDER: usize = 7;

/// Renders [`StyleConfig`]s as QR codes (error correction level Q).
#[derive(Debug, Clone, Copy, Default)]
pub struct StyledQrRenderer;

impl StyledQrRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render to an RGBA canvas without encoding.
    pub fn render_canvas(
        &self,
        style: &StyleConfig,
        payload: &str,
        width: u32,
        height: u32,
    ) -> Result<RgbaImage, RenderError> {
        let layout = CodeLayout::build(style, payload, width, height)?;
        let mut canvas = RgbaImage::new(width, height);
        clear(&mut canvas, style.background);

        for (figure, paint, bounds) in layout.figures(style) {
            paint_figure(&mut canvas, &figure, &paint, bounds);
        }
        if let Some(logo) = &layout.logo {
            image::imageops::overlay(&mut canvas, &logo.image, logo.x as i64, logo.y as i64);
        }
        Ok(canvas)
    }

    /// Render to an SVG document.
    pub fn render_svg(
        &self,
        style: &StyleConfig,
        payload: &str,
        width: u32,
        height: u32,
    ) -> Result<String, RenderError> {
        let layout = CodeLayout::build(style, payload, width, height)?;

        let mut root = XMLElement::new("svg");
        root.add_attribute("xmlns", "http://www.w3.org/2000/svg");
        root.add_attribute("width", &width.to_string());
        root.add_attribute("height", &height.to_string());
        root.add_attribute("viewBox", &format!("0 0 {} {}", width, height));

        let mut defs = XMLElement::new("defs");
        let mut has_defs = false;

        let mut background = XMLElement::new("rect");
        background.add_attribute("width", &width.to_string());
        background.add_attribute("height", &height.to_string());
        background.add_attribute("fill", &style.background.to_hex());

        // One <path> per (paint, bounds) group: all dots share one, each finder part gets its own
        let mut paths: Vec<XMLElement> = Vec::new();
        let mut current: Option<(Paint, Rect, String, bool)> = None;
        for (figure, paint, bounds) in layout.figures(style) {
            let same_group = current
                .as_ref()
                .is_some_and(|(p, b, _, _)| *p == paint && *b == bounds);
            if !same_group && let Some(group) = current.take() {
                paths.push(path_element(group, paths.len(), &mut defs, &mut has_defs));
            }
            let group = current.get_or_insert_with(|| (paint, bounds, String::new(), false));
            figure.outer.write_path(&mut group.2);
            if let Some(hole) = figure.hole {
                hole.write_path(&mut group.2);
                group.3 = true;
            }
        }
        if let Some(group) = current.take() {
            paths.push(path_element(group, paths.len(), &mut defs, &mut has_defs));
        }

        if has_defs {
            root.add_child(defs);
        }
        root.add_child(background);
        for path in paths {
            root.add_child(path);
        }

        if let Some(logo) = &layout.logo {
            let png = encode_raster(&logo.image, ExportFormat::Png, Color::WHITE)?;
            let data = base64::engine::general_purpose::STANDARD.encode(png);
            let mut image = XMLElement::new("image");
            image.add_attribute("x", &logo.x.to_string());
            image.add_attribute("y", &logo.y.to_string());
            image.add_attribute("width", &logo.image.width().to_string());
            image.add_attribute("height", &logo.image.height().to_string());
            image.add_attribute("href", &format!("data:image/png;base64,{}", data));
            root.add_child(image);
        }

        Ok(root.to_string())
    }
}

impl CodeMatrixRenderer for StyledQrRenderer {
    fn render(
        &self,
        style: &StyleConfig,
        payload: &str,
        width: u32,
        height: u32,
        format: ExportFormat,
    ) -> Result<Vec<u8>, RenderError> {
        let bytes = if format.is_vector() {
            self.render_svg(style, payload, width, height)?.into_bytes()
        } else {
            let canvas = self.render_canvas(style, payload, width, height)?;
            encode_raster(&canvas, format, style.background)?
        };
        if bytes.is_empty() {
            return Err(RenderError::Empty);
        }
        Ok(bytes)
    }
}

/// Build a `<path>` for one paint group, registering a gradient def if needed.
fn path_element(
    (paint, bounds, d, has_holes): (Paint, Rect, String, bool),
    index: usize,
    defs: &mut XMLElement,
    has_defs: &mut bool,
) -> XMLElement {
    let mut path = XMLElement::new("path");
    path.add_attribute("d", &d);
    if has_holes {
        path.add_attribute("fill-rule", "evenodd");
    }
    match paint {
        Paint::Solid { color } => path.add_attribute("fill", &color.to_hex()),
        Paint::Gradient(gradient) => {
            let id = format!("gradient-{}", index);
            defs.add_child(gradient_element(&id, &gradient, bounds));
            *has_defs = true;
            path.add_attribute("fill", &format!("url(#{})", id));
        }
    }
    path
}

fn gradient_element(id: &str, gradient: &GradientDescriptor, bounds: Rect) -> XMLElement {
    let mut element = match gradient.kind {
        GradientKind::Linear => {
            let ((x1, y1), (x2, y2)) = linear_endpoints(gradient, bounds);
            let mut el = XMLElement::new("linearGradient");
            el.add_attribute("x1", &x1.to_string());
            el.add_attribute("y1", &y1.to_string());
            el.add_attribute("x2", &x2.to_string());
            el.add_attribute("y2", &y2.to_string());
            el
        }
        GradientKind::Radial => {
            let (cx, cy) = bounds.center();
            let mut el = XMLElement::new("radialGradient");
            el.add_attribute("cx", &cx.to_string());
            el.add_attribute("cy", &cy.to_string());
            el.add_attribute("r", &radial_radius(bounds).to_string());
            el
        }
    };
    element.add_attribute("id", id);
    element.add_attribute("gradientUnits", "userSpaceOnUse");
    for stop in gradient.stops() {
        let mut el = XMLElement::new("stop");
        el.add_attribute("offset", &stop.offset.to_string());
        el.add_attribute("stop-color", &stop.color.to_hex());
        element.add_child(el);
    }
    element
}

// ============================================================================
// PAINTING
// ============================================================================

/// Start and end points of a linear gradient across `bounds`.
///
/// The gradient axis passes through the center at `rotation` degrees
/// (0 = left to right, 90 = top to bottom) and spans the full projection of
/// the box onto that axis.
fn linear_endpoints(gradient: &GradientDescriptor, bounds: Rect) -> ((f32, f32), (f32, f32)) {
    let theta = gradient.rotation.to_radians();
    let (dx, dy) = (theta.cos(), theta.sin());
    let half = (bounds.w * dx.abs() + bounds.h * dy.abs()) / 2.0;
    let (cx, cy) = bounds.center();
    ((cx - dx * half, cy - dy * half), (cx + dx * half, cy + dy * half))
}

fn radial_radius(bounds: Rect) -> f32 {
    (bounds.w * bounds.w + bounds.h * bounds.h).sqrt() / 2.0
}

/// Gradient position of a pixel, in [0, 1].
fn gradient_position(gradient: &GradientDescriptor, bounds: Rect, x: f32, y: f32) -> f32 {
    match gradient.kind {
        GradientKind::Linear => {
            let ((x1, y1), (x2, y2)) = linear_endpoints(gradient, bounds);
            let (ax, ay) = (x2 - x1, y2 - y1);
            let len_sq = ax * ax + ay * ay;
            if len_sq <= f32::EPSILON {
                return 0.0;
            }
            (((x - x1) * ax + (y - y1) * ay) / len_sq).clamp(0.0, 1.0)
        }
        GradientKind::Radial => {
            let (cx, cy) = bounds.center();
            let r = radial_radius(bounds);
            if r <= f32::EPSILON {
                return 0.0;
            }
            (((x - cx).powi(2) + (y - cy).powi(2)).sqrt() / r).clamp(0.0, 1.0)
        }
    }
}

fn paint_color(paint: &Paint, bounds: Rect, x: f32, y: f32) -> Color {
    match paint {
        Paint::Solid { color } => *color,
        Paint::Gradient(gradient) => gradient.sample(gradient_position(gradient, bounds, x, y)),
    }
}

/// Rasterize a figure with supersampled coverage.
fn paint_figure(canvas: &mut RgbaImage, figure: &Figure, paint: &Paint, bounds: Rect) {
    let b = figure.outer.bounds();
    let x0 = b.x.floor().max(0.0) as i64;
    let y0 = b.y.floor().max(0.0) as i64;
    let x1 = ((b.x + b.w).ceil() as i64).min(canvas.width() as i64);
    let y1 = ((b.y + b.h).ceil() as i64).min(canvas.height() as i64);
    let samples = (SUPERSAMPLE * SUPERSAMPLE) as f32;

    for py in y0..y1 {
        for px in x0..x1 {
            let mut hits = 0;
            for sy in 0..SUPERSAMPLE {
                for sx in 0..SUPERSAMPLE {
                    let fx = px as f32 + (sx as f32 + 0.5) / SUPERSAMPLE as f32;
                    let fy = py as f32 + (sy as f32 + 0.5) / SUPERSAMPLE as f32;
                    if figure.contains(fx, fy) {
                        hits += 1;
                    }
                }
            }
            if hits > 0 {
                let color = paint_color(paint, bounds, px as f32 + 0.5, py as f32 + 0.5);
                blend_pixel(canvas, px, py, color, hits as f32 / samples);
            }
        }
    }
}

// ============================================================================
// LAYOUT
// ============================================================================

struct PlacedLogo {
    image: RgbaImage,
    x: u32,
    y: u32,
}

/// Module grid placed on a canvas.
struct CodeLayout {
    count: usize,
    module: f32,
    origin_x: f32,
    origin_y: f32,
    dark: Vec<bool>,
    hidden: Vec<bool>,
    logo: Option<PlacedLogo>,
}

impl CodeLayout {
    fn build(
        style: &StyleConfig,
        payload: &str,
        width: u32,
        height: u32,
    ) -> Result<Self, RenderError> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::Q)
            .map_err(|e| RenderError::Payload(e.to_string()))?;
        let count = code.width();
        let dark: Vec<bool> = code
            .to_colors()
            .into_iter()
            .map(|c| c == qrcode::Color::Dark)
            .collect();

        let available = width.min(height).saturating_sub(2 * style.margin);
        let module = available / count as u32;
        if module == 0 {
            return Err(RenderError::Payload(format!(
                "{}x{} px with margin {} is too small for a {}x{} module code",
                width, height, style.margin, count, count
            )));
        }
        let size = module * count as u32;

        let mut layout = Self {
            count,
            module: module as f32,
            origin_x: ((width - size) / 2) as f32,
            origin_y: ((height - size) / 2) as f32,
            dark,
            hidden: vec![false; count * count],
            logo: None,
        };

        if let Some(logo) = &style.logo
            && logo.size > 0.0
        {
            let source = image::load_from_memory(logo.bytes())
                .map_err(|e| RenderError::Logo(e.to_string()))?
                .to_rgba8();
            // Logo clear space is specified at preview resolution
            let scale = width as f32 / style.width.max(1) as f32;
            layout.place_logo(&source, logo.size, logo.margin as f32 * scale, logo.hide_background_dots);
        }

        Ok(layout)
    }

    fn place_logo(&mut self, source: &RgbaImage, size: f32, margin: f32, hide_dots: bool) {
        let max_side = size.clamp(0.0, 1.0) * self.count as f32 * self.module;
        let longest = source.width().max(source.height()).max(1) as f32;
        let fit = max_side / longest;
        let w = (source.width() as f32 * fit).round().max(1.0) as u32;
        let h = (source.height() as f32 * fit).round().max(1.0) as u32;

        let code_size = self.count as f32 * self.module;
        let x = self.origin_x + (code_size - w as f32) / 2.0;
        let y = self.origin_y + (code_size - h as f32) / 2.0;

        if hide_dots {
            let first_col = ((x - margin - self.origin_x) / self.module).floor().max(0.0) as usize;
            let last_col = ((x + w as f32 + margin - self.origin_x) / self.module).ceil() as usize;
            let first_row = ((y - margin - self.origin_y) / self.module).floor().max(0.0) as usize;
            let last_row = ((y + h as f32 + margin - self.origin_y) / self.module).ceil() as usize;
            for row in first_row..last_row.min(self.count) {
                for col in first_col..last_col.min(self.count) {
                    self.hidden[row * self.count + col] = true;
                }
            }
        }

        self.logo = Some(PlacedLogo {
            image: image::imageops::resize(source, w, h, FilterType::Lanczos3),
            x: x.round().max(0.0) as u32,
            y: y.round().max(0.0) as u32,
        });
    }

    fn in_finder(&self, row: usize, col: usize) -> bool {
        let far = self.count - FINDER;
        (row < FINDER && col < FINDER) || (row < FINDER && col >= far) || (row >= far && col < FINDER)
    }

    /// Whether the module is drawn with the dots region.
    fn is_dot(&self, row: i64, col: i64) -> bool {
        if row < 0 || col < 0 || row >= self.count as i64 || col >= self.count as i64 {
            return false;
        }
        let (row, col) = (row as usize, col as usize);
        let idx = row * self.count + col;
        self.dark[idx] && !self.hidden[idx] && !self.in_finder(row, col)
    }

    /// Every figure to draw, with its paint and the gradient bounds.
    fn figures(&self, style: &StyleConfig) -> Vec<(Figure, Paint, Rect)> {
        let s = self.module;
        let code_bounds = Rect {
            x: self.origin_x,
            y: self.origin_y,
            w: self.count as f32 * s,
            h: self.count as f32 * s,
        };
        let mut out = Vec::new();

        for row in 0..self.count as i64 {
            for col in 0..self.count as i64 {
                if !self.is_dot(row, col) {
                    continue;
                }
                let neighbors = Neighbors {
                    top: self.is_dot(row - 1, col),
                    right: self.is_dot(row, col + 1),
                    bottom: self.is_dot(row + 1, col),
                    left: self.is_dot(row, col - 1),
                };
                let x = self.origin_x + col as f32 * s;
                let y = self.origin_y + row as f32 * s;
                out.push((
                    dot_figure(style.dots.shape, x, y, s, neighbors),
                    style.dots.paint,
                    code_bounds,
                ));
            }
        }

        let far = (self.count - FINDER) as f32 * s;
        for (fx, fy) in [(0.0, 0.0), (far, 0.0), (0.0, far)] {
            let x = self.origin_x + fx;
            let y = self.origin_y + fy;
            let bounds = Rect {
                x,
                y,
                w: FINDER as f32 * s,
                h: FINDER as f32 * s,
            };
            out.push((
                corner_square_figure(style.corner_square.shape, x, y, s),
                style.corner_square.paint,
                bounds,
            ));
            out.push((
                corner_dot_figure(style.corner_dot.shape, x, y, s),
                style.corner_dot.paint,
                bounds,
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::encode::decode_raster;
    use crate::style::{CornerSquareShape, DotShape, Logo};
    use std::io::Cursor;

    #[test]
    fn test_renders_requested_size() {
        let canvas = StyledQrRenderer
            .render_canvas(&StyleConfig::default(), "https://example.com", 300, 300)
            .unwrap();
        assert_eq!(canvas.dimensions(), (300, 300));
    }

    #[test]
    fn test_finder_corner_is_foreground() {
        let style = StyleConfig::default();
        let layout = CodeLayout::build(&style, "hello", 300, 300).unwrap();
        let canvas = StyledQrRenderer.render_canvas(&style, "hello", 300, 300).unwrap();
        // Top-left pixel of the first finder frame
        let p = canvas.get_pixel(layout.origin_x as u32 + 1, layout.origin_y as u32 + 1);
        assert_eq!(p, &image::Rgba([0, 0, 0, 255]));
        // Margin stays background
        assert_eq!(canvas.get_pixel(2, 2), &image::Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_too_small_canvas_is_payload_error() {
        let result = StyledQrRenderer.render_canvas(&StyleConfig::default(), "hello", 20, 20);
        assert!(matches!(result, Err(RenderError::Payload(_))));
    }

    #[test]
    fn test_oversized_payload_fails() {
        let payload = "x".repeat(5000);
        let result = StyledQrRenderer.render(
            &StyleConfig::default(),
            &payload,
            300,
            300,
            ExportFormat::Png,
        );
        assert!(matches!(result, Err(RenderError::Payload(_))));
    }

    #[test]
    fn test_png_output_decodes() {
        let bytes = StyledQrRenderer
            .render(&StyleConfig::default(), "abc", 200, 200, ExportFormat::Png)
            .unwrap();
        let img = decode_raster(&bytes).unwrap();
        assert_eq!(img.dimensions(), (200, 200));
    }

    #[test]
    fn test_gradient_varies_across_code() {
        let mut style = StyleConfig::default();
        style.dots.shape = DotShape::Square;
        style.set_foreground(Paint::Gradient(GradientDescriptor::new(
            GradientKind::Linear,
            0.0,
            Color::rgb(255, 0, 0),
            Color::rgb(0, 0, 255),
        )));
        let layout = CodeLayout::build(&style, "gradient", 400, 400).unwrap();
        let canvas = StyledQrRenderer.render_canvas(&style, "gradient", 400, 400).unwrap();

        let s = layout.module as u32;
        let left = canvas.get_pixel(layout.origin_x as u32 + s / 2, layout.origin_y as u32 + s / 2);
        let far = layout.origin_x as u32 + (layout.count as u32 - 1) * s + s / 2;
        let right = canvas.get_pixel(far, layout.origin_y as u32 + s / 2);
        assert!(left[0] > left[2], "left should be red-ish: {:?}", left);
        assert!(right[2] > right[0], "right should be blue-ish: {:?}", right);
    }

    #[test]
    fn test_logo_hides_modules() {
        let mut logo_png = Cursor::new(Vec::new());
        RgbaImage::from_pixel(10, 10, image::Rgba([255, 0, 0, 255]))
            .write_to(&mut logo_png, image::ImageFormat::Png)
            .unwrap();
        let mut style = StyleConfig::default();
        style.logo = Some(Logo::from_bytes(logo_png.into_inner()).unwrap());

        let layout = CodeLayout::build(&style, "logo test", 300, 300).unwrap();
        assert!(layout.hidden.iter().any(|&h| h));
        let center = layout.count / 2;
        assert!(!layout.is_dot(center as i64, center as i64));

        let canvas = StyledQrRenderer.render_canvas(&style, "logo test", 300, 300).unwrap();
        assert_eq!(canvas.get_pixel(150, 150), &image::Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_svg_output() {
        let mut style = StyleConfig::default();
        style.corner_square.shape = CornerSquareShape::Dot;
        style.set_foreground(Paint::Gradient(GradientDescriptor::new(
            GradientKind::Radial,
            0.0,
            Color::BLACK,
            Color::rgb(0, 0, 255),
        )));
        let svg = StyledQrRenderer.render_svg(&style, "svg", 300, 300).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("radialGradient"));
        assert!(svg.contains("evenodd"));
        assert!(svg.contains("url(#gradient-0)"));
    }
}
