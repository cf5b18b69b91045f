//! # Style Model
//!
//! Value types describing how a code looks: module shapes, paints, margin,
//! background, logo and the optional text label underneath.
//!
//! ## Paints
//!
//! Each paintable region (body, corner frame, corner dot) carries exactly one
//! [`Paint`]: a solid color or a two-stop gradient. Replacing the paint
//! replaces the mode, so a region can never be solid and gradient at once.
//!
//! ```
//! use qrforge::style::{Color, GradientDescriptor, GradientKind, Paint, StyleConfig};
//!
//! let mut style = StyleConfig::default();
//! style.set_foreground(Paint::Gradient(GradientDescriptor::new(
//!     GradientKind::Linear,
//!     45.0,
//!     Color::BLACK,
//!     Color::rgb(0, 0, 255),
//! )));
//! assert!(matches!(style.corner_dot.paint, Paint::Gradient(_)));
//! ```

mod color;
mod format;
mod logo;
mod preset;
mod shape;

pub use color::{Color, ColorParseError};
pub use format::ExportFormat;
pub use logo::{Logo, LogoSlot, MAX_LOGO_BYTES};
pub use preset::{LogoSpec, StylePreset};
pub use shape::{CornerDotShape, CornerSquareShape, DotShape, ShapeName, names};

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Resolution the label font size and margins are specified at.
pub const DEFAULT_PREVIEW_SIZE: u32 = 300;

/// Default export resolution.
pub const DEFAULT_EXPORT_SIZE: u32 = 1000;

// ============================================================================
// PAINT
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientKind {
    #[default]
    Linear,
    Radial,
}

impl FromStr for GradientKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(GradientKind::Linear),
            "radial" => Ok(GradientKind::Radial),
            other => Err(format!("Unknown gradient type '{}'", other)),
        }
    }
}

/// One gradient stop. Offsets are fixed at 0 (start) and 1 (end).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub offset: f32,
    pub color: Color,
}

/// Two-stop gradient.
///
/// Only the endpoint colors are stored, so the stops are always exactly two
/// and always ordered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientDescriptor {
    #[serde(default)]
    pub kind: GradientKind,
    /// Rotation in degrees, in [0, 360).
    #[serde(default, deserialize_with = "deserialize_rotation")]
    pub rotation: f32,
    pub start: Color,
    pub end: Color,
}

impl GradientDescriptor {
    pub fn new(kind: GradientKind, rotation: f32, start: Color, end: Color) -> Self {
        Self {
            kind,
            rotation: normalize_degrees(rotation),
            start,
            end,
        }
    }

    pub fn stops(&self) -> [ColorStop; 2] {
        [
            ColorStop {
                offset: 0.0,
                color: self.start,
            },
            ColorStop {
                offset: 1.0,
                color: self.end,
            },
        ]
    }

    /// Color at position `t` along the gradient (0 = start, 1 = end).
    pub fn sample(&self, t: f32) -> Color {
        self.start.lerp(self.end, t)
    }
}

/// Fold any angle into [0, 360).
pub fn normalize_degrees(degrees: f32) -> f32 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let folded = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if folded >= 360.0 { 0.0 } else { folded }
}

fn deserialize_rotation<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(normalize_degrees(f32::deserialize(deserializer)?))
}

/// Fill of one paintable region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Paint {
    Solid { color: Color },
    Gradient(GradientDescriptor),
}

impl Paint {
    pub const fn solid(color: Color) -> Self {
        Paint::Solid { color }
    }

    pub fn is_gradient(&self) -> bool {
        matches!(self, Paint::Gradient(_))
    }
}

impl Default for Paint {
    fn default() -> Self {
        Paint::solid(Color::BLACK)
    }
}

/// A paintable region: its shape and its paint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Region<S> {
    #[serde(default)]
    pub shape: S,
    #[serde(default)]
    pub paint: Paint,
}

// ============================================================================
// STYLE CONFIG
// ============================================================================

/// Full visual description of one code (everything except the label).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Preview width in pixels; exports are rendered at their own size.
    pub width: u32,
    /// Preview height in pixels.
    pub height: u32,
    /// Quiet zone around the code, in pixels.
    pub margin: u32,
    pub dots: Region<DotShape>,
    pub corner_square: Region<CornerSquareShape>,
    pub corner_dot: Region<CornerDotShape>,
    pub background: Color,
    #[serde(skip)]
    pub logo: Option<Logo>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_PREVIEW_SIZE,
            height: DEFAULT_PREVIEW_SIZE,
            margin: 10,
            dots: Region::default(),
            corner_square: Region::default(),
            corner_dot: Region::default(),
            background: Color::WHITE,
            logo: None,
        }
    }
}

impl StyleConfig {
    /// Apply one paint to body, corner frames and corner dots.
    pub fn set_foreground(&mut self, paint: Paint) {
        self.dots.paint = paint;
        self.corner_square.paint = paint;
        self.corner_dot.paint = paint;
    }

    /// The smaller preview dimension, which label sizes are relative to.
    pub fn preview_size(&self) -> u32 {
        self.width.min(self.height)
    }
}

// ============================================================================
// LABEL
// ============================================================================

/// Label font weight. Exactly three levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontWeight {
    Normal,
    #[default]
    Bold,
    ExtraBold,
}

impl FontWeight {
    /// Next weight in the toggle order: normal → bold → extra-bold → normal.
    pub fn cycle(self) -> Self {
        match self {
            FontWeight::Normal => FontWeight::Bold,
            FontWeight::Bold => FontWeight::ExtraBold,
            FontWeight::ExtraBold => FontWeight::Normal,
        }
    }

    /// CSS numeric weight.
    pub fn numeric(self) -> u16 {
        match self {
            FontWeight::Normal => 400,
            FontWeight::Bold => 700,
            FontWeight::ExtraBold => 900,
        }
    }
}

impl FromStr for FontWeight {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" | "regular" | "400" => Ok(FontWeight::Normal),
            "bold" | "700" => Ok(FontWeight::Bold),
            "extra-bold" | "extrabold" | "black" | "900" => Ok(FontWeight::ExtraBold),
            other => Err(format!("Unknown font weight '{}'", other)),
        }
    }
}

impl fmt::Display for FontWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.numeric())
    }
}

/// Text caption drawn under the code.
///
/// Sizes are in pixels at the preview resolution and get scaled on export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelStyle {
    pub text: String,
    pub color: Color,
    pub font_family: String,
    pub font_size: f32,
    pub weight: FontWeight,
    pub italic: bool,
    /// Gap between the code and the label band.
    pub margin_top: f32,
    /// Band fill behind the text; adds vertical padding when set.
    pub background: Option<Color>,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            text: String::new(),
            color: Color::BLACK,
            font_family: "Lexend".to_string(),
            font_size: 16.0,
            weight: FontWeight::Bold,
            italic: false,
            margin_top: 10.0,
            background: None,
        }
    }
}

impl LabelStyle {
    /// Whether there is anything to draw.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_weight_cycle_order() {
        let w = FontWeight::Normal;
        assert_eq!(w.cycle(), FontWeight::Bold);
        assert_eq!(w.cycle().cycle(), FontWeight::ExtraBold);
        assert_eq!(w.cycle().cycle().cycle(), FontWeight::Normal);
    }

    #[test]
    fn test_weight_parse_numeric_and_names() {
        assert_eq!("700".parse::<FontWeight>(), Ok(FontWeight::Bold));
        assert_eq!("extra-bold".parse::<FontWeight>(), Ok(FontWeight::ExtraBold));
        assert_eq!("Normal".parse::<FontWeight>(), Ok(FontWeight::Normal));
        assert!("600".parse::<FontWeight>().is_err());
    }

    #[test]
    fn test_rotation_is_normalized() {
        let g = GradientDescriptor::new(GradientKind::Linear, -90.0, Color::BLACK, Color::WHITE);
        assert_eq!(g.rotation, 270.0);
        let g = GradientDescriptor::new(GradientKind::Radial, 720.0, Color::BLACK, Color::WHITE);
        assert_eq!(g.rotation, 0.0);
        assert_eq!(normalize_degrees(f32::NAN), 0.0);
    }

    #[test]
    fn test_gradient_stops_ordered() {
        let g = GradientDescriptor::new(GradientKind::Linear, 0.0, Color::BLACK, Color::WHITE);
        let [a, b] = g.stops();
        assert_eq!(a.offset, 0.0);
        assert_eq!(b.offset, 1.0);
        assert_eq!(a.color, Color::BLACK);
        assert_eq!(b.color, Color::WHITE);
    }

    #[test]
    fn test_set_foreground_replaces_mode_everywhere() {
        let mut style = StyleConfig::default();
        style.set_foreground(Paint::Gradient(GradientDescriptor::new(
            GradientKind::Linear,
            0.0,
            Color::BLACK,
            Color::WHITE,
        )));
        style.set_foreground(Paint::solid(Color::rgb(255, 0, 0)));
        assert_eq!(style.dots.paint, Paint::solid(Color::rgb(255, 0, 0)));
        assert!(!style.corner_square.paint.is_gradient());
        assert!(!style.corner_dot.paint.is_gradient());
    }

    #[test]
    fn test_style_json_defaults() {
        let style: StyleConfig = serde_json::from_str(
            r##"{"dots": {"shape": "classy", "paint": {"type": "solid", "color": "#112233"}}}"##,
        )
        .unwrap();
        assert_eq!(style.dots.shape, DotShape::Classy);
        assert_eq!(style.dots.paint, Paint::solid(Color::rgb(0x11, 0x22, 0x33)));
        assert_eq!(style.width, DEFAULT_PREVIEW_SIZE);
        assert_eq!(style.background, Color::WHITE);
    }

    #[test]
    fn test_gradient_json_rotation_normalized() {
        let paint: Paint = serde_json::from_str(
            r##"{"type": "gradient", "kind": "radial", "rotation": 450, "start": "#000", "end": "#fff"}"##,
        )
        .unwrap();
        match paint {
            Paint::Gradient(g) => {
                assert_eq!(g.kind, GradientKind::Radial);
                assert_eq!(g.rotation, 90.0);
            }
            other => panic!("expected gradient, got {:?}", other),
        }
    }

    #[test]
    fn test_label_has_text() {
        let mut label = LabelStyle::default();
        assert!(!label.has_text());
        label.text = "   ".into();
        assert!(!label.has_text());
        label.text = " hi ".into();
        assert!(label.has_text());
    }
}
