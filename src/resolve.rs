//! # Per-item Style Overrides
//!
//! A batch row may restyle its own code. [`ItemOverrideRecord`] holds the raw
//! column values of one row and [`resolve`] merges them into the batch's base
//! style and label.
//!
//! ## Precedence
//!
//! A field that is present and non-blank replaces the base field, anything
//! else inherits. The foreground follows a three-step cascade:
//!
//! | Row provides                   | Body paint        | Frame / eye paint                    |
//! |--------------------------------|-------------------|--------------------------------------|
//! | `gradientStart` + `gradientEnd`| row gradient      | row gradient                         |
//! | `fgColor`                      | solid `fgColor`   | `eyeFrameColor` / `eyeBallColor`, else `fgColor` |
//! | neither                        | base paint        | base paint                           |
//!
//! Values that fail to parse fall back to the base value and log a warning.
//! Resolution never fails.

use std::collections::HashMap;
use std::str::FromStr;

use crate::style::{
    Color, CornerDotShape, CornerSquareShape, DotShape, FontWeight, GradientDescriptor,
    GradientKind, LabelStyle, Paint, ShapeName, StyleConfig,
};

/// Column holding the encoded payload. Required in every batch input.
pub const DATA_FIELD: &str = "data";

/// Raw override values for one item, keyed by column name.
///
/// Only recognized columns are kept and blank values are dropped, so a
/// present field is always meaningful.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemOverrideRecord {
    fields: HashMap<String, String>,
}

impl ItemOverrideRecord {
    /// Every column name the resolver understands.
    pub const FIELDS: &'static [&'static str] = &[
        DATA_FIELD,
        "label",
        "dotType",
        "eyeFrameType",
        "eyeBallType",
        "bgColor",
        "fgColor",
        "eyeFrameColor",
        "eyeBallColor",
        "gradientStart",
        "gradientEnd",
        "gradientType",
        "gradientRotation",
        "labelColor",
        "labelMargin",
        "labelSize",
        "labelFont",
        "labelWeight",
        "labelItalic",
        "labelBgColor",
    ];

    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut record = Self::new();
        for (key, value) in fields {
            record.set(key.as_ref(), value);
        }
        record
    }

    /// Set a field. Unknown names and blank values are ignored.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if value.trim().is_empty() || !Self::FIELDS.contains(&name) {
            return;
        }
        self.fields.insert(name.to_string(), value);
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// The payload to encode, if the row has one.
    pub fn data(&self) -> Option<&str> {
        self.get(DATA_FIELD)
    }

    /// The row's label text, empty when absent.
    pub fn label(&self) -> &str {
        self.get("label").unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parse a field, warning and returning `None` when the value is invalid.
    fn parsed<T>(&self, name: &str) -> Option<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.get(name)?;
        match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Ignoring {} = {:?}: {}", name, raw, e);
                None
            }
        }
    }

    fn shape<S: ShapeName>(&self, name: &str) -> Option<S> {
        let raw = self.get(name)?;
        let shape = S::from_name(raw.trim());
        if shape.is_none() {
            log::warn!(
                "Ignoring {} = {:?}: expected one of {}",
                name,
                raw,
                S::ALL.iter().map(|s| s.name()).collect::<Vec<_>>().join(", ")
            );
        }
        shape
    }

    /// Positive integer, or `None` for anything that is not (zero and negatives included).
    fn positive_int(&self, name: &str) -> Option<f32> {
        let raw = self.get(name)?;
        match leading_int(raw) {
            Some(n) if n > 0 => Some(n as f32),
            _ => {
                log::warn!("Ignoring {} = {:?}: not a positive integer", name, raw);
                None
            }
        }
    }
}

/// Integer prefix of a string: `"24px"` → 24, `"abc"` → None.
fn leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| n * sign)
}

/// Effective style and label for one item.
pub fn resolve(
    base: &StyleConfig,
    base_label: &LabelStyle,
    record: &ItemOverrideRecord,
) -> (StyleConfig, LabelStyle) {
    (
        resolve_effective_style(base, record),
        resolve_label(base_label, record),
    )
}

/// Effective style for one item. Label fields are not consulted.
pub fn resolve_effective_style(base: &StyleConfig, record: &ItemOverrideRecord) -> StyleConfig {
    let mut style = base.clone();

    if let Some(shape) = record.shape::<DotShape>("dotType") {
        style.dots.shape = shape;
    }
    if let Some(shape) = record.shape::<CornerSquareShape>("eyeFrameType") {
        style.corner_square.shape = shape;
    }
    if let Some(shape) = record.shape::<CornerDotShape>("eyeBallType") {
        style.corner_dot.shape = shape;
    }
    if let Some(color) = record.parsed::<Color>("bgColor") {
        style.background = color;
    }

    let gradient_ends = (
        record.parsed::<Color>("gradientStart"),
        record.parsed::<Color>("gradientEnd"),
    );
    if let (Some(start), Some(end)) = gradient_ends {
        let kind = record
            .parsed::<GradientKind>("gradientType")
            .unwrap_or_default();
        let rotation = record
            .get("gradientRotation")
            .and_then(leading_int)
            .unwrap_or(0) as f32;
        style.set_foreground(Paint::Gradient(GradientDescriptor::new(
            kind, rotation, start, end,
        )));
    } else if let Some(fg) = record.parsed::<Color>("fgColor") {
        style.dots.paint = Paint::solid(fg);
        style.corner_square.paint =
            Paint::solid(record.parsed("eyeFrameColor").unwrap_or(fg));
        style.corner_dot.paint = Paint::solid(record.parsed("eyeBallColor").unwrap_or(fg));
    }

    style
}

/// Effective label for one item. The text always comes from the row.
pub fn resolve_label(base: &LabelStyle, record: &ItemOverrideRecord) -> LabelStyle {
    let mut label = base.clone();
    label.text = record.label().to_string();

    if let Some(color) = record.parsed::<Color>("labelColor") {
        label.color = color;
    }
    if let Some(margin) = record.positive_int("labelMargin") {
        label.margin_top = margin;
    }
    if let Some(size) = record.positive_int("labelSize") {
        label.font_size = size;
    }
    if let Some(family) = record.get("labelFont") {
        label.font_family = family.trim().to_string();
    }
    if let Some(weight) = record.parsed::<FontWeight>("labelWeight") {
        label.weight = weight;
    }
    if let Some(italic) = record.get("labelItalic") {
        label.italic = italic.trim().eq_ignore_ascii_case("true");
    }
    if let Some(color) = record.parsed::<Color>("labelBgColor") {
        label.background = Some(color);
    }

    label
}
