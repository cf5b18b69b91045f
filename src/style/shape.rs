//! Module shapes for the three paintable regions of a code.

use serde::{Deserialize, Serialize};

/// A closed set of shapes with stable kebab-case names.
///
/// Names match the values accepted in presets and CSV columns
/// (`dotType`, `eyeFrameType`, `eyeBallType`).
pub trait ShapeName: Copy + Sized + 'static {
    const ALL: &'static [Self];

    fn name(self) -> &'static str;

    /// Case-insensitive lookup by name.
    fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|shape| shape.name().eq_ignore_ascii_case(name))
    }
}

/// Shape of the data modules (the code body).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DotShape {
    #[default]
    Square,
    Dots,
    Rounded,
    ExtraRounded,
    Classy,
    ClassyRounded,
}

impl ShapeName for DotShape {
    const ALL: &'static [Self] = &[
        DotShape::Square,
        DotShape::Dots,
        DotShape::Rounded,
        DotShape::ExtraRounded,
        DotShape::Classy,
        DotShape::ClassyRounded,
    ];

    fn name(self) -> &'static str {
        match self {
            DotShape::Square => "square",
            DotShape::Dots => "dots",
            DotShape::Rounded => "rounded",
            DotShape::ExtraRounded => "extra-rounded",
            DotShape::Classy => "classy",
            DotShape::ClassyRounded => "classy-rounded",
        }
    }
}

/// Shape of the 7×7 finder frame in three corners.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CornerSquareShape {
    #[default]
    Square,
    Dot,
    ExtraRounded,
}

impl ShapeName for CornerSquareShape {
    const ALL: &'static [Self] = &[
        CornerSquareShape::Square,
        CornerSquareShape::Dot,
        CornerSquareShape::ExtraRounded,
    ];

    fn name(self) -> &'static str {
        match self {
            CornerSquareShape::Square => "square",
            CornerSquareShape::Dot => "dot",
            CornerSquareShape::ExtraRounded => "extra-rounded",
        }
    }
}

/// Shape of the 3×3 dot inside each finder frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CornerDotShape {
    #[default]
    Square,
    Dot,
}

impl ShapeName for CornerDotShape {
    const ALL: &'static [Self] = &[CornerDotShape::Square, CornerDotShape::Dot];

    fn name(self) -> &'static str {
        match self {
            CornerDotShape::Square => "square",
            CornerDotShape::Dot => "dot",
        }
    }
}

/// Names of every variant, for option listings.
pub fn names<S: ShapeName>() -> Vec<&'static str> {
    S::ALL.iter().map(|s| s.name()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_is_case_insensitive() {
        assert_eq!(
            DotShape::from_name("Extra-Rounded"),
            Some(DotShape::ExtraRounded)
        );
        assert_eq!(CornerDotShape::from_name(" dot "), Some(CornerDotShape::Dot));
        assert_eq!(CornerSquareShape::from_name("triangle"), None);
    }

    #[test]
    fn test_serde_names_match_shape_names() {
        for shape in DotShape::ALL {
            let json = serde_json::to_string(shape).unwrap();
            assert_eq!(json, format!("\"{}\"", shape.name()));
        }
    }

    #[test]
    fn test_names_listing() {
        assert_eq!(names::<CornerSquareShape>(), vec!["square", "dot", "extra-rounded"]);
    }
}
