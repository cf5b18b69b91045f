//! Output formats for rendered codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output image format.
///
/// | Format | Kind | Alpha |
/// |--------|------|-------|
/// | `Png`  | raster, lossless | yes |
/// | `Jpeg` | raster, lossy | no |
/// | `Webp` | raster, lossless | yes |
/// | `Svg`  | vector | yes |
///
/// WebP goes through the `image` crate's encoder, which only writes lossless
/// WebP. Files are larger than a lossy encoder would produce but keep exact
/// module edges and alpha.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
    Svg,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Png,
        ExportFormat::Jpeg,
        ExportFormat::Webp,
        ExportFormat::Svg,
    ];

    pub fn supports_alpha(self) -> bool {
        !matches!(self, ExportFormat::Jpeg)
    }

    pub fn is_vector(self) -> bool {
        matches!(self, ExportFormat::Svg)
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpeg",
            ExportFormat::Webp => "webp",
            ExportFormat::Svg => "svg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
            ExportFormat::Webp => "image/webp",
            ExportFormat::Svg => "image/svg+xml",
        }
    }

    /// Raster codec for `image`, `None` for vector output.
    pub fn image_format(self) -> Option<image::ImageFormat> {
        match self {
            ExportFormat::Png => Some(image::ImageFormat::Png),
            ExportFormat::Jpeg => Some(image::ImageFormat::Jpeg),
            ExportFormat::Webp => Some(image::ImageFormat::WebP),
            ExportFormat::Svg => None,
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpeg" | "jpg" => Ok(ExportFormat::Jpeg),
            "webp" => Ok(ExportFormat::Webp),
            "svg" => Ok(ExportFormat::Svg),
            other => Err(format!(
                "Unknown format '{}' (expected png, jpeg, webp or svg)",
                other
            )),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alpha_support() {
        assert!(ExportFormat::Png.supports_alpha());
        assert!(ExportFormat::Webp.supports_alpha());
        assert!(!ExportFormat::Jpeg.supports_alpha());
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("JPG".parse::<ExportFormat>(), Ok(ExportFormat::Jpeg));
        assert_eq!("svg".parse::<ExportFormat>(), Ok(ExportFormat::Svg));
        assert!("gif".parse::<ExportFormat>().is_err());
    }
}
