//! JSON style presets.
//!
//! A preset bundles everything a single render or a batch needs:
//!
//! ```json
//! {
//!   "style": { "margin": 12, "dots": { "shape": "rounded" } },
//!   "label": { "text": "Scan me", "font_size": 18 },
//!   "export_size": 1200,
//!   "format": "png",
//!   "logo": { "path": "logo.png", "size": 0.3 }
//! }
//! ```
//!
//! Every field is optional and falls back to the defaults of the style model.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{DEFAULT_EXPORT_SIZE, ExportFormat, LabelStyle, Logo, StyleConfig};
use crate::error::ForgeError;

/// Logo reference inside a preset file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogoSpec {
    /// Image path, relative paths resolve against the preset file's directory.
    pub path: PathBuf,
    #[serde(default = "default_logo_size")]
    pub size: f32,
}

fn default_logo_size() -> f32 {
    Logo::DEFAULT_SIZE
}

/// Base configuration for single renders and batches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StylePreset {
    pub style: StyleConfig,
    pub label: LabelStyle,
    /// Output edge length in pixels.
    pub export_size: u32,
    pub format: ExportFormat,
    pub logo: Option<LogoSpec>,
}

impl Default for StylePreset {
    fn default() -> Self {
        Self {
            style: StyleConfig::default(),
            label: LabelStyle::default(),
            export_size: DEFAULT_EXPORT_SIZE,
            format: ExportFormat::default(),
            logo: None,
        }
    }
}

impl StylePreset {
    /// Parse a preset without touching the filesystem (logo paths are not loaded).
    pub fn from_json(json: &str) -> Result<Self, ForgeError> {
        let preset: StylePreset = serde_json::from_str(json)
            .map_err(|e| ForgeError::Style(format!("Invalid preset: {}", e)))?;
        if preset.export_size == 0 {
            return Err(ForgeError::Style("export_size must be positive".to_string()));
        }
        Ok(preset)
    }

    /// Read a preset file and load its logo, if any.
    pub fn load(path: &Path) -> Result<Self, ForgeError> {
        let json = std::fs::read_to_string(path)?;
        let mut preset = Self::from_json(&json)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        preset.attach_logo(base_dir)?;
        Ok(preset)
    }

    /// Load the logo named by `self.logo` into `self.style.logo`.
    pub fn attach_logo(&mut self, base_dir: &Path) -> Result<(), ForgeError> {
        let Some(spec) = &self.logo else {
            return Ok(());
        };
        let path = if spec.path.is_absolute() {
            spec.path.clone()
        } else {
            base_dir.join(&spec.path)
        };
        let bytes = std::fs::read(&path)?;
        let logo = Logo::from_bytes(bytes)?.with_size(spec.size);
        log::debug!("Loaded logo {} ({} bytes)", path.display(), logo.bytes().len());
        self.style.logo = Some(logo);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{DotShape, FontWeight};

    #[test]
    fn test_empty_preset_uses_defaults() {
        let preset = StylePreset::from_json("{}").unwrap();
        assert_eq!(preset, StylePreset::default());
        assert_eq!(preset.export_size, 1000);
        assert_eq!(preset.label.font_family, "Lexend");
        assert_eq!(preset.label.weight, FontWeight::Bold);
    }

    #[test]
    fn test_partial_preset() {
        let preset = StylePreset::from_json(
            r#"{"style": {"dots": {"shape": "dots"}}, "label": {"text": "Hi", "italic": true}, "format": "jpeg"}"#,
        )
        .unwrap();
        assert_eq!(preset.style.dots.shape, DotShape::Dots);
        assert_eq!(preset.label.text, "Hi");
        assert!(preset.label.italic);
        assert_eq!(preset.format, ExportFormat::Jpeg);
    }

    #[test]
    fn test_zero_export_size_rejected() {
        assert!(StylePreset::from_json(r#"{"export_size": 0}"#).is_err());
    }

    #[test]
    fn test_invalid_color_reported() {
        let err = StylePreset::from_json(r#"{"style": {"background": "blue"}}"#).unwrap_err();
        assert!(err.to_string().contains("Invalid preset"));
    }
}
