//! # qrforge - Styled QR Code Library
//!
//! qrforge renders QR codes with custom module shapes, colors, gradients,
//! logos and a text label underneath, one at a time or for every row of a CSV
//! file. It provides:
//!
//! - **Style model**: shapes, solid or gradient paints, logo, label, JSON presets
//! - **Rendering**: PNG, JPEG, WebP and SVG output built on the `qrcode` crate
//! - **Labels**: font-metric driven caption layout, scaled to the export size
//! - **Batch export**: per-row overrides, fault isolation, ZIP archives
//!
//! ## Quick Start
//!
//! ```
//! use qrforge::{
//!     compose::render_labeled,
//!     render::StyledQrRenderer,
//!     style::{DotShape, ExportFormat, LabelStyle, StyleConfig},
//!     text::BitmapFont,
//! };
//!
//! let mut style = StyleConfig::default();
//! style.dots.shape = DotShape::Rounded;
//!
//! let label = LabelStyle {
//!     text: "Scan me".to_string(),
//!     ..LabelStyle::default()
//! };
//!
//! let image = render_labeled(
//!     &StyledQrRenderer::new(),
//!     &BitmapFont,
//!     &style,
//!     &label,
//!     "https://example.com",
//!     1000,
//!     ExportFormat::Png,
//! )?;
//! assert!(!image.bytes().is_empty());
//!
//! # Ok::<(), qrforge::error::RenderError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`style`] | Style model and presets |
//! | [`resolve`] | Per-row overrides merged into a base style |
//! | [`render`] | Code renderer and live preview |
//! | [`text`] | Font metrics and text drawing |
//! | [`compose`] | Label compositing |
//! | [`batch`] | CSV-driven batch export |
//! | [`error`] | Error types |

pub mod batch;
pub mod canvas;
pub mod compose;
pub mod error;
pub mod render;
pub mod resolve;
pub mod style;
pub mod text;

// Re-exports for convenience
pub use error::ForgeError;
