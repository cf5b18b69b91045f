//! # Code Rendering
//!
//! Turns a [`StyleConfig`] and a payload into encoded image bytes.
//!
//! ## Modules
//!
//! - `geometry`: module and finder outlines shared by raster and SVG output
//! - `qr`: [`StyledQrRenderer`], the default renderer
//! - `encode`: raster encoding/decoding helpers
//!
//! ## Usage Example
//!
//! ```
//! use qrforge::render::{CodeMatrixRenderer, StyledQrRenderer};
//! use qrforge::style::{ExportFormat, StyleConfig};
//!
//! let png = StyledQrRenderer::new()
//!     .render(&StyleConfig::default(), "https://example.com", 300, 300, ExportFormat::Png)
//!     .unwrap();
//! assert!(!png.is_empty());
//! ```

mod encode;
mod geometry;
mod qr;

pub use encode::{decode_raster, encode_raster, flatten};
pub use qr::StyledQrRenderer;

use crate::error::RenderError;
use crate::style::{ExportFormat, StyleConfig};

/// Something that draws a scannable code for a payload.
///
/// Implementations must be deterministic for equal inputs and must either
/// return non-empty bytes in `format` or an error.
pub trait CodeMatrixRenderer: Send + Sync {
    fn render(
        &self,
        style: &StyleConfig,
        payload: &str,
        width: u32,
        height: u32,
        format: ExportFormat,
    ) -> Result<Vec<u8>, RenderError>;
}

impl<R: CodeMatrixRenderer + ?Sized> CodeMatrixRenderer for &R {
    fn render(
        &self,
        style: &StyleConfig,
        payload: &str,
        width: u32,
        height: u32,
        format: ExportFormat,
    ) -> Result<Vec<u8>, RenderError> {
        (**self).render(style, payload, width, height, format)
    }
}

/// Stand-in payload for an empty preview, so the preview always shows a code.
pub const EMPTY_PREVIEW_PAYLOAD: &str = " ";

/// Interactive preview that re-renders only when its inputs change.
///
/// The preview is drawn at the style's own `width`×`height` as PNG.
pub struct PreviewSession<R> {
    renderer: R,
    last: Option<(StyleConfig, String)>,
    image: Vec<u8>,
    renders: usize,
}

impl<R: CodeMatrixRenderer> PreviewSession<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            last: None,
            image: Vec::new(),
            renders: 0,
        }
    }

    /// Bring the preview up to date and return its PNG bytes.
    ///
    /// On error the previous image is kept.
    pub fn update(&mut self, style: &StyleConfig, payload: &str) -> Result<&[u8], RenderError> {
        let payload = if payload.is_empty() {
            EMPTY_PREVIEW_PAYLOAD
        } else {
            payload
        };

        let unchanged = self
            .last
            .as_ref()
            .is_some_and(|(s, p)| s == style && p == payload);
        if !unchanged {
            let image = self.renderer.render(
                style,
                payload,
                style.width,
                style.height,
                ExportFormat::Png,
            )?;
            log::debug!("Preview re-rendered ({} bytes)", image.len());
            self.image = image;
            self.last = Some((style.clone(), payload.to_string()));
            self.renders += 1;
        }
        Ok(&self.image)
    }

    /// Last successfully rendered preview, if any.
    pub fn image(&self) -> Option<&[u8]> {
        self.last.as_ref().map(|_| self.image.as_slice())
    }

    /// Number of renders performed so far.
    pub fn render_count(&self) -> usize {
        self.renders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::DotShape;

    #[test]
    fn test_preview_skips_unchanged_inputs() {
        let mut session = PreviewSession::new(StyledQrRenderer::new());
        let mut style = StyleConfig::default();

        session.update(&style, "hello").unwrap();
        session.update(&style, "hello").unwrap();
        assert_eq!(session.render_count(), 1);

        style.dots.shape = DotShape::Dots;
        session.update(&style, "hello").unwrap();
        assert_eq!(session.render_count(), 2);

        session.update(&style, "world").unwrap();
        assert_eq!(session.render_count(), 3);
    }

    #[test]
    fn test_empty_payload_still_renders() {
        let mut session = PreviewSession::new(StyledQrRenderer::new());
        assert!(session.image().is_none());
        let bytes = session.update(&StyleConfig::default(), "").unwrap().to_vec();
        let img = decode_raster(&bytes).unwrap();
        assert_eq!(img.dimensions(), (300, 300));
    }

    #[test]
    fn test_failed_update_keeps_previous_image() {
        let mut session = PreviewSession::new(StyledQrRenderer::new());
        let style = StyleConfig::default();
        let first = session.update(&style, "ok").unwrap().to_vec();

        let too_long = "x".repeat(5000);
        assert!(session.update(&style, &too_long).is_err());
        assert_eq!(session.image(), Some(first.as_slice()));
    }
}
