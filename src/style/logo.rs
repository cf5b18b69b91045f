//! Embedded logo images.

use std::sync::Arc;

use crate::error::ResourceError;

/// Uploaded logos above this size are rejected.
pub const MAX_LOGO_BYTES: usize = 2 * 1024 * 1024;

/// A raster logo drawn in the middle of the code.
///
/// The encoded bytes are shared, so cloning a style for every batch row
/// does not copy the image.
#[derive(Debug, Clone, PartialEq)]
pub struct Logo {
    bytes: Arc<[u8]>,
    /// Logo size as a fraction of the code area, clamped to [0, 1].
    pub size: f32,
    /// Clear space around the logo in pixels (at preview resolution).
    pub margin: u32,
    /// Skip data modules that would sit under the logo.
    pub hide_background_dots: bool,
}

impl Logo {
    pub const DEFAULT_SIZE: f32 = 0.4;
    pub const DEFAULT_MARGIN: u32 = 10;

    /// Validate and wrap encoded image bytes (PNG, JPEG, WebP, ...).
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ResourceError> {
        if bytes.len() > MAX_LOGO_BYTES {
            return Err(ResourceError::TooLarge {
                size: bytes.len(),
                limit: MAX_LOGO_BYTES,
            });
        }
        image::guess_format(&bytes).map_err(|e| ResourceError::Decode(e.to_string()))?;

        Ok(Self {
            bytes: bytes.into(),
            size: Self::DEFAULT_SIZE,
            margin: Self::DEFAULT_MARGIN,
            hide_background_dots: true,
        })
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size.clamp(0.0, 1.0);
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Holds the currently selected logo.
///
/// A rejected replacement leaves the previous logo in place.
#[derive(Debug, Clone, Default)]
pub struct LogoSlot {
    current: Option<Logo>,
}

impl LogoSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to install a new logo, keeping its size setting from the old one.
    pub fn replace(&mut self, bytes: Vec<u8>) -> Result<&Logo, ResourceError> {
        let mut logo = Logo::from_bytes(bytes)?;
        if let Some(previous) = &self.current {
            logo.size = previous.size;
            logo.margin = previous.margin;
            logo.hide_background_dots = previous.hide_background_dots;
        }
        Ok(self.current.insert(logo))
    }

    /// Install an already validated logo as is.
    pub fn set(&mut self, logo: Logo) {
        self.current = Some(logo);
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn get(&self) -> Option<&Logo> {
        self.current.as_ref()
    }
}
