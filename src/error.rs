//! # Error Types
//!
//! This module defines error types used throughout the qrforge library.
//!
//! Batch-level failures ([`BatchError`]) abort a whole batch. Row-level
//! failures ([`RenderError`]) are recorded against the row and never abort.

use thiserror::Error;

/// Main error type for qrforge operations
#[derive(Debug, Error)]
pub enum ForgeError {
    /// Invalid style preset or style field
    #[error("Style error: {0}")]
    Style(String),

    /// Code rendering or image encoding failure
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Fatal batch failure
    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    /// Rejected auxiliary asset (logo, font file)
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure while turning a style and payload into image bytes.
///
/// Inside a batch these are recoverable: the row is skipped and reported.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The payload cannot be encoded as a code matrix (e.g. too long)
    #[error("Cannot encode payload: {0}")]
    Payload(String),

    /// The renderer produced no bytes
    #[error("Renderer returned empty output")]
    Empty,

    /// Raster encoding or decoding failed
    #[error("Image encoding error: {0}")]
    Encode(String),

    /// The embedded logo could not be decoded
    #[error("Logo error: {0}")]
    Logo(String),

    /// Scaled label font above the drawable limit
    #[error("Label font size {size:.0}px exceeds the {limit:.0}px limit")]
    LabelTooLarge { size: f32, limit: f32 },

    /// Composed image above the pixel budget
    #[error("Composed image {width}x{height} exceeds the {limit} pixel limit")]
    CanvasTooLarge { width: u32, height: u64, limit: u64 },
}

/// Failure that aborts an entire batch. No archive is produced.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Required column missing from the tabular input
    #[error("Input must have a '{0}' column")]
    MissingField(&'static str),

    /// The tabular input could not be parsed at all
    #[error("Could not parse input: {0}")]
    Parse(String),

    /// Archive construction failed after all rows were processed
    #[error("Archive creation failed, retry the whole batch: {0}")]
    Assembly(String),

    /// Cancelled at a row boundary
    #[error("Batch cancelled after {processed} of {total} rows")]
    Cancelled { processed: usize, total: usize },
}

/// Rejected auxiliary asset.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("Asset is {size} bytes, limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    #[error("Asset could not be decoded: {0}")]
    Decode(String),

    #[error("Invalid font file: {0}")]
    Font(String),
}
