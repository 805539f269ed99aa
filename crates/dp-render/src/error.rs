//! Error types for raster work.
//!
//! Only conditions with no safe pixel buffer to fall back on are errors;
//! bad style values are clamped long before they reach the renderer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unable to allocate a {width}x{height} raster")]
    Allocation { width: u32, height: u32 },

    #[error("pixel buffer holds {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("image codec failed: {0}")]
    Codec(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, RenderError>;
