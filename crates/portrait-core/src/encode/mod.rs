//! Raster encoding for the two output products.
//!
//! - JPEG for the on-screen preview and the composite handed to the final
//!   crop stage
//! - PNG for the full-resolution export (lossless, as delivered for print)
//!
//! Both encoders take RGB pixel data (3 bytes per pixel, row-major order)
//! and validate it the same way before handing it to the `image` crate.

mod jpeg;
mod png;

pub use jpeg::{encode_jpeg, encode_jpeg_image};
pub use png::{encode_png, encode_png_image};

use thiserror::Error;

/// Errors that can occur during encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 3), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The underlying encoder failed
    #[error("{format} encoding failed: {message}")]
    EncodingFailed {
        format: &'static str,
        message: String,
    },
}

/// Check that `pixels` describes a non-empty `width x height` RGB raster.
fn validate_rgb(pixels: &[u8], width: u32, height: u32) -> Result<(), EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected = (width as usize) * (height as usize) * 3;
    if pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}
