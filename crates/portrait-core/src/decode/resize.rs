//! Whole-raster resampling.
//!
//! Compositing stretches an edit result to the output buffer without
//! preserving aspect, and uploads are capped to a longest edge before they
//! enter a session.

use super::{DecodeError, DecodedImage, FilterType};

/// Resample `image` to exactly `width`x`height`.
///
/// # Errors
///
/// `DecodeError::EmptyImage` for a zero target size, and
/// `DecodeError::CorruptedFile` if the pixel buffer does not match the
/// image's dimensions.
pub fn resize(
    image: &DecodedImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<DecodedImage, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::EmptyImage { width, height });
    }
    if (image.width, image.height) == (width, height) {
        return Ok(image.clone());
    }

    let rgb = image.to_rgb_image().ok_or_else(|| {
        DecodeError::CorruptedFile(format!(
            "pixel buffer does not match {}x{}",
            image.width, image.height
        ))
    })?;
    let resampled = image::imageops::resize(&rgb, width, height, filter.to_image_filter());
    Ok(DecodedImage::from_rgb_image(resampled))
}

/// Shrink `image` so its longest edge is at most `max_edge`, keeping aspect.
///
/// Images already within the limit are returned unchanged; nothing is
/// upscaled.
pub fn resize_to_fit(
    image: &DecodedImage,
    max_edge: u32,
    filter: FilterType,
) -> Result<DecodedImage, DecodeError> {
    if max_edge == 0 {
        return Err(DecodeError::EmptyImage {
            width: 0,
            height: 0,
        });
    }
    match fit_within(image.width, image.height, max_edge) {
        Some((width, height)) => resize(image, width, height, filter),
        None => Ok(image.clone()),
    }
}

/// Target size with the longest edge at `max_edge`, or `None` when the
/// image already fits.
fn fit_within(width: u32, height: u32, max_edge: u32) -> Option<(u32, u32)> {
    let longest = width.max(height);
    if longest <= max_edge {
        return None;
    }
    let scale = max_edge as f64 / longest as f64;
    let edge = |len: u32| ((len as f64 * scale).round() as u32).clamp(1, max_edge);
    Some((edge(width), edge(height)))
}
