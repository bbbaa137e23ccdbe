//! Compositing the edited portrait at a target resolution.
//!
//! The base image (initial crop or its latest AI edit) is stretched to the
//! output size, optionally reframed by the final crop, and finished with a
//! faint frame. Preview and export run the same code with different sizes
//! and frame styles, so they are geometrically identical.
//!
//! # Final crop offsets
//!
//! The final crop is captured while looking at the preview (800×1066 by
//! default), so its offsets are preview pixels. At other resolutions they are
//! rescaled per axis against that reference:
//!
//! ```text
//! dx = offset_x * (out_w / ref_w)
//! dy = offset_y * (out_h / ref_h)
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decode::{resize, DecodeError, DecodedImage, FilterType};
use crate::transform::{CropConfig, PixelSize};

use super::draw::{draw_transformed, Placement};

/// Opacity of the frame stroke.
const STROKE_ALPHA: f64 = 0.05;
/// Peak opacity of the inner shadow at the edge.
const SHADOW_ALPHA: f64 = 0.1;

/// The cosmetic frame drawn around every composite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameStyle {
    /// Stroke width in output pixels, centred on the image edge.
    pub line_width: f64,
    /// Blur radius of the inner shadow in output pixels.
    pub shadow_blur: f64,
}

impl FrameStyle {
    /// Frame used for on-screen previews.
    pub const fn preview() -> Self {
        Self {
            line_width: 4.0,
            shadow_blur: 10.0,
        }
    }

    /// Frame used for the high resolution export.
    pub const fn export() -> Self {
        Self {
            line_width: 20.0,
            shadow_blur: 60.0,
        }
    }

    /// No frame at all.
    pub const fn none() -> Self {
        Self {
            line_width: 0.0,
            shadow_blur: 0.0,
        }
    }

    /// Darkening applied at `distance` pixels from the nearest edge.
    fn alpha_at(&self, distance: f64) -> f64 {
        let stroke = if distance < self.line_width / 2.0 {
            STROKE_ALPHA
        } else {
            0.0
        };

        // Canvas shadows are a Gaussian with sigma = blur / 2
        let sigma = self.shadow_blur / 2.0;
        let shadow = if sigma > 0.0 && distance <= 3.0 * sigma {
            SHADOW_ALPHA * (-(distance * distance) / (2.0 * sigma * sigma)).exp()
        } else {
            0.0
        };

        1.0 - (1.0 - stroke) * (1.0 - shadow)
    }

    /// Width of the band along each edge the frame can touch.
    fn reach(&self) -> f64 {
        (self.line_width / 2.0).max(1.5 * self.shadow_blur)
    }
}

/// Everything needed to composite one output image.
#[derive(Debug, Clone, Copy)]
pub struct CompositeRequest<'a> {
    pub base: &'a DecodedImage,
    pub output: PixelSize,
    pub final_crop: Option<CropConfig>,
    /// Size the final crop was captured at.
    pub reference: PixelSize,
    pub frame: FrameStyle,
    pub filter: FilterType,
}

/// Final crop offset in output pixels for a composite of size `output`.
///
/// `reference` is the size the crop was captured at. A zero reference
/// leaves the offsets unscaled.
pub fn effective_offset(crop: &CropConfig, output: PixelSize, reference: PixelSize) -> (f64, f64) {
    if reference.is_empty() {
        return (crop.offset_x, crop.offset_y);
    }
    let (rx, ry) = output.ratio_to(reference);
    (crop.offset_x * rx, crop.offset_y * ry)
}

/// Render a composite.
///
/// # Errors
///
/// Returns an error if the base image is empty or the output size is zero.
pub fn render_composite(request: &CompositeRequest<'_>) -> Result<DecodedImage, DecodeError> {
    let output = request.output;
    if request.base.is_empty() {
        return Err(DecodeError::EmptyImage {
            width: request.base.width,
            height: request.base.height,
        });
    }

    let buffer = resize(request.base, output.width, output.height, request.filter)?;

    let mut composite = match request.final_crop {
        Some(crop) => {
            let (dx, dy) = effective_offset(&crop, output, request.reference);
            debug!(
                width = output.width,
                height = output.height,
                dx,
                dy,
                scale = crop.scale,
                "applying final crop"
            );

            let mut canvas = DecodedImage::filled(output.width, output.height, [0, 0, 0]);
            let placement = Placement {
                offset_x: dx,
                offset_y: dy,
                width: output.width as f64 * crop.scale,
                height: output.height as f64 * crop.scale,
                rotation: crop.rotation,
            };
            draw_transformed(&mut canvas, &buffer, &placement, request.filter);
            canvas
        }
        None => buffer,
    };

    apply_frame(&mut composite, &request.frame);
    Ok(composite)
}

/// Darken the edges of `image` with the frame stroke and inner shadow.
pub fn apply_frame(image: &mut DecodedImage, style: &FrameStyle) {
    let reach = style.reach();
    if reach <= 0.0 || image.is_empty() {
        return;
    }

    let (w, h) = (image.width as f64, image.height as f64);
    let row = image.width as usize;
    for y in 0..image.height {
        let cy = y as f64 + 0.5;
        let dist_y = cy.min(h - cy);
        for x in 0..image.width {
            let cx = x as f64 + 0.5;
            let distance = cx.min(w - cx).min(dist_y);
            if distance > reach {
                continue;
            }

            let keep = 1.0 - style.alpha_at(distance);
            let idx = (y as usize * row + x as usize) * 3;
            for channel in &mut image.pixels[idx..idx + 3] {
                *channel = (*channel as f64 * keep).round() as u8;
            }
        }
    }
}
