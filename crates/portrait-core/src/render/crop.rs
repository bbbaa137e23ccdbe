//! Turning a confirmed crop into pixels.
//!
//! The interactive view shows the source at its laid-out size behind the
//! aperture. Rasterizing scales that whole scene by `output / aperture` so
//! the aperture fills the output exactly. Because the scale is derived from
//! laid-out sizes, the same transform reproduces the same framing at any
//! output resolution.

use tracing::{debug, warn};

use crate::decode::{DecodedImage, FilterType};
use crate::transform::{CropConfig, CropLayout, PixelSize, Size};

use super::draw::{draw_transformed, Placement};

/// Everything needed to rasterize one crop.
#[derive(Debug, Clone, Copy)]
pub struct CropRequest<'a> {
    pub source: &'a DecodedImage,
    /// Laid-out size of the source in the crop view.
    pub rendered_size: Size,
    /// Laid-out size of the aperture in the crop view.
    pub aperture_size: Size,
    pub crop: CropConfig,
    pub output: PixelSize,
    pub filter: FilterType,
}

impl<'a> CropRequest<'a> {
    /// Build a request from a measured layout.
    pub fn from_layout(
        source: &'a DecodedImage,
        layout: &CropLayout,
        crop: CropConfig,
        output: PixelSize,
        filter: FilterType,
    ) -> Self {
        Self {
            source,
            rendered_size: layout.image,
            aperture_size: layout.aperture,
            crop,
            output,
            filter,
        }
    }

    /// Where the source lands on the output canvas.
    ///
    /// Returns `None` until the layout has been measured.
    pub fn placement(&self) -> Option<Placement> {
        if !self.aperture_size.is_measured() || !self.rendered_size.is_measured() {
            return None;
        }
        if self.output.is_empty() {
            return None;
        }

        let draw_scale = self.output.width as f64 / self.aperture_size.width;
        Some(Placement {
            offset_x: self.crop.offset_x * draw_scale,
            offset_y: self.crop.offset_y * draw_scale,
            width: self.rendered_size.width * self.crop.scale * draw_scale,
            height: self.rendered_size.height * self.crop.scale * draw_scale,
            rotation: self.crop.rotation,
        })
    }
}

/// Rasterize a crop onto a black canvas of the requested output size.
///
/// Returns `None` (and draws nothing) when the layout is not settled yet;
/// the caller retries once sizes are known.
pub fn render_crop(request: &CropRequest<'_>) -> Option<DecodedImage> {
    let placement = request.placement()?;

    let aperture_ratio = request.aperture_size.width / request.aperture_size.height;
    let output_ratio = request.output.width as f64 / request.output.height as f64;
    if (aperture_ratio - output_ratio).abs() > 0.01 {
        warn!(
            aperture_ratio,
            output_ratio, "crop output aspect differs from aperture, framing will be stretched"
        );
    }

    debug!(
        width = request.output.width,
        height = request.output.height,
        scale = request.crop.scale,
        rotation = request.crop.rotation,
        "rasterizing crop"
    );

    let mut canvas = DecodedImage::filled(request.output.width, request.output.height, [0, 0, 0]);
    draw_transformed(&mut canvas, request.source, &placement, request.filter);
    Some(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Four coloured quadrants so framing changes are visible in the output.
    fn quadrants(width: u32, height: u32) -> DecodedImage {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let rgb = match (x < width / 2, y < height / 2) {
                    (true, true) => [255, 0, 0],
                    (false, true) => [0, 255, 0],
                    (true, false) => [0, 0, 255],
                    (false, false) => [255, 255, 0],
                };
                pixels.extend_from_slice(&rgb);
            }
        }
        DecodedImage::new(width, height, pixels)
    }

    fn request(source: &DecodedImage, crop: CropConfig, output: PixelSize) -> CropRequest<'_> {
        CropRequest {
            source,
            rendered_size: Size::new(300.0, 400.0),
            aperture_size: Size::new(300.0, 400.0),
            crop,
            output,
            filter: FilterType::Bilinear,
        }
    }

    #[test]
    fn test_unsettled_layout_is_noop() {
        let src = quadrants(30, 40);
        let mut req = request(&src, CropConfig::new(1.0, 0.0, 0.0, 0.0), PixelSize::new(30, 40));
        req.aperture_size = Size::new(0.0, 400.0);
        assert!(render_crop(&req).is_none());

        req.aperture_size = Size::new(300.0, 400.0);
        req.rendered_size = Size::default();
        assert!(render_crop(&req).is_none());
    }

    #[test]
    fn test_draw_scale_from_aperture() {
        let src = quadrants(30, 40);
        let req = CropRequest {
            rendered_size: Size::new(600.0, 800.0),
            aperture_size: Size::new(300.0, 400.0),
            ..request(&src, CropConfig::new(0.5, 10.0, -4.0, 2.0), PixelSize::new(1200, 1600))
        };
        let placement = req.placement().expect("settled layout");

        // draw_scale = 1200 / 300 = 4
        assert_eq!(placement.width, 600.0 * 0.5 * 4.0);
        assert_eq!(placement.height, 800.0 * 0.5 * 4.0);
        assert_eq!(placement.offset_x, 40.0);
        assert_eq!(placement.offset_y, -16.0);
        assert_eq!(placement.rotation, 2.0);
    }

    #[test]
    fn test_output_size_and_black_background() {
        let src = quadrants(30, 40);
        let out = render_crop(&request(
            &src,
            CropConfig::new(0.5, 0.0, 0.0, 0.0),
            PixelSize::new(60, 80),
        ))
        .expect("settled layout");

        assert_eq!((out.width, out.height), (60, 80));
        // Half-size subject leaves a black border
        assert_eq!(out.pixel(0, 0), [0, 0, 0]);
        assert_eq!(out.pixel(59, 79), [0, 0, 0]);
        assert_eq!(out.pixel(20, 25), [255, 0, 0]);
        assert_eq!(out.pixel(40, 55), [255, 255, 0]);
    }

    #[test]
    fn test_idempotent() {
        let src = quadrants(64, 48);
        let req = CropRequest {
            rendered_size: Size::new(512.0, 384.0),
            ..request(
                &src,
                CropConfig::new(1.3, -22.0, 17.5, -12.5),
                PixelSize::new(90, 120),
            )
        };
        let a = render_crop(&req).expect("settled layout");
        let b = render_crop(&req).expect("settled layout");
        assert_eq!(a.pixels, b.pixels);
    }

    #[test]
    fn test_pan_right_moves_subject_right() {
        let src = quadrants(30, 40);
        // Pan by a quarter of the aperture width
        let out = render_crop(&request(
            &src,
            CropConfig::new(1.0, 75.0, 0.0, 0.0),
            PixelSize::new(60, 80),
        ))
        .expect("settled layout");

        assert_eq!(out.pixel(5, 10), [0, 0, 0]);
        assert_eq!(out.pixel(20, 10), [255, 0, 0]);
        assert_eq!(out.pixel(50, 10), [0, 255, 0]);
    }

    #[test]
    fn test_resolution_invariance() {
        let src = quadrants(16, 16);
        let crop = CropConfig::new(0.5, 2.0, -3.0, 0.0);
        let at = |output: PixelSize| CropRequest {
            source: &src,
            rendered_size: Size::new(32.0, 32.0),
            aperture_size: Size::new(24.0, 32.0),
            crop,
            output,
            filter: FilterType::Nearest,
        };
        let preview = render_crop(&at(PixelSize::new(24, 32))).expect("settled layout");
        let export = render_crop(&at(PixelSize::new(72, 96))).expect("settled layout");

        // Each preview pixel maps onto a 3x3 block of the export; its centre
        // sample lands on the same source point
        for y in 0..preview.height {
            for x in 0..preview.width {
                let p = preview.pixel(x, y);
                let e = export.pixel(x * 3 + 1, y * 3 + 1);
                assert_eq!(p, e, "mismatch at ({}, {})", x, y);
            }
        }
        assert!(preview.pixels.chunks(3).any(|p| p == [0, 0, 0]));
        assert!(preview.pixels.chunks(3).any(|p| p == [255, 255, 0]));
    }
}
