//! Layout of the interactive crop view.
//!
//! The crop view is a container holding the source image and a fixed 3:4
//! aperture overlay, both centred. Rasterization works from these laid-out
//! sizes rather than the image's pixel size, which is what lets one crop be
//! replayed at any output resolution.
//!
//! # Rules
//!
//! - Image: height limited to the container height, never upscaled, width
//!   follows the image's aspect ratio (it may overflow the container).
//! - Aperture: 3:4, height 80% of the container height, width capped at 90%
//!   of the container width; when capped the height follows the width.

use super::geometry::Size;

/// Aperture aspect ratio (width / height).
pub const APERTURE_ASPECT: f64 = 3.0 / 4.0;
/// Aperture height as a fraction of the container height.
pub const APERTURE_HEIGHT_FRACTION: f64 = 0.8;
/// Maximum aperture width as a fraction of the container width.
pub const APERTURE_MAX_WIDTH_FRACTION: f64 = 0.9;

/// Measured layout of the crop view for one source image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropLayout {
    /// Laid-out size of the source image before any transform.
    pub image: Size,
    /// Laid-out size of the aperture window.
    pub aperture: Size,
}

impl CropLayout {
    /// Compute the layout for a source of `natural` pixel size in `container`.
    pub fn measure(container: Size, natural: Size) -> Self {
        Self {
            image: rendered_image_size(container, natural),
            aperture: aperture_size(container),
        }
    }

    /// True when both the image and the aperture have been laid out.
    pub fn is_settled(&self) -> bool {
        self.image.is_measured() && self.aperture.is_measured()
    }
}

/// Laid-out size of an image under the "fit height, preserve aspect" rule.
///
/// Returns a zero size if either input is unmeasured.
pub fn rendered_image_size(container: Size, natural: Size) -> Size {
    if !container.is_measured() || !natural.is_measured() {
        return Size::default();
    }

    let height = natural.height.min(container.height);
    let width = natural.width * height / natural.height;
    Size::new(width, height)
}

/// Size of the 3:4 aperture window inside `container`.
pub fn aperture_size(container: Size) -> Size {
    if !container.is_measured() {
        return Size::default();
    }

    let height = container.height * APERTURE_HEIGHT_FRACTION;
    let width = height * APERTURE_ASPECT;
    let max_width = container.width * APERTURE_MAX_WIDTH_FRACTION;

    if width > max_width {
        Size::new(max_width, max_width / APERTURE_ASPECT)
    } else {
        Size::new(width, height)
    }
}
