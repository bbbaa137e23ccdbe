//! Studio configuration.
//!
//! Every field has a default, so hosts only send what they want to change.

use serde::{Deserialize, Serialize};

use crate::decode::FilterType;
use crate::render::FrameStyle;
use crate::transform::PixelSize;
use crate::{CROP_OUTPUT_SIZE, EXPORT_SIZE, PREVIEW_SIZE};

/// Output sizes, filters and frame styles for one studio session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// On-screen preview size. Final crop offsets are captured at this size.
    pub preview: PixelSize,

    /// High resolution export size.
    pub export: PixelSize,

    /// Raster size of the confirmed initial crop.
    pub crop_output: PixelSize,

    /// Frame drawn on previews.
    pub preview_frame: FrameStyle,

    /// Frame drawn on the export.
    pub export_frame: FrameStyle,

    /// Sampling filter for previews and the composite shown in the final crop.
    pub preview_filter: FilterType,

    /// Sampling filter for everything that ends up in the export: upload
    /// downscaling, the initial crop raster and the export composite.
    pub export_filter: FilterType,

    /// JPEG quality (1-100) of encoded previews.
    pub preview_jpeg_quality: u8,

    /// Uploads larger than this on their long edge are downscaled.
    pub max_upload_edge: Option<u32>,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            preview: PREVIEW_SIZE,
            export: EXPORT_SIZE,
            crop_output: CROP_OUTPUT_SIZE,
            preview_frame: FrameStyle::preview(),
            export_frame: FrameStyle::export(),
            preview_filter: FilterType::Bilinear,
            export_filter: FilterType::Lanczos3,
            preview_jpeg_quality: 90,
            max_upload_edge: Some(4096),
        }
    }
}

impl StudioConfig {
    /// Replace unusable values with their defaults.
    ///
    /// Zero sizes and a zero upload edge would make every render fail, and a
    /// JPEG quality outside 1-100 is clamped.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.preview.is_empty() {
            tracing::warn!("preview size is empty, using default");
            self.preview = defaults.preview;
        }
        if self.export.is_empty() {
            tracing::warn!("export size is empty, using default");
            self.export = defaults.export;
        }
        if self.crop_output.is_empty() {
            tracing::warn!("crop output size is empty, using default");
            self.crop_output = defaults.crop_output;
        }
        if self.max_upload_edge == Some(0) {
            self.max_upload_edge = None;
        }
        self.preview_jpeg_quality = self.preview_jpeg_quality.clamp(1, 100);
        self
    }
}
