//! Portrait Core - framing and compositing for formal portraits
//!
//! This crate turns an arbitrary uploaded photo into a formal portrait:
//! interactive pan/zoom/rotate becomes a deterministic raster crop, an
//! external editor swaps backgrounds and attire, and the result is reframed,
//! composited and exported at preview and print resolutions.
//!
//! # Modules
//!
//! - [`transform`]: transform values, crop-view layout and the gesture state machine
//! - [`render`]: crop rasterization and compositing
//! - [`session`]: the upload → crop → edit → export workflow
//! - [`synthesis`]: edit options and the external editor seam
//! - [`decode`] / [`encode`]: raster input and output
//! - [`config`]: output sizes, filters and frame styles

pub mod config;
pub mod decode;
pub mod encode;
pub mod render;
pub mod session;
pub mod synthesis;
pub mod transform;

pub use config::StudioConfig;
pub use decode::{DecodeError, DecodedImage, FilterType};
pub use encode::EncodeError;
pub use render::{render_composite, render_crop, CompositeRequest, CropRequest, FrameStyle};
pub use session::{
    AppliedOptions, ConfirmOutcome, CropStage, EditAction, EditBase, EditRequest, Session,
    SessionError, Stage,
};
pub use synthesis::{BackgroundOption, ClothingOption, EditError, EditKind, PortraitEditor};
pub use transform::{
    CropConfig, CropLayout, InputEvent, PixelSize, Point, Size, TransformState, ViewportController,
};

/// Preview resolution. Final crop offsets are captured at this size.
pub const PREVIEW_SIZE: PixelSize = PixelSize::new(800, 1066);

/// Export (print) resolution.
pub const EXPORT_SIZE: PixelSize = PixelSize::new(2700, 3600);

/// Raster size of a confirmed initial crop.
pub const CROP_OUTPUT_SIZE: PixelSize = PixelSize::new(1200, 1600);
