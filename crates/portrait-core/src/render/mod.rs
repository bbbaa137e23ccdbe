//! Rasterization of crops and composites.
//!
//! - [`render_crop`] turns an interactive crop (pan/zoom/rotate against the
//!   on-screen layout) into an image of any output size.
//! - [`render_composite`] stretches the edited portrait to an output size,
//!   applies the final crop and draws the frame.
//!
//! Both produce plain RGB rasters; encoding is left to [`crate::encode`].

mod composite;
mod crop;
mod draw;

pub use composite::{apply_frame, effective_offset, render_composite, CompositeRequest, FrameStyle};
pub use crop::{render_crop, CropRequest};
pub use draw::{draw_transformed, Placement};
