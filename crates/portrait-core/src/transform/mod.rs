//! Crop geometry and the interactive viewport.
//!
//! # Coordinate System
//!
//! - Offsets are on-screen pixels relative to the crop aperture centre
//! - Rotation is in degrees, clockwise-positive (y axis points down)
//! - The aperture is a fixed 3:4 portrait window; the image moves behind it

mod geometry;
mod layout;
mod state;
mod viewport;

pub use geometry::{PixelSize, Point, Size};
pub use layout::{aperture_size, rendered_image_size, CropLayout, APERTURE_ASPECT};
pub use state::{
    clamp_gesture_scale, clamp_slider_scale, snap_rotation, CropConfig, TransformState,
    DEFAULT_SCALE, FILL_SCALE, FIT_SCALE, MAX_GESTURE_SCALE, MAX_ROTATION, MAX_SLIDER_SCALE,
    MIN_SCALE, ROTATION_STEP,
};
pub use viewport::{
    transition, wheel_factor, DragTarget, Gesture, InputEvent, ViewportController, ViewportState,
    RESIZE_SENSITIVITY,
};
