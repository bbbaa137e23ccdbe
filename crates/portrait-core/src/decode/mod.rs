//! Image decoding for the portrait pipeline.
//!
//! This module provides functionality for:
//! - Decoding uploads (JPEG, PNG) with EXIF orientation correction
//! - Decoding collaborator results, which are already upright
//! - Resizing rasters for compositing and upload normalization
//!
//! # Architecture
//!
//! Decoding is the only step that has to wait for data: the host loads the
//! bytes (file picker, network response) and hands them over. Everything
//! after it is synchronous and single-threaded.

mod resize;
mod types;
mod upload;

pub use resize::{resize, resize_to_fit};
pub use types::{DecodeError, DecodedImage, FilterType};
pub use upload::{decode_image, decode_image_no_orientation, get_orientation, Orientation};
