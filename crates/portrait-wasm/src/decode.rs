//! Image decoding WASM bindings.
//!
//! # Functions
//!
//! - [`decode_image`] - Decode an upload (JPEG or PNG) with EXIF orientation applied
//! - [`decode_edit_result`] - Decode an image returned by the edit service
//! - [`resize`] - Resize an image to exact dimensions
//! - [`resize_to_fit`] - Resize an image to fit within a max edge, preserving aspect ratio
//!
//! # Example
//!
//! ```typescript
//! import { decode_image, resize_to_fit } from '@portrait-studio/wasm';
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const image = decode_image(bytes);
//! const preview = resize_to_fit(image, 1600, 1); // Bilinear filter
//! ```

use crate::types::{filter_from_u8, js_error, JsDecodedImage};
use portrait_core::decode;
use wasm_bindgen::prelude::*;

/// Decode an uploaded image from bytes.
///
/// The EXIF orientation is applied so the image is upright.
///
/// # Errors
///
/// Returns an error if the bytes are not a supported image, the file is
/// corrupted, or it decodes to zero pixels.
#[wasm_bindgen]
pub fn decode_image(bytes: &[u8]) -> Result<JsDecodedImage, JsValue> {
    decode::decode_image(bytes)
        .map(JsDecodedImage::from_decoded)
        .map_err(js_error)
}

/// Decode an image returned by the edit service.
///
/// Results are already upright, so no orientation is applied.
#[wasm_bindgen]
pub fn decode_edit_result(bytes: &[u8]) -> Result<JsDecodedImage, JsValue> {
    decode::decode_image_no_orientation(bytes)
        .map(JsDecodedImage::from_decoded)
        .map_err(js_error)
}

/// Resize an image to exact dimensions.
///
/// `filter`: 0 = Nearest, 1 = Bilinear, 2 = Lanczos3.
#[wasm_bindgen]
pub fn resize(
    image: &JsDecodedImage,
    width: u32,
    height: u32,
    filter: u8,
) -> Result<JsDecodedImage, JsValue> {
    let decoded = image.to_decoded()?;
    decode::resize(&decoded, width, height, filter_from_u8(filter))
        .map(JsDecodedImage::from_decoded)
        .map_err(js_error)
}

/// Resize an image so its longest edge is at most `max_edge`.
///
/// Images that already fit are returned unchanged.
#[wasm_bindgen]
pub fn resize_to_fit(
    image: &JsDecodedImage,
    max_edge: u32,
    filter: u8,
) -> Result<JsDecodedImage, JsValue> {
    let decoded = image.to_decoded()?;
    decode::resize_to_fit(&decoded, max_edge, filter_from_u8(filter))
        .map(JsDecodedImage::from_decoded)
        .map_err(js_error)
}
