//! Image encoding WASM bindings.
//!
//! - [`encode_jpeg`] - Encode a JsDecodedImage to JPEG bytes (previews)
//! - [`encode_png`] - Encode a JsDecodedImage to PNG bytes (exports)
//!
//! # Example
//!
//! ```typescript
//! const png = encode_png(exported);
//! const url = URL.createObjectURL(new Blob([png], { type: 'image/png' }));
//! ```

use crate::types::{js_error, JsDecodedImage};
use portrait_core::encode;
use wasm_bindgen::prelude::*;

/// Encode an image to JPEG bytes.
///
/// `quality` is 1-100; 90 is used for previews.
#[wasm_bindgen]
pub fn encode_jpeg(image: &JsDecodedImage, quality: u8) -> Result<Vec<u8>, JsValue> {
    let decoded = image.to_decoded()?;
    encode::encode_jpeg_image(&decoded, quality).map_err(js_error)
}

/// Encode an image to PNG bytes (lossless).
#[wasm_bindgen]
pub fn encode_png(image: &JsDecodedImage) -> Result<Vec<u8>, JsValue> {
    let decoded = image.to_decoded()?;
    encode::encode_png_image(&decoded).map_err(js_error)
}
