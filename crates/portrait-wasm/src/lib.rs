//! Portrait WASM - WebAssembly bindings for the portrait studio
//!
//! This crate exposes the portrait-core pipeline to JavaScript/TypeScript.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible wrapper types for image data
//! - `decode` - Image decoding bindings (uploads, edit results, resize)
//! - `encode` - Image encoding bindings (JPEG preview, PNG export)
//! - `viewport` - Crop view gesture controller
//! - `render` - Stateless crop and composite rendering
//! - `session` - The upload, crop, edit and export workflow
//! - `logging` - Tracing output to the browser console
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsSession } from '@portrait-studio/wasm';
//!
//! await init();
//!
//! const session = new JsSession();
//! session.upload_bytes(new Uint8Array(await file.arrayBuffer()));
//! // ...drive the crop view, then
//! session.confirm_crop(container.clientWidth, container.clientHeight);
//! ```

use wasm_bindgen::prelude::*;

mod decode;
mod encode;
mod logging;
mod render;
mod session;
mod types;
mod viewport;

// Re-export public types
pub use decode::{decode_edit_result, decode_image, resize, resize_to_fit};
pub use encode::{encode_jpeg, encode_png};
pub use logging::init_logging;
pub use render::{render_composite, render_crop, JsCropLayout};
pub use session::{JsEditRequest, JsSession};
pub use types::JsDecodedImage;
pub use viewport::JsViewport;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    if cfg!(target_arch = "wasm32") {
        logging::init_logging("info");
    }
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
