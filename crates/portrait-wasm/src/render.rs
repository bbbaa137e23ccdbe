//! Stateless rendering bindings.
//!
//! These expose the crop rasterizer and compositor directly, for hosts that
//! keep their own workflow state instead of using [`crate::JsSession`].

use portrait_core::render::{self, CompositeRequest, CropRequest, FrameStyle};
use portrait_core::transform::{CropLayout, PixelSize, Size};
use portrait_core::PREVIEW_SIZE;
use wasm_bindgen::prelude::*;

use crate::types::{filter_from_u8, js_error, JsDecodedImage};
use crate::viewport::parse_crop;

/// Laid-out sizes of the crop view.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy)]
pub struct JsCropLayout {
    inner: CropLayout,
}

#[wasm_bindgen]
impl JsCropLayout {
    /// Measure the crop view for an image of `natural_width`x`natural_height`
    /// inside a container of the given size.
    #[wasm_bindgen(constructor)]
    pub fn new(
        container_width: f64,
        container_height: f64,
        natural_width: f64,
        natural_height: f64,
    ) -> JsCropLayout {
        JsCropLayout {
            inner: CropLayout::measure(
                Size::new(container_width, container_height),
                Size::new(natural_width, natural_height),
            ),
        }
    }

    #[wasm_bindgen(getter)]
    pub fn image_width(&self) -> f64 {
        self.inner.image.width
    }

    #[wasm_bindgen(getter)]
    pub fn image_height(&self) -> f64 {
        self.inner.image.height
    }

    #[wasm_bindgen(getter)]
    pub fn aperture_width(&self) -> f64 {
        self.inner.aperture.width
    }

    #[wasm_bindgen(getter)]
    pub fn aperture_height(&self) -> f64 {
        self.inner.aperture.height
    }

    /// False until the container has been laid out.
    pub fn is_settled(&self) -> bool {
        self.inner.is_settled()
    }
}

impl JsCropLayout {
    pub(crate) fn from_layout(inner: CropLayout) -> Self {
        Self { inner }
    }
}

/// Rasterize a crop at `out_width`x`out_height`.
///
/// Returns `undefined` while the layout is not settled.
#[wasm_bindgen]
pub fn render_crop(
    source: &JsDecodedImage,
    layout: &JsCropLayout,
    crop: JsValue,
    out_width: u32,
    out_height: u32,
    filter: u8,
) -> Result<Option<JsDecodedImage>, JsValue> {
    let Some(crop) = parse_crop(crop)? else {
        return Err(JsValue::from_str("A crop config is required"));
    };
    let decoded = source.to_decoded()?;
    let request = CropRequest::from_layout(
        &decoded,
        &layout.inner,
        crop,
        PixelSize::new(out_width, out_height),
        filter_from_u8(filter),
    );
    Ok(render::render_crop(&request).map(JsDecodedImage::from_decoded))
}

/// Composite `base` at `out_width`x`out_height`.
///
/// `final_crop` may be `null`. Offsets in it are preview pixels (800x1066).
/// `high_res` selects the export frame and Lanczos3 sampling.
#[wasm_bindgen]
pub fn render_composite(
    base: &JsDecodedImage,
    out_width: u32,
    out_height: u32,
    final_crop: JsValue,
    high_res: bool,
) -> Result<JsDecodedImage, JsValue> {
    let final_crop = parse_crop(final_crop)?;
    let decoded = base.to_decoded()?;
    let (frame, filter) = frame_for(high_res);
    render::render_composite(&CompositeRequest {
        base: &decoded,
        output: PixelSize::new(out_width, out_height),
        final_crop,
        reference: PREVIEW_SIZE,
        frame,
        filter,
    })
    .map(JsDecodedImage::from_decoded)
    .map_err(js_error)
}

fn frame_for(high_res: bool) -> (FrameStyle, portrait_core::FilterType) {
    if high_res {
        (FrameStyle::export(), portrait_core::FilterType::Lanczos3)
    } else {
        (FrameStyle::preview(), portrait_core::FilterType::Bilinear)
    }
}
