//! Crop view input bindings.
//!
//! Input can be delivered either through the typed methods on
//! [`JsViewport`] or as plain event objects:
//!
//! ```typescript
//! viewport.handle({ type: 'pointer_down', x: e.clientX, y: e.clientY, target: 'resize_handle' });
//! viewport.handle({ type: 'pinch_move', a: { x: 0, y: 0 }, b: { x: 120, y: 40 } });
//! viewport.handle({ type: 'wheel', deltaY: e.deltaY });
//! if (viewport.take_redraw()) draw(viewport.transform());
//! ```

use portrait_core::transform::{
    CropConfig, DragTarget, InputEvent, Point, TransformState, ViewportController,
};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

use crate::types::js_error;

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct JsPoint {
    x: f64,
    y: f64,
}

impl From<JsPoint> for Point {
    fn from(p: JsPoint) -> Self {
        Point::new(p.x, p.y)
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum JsDragTarget {
    #[default]
    Background,
    ResizeHandle,
}

/// Event object accepted from JavaScript.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub(crate) enum JsInputEvent {
    PointerDown {
        x: f64,
        y: f64,
        #[serde(default)]
        target: JsDragTarget,
    },
    PointerMove {
        x: f64,
        y: f64,
    },
    PinchStart {
        a: JsPoint,
        b: JsPoint,
    },
    PinchMove {
        a: JsPoint,
        b: JsPoint,
    },
    PointerUp,
    Wheel {
        delta_y: f64,
    },
}

impl From<JsInputEvent> for InputEvent {
    fn from(event: JsInputEvent) -> Self {
        match event {
            JsInputEvent::PointerDown { x, y, target } => InputEvent::PointerDown {
                target: match target {
                    JsDragTarget::Background => DragTarget::Background,
                    JsDragTarget::ResizeHandle => DragTarget::ResizeHandle,
                },
                at: Point::new(x, y),
            },
            JsInputEvent::PointerMove { x, y } => InputEvent::PointerMove {
                at: Point::new(x, y),
            },
            JsInputEvent::PinchStart { a, b } => InputEvent::PinchStart {
                a: a.into(),
                b: b.into(),
            },
            JsInputEvent::PinchMove { a, b } => InputEvent::PinchMove {
                a: a.into(),
                b: b.into(),
            },
            JsInputEvent::PointerUp => InputEvent::PointerUp,
            JsInputEvent::Wheel { delta_y } => InputEvent::Wheel { delta_y },
        }
    }
}

/// Parse a JS event object into a core input event.
pub(crate) fn parse_event(value: JsValue) -> Result<InputEvent, JsValue> {
    let event: JsInputEvent = serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Invalid input event: {}", e)))?;
    Ok(event.into())
}

/// Parse an optional crop config (`null`/`undefined` means none).
pub(crate) fn parse_crop(value: JsValue) -> Result<Option<CropConfig>, JsValue> {
    if value.is_null() || value.is_undefined() {
        return Ok(None);
    }
    serde_wasm_bindgen::from_value(value)
        .map(|crop: CropConfig| Some(crop.clamped()))
        .map_err(|e| JsValue::from_str(&format!("Invalid crop config: {}", e)))
}

/// Serialize a crop config (`null` for none).
pub(crate) fn crop_to_js(crop: Option<&CropConfig>) -> Result<JsValue, JsValue> {
    match crop {
        Some(crop) => serde_wasm_bindgen::to_value(crop).map_err(js_error),
        None => Ok(JsValue::NULL),
    }
}

/// A standalone crop view controller.
///
/// Sessions own their own controller; this type serves hosts that drive the
/// crop view without a [`crate::JsSession`].
#[wasm_bindgen]
pub struct JsViewport {
    inner: ViewportController,
}

#[wasm_bindgen]
impl JsViewport {
    /// Create a controller seeded from a crop config object, or the defaults
    /// when `initial` is `null`/`undefined`.
    #[wasm_bindgen(constructor)]
    pub fn new(initial: JsValue) -> Result<JsViewport, JsValue> {
        let crop = parse_crop(initial)?;
        Ok(Self::seeded(crop.as_ref()))
    }

    /// Feed an event object.
    pub fn handle(&mut self, event: JsValue) -> Result<(), JsValue> {
        self.inner.handle(parse_event(event)?);
        Ok(())
    }

    pub fn pointer_down(&mut self, x: f64, y: f64, on_handle: bool) {
        let target = if on_handle {
            DragTarget::ResizeHandle
        } else {
            DragTarget::Background
        };
        self.inner.handle(InputEvent::PointerDown {
            target,
            at: Point::new(x, y),
        });
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.inner.handle(InputEvent::PointerMove {
            at: Point::new(x, y),
        });
    }

    pub fn pointer_up(&mut self) {
        self.inner.handle(InputEvent::PointerUp);
    }

    pub fn pinch_start(&mut self, ax: f64, ay: f64, bx: f64, by: f64) {
        self.inner.handle(InputEvent::PinchStart {
            a: Point::new(ax, ay),
            b: Point::new(bx, by),
        });
    }

    pub fn pinch_move(&mut self, ax: f64, ay: f64, bx: f64, by: f64) {
        self.inner.handle(InputEvent::PinchMove {
            a: Point::new(ax, ay),
            b: Point::new(bx, by),
        });
    }

    pub fn wheel(&mut self, delta_y: f64) {
        self.inner.handle(InputEvent::Wheel { delta_y });
    }

    /// Zoom slider (clamped to 0.1-3.0).
    pub fn set_zoom(&mut self, scale: f64) {
        self.inner.set_slider_scale(scale);
    }

    /// Rotation control (snapped to 0.5°, clamped to ±30°).
    pub fn set_rotation(&mut self, degrees: f64) {
        self.inner.set_rotation(degrees);
    }

    pub fn step_rotation(&mut self, steps: i32) {
        self.inner.step_rotation(steps);
    }

    pub fn fit(&mut self) {
        self.inner.fit();
    }

    pub fn fill(&mut self) {
        self.inner.fill();
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }

    /// Whether the view changed since the last call.
    pub fn take_redraw(&mut self) -> bool {
        self.inner.take_redraw()
    }

    #[wasm_bindgen(getter)]
    pub fn scale(&self) -> f64 {
        self.inner.transform().scale
    }

    #[wasm_bindgen(getter)]
    pub fn offset_x(&self) -> f64 {
        self.inner.transform().offset_x
    }

    #[wasm_bindgen(getter)]
    pub fn offset_y(&self) -> f64 {
        self.inner.transform().offset_y
    }

    #[wasm_bindgen(getter)]
    pub fn rotation(&self) -> f64 {
        self.inner.transform().rotation
    }

    /// True when no gesture is in progress.
    pub fn is_idle(&self) -> bool {
        self.inner.gesture().is_idle()
    }

    /// Current values as a crop config object.
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        crop_to_js(Some(&self.inner.transform().snapshot()))
    }
}

impl JsViewport {
    pub(crate) fn seeded(crop: Option<&CropConfig>) -> Self {
        Self {
            inner: ViewportController::new(TransformState::seeded(crop)),
        }
    }
}
