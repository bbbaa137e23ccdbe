//! Workflow session bindings.
//!
//! [`JsSession`] wraps the core session. Edits use the ticket protocol: the
//! host starts an edit, awaits the edit service with the returned request and
//! hands the answer back with the ticket id.
//!
//! ```typescript
//! const request = session.begin_background_edit('soft_blue');
//! if (request) {
//!   try {
//!     const bytes = await callEditService(request.base, request.description);
//!     session.complete_edit_bytes(request.id, bytes);
//!   } catch (e) {
//!     session.fail_edit(request.id, String(e));
//!   }
//! }
//! render(session.render_preview());
//! ```

use portrait_core::decode::decode_image_no_orientation;
use portrait_core::transform::{InputEvent, Size};
use portrait_core::{
    BackgroundOption, ClothingOption, ConfirmOutcome, CropStage, DecodedImage, EditAction,
    EditError, EditKind, EditRequest, Session, SessionError, Stage, StudioConfig,
};
use wasm_bindgen::prelude::*;

use crate::render::JsCropLayout;
use crate::types::{js_error, JsDecodedImage};
use crate::viewport::{crop_to_js, parse_event};

/// Largest id JavaScript numbers carry exactly.
const MAX_SAFE_ID: f64 = 9_007_199_254_740_991.0;

/// Stable name for a session stage, as seen by JavaScript.
fn stage_name(stage: Stage) -> &'static str {
    match stage {
        Stage::Upload => "upload",
        Stage::Cropping(CropStage::Initial) => "cropping_initial",
        Stage::Cropping(CropStage::Final) => "cropping_final",
        Stage::Editing => "editing",
    }
}

/// Error name for a session error, set on the thrown `Error`.
fn error_name(err: &SessionError) -> &'static str {
    match err {
        SessionError::NoSource => "NoSource",
        SessionError::NoInitialCrop => "NoInitialCrop",
        SessionError::WrongStage { .. } => "WrongStage",
        SessionError::EditInFlight => "EditInFlight",
        SessionError::StaleEdit(_) => "StaleEdit",
        SessionError::EditFailed { .. } => "EditFailed",
        SessionError::Decode(_) => "DecodeError",
        SessionError::Encode(_) => "EncodeError",
    }
}

fn session_error(err: SessionError) -> JsValue {
    let js = js_sys::Error::new(&err.to_string());
    js.set_name(error_name(&err));
    js.into()
}

/// Convert a ticket id received from JavaScript.
fn ticket_id(id: f64) -> Result<u64, String> {
    if id.fract() != 0.0 || !(0.0..=MAX_SAFE_ID).contains(&id) {
        return Err(format!("Invalid edit id: {}", id));
    }
    Ok(id as u64)
}

fn parse_kind(kind: &str, option: &str) -> Result<EditKind, String> {
    match kind {
        "background" => option
            .parse::<BackgroundOption>()
            .map(EditKind::Background)
            .map_err(|e| e.to_string()),
        "clothing" => option
            .parse::<ClothingOption>()
            .map(EditKind::Clothing)
            .map_err(|e| e.to_string()),
        other => Err(format!("Unknown edit kind: {}", other)),
    }
}

/// An edit the host must run through the edit service.
#[wasm_bindgen]
pub struct JsEditRequest {
    inner: EditRequest,
}

#[wasm_bindgen]
impl JsEditRequest {
    /// Ticket id to pass back to `complete_edit` or `fail_edit`.
    #[wasm_bindgen(getter)]
    pub fn id(&self) -> f64 {
        self.inner.id as f64
    }

    /// `"background"` or `"clothing"`.
    #[wasm_bindgen(getter)]
    pub fn kind(&self) -> String {
        match self.inner.kind {
            EditKind::Background(_) => "background".to_string(),
            EditKind::Clothing(_) => "clothing".to_string(),
        }
    }

    /// The selected option, e.g. `"soft_blue"`.
    #[wasm_bindgen(getter)]
    pub fn option(&self) -> String {
        match self.inner.kind {
            EditKind::Background(option) => option.as_str().to_string(),
            EditKind::Clothing(option) => option.as_str().to_string(),
        }
    }

    /// Instruction text for the edit service.
    #[wasm_bindgen(getter)]
    pub fn description(&self) -> Option<String> {
        self.inner.kind.description().map(str::to_string)
    }

    /// The image to edit.
    #[wasm_bindgen(getter)]
    pub fn base(&self) -> JsDecodedImage {
        JsDecodedImage::from_decoded(self.inner.base.clone())
    }
}

/// One subject's trip through the studio.
#[wasm_bindgen]
#[derive(Default)]
pub struct JsSession {
    inner: Session,
}

#[wasm_bindgen]
impl JsSession {
    /// Create a session. `config` may be `undefined` for the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<JsSession, JsValue> {
        let config: StudioConfig = if config.is_null() || config.is_undefined() {
            StudioConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?
        };
        Ok(JsSession {
            inner: Session::new(config),
        })
    }

    /// `"upload"`, `"cropping_initial"`, `"cropping_final"` or `"editing"`.
    #[wasm_bindgen(getter)]
    pub fn stage(&self) -> String {
        stage_name(self.inner.stage()).to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn subject_name(&self) -> String {
        self.inner.subject_name().to_string()
    }

    pub fn set_subject_name(&mut self, name: &str) {
        self.inner.set_subject_name(name);
    }

    // ===== Upload and crop =====

    /// Start over with a decoded upload and open the initial crop.
    pub fn upload(&mut self, image: &JsDecodedImage) -> Result<(), JsValue> {
        let decoded = image.to_decoded()?;
        self.inner.upload(decoded).map_err(session_error)
    }

    /// Decode `bytes` and upload them.
    pub fn upload_bytes(&mut self, bytes: &[u8]) -> Result<(), JsValue> {
        self.inner.upload_bytes(bytes).map_err(session_error)
    }

    pub fn return_to_upload(&mut self) -> Result<(), JsValue> {
        self.inner.return_to_upload().map_err(session_error)
    }

    pub fn begin_initial_crop(&mut self) -> Result<(), JsValue> {
        self.inner.begin_initial_crop().map_err(session_error)
    }

    pub fn begin_final_crop(&mut self) -> Result<(), JsValue> {
        self.inner.begin_final_crop().map_err(session_error)
    }

    /// Image shown in the open crop view.
    pub fn crop_source(&self) -> Option<JsDecodedImage> {
        self.inner
            .crop_source()
            .cloned()
            .map(JsDecodedImage::from_decoded)
    }

    /// Layout of the open crop view inside a container of the given size.
    pub fn crop_layout(&self, container_width: f64, container_height: f64) -> Option<JsCropLayout> {
        self.inner
            .crop_layout(Size::new(container_width, container_height))
            .map(JsCropLayout::from_layout)
    }

    /// Store the open crop.
    ///
    /// Returns `false` while the container has not been laid out; call again
    /// once it has.
    pub fn confirm_crop(
        &mut self,
        container_width: f64,
        container_height: f64,
    ) -> Result<bool, JsValue> {
        let outcome = self
            .inner
            .confirm_crop(Size::new(container_width, container_height))
            .map_err(session_error)?;
        Ok(outcome == ConfirmOutcome::Confirmed)
    }

    pub fn cancel_crop(&mut self) -> Result<(), JsValue> {
        self.inner.cancel_crop().map_err(session_error)
    }

    // ===== Crop view input =====

    /// Feed one input event object to the open crop view.
    pub fn handle_input(&mut self, event: JsValue) -> Result<(), JsValue> {
        let event = parse_event(event)?;
        self.apply_input(event)
    }

    pub fn set_zoom(&mut self, scale: f64) -> Result<(), JsValue> {
        self.viewport(|viewport| viewport.set_slider_scale(scale))
    }

    pub fn set_rotation(&mut self, degrees: f64) -> Result<(), JsValue> {
        self.viewport(|viewport| viewport.set_rotation(degrees))
    }

    pub fn step_rotation(&mut self, steps: i32) -> Result<(), JsValue> {
        self.viewport(|viewport| viewport.step_rotation(steps))
    }

    pub fn fit(&mut self) -> Result<(), JsValue> {
        self.viewport(|viewport| viewport.fit())
    }

    pub fn fill(&mut self) -> Result<(), JsValue> {
        self.viewport(|viewport| viewport.fill())
    }

    pub fn reset_view(&mut self) -> Result<(), JsValue> {
        self.viewport(|viewport| viewport.reset())
    }

    /// True once after each change to the crop transform.
    pub fn take_redraw(&mut self) -> bool {
        self.inner
            .viewport_mut()
            .map(|viewport| viewport.take_redraw())
            .unwrap_or(false)
    }

    /// Live transform of the open crop view, or `null`.
    pub fn crop_transform(&self) -> Result<JsValue, JsValue> {
        let snapshot = self
            .inner
            .viewport()
            .map(|viewport| viewport.transform().snapshot());
        crop_to_js(snapshot.as_ref())
    }

    // ===== Edits =====

    /// Start a background edit. Returns `undefined` when the choice was a
    /// reset that has already been applied.
    pub fn begin_background_edit(
        &mut self,
        option: &str,
    ) -> Result<Option<JsEditRequest>, JsValue> {
        self.begin_edit("background", option)
    }

    /// Start a clothing edit. Returns `undefined` when the choice was a
    /// reset that has already been applied.
    pub fn begin_clothing_edit(&mut self, option: &str) -> Result<Option<JsEditRequest>, JsValue> {
        self.begin_edit("clothing", option)
    }

    /// Start an edit of `kind` (`"background"` or `"clothing"`).
    pub fn begin_edit(
        &mut self,
        kind: &str,
        option: &str,
    ) -> Result<Option<JsEditRequest>, JsValue> {
        let kind = parse_kind(kind, option).map_err(|e| JsValue::from_str(&e))?;
        match self.inner.begin_edit(kind).map_err(session_error)? {
            EditAction::Reset => Ok(None),
            EditAction::Request(inner) => Ok(Some(JsEditRequest { inner })),
        }
    }

    /// Complete ticket `id` with a decoded result.
    pub fn complete_edit(&mut self, id: f64, image: &JsDecodedImage) -> Result<(), JsValue> {
        let id = ticket_id(id).map_err(|e| JsValue::from_str(&e))?;
        let result = image
            .to_decoded()
            .map_err(|_| EditError::Decode("pixel buffer does not match dimensions".to_string()));
        self.inner.complete_edit(id, result).map_err(session_error)
    }

    /// Complete ticket `id` with encoded bytes from the edit service.
    pub fn complete_edit_bytes(&mut self, id: f64, bytes: &[u8]) -> Result<(), JsValue> {
        let id = ticket_id(id).map_err(|e| JsValue::from_str(&e))?;
        let result = decode_result(bytes);
        self.inner.complete_edit(id, result).map_err(session_error)
    }

    /// Report that the edit service failed for ticket `id`.
    ///
    /// The session is left as it was before the edit began; the returned
    /// error carries the message.
    pub fn fail_edit(&mut self, id: f64, message: &str) -> Result<(), JsValue> {
        let id = ticket_id(id).map_err(|e| JsValue::from_str(&e))?;
        self.inner
            .complete_edit(id, Err(EditError::Service(message.to_string())))
            .map_err(session_error)
    }

    pub fn reset_to_original(&mut self) -> Result<(), JsValue> {
        self.inner.reset_to_original().map_err(session_error)
    }

    #[wasm_bindgen(getter)]
    pub fn is_edit_pending(&self) -> bool {
        self.inner.is_edit_pending()
    }

    /// Applied options as `{ background, clothing }`.
    pub fn applied(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.inner.applied()).map_err(js_error)
    }

    pub fn initial_crop_config(&self) -> Result<JsValue, JsValue> {
        crop_to_js(self.inner.initial_crop_config())
    }

    pub fn final_crop_config(&self) -> Result<JsValue, JsValue> {
        crop_to_js(self.inner.final_crop_config())
    }

    // ===== Output =====

    pub fn render_preview(&self) -> Result<JsDecodedImage, JsValue> {
        self.inner
            .render_preview()
            .map(JsDecodedImage::from_decoded)
            .map_err(session_error)
    }

    pub fn render_export(&self) -> Result<JsDecodedImage, JsValue> {
        self.inner
            .render_export()
            .map(JsDecodedImage::from_decoded)
            .map_err(session_error)
    }

    pub fn preview_jpeg(&self) -> Result<Vec<u8>, JsValue> {
        self.inner.preview_jpeg().map_err(session_error)
    }

    pub fn export_png(&self) -> Result<Vec<u8>, JsValue> {
        self.inner.export_png().map_err(session_error)
    }

    /// Download name for the export, e.g. `portrait_Ada.png`.
    pub fn export_file_name(&self) -> String {
        self.inner.export_file_name()
    }
}

impl JsSession {
    fn apply_input(&mut self, event: InputEvent) -> Result<(), JsValue> {
        self.viewport(|viewport| viewport.handle(event))
    }

    fn viewport<F>(&mut self, f: F) -> Result<(), JsValue>
    where
        F: FnOnce(&mut portrait_core::ViewportController),
    {
        let stage = self.inner.stage();
        match self.inner.viewport_mut() {
            Some(viewport) => {
                f(viewport);
                Ok(())
            }
            None => Err(session_error(SessionError::WrongStage {
                expected: "cropping",
                actual: stage,
            })),
        }
    }
}

fn decode_result(bytes: &[u8]) -> Result<DecodedImage, EditError> {
    decode_image_no_orientation(bytes).map_err(|e| EditError::Decode(e.to_string()))
}
