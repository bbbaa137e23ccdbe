//! The portrait workflow.
//!
//! A [`Session`] walks one subject through the studio:
//!
//! ```text
//! Upload --upload--> Cropping(Initial) --confirm--> Editing
//!                          ^                          |  ^
//!                          +----begin_initial_crop----+  |
//!                                                     v  |
//!                                  Cropping(Final) --confirm
//! ```
//!
//! Two crops are kept in separate slots. The initial crop frames the subject
//! in the upload and produces the raster every edit starts from. The final
//! crop reframes the edited composite and is applied to previews and exports.
//!
//! Edits run through a begin/complete ticket protocol so the host can await
//! the external editor in between. At most one edit is in flight, and crop
//! stages cannot be entered while it is.

mod edit;

use std::fmt;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::StudioConfig;
use crate::decode::{decode_image, resize_to_fit, DecodeError, DecodedImage, FilterType};
use crate::encode::{encode_jpeg_image, encode_png_image, EncodeError};
use crate::render::{render_composite, render_crop, CompositeRequest, CropRequest, FrameStyle};
use crate::synthesis::{BackgroundOption, ClothingOption, EditError, EditKind, PortraitEditor};
use crate::transform::{CropConfig, CropLayout, PixelSize, Size, TransformState, ViewportController};

pub use edit::{AppliedOptions, EditAction, EditBase, EditRequest};

use edit::{is_reset, PendingEdit};

/// Tolerance for the 3:4 aspect check on edit results.
const ASPECT_TOLERANCE: f64 = 0.01;

/// Which of the two crops is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropStage {
    /// Framing the subject in the upload.
    Initial,
    /// Reframing the edited composite.
    Final,
}

/// Where the session is in the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Upload,
    Cropping(CropStage),
    Editing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Upload => f.write_str("upload"),
            Stage::Cropping(CropStage::Initial) => f.write_str("initial crop"),
            Stage::Cropping(CropStage::Final) => f.write_str("final crop"),
            Stage::Editing => f.write_str("editing"),
        }
    }
}

/// Result of confirming a crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// The crop was stored and the session moved to editing.
    Confirmed,
    /// The crop view has not been laid out yet; nothing changed.
    LayoutPending,
}

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No image has been uploaded yet.
    #[error("No image has been uploaded")]
    NoSource,

    /// The operation needs a confirmed initial crop.
    #[error("No initial crop has been confirmed")]
    NoInitialCrop,

    /// The operation is not available in the current stage.
    #[error("Operation requires the {expected} stage, current stage is {actual}")]
    WrongStage { expected: &'static str, actual: Stage },

    /// Another edit is still waiting for its result.
    #[error("An edit is already in progress")]
    EditInFlight,

    /// A result arrived for a ticket that is not pending.
    #[error("Edit {0} is not pending")]
    StaleEdit(u64),

    /// The collaborator failed; the session is unchanged.
    #[error("Edit {kind} failed: {source}")]
    EditFailed {
        kind: EditKind,
        #[source]
        source: EditError,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// An open crop view.
#[derive(Debug, Clone)]
struct CropSession {
    stage: CropStage,
    viewport: ViewportController,
}

/// One subject's trip through the studio.
#[derive(Debug, Clone)]
pub struct Session {
    config: StudioConfig,
    stage: Stage,
    source: Option<DecodedImage>,
    crop: Option<CropSession>,
    composite_preview: Option<DecodedImage>,
    initial_crop: Option<CropConfig>,
    final_crop: Option<CropConfig>,
    edit_base: Option<EditBase>,
    applied: AppliedOptions,
    pending: Option<PendingEdit>,
    next_edit_id: u64,
    subject_name: String,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(StudioConfig::default())
    }
}

impl Session {
    pub fn new(config: StudioConfig) -> Self {
        Self {
            config: config.sanitized(),
            stage: Stage::Upload,
            source: None,
            crop: None,
            composite_preview: None,
            initial_crop: None,
            final_crop: None,
            edit_base: None,
            applied: AppliedOptions::default(),
            pending: None,
            next_edit_id: 1,
            subject_name: String::new(),
        }
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The uploaded image, after any upload downscaling.
    pub fn source(&self) -> Option<&DecodedImage> {
        self.source.as_ref()
    }

    pub fn initial_crop_config(&self) -> Option<&CropConfig> {
        self.initial_crop.as_ref()
    }

    pub fn final_crop_config(&self) -> Option<&CropConfig> {
        self.final_crop.as_ref()
    }

    pub fn edit_base(&self) -> Option<&EditBase> {
        self.edit_base.as_ref()
    }

    pub fn applied(&self) -> &AppliedOptions {
        &self.applied
    }

    /// Ticket id of the edit in flight, if any.
    pub fn pending_edit(&self) -> Option<u64> {
        self.pending.map(|p| p.id)
    }

    pub fn is_edit_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn subject_name(&self) -> &str {
        &self.subject_name
    }

    pub fn set_subject_name(&mut self, name: impl Into<String>) {
        self.subject_name = name.into();
    }

    // ===== Upload =====

    /// Start over with a new subject.
    ///
    /// Clears both crops, all edits and the subject's options, then opens the
    /// initial crop with default transform values.
    pub fn upload(&mut self, image: DecodedImage) -> Result<(), SessionError> {
        self.ensure_no_pending()?;
        if image.is_empty() {
            return Err(DecodeError::EmptyImage {
                width: image.width,
                height: image.height,
            }
            .into());
        }

        let image = match self.config.max_upload_edge {
            Some(max_edge) => resize_to_fit(&image, max_edge, self.config.export_filter)?,
            None => image,
        };
        info!(width = image.width, height = image.height, "new upload");

        self.source = Some(image);
        self.initial_crop = None;
        self.final_crop = None;
        self.edit_base = None;
        self.composite_preview = None;
        self.applied = AppliedOptions::default();
        self.open_crop(CropStage::Initial, TransformState::new());
        Ok(())
    }

    /// Decode an uploaded file and start over with it.
    pub fn upload_bytes(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        self.ensure_no_pending()?;
        let image = decode_image(bytes)?;
        self.upload(image)
    }

    /// Go back to the upload screen, keeping the current subject.
    pub fn return_to_upload(&mut self) -> Result<(), SessionError> {
        self.ensure_no_pending()?;
        self.crop = None;
        self.composite_preview = None;
        self.set_stage(Stage::Upload);
        Ok(())
    }

    // ===== Cropping =====

    /// Re-open the initial crop, seeded from the stored initial crop.
    ///
    /// Available from the upload and editing stages; an open crop has to be
    /// confirmed or cancelled first.
    pub fn begin_initial_crop(&mut self) -> Result<(), SessionError> {
        self.ensure_no_pending()?;
        if let Stage::Cropping(_) = self.stage {
            return Err(SessionError::WrongStage {
                expected: "upload or editing",
                actual: self.stage,
            });
        }
        if self.source.is_none() {
            return Err(SessionError::NoSource);
        }
        let transform = TransformState::seeded(self.initial_crop.as_ref());
        self.composite_preview = None;
        self.open_crop(CropStage::Initial, transform);
        Ok(())
    }

    /// Open the final crop over a preview composite of the current edit.
    pub fn begin_final_crop(&mut self) -> Result<(), SessionError> {
        self.ensure_no_pending()?;
        if self.stage != Stage::Editing {
            return Err(SessionError::WrongStage {
                expected: "editing",
                actual: self.stage,
            });
        }
        let base = self.edit_base.as_ref().ok_or(SessionError::NoInitialCrop)?;

        // Reframing starts from the unframed composite
        let preview = render_composite(&CompositeRequest {
            base: base.base(),
            output: self.config.preview,
            final_crop: None,
            reference: self.config.preview,
            frame: self.config.preview_frame,
            filter: self.config.preview_filter,
        })?;
        debug!(
            width = preview.width,
            height = preview.height,
            "rendered composite preview"
        );

        self.composite_preview = Some(preview);
        let transform = TransformState::seeded(self.final_crop.as_ref());
        self.open_crop(CropStage::Final, transform);
        Ok(())
    }

    /// Which crop is open, if any.
    pub fn crop_stage(&self) -> Option<CropStage> {
        self.crop.as_ref().map(|c| c.stage)
    }

    pub fn viewport(&self) -> Option<&ViewportController> {
        self.crop.as_ref().map(|c| &c.viewport)
    }

    /// The open crop view's controller, for feeding input.
    pub fn viewport_mut(&mut self) -> Option<&mut ViewportController> {
        self.crop.as_mut().map(|c| &mut c.viewport)
    }

    /// The image shown behind the aperture: the upload for the initial crop,
    /// the composite preview for the final crop.
    pub fn crop_source(&self) -> Option<&DecodedImage> {
        match self.crop.as_ref()?.stage {
            CropStage::Initial => self.source.as_ref(),
            CropStage::Final => self.composite_preview.as_ref(),
        }
    }

    /// Layout of the open crop view inside `container`.
    pub fn crop_layout(&self, container: Size) -> Option<CropLayout> {
        let source = self.crop_source()?;
        let natural = Size::new(source.width as f64, source.height as f64);
        Some(CropLayout::measure(container, natural))
    }

    /// Store the open crop and return to editing.
    ///
    /// `container` is the measured size of the crop view. Until it is known
    /// this returns [`ConfirmOutcome::LayoutPending`] and changes nothing.
    pub fn confirm_crop(&mut self, container: Size) -> Result<ConfirmOutcome, SessionError> {
        let (stage, config) = match self.crop.as_ref() {
            Some(crop) => (crop.stage, crop.viewport.transform().snapshot()),
            None => {
                return Err(SessionError::WrongStage {
                    expected: "cropping",
                    actual: self.stage,
                })
            }
        };
        let layout = match self.crop_layout(container) {
            Some(layout) if layout.is_settled() => layout,
            _ => {
                debug!(?container, "crop layout not settled");
                return Ok(ConfirmOutcome::LayoutPending);
            }
        };

        match stage {
            CropStage::Initial => {
                let source = self.source.as_ref().ok_or(SessionError::NoSource)?;
                let request = CropRequest::from_layout(
                    source,
                    &layout,
                    config,
                    self.config.crop_output,
                    self.config.export_filter,
                );
                let Some(cropped) = render_crop(&request) else {
                    return Ok(ConfirmOutcome::LayoutPending);
                };

                info!(?config, "initial crop confirmed");
                self.initial_crop = Some(config);
                self.edit_base = Some(EditBase::new(cropped));
                self.applied = AppliedOptions::default();
            }
            CropStage::Final => {
                info!(?config, "final crop confirmed");
                self.final_crop = Some(config);
            }
        }

        self.crop = None;
        self.composite_preview = None;
        self.set_stage(Stage::Editing);
        Ok(ConfirmOutcome::Confirmed)
    }

    /// Close the open crop without storing anything.
    pub fn cancel_crop(&mut self) -> Result<(), SessionError> {
        if self.crop.take().is_none() {
            return Err(SessionError::WrongStage {
                expected: "cropping",
                actual: self.stage,
            });
        }
        self.composite_preview = None;
        let next = if self.edit_base.is_some() {
            Stage::Editing
        } else {
            Stage::Upload
        };
        self.set_stage(next);
        Ok(())
    }

    // ===== Edits =====

    pub fn begin_background_edit(
        &mut self,
        option: BackgroundOption,
    ) -> Result<EditAction, SessionError> {
        self.begin_edit(EditKind::Background(option))
    }

    pub fn begin_clothing_edit(
        &mut self,
        option: ClothingOption,
    ) -> Result<EditAction, SessionError> {
        self.begin_edit(EditKind::Clothing(option))
    }

    /// Start an edit.
    ///
    /// Resets are applied immediately. Anything else returns a request the
    /// host runs through the collaborator and hands back to
    /// [`Session::complete_edit`].
    pub fn begin_edit(&mut self, kind: EditKind) -> Result<EditAction, SessionError> {
        if self.stage != Stage::Editing {
            return Err(SessionError::WrongStage {
                expected: "editing",
                actual: self.stage,
            });
        }
        if self.pending.is_some() {
            warn!(%kind, "edit rejected, another edit is in progress");
            return Err(SessionError::EditInFlight);
        }
        let base = self.edit_base.as_mut().ok_or(SessionError::NoInitialCrop)?;

        if is_reset(kind, &self.applied) {
            info!(%kind, "edits reset to the initial crop");
            base.clear_edits();
            self.applied = AppliedOptions::default();
            return Ok(EditAction::Reset);
        }

        let id = self.next_edit_id;
        self.next_edit_id += 1;
        self.pending = Some(PendingEdit { id, kind });
        info!(id, %kind, "edit requested");

        Ok(EditAction::Request(EditRequest {
            id,
            kind,
            base: base.base().clone(),
        }))
    }

    /// Hand back the collaborator's answer for ticket `id`.
    ///
    /// On success the result becomes the new edit base and the option is
    /// recorded. On failure the session is left exactly as before the edit
    /// began and [`SessionError::EditFailed`] is returned.
    pub fn complete_edit(
        &mut self,
        id: u64,
        result: Result<DecodedImage, EditError>,
    ) -> Result<(), SessionError> {
        let pending = match self.pending {
            Some(pending) if pending.id == id => pending,
            _ => {
                warn!(id, "result for an edit that is not pending");
                return Err(SessionError::StaleEdit(id));
            }
        };
        self.pending = None;

        let image = result
            .and_then(|image| {
                if image.is_empty() {
                    Err(EditError::NoImage("empty image".to_string()))
                } else {
                    Ok(image)
                }
            })
            .map_err(|source| {
                warn!(id, kind = %pending.kind, error = %source, "edit failed");
                SessionError::EditFailed {
                    kind: pending.kind,
                    source,
                }
            })?;

        if (image.aspect_ratio() - 0.75).abs() > ASPECT_TOLERANCE {
            warn!(
                width = image.width,
                height = image.height,
                "edit result is not 3:4, it will be stretched"
            );
        }

        let base = self.edit_base.as_mut().ok_or(SessionError::NoInitialCrop)?;
        base.set_edited(image);
        self.applied.record(pending.kind);
        info!(id, kind = %pending.kind, "edit applied");
        Ok(())
    }

    /// Run one edit to completion through `editor`.
    pub fn apply_edit<E>(&mut self, editor: &E, kind: EditKind) -> Result<(), SessionError>
    where
        E: PortraitEditor + ?Sized,
    {
        match self.begin_edit(kind)? {
            EditAction::Reset => Ok(()),
            EditAction::Request(request) => {
                let result = editor.edit(&request.base, request.kind);
                self.complete_edit(request.id, result)
            }
        }
    }

    /// Drop all edits and go back to the initial crop.
    pub fn reset_to_original(&mut self) -> Result<(), SessionError> {
        self.ensure_no_pending()?;
        let base = self.edit_base.as_mut().ok_or(SessionError::NoInitialCrop)?;
        base.clear_edits();
        self.applied = AppliedOptions::default();
        info!("edits reset to the initial crop");
        Ok(())
    }

    // ===== Output =====

    /// Preview composite with the final crop applied.
    pub fn render_preview(&self) -> Result<DecodedImage, SessionError> {
        self.render_at(
            self.config.preview,
            self.config.preview_frame,
            self.config.preview_filter,
        )
    }

    /// Export composite with the final crop applied.
    pub fn render_export(&self) -> Result<DecodedImage, SessionError> {
        self.render_at(
            self.config.export,
            self.config.export_frame,
            self.config.export_filter,
        )
    }

    /// The preview encoded as JPEG.
    pub fn preview_jpeg(&self) -> Result<Vec<u8>, SessionError> {
        let preview = self.render_preview()?;
        Ok(encode_jpeg_image(&preview, self.config.preview_jpeg_quality)?)
    }

    /// The export encoded as PNG.
    pub fn export_png(&self) -> Result<Vec<u8>, SessionError> {
        let export = self.render_export()?;
        info!(
            width = export.width,
            height = export.height,
            "encoding export"
        );
        Ok(encode_png_image(&export)?)
    }

    /// Download name for the export.
    pub fn export_file_name(&self) -> String {
        let name = self.subject_name.trim();
        if name.is_empty() {
            "portrait.png".to_string()
        } else {
            format!("portrait_{}.png", name)
        }
    }

    fn render_at(
        &self,
        output: PixelSize,
        frame: FrameStyle,
        filter: FilterType,
    ) -> Result<DecodedImage, SessionError> {
        let base = self.edit_base.as_ref().ok_or(SessionError::NoInitialCrop)?;
        Ok(render_composite(&CompositeRequest {
            base: base.base(),
            output,
            final_crop: self.final_crop,
            reference: self.config.preview,
            frame,
            filter,
        })?)
    }

    fn open_crop(&mut self, stage: CropStage, transform: TransformState) {
        self.crop = Some(CropSession {
            stage,
            viewport: ViewportController::new(transform),
        });
        self.set_stage(Stage::Cropping(stage));
    }

    fn set_stage(&mut self, stage: Stage) {
        if self.stage != stage {
            info!(from = %self.stage, to = %stage, "stage changed");
        }
        self.stage = stage;
    }

    fn ensure_no_pending(&self) -> Result<(), SessionError> {
        if self.pending.is_some() {
            warn!("rejected while an edit is in progress");
            return Err(SessionError::EditInFlight);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{DragTarget, InputEvent, Point};
    use std::cell::RefCell;

    /// Small sizes keep the tests fast; the geometry is resolution independent.
    fn test_config() -> StudioConfig {
        StudioConfig {
            preview: PixelSize::new(30, 40),
            export: PixelSize::new(90, 120),
            crop_output: PixelSize::new(30, 40),
            preview_frame: FrameStyle::none(),
            export_frame: FrameStyle::none(),
            max_upload_edge: None,
            ..StudioConfig::default()
        }
    }

    fn container() -> Size {
        // 300x400 source lays out at full size, aperture 300x400
        Size::new(500.0, 500.0)
    }

    fn source() -> DecodedImage {
        DecodedImage::filled(300, 400, [200, 180, 160])
    }

    fn confirmed_session() -> Session {
        let mut session = Session::new(test_config());
        session.upload(source()).expect("upload");
        assert_eq!(
            session.confirm_crop(container()).expect("confirm"),
            ConfirmOutcome::Confirmed
        );
        session
    }

    fn color_for(kind: EditKind) -> [u8; 3] {
        match kind {
            EditKind::Background(_) => [0, 0, 255],
            EditKind::Clothing(_) => [0, 255, 0],
        }
    }

    /// Editor that records every base it receives.
    #[derive(Default)]
    struct RecordingEditor {
        seen: RefCell<Vec<DecodedImage>>,
    }

    impl PortraitEditor for RecordingEditor {
        fn edit(&self, base: &DecodedImage, kind: EditKind) -> Result<DecodedImage, EditError> {
            self.seen.borrow_mut().push(base.clone());
            if kind.is_passthrough() {
                return Ok(base.clone());
            }
            Ok(DecodedImage::filled(base.width, base.height, color_for(kind)))
        }
    }

    struct FailingEditor;

    impl PortraitEditor for FailingEditor {
        fn edit(&self, _base: &DecodedImage, _kind: EditKind) -> Result<DecodedImage, EditError> {
            Err(EditError::Service("unavailable".to_string()))
        }
    }

    #[test]
    fn test_upload_opens_initial_crop() {
        let mut session = Session::new(test_config());
        assert_eq!(session.stage(), Stage::Upload);

        session.upload(source()).expect("upload");
        assert_eq!(session.stage(), Stage::Cropping(CropStage::Initial));
        assert_eq!(session.crop_source(), Some(&source()));
        let viewport = session.viewport().expect("crop open");
        assert_eq!(*viewport.transform(), TransformState::default());
    }

    #[test]
    fn test_upload_rejects_empty_image() {
        let mut session = Session::new(test_config());
        let result = session.upload(DecodedImage::new(0, 0, vec![]));
        assert!(matches!(
            result,
            Err(SessionError::Decode(DecodeError::EmptyImage { .. }))
        ));
        assert_eq!(session.stage(), Stage::Upload);
    }

    #[test]
    fn test_upload_downscales_large_images() {
        let mut session = Session::new(StudioConfig {
            max_upload_edge: Some(100),
            ..test_config()
        });
        session.upload(source()).expect("upload");
        let src = session.source().expect("source");
        assert_eq!((src.width, src.height), (75, 100));
    }

    #[test]
    fn test_confirm_waits_for_layout() {
        let mut session = Session::new(test_config());
        session.upload(source()).expect("upload");

        let outcome = session.confirm_crop(Size::new(0.0, 0.0)).expect("confirm");
        assert_eq!(outcome, ConfirmOutcome::LayoutPending);
        assert_eq!(session.stage(), Stage::Cropping(CropStage::Initial));
        assert!(session.initial_crop_config().is_none());
    }

    #[test]
    fn test_confirm_initial_crop() {
        let session = confirmed_session();
        assert_eq!(session.stage(), Stage::Editing);
        assert_eq!(
            session.initial_crop_config(),
            Some(&TransformState::default().snapshot())
        );

        let base = session.edit_base().expect("edit base");
        assert_eq!(base.base().width, 30);
        assert_eq!(base.base().height, 40);
        // Default scale 0.8 leaves a black border around the subject
        assert_eq!(base.base().pixel(0, 0), [0, 0, 0]);
        assert_eq!(base.base().pixel(15, 20), [200, 180, 160]);
    }

    #[test]
    fn test_cancel_preserves_stored_crop() {
        let mut session = Session::new(test_config());
        session.upload(source()).expect("upload");
        {
            let viewport = session.viewport_mut().expect("crop open");
            viewport.handle(InputEvent::PointerDown {
                target: DragTarget::Background,
                at: Point::new(0.0, 0.0),
            });
            viewport.handle(InputEvent::PointerMove {
                at: Point::new(12.0, -8.0),
            });
            viewport.handle(InputEvent::PointerUp);
        }
        session.confirm_crop(container()).expect("confirm");
        let stored = *session.initial_crop_config().expect("stored");

        session.begin_initial_crop().expect("reopen");
        assert_eq!(
            session.viewport().expect("crop open").transform().snapshot(),
            stored
        );
        {
            let viewport = session.viewport_mut().expect("crop open");
            viewport.handle(InputEvent::Wheel { delta_y: -1.0 });
            viewport.set_rotation(12.0);
        }
        session.cancel_crop().expect("cancel");

        assert_eq!(session.stage(), Stage::Editing);
        assert_eq!(session.initial_crop_config(), Some(&stored));
    }

    #[test]
    fn test_cancel_without_initial_crop_returns_to_upload() {
        let mut session = Session::new(test_config());
        session.upload(source()).expect("upload");
        session.cancel_crop().expect("cancel");
        assert_eq!(session.stage(), Stage::Upload);
        assert!(session.viewport().is_none());
    }

    #[test]
    fn test_cancel_outside_cropping_is_error() {
        let mut session = confirmed_session();
        assert!(matches!(
            session.cancel_crop(),
            Err(SessionError::WrongStage { .. })
        ));
    }

    #[test]
    fn test_edit_chaining() {
        let mut session = confirmed_session();
        let initial = session.edit_base().expect("base").initial_crop().clone();
        let editor = RecordingEditor::default();

        session
            .apply_edit(&editor, EditKind::Background(BackgroundOption::SoftBlue))
            .expect("background");
        let after_bg = session.edit_base().expect("base").base().clone();
        assert_eq!(after_bg.pixel(0, 0), [0, 0, 255]);

        session
            .apply_edit(&editor, EditKind::Clothing(ClothingOption::MensSuitBlack))
            .expect("clothing");

        // Clothing was applied on top of the background result
        let seen = editor.seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], initial);
        assert_eq!(seen[1], after_bg);
        drop(seen);

        assert_eq!(
            *session.applied(),
            AppliedOptions {
                background: BackgroundOption::SoftBlue,
                clothing: ClothingOption::MensSuitBlack,
            }
        );

        // Removing the background resets the whole chain
        let action = session
            .begin_background_edit(BackgroundOption::None)
            .expect("reset");
        assert_eq!(action, EditAction::Reset);
        assert!(session.applied().is_unedited());
        assert_eq!(session.edit_base().expect("base").base(), &initial);
    }

    #[test]
    fn test_background_reset_with_clothing_unset() {
        let mut session = confirmed_session();
        let initial = session.edit_base().expect("base").initial_crop().clone();
        let editor = RecordingEditor::default();

        session
            .apply_edit(&editor, EditKind::Background(BackgroundOption::WhiteGrey))
            .expect("background");
        session
            .apply_edit(&editor, EditKind::Background(BackgroundOption::None))
            .expect("reset");

        assert!(session.applied().is_unedited());
        assert_eq!(session.edit_base().expect("base").base(), &initial);
        // The reset never reached the editor
        assert_eq!(editor.seen.borrow().len(), 1);
    }

    #[test]
    fn test_clothing_none_with_background_asks_editor() {
        let mut session = confirmed_session();
        session
            .apply_edit(
                &RecordingEditor::default(),
                EditKind::Background(BackgroundOption::SoftPink),
            )
            .expect("background");

        let action = session
            .begin_clothing_edit(ClothingOption::None)
            .expect("request");
        assert!(matches!(action, EditAction::Request(_)));
    }

    #[test]
    fn test_clothing_none_without_background_resets() {
        let mut session = confirmed_session();
        let action = session
            .begin_clothing_edit(ClothingOption::None)
            .expect("reset");
        assert_eq!(action, EditAction::Reset);
    }

    #[test]
    fn test_failed_edit_rolls_back() {
        let mut session = confirmed_session();
        session
            .apply_edit(
                &RecordingEditor::default(),
                EditKind::Background(BackgroundOption::FreshGreen),
            )
            .expect("background");
        let before_base = session.edit_base().cloned();
        let before_applied = *session.applied();

        let err = session
            .apply_edit(
                &FailingEditor,
                EditKind::Clothing(ClothingOption::WomensKimonoColor),
            )
            .unwrap_err();

        assert!(matches!(err, SessionError::EditFailed { .. }));
        assert_eq!(session.edit_base().cloned(), before_base);
        assert_eq!(*session.applied(), before_applied);
        assert!(!session.is_edit_pending());
    }

    #[test]
    fn test_empty_edit_result_is_failure() {
        let mut session = confirmed_session();
        let EditAction::Request(request) = session
            .begin_background_edit(BackgroundOption::SoftBlue)
            .expect("request")
        else {
            panic!("expected a request");
        };
        let err = session
            .complete_edit(request.id, Ok(DecodedImage::new(0, 0, vec![])))
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::EditFailed {
                source: EditError::NoImage(_),
                ..
            }
        ));
        assert!(session.applied().is_unedited());
    }

    #[test]
    fn test_one_edit_in_flight() {
        let mut session = confirmed_session();
        let EditAction::Request(request) = session
            .begin_background_edit(BackgroundOption::SoftBlue)
            .expect("request")
        else {
            panic!("expected a request");
        };

        assert!(matches!(
            session.begin_clothing_edit(ClothingOption::MensKimono),
            Err(SessionError::EditInFlight)
        ));
        assert!(matches!(
            session.begin_final_crop(),
            Err(SessionError::EditInFlight)
        ));
        assert!(matches!(
            session.begin_initial_crop(),
            Err(SessionError::EditInFlight)
        ));
        assert!(matches!(
            session.complete_edit(request.id + 1, Ok(request.base.clone())),
            Err(SessionError::StaleEdit(_))
        ));

        let edited = DecodedImage::filled(30, 40, [1, 2, 3]);
        session
            .complete_edit(request.id, Ok(edited.clone()))
            .expect("complete");
        assert_eq!(session.edit_base().expect("base").base(), &edited);
        assert_eq!(session.applied().background, BackgroundOption::SoftBlue);

        // Completing twice is stale
        assert!(matches!(
            session.complete_edit(request.id, Ok(edited)),
            Err(SessionError::StaleEdit(_))
        ));
    }

    #[test]
    fn test_edits_only_while_editing() {
        let mut session = Session::new(test_config());
        session.upload(source()).expect("upload");
        assert!(matches!(
            session.begin_background_edit(BackgroundOption::SoftBlue),
            Err(SessionError::WrongStage { .. })
        ));
    }

    #[test]
    fn test_final_crop_flow() {
        let mut session = confirmed_session();
        assert!(session.final_crop_config().is_none());

        session.begin_final_crop().expect("final crop");
        assert_eq!(session.stage(), Stage::Cropping(CropStage::Final));
        let preview = session.crop_source().expect("composite preview");
        assert_eq!((preview.width, preview.height), (30, 40));

        session
            .viewport_mut()
            .expect("crop open")
            .set_slider_scale(1.5);
        // 30x40 composite inside a 500x500 view is not upscaled
        assert_eq!(
            session.confirm_crop(container()).expect("confirm"),
            ConfirmOutcome::Confirmed
        );
        assert_eq!(session.final_crop_config().map(|c| c.scale), Some(1.5));
        assert_eq!(session.stage(), Stage::Editing);
    }

    #[test]
    fn test_final_crop_only_from_editing() {
        let mut session = confirmed_session();
        session.begin_initial_crop().expect("initial crop");
        assert!(matches!(
            session.begin_final_crop(),
            Err(SessionError::WrongStage {
                actual: Stage::Cropping(CropStage::Initial),
                ..
            })
        ));
        // The open initial crop is untouched
        assert_eq!(session.crop_stage(), Some(CropStage::Initial));

        session.cancel_crop().expect("cancel");
        session.return_to_upload().expect("upload screen");
        assert!(matches!(
            session.begin_final_crop(),
            Err(SessionError::WrongStage {
                actual: Stage::Upload,
                ..
            })
        ));
        assert_eq!(session.stage(), Stage::Upload);
    }

    #[test]
    fn test_initial_crop_refused_while_a_crop_is_open() {
        let mut session = confirmed_session();
        session.begin_final_crop().expect("final crop");
        session
            .viewport_mut()
            .expect("crop open")
            .set_slider_scale(2.0);

        assert!(matches!(
            session.begin_initial_crop(),
            Err(SessionError::WrongStage { .. })
        ));
        assert_eq!(session.crop_stage(), Some(CropStage::Final));
        assert_eq!(
            session.viewport().expect("crop open").transform().scale,
            2.0
        );

        // Fresh uploads open directly into the initial crop
        let mut session = Session::new(test_config());
        session.upload(source()).expect("upload");
        assert!(session.begin_initial_crop().is_err());
    }

    #[test]
    fn test_initial_crop_from_upload_screen() {
        let mut session = confirmed_session();
        session.return_to_upload().expect("upload screen");
        session.begin_initial_crop().expect("initial crop");
        assert_eq!(session.stage(), Stage::Cropping(CropStage::Initial));
    }

    #[test]
    fn test_final_crop_survives_initial_recrop() {
        let mut session = confirmed_session();
        session.begin_final_crop().expect("final crop");
        session
            .viewport_mut()
            .expect("crop open")
            .set_slider_scale(0.5);
        session.confirm_crop(container()).expect("confirm");
        let final_crop = *session.final_crop_config().expect("final");

        session.begin_initial_crop().expect("initial crop");
        session
            .viewport_mut()
            .expect("crop open")
            .set_slider_scale(1.2);
        session.confirm_crop(container()).expect("confirm");

        assert_eq!(session.final_crop_config(), Some(&final_crop));
        assert_eq!(session.initial_crop_config().map(|c| c.scale), Some(1.2));
    }

    #[test]
    fn test_final_crop_reopens_seeded() {
        let mut session = confirmed_session();
        session.begin_final_crop().expect("final crop");
        session
            .viewport_mut()
            .expect("crop open")
            .set_rotation(4.5);
        session.confirm_crop(container()).expect("confirm");

        session.begin_final_crop().expect("final crop");
        let transform = *session.viewport().expect("crop open").transform();
        assert_eq!(transform.rotation, 4.5);
    }

    #[test]
    fn test_initial_recrop_resets_edits() {
        let mut session = confirmed_session();
        session
            .apply_edit(
                &RecordingEditor::default(),
                EditKind::Background(BackgroundOption::SoftBlue),
            )
            .expect("background");

        session.begin_initial_crop().expect("initial crop");
        session.confirm_crop(container()).expect("confirm");
        assert!(session.applied().is_unedited());
        assert!(!session.edit_base().expect("base").is_edited());
    }

    #[test]
    fn test_render_preview_applies_final_crop() {
        let mut session = Session::new(StudioConfig {
            crop_output: PixelSize::new(30, 40),
            ..test_config()
        });
        session.upload(DecodedImage::filled(300, 400, [250, 250, 250])).expect("upload");
        session.viewport_mut().expect("crop open").set_slider_scale(1.0);
        session.confirm_crop(container()).expect("confirm");

        let plain = session.render_preview().expect("preview");
        assert_eq!(plain.pixel(2, 2), [250, 250, 250]);

        session.begin_final_crop().expect("final crop");
        session
            .viewport_mut()
            .expect("crop open")
            .set_slider_scale(0.5);
        session.confirm_crop(container()).expect("confirm");

        let cropped = session.render_preview().expect("preview");
        assert_eq!(cropped.pixel(2, 2), [0, 0, 0]);
        assert_eq!(cropped.pixel(15, 20), [250, 250, 250]);

        let export = session.render_export().expect("export");
        assert_eq!((export.width, export.height), (90, 120));
        assert_eq!(export.pixel(6, 6), [0, 0, 0]);
        assert_eq!(export.pixel(45, 60), [250, 250, 250]);
    }

    #[test]
    fn test_render_requires_initial_crop() {
        let mut session = Session::new(test_config());
        assert!(matches!(
            session.render_preview(),
            Err(SessionError::NoInitialCrop)
        ));
        session.upload(source()).expect("upload");
        assert!(matches!(
            session.export_png(),
            Err(SessionError::NoInitialCrop)
        ));
    }

    #[test]
    fn test_export_png_is_png() {
        let session = confirmed_session();
        let png = session.export_png().expect("png");
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let jpeg = session.preview_jpeg().expect("jpeg");
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_export_file_name() {
        let mut session = Session::default();
        assert_eq!(session.export_file_name(), "portrait.png");
        session.set_subject_name("  ");
        assert_eq!(session.export_file_name(), "portrait.png");
        session.set_subject_name("Hanako");
        assert_eq!(session.export_file_name(), "portrait_Hanako.png");
    }

    #[test]
    fn test_return_to_upload_keeps_subject() {
        let mut session = confirmed_session();
        session.return_to_upload().expect("upload screen");
        assert_eq!(session.stage(), Stage::Upload);
        assert!(session.initial_crop_config().is_some());
        assert!(session.render_preview().is_ok());

        // A new upload starts over
        session.upload(source()).expect("upload");
        assert!(session.initial_crop_config().is_none());
        assert!(session.edit_base().is_none());
    }

    #[test]
    fn test_reset_to_original() {
        let mut session = confirmed_session();
        session
            .apply_edit(
                &RecordingEditor::default(),
                EditKind::Clothing(ClothingOption::MensSuitNavy),
            )
            .expect("clothing");
        session.reset_to_original().expect("reset");
        assert!(session.applied().is_unedited());
        assert!(!session.edit_base().expect("base").is_edited());
    }
}
