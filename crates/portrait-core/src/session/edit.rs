//! The chain of AI edits on top of the initial crop.

use crate::decode::DecodedImage;
use crate::synthesis::{BackgroundOption, ClothingOption, EditKind};

/// The image edits start from.
///
/// Each edit takes [`EditBase::base`] as input and its result becomes the new
/// edited image, so a clothing change applies on top of a background change
/// and vice versa. Clearing the edits falls back to the initial crop.
#[derive(Debug, Clone, PartialEq)]
pub struct EditBase {
    initial_crop: DecodedImage,
    current_edited: Option<DecodedImage>,
}

impl EditBase {
    pub fn new(initial_crop: DecodedImage) -> Self {
        Self {
            initial_crop,
            current_edited: None,
        }
    }

    /// The latest edited image, or the initial crop if nothing was edited.
    pub fn base(&self) -> &DecodedImage {
        self.current_edited.as_ref().unwrap_or(&self.initial_crop)
    }

    pub fn initial_crop(&self) -> &DecodedImage {
        &self.initial_crop
    }

    pub fn current_edited(&self) -> Option<&DecodedImage> {
        self.current_edited.as_ref()
    }

    pub fn is_edited(&self) -> bool {
        self.current_edited.is_some()
    }

    pub(crate) fn set_edited(&mut self, image: DecodedImage) {
        self.current_edited = Some(image);
    }

    pub(crate) fn clear_edits(&mut self) {
        self.current_edited = None;
    }
}

/// Which options the current edited image carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct AppliedOptions {
    pub background: BackgroundOption,
    pub clothing: ClothingOption,
}

impl AppliedOptions {
    pub fn is_unedited(&self) -> bool {
        self.background.is_none() && self.clothing.is_none()
    }

    pub(crate) fn record(&mut self, kind: EditKind) {
        match kind {
            EditKind::Background(option) => self.background = option,
            EditKind::Clothing(option) => self.clothing = option,
        }
    }
}

/// A ticket for one edit the host must run through the collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct EditRequest {
    /// Ticket id to hand back to [`super::Session::complete_edit`].
    pub id: u64,
    pub kind: EditKind,
    /// Snapshot of the image to edit.
    pub base: DecodedImage,
}

/// What starting an edit resulted in.
#[derive(Debug, Clone, PartialEq)]
pub enum EditAction {
    /// The edit was a reset and has already been applied.
    Reset,
    /// The host must run the request and complete it.
    Request(EditRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingEdit {
    pub id: u64,
    pub kind: EditKind,
}

/// Whether choosing `kind` with `applied` options clears the edit chain
/// instead of asking the collaborator.
pub(crate) fn is_reset(kind: EditKind, applied: &AppliedOptions) -> bool {
    match kind {
        EditKind::Background(option) => option.is_none(),
        // Removing attire without a background means going back to the crop
        EditKind::Clothing(option) => option.is_none() && applied.background.is_none(),
    }
}
