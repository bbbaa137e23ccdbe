//! The seam to the external image-editing collaborator.
//!
//! Backgrounds and attire are synthesized by an external service that takes
//! an image and returns an edited image. This module defines the options the
//! user can pick, the request kinds and the [`PortraitEditor`] trait the
//! session drives. Nothing here talks to a network.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::DecodedImage;

/// Error reported by the collaborator for a failed edit.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EditError {
    /// The service answered but returned no image.
    #[error("No image in edit result: {0}")]
    NoImage(String),

    /// The service could not be reached or rejected the request.
    #[error("Edit service failed: {0}")]
    Service(String),

    /// The returned image could not be decoded.
    #[error("Edit result could not be decoded: {0}")]
    Decode(String),
}

/// Error for an option name that does not match any variant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown {kind} option: {value}")]
pub struct UnknownOption {
    pub kind: &'static str,
    pub value: String,
}

/// Studio background colours. `None` means no background has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundOption {
    #[default]
    None,
    SoftBlue,
    SoftPink,
    WisteriaPurple,
    FreshGreen,
    WhiteGrey,
}

impl BackgroundOption {
    pub const ALL: [BackgroundOption; 6] = [
        BackgroundOption::None,
        BackgroundOption::SoftBlue,
        BackgroundOption::SoftPink,
        BackgroundOption::WisteriaPurple,
        BackgroundOption::FreshGreen,
        BackgroundOption::WhiteGrey,
    ];

    pub fn is_none(self) -> bool {
        self == BackgroundOption::None
    }

    /// Stable identifier, identical to the serde name.
    pub fn as_str(self) -> &'static str {
        match self {
            BackgroundOption::None => "none",
            BackgroundOption::SoftBlue => "soft_blue",
            BackgroundOption::SoftPink => "soft_pink",
            BackgroundOption::WisteriaPurple => "wisteria_purple",
            BackgroundOption::FreshGreen => "fresh_green",
            BackgroundOption::WhiteGrey => "white_grey",
        }
    }

    /// What the collaborator is asked to produce, or `None` for no change.
    pub fn description(self) -> Option<&'static str> {
        match self {
            BackgroundOption::None => None,
            BackgroundOption::SoftBlue => {
                Some("soft sky blue studio backdrop with a gentle radial gradient from the centre")
            }
            BackgroundOption::SoftPink => {
                Some("pale cherry-blossom pink studio backdrop with a warm, refined gradient")
            }
            BackgroundOption::WisteriaPurple => {
                Some("pale wisteria purple studio backdrop with a calm, dignified feel")
            }
            BackgroundOption::FreshGreen => {
                Some("fresh light green studio backdrop with a clean gradient")
            }
            BackgroundOption::WhiteGrey => {
                Some("very light porcelain grey plain studio backdrop")
            }
        }
    }
}

impl fmt::Display for BackgroundOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackgroundOption {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|option| option.as_str() == s)
            .ok_or_else(|| UnknownOption {
                kind: "background",
                value: s.to_string(),
            })
    }
}

/// Formal attire. `None` means no attire change has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClothingOption {
    #[default]
    None,
    MensSuitBlack,
    MensKimono,
    MensSuitNavy,
    WomensSuitBlack,
    WomensKimonoBlack,
    WomensKimonoColor,
}

impl ClothingOption {
    pub const ALL: [ClothingOption; 7] = [
        ClothingOption::None,
        ClothingOption::MensSuitBlack,
        ClothingOption::MensKimono,
        ClothingOption::MensSuitNavy,
        ClothingOption::WomensSuitBlack,
        ClothingOption::WomensKimonoBlack,
        ClothingOption::WomensKimonoColor,
    ];

    pub fn is_none(self) -> bool {
        self == ClothingOption::None
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ClothingOption::None => "none",
            ClothingOption::MensSuitBlack => "mens_suit_black",
            ClothingOption::MensKimono => "mens_kimono",
            ClothingOption::MensSuitNavy => "mens_suit_navy",
            ClothingOption::WomensSuitBlack => "womens_suit_black",
            ClothingOption::WomensKimonoBlack => "womens_kimono_black",
            ClothingOption::WomensKimonoColor => "womens_kimono_color",
        }
    }

    pub fn description(self) -> Option<&'static str> {
        match self {
            ClothingOption::None => None,
            ClothingOption::MensSuitBlack => {
                Some("men's black formal suit, white dress shirt and black tie")
            }
            ClothingOption::MensKimono => {
                Some("men's formal black crested haori and hakama with white family crests")
            }
            ClothingOption::MensSuitNavy => Some("calm dark navy business suit"),
            ClothingOption::WomensSuitBlack => {
                Some("women's black mourning ensemble with a single strand of pearls")
            }
            ClothingOption::WomensKimonoBlack => {
                Some("women's formal black mourning kimono, white collar and black obi")
            }
            ClothingOption::WomensKimonoColor => {
                Some("elegant kimono in soft, pale colours")
            }
        }
    }
}

impl fmt::Display for ClothingOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClothingOption {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|option| option.as_str() == s)
            .ok_or_else(|| UnknownOption {
                kind: "clothing",
                value: s.to_string(),
            })
    }
}

/// One edit the collaborator is asked to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "option", rename_all = "snake_case")]
pub enum EditKind {
    Background(BackgroundOption),
    Clothing(ClothingOption),
}

impl EditKind {
    /// True for an edit that asks the collaborator to return the image unchanged.
    pub fn is_passthrough(&self) -> bool {
        match self {
            EditKind::Background(option) => option.is_none(),
            EditKind::Clothing(option) => option.is_none(),
        }
    }

    pub fn description(&self) -> Option<&'static str> {
        match self {
            EditKind::Background(option) => option.description(),
            EditKind::Clothing(option) => option.description(),
        }
    }
}

impl fmt::Display for EditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditKind::Background(option) => write!(f, "background:{}", option),
            EditKind::Clothing(option) => write!(f, "clothing:{}", option),
        }
    }
}

/// An external image-to-image editor.
///
/// Implementations must keep the subject's face and pose unchanged and
/// return the input as is for a passthrough edit.
pub trait PortraitEditor {
    fn edit(&self, base: &DecodedImage, kind: EditKind) -> Result<DecodedImage, EditError>;
}

impl<F> PortraitEditor for F
where
    F: Fn(&DecodedImage, EditKind) -> Result<DecodedImage, EditError>,
{
    fn edit(&self, base: &DecodedImage, kind: EditKind) -> Result<DecodedImage, EditError> {
        self(base, kind)
    }
}
