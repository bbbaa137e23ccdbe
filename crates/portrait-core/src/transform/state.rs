//! Live transform values and their confirmed snapshots.

use serde::{Deserialize, Serialize};

/// Smallest scale reachable through any control.
pub const MIN_SCALE: f64 = 0.1;
/// Largest scale reachable through gestures (drag handle, wheel, pinch).
pub const MAX_GESTURE_SCALE: f64 = 5.0;
/// Largest scale reachable through the zoom slider.
pub const MAX_SLIDER_SCALE: f64 = 3.0;
/// Rotation limit in degrees, applied symmetrically.
pub const MAX_ROTATION: f64 = 30.0;
/// Granularity of the rotation control in degrees.
pub const ROTATION_STEP: f64 = 0.5;

/// Scale of a freshly opened crop session.
pub const DEFAULT_SCALE: f64 = 0.8;
/// Scale of the "fit" preset (whole subject visible).
pub const FIT_SCALE: f64 = 0.7;
/// Scale of the "fill" preset (subject fills the aperture).
pub const FILL_SCALE: f64 = 1.1;

/// Live pan/zoom/rotate values of an interactive crop session.
///
/// Offsets are in on-screen pixels relative to the aperture centre; rotation
/// is in degrees, clockwise-positive in screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformState {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub rotation: f64,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            offset_x: 0.0,
            offset_y: 0.0,
            rotation: 0.0,
        }
    }
}

impl TransformState {
    /// Create a fresh transform with the session defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a transform from a stored crop, or the defaults if there is none.
    pub fn seeded(config: Option<&CropConfig>) -> Self {
        config.map(|c| c.to_transform()).unwrap_or_default()
    }

    /// Multiply the scale by `factor`, clamped to the gesture range.
    pub fn zoom_by(&mut self, factor: f64) {
        self.scale = clamp_gesture_scale(self.scale * factor);
    }

    /// Set the scale from the zoom slider, clamped to the slider range.
    pub fn set_slider_scale(&mut self, scale: f64) {
        self.scale = clamp_slider_scale(scale);
    }

    /// Set the rotation, snapped to the 0.5° grid and clamped to ±30°.
    pub fn set_rotation(&mut self, degrees: f64) {
        self.rotation = snap_rotation(degrees);
    }

    /// Move the rotation by a number of 0.5° steps.
    pub fn step_rotation(&mut self, steps: i32) {
        self.set_rotation(self.rotation + steps as f64 * ROTATION_STEP);
    }

    /// Reset pan to the aperture centre.
    pub fn center(&mut self) {
        self.offset_x = 0.0;
        self.offset_y = 0.0;
    }

    /// Bring values from outside the controls back inside the invariants.
    ///
    /// Scale is clamped to the gesture range and rotation snapped to the
    /// grid. Non-finite values fall back to the defaults.
    pub fn clamped(self) -> Self {
        let defaults = Self::default();
        let finite_or = |value: f64, fallback: f64| {
            if value.is_finite() {
                value
            } else {
                fallback
            }
        };
        Self {
            scale: clamp_gesture_scale(finite_or(self.scale, defaults.scale)),
            offset_x: finite_or(self.offset_x, defaults.offset_x),
            offset_y: finite_or(self.offset_y, defaults.offset_y),
            rotation: snap_rotation(self.rotation),
        }
    }

    /// Take an immutable snapshot of the current values.
    pub fn snapshot(&self) -> CropConfig {
        CropConfig {
            scale: self.scale,
            offset_x: self.offset_x,
            offset_y: self.offset_y,
            rotation: self.rotation,
        }
    }
}

/// A confirmed, immutable crop.
///
/// Produced only by confirming a crop session; a session keeps two of these
/// (initial subject crop and final reframe) in separate slots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropConfig {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub rotation: f64,
}

impl CropConfig {
    /// Build a config directly, e.g. when restoring one the host kept.
    pub fn new(scale: f64, offset_x: f64, offset_y: f64, rotation: f64) -> Self {
        Self {
            scale,
            offset_x,
            offset_y,
            rotation,
        }
    }

    /// The transform a crop session starts from when re-editing this config.
    ///
    /// Configs handed in by the host are not trusted to be in range.
    pub fn to_transform(&self) -> TransformState {
        TransformState {
            scale: self.scale,
            offset_x: self.offset_x,
            offset_y: self.offset_y,
            rotation: self.rotation,
        }
        .clamped()
    }

    /// This config with its values brought inside the transform invariants.
    pub fn clamped(&self) -> CropConfig {
        self.to_transform().snapshot()
    }

    /// Rotation in radians.
    pub fn rotation_radians(&self) -> f64 {
        self.rotation.to_radians()
    }
}

impl From<&TransformState> for CropConfig {
    fn from(state: &TransformState) -> Self {
        state.snapshot()
    }
}

/// Clamp a scale to the gesture range `[0.1, 5.0]`.
#[inline]
pub fn clamp_gesture_scale(scale: f64) -> f64 {
    scale.clamp(MIN_SCALE, MAX_GESTURE_SCALE)
}

/// Clamp a scale to the slider range `[0.1, 3.0]`.
#[inline]
pub fn clamp_slider_scale(scale: f64) -> f64 {
    scale.clamp(MIN_SCALE, MAX_SLIDER_SCALE)
}

/// Snap a rotation to the nearest 0.5° and clamp it to `[-30, 30]`.
#[inline]
pub fn snap_rotation(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let snapped = (degrees / ROTATION_STEP).round() * ROTATION_STEP;
    snapped.clamp(-MAX_ROTATION, MAX_ROTATION)
}
