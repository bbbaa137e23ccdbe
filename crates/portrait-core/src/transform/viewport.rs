//! Gesture handling for the interactive crop view.
//!
//! Pointer and touch input is modelled as a pure state machine:
//! [`transition`] maps a [`ViewportState`] and an [`InputEvent`] to the next
//! state without touching any device. [`ViewportController`] owns the state
//! for a crop session and records whether the view needs redrawing; the host
//! polls [`ViewportController::take_redraw`] and redraws explicitly.
//!
//! # Gestures
//!
//! ```text
//! Idle --PointerDown(Background)---> Panning
//! Idle --PointerDown(ResizeHandle)-> Resizing
//! any  --PinchStart----------------> PinchZooming
//! any  --PointerUp-----------------> Idle
//! ```
//!
//! - Pan is computed from the drag-start snapshot every move, so rounding
//!   never accumulates.
//! - The resize handle couples both axes into one averaged scalar:
//!   `scale = start - ((dx + dy) / 2) * 0.005`. Dragging outward shrinks the
//!   subject.
//! - Pinch is incremental: each move multiplies the scale by
//!   `distance / last_distance` and then replaces `last_distance`.
//! - Rotation is never driven by a gesture.

use tracing::{debug, trace};

use super::geometry::Point;
use super::state::{clamp_gesture_scale, TransformState, FILL_SCALE, FIT_SCALE};

/// Scale change per pixel of averaged handle drag.
pub const RESIZE_SENSITIVITY: f64 = 0.005;
/// Wheel zoom factor for a notch toward the user (zoom in).
pub const WHEEL_ZOOM_IN: f64 = 1.05;
/// Wheel zoom factor for a notch away from the user (zoom out).
pub const WHEEL_ZOOM_OUT: f64 = 0.95;

/// What a pointer-down landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    /// Anywhere in the view except the handle: starts a pan.
    Background,
    /// The corner handle of the aperture: starts a resize.
    ResizeHandle,
}

/// Input delivered to the crop view, independent of the device that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Mouse button or single touch went down.
    PointerDown { target: DragTarget, at: Point },
    /// Mouse or single touch moved.
    PointerMove { at: Point },
    /// Two touch points became active.
    PinchStart { a: Point, b: Point },
    /// Two touch points moved.
    PinchMove { a: Point, b: Point },
    /// Mouse button or all touches released.
    PointerUp,
    /// Wheel notch; negative `delta_y` scrolls toward the user.
    Wheel { delta_y: f64 },
}

/// The active gesture, with the snapshot it is computed against.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Panning {
        start_pointer: Point,
        start_offset: Point,
    },
    Resizing {
        start_pointer: Point,
        start_scale: f64,
    },
    PinchZooming {
        last_distance: f64,
    },
}

impl Gesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }
}

/// Transform values plus the gesture in progress.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportState {
    pub transform: TransformState,
    pub gesture: Gesture,
}

impl ViewportState {
    pub fn new(transform: TransformState) -> Self {
        Self {
            transform,
            gesture: Gesture::Idle,
        }
    }
}

/// Compute the state that follows `event`.
///
/// Events that make no sense in the current gesture (a move while idle, a
/// pinch move without a pinch) leave the state unchanged.
pub fn transition(state: ViewportState, event: &InputEvent) -> ViewportState {
    let ViewportState {
        mut transform,
        gesture,
    } = state;

    let gesture = match (*event, gesture) {
        (InputEvent::PointerDown { target, at }, _) => match target {
            DragTarget::Background => Gesture::Panning {
                start_pointer: at,
                start_offset: Point::new(transform.offset_x, transform.offset_y),
            },
            DragTarget::ResizeHandle => Gesture::Resizing {
                start_pointer: at,
                start_scale: transform.scale,
            },
        },

        (
            InputEvent::PointerMove { at },
            Gesture::Panning {
                start_pointer,
                start_offset,
            },
        ) => {
            transform.offset_x = start_offset.x + (at.x - start_pointer.x);
            transform.offset_y = start_offset.y + (at.y - start_pointer.y);
            gesture
        }

        (
            InputEvent::PointerMove { at },
            Gesture::Resizing {
                start_pointer,
                start_scale,
            },
        ) => {
            let dx = at.x - start_pointer.x;
            let dy = at.y - start_pointer.y;
            let magnitude = (dx + dy) / 2.0;
            transform.scale = clamp_gesture_scale(start_scale - magnitude * RESIZE_SENSITIVITY);
            gesture
        }

        (InputEvent::PointerMove { .. }, _) => gesture,

        (InputEvent::PinchStart { a, b }, _) => Gesture::PinchZooming {
            last_distance: a.distance_to(b),
        },

        (InputEvent::PinchMove { a, b }, Gesture::PinchZooming { last_distance }) => {
            let distance = a.distance_to(b);
            if last_distance > 0.0 && distance.is_finite() {
                transform.zoom_by(distance / last_distance);
            }
            Gesture::PinchZooming {
                last_distance: distance,
            }
        }

        (InputEvent::PinchMove { .. }, _) => gesture,

        (InputEvent::PointerUp, _) => Gesture::Idle,

        (InputEvent::Wheel { delta_y }, _) => {
            transform.zoom_by(wheel_factor(delta_y));
            gesture
        }
    };

    ViewportState { transform, gesture }
}

/// Zoom factor for one wheel notch.
///
/// Only a strictly negative delta zooms in; zero counts as zooming out.
#[inline]
pub fn wheel_factor(delta_y: f64) -> f64 {
    if -delta_y > 0.0 {
        WHEEL_ZOOM_IN
    } else {
        WHEEL_ZOOM_OUT
    }
}

/// Stateful wrapper used for the lifetime of one crop session.
#[derive(Debug, Clone)]
pub struct ViewportController {
    state: ViewportState,
    needs_redraw: bool,
}

impl ViewportController {
    /// Start a session from `transform` (fresh defaults or a stored crop).
    ///
    /// Out-of-range values are clamped before the first frame.
    pub fn new(transform: TransformState) -> Self {
        Self {
            state: ViewportState::new(transform.clamped()),
            // The first frame always has to be drawn
            needs_redraw: true,
        }
    }

    /// Feed one input event.
    pub fn handle(&mut self, event: InputEvent) {
        let next = transition(self.state, &event);
        if next.transform != self.state.transform {
            trace!(?event, scale = next.transform.scale, "transform updated");
            self.needs_redraw = true;
        }
        if std::mem::discriminant(&next.gesture) != std::mem::discriminant(&self.state.gesture) {
            debug!(from = ?self.state.gesture, to = ?next.gesture, "gesture changed");
        }
        self.state = next;
    }

    pub fn transform(&self) -> &TransformState {
        &self.state.transform
    }

    pub fn gesture(&self) -> &Gesture {
        &self.state.gesture
    }

    pub fn state(&self) -> &ViewportState {
        &self.state
    }

    /// Zoom slider input, clamped to `[0.1, 3.0]`.
    pub fn set_slider_scale(&mut self, scale: f64) {
        self.update(|t| t.set_slider_scale(scale));
    }

    /// Rotation control input, snapped to 0.5° and clamped to ±30°.
    pub fn set_rotation(&mut self, degrees: f64) {
        self.update(|t| t.set_rotation(degrees));
    }

    /// Rotation stepper input in 0.5° steps.
    pub fn step_rotation(&mut self, steps: i32) {
        self.update(|t| t.step_rotation(steps));
    }

    /// "Show whole" preset: slightly zoomed out and centred.
    pub fn fit(&mut self) {
        self.update(|t| {
            t.scale = FIT_SCALE;
            t.center();
        });
    }

    /// "Fill frame" preset: slightly zoomed in and centred.
    pub fn fill(&mut self) {
        self.update(|t| {
            t.scale = FILL_SCALE;
            t.center();
        });
    }

    /// Restore the defaults (scale, pan and rotation).
    pub fn reset(&mut self) {
        self.update(|t| *t = TransformState::default());
    }

    /// Returns whether a redraw is due and clears the flag.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    fn update(&mut self, f: impl FnOnce(&mut TransformState)) {
        let before = self.state.transform;
        f(&mut self.state.transform);
        if self.state.transform != before {
            self.needs_redraw = true;
        }
    }
}
