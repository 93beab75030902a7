//! Pointer input events for canvas interaction.

use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::geometry::Handle;

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    /// Button pressed.
    Down,
    /// Pointer moved (button state unchanged).
    Move,
    /// Button released, anywhere on screen.
    Up,
}

/// Mouse button or pointer kind that produced the event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    /// Left mouse button, pen tip, or single touch.
    #[default]
    Primary,
    /// Middle mouse button.
    Middle,
    /// Right mouse button.
    Secondary,
}

/// A pointer event in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Phase of this event.
    pub phase: PointerPhase,
    /// X position in page coordinates.
    pub x: f64,
    /// Y position in page coordinates.
    pub y: f64,
    /// Button that changed state (ignored for moves).
    #[serde(default)]
    pub button: PointerButton,
}

impl PointerEvent {
    /// Primary-button press.
    #[must_use]
    pub fn down(x: f64, y: f64) -> Self {
        Self {
            phase: PointerPhase::Down,
            x,
            y,
            button: PointerButton::Primary,
        }
    }

    /// Pointer movement.
    #[must_use]
    pub fn moved(x: f64, y: f64) -> Self {
        Self {
            phase: PointerPhase::Move,
            x,
            y,
            button: PointerButton::Primary,
        }
    }

    /// Primary-button release.
    #[must_use]
    pub fn up(x: f64, y: f64) -> Self {
        Self {
            phase: PointerPhase::Up,
            x,
            y,
            button: PointerButton::Primary,
        }
    }

    /// Set the button.
    #[must_use]
    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }

    /// Event position.
    #[must_use]
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// The part of an object a pointer-down landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", content = "handle", rename_all = "lowercase")]
pub enum HitTarget {
    /// The object body (starts a drag).
    Body,
    /// One of the eight resize handles.
    Resize(Handle),
    /// The rotate handle above the object.
    Rotate,
}
