//! Input model: modifier keys, buttons, keys, and the gesture state machine.
//!
//! `Modifiers`, `Button`, `Key`, and `WheelDelta` describe a raw pointer or
//! keyboard event as delivered by the host. `InputState` is the gesture being
//! tracked between pointer-down and pointer-up; at most one gesture is ever
//! active, which is what keeps panning, dragging, connecting, and box
//! selection mutually exclusive.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::geometry::Point;

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Whether the multi-selection modifier (Ctrl or Meta) is held.
    #[must_use]
    pub fn multi(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// A keyboard key.
///
/// The inner string holds the key name as reported by the host (e.g. `"Delete"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Unit step for an arrow key, or `None` for any other key.
    #[must_use]
    pub fn arrow_direction(&self) -> Option<Point> {
        match self.0.as_str() {
            "ArrowUp" => Some(Point::new(0.0, -1.0)),
            "ArrowDown" => Some(Point::new(0.0, 1.0)),
            "ArrowLeft" => Some(Point::new(-1.0, 0.0)),
            "ArrowRight" => Some(Point::new(1.0, 0.0)),
            _ => None,
        }
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// The active gesture between pointer-down and pointer-up.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// The user is panning the canvas by dragging empty space.
    Panning {
        /// Screen-space position of the previous pointer event, used to compute pan delta.
        last_screen: Point,
    },
    /// One or more nodes are being dragged; see [`crate::drag::DragController`].
    Dragging,
    /// A connection is being dragged from a handle; see [`crate::connect::ConnectController`].
    Connecting,
    /// A selection rectangle is being drawn; see [`crate::selection::SelectionController`].
    Selecting,
}

impl InputState {
    /// Whether any gesture is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}
