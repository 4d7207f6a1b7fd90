//! Time-based viewport interpolation.
//!
//! A [`Transition`] is a cancellable scheduled task: it knows its start and
//! end transform and its duration, and yields intermediate transforms when
//! sampled by the host's animation clock. The clock starts on the first
//! sample so hosts never need to know when the transition was requested.

#[cfg(test)]
#[path = "transition_test.rs"]
mod transition_test;

use crate::geometry::Viewport;

/// One sampled step of a transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionStep {
    pub viewport: Viewport,
    pub finished: bool,
}

/// An in-flight interpolation between two transforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    from: Viewport,
    to: Viewport,
    duration_ms: f64,
    started_at_ms: Option<f64>,
}

impl Transition {
    #[must_use]
    pub fn new(from: Viewport, to: Viewport, duration_ms: f64) -> Self {
        Self { from, to, duration_ms: duration_ms.max(0.0), started_at_ms: None }
    }

    /// Final transform this transition settles on.
    #[must_use]
    pub fn target(&self) -> Viewport {
        self.to
    }

    /// Sample the transition at `now_ms`.
    pub fn sample(&mut self, now_ms: f64) -> TransitionStep {
        let started = *self.started_at_ms.get_or_insert(now_ms);
        if self.duration_ms <= 0.0 {
            return TransitionStep { viewport: self.to, finished: true };
        }
        let t = ((now_ms - started) / self.duration_ms).clamp(0.0, 1.0);
        if t >= 1.0 {
            return TransitionStep { viewport: self.to, finished: true };
        }
        TransitionStep { viewport: interpolate(self.from, self.to, ease_cubic_in_out(t)), finished: false }
    }
}

/// Cubic ease-in-out on `[0, 1]`.
#[must_use]
pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u / 2.0
    }
}

/// Linear interpolation of translation and zoom.
#[must_use]
pub fn interpolate(a: Viewport, b: Viewport, t: f64) -> Viewport {
    Viewport {
        x: a.x + (b.x - a.x) * t,
        y: a.y + (b.y - a.y) * t,
        zoom: a.zoom + (b.zoom - a.zoom) * t,
    }
}
