//! Viewport transform manager: pan, zoom, fit, and centre operations.
//!
//! [`ViewportController`] is the only writer of the transform. Every
//! operation funnels through [`ViewportController::constrain`], so the zoom
//! always stays inside `[min_zoom, max_zoom]` and, when a translate extent is
//! configured, the visible area stays inside it.
//!
//! Operations with a duration do not change the transform immediately; they
//! schedule a [`Transition`] that the host advances with
//! [`ViewportController::tick`]. Scheduling a new operation (animated or not)
//! replaces any transition still in flight.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use tracing::debug;

use crate::config::EngineConfig;
use crate::consts::ZOOM_STEP;
use crate::geometry::{Dimensions, Extent, Point, Rect, SnapGrid, Viewport, point_to_renderer_point};
use crate::transition::{Transition, TransitionStep};

/// Options for [`ViewportController::fit_bounds`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitBoundsOptions {
    pub padding: f64,
    pub duration_ms: Option<f64>,
}

impl Default for FitBoundsOptions {
    fn default() -> Self {
        Self { padding: crate::consts::DEFAULT_FIT_VIEW_PADDING, duration_ms: None }
    }
}

/// Options for [`ViewportController::set_center`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SetCenterOptions {
    /// Zoom to centre at; keeps the current zoom when absent.
    pub zoom: Option<f64>,
    pub duration_ms: Option<f64>,
}

/// Compute the transform that frames `bounds` inside a viewport of `size`.
///
/// The scale is `min(W / (w * (1 + padding)), H / (h * (1 + padding)))`
/// clamped to `[min_zoom, max_zoom]`, and the bounds centre lands on the
/// viewport centre.
#[must_use]
pub fn transform_for_bounds(bounds: Rect, size: Dimensions, min_zoom: f64, max_zoom: f64, padding: f64) -> Viewport {
    let x_zoom = size.width / (bounds.width * (1.0 + padding));
    let y_zoom = size.height / (bounds.height * (1.0 + padding));
    let zoom = clamp_zoom(x_zoom.min(y_zoom), min_zoom, max_zoom);
    let center = bounds.center();
    Viewport {
        x: size.width / 2.0 - center.x * zoom,
        y: size.height / 2.0 - center.y * zoom,
        zoom,
    }
}

fn clamp_zoom(zoom: f64, min_zoom: f64, max_zoom: f64) -> f64 {
    // Degenerate bounds (zero width or height) produce an infinite zoom,
    // which the clamp turns into max_zoom.
    if zoom.is_nan() {
        return min_zoom;
    }
    zoom.clamp(min_zoom, max_zoom)
}

/// Owns the pan/zoom transform for one canvas.
#[derive(Debug, Clone)]
pub struct ViewportController {
    transform: Viewport,
    min_zoom: f64,
    max_zoom: f64,
    translate_extent: Option<Extent>,
    size: Dimensions,
    moving: bool,
    transition: Option<Transition>,
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl ViewportController {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            transform: Viewport::default(),
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            translate_extent: config.translate_extent,
            size: Dimensions::default(),
            moving: false,
            transition: None,
        }
    }

    // --- State ---

    /// The current transform.
    #[must_use]
    pub fn transform(&self) -> Viewport {
        self.transform
    }

    /// Size of the canvas element in pixels.
    #[must_use]
    pub fn size(&self) -> Dimensions {
        self.size
    }

    #[must_use]
    pub fn zoom_limits(&self) -> (f64, f64) {
        (self.min_zoom, self.max_zoom)
    }

    /// Whether a pan/zoom gesture or transition is in progress.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.moving || self.transition.is_some()
    }

    /// Whether a timed transition is in flight.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    pub fn set_moving(&mut self, moving: bool) {
        self.moving = moving;
    }

    /// Record the canvas element size; re-applies the pan constraint.
    pub fn set_size(&mut self, size: Dimensions) {
        self.size = size;
        self.transform = self.constrain(self.transform);
    }

    /// Change the zoom bounds; the current transform is re-clamped.
    pub fn set_zoom_limits(&mut self, min_zoom: f64, max_zoom: f64) {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.transform = self.constrain(self.transform);
    }

    /// Change the pan bounds; the current transform is re-clamped.
    pub fn set_translate_extent(&mut self, extent: Option<Extent>) {
        self.translate_extent = extent;
        self.transform = self.constrain(self.transform);
    }

    // --- Conversions ---

    /// Map a viewport pixel to graph space.
    #[must_use]
    pub fn project(&self, pixel: Point, snap: Option<SnapGrid>) -> Point {
        point_to_renderer_point(pixel, self.transform, snap)
    }

    /// The graph-space rectangle currently on screen.
    #[must_use]
    pub fn visible_rect(&self) -> Rect {
        self.transform.visible_rect(self.size)
    }

    // --- Operations ---

    /// Move the view by `(dx, dy)` pixels.
    pub fn pan(&mut self, dx: f64, dy: f64) -> Viewport {
        let next = Viewport { x: self.transform.x + dx, y: self.transform.y + dy, ..self.transform };
        self.apply(next, None);
        self.transform
    }

    /// Multiply the zoom by `factor`, keeping the graph point under `focal` fixed.
    pub fn zoom_by(&mut self, factor: f64, focal: Point) -> Viewport {
        let target = self.zoom_about(self.transform, self.transform.zoom * factor, focal);
        self.apply(target, None);
        self.transform
    }

    /// Set an absolute zoom level about `focal` (the viewport centre by default).
    pub fn zoom_to(&mut self, level: f64, focal: Option<Point>, duration_ms: Option<f64>) {
        let focal = focal.unwrap_or_else(|| self.center_pixel());
        let base = self.settled_transform();
        let target = self.zoom_about(base, level, focal);
        self.apply(target, duration_ms);
    }

    /// Zoom in one step about the viewport centre.
    pub fn zoom_in(&mut self, duration_ms: Option<f64>) {
        let level = self.settled_transform().zoom * ZOOM_STEP;
        self.zoom_to(level, None, duration_ms);
    }

    /// Zoom out one step about the viewport centre.
    pub fn zoom_out(&mut self, duration_ms: Option<f64>) {
        let level = self.settled_transform().zoom / ZOOM_STEP;
        self.zoom_to(level, None, duration_ms);
    }

    /// Replace the transform outright (still constrained).
    pub fn set_viewport(&mut self, viewport: Viewport, duration_ms: Option<f64>) {
        self.apply(viewport, duration_ms);
    }

    /// Frame `bounds` in the viewport.
    ///
    /// Returns `false` without touching the transform when the bounds are
    /// empty or not finite, or the viewport has no size yet.
    pub fn fit_bounds(&mut self, bounds: Rect, options: FitBoundsOptions) -> bool {
        self.fit_bounds_within(bounds, options, self.min_zoom, self.max_zoom)
    }

    /// [`fit_bounds`](Self::fit_bounds) with zoom bounds tighter than the configured ones.
    pub fn fit_bounds_within(&mut self, bounds: Rect, options: FitBoundsOptions, min_zoom: f64, max_zoom: f64) -> bool {
        let finite = [bounds.x, bounds.y, bounds.width, bounds.height].iter().all(|v| v.is_finite());
        if !finite || (bounds.width <= 0.0 && bounds.height <= 0.0) {
            return false;
        }
        if self.size.width <= 0.0 || self.size.height <= 0.0 {
            return false;
        }
        let min_zoom = min_zoom.max(self.min_zoom);
        let max_zoom = max_zoom.min(self.max_zoom);
        let target = transform_for_bounds(bounds, self.size, min_zoom, max_zoom.max(min_zoom), options.padding);
        self.apply(target, options.duration_ms);
        true
    }

    /// Centre the graph point `(x, y)` in the viewport.
    pub fn set_center(&mut self, x: f64, y: f64, options: SetCenterOptions) {
        let zoom = options.zoom.unwrap_or(self.settled_transform().zoom);
        let zoom = clamp_zoom(zoom, self.min_zoom, self.max_zoom);
        let target = Viewport {
            x: self.size.width / 2.0 - x * zoom,
            y: self.size.height / 2.0 - y * zoom,
            zoom,
        };
        self.apply(target, options.duration_ms);
    }

    /// Advance an in-flight transition to `now_ms`.
    ///
    /// Returns `None` when nothing is animating.
    pub fn tick(&mut self, now_ms: f64) -> Option<TransitionStep> {
        let transition = self.transition.as_mut()?;
        let step = transition.sample(now_ms);
        self.transform = step.viewport;
        if step.finished {
            self.transition = None;
        }
        Some(step)
    }

    /// Drop any in-flight transition, leaving the transform where it is.
    pub fn cancel_transition(&mut self) -> bool {
        self.transition.take().is_some()
    }

    /// Clamp zoom and pan of `viewport` to the configured bounds.
    #[must_use]
    pub fn constrain(&self, viewport: Viewport) -> Viewport {
        let zoom = clamp_zoom(viewport.zoom, self.min_zoom, self.max_zoom);
        let clamped = Viewport { zoom, ..viewport };
        match self.translate_extent {
            Some(extent) if extent.is_finite() => constrain_translation(clamped, self.size, extent),
            _ => clamped,
        }
    }

    fn apply(&mut self, target: Viewport, duration_ms: Option<f64>) {
        let target = self.constrain(target);
        if self.transition.take().is_some() {
            debug!("viewport transition superseded");
        }
        match duration_ms {
            Some(ms) if ms > 0.0 => {
                debug!(duration_ms = ms, "viewport transition scheduled");
                self.transition = Some(Transition::new(self.transform, target, ms));
            }
            _ => self.transform = target,
        }
    }

    /// Where the view will rest: the end of an in-flight transition, or the current transform.
    fn settled_transform(&self) -> Viewport {
        self.transition.as_ref().map_or(self.transform, Transition::target)
    }

    fn center_pixel(&self) -> Point {
        Point::new(self.size.width / 2.0, self.size.height / 2.0)
    }

    fn zoom_about(&self, base: Viewport, level: f64, focal: Point) -> Viewport {
        let zoom = clamp_zoom(level, self.min_zoom, self.max_zoom);
        let ratio = zoom / base.zoom;
        Viewport {
            x: focal.x - (focal.x - base.x) * ratio,
            y: focal.y - (focal.y - base.y) * ratio,
            zoom,
        }
    }
}

/// Keep the visible area inside `extent`; when the viewport is wider (or
/// taller) than the extent, the extent is centred on that axis instead.
fn constrain_translation(t: Viewport, size: Dimensions, extent: Extent) -> Viewport {
    let dx0 = (0.0 - t.x) / t.zoom - extent.min.x;
    let dx1 = (size.width - t.x) / t.zoom - extent.max.x;
    let dy0 = (0.0 - t.y) / t.zoom - extent.min.y;
    let dy1 = (size.height - t.y) / t.zoom - extent.max.y;

    let shift_x = axis_shift(dx0, dx1);
    let shift_y = axis_shift(dy0, dy1);
    Viewport {
        x: t.x + t.zoom * shift_x,
        y: t.y + t.zoom * shift_y,
        zoom: t.zoom,
    }
}

fn axis_shift(d0: f64, d1: f64) -> f64 {
    if d1 > d0 {
        return (d0 + d1) / 2.0;
    }
    if d0 < 0.0 { d0 } else { d1.max(0.0) }
}
