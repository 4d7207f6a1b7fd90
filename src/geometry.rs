//! Geometry kernel: points, rectangles, boxes, and the pan/zoom transform.
//!
//! Everything here is pure. Two coordinate spaces exist:
//!
//! - **Viewport space**: pixels relative to the top-left corner of the canvas
//!   element, as delivered by pointer events.
//! - **Graph space**: the coordinate system nodes are positioned in.
//!
//! A [`Viewport`] maps graph space to viewport space as
//! `pixel = graph * zoom + (x, y)`.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use serde::{Deserialize, Serialize};

/// A point in either viewport or graph space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise sum.
    #[must_use]
    pub fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    /// Component-wise difference.
    #[must_use]
    pub fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Measured size of an element.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in `(x, y, width, height)` form.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle spanned by two arbitrary corners; width and height are never negative.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    /// Top-left corner.
    #[must_use]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Centre point.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Area; zero for degenerate rectangles.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Whether `p` lies inside or on the border of this rectangle.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    /// Rectangle grown by `amount` on every side.
    #[must_use]
    pub fn inflate(&self, amount: f64) -> Rect {
        Rect::new(
            self.x - amount,
            self.y - amount,
            self.width + amount * 2.0,
            self.height + amount * 2.0,
        )
    }
}

/// Axis-aligned rectangle in `(x, y, x2, y2)` form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxBounds {
    pub x: f64,
    pub y: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoxBounds {
    /// The identity element for [`union_boxes`]: contains nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            x: f64::INFINITY,
            y: f64::INFINITY,
            x2: f64::NEG_INFINITY,
            y2: f64::NEG_INFINITY,
        }
    }

    /// Returns `true` when no point has been accumulated into the box.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x > self.x2 || self.y > self.y2
    }
}

/// A movement boundary given as top-left and bottom-right corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min: Point,
    pub max: Point,
}

impl Extent {
    #[must_use]
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// An extent that constrains nothing.
    #[must_use]
    pub fn infinite() -> Self {
        Self {
            min: Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            max: Point::new(f64::INFINITY, f64::INFINITY),
        }
    }

    /// Returns `true` when all four coordinates are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.min.x.is_finite() && self.min.y.is_finite() && self.max.x.is_finite() && self.max.y.is_finite()
    }

    /// The same extent moved by `offset`.
    #[must_use]
    pub fn translate(&self, offset: Point) -> Extent {
        Extent::new(self.min.add(offset), self.max.add(offset))
    }
}

/// Pan/zoom transform between graph space and viewport space.
///
/// `x` / `y` are the translation in viewport pixels.
/// `zoom` is the uniform scale factor (1.0 = no zoom).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, zoom: 1.0 }
    }
}

impl Viewport {
    #[must_use]
    pub fn new(x: f64, y: f64, zoom: f64) -> Self {
        Self { x, y, zoom }
    }

    /// Translation component as a point.
    #[must_use]
    pub fn translation(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// The graph-space rectangle visible through a viewport of `size` pixels.
    #[must_use]
    pub fn visible_rect(&self, size: Dimensions) -> Rect {
        Rect::new(
            -self.x / self.zoom,
            -self.y / self.zoom,
            size.width / self.zoom,
            size.height / self.zoom,
        )
    }
}

/// Snap-to-grid settings applied when converting pointer positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapGrid {
    pub x: f64,
    pub y: f64,
}

impl SnapGrid {
    /// Round `p` to the nearest grid intersection.
    #[must_use]
    pub fn snap(&self, p: Point) -> Point {
        Point::new(snap_value(p.x, self.x), snap_value(p.y, self.y))
    }
}

fn snap_value(value: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return value;
    }
    step * (value / step).round()
}

/// Convert `(x, y, width, height)` to `(x, y, x2, y2)`.
#[must_use]
pub fn rect_to_box(rect: Rect) -> BoxBounds {
    BoxBounds {
        x: rect.x,
        y: rect.y,
        x2: rect.x + rect.width,
        y2: rect.y + rect.height,
    }
}

/// Convert `(x, y, x2, y2)` to `(x, y, width, height)`.
#[must_use]
pub fn box_to_rect(b: BoxBounds) -> Rect {
    Rect {
        x: b.x,
        y: b.y,
        width: b.x2 - b.x,
        height: b.y2 - b.y,
    }
}

/// Smallest box containing both `a` and `b`.
#[must_use]
pub fn union_boxes(a: BoxBounds, b: BoxBounds) -> BoxBounds {
    BoxBounds {
        x: a.x.min(b.x),
        y: a.y.min(b.y),
        x2: a.x2.max(b.x2),
        y2: a.y2.max(b.y2),
    }
}

/// Smallest rectangle containing both `a` and `b`.
#[must_use]
pub fn union_rects(a: Rect, b: Rect) -> Rect {
    box_to_rect(union_boxes(rect_to_box(a), rect_to_box(b)))
}

/// Area shared by `a` and `b`; zero when they are disjoint.
#[must_use]
pub fn overlap_area(a: Rect, b: Rect) -> f64 {
    let x_overlap = 0.0_f64.max((a.x + a.width).min(b.x + b.width) - a.x.max(b.x));
    let y_overlap = 0.0_f64.max((a.y + a.height).min(b.y + b.height) - a.y.max(b.y));
    x_overlap * y_overlap
}

/// Map a viewport pixel to graph space, optionally snapping to `snap`.
#[must_use]
pub fn point_to_renderer_point(p: Point, transform: Viewport, snap: Option<SnapGrid>) -> Point {
    let graph = Point::new((p.x - transform.x) / transform.zoom, (p.y - transform.y) / transform.zoom);
    match snap {
        Some(grid) => grid.snap(graph),
        None => graph,
    }
}

/// Map a graph-space point to viewport pixels.
#[must_use]
pub fn graph_point_to_viewport_point(p: Point, transform: Viewport) -> Point {
    Point::new(p.x * transform.zoom + transform.x, p.y * transform.zoom + transform.y)
}

/// Clamp `p` into `extent`. Non-finite sides leave the axis unconstrained.
#[must_use]
pub fn clamp_position(p: Point, extent: Extent) -> Point {
    Point::new(clamp_axis(p.x, extent.min.x, extent.max.x), clamp_axis(p.y, extent.min.y, extent.max.y))
}

fn clamp_axis(value: f64, min: f64, max: f64) -> f64 {
    // An inverted range (element larger than its extent) pins to the minimum.
    if max < min {
        return min;
    }
    value.max(min).min(max)
}
