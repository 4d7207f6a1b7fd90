#![allow(clippy::float_cmp)]

use super::*;
use crate::geometry::graph_point_to_viewport_point;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn controller(width: f64, height: f64) -> ViewportController {
    let mut vc = ViewportController::default();
    vc.set_size(Dimensions::new(width, height));
    vc
}

fn bounded_controller(extent: Extent, width: f64, height: f64) -> ViewportController {
    let config = EngineConfig { translate_extent: Some(extent), ..EngineConfig::default() };
    let mut vc = ViewportController::new(&config);
    vc.set_size(Dimensions::new(width, height));
    vc
}

// =============================================================
// Defaults
// =============================================================

#[test]
fn default_transform_is_identity() {
    let vc = ViewportController::default();
    assert_eq!(vc.transform(), Viewport::default());
    assert!(!vc.is_moving());
    assert_eq!(vc.zoom_limits(), (0.5, 2.0));
}

// =============================================================
// Pan / zoom
// =============================================================

#[test]
fn pan_offsets_translation() {
    let mut vc = controller(800.0, 600.0);
    let t = vc.pan(30.0, -20.0);
    assert_eq!(t, Viewport::new(30.0, -20.0, 1.0));
}

#[test]
fn zoom_by_keeps_focal_point_fixed() {
    let mut vc = controller(800.0, 600.0);
    vc.pan(37.0, -12.0);
    let focal = Point::new(100.0, 250.0);
    let before = vc.project(focal, None);
    vc.zoom_by(1.5, focal);
    let after = vc.project(focal, None);
    assert!(approx_eq(before.x, after.x));
    assert!(approx_eq(before.y, after.y));
    assert!(approx_eq(vc.transform().zoom, 1.5));
}

#[test]
fn zoom_by_matches_anchor_formula() {
    let mut vc = controller(800.0, 600.0);
    let t = vc.zoom_by(2.0, Point::new(100.0, 100.0));
    assert_eq!(t, Viewport::new(-100.0, -100.0, 2.0));
}

#[test]
fn zoom_is_clamped_to_limits() {
    let mut vc = controller(800.0, 600.0);
    vc.zoom_by(10.0, Point::new(0.0, 0.0));
    assert_eq!(vc.transform().zoom, 2.0);
    vc.zoom_by(0.001, Point::new(0.0, 0.0));
    assert_eq!(vc.transform().zoom, 0.5);
}

#[test]
fn clamped_zoom_still_keeps_focal_point_fixed() {
    let mut vc = controller(800.0, 600.0);
    let focal = Point::new(400.0, 300.0);
    let before = vc.project(focal, None);
    vc.zoom_by(100.0, focal);
    let after = vc.project(focal, None);
    assert!(approx_eq(before.x, after.x));
    assert!(approx_eq(before.y, after.y));
}

#[test]
fn zoom_in_and_out_step_about_center() {
    let mut vc = controller(400.0, 300.0);
    vc.zoom_in(None);
    assert!(approx_eq(vc.transform().zoom, 1.2));
    let center_graph = vc.project(Point::new(200.0, 150.0), None);
    assert!(approx_eq(center_graph.x, 200.0));
    assert!(approx_eq(center_graph.y, 150.0));
    vc.zoom_out(None);
    assert!(approx_eq(vc.transform().zoom, 1.0));
}

#[test]
fn set_zoom_limits_reclamps_current_zoom() {
    let mut vc = controller(400.0, 300.0);
    vc.zoom_to(2.0, None, None);
    vc.set_zoom_limits(0.25, 1.5);
    assert_eq!(vc.transform().zoom, 1.5);
}

// =============================================================
// Fit / centre
// =============================================================

#[test]
fn transform_for_bounds_formula() {
    let bounds = Rect::new(0.0, 0.0, 150.0, 150.0);
    let size = Dimensions::new(400.0, 300.0);
    let t = transform_for_bounds(bounds, size, 0.5, 2.0, 0.1);
    let expected = (400.0_f64 / 165.0).min(300.0 / 165.0);
    assert!(approx_eq(t.zoom, expected));
    assert!((t.zoom - 1.818).abs() < 1e-3);
    let center = graph_point_to_viewport_point(bounds.center(), t);
    assert!(approx_eq(center.x, 200.0));
    assert!(approx_eq(center.y, 150.0));
}

#[test]
fn transform_for_bounds_clamps_zoom() {
    let tiny = Rect::new(0.0, 0.0, 10.0, 10.0);
    let t = transform_for_bounds(tiny, Dimensions::new(400.0, 300.0), 0.5, 2.0, 0.1);
    assert_eq!(t.zoom, 2.0);
    let huge = Rect::new(0.0, 0.0, 100_000.0, 100_000.0);
    let t = transform_for_bounds(huge, Dimensions::new(400.0, 300.0), 0.5, 2.0, 0.1);
    assert_eq!(t.zoom, 0.5);
}

#[test]
fn fit_bounds_applies_transform() {
    let mut vc = controller(400.0, 300.0);
    assert!(vc.fit_bounds(Rect::new(0.0, 0.0, 150.0, 150.0), FitBoundsOptions::default()));
    assert!((vc.transform().zoom - 1.818).abs() < 1e-3);
}

#[test]
fn fit_bounds_without_size_is_noop() {
    let mut vc = ViewportController::default();
    assert!(!vc.fit_bounds(Rect::new(0.0, 0.0, 150.0, 150.0), FitBoundsOptions::default()));
    assert_eq!(vc.transform(), Viewport::default());
}

#[test]
fn fit_bounds_with_empty_bounds_is_noop() {
    let mut vc = controller(400.0, 300.0);
    assert!(!vc.fit_bounds(Rect::default(), FitBoundsOptions::default()));
    let nan = Rect::new(f64::NAN, 0.0, 10.0, 10.0);
    assert!(!vc.fit_bounds(nan, FitBoundsOptions::default()));
    assert_eq!(vc.transform(), Viewport::default());
}

#[test]
fn fit_bounds_within_respects_tighter_max_zoom() {
    let mut vc = controller(400.0, 300.0);
    assert!(vc.fit_bounds_within(Rect::new(0.0, 0.0, 10.0, 10.0), FitBoundsOptions::default(), 0.5, 1.0));
    assert_eq!(vc.transform().zoom, 1.0);
}

#[test]
fn set_center_puts_point_in_middle() {
    let mut vc = controller(400.0, 300.0);
    vc.set_center(100.0, 50.0, SetCenterOptions { zoom: Some(2.0), duration_ms: None });
    assert_eq!(vc.transform(), Viewport::new(0.0, 50.0, 2.0));
    let center = vc.project(Point::new(200.0, 150.0), None);
    assert_eq!(center, Point::new(100.0, 50.0));
}

#[test]
fn set_center_keeps_zoom_when_absent() {
    let mut vc = controller(400.0, 300.0);
    vc.zoom_to(1.5, None, None);
    vc.set_center(0.0, 0.0, SetCenterOptions::default());
    assert!(approx_eq(vc.transform().zoom, 1.5));
    assert_eq!(vc.transform().x, 200.0);
}

// =============================================================
// Translate extent
// =============================================================

#[test]
fn pan_is_clamped_to_translate_extent() {
    let extent = Extent::new(Point::new(0.0, 0.0), Point::new(1000.0, 1000.0));
    let mut vc = bounded_controller(extent, 400.0, 300.0);
    vc.pan(100.0, 0.0);
    assert_eq!(vc.transform().x, 0.0);
    vc.pan(-2000.0, 0.0);
    assert_eq!(vc.transform().x, -600.0);
    let visible = vc.visible_rect();
    assert!(visible.x >= 0.0);
    assert!(visible.x + visible.width <= 1000.0 + EPSILON);
}

#[test]
fn small_extent_is_centered() {
    let extent = Extent::new(Point::new(0.0, 0.0), Point::new(100.0, 100.0));
    let mut vc = bounded_controller(extent, 400.0, 300.0);
    vc.pan(0.0, 0.0);
    assert_eq!(vc.transform().x, 150.0);
    assert_eq!(vc.transform().y, 100.0);
}

#[test]
fn zoom_respects_translate_extent() {
    let extent = Extent::new(Point::new(0.0, 0.0), Point::new(1000.0, 1000.0));
    let mut vc = bounded_controller(extent, 400.0, 300.0);
    vc.zoom_by(0.5, Point::new(0.0, 0.0));
    let visible = vc.visible_rect();
    assert!(visible.x >= -EPSILON);
    assert!(visible.y >= -EPSILON);
}

// =============================================================
// Transitions
// =============================================================

#[test]
fn timed_zoom_interpolates_over_ticks() {
    let mut vc = controller(400.0, 300.0);
    vc.zoom_to(2.0, None, Some(100.0));
    assert_eq!(vc.transform().zoom, 1.0);
    assert!(vc.is_animating());
    assert!(vc.is_moving());

    let step = vc.tick(0.0).unwrap();
    assert!(!step.finished);
    let step = vc.tick(50.0).unwrap();
    assert!(!step.finished);
    assert!(vc.transform().zoom > 1.0 && vc.transform().zoom < 2.0);
    let step = vc.tick(100.0).unwrap();
    assert!(step.finished);
    assert_eq!(vc.transform().zoom, 2.0);
    assert!(!vc.is_animating());
    assert!(vc.tick(200.0).is_none());
}

#[test]
fn new_request_supersedes_in_flight_transition() {
    let mut vc = controller(400.0, 300.0);
    vc.set_viewport(Viewport::new(300.0, 0.0, 1.0), Some(100.0));
    vc.tick(0.0);
    vc.tick(50.0);
    let mid = vc.transform();
    assert!(mid.x > 0.0 && mid.x < 300.0);

    vc.set_viewport(Viewport::new(-50.0, 0.0, 1.0), None);
    assert_eq!(vc.transform(), Viewport::new(-50.0, 0.0, 1.0));
    assert!(vc.tick(100.0).is_none());
}

#[test]
fn animated_request_restarts_from_current_position() {
    let mut vc = controller(400.0, 300.0);
    vc.set_viewport(Viewport::new(300.0, 0.0, 1.0), Some(100.0));
    vc.tick(0.0);
    vc.tick(50.0);
    let mid = vc.transform();

    vc.set_viewport(Viewport::new(0.0, 0.0, 1.0), Some(100.0));
    let first = vc.tick(1000.0).unwrap();
    assert_eq!(first.viewport, mid);
    let last = vc.tick(1100.0).unwrap();
    assert!(last.finished);
    assert_eq!(vc.transform(), Viewport::new(0.0, 0.0, 1.0));
}

#[test]
fn chained_zoom_steps_accumulate_from_target() {
    let mut vc = controller(400.0, 300.0);
    vc.zoom_in(Some(100.0));
    vc.zoom_in(Some(100.0));
    vc.tick(0.0);
    vc.tick(100.0);
    assert!(approx_eq(vc.transform().zoom, 1.44));
}

#[test]
fn cancel_transition_leaves_transform() {
    let mut vc = controller(400.0, 300.0);
    vc.zoom_to(2.0, None, Some(100.0));
    assert!(vc.cancel_transition());
    assert!(!vc.cancel_transition());
    assert_eq!(vc.transform().zoom, 1.0);
}
