#![allow(clippy::float_cmp)]

use super::*;
use crate::geometry::Point;

fn placed(id: &str, x: f64, y: f64, w: f64, h: f64) -> Node {
    let mut n = Node::new(id, Point::new(x, y)).with_size(w, h);
    n.internals.position_absolute = Point::new(x, y);
    n
}

fn unmeasured(id: &str, x: f64, y: f64) -> Node {
    let mut n = Node::new(id, Point::new(x, y));
    n.internals.position_absolute = Point::new(x, y);
    n
}

fn ids<'a>(nodes: &[&'a Node]) -> Vec<&'a str> {
    nodes.iter().map(|n| n.id.as_str()).collect()
}

// =============================================================
// strip_handle_suffix
// =============================================================

#[test]
fn strip_handle_suffix_removes_composite_part() {
    assert_eq!(strip_handle_suffix("node__out"), "node");
    assert_eq!(strip_handle_suffix("node"), "node");
    assert_eq!(strip_handle_suffix("a__b__c"), "a");
}

// =============================================================
// get_nodes_inside
// =============================================================

#[test]
fn partial_mode_includes_overlapping_nodes() {
    let nodes = [placed("in", 10.0, 10.0, 20.0, 20.0), placed("edge", 90.0, 90.0, 20.0, 20.0), placed("out", 300.0, 0.0, 10.0, 10.0)];
    let found = get_nodes_inside(&nodes, Rect::new(0.0, 0.0, 100.0, 100.0), Viewport::default(), true);
    assert_eq!(ids(&found), ["in", "edge"]);
}

#[test]
fn full_mode_requires_containment() {
    let nodes = [placed("in", 10.0, 10.0, 20.0, 20.0), placed("edge", 90.0, 90.0, 20.0, 20.0)];
    let found = get_nodes_inside(&nodes, Rect::new(0.0, 0.0, 100.0, 100.0), Viewport::default(), false);
    assert_eq!(ids(&found), ["in"]);
}

#[test]
fn rect_is_converted_through_transform() {
    // Zoomed 2x and panned by (100, 100): pixel rect (100,100)-(200,200) covers graph (0,0)-(50,50).
    let nodes = [placed("a", 10.0, 10.0, 20.0, 20.0), placed("b", 60.0, 60.0, 10.0, 10.0)];
    let transform = Viewport::new(100.0, 100.0, 2.0);
    let found = get_nodes_inside(&nodes, Rect::new(100.0, 100.0, 100.0, 100.0), transform, false);
    assert_eq!(ids(&found), ["a"]);
}

#[test]
fn hidden_nodes_are_skipped() {
    let mut n = placed("h", 0.0, 0.0, 10.0, 10.0);
    n.hidden = true;
    let nodes = [n];
    assert!(get_nodes_inside(&nodes, Rect::new(0.0, 0.0, 100.0, 100.0), Viewport::default(), true).is_empty());
}

#[test]
fn unmeasured_and_dragging_nodes_are_always_included() {
    let mut dragged = placed("d", 5000.0, 5000.0, 10.0, 10.0);
    dragged.dragging = true;
    let nodes = [unmeasured("u", 9000.0, 9000.0), dragged];
    let found = get_nodes_inside(&nodes, Rect::new(0.0, 0.0, 10.0, 10.0), Viewport::default(), false);
    assert_eq!(ids(&found), ["u", "d"]);
}

// =============================================================
// get_rect_of_nodes
// =============================================================

#[test]
fn rect_of_nodes_is_union_of_boxes() {
    let nodes = [placed("a", 0.0, 0.0, 10.0, 10.0), placed("b", 40.0, -20.0, 10.0, 5.0)];
    assert_eq!(get_rect_of_nodes(&nodes), Rect::new(0.0, -20.0, 50.0, 30.0));
}

#[test]
fn rect_of_nodes_treats_unmeasured_as_points() {
    let nodes = [placed("a", 0.0, 0.0, 10.0, 10.0), unmeasured("u", 100.0, 100.0)];
    assert_eq!(get_rect_of_nodes(&nodes), Rect::new(0.0, 0.0, 100.0, 100.0));
}

#[test]
fn rect_of_no_nodes_is_zero() {
    assert_eq!(get_rect_of_nodes(std::iter::empty()), Rect::default());
}

// =============================================================
// Adjacency
// =============================================================

#[test]
fn connected_edges_match_either_endpoint() {
    let edges = [Edge::new("e1", "a", "b"), Edge::new("e2", "b", "c"), Edge::new("e3", "c", "d"), Edge::new("e4", "x__h", "y")];
    let wanted: HashSet<&str> = HashSet::from(["b", "x"]);
    let found: Vec<&str> = get_connected_edges(&wanted, &edges).iter().map(|e| e.id.as_str()).collect();
    assert_eq!(found, ["e1", "e2", "e4"]);
}

#[test]
fn incomers_and_outgoers() {
    let nodes = [placed("a", 0.0, 0.0, 1.0, 1.0), placed("b", 0.0, 0.0, 1.0, 1.0), placed("c", 0.0, 0.0, 1.0, 1.0)];
    let edges = [Edge::new("e1", "a", "b"), Edge::new("e2", "b", "c"), Edge::new("e3", "a", "c")];
    assert_eq!(ids(&get_incomers("c", &nodes, &edges)), ["a", "b"]);
    assert_eq!(ids(&get_outgoers("a", &nodes, &edges)), ["b", "c"]);
    assert!(get_incomers("a", &nodes, &edges).is_empty());
}

// =============================================================
// Edge visibility
// =============================================================

#[test]
fn edge_crossing_viewport_is_visible_even_if_endpoints_are_not() {
    let left = Rect::new(-500.0, 40.0, 10.0, 10.0);
    let right = Rect::new(500.0, 40.0, 10.0, 10.0);
    assert!(is_edge_visible(left, right, Rect::new(0.0, 0.0, 100.0, 100.0)));
}

#[test]
fn edge_outside_viewport_is_not_visible() {
    let a = Rect::new(200.0, 200.0, 10.0, 10.0);
    let b = Rect::new(300.0, 300.0, 10.0, 10.0);
    assert!(!is_edge_visible(a, b, Rect::new(0.0, 0.0, 100.0, 100.0)));
}

#[test]
fn degenerate_span_is_widened() {
    // Two unmeasured endpoints on a vertical line: zero-width span.
    let a = Rect::new(50.0, -100.0, 0.0, 0.0);
    let b = Rect::new(50.0, 300.0, 0.0, 0.0);
    assert!(is_edge_visible(a, b, Rect::new(0.0, 0.0, 100.0, 100.0)));
}

#[test]
fn visible_edges_drop_hidden_and_dangling() {
    let mut hidden_node = placed("h", 10.0, 10.0, 10.0, 10.0);
    hidden_node.hidden = true;
    let nodes = [placed("a", 0.0, 0.0, 10.0, 10.0), placed("b", 50.0, 50.0, 10.0, 10.0), hidden_node];
    let mut hidden_edge = Edge::new("hidden", "a", "b");
    hidden_edge.hidden = true;
    let edges = [Edge::new("ok", "a", "b"), hidden_edge, Edge::new("to-hidden", "a", "h"), Edge::new("dangling", "a", "zz")];
    let visible: Vec<&str> = get_visible_edges(&nodes, &edges, Rect::new(0.0, 0.0, 100.0, 100.0))
        .iter()
        .map(|e| e.id.as_str())
        .collect();
    assert_eq!(visible, ["ok"]);
}
