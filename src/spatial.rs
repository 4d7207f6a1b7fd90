//! Spatial queries over the graph: containment, bounds, adjacency, visibility.
//!
//! All rectangles passed in *viewport* space are converted to graph space
//! with the inverse transform before comparing against node boxes, which are
//! always absolute graph-space rectangles (see [`Node::absolute_rect`]).

#[cfg(test)]
#[path = "spatial_test.rs"]
mod spatial_test;

use std::collections::{HashMap, HashSet};

use crate::geometry::{BoxBounds, Rect, Viewport, box_to_rect, overlap_area, rect_to_box, union_boxes};
use crate::graph::{Edge, Node};

/// Separator between a node id and a handle id in composite endpoint ids.
pub const HANDLE_ID_SEPARATOR: &str = "__";

/// Strip a `node__handle` suffix, leaving the node id.
#[must_use]
pub fn strip_handle_suffix(endpoint: &str) -> &str {
    endpoint.split_once(HANDLE_ID_SEPARATOR).map_or(endpoint, |(node, _)| node)
}

/// Nodes inside `rect` (given in viewport pixels).
///
/// With `partial` any overlap counts; otherwise the node box must be fully
/// contained. Hidden nodes are skipped. Unmeasured nodes and nodes being
/// dragged are always reported, so culling never drops them.
#[must_use]
pub fn get_nodes_inside<'a>(
    nodes: impl IntoIterator<Item = &'a Node>,
    rect: Rect,
    transform: Viewport,
    partial: bool,
) -> Vec<&'a Node> {
    let graph_rect = Rect::new(
        (rect.x - transform.x) / transform.zoom,
        (rect.y - transform.y) / transform.zoom,
        rect.width / transform.zoom,
        rect.height / transform.zoom,
    );

    nodes
        .into_iter()
        .filter(|node| !node.hidden)
        .filter(|node| {
            let node_rect = node.absolute_rect();
            let overlap = overlap_area(graph_rect, node_rect);
            let not_measured = !node.is_measured();
            let partially_visible = partial && overlap > 0.0;
            let fully_visible = overlap >= node_rect.area();
            not_measured || partially_visible || fully_visible || node.dragging
        })
        .collect()
}

/// Bounding rectangle of `nodes` in graph space.
///
/// Unmeasured nodes count as zero-size points. An empty input yields the
/// zero rectangle.
#[must_use]
pub fn get_rect_of_nodes<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Rect {
    let bounds = nodes
        .into_iter()
        .fold(BoxBounds::empty(), |acc, node| union_boxes(acc, rect_to_box(node.absolute_rect())));
    if bounds.is_empty() {
        return Rect::default();
    }
    box_to_rect(bounds)
}

/// Edges whose source or target node is in `node_ids`.
#[must_use]
pub fn get_connected_edges<'a>(node_ids: &HashSet<&str>, edges: impl IntoIterator<Item = &'a Edge>) -> Vec<&'a Edge> {
    edges
        .into_iter()
        .filter(|edge| {
            node_ids.contains(strip_handle_suffix(&edge.source)) || node_ids.contains(strip_handle_suffix(&edge.target))
        })
        .collect()
}

/// Nodes with an edge pointing at `node_id`.
#[must_use]
pub fn get_incomers<'a>(
    node_id: &str,
    nodes: impl IntoIterator<Item = &'a Node>,
    edges: impl IntoIterator<Item = &'a Edge>,
) -> Vec<&'a Node> {
    let sources: HashSet<&str> = edges
        .into_iter()
        .filter(|e| strip_handle_suffix(&e.target) == node_id)
        .map(|e| strip_handle_suffix(&e.source))
        .collect();
    nodes.into_iter().filter(|n| sources.contains(n.id.as_str())).collect()
}

/// Nodes `node_id` has an edge pointing at.
#[must_use]
pub fn get_outgoers<'a>(
    node_id: &str,
    nodes: impl IntoIterator<Item = &'a Node>,
    edges: impl IntoIterator<Item = &'a Edge>,
) -> Vec<&'a Node> {
    let targets: HashSet<&str> = edges
        .into_iter()
        .filter(|e| strip_handle_suffix(&e.source) == node_id)
        .map(|e| strip_handle_suffix(&e.target))
        .collect();
    nodes.into_iter().filter(|n| targets.contains(n.id.as_str())).collect()
}

/// Conservative visibility test for an edge between two node boxes.
///
/// True when the box spanned by both endpoints overlaps `viewport` (all in
/// graph space). A zero-width or zero-height span is widened by one unit so
/// straight horizontal or vertical edges still register.
#[must_use]
pub fn is_edge_visible(source: Rect, target: Rect, viewport: Rect) -> bool {
    let mut span = union_boxes(rect_to_box(source), rect_to_box(target));
    if span.x >= span.x2 {
        span.x2 = span.x + 1.0;
    }
    if span.y >= span.y2 {
        span.y2 = span.y + 1.0;
    }
    overlap_area(box_to_rect(span), viewport).ceil() > 0.0
}

/// Edges with at least part of their span on screen. Edges whose endpoints
/// are missing or hidden are left out.
#[must_use]
pub fn get_visible_edges<'a>(
    nodes: impl IntoIterator<Item = &'a Node>,
    edges: impl IntoIterator<Item = &'a Edge>,
    viewport: Rect,
) -> Vec<&'a Edge> {
    let boxes: HashMap<&str, Rect> = nodes
        .into_iter()
        .filter(|n| !n.hidden)
        .map(|n| (n.id.as_str(), n.absolute_rect()))
        .collect();
    edges
        .into_iter()
        .filter(|edge| !edge.hidden)
        .filter(|edge| {
            let source = boxes.get(strip_handle_suffix(&edge.source));
            let target = boxes.get(strip_handle_suffix(&edge.target));
            match (source, target) {
                (Some(s), Some(t)) => is_edge_visible(*s, *t, viewport),
                _ => false,
            }
        })
        .collect()
}
