//! Hit-testing against nodes, handles, and the frozen nodes-selection box,
//! plus the handle points edges attach to.
//!
//! All tests run in graph space. Radii are given in viewport pixels by the
//! caller and divided by the zoom here, so a handle stays equally easy to
//! grab at every zoom level.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use tracing::warn;

use crate::consts::HANDLE_RADIUS_PX;
use crate::geometry::{Point, Rect};
use crate::graph::{Edge, GraphStore, HandleElement, HandlePosition, HandleType, Node};

/// A handle under (or near) the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct HandleHit {
    pub node_id: String,
    pub handle_id: Option<String>,
    pub kind: HandleType,
    /// Handle centre in graph space.
    pub center: Point,
}

/// What a pointer-down landed on.
#[derive(Debug, Clone, PartialEq)]
pub enum Hit {
    /// Inside the frozen box drawn around a finished box selection.
    NodesSelection,
    Handle(HandleHit),
    Node { id: String },
    Pane,
}

/// Graph-space points where an edge leaves its source and meets its target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeAnchors {
    pub source: Point,
    pub source_position: HandlePosition,
    pub target: Point,
    pub target_position: HandlePosition,
}

/// Resolve what lies under `world`.
///
/// Order: the nodes-selection box (when present), then handles, then node
/// bodies from the top of the stack down, otherwise the pane.
#[must_use]
pub fn hit_test(world: Point, store: &GraphStore, zoom: f64, selection_rect: Option<Rect>) -> Hit {
    if let Some(rect) = selection_rect {
        if rect.contains(world) {
            return Hit::NodesSelection;
        }
    }

    let stack = top_down(store);
    let radius = HANDLE_RADIUS_PX / zoom;
    for node in &stack {
        if let Some(hit) = node_handles(node).find(|h| h.center.distance(world) <= radius) {
            return Hit::Handle(hit);
        }
    }

    stack
        .iter()
        .find(|n| n.absolute_rect().contains(world))
        .map_or(Hit::Pane, |n| Hit::Node { id: n.id.clone() })
}

/// The handle closest to `world` within `radius_px` screen pixels that
/// `accept` allows.
#[must_use]
pub fn closest_handle(
    world: Point,
    store: &GraphStore,
    zoom: f64,
    radius_px: f64,
    accept: impl Fn(&HandleHit) -> bool,
) -> Option<HandleHit> {
    let radius = radius_px / zoom;
    let mut best: Option<(f64, HandleHit)> = None;
    for node in top_down(store) {
        for handle in node_handles(node) {
            let distance = handle.center.distance(world);
            if distance > radius || !accept(&handle) {
                continue;
            }
            if best.as_ref().is_none_or(|(d, _)| distance < *d) {
                best = Some((distance, handle));
            }
        }
    }
    best.map(|(_, h)| h)
}

/// Visible nodes ordered topmost first.
fn top_down(store: &GraphStore) -> Vec<&Node> {
    let mut nodes: Vec<&Node> = store.sorted_nodes().into_iter().filter(|n| !n.hidden).collect();
    nodes.reverse();
    nodes
}

fn node_handles(node: &Node) -> impl Iterator<Item = HandleHit> + '_ {
    let origin = node.internals.position_absolute;
    node.internals.handle_bounds.iter().flat_map(move |bounds| {
        [HandleType::Source, HandleType::Target].into_iter().flat_map(move |kind| {
            bounds.of_type(kind).iter().map(move |h| HandleHit {
                node_id: node.id.clone(),
                handle_id: h.id.clone(),
                kind,
                center: h.absolute_rect(origin).center(),
            })
        })
    })
}

/// Attachment points for `edge`.
///
/// `None` while an endpoint is hidden or its handles are unmeasured, and when
/// the edge names a handle its node does not have.
#[must_use]
pub fn edge_anchors(edge: &Edge, store: &GraphStore) -> Option<EdgeAnchors> {
    let (source, source_position) = anchor(edge, store, HandleType::Source)?;
    let (target, target_position) = anchor(edge, store, HandleType::Target)?;
    Some(EdgeAnchors { source, source_position, target, target_position })
}

fn anchor(edge: &Edge, store: &GraphStore, kind: HandleType) -> Option<(Point, HandlePosition)> {
    let (node_id, handle_id) = match kind {
        HandleType::Source => (&edge.source, edge.source_handle.as_deref()),
        HandleType::Target => (&edge.target, edge.target_handle.as_deref()),
    };
    let node = store.node(node_id).filter(|n| !n.hidden)?;
    let bounds = node.internals.handle_bounds.as_ref()?;
    let Some(handle) = bounds.find(kind, handle_id) else {
        warn!(edge_id = %edge.id, %node_id, handle = ?handle_id, ?kind, "edge references a handle its node does not have");
        return None;
    };
    Some((side_midpoint(handle, node.internals.position_absolute), handle.position))
}

/// Midpoint of the handle's outer side.
fn side_midpoint(handle: &HandleElement, origin: Point) -> Point {
    let r = handle.absolute_rect(origin);
    match handle.position {
        HandlePosition::Left => Point::new(r.x, r.y + r.height / 2.0),
        HandlePosition::Right => Point::new(r.x + r.width, r.y + r.height / 2.0),
        HandlePosition::Top => Point::new(r.x + r.width / 2.0, r.y),
        HandlePosition::Bottom => Point::new(r.x + r.width / 2.0, r.y + r.height),
    }
}
