//! Drag interaction controller: moving one or more nodes with the pointer.
//!
//! A drag session is `Idle -> Dragging -> Idle`. On start the controller
//! collects the drag items and remembers, for each, the offset between the
//! pointer and the node's absolute position. Every move places each item at
//! `pointer - offset`, snapped and clamped to the item's extent, and reports
//! the result as `position` change records. The controller never writes to
//! the store; the engine folds the emitted changes.

#[cfg(test)]
#[path = "drag_test.rs"]
mod drag_test;

use tracing::{debug, warn};

use crate::changes::NodeChange;
use crate::config::EngineConfig;
use crate::consts::{ARROW_KEY_SHIFT_FACTOR, ARROW_KEY_STEP};
use crate::geometry::{Extent, Point, clamp_position};
use crate::graph::{GraphStore, Node, NodeExtent};

/// One node taking part in a drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DragItem {
    pub id: String,
    /// Position relative to the parent.
    pub position: Point,
    pub position_absolute: Point,
    /// Pointer position minus the node's absolute position at drag start.
    pub distance: Point,
    /// Absolute box the node's top-left corner must stay in.
    pub extent: Extent,
    /// Absolute position of the parent (origin when there is none).
    pub parent_origin: Point,
}

impl DragItem {
    /// Place the item at absolute `next`, clamped to its extent.
    fn place(&mut self, next: Point) {
        self.position_absolute = clamp_position(next, self.extent);
        self.position = self.position_absolute.sub(self.parent_origin);
    }
}

/// How a drag session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum DragEnd {
    /// The pointer never moved: treat as a click on `node_id` (or on the
    /// nodes-selection box when `None`).
    Click { node_id: Option<String> },
    /// Nodes moved; `changes` clear their dragging flag.
    Moved { node_ids: Vec<String>, changes: Vec<NodeChange> },
}

#[derive(Debug, Clone)]
struct DragSession {
    node_id: Option<String>,
    items: Vec<DragItem>,
    last_pointer: Point,
    moved: bool,
}

/// Pointer-driven node drag state machine.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    session: Option<DragSession>,
}

impl DragController {
    /// The node the drag started on; `None` for a nodes-selection drag.
    #[must_use]
    pub fn node_id(&self) -> Option<&str> {
        self.session.as_ref().and_then(|s| s.node_id.as_deref())
    }

    /// Current drag items; empty when idle.
    #[must_use]
    pub fn items(&self) -> &[DragItem] {
        self.session.as_ref().map(|s| s.items.as_slice()).unwrap_or_default()
    }

    /// Whether any item has moved in this session.
    #[must_use]
    pub fn has_moved(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.moved)
    }

    /// Begin a drag at graph-space `pointer`.
    ///
    /// `node_id` is the grabbed node, or `None` to drag the current selection
    /// as a whole. Returns `false` (and stays idle) when nothing is draggable.
    pub fn start(&mut self, store: &GraphStore, node_id: Option<&str>, pointer: Point, config: &EngineConfig) -> bool {
        let items = drag_items(store, node_id, pointer, config);
        if items.is_empty() {
            return false;
        }
        debug!(node_id = ?node_id, count = items.len(), "drag started");
        self.session = Some(DragSession {
            node_id: node_id.map(str::to_owned),
            items,
            last_pointer: pointer,
            moved: false,
        });
        true
    }

    /// Move the drag to graph-space `pointer`.
    ///
    /// Returns nothing when idle, when the pointer has not moved since the
    /// previous call, or while no item has left its start position.
    pub fn drag(&mut self, pointer: Point, config: &EngineConfig) -> Vec<NodeChange> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if pointer == session.last_pointer {
            return Vec::new();
        }
        session.last_pointer = pointer;

        let snap = config.snap();
        let mut any_moved = false;
        for item in &mut session.items {
            let mut next = pointer.sub(item.distance);
            if let Some(grid) = snap {
                next = grid.snap(next);
            }
            let before = item.position_absolute;
            item.place(next);
            any_moved |= item.position_absolute != before;
        }
        // Nothing is reported before the first real movement.
        if !any_moved && !session.moved {
            return Vec::new();
        }
        session.moved = true;
        session
            .items
            .iter()
            .map(|item| NodeChange::Position {
                id: item.id.clone(),
                position: Some(item.position),
                dragging: Some(true),
            })
            .collect()
    }

    /// Release the pointer and end the session.
    pub fn stop(&mut self) -> Option<DragEnd> {
        let session = self.session.take()?;
        if !session.moved {
            debug!("drag ended without movement");
            return Some(DragEnd::Click { node_id: session.node_id });
        }
        debug!(count = session.items.len(), "drag finished");
        let changes = session
            .items
            .iter()
            .map(|item| NodeChange::Position { id: item.id.clone(), position: None, dragging: Some(false) })
            .collect();
        let node_ids = session.items.into_iter().map(|item| item.id).collect();
        Some(DragEnd::Moved { node_ids, changes })
    }

    /// Abandon the session without a click or a stop notification.
    ///
    /// Nodes stay where the last move put them; the returned changes clear
    /// the dragging flag on items that moved.
    pub fn cancel(&mut self) -> Vec<NodeChange> {
        let Some(session) = self.session.take() else {
            return Vec::new();
        };
        debug!(count = session.items.len(), moved = session.moved, "drag cancelled");
        if !session.moved {
            return Vec::new();
        }
        session
            .items
            .into_iter()
            .map(|item| NodeChange::Position { id: item.id, position: None, dragging: Some(false) })
            .collect()
    }
}

/// Nodes a drag starting on `node_id` moves.
///
/// A grabbed node that is already selected (or a selection drag with
/// `node_id == None`) moves every selected draggable node; an unselected
/// grabbed node moves alone. Nodes with a selected ancestor are left out
/// because they follow their parent.
#[must_use]
pub fn drag_items(store: &GraphStore, node_id: Option<&str>, pointer: Point, config: &EngineConfig) -> Vec<DragItem> {
    let grabbed_selected = node_id.is_none_or(|id| store.node(id).is_some_and(|n| n.selected));
    let global = config.node_extent_or_infinite();
    store
        .nodes()
        .filter(|n| !n.hidden && n.is_draggable(config.nodes_draggable))
        .filter(|n| {
            let grabbed = node_id == Some(n.id.as_str());
            if grabbed && !grabbed_selected {
                return true;
            }
            (grabbed || (grabbed_selected && n.selected)) && !has_selected_ancestor(store, n)
        })
        .map(|n| {
            let (extent, parent_origin) = resolve_extent(store, n, global);
            DragItem {
                id: n.id.clone(),
                position: n.position,
                position_absolute: n.internals.position_absolute,
                distance: pointer.sub(n.internals.position_absolute),
                extent,
                parent_origin,
            }
        })
        .collect()
}

/// Keyboard nudge: move every selected draggable node one step in `direction`.
///
/// The step is the snap grid when snapping, otherwise a fixed distance;
/// shift multiplies it. Nodes that cannot move (already at their extent)
/// produce no change.
#[must_use]
pub fn nudge_selection(store: &GraphStore, direction: Point, shift: bool, config: &EngineConfig) -> Vec<NodeChange> {
    let snap = config.snap();
    let (step_x, step_y) = snap.map_or((ARROW_KEY_STEP, ARROW_KEY_STEP), |g| (g.x, g.y));
    let factor = if shift { ARROW_KEY_SHIFT_FACTOR } else { 1.0 };
    let offset = Point::new(direction.x * step_x * factor, direction.y * step_y * factor);

    drag_items(store, None, Point::default(), config)
        .into_iter()
        .filter_map(|mut item| {
            let mut next = item.position_absolute.add(offset);
            if let Some(grid) = snap {
                next = grid.snap(next);
            }
            let before = item.position;
            item.place(next);
            (item.position != before).then(|| NodeChange::Position {
                id: item.id,
                position: Some(item.position),
                dragging: Some(false),
            })
        })
        .collect()
}

fn has_selected_ancestor(store: &GraphStore, node: &Node) -> bool {
    let mut current = node.parent_node.as_deref().and_then(|p| store.node(p));
    // Parent chains are acyclic in the store; the step bound only guards the loop.
    for _ in 0..store.len() {
        let Some(parent) = current else { break };
        if parent.selected {
            return true;
        }
        current = parent.parent_node.as_deref().and_then(|p| store.node(p));
    }
    false
}

/// Absolute extent for `node` plus its parent's absolute position.
fn resolve_extent(store: &GraphStore, node: &Node, global: Extent) -> (Extent, Point) {
    let parent = node.parent_node.as_deref().and_then(|p| store.node(p));
    let parent_origin = parent.map_or_else(Point::default, |p| p.internals.position_absolute);
    let extent = match node.extent {
        Some(NodeExtent::Parent) => {
            match (parent.and_then(Node::dimensions), node.dimensions()) {
                (Some(outer), Some(own)) => Extent::new(
                    parent_origin,
                    Point::new(parent_origin.x + outer.width - own.width, parent_origin.y + outer.height - own.height),
                ),
                _ => {
                    warn!(
                        node_id = %node.id,
                        parent = ?node.parent_node,
                        "extent is 'parent' but the parent box is unknown; using the node extent"
                    );
                    global
                }
            }
        }
        Some(NodeExtent::Bounds(bounds)) if parent.is_some() => bounds.translate(parent_origin),
        Some(NodeExtent::Bounds(bounds)) => bounds,
        None => global,
    };
    (extent, parent_origin)
}
