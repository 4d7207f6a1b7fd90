//! Selection: box-select gesture plus click/keyboard selection helpers.
//!
//! Every function here produces `select` change records rather than writing
//! flags directly, so selection flows through the same fold as every other
//! mutation and a host that owns the collections sees it as well.

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;

use std::collections::HashSet;

use tracing::debug;

use crate::changes::{EdgeChange, NodeChange, edge_selection_changes, node_selection_changes};
use crate::config::{EngineConfig, SelectionMode};
use crate::geometry::{Point, Rect, Viewport};
use crate::graph::GraphStore;
use crate::spatial::{get_connected_edges, get_nodes_inside, get_rect_of_nodes};

/// Node and edge `select` changes produced together.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionChanges {
    pub nodes: Vec<NodeChange>,
    pub edges: Vec<EdgeChange>,
}

impl SelectionChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Changes that make exactly `node_ids` and `edge_ids` selected.
#[must_use]
pub fn select_exactly(store: &GraphStore, node_ids: &HashSet<&str>, edge_ids: &HashSet<&str>) -> SelectionChanges {
    SelectionChanges {
        nodes: node_selection_changes(store.nodes(), node_ids),
        edges: edge_selection_changes(store.edges(), edge_ids),
    }
}

/// Changes that deselect everything.
#[must_use]
pub fn clear_selection(store: &GraphStore) -> SelectionChanges {
    select_exactly(store, &HashSet::new(), &HashSet::new())
}

/// Selection response to clicking (or starting a drag on) node `id`.
///
/// An unselected node becomes the only selection, or is added to it while
/// the multi-selection modifier is held. Clicking a selected node with the
/// modifier held deselects it.
#[must_use]
pub fn click_node(store: &GraphStore, id: &str, multi: bool) -> SelectionChanges {
    let Some(node) = store.node(id) else {
        return SelectionChanges::default();
    };
    if !node.selected {
        if multi {
            return SelectionChanges {
                nodes: vec![NodeChange::Select { id: id.to_owned(), selected: true }],
                edges: Vec::new(),
            };
        }
        return select_exactly(store, &HashSet::from([id]), &HashSet::new());
    }
    if multi {
        return SelectionChanges {
            nodes: vec![NodeChange::Select { id: id.to_owned(), selected: false }],
            edges: Vec::new(),
        };
    }
    SelectionChanges::default()
}

/// Selection response to pressing node `id` to start a drag.
///
/// Like [`click_node`] for an unselected node. An already selected node stays
/// selected, with or without the multi-select modifier, so it is never
/// dragged while deselected.
#[must_use]
pub fn press_node(store: &GraphStore, id: &str, multi: bool) -> SelectionChanges {
    if store.node(id).is_some_and(|n| n.selected) {
        return SelectionChanges::default();
    }
    click_node(store, id, multi)
}

/// Selection response to clicking edge `id`; mirrors [`click_node`].
#[must_use]
pub fn click_edge(store: &GraphStore, id: &str, multi: bool) -> SelectionChanges {
    let Some(edge) = store.edge(id) else {
        return SelectionChanges::default();
    };
    match (edge.selected, multi) {
        (true, true) => SelectionChanges {
            nodes: Vec::new(),
            edges: vec![EdgeChange::Select { id: id.to_owned(), selected: false }],
        },
        (false, true) => SelectionChanges {
            nodes: Vec::new(),
            edges: vec![EdgeChange::Select { id: id.to_owned(), selected: true }],
        },
        (_, false) => select_exactly(store, &HashSet::new(), &HashSet::from([id])),
    }
}

/// Box around the selected nodes, in graph space; `None` when nothing is selected.
#[must_use]
pub fn selected_nodes_rect(store: &GraphStore) -> Option<Rect> {
    let mut selected = store.nodes().filter(|n| n.selected && !n.hidden).peekable();
    selected.peek()?;
    Some(get_rect_of_nodes(selected))
}

#[derive(Debug, Clone)]
struct BoxSelect {
    anchor: Point,
    rect: Rect,
    node_ids: HashSet<String>,
    edge_ids: HashSet<String>,
}

/// Pointer-drag rectangle selection.
#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    active: Option<BoxSelect>,
}

impl SelectionController {
    /// The live rectangle in viewport pixels.
    #[must_use]
    pub fn rect(&self) -> Option<Rect> {
        self.active.as_ref().map(|b| b.rect)
    }

    /// Pointer-down on empty canvas at viewport pixel `anchor`.
    ///
    /// Returns the changes that clear the existing selection.
    pub fn start(&mut self, anchor: Point, store: &GraphStore) -> SelectionChanges {
        debug!(x = anchor.x, y = anchor.y, "box selection started");
        self.active = Some(BoxSelect {
            anchor,
            rect: Rect::new(anchor.x, anchor.y, 0.0, 0.0),
            node_ids: HashSet::new(),
            edge_ids: HashSet::new(),
        });
        clear_selection(store)
    }

    /// Pointer moved to viewport pixel `pointer`.
    ///
    /// Returns select changes only when the set of nodes or edges inside the
    /// rectangle differs from the previous move.
    pub fn update(
        &mut self,
        pointer: Point,
        store: &GraphStore,
        transform: Viewport,
        config: &EngineConfig,
    ) -> SelectionChanges {
        let Some(state) = self.active.as_mut() else {
            return SelectionChanges::default();
        };
        state.rect = Rect::from_corners(state.anchor, pointer);

        let partial = config.selection_mode == SelectionMode::Partial;
        let inside = get_nodes_inside(store.nodes(), state.rect, transform, partial);
        // Culling keeps unmeasured nodes; a box only takes nodes it overlaps.
        let node_ids: HashSet<&str> = inside
            .into_iter()
            .filter(|n| n.is_measured() && n.is_selectable(config.elements_selectable))
            .map(|n| n.id.as_str())
            .collect();
        let edge_ids: HashSet<&str> = get_connected_edges(&node_ids, store.edges())
            .into_iter()
            .filter(|e| e.is_selectable(config.elements_selectable))
            .map(|e| e.id.as_str())
            .collect();

        let mut changes = SelectionChanges::default();
        if !same_ids(&state.node_ids, &node_ids) {
            changes.nodes = node_selection_changes(store.nodes(), &node_ids);
            state.node_ids = node_ids.iter().map(|id| (*id).to_owned()).collect();
        }
        if !same_ids(&state.edge_ids, &edge_ids) {
            changes.edges = edge_selection_changes(store.edges(), &edge_ids);
            state.edge_ids = edge_ids.iter().map(|id| (*id).to_owned()).collect();
        }
        changes
    }

    /// Pointer-up: the gesture ends. Returns `true` when nodes were selected,
    /// meaning the frozen nodes-selection box should be shown.
    pub fn end(&mut self) -> bool {
        let Some(state) = self.active.take() else {
            return false;
        };
        debug!(nodes = state.node_ids.len(), edges = state.edge_ids.len(), "box selection finished");
        !state.node_ids.is_empty()
    }

    pub fn cancel(&mut self) -> bool {
        self.active.take().is_some()
    }
}

fn same_ids(previous: &HashSet<String>, next: &HashSet<&str>) -> bool {
    previous.len() == next.len() && next.iter().all(|id| previous.contains(*id))
}
