//! Graph model: nodes, edges, handles, and the authoritative store.
//!
//! This module defines the data that describes what is on the canvas
//! (`Node`, `Edge`, `HandleBounds`), the tagged [`GraphElement`] used at
//! ingestion boundaries, and [`GraphStore`], which owns the live collections.
//!
//! Collections hold `Rc<Node>` / `Rc<Edge>` so that a change batch produces a
//! new collection in which untouched entries are the *same* allocation as
//! before. Downstream code detects what changed with `Rc::ptr_eq` instead of
//! deep comparison.
//!
//! Derived per-node state (absolute position, effective z, measured handle
//! bounds) lives in [`NodeInternals`] and is refreshed by the store after
//! every mutation; it is never serialized.

#[cfg(test)]
#[path = "graph_test.rs"]
mod graph_test;

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::consts::SELECTED_Z_BOOST;
use crate::error::{EdgeEnd, ElementKind, GraphError};
use crate::geometry::{Dimensions, Extent, Point, Rect};

/// Which side of a node a handle sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlePosition {
    Left,
    #[default]
    Top,
    Right,
    Bottom,
}

/// Role of a handle in a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleType {
    Source,
    Target,
}

impl HandleType {
    /// The complementary role.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Source => Self::Target,
            Self::Target => Self::Source,
        }
    }
}

/// A measured handle, relative to its owning node's top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandleElement {
    /// Disambiguates several handles of the same role on one node.
    pub id: Option<String>,
    pub position: HandlePosition,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl HandleElement {
    /// Handle box in graph space given the owner's absolute position.
    #[must_use]
    pub fn absolute_rect(&self, owner: Point) -> Rect {
        Rect::new(owner.x + self.x, owner.y + self.y, self.width, self.height)
    }
}

/// All measured handles of one node, grouped by role.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HandleBounds {
    pub source: Vec<HandleElement>,
    pub target: Vec<HandleElement>,
}

impl HandleBounds {
    /// Handles with the given role.
    #[must_use]
    pub fn of_type(&self, kind: HandleType) -> &[HandleElement] {
        match kind {
            HandleType::Source => &self.source,
            HandleType::Target => &self.target,
        }
    }

    /// Look up a handle by role and optional id. With no id the first handle
    /// of that role is returned.
    #[must_use]
    pub fn find(&self, kind: HandleType, id: Option<&str>) -> Option<&HandleElement> {
        let handles = self.of_type(kind);
        match id {
            Some(id) => handles.iter().find(|h| h.id.as_deref() == Some(id)),
            None => handles.first(),
        }
    }
}

/// Movement boundary for a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeExtent {
    /// Stay inside the parent node's box.
    Parent,
    /// Stay inside a fixed box (relative to the parent when there is one).
    Bounds(Extent),
}

/// Derived state the engine maintains for every node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeInternals {
    /// Position in graph space after resolving the parent chain.
    pub position_absolute: Point,
    /// Effective stacking order.
    pub z: i64,
    /// Measured handle geometry, if reported yet.
    pub handle_bounds: Option<HandleBounds>,
    /// Whether any node names this one as its parent.
    pub is_parent: bool,
}

/// A node on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    /// Type tag resolved through a [`crate::registry::TypeRegistry`].
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    /// Position relative to the parent (or graph origin when there is none).
    pub position: Point,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_node: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extent: Option<NodeExtent>,
    /// Measured width; `None` until the host reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Measured height; `None` until the host reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draggable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selectable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connectable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletable: Option<bool>,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub dragging: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i64>,
    #[serde(skip)]
    pub internals: NodeInternals,
}

impl Node {
    /// A node at `position` with every optional field unset.
    #[must_use]
    pub fn new(id: impl Into<String>, position: Point) -> Self {
        Self {
            id: id.into(),
            node_type: None,
            position,
            data: serde_json::Value::Null,
            parent_node: None,
            extent: None,
            width: None,
            height: None,
            draggable: None,
            selectable: None,
            connectable: None,
            deletable: None,
            selected: false,
            dragging: false,
            hidden: false,
            z_index: None,
            internals: NodeInternals::default(),
        }
    }

    /// Builder: set measured size.
    #[must_use]
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Builder: nest under `parent`.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_node = Some(parent.into());
        self
    }

    /// Measured size, if both dimensions are known.
    #[must_use]
    pub fn dimensions(&self) -> Option<Dimensions> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some(Dimensions::new(w, h)),
            _ => None,
        }
    }

    /// Whether the host has reported a size for this node.
    #[must_use]
    pub fn is_measured(&self) -> bool {
        self.dimensions().is_some()
    }

    /// Absolute box; unmeasured nodes are zero-size points.
    #[must_use]
    pub fn absolute_rect(&self) -> Rect {
        let p = self.internals.position_absolute;
        Rect::new(p.x, p.y, self.width.unwrap_or(0.0), self.height.unwrap_or(0.0))
    }

    #[must_use]
    pub fn is_draggable(&self, default: bool) -> bool {
        self.draggable.unwrap_or(default)
    }

    #[must_use]
    pub fn is_selectable(&self, default: bool) -> bool {
        self.selectable.unwrap_or(default)
    }

    #[must_use]
    pub fn is_connectable(&self, default: bool) -> bool {
        self.connectable.unwrap_or(default)
    }

    #[must_use]
    pub fn is_deletable(&self) -> bool {
        self.deletable.unwrap_or(true)
    }
}

/// A directed connection between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub animated: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selectable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i64>,
}

impl Edge {
    /// An edge with every optional field unset.
    #[must_use]
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            edge_type: None,
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
            selected: false,
            animated: false,
            hidden: false,
            selectable: None,
            deletable: None,
            label: None,
            data: serde_json::Value::Null,
            z_index: None,
        }
    }

    #[must_use]
    pub fn is_selectable(&self, default: bool) -> bool {
        self.selectable.unwrap_or(default)
    }

    #[must_use]
    pub fn is_deletable(&self) -> bool {
        self.deletable.unwrap_or(true)
    }
}

/// Tagged union used wherever nodes and edges arrive mixed together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "element", rename_all = "lowercase")]
pub enum GraphElement {
    Node(Node),
    Edge(Edge),
}

impl GraphElement {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Node(n) => &n.id,
            Self::Edge(e) => &e.id,
        }
    }

    /// Split a mixed list into nodes and edges, preserving order.
    #[must_use]
    pub fn partition(elements: Vec<GraphElement>) -> (Vec<Node>, Vec<Edge>) {
        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        for element in elements {
            match element {
                Self::Node(n) => nodes.push(n),
                Self::Edge(e) => edges.push(e),
            }
        }
        (nodes, edges)
    }
}

/// Global interaction flags kept alongside the collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InteractionFlags {
    /// The multi-selection modifier is held.
    pub multi_selection_active: bool,
    /// A frozen box selection is shown around the selected nodes.
    pub nodes_selection_active: bool,
}

/// Check node ids and parent references.
///
/// # Errors
///
/// Returns the first [`GraphError`] found: empty or duplicate id, a parent
/// that does not exist, or a cyclic parent chain.
pub fn validate_nodes<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Result<(), GraphError> {
    let nodes: Vec<&Node> = nodes.into_iter().collect();
    let mut parents: HashMap<&str, Option<&str>> = HashMap::with_capacity(nodes.len());
    for node in &nodes {
        if node.id.is_empty() {
            return Err(GraphError::EmptyId { kind: ElementKind::Node });
        }
        if parents.insert(&node.id, node.parent_node.as_deref()).is_some() {
            return Err(GraphError::DuplicateId { kind: ElementKind::Node, id: node.id.clone() });
        }
    }
    for node in &nodes {
        if let Some(parent) = node.parent_node.as_deref() {
            if !parents.contains_key(parent) {
                return Err(GraphError::MissingParent { node_id: node.id.clone(), parent_id: parent.to_owned() });
            }
        }
        let mut seen: HashSet<&str> = HashSet::new();
        let mut current = Some(node.id.as_str());
        while let Some(id) = current {
            if !seen.insert(id) {
                return Err(GraphError::CyclicParent { node_id: node.id.clone() });
            }
            current = parents.get(id).copied().flatten();
        }
    }
    Ok(())
}

/// Check edge ids and that both endpoints name nodes in `node_ids`.
///
/// # Errors
///
/// Returns [`GraphError::MissingEndpoint`] for an empty source/target,
/// [`GraphError::DanglingReference`] for an unknown node, and id errors as
/// for nodes.
pub fn validate_edges<'a>(
    edges: impl IntoIterator<Item = &'a Edge>,
    node_ids: &HashSet<&str>,
) -> Result<(), GraphError> {
    let mut ids: HashSet<&str> = HashSet::new();
    for edge in edges {
        if edge.id.is_empty() {
            return Err(GraphError::EmptyId { kind: ElementKind::Edge });
        }
        if !ids.insert(&edge.id) {
            return Err(GraphError::DuplicateId { kind: ElementKind::Edge, id: edge.id.clone() });
        }
        for (end, node_id) in [(EdgeEnd::Source, &edge.source), (EdgeEnd::Target, &edge.target)] {
            if node_id.is_empty() {
                return Err(GraphError::MissingEndpoint { edge_id: edge.id.clone(), end });
            }
            if !node_ids.contains(node_id.as_str()) {
                return Err(GraphError::DanglingReference {
                    edge_id: edge.id.clone(),
                    end,
                    node_id: node_id.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Recompute absolute positions, effective z, and parent flags.
///
/// Only entries whose derived state actually changes are re-allocated, so
/// untouched nodes keep their identity.
pub fn refresh_internals(nodes: &mut [Rc<Node>], elevate_on_select: bool) {
    let index = index_by_id(nodes.iter().map(|n| n.id.as_str()));
    let parent_ids: HashSet<String> = nodes.iter().filter_map(|n| n.parent_node.clone()).collect();

    let mut resolved: Vec<Option<(Point, i64)>> = vec![None; nodes.len()];
    for i in 0..nodes.len() {
        resolve_absolute(nodes, &index, &mut resolved, i, elevate_on_select);
    }

    for (i, node) in nodes.iter_mut().enumerate() {
        let (position_absolute, z) = resolved[i].unwrap_or((node.position, 0));
        let is_parent = parent_ids.contains(&node.id);
        let current = &node.internals;
        if current.position_absolute != position_absolute || current.z != z || current.is_parent != is_parent {
            let node = Rc::make_mut(node);
            node.internals.position_absolute = position_absolute;
            node.internals.z = z;
            node.internals.is_parent = is_parent;
        }
    }
}

fn own_z(node: &Node, elevate_on_select: bool) -> i64 {
    let explicit = node.z_index.unwrap_or(0);
    let boost = if elevate_on_select && node.selected { SELECTED_Z_BOOST } else { 0 };
    explicit.max(boost)
}

fn resolve_absolute(
    nodes: &[Rc<Node>],
    index: &HashMap<String, usize>,
    resolved: &mut [Option<(Point, i64)>],
    start: usize,
    elevate_on_select: bool,
) -> (Point, i64) {
    if let Some(done) = resolved[start] {
        return done;
    }
    // Walk up to the first resolved ancestor (or the root), then unwind.
    let mut chain = vec![start];
    let mut visited: HashSet<usize> = HashSet::from([start]);
    let mut base: Option<(Point, i64)> = None;
    loop {
        let Some(&current) = chain.last() else { break };
        let Some(parent_idx) = nodes[current].parent_node.as_ref().and_then(|p| index.get(p)).copied() else {
            break;
        };
        if let Some(done) = resolved[parent_idx] {
            base = Some(done);
            break;
        }
        if !visited.insert(parent_idx) {
            // Cycles are rejected on insertion; stop rather than loop forever.
            break;
        }
        chain.push(parent_idx);
    }

    let mut acc = base;
    for &idx in chain.iter().rev() {
        let node = &nodes[idx];
        let z = own_z(node, elevate_on_select);
        let value = match acc {
            Some((parent_pos, parent_z)) => (parent_pos.add(node.position), z.max(parent_z)),
            None => (node.position, z),
        };
        resolved[idx] = Some(value);
        acc = Some(value);
    }
    resolved[start].unwrap_or((nodes[start].position, 0))
}

/// The authoritative node and edge collections of one canvas.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    nodes: Vec<Rc<Node>>,
    edges: Vec<Rc<Edge>>,
    /// Id to position in `nodes`, rebuilt whenever the collection is swapped.
    node_index: HashMap<String, usize>,
    edge_index: HashMap<String, usize>,
    pub flags: InteractionFlags,
    elevate_on_select: bool,
}

impl GraphStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(elevate_on_select: bool) -> Self {
        Self { elevate_on_select, ..Self::default() }
    }

    // --- Replacement ---

    /// Replace all nodes. Edges that reference removed nodes are kept; callers
    /// replacing nodes and edges together should use [`Self::replace`].
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] (and leaves the store untouched) when the
    /// nodes fail [`validate_nodes`].
    pub fn set_nodes(&mut self, nodes: Vec<Node>) -> Result<(), GraphError> {
        validate_nodes(&nodes)?;
        self.install_nodes(nodes.into_iter().map(Rc::new).collect());
        Ok(())
    }

    /// Replace all edges.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] when an edge is malformed or references a
    /// node that is not in the store.
    pub fn set_edges(&mut self, edges: Vec<Edge>) -> Result<(), GraphError> {
        validate_edges(&edges, &self.node_id_set())?;
        self.install_edges(edges.into_iter().map(Rc::new).collect());
        Ok(())
    }

    /// Replace nodes and edges atomically.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] without modifying the store if either
    /// collection is invalid.
    pub fn replace(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) -> Result<(), GraphError> {
        validate_nodes(&nodes)?;
        let node_ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        validate_edges(&edges, &node_ids)?;
        self.install_nodes(nodes.into_iter().map(Rc::new).collect());
        self.install_edges(edges.into_iter().map(Rc::new).collect());
        Ok(())
    }

    /// Install a node collection produced by a change fold. Structural
    /// validation is re-run so a bad `add` cannot corrupt the store.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] and keeps the previous collection.
    pub fn commit_nodes(&mut self, nodes: Vec<Rc<Node>>) -> Result<(), GraphError> {
        validate_nodes(nodes.iter().map(AsRef::as_ref))?;
        self.install_nodes(nodes);
        Ok(())
    }

    /// Install an edge collection produced by a change fold.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] and keeps the previous collection.
    pub fn commit_edges(&mut self, edges: Vec<Rc<Edge>>) -> Result<(), GraphError> {
        validate_edges(edges.iter().map(AsRef::as_ref), &self.node_id_set())?;
        self.install_edges(edges);
        Ok(())
    }

    /// Drop edges whose source or target is no longer a node, returning their ids.
    pub fn prune_dangling_edges(&mut self) -> Vec<String> {
        let node_ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        let (kept, dropped): (Vec<Rc<Edge>>, Vec<Rc<Edge>>) = std::mem::take(&mut self.edges)
            .into_iter()
            .partition(|e| node_ids.contains(e.source.as_str()) && node_ids.contains(e.target.as_str()));
        self.install_edges(kept);
        dropped.into_iter().map(|e| e.id.clone()).collect()
    }

    /// Toggle z elevation of selected nodes and recompute effective z.
    pub fn set_elevate_on_select(&mut self, elevate: bool) {
        if self.elevate_on_select != elevate {
            self.elevate_on_select = elevate;
            self.refresh();
        }
    }

    /// Record measured handle geometry. Handle bounds are derived state, so
    /// this bypasses the change log.
    pub fn set_handle_bounds(&mut self, id: &str, bounds: HandleBounds) -> bool {
        let Some(node) = self.node_index.get(id).and_then(|&i| self.nodes.get_mut(i)) else {
            return false;
        };
        if node.internals.handle_bounds.as_ref() != Some(&bounds) {
            Rc::make_mut(node).internals.handle_bounds = Some(bounds);
        }
        true
    }

    // --- Queries ---

    /// Shared handles to the nodes in order.
    #[must_use]
    pub fn node_handles(&self) -> &[Rc<Node>] {
        &self.nodes
    }

    /// Shared handles to the edges in order.
    #[must_use]
    pub fn edge_handles(&self) -> &[Rc<Edge>] {
        &self.edges
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().map(AsRef::as_ref)
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().map(AsRef::as_ref)
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).and_then(|&i| self.nodes.get(i)).map(AsRef::as_ref)
    }

    #[must_use]
    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edge_index.get(id).and_then(|&i| self.edges.get(i)).map(AsRef::as_ref)
    }

    /// Ids of selected nodes, in store order.
    #[must_use]
    pub fn selected_node_ids(&self) -> Vec<String> {
        self.nodes().filter(|n| n.selected).map(|n| n.id.clone()).collect()
    }

    /// Ids of selected edges, in store order.
    #[must_use]
    pub fn selected_edge_ids(&self) -> Vec<String> {
        self.edges().filter(|e| e.selected).map(|e| e.id.clone()).collect()
    }

    /// Nodes ordered for drawing: ascending effective z, store order within a z.
    #[must_use]
    pub fn sorted_nodes(&self) -> Vec<&Node> {
        let mut nodes: Vec<&Node> = self.nodes().collect();
        nodes.sort_by_key(|n| n.internals.z);
        nodes
    }

    /// Whether `ancestor` appears on `id`'s parent chain.
    #[must_use]
    pub fn is_descendant_of(&self, id: &str, ancestor: &str) -> bool {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut current = self.node(id).and_then(|n| n.parent_node.as_deref());
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            if !seen.insert(parent) {
                return false;
            }
            current = self.node(parent).and_then(|n| n.parent_node.as_deref());
        }
        false
    }

    /// Number of nodes currently in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the store contains no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node_id_set(&self) -> HashSet<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    /// Swap in a new node list. Measured handle bounds survive for nodes
    /// that keep their id, since a replacement never re-measures.
    fn install_nodes(&mut self, mut nodes: Vec<Rc<Node>>) {
        let previous: HashMap<&str, &HandleBounds> = self
            .nodes
            .iter()
            .filter_map(|n| n.internals.handle_bounds.as_ref().map(|b| (n.id.as_str(), b)))
            .collect();
        for node in &mut nodes {
            if node.internals.handle_bounds.is_none() {
                if let Some(bounds) = previous.get(node.id.as_str()) {
                    Rc::make_mut(node).internals.handle_bounds = Some((*bounds).clone());
                }
            }
        }
        self.node_index = index_by_id(nodes.iter().map(|n| n.id.as_str()));
        self.nodes = nodes;
        self.refresh();
    }

    fn install_edges(&mut self, edges: Vec<Rc<Edge>>) {
        self.edge_index = index_by_id(edges.iter().map(|e| e.id.as_str()));
        self.edges = edges;
    }

    fn refresh(&mut self) {
        refresh_internals(&mut self.nodes, self.elevate_on_select);
    }
}

fn index_by_id<'a>(ids: impl Iterator<Item = &'a str>) -> HashMap<String, usize> {
    ids.enumerate().map(|(i, id)| (id.to_owned(), i)).collect()
}
