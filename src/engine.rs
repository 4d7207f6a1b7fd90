//! The canvas engine: one graph store, one viewport, and the gesture
//! controllers, driven by host input events.
//!
//! Every input handler and mutation returns the [`Action`]s the host should
//! react to, in the order they happened. Depending on [`Ownership`], node
//! and edge changes are either applied to the engine's own store before they
//! are reported, or only reported, leaving the host to apply them and push
//! the result back with [`Engine::sync_nodes`] / [`Engine::sync_edges`].

use std::collections::HashSet;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::changes::{EdgeChange, NodeChange, apply_edge_changes, apply_node_changes};
use crate::config::{EngineConfig, Ownership};
use crate::connect::{
    AllowAll, ClickConnect, ConnectContext, ConnectController, Connection, ConnectionAttempt, ConnectionStart,
    ConnectionValidator, add_edge, update_edge,
};
use crate::consts::WHEEL_ZOOM_DIVISOR;
use crate::drag::{DragController, DragEnd, nudge_selection};
use crate::error::{ConfigError, ElementKind, GraphError};
use crate::geometry::{Dimensions, Point, Rect, Viewport};
use crate::graph::{Edge, GraphStore, HandleBounds, Node, validate_edges, validate_nodes};
use crate::hit::{EdgeAnchors, HandleHit, Hit, edge_anchors, hit_test};
use crate::input::{Button, InputState, Key, Modifiers, WheelDelta};
use crate::selection::{
    SelectionChanges, SelectionController, clear_selection, click_edge, click_node, press_node as select_on_press,
    select_exactly, selected_nodes_rect,
};
use crate::snapshot::FlowExport;
use crate::spatial::{
    get_connected_edges, get_incomers, get_nodes_inside, get_outgoers, get_rect_of_nodes, get_visible_edges,
};
use crate::viewport::{FitBoundsOptions, SetCenterOptions, ViewportController};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Notifications returned to the host, in the order they occurred.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A batch of node change records.
    NodesChange(Vec<NodeChange>),
    /// A batch of edge change records.
    EdgesChange(Vec<EdgeChange>),
    ConnectStart(ConnectionStart),
    /// A valid connection intent. No edge has been created for it.
    Connect(Connection),
    ConnectEnd,
    MoveStart(Viewport),
    Move(Viewport),
    MoveEnd(Viewport),
    /// The selected node and edge ids after the event.
    SelectionChange { nodes: Vec<String>, edges: Vec<String> },
    NodeDragStart { node_id: Option<String>, node_ids: Vec<String> },
    NodeDrag { node_id: Option<String>, node_ids: Vec<String> },
    NodeDragStop { node_id: Option<String>, node_ids: Vec<String> },
    NodeClick { id: String },
    PaneClick,
}

/// Options for [`Engine::fit_view`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FitViewOptions {
    /// Overrides the configured `fit_view_padding`.
    pub padding: Option<f64>,
    pub include_hidden: bool,
    pub min_zoom: Option<f64>,
    pub max_zoom: Option<f64>,
    pub duration_ms: Option<f64>,
    /// Fit only these node ids instead of every node.
    pub nodes: Option<Vec<String>>,
}

/// Measured geometry of one node, reported by the host after layout.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDimensionUpdate {
    pub id: String,
    pub dimensions: Dimensions,
    pub handle_bounds: Option<HandleBounds>,
}

#[derive(Debug, Clone, PartialEq)]
enum PressTarget {
    Node(String),
    Handle(HandleHit),
    Pane,
}

/// Where a pointer-down landed, kept until pointer-up to detect clicks.
#[derive(Debug, Clone, PartialEq)]
struct Press {
    screen: Point,
    target: PressTarget,
}

/// One independent canvas instance.
pub struct Engine {
    id: Uuid,
    config: EngineConfig,
    store: GraphStore,
    viewport: ViewportController,
    input: InputState,
    drag: DragController,
    connect: ConnectController,
    selection: SelectionController,
    validator: Box<dyn ConnectionValidator>,
    press: Option<Press>,
    /// A multi-select press on an already selected node; a click toggles it off.
    pending_toggle: Option<String>,
    last_selection: (Vec<String>, Vec<String>),
}

impl Default for Engine {
    fn default() -> Self {
        Self::with_config(EngineConfig::default())
    }
}

impl Engine {
    /// Create an engine after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for inconsistent configuration.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: EngineConfig) -> Self {
        let id = Uuid::new_v4();
        debug!(engine = %id, ownership = ?config.ownership, "engine created");
        Self {
            id,
            store: GraphStore::new(config.elevate_nodes_on_select),
            viewport: ViewportController::new(&config),
            config,
            input: InputState::Idle,
            drag: DragController::default(),
            connect: ConnectController::default(),
            selection: SelectionController::default(),
            validator: Box::new(AllowAll),
            press: None,
            pending_toggle: None,
            last_selection: (Vec::new(), Vec::new()),
        }
    }

    /// Install the host's connection rule.
    pub fn set_connection_validator(&mut self, validator: impl ConnectionValidator + 'static) {
        self.validator = Box::new(validator);
    }

    /// Swap the configuration at runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] and keeps the old configuration.
    pub fn set_config(&mut self, config: EngineConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.viewport.set_zoom_limits(config.min_zoom, config.max_zoom);
        self.viewport.set_translate_extent(config.translate_extent);
        self.store.set_elevate_on_select(config.elevate_nodes_on_select);
        self.config = config;
        Ok(())
    }

    // --- Queries ---

    /// Instance id recorded on this engine's log events.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Borrowed access to the store for hosts that render from it directly.
    #[must_use]
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    #[must_use]
    pub fn get_nodes(&self) -> Vec<Node> {
        self.store.nodes().cloned().collect()
    }

    #[must_use]
    pub fn get_edges(&self) -> Vec<Edge> {
        self.store.edges().cloned().collect()
    }

    #[must_use]
    pub fn get_node(&self, id: &str) -> Option<Node> {
        self.store.node(id).cloned()
    }

    #[must_use]
    pub fn get_edge(&self, id: &str) -> Option<Edge> {
        self.store.edge(id).cloned()
    }

    #[must_use]
    pub fn get_incomers(&self, id: &str) -> Vec<Node> {
        get_incomers(id, self.store.nodes(), self.store.edges()).into_iter().cloned().collect()
    }

    #[must_use]
    pub fn get_outgoers(&self, id: &str) -> Vec<Node> {
        get_outgoers(id, self.store.nodes(), self.store.edges()).into_iter().cloned().collect()
    }

    /// Edges attached to node `id`.
    #[must_use]
    pub fn get_connected_edges(&self, id: &str) -> Vec<Edge> {
        get_connected_edges(&HashSet::from([id]), self.store.edges()).into_iter().cloned().collect()
    }

    /// Snapshot of nodes, edges, and the current transform.
    #[must_use]
    pub fn to_object(&self) -> FlowExport {
        FlowExport::capture(&self.store, self.viewport.transform())
    }

    #[must_use]
    pub fn get_viewport(&self) -> Viewport {
        self.viewport.transform()
    }

    #[must_use]
    pub fn input_state(&self) -> &InputState {
        &self.input
    }

    /// The connection being dragged or armed, for drawing a preview line.
    #[must_use]
    pub fn connection(&self) -> Option<&ConnectionAttempt> {
        self.connect.attempt()
    }

    /// The live box-selection rectangle in viewport pixels.
    #[must_use]
    pub fn user_selection_rect(&self) -> Option<Rect> {
        self.selection.rect()
    }

    /// The frozen box around the selected nodes (graph space), shown after a
    /// box selection finishes.
    #[must_use]
    pub fn nodes_selection_rect(&self) -> Option<Rect> {
        if !self.store.flags.nodes_selection_active {
            return None;
        }
        selected_nodes_rect(&self.store)
    }

    /// Nodes to draw, bottom to top.
    #[must_use]
    pub fn visible_nodes(&self) -> Vec<&Node> {
        let nodes = self.store.sorted_nodes();
        if !self.config.only_render_visible_elements {
            return nodes.into_iter().filter(|n| !n.hidden).collect();
        }
        let size = self.viewport.size();
        let screen = Rect::new(0.0, 0.0, size.width, size.height);
        get_nodes_inside(nodes, screen, self.viewport.transform(), true)
    }

    /// Edges to draw. Edges with a hidden or missing endpoint are left out.
    #[must_use]
    pub fn visible_edges(&self) -> Vec<&Edge> {
        if self.config.only_render_visible_elements {
            return get_visible_edges(self.store.nodes(), self.store.edges(), self.viewport.visible_rect());
        }
        let shown: HashSet<&str> = self.store.nodes().filter(|n| !n.hidden).map(|n| n.id.as_str()).collect();
        self.store
            .edges()
            .filter(|e| !e.hidden && shown.contains(e.source.as_str()) && shown.contains(e.target.as_str()))
            .collect()
    }

    /// Where edge `id` attaches to its nodes, once their handles are measured.
    #[must_use]
    pub fn edge_anchors(&self, id: &str) -> Option<EdgeAnchors> {
        self.store.edge(id).and_then(|e| edge_anchors(e, &self.store))
    }

    // --- Data inputs ---

    /// Replace every node.
    ///
    /// With engine ownership the store is replaced and edges left without an
    /// endpoint are dropped. With host ownership `reset` changes are emitted
    /// instead (or `remove` changes when `nodes` is empty).
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] when `nodes` fails structural validation.
    pub fn set_nodes(&mut self, nodes: Vec<Node>) -> Result<Vec<Action>, GraphError> {
        validate_nodes(&nodes)?;
        let mut out = Vec::new();
        match self.config.ownership {
            Ownership::Engine => {
                self.store.set_nodes(nodes)?;
                self.prune_edges();
            }
            Ownership::Host => {
                let changes = if nodes.is_empty() {
                    self.store.nodes().map(|n| NodeChange::Remove { id: n.id.clone() }).collect()
                } else {
                    nodes.into_iter().map(|item| NodeChange::Reset { item }).collect()
                };
                out.push(Action::NodesChange(changes));
            }
        }
        Ok(self.finish(out))
    }

    /// [`Self::set_nodes`] with the next nodes computed from the current ones.
    ///
    /// # Errors
    ///
    /// As for [`Self::set_nodes`].
    pub fn set_nodes_with(&mut self, update: impl FnOnce(Vec<Node>) -> Vec<Node>) -> Result<Vec<Action>, GraphError> {
        let next = update(self.get_nodes());
        self.set_nodes(next)
    }

    /// Replace every edge; ownership is handled as in [`Self::set_nodes`].
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] for malformed or dangling edges.
    pub fn set_edges(&mut self, edges: Vec<Edge>) -> Result<Vec<Action>, GraphError> {
        let mut out = Vec::new();
        match self.config.ownership {
            Ownership::Engine => self.store.set_edges(edges)?,
            Ownership::Host => {
                self.check_edges(&edges)?;
                let changes = if edges.is_empty() {
                    self.store.edges().map(|e| EdgeChange::Remove { id: e.id.clone() }).collect()
                } else {
                    edges.into_iter().map(|item| EdgeChange::Reset { item }).collect()
                };
                out.push(Action::EdgesChange(changes));
            }
        }
        Ok(self.finish(out))
    }

    /// [`Self::set_edges`] with the next edges computed from the current ones.
    ///
    /// # Errors
    ///
    /// As for [`Self::set_edges`].
    pub fn set_edges_with(&mut self, update: impl FnOnce(Vec<Edge>) -> Vec<Edge>) -> Result<Vec<Action>, GraphError> {
        let next = update(self.get_edges());
        self.set_edges(next)
    }

    /// Append nodes.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] when the combined collection is invalid
    /// (for example a duplicate id or an unknown parent).
    pub fn add_nodes(&mut self, nodes: Vec<Node>) -> Result<Vec<Action>, GraphError> {
        validate_nodes(self.store.nodes().chain(&nodes))?;
        let changes: Vec<NodeChange> = nodes.into_iter().map(|item| NodeChange::Add { item }).collect();
        let mut out = Vec::new();
        if self.config.ownership == Ownership::Engine {
            self.commit_node_changes(&changes)?;
        }
        out.push(Action::NodesChange(changes));
        Ok(self.finish(out))
    }

    /// Append edges.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] for malformed, duplicate, or dangling edges.
    pub fn add_edges(&mut self, edges: Vec<Edge>) -> Result<Vec<Action>, GraphError> {
        let combined: Vec<Edge> = self.store.edges().cloned().chain(edges.iter().cloned()).collect();
        self.check_edges(&combined)?;
        let changes: Vec<EdgeChange> = edges.into_iter().map(|item| EdgeChange::Add { item }).collect();
        let mut out = Vec::new();
        if self.config.ownership == Ownership::Engine {
            self.commit_edge_changes(&changes)?;
        }
        out.push(Action::EdgesChange(changes));
        Ok(self.finish(out))
    }

    /// Create an edge for a connection intent, as a host typically does in
    /// response to [`Action::Connect`]. An identical connection without an
    /// explicit id is ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] for incomplete connections, unknown nodes,
    /// or a taken explicit id.
    pub fn add_connection(&mut self, connection: &Connection, id: Option<&str>) -> Result<Vec<Action>, GraphError> {
        let current = self.get_edges();
        let mut next = add_edge(connection, id, &current)?;
        if next.len() == current.len() {
            return Ok(Vec::new());
        }
        let Some(edge) = next.pop() else {
            return Ok(Vec::new());
        };
        self.add_edges(vec![edge])
    }

    /// Point an existing edge at new endpoints.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] for an unknown edge or unknown endpoints.
    pub fn reconnect_edge(&mut self, edge_id: &str, connection: &Connection) -> Result<Vec<Action>, GraphError> {
        let next = update_edge(edge_id, connection, &self.get_edges())?;
        self.set_edges(next)
    }

    /// Move node `id` under `parent` (or to the top level with `None`),
    /// keeping its absolute position.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotFound`] for unknown ids and
    /// [`GraphError::CyclicParent`] when `parent` is the node itself or one
    /// of its descendants.
    pub fn set_parent(&mut self, id: &str, parent: Option<&str>) -> Result<Vec<Action>, GraphError> {
        let Some(node) = self.store.node(id) else {
            return Err(GraphError::NotFound { kind: ElementKind::Node, id: id.to_owned() });
        };
        let origin = match parent {
            Some(parent_id) => {
                let Some(parent_node) = self.store.node(parent_id) else {
                    return Err(GraphError::NotFound { kind: ElementKind::Node, id: parent_id.to_owned() });
                };
                if parent_id == id || self.store.is_descendant_of(parent_id, id) {
                    return Err(GraphError::CyclicParent { node_id: id.to_owned() });
                }
                parent_node.internals.position_absolute
            }
            None => Point::default(),
        };
        let position = node.internals.position_absolute.sub(origin);
        let nodes = self
            .store
            .nodes()
            .map(|n| {
                let mut n = n.clone();
                if n.id == id {
                    n.parent_node = parent.map(str::to_owned);
                    n.position = position;
                }
                n
            })
            .collect();
        self.set_nodes(nodes)
    }

    /// Host-side copy of the nodes (host ownership). Derived state is
    /// recomputed and measured handle bounds are kept.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] when `nodes` fails structural validation.
    pub fn sync_nodes(&mut self, nodes: Vec<Node>) -> Result<Vec<Action>, GraphError> {
        self.store.set_nodes(nodes)?;
        self.prune_edges();
        Ok(self.finish(Vec::new()))
    }

    /// Host-side copy of the edges (host ownership).
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] for malformed or dangling edges.
    pub fn sync_edges(&mut self, edges: Vec<Edge>) -> Result<Vec<Action>, GraphError> {
        self.store.set_edges(edges)?;
        Ok(self.finish(Vec::new()))
    }

    /// Fold node change records into the store regardless of ownership.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] (store unchanged) when the result is invalid.
    pub fn apply_node_changes(&mut self, changes: &[NodeChange]) -> Result<Vec<Action>, GraphError> {
        self.commit_node_changes(changes)?;
        Ok(self.finish(Vec::new()))
    }

    /// Fold edge change records into the store regardless of ownership.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] (store unchanged) when the result is invalid.
    pub fn apply_edge_changes(&mut self, changes: &[EdgeChange]) -> Result<Vec<Action>, GraphError> {
        self.commit_edge_changes(changes)?;
        Ok(self.finish(Vec::new()))
    }

    /// Record measured sizes and handle geometry.
    ///
    /// Handle bounds are stored immediately; size changes go out as
    /// `dimensions` change records. Unknown ids are skipped.
    pub fn update_node_dimensions(&mut self, updates: Vec<NodeDimensionUpdate>) -> Vec<Action> {
        let mut changes = Vec::new();
        for update in updates {
            let Some(node) = self.store.node(&update.id) else {
                warn!(engine = %self.id, node_id = %update.id, "dimensions reported for unknown node");
                continue;
            };
            let resized = node.dimensions() != Some(update.dimensions);
            if let Some(bounds) = update.handle_bounds {
                self.store.set_handle_bounds(&update.id, bounds);
            }
            if resized {
                changes.push(NodeChange::Dimensions {
                    id: update.id,
                    dimensions: Some(update.dimensions),
                    position: None,
                    dragging: None,
                });
            }
        }
        let mut out = Vec::new();
        self.emit_node_changes(changes, &mut out);
        self.finish(out)
    }

    /// Restore a snapshot: nodes, edges, and viewport.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] (nothing changed) when the snapshot does not
    /// describe a valid graph.
    pub fn load_object(&mut self, export: FlowExport) -> Result<Vec<Action>, GraphError> {
        export.validate()?;
        let FlowExport { nodes, edges, viewport } = export;
        let mut out = Vec::new();
        match self.config.ownership {
            Ownership::Engine => self.store.replace(nodes, edges)?,
            Ownership::Host => {
                out.push(Action::NodesChange(nodes.into_iter().map(|item| NodeChange::Reset { item }).collect()));
                out.push(Action::EdgesChange(edges.into_iter().map(|item| EdgeChange::Reset { item }).collect()));
            }
        }
        debug!(engine = %self.id, nodes = self.store.len(), "snapshot loaded");
        out.extend(self.viewport_op(|vp| vp.set_viewport(viewport, None)));
        Ok(self.finish(out))
    }

    // --- Selection ---

    /// Make exactly these nodes and edges selected.
    pub fn select(&mut self, node_ids: &[&str], edge_ids: &[&str]) -> Vec<Action> {
        let nodes: HashSet<&str> = node_ids.iter().copied().collect();
        let edges: HashSet<&str> = edge_ids.iter().copied().collect();
        let changes = select_exactly(&self.store, &nodes, &edges);
        let mut out = Vec::new();
        self.emit_selection(changes, &mut out);
        self.finish(out)
    }

    /// Edge click reported by the host, which owns edge hit-testing.
    pub fn select_edge(&mut self, id: &str, multi: bool) -> Vec<Action> {
        let selectable = self.store.edge(id).is_some_and(|e| e.is_selectable(self.config.elements_selectable));
        if !selectable {
            return Vec::new();
        }
        self.store.flags.nodes_selection_active = false;
        let changes = click_edge(&self.store, id, multi);
        let mut out = Vec::new();
        self.emit_selection(changes, &mut out);
        self.finish(out)
    }

    /// Remove nodes and edges.
    ///
    /// Non-deletable elements are skipped. Children of removed nodes are
    /// removed with them, as are all edges attached to any removed node.
    pub fn delete_elements(&mut self, node_ids: &[&str], edge_ids: &[&str]) -> Vec<Action> {
        let mut out = Vec::new();
        self.remove_elements(node_ids, edge_ids, &mut out);
        self.finish(out)
    }

    // --- Viewport ---

    /// Resize the canvas element.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport.set_size(Dimensions::new(width, height));
    }

    /// Viewport pixel to graph point, snapped when snapping is on.
    #[must_use]
    pub fn project(&self, pixel: Point) -> Point {
        self.viewport.project(pixel, self.config.snap())
    }

    pub fn zoom_in(&mut self, duration_ms: Option<f64>) -> Vec<Action> {
        self.viewport_op(|vp| vp.zoom_in(duration_ms))
    }

    pub fn zoom_out(&mut self, duration_ms: Option<f64>) -> Vec<Action> {
        self.viewport_op(|vp| vp.zoom_out(duration_ms))
    }

    pub fn zoom_to(&mut self, level: f64, duration_ms: Option<f64>) -> Vec<Action> {
        self.viewport_op(|vp| vp.zoom_to(level, None, duration_ms))
    }

    pub fn set_viewport(&mut self, viewport: Viewport, duration_ms: Option<f64>) -> Vec<Action> {
        self.viewport_op(|vp| vp.set_viewport(viewport, duration_ms))
    }

    pub fn set_center(&mut self, x: f64, y: f64, options: SetCenterOptions) -> Vec<Action> {
        self.viewport_op(|vp| vp.set_center(x, y, options))
    }

    pub fn fit_bounds(&mut self, bounds: Rect, options: FitBoundsOptions) -> Vec<Action> {
        self.viewport_op(|vp| {
            vp.fit_bounds(bounds, options);
        })
    }

    /// Frame the nodes in the viewport.
    ///
    /// Nothing happens while there are no nodes to fit or any of them is
    /// still unmeasured; call again once dimensions arrive.
    pub fn fit_view(&mut self, options: &FitViewOptions) -> Vec<Action> {
        let wanted: Option<HashSet<&str>> = options.nodes.as_ref().map(|ids| ids.iter().map(String::as_str).collect());
        let nodes: Vec<&Node> = self
            .store
            .nodes()
            .filter(|n| options.include_hidden || !n.hidden)
            .filter(|n| wanted.as_ref().is_none_or(|ids| ids.contains(n.id.as_str())))
            .collect();
        if nodes.is_empty() || nodes.iter().any(|n| !n.is_measured()) {
            debug!(engine = %self.id, count = nodes.len(), "fit view skipped: nothing measured to fit");
            return Vec::new();
        }
        let bounds = get_rect_of_nodes(nodes);
        let fit = FitBoundsOptions {
            padding: options.padding.unwrap_or(self.config.fit_view_padding),
            duration_ms: options.duration_ms,
        };
        let min_zoom = options.min_zoom.unwrap_or(self.config.min_zoom);
        let max_zoom = options.max_zoom.unwrap_or(self.config.max_zoom);
        self.viewport_op(|vp| {
            vp.fit_bounds_within(bounds, fit, min_zoom, max_zoom);
        })
    }

    /// Advance an animated viewport change to `now_ms`.
    pub fn tick(&mut self, now_ms: f64) -> Vec<Action> {
        let Some(step) = self.viewport.tick(now_ms) else {
            return Vec::new();
        };
        let mut out = vec![Action::Move(step.viewport)];
        if step.finished {
            out.push(Action::MoveEnd(step.viewport));
        }
        out
    }

    // --- Input events ---

    /// Pointer pressed at viewport pixel `screen_pt`.
    ///
    /// Starts at most one gesture. A press while another gesture is active
    /// is ignored.
    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        if self.input.is_active() {
            return Vec::new();
        }
        self.store.flags.multi_selection_active = modifiers.multi();
        let mut out = Vec::new();
        let transform = self.viewport.transform();
        let world = self.viewport.project(screen_pt, None);
        let hit = hit_test(world, &self.store, transform.zoom, self.nodes_selection_rect());

        if self.connect.is_armed() && !matches!(hit, Hit::Handle(_)) {
            self.connect.cancel();
            out.push(Action::ConnectEnd);
        }

        if button != Button::Primary {
            if hit == Hit::Pane && self.config.pan_on_drag {
                self.begin_pan(screen_pt, None, &mut out);
            }
            return self.finish(out);
        }

        match hit {
            Hit::Handle(handle) if self.is_connectable(&handle.node_id) => {
                self.press_handle(handle, screen_pt, &mut out);
            }
            Hit::Handle(HandleHit { node_id: id, .. }) | Hit::Node { id } => {
                self.press_node(&id, screen_pt, modifiers, &mut out);
            }
            Hit::NodesSelection => {
                let pointer = self.viewport.project(screen_pt, self.config.snap());
                if self.drag.start(&self.store, None, pointer, &self.config) {
                    self.input = InputState::Dragging;
                }
            }
            Hit::Pane => self.press_pane(screen_pt, modifiers, &mut out),
        }
        self.finish(out)
    }

    /// Pointer moved to viewport pixel `screen_pt`.
    pub fn on_pointer_move(&mut self, screen_pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        let mut out = Vec::new();
        match self.input {
            InputState::Panning { last_screen } => {
                if screen_pt != last_screen {
                    let moved = self.viewport.pan(screen_pt.x - last_screen.x, screen_pt.y - last_screen.y);
                    self.input = InputState::Panning { last_screen: screen_pt };
                    out.push(Action::Move(moved));
                }
            }
            InputState::Dragging => {
                let pointer = self.viewport.project(screen_pt, self.config.snap());
                let first = !self.drag.has_moved();
                let changes = self.drag.drag(pointer, &self.config);
                if !changes.is_empty() {
                    let node_id = self.drag.node_id().map(str::to_owned);
                    let node_ids: Vec<String> = self.drag.items().iter().map(|i| i.id.clone()).collect();
                    if first {
                        out.push(Action::NodeDragStart { node_id: node_id.clone(), node_ids: node_ids.clone() });
                    }
                    self.emit_node_changes(changes, &mut out);
                    out.push(Action::NodeDrag { node_id, node_ids });
                }
            }
            InputState::Selecting => {
                let changes = self.selection.update(screen_pt, &self.store, self.viewport.transform(), &self.config);
                self.emit_selection(changes, &mut out);
            }
            InputState::Connecting | InputState::Idle => {
                let ctx = ConnectContext {
                    store: &self.store,
                    transform: self.viewport.transform(),
                    config: &self.config,
                    validator: &*self.validator,
                };
                self.connect.update(screen_pt, &ctx);
            }
        }
        self.finish(out)
    }

    /// Pointer released at viewport pixel `screen_pt`. Always ends the
    /// active gesture.
    pub fn on_pointer_up(&mut self, screen_pt: Point, _button: Button, _modifiers: Modifiers) -> Vec<Action> {
        let mut out = Vec::new();
        let press = self.press.take();
        let clicked = press.as_ref().is_some_and(|p| p.screen == screen_pt);
        match std::mem::take(&mut self.input) {
            InputState::Panning { .. } => {
                self.viewport.set_moving(false);
                out.push(Action::MoveEnd(self.viewport.transform()));
                if clicked && press.is_some_and(|p| p.target == PressTarget::Pane) {
                    self.pane_click(&mut out);
                }
            }
            InputState::Dragging => self.release_drag(&mut out),
            InputState::Selecting => {
                let empty = self.selection.rect().is_none_or(|r| r.area() <= 0.0);
                self.store.flags.nodes_selection_active = self.selection.end();
                if empty {
                    out.push(Action::PaneClick);
                }
            }
            InputState::Connecting => self.release_connection(screen_pt, clicked, press, &mut out),
            InputState::Idle => match press.map(|p| p.target) {
                Some(PressTarget::Node(id)) if clicked => out.push(Action::NodeClick { id }),
                Some(PressTarget::Pane) if clicked => self.pane_click(&mut out),
                _ => {}
            },
        }
        self.finish(out)
    }

    /// The pointer was lost (capture released, window blurred). Ends the
    /// active gesture without committing it.
    pub fn on_pointer_cancel(&mut self) -> Vec<Action> {
        let mut out = Vec::new();
        self.cancel_gesture(&mut out);
        self.finish(out)
    }

    /// Wheel or trackpad scroll at viewport pixel `screen_pt`.
    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        if self.config.pan_on_scroll && !modifiers.ctrl {
            let (dx, dy) = if modifiers.shift { (delta.dy, delta.dx) } else { (delta.dx, delta.dy) };
            return self.viewport_op(|vp| {
                vp.pan(-dx, -dy);
            });
        }
        if !self.config.zoom_on_scroll && !modifiers.ctrl {
            return Vec::new();
        }
        let factor = 2f64.powf(-delta.dy / WHEEL_ZOOM_DIVISOR);
        self.viewport_op(|vp| {
            vp.zoom_by(factor, screen_pt);
        })
    }

    pub fn on_key_down(&mut self, key: Key, modifiers: Modifiers) -> Vec<Action> {
        self.store.flags.multi_selection_active = modifiers.multi() || is_multi_key(&key);
        let mut out = Vec::new();
        if key.name() == "Escape" {
            self.escape(&mut out);
        } else if self.input.is_active() {
            return self.finish(out);
        } else if self.config.is_delete_key(key.name()) {
            let nodes = self.store.selected_node_ids();
            let edges = self.store.selected_edge_ids();
            let nodes: Vec<&str> = nodes.iter().map(String::as_str).collect();
            let edges: Vec<&str> = edges.iter().map(String::as_str).collect();
            self.remove_elements(&nodes, &edges, &mut out);
        } else if let Some(direction) = key.arrow_direction() {
            let changes = nudge_selection(&self.store, direction, modifiers.shift, &self.config);
            self.emit_node_changes(changes, &mut out);
        }
        self.finish(out)
    }

    pub fn on_key_up(&mut self, key: Key, modifiers: Modifiers) -> Vec<Action> {
        self.store.flags.multi_selection_active = modifiers.multi() && !is_multi_key(&key);
        Vec::new()
    }

    // --- Gesture helpers ---

    fn is_connectable(&self, node_id: &str) -> bool {
        self.store.node(node_id).is_some_and(|n| n.is_connectable(self.config.nodes_connectable))
    }

    fn press_handle(&mut self, handle: HandleHit, screen_pt: Point, out: &mut Vec<Action>) {
        if self.connect.is_armed() {
            let ctx = ConnectContext {
                store: &self.store,
                transform: self.viewport.transform(),
                config: &self.config,
                validator: &*self.validator,
            };
            match self.connect.click_handle(&handle, screen_pt, &ctx) {
                ClickConnect::Connected(connection) => {
                    out.push(Action::Connect(connection));
                    out.push(Action::ConnectEnd);
                }
                ClickConnect::Cancelled => out.push(Action::ConnectEnd),
                ClickConnect::Armed(start) => out.push(Action::ConnectStart(start)),
            }
            return;
        }
        let start = self.connect.start_drag(&handle, screen_pt);
        self.press = Some(Press { screen: screen_pt, target: PressTarget::Handle(handle) });
        self.input = InputState::Connecting;
        out.push(Action::ConnectStart(start));
    }

    fn press_node(&mut self, id: &str, screen_pt: Point, modifiers: Modifiers, out: &mut Vec<Action>) {
        let Some(node) = self.store.node(id) else {
            return;
        };
        let selectable = node.is_selectable(self.config.elements_selectable);
        let was_selected = node.selected;
        let pointer = self.viewport.project(screen_pt, self.config.snap());
        let dragging = self.drag.start(&self.store, Some(id), pointer, &self.config);
        self.store.flags.nodes_selection_active = false;

        self.pending_toggle = None;
        if selectable && dragging && self.config.select_nodes_on_drag {
            // Deselecting waits for the release, so the node can still drag.
            if was_selected && modifiers.multi() {
                self.pending_toggle = Some(id.to_owned());
            }
            let changes = select_on_press(&self.store, id, modifiers.multi());
            self.emit_selection(changes, out);
        } else if selectable && !dragging {
            let changes = click_node(&self.store, id, modifiers.multi());
            self.emit_selection(changes, out);
        } else if !modifiers.multi() && !was_selected {
            let changes = clear_selection(&self.store);
            self.emit_selection(changes, out);
        }

        if dragging {
            self.input = InputState::Dragging;
        } else {
            self.press = Some(Press { screen: screen_pt, target: PressTarget::Node(id.to_owned()) });
        }
    }

    fn press_pane(&mut self, screen_pt: Point, modifiers: Modifiers, out: &mut Vec<Action>) {
        let box_select = self.config.elements_selectable && (modifiers.shift || self.config.selection_on_drag);
        if box_select {
            self.store.flags.nodes_selection_active = false;
            let changes = self.selection.start(screen_pt, &self.store);
            self.emit_selection(changes, out);
            self.input = InputState::Selecting;
        } else if self.config.pan_on_drag {
            self.begin_pan(screen_pt, Some(PressTarget::Pane), out);
        } else {
            self.press = Some(Press { screen: screen_pt, target: PressTarget::Pane });
        }
    }

    fn begin_pan(&mut self, screen_pt: Point, target: Option<PressTarget>, out: &mut Vec<Action>) {
        let transform = self.viewport.transform();
        if self.viewport.cancel_transition() {
            out.push(Action::MoveEnd(transform));
        }
        self.viewport.set_moving(true);
        self.input = InputState::Panning { last_screen: screen_pt };
        self.press = target.map(|target| Press { screen: screen_pt, target });
        out.push(Action::MoveStart(transform));
    }

    fn release_drag(&mut self, out: &mut Vec<Action>) {
        let node_id = self.drag.node_id().map(str::to_owned);
        let pending_toggle = self.pending_toggle.take();
        match self.drag.stop() {
            Some(DragEnd::Click { node_id: Some(id) }) => {
                let selectable = self.store.node(&id).is_some_and(|n| n.is_selectable(self.config.elements_selectable));
                let toggle = pending_toggle.as_deref() == Some(id.as_str());
                if selectable && (toggle || !self.config.select_nodes_on_drag) {
                    let changes = click_node(&self.store, &id, self.store.flags.multi_selection_active);
                    self.emit_selection(changes, out);
                }
                out.push(Action::NodeClick { id });
            }
            Some(DragEnd::Moved { node_ids, changes }) => {
                self.emit_node_changes(changes, out);
                out.push(Action::NodeDragStop { node_id, node_ids });
            }
            Some(DragEnd::Click { node_id: None }) | None => {}
        }
    }

    fn release_connection(&mut self, screen_pt: Point, clicked: bool, press: Option<Press>, out: &mut Vec<Action>) {
        let ctx = ConnectContext {
            store: &self.store,
            transform: self.viewport.transform(),
            config: &self.config,
            validator: &*self.validator,
        };
        if clicked && self.config.connect_on_click {
            if let Some(PressTarget::Handle(handle)) = press.map(|p| p.target) {
                // A press and release on the same spot arms click-to-connect.
                self.connect.cancel();
                self.connect.click_handle(&handle, screen_pt, &ctx);
                return;
            }
        }
        if let Some(connection) = self.connect.end_drag(screen_pt, &ctx) {
            out.push(Action::Connect(connection));
        }
        out.push(Action::ConnectEnd);
    }

    fn pane_click(&mut self, out: &mut Vec<Action>) {
        self.store.flags.nodes_selection_active = false;
        let changes = clear_selection(&self.store);
        self.emit_selection(changes, out);
        out.push(Action::PaneClick);
    }

    /// Ends the active gesture with nothing committed. Dragged nodes stay
    /// where the last move put them; a drag-connect reports no connection.
    /// An armed click-connect survives.
    fn cancel_gesture(&mut self, out: &mut Vec<Action>) {
        self.press = None;
        self.pending_toggle = None;
        match std::mem::take(&mut self.input) {
            InputState::Panning { .. } => {
                self.viewport.set_moving(false);
                out.push(Action::MoveEnd(self.viewport.transform()));
            }
            InputState::Dragging => {
                let node_id = self.drag.node_id().map(str::to_owned);
                let node_ids: Vec<String> = self.drag.items().iter().map(|i| i.id.clone()).collect();
                let changes = self.drag.cancel();
                if !changes.is_empty() {
                    self.emit_node_changes(changes, out);
                    out.push(Action::NodeDragStop { node_id, node_ids });
                }
            }
            InputState::Selecting => {
                self.selection.cancel();
                self.store.flags.nodes_selection_active = false;
            }
            InputState::Connecting => {
                self.connect.cancel();
                out.push(Action::ConnectEnd);
            }
            InputState::Idle => {}
        }
        debug!(engine = %self.id, "gesture cancelled");
    }

    fn escape(&mut self, out: &mut Vec<Action>) {
        match self.input {
            InputState::Panning { .. } | InputState::Dragging | InputState::Connecting => {
                self.cancel_gesture(out);
                return;
            }
            InputState::Selecting => self.cancel_gesture(out),
            InputState::Idle => {
                if self.connect.cancel() {
                    out.push(Action::ConnectEnd);
                    return;
                }
            }
        }
        self.store.flags.nodes_selection_active = false;
        let changes = clear_selection(&self.store);
        self.emit_selection(changes, out);
    }

    fn remove_elements(&mut self, node_ids: &[&str], edge_ids: &[&str], out: &mut Vec<Action>) {
        let mut doomed: HashSet<String> = node_ids
            .iter()
            .filter(|id| self.store.node(id).is_some_and(Node::is_deletable))
            .map(|id| (*id).to_owned())
            .collect();
        // Children go with their parents, however deep.
        loop {
            let children: Vec<String> = self
                .store
                .nodes()
                .filter(|n| !doomed.contains(&n.id))
                .filter(|n| n.parent_node.as_ref().is_some_and(|p| doomed.contains(p)))
                .map(|n| n.id.clone())
                .collect();
            if children.is_empty() {
                break;
            }
            doomed.extend(children);
        }

        let doomed_refs: HashSet<&str> = doomed.iter().map(String::as_str).collect();
        let requested: HashSet<&str> = edge_ids.iter().copied().collect();
        let connected: HashSet<&str> =
            get_connected_edges(&doomed_refs, self.store.edges()).into_iter().map(|e| e.id.as_str()).collect();
        let edge_changes: Vec<EdgeChange> = self
            .store
            .edges()
            .filter(|e| connected.contains(e.id.as_str()) || (requested.contains(e.id.as_str()) && e.is_deletable()))
            .map(|e| EdgeChange::Remove { id: e.id.clone() })
            .collect();
        let node_changes: Vec<NodeChange> = self
            .store
            .nodes()
            .filter(|n| doomed.contains(&n.id))
            .map(|n| NodeChange::Remove { id: n.id.clone() })
            .collect();

        debug!(engine = %self.id, nodes = node_changes.len(), edges = edge_changes.len(), "removing elements");
        self.emit_edge_changes(edge_changes, out);
        self.emit_node_changes(node_changes, out);
    }

    // --- Change plumbing ---

    fn check_edges(&self, edges: &[Edge]) -> Result<(), GraphError> {
        let ids: HashSet<&str> = self.store.nodes().map(|n| n.id.as_str()).collect();
        validate_edges(edges, &ids)
    }

    fn commit_node_changes(&mut self, changes: &[NodeChange]) -> Result<(), GraphError> {
        let next = apply_node_changes(changes, self.store.node_handles());
        self.store.commit_nodes(next)?;
        self.prune_edges();
        Ok(())
    }

    fn commit_edge_changes(&mut self, changes: &[EdgeChange]) -> Result<(), GraphError> {
        let next = apply_edge_changes(changes, self.store.edge_handles());
        self.store.commit_edges(next)
    }

    fn prune_edges(&mut self) {
        let dropped = self.store.prune_dangling_edges();
        if !dropped.is_empty() {
            warn!(engine = %self.id, edges = ?dropped, "dropped edges whose endpoints no longer exist");
        }
    }

    /// Apply (engine ownership) and report a batch of engine-generated changes.
    fn emit_node_changes(&mut self, changes: Vec<NodeChange>, out: &mut Vec<Action>) {
        if changes.is_empty() {
            return;
        }
        debug!(engine = %self.id, count = changes.len(), "node changes");
        if self.config.ownership == Ownership::Engine {
            if let Err(err) = self.commit_node_changes(&changes) {
                warn!(engine = %self.id, %err, "node changes rejected by the store");
            }
        }
        out.push(Action::NodesChange(changes));
    }

    fn emit_edge_changes(&mut self, changes: Vec<EdgeChange>, out: &mut Vec<Action>) {
        if changes.is_empty() {
            return;
        }
        debug!(engine = %self.id, count = changes.len(), "edge changes");
        if self.config.ownership == Ownership::Engine {
            if let Err(err) = self.commit_edge_changes(&changes) {
                warn!(engine = %self.id, %err, "edge changes rejected by the store");
            }
        }
        out.push(Action::EdgesChange(changes));
    }

    fn emit_selection(&mut self, changes: SelectionChanges, out: &mut Vec<Action>) {
        self.emit_node_changes(changes.nodes, out);
        self.emit_edge_changes(changes.edges, out);
    }

    /// Run a viewport operation and report the move notifications it caused.
    ///
    /// An instant change reports start, move, and end together. An animated
    /// one reports only the start here; [`Self::tick`] reports the rest.
    fn viewport_op(&mut self, op: impl FnOnce(&mut ViewportController)) -> Vec<Action> {
        let was_animating = self.viewport.is_animating();
        let before = self.viewport.transform();
        op(&mut self.viewport);
        let after = self.viewport.transform();

        let mut out = Vec::new();
        if self.viewport.is_animating() {
            if !was_animating {
                out.push(Action::MoveStart(before));
            }
        } else if after != before || was_animating {
            if !was_animating {
                out.push(Action::MoveStart(before));
            }
            out.push(Action::Move(after));
            out.push(Action::MoveEnd(after));
        }
        out
    }

    /// Append a selection notification when the selected sets changed.
    fn finish(&mut self, mut out: Vec<Action>) -> Vec<Action> {
        let nodes = self.store.selected_node_ids();
        let edges = self.store.selected_edge_ids();
        if nodes.is_empty() {
            self.store.flags.nodes_selection_active = false;
        }
        if nodes != self.last_selection.0 || edges != self.last_selection.1 {
            out.push(Action::SelectionChange { nodes: nodes.clone(), edges: edges.clone() });
            self.last_selection = (nodes, edges);
        }
        out
    }
}

fn is_multi_key(key: &Key) -> bool {
    matches!(key.name(), "Control" | "Meta")
}
