//! Connection interaction controller and edge construction helpers.
//!
//! The controller tracks one connection attempt at a time, started either by
//! pressing on a handle and dragging (drag-to-connect) or by clicking a
//! handle and then another (click-to-connect). Its only output is a
//! connection *intent*: a [`Connection`] that passed the connection-mode rule
//! and the host's [`ConnectionValidator`]. Creating the edge is left to
//! whoever receives the intent, typically via [`add_edge`].

#[cfg(test)]
#[path = "connect_test.rs"]
mod connect_test;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ConnectionMode, EngineConfig};
use crate::error::{EdgeEnd, ElementKind, GraphError};
use crate::geometry::{Point, Viewport, point_to_renderer_point};
use crate::graph::{Edge, GraphStore, HandleType};
use crate::hit::{HandleHit, closest_handle};

/// A proposed edge between two handles.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
}

impl Connection {
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self { source: source.into(), target: target.into(), source_handle: None, target_handle: None }
    }

    /// Builder: set both handle ids.
    #[must_use]
    pub fn with_handles(mut self, source_handle: Option<&str>, target_handle: Option<&str>) -> Self {
        self.source_handle = source_handle.map(str::to_owned);
        self.target_handle = target_handle.map(str::to_owned);
        self
    }

    /// Whether `edge` already joins the same handles.
    #[must_use]
    pub fn matches(&self, edge: &Edge) -> bool {
        edge.source == self.source
            && edge.target == self.target
            && edge.source_handle == self.source_handle
            && edge.target_handle == self.target_handle
    }
}

/// Host-supplied rule that can veto a connection.
pub trait ConnectionValidator {
    fn is_valid(&self, connection: &Connection) -> bool;
}

impl<F: Fn(&Connection) -> bool> ConnectionValidator for F {
    fn is_valid(&self, connection: &Connection) -> bool {
        self(connection)
    }
}

/// Accepts every connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl ConnectionValidator for AllowAll {
    fn is_valid(&self, _connection: &Connection) -> bool {
        true
    }
}

/// The handle a connection attempt started from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStart {
    pub node_id: String,
    pub handle_id: Option<String>,
    pub handle_type: HandleType,
}

impl ConnectionStart {
    fn is_handle(&self, hit: &HandleHit) -> bool {
        self.node_id == hit.node_id && self.handle_id == hit.handle_id && self.handle_type == hit.kind
    }
}

impl From<&HandleHit> for ConnectionStart {
    fn from(hit: &HandleHit) -> Self {
        Self { node_id: hit.node_id.clone(), handle_id: hit.handle_id.clone(), handle_type: hit.kind }
    }
}

/// Live state of a connection attempt, for visual feedback.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionAttempt {
    pub from: ConnectionStart,
    /// Current pointer position in viewport pixels.
    pub pointer: Point,
    /// Handle the pointer currently rests near.
    pub hovered: Option<HandleHit>,
    /// Whether releasing now would produce a connection.
    pub valid: bool,
}

/// Result of clicking a handle in click-to-connect mode.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickConnect {
    /// First click: the attempt is armed.
    Armed(ConnectionStart),
    /// Second click on a compatible handle.
    Connected(Connection),
    /// Second click on the same or an incompatible handle.
    Cancelled,
}

#[derive(Debug, Clone, Default)]
enum ConnectState {
    #[default]
    Idle,
    Dragging(ConnectionAttempt),
    Armed(ConnectionAttempt),
}

/// Shared inputs for evaluating a candidate handle.
pub struct ConnectContext<'a> {
    pub store: &'a GraphStore,
    pub transform: Viewport,
    pub config: &'a EngineConfig,
    pub validator: &'a dyn ConnectionValidator,
}

/// Drag-to-connect and click-to-connect state machine.
#[derive(Debug, Clone, Default)]
pub struct ConnectController {
    state: ConnectState,
}

impl ConnectController {
    /// The attempt in progress, dragged or armed.
    #[must_use]
    pub fn attempt(&self) -> Option<&ConnectionAttempt> {
        match &self.state {
            ConnectState::Idle => None,
            ConnectState::Dragging(a) | ConnectState::Armed(a) => Some(a),
        }
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, ConnectState::Dragging(_))
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        matches!(self.state, ConnectState::Armed(_))
    }

    /// Pointer-down on a handle: begin dragging a connection from it.
    pub fn start_drag(&mut self, from: &HandleHit, pointer: Point) -> ConnectionStart {
        let start = ConnectionStart::from(from);
        debug!(node_id = %start.node_id, handle = ?start.handle_id, "connection drag started");
        self.state = ConnectState::Dragging(ConnectionAttempt { from: start.clone(), pointer, hovered: None, valid: false });
        start
    }

    /// Pointer moved: re-evaluate the nearest handle and its validity.
    pub fn update(&mut self, pointer: Point, ctx: &ConnectContext<'_>) {
        let (ConnectState::Dragging(attempt) | ConnectState::Armed(attempt)) = &mut self.state else {
            return;
        };
        attempt.pointer = pointer;
        let world = point_to_renderer_point(pointer, ctx.transform, None);
        let from = &attempt.from;
        attempt.hovered = closest_handle(world, ctx.store, ctx.transform.zoom, ctx.config.connection_radius, |h| {
            !from.is_handle(h) && is_connectable(ctx, &h.node_id)
        });
        attempt.valid = attempt.hovered.as_ref().is_some_and(|h| evaluate(from, h, ctx).is_some());
    }

    /// Pointer-up ending a drag: the intent if the release lands on a valid handle.
    ///
    /// The attempt always ends; invalid releases are discarded silently.
    pub fn end_drag(&mut self, pointer: Point, ctx: &ConnectContext<'_>) -> Option<Connection> {
        if !self.is_dragging() {
            return None;
        }
        self.update(pointer, ctx);
        let ConnectState::Dragging(attempt) = std::mem::take(&mut self.state) else {
            return None;
        };
        let connection = attempt.hovered.as_ref().and_then(|h| evaluate(&attempt.from, h, ctx));
        debug!(connected = connection.is_some(), "connection drag ended");
        connection
    }

    /// Click on a handle in click-to-connect mode.
    pub fn click_handle(&mut self, hit: &HandleHit, pointer: Point, ctx: &ConnectContext<'_>) -> ClickConnect {
        let ConnectState::Armed(attempt) = std::mem::take(&mut self.state) else {
            let start = ConnectionStart::from(hit);
            debug!(node_id = %start.node_id, handle = ?start.handle_id, "connection armed");
            self.state = ConnectState::Armed(ConnectionAttempt { from: start.clone(), pointer, hovered: None, valid: false });
            return ClickConnect::Armed(start);
        };
        if attempt.from.is_handle(hit) || !is_connectable(ctx, &hit.node_id) {
            return ClickConnect::Cancelled;
        }
        evaluate(&attempt.from, hit, ctx).map_or(ClickConnect::Cancelled, ClickConnect::Connected)
    }

    /// Drop any attempt. Returns `true` if one was in progress.
    pub fn cancel(&mut self) -> bool {
        let was_active = !matches!(self.state, ConnectState::Idle);
        self.state = ConnectState::Idle;
        was_active
    }
}

fn is_connectable(ctx: &ConnectContext<'_>, node_id: &str) -> bool {
    ctx.store.node(node_id).is_some_and(|n| n.is_connectable(ctx.config.nodes_connectable))
}

/// Orient `from -> to` as a connection and check it against the mode rule
/// and the validator.
fn evaluate(from: &ConnectionStart, to: &HandleHit, ctx: &ConnectContext<'_>) -> Option<Connection> {
    if !mode_allows(ctx.config.connection_mode, from, to) {
        return None;
    }
    let connection = orient(from, to);
    ctx.validator.is_valid(&connection).then_some(connection)
}

/// Whether the connection mode permits pairing `from` with `to`.
#[must_use]
pub fn mode_allows(mode: ConnectionMode, from: &ConnectionStart, to: &HandleHit) -> bool {
    match mode {
        ConnectionMode::Strict => from.handle_type != to.kind,
        ConnectionMode::Loose => !from.is_handle(to),
    }
}

/// Build the connection with source/target assigned by the starting handle's role.
#[must_use]
pub fn orient(from: &ConnectionStart, to: &HandleHit) -> Connection {
    let (source, source_handle, target, target_handle) = match from.handle_type {
        HandleType::Source => (&from.node_id, &from.handle_id, &to.node_id, &to.handle_id),
        HandleType::Target => (&to.node_id, &to.handle_id, &from.node_id, &from.handle_id),
    };
    Connection {
        source: source.clone(),
        target: target.clone(),
        source_handle: source_handle.clone(),
        target_handle: target_handle.clone(),
    }
}

/// Deterministic id for an edge created from `connection`:
/// `edge-{source}{sourceHandle}-{target}{targetHandle}`.
#[must_use]
pub fn edge_id(connection: &Connection) -> String {
    format!(
        "edge-{}{}-{}{}",
        connection.source,
        connection.source_handle.as_deref().unwrap_or_default(),
        connection.target,
        connection.target_handle.as_deref().unwrap_or_default()
    )
}

fn check_endpoints(connection: &Connection, edge_id: &str) -> Result<(), GraphError> {
    if connection.source.is_empty() {
        return Err(GraphError::MissingEndpoint { edge_id: edge_id.to_owned(), end: EdgeEnd::Source });
    }
    if connection.target.is_empty() {
        return Err(GraphError::MissingEndpoint { edge_id: edge_id.to_owned(), end: EdgeEnd::Target });
    }
    Ok(())
}

/// Append an edge for `connection` to `edges`.
///
/// Without an explicit id the edge gets [`edge_id`] and an identical
/// existing connection makes this a no-op; with an explicit id duplicates
/// of the same connection are allowed.
///
/// # Errors
///
/// [`GraphError::MissingEndpoint`] when source or target is empty, and
/// [`GraphError::DuplicateId`] when the id is already taken.
pub fn add_edge(connection: &Connection, explicit_id: Option<&str>, edges: &[Edge]) -> Result<Vec<Edge>, GraphError> {
    let id = explicit_id.map_or_else(|| edge_id(connection), str::to_owned);
    check_endpoints(connection, &id)?;
    if explicit_id.is_none() && edges.iter().any(|e| connection.matches(e)) {
        debug!(%id, "connection already exists");
        return Ok(edges.to_vec());
    }
    if edges.iter().any(|e| e.id == id) {
        return Err(GraphError::DuplicateId { kind: ElementKind::Edge, id });
    }
    let mut edge = Edge::new(id, connection.source.clone(), connection.target.clone());
    edge.source_handle.clone_from(&connection.source_handle);
    edge.target_handle.clone_from(&connection.target_handle);
    let mut next = edges.to_vec();
    next.push(edge);
    Ok(next)
}

/// Reconnect `old_edge_id` to `connection`. The edge keeps its other
/// fields, gets a fresh [`edge_id`], and moves to the end of the list.
///
/// # Errors
///
/// [`GraphError::NotFound`] for an unknown edge and
/// [`GraphError::MissingEndpoint`] for an incomplete connection.
pub fn update_edge(old_edge_id: &str, connection: &Connection, edges: &[Edge]) -> Result<Vec<Edge>, GraphError> {
    let Some(old) = edges.iter().find(|e| e.id == old_edge_id) else {
        return Err(GraphError::NotFound { kind: ElementKind::Edge, id: old_edge_id.to_owned() });
    };
    let id = edge_id(connection);
    check_endpoints(connection, &id)?;
    let updated = Edge {
        id,
        source: connection.source.clone(),
        target: connection.target.clone(),
        source_handle: connection.source_handle.clone(),
        target_handle: connection.target_handle.clone(),
        ..old.clone()
    };
    let mut next: Vec<Edge> = edges.iter().filter(|e| e.id != old_edge_id).cloned().collect();
    next.push(updated);
    Ok(next)
}
