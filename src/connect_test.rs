use super::*;
use crate::graph::{HandleBounds, HandleElement, HandlePosition, Node};

fn handle(id: &str, x: f64, y: f64) -> HandleElement {
    HandleElement { id: Some(id.to_owned()), position: HandlePosition::Right, x, y, width: 10.0, height: 10.0 }
}

/// `a` at the origin and `b` at x=300, both 100x50.
/// `a` has source `a-out` (centre 100,25) and source `a-out2` (centre 100,45);
/// `b` has target `b-in` (centre 300,25) and source `b-out` (centre 400,25).
fn store() -> GraphStore {
    let mut store = GraphStore::new(true);
    store
        .set_nodes(vec![
            Node::new("a", Point::new(0.0, 0.0)).with_size(100.0, 50.0),
            Node::new("b", Point::new(300.0, 0.0)).with_size(100.0, 50.0),
        ])
        .unwrap();
    store.set_handle_bounds(
        "a",
        HandleBounds { source: vec![handle("a-out", 95.0, 20.0), handle("a-out2", 95.0, 40.0)], target: vec![] },
    );
    store.set_handle_bounds(
        "b",
        HandleBounds { source: vec![handle("b-out", 95.0, 20.0)], target: vec![handle("b-in", -5.0, 20.0)] },
    );
    store
}

fn hit(node: &str, id: &str, kind: HandleType, center: Point) -> HandleHit {
    HandleHit { node_id: node.into(), handle_id: Some(id.into()), kind, center }
}

fn a_out() -> HandleHit {
    hit("a", "a-out", HandleType::Source, Point::new(100.0, 25.0))
}

fn b_in() -> HandleHit {
    hit("b", "b-in", HandleType::Target, Point::new(300.0, 25.0))
}

fn b_out() -> HandleHit {
    hit("b", "b-out", HandleType::Source, Point::new(400.0, 25.0))
}

fn ctx<'a>(store: &'a GraphStore, config: &'a EngineConfig, validator: &'a dyn ConnectionValidator) -> ConnectContext<'a> {
    ConnectContext { store, transform: Viewport::default(), config, validator }
}

// =============================================================
// Mode rule
// =============================================================

#[test]
fn strict_mode_requires_opposite_roles() {
    let from = ConnectionStart::from(&a_out());
    assert!(mode_allows(ConnectionMode::Strict, &from, &b_in()));
    assert!(!mode_allows(ConnectionMode::Strict, &from, &b_out()));
}

#[test]
fn loose_mode_accepts_same_roles_but_not_the_same_handle() {
    let from = ConnectionStart::from(&a_out());
    assert!(mode_allows(ConnectionMode::Loose, &from, &b_out()));
    assert!(mode_allows(ConnectionMode::Loose, &from, &b_in()));
    assert!(!mode_allows(ConnectionMode::Loose, &from, &a_out()));
}

#[test]
fn strict_rejects_source_to_source_on_same_node() {
    let from = ConnectionStart::from(&a_out());
    let other = hit("a", "a-out2", HandleType::Source, Point::new(100.0, 45.0));
    assert!(!mode_allows(ConnectionMode::Strict, &from, &other));
    assert!(mode_allows(ConnectionMode::Loose, &from, &other));
}

#[test]
fn orientation_follows_starting_role() {
    let from_target = ConnectionStart::from(&b_in());
    let c = orient(&from_target, &a_out());
    assert_eq!(c, Connection::new("a", "b").with_handles(Some("a-out"), Some("b-in")));
}

// =============================================================
// Drag-to-connect
// =============================================================

#[test]
fn drag_onto_compatible_handle_connects() {
    let store = store();
    let config = EngineConfig::default();
    let ctx = ctx(&store, &config, &AllowAll);
    let mut connect = ConnectController::default();
    let start = connect.start_drag(&a_out(), Point::new(100.0, 25.0));
    assert_eq!(start.handle_type, HandleType::Source);

    connect.update(Point::new(295.0, 30.0), &ctx);
    let attempt = connect.attempt().unwrap();
    assert!(attempt.valid);
    assert_eq!(attempt.hovered.as_ref().unwrap().handle_id.as_deref(), Some("b-in"));

    let result = connect.end_drag(Point::new(295.0, 30.0), &ctx);
    assert_eq!(result, Some(Connection::new("a", "b").with_handles(Some("a-out"), Some("b-in"))));
    assert!(connect.attempt().is_none());
}

#[test]
fn drag_released_on_empty_space_is_discarded() {
    let store = store();
    let config = EngineConfig::default();
    let ctx = ctx(&store, &config, &AllowAll);
    let mut connect = ConnectController::default();
    connect.start_drag(&a_out(), Point::new(100.0, 25.0));
    assert_eq!(connect.end_drag(Point::new(200.0, 200.0), &ctx), None);
    assert!(!connect.is_dragging());
}

#[test]
fn drag_onto_same_role_is_invalid_in_strict_mode() {
    let store = store();
    let config = EngineConfig::default();
    let ctx = ctx(&store, &config, &AllowAll);
    let mut connect = ConnectController::default();
    connect.start_drag(&a_out(), Point::new(100.0, 25.0));
    connect.update(Point::new(400.0, 25.0), &ctx);
    assert!(!connect.attempt().unwrap().valid);
    assert_eq!(connect.end_drag(Point::new(400.0, 25.0), &ctx), None);
}

#[test]
fn same_role_connects_in_loose_mode() {
    let store = store();
    let config = EngineConfig { connection_mode: ConnectionMode::Loose, ..EngineConfig::default() };
    let ctx = ctx(&store, &config, &AllowAll);
    let mut connect = ConnectController::default();
    connect.start_drag(&a_out(), Point::new(100.0, 25.0));
    let result = connect.end_drag(Point::new(400.0, 25.0), &ctx).unwrap();
    assert_eq!(result.source_handle.as_deref(), Some("a-out"));
    assert_eq!(result.target_handle.as_deref(), Some("b-out"));
}

#[test]
fn validator_can_veto() {
    let store = store();
    let config = EngineConfig::default();
    let no_cross_node = |c: &Connection| c.source == c.target;
    let ctx = ctx(&store, &config, &no_cross_node);
    let mut connect = ConnectController::default();
    connect.start_drag(&a_out(), Point::new(100.0, 25.0));
    assert_eq!(connect.end_drag(Point::new(300.0, 25.0), &ctx), None);
}

#[test]
fn connection_radius_is_in_screen_pixels() {
    let store = store();
    let config = EngineConfig::default();
    let mut ctx = ctx(&store, &config, &AllowAll);
    let mut connect = ConnectController::default();
    connect.start_drag(&a_out(), Point::new(100.0, 25.0));

    // 30 graph units away from b-in: outside 20px at zoom 1, inside at zoom 0.5.
    connect.update(Point::new(270.0, 25.0), &ctx);
    assert!(connect.attempt().unwrap().hovered.is_none());

    ctx.transform = Viewport::new(0.0, 0.0, 0.5);
    connect.update(Point::new(135.0, 12.5), &ctx);
    assert!(connect.attempt().unwrap().valid);
}

#[test]
fn non_connectable_target_node_is_ignored() {
    let mut store = store();
    let mut nodes: Vec<Node> = store.nodes().cloned().collect();
    nodes[1].connectable = Some(false);
    let bounds: Vec<_> = store.nodes().map(|n| n.internals.handle_bounds.clone()).collect();
    store.set_nodes(nodes).unwrap();
    store.set_handle_bounds("a", bounds[0].clone().unwrap());
    store.set_handle_bounds("b", bounds[1].clone().unwrap());

    let config = EngineConfig::default();
    let ctx = ctx(&store, &config, &AllowAll);
    let mut connect = ConnectController::default();
    connect.start_drag(&a_out(), Point::new(100.0, 25.0));
    assert_eq!(connect.end_drag(Point::new(300.0, 25.0), &ctx), None);
}

// =============================================================
// Click-to-connect
// =============================================================

#[test]
fn two_clicks_connect() {
    let store = store();
    let config = EngineConfig::default();
    let ctx = ctx(&store, &config, &AllowAll);
    let mut connect = ConnectController::default();
    assert!(matches!(connect.click_handle(&a_out(), Point::default(), &ctx), ClickConnect::Armed(_)));
    assert!(connect.is_armed());

    // Armed state follows the pointer without a button held.
    connect.update(Point::new(250.0, 25.0), &ctx);
    assert!(connect.is_armed());

    let result = connect.click_handle(&b_in(), Point::default(), &ctx);
    assert_eq!(result, ClickConnect::Connected(Connection::new("a", "b").with_handles(Some("a-out"), Some("b-in"))));
    assert!(connect.attempt().is_none());
}

#[test]
fn clicking_same_handle_twice_cancels() {
    let store = store();
    let config = EngineConfig { connection_mode: ConnectionMode::Loose, ..EngineConfig::default() };
    let ctx = ctx(&store, &config, &AllowAll);
    let mut connect = ConnectController::default();
    connect.click_handle(&a_out(), Point::default(), &ctx);
    assert_eq!(connect.click_handle(&a_out(), Point::default(), &ctx), ClickConnect::Cancelled);
    assert!(connect.attempt().is_none());
}

#[test]
fn incompatible_second_click_cancels() {
    let store = store();
    let config = EngineConfig::default();
    let ctx = ctx(&store, &config, &AllowAll);
    let mut connect = ConnectController::default();
    connect.click_handle(&a_out(), Point::default(), &ctx);
    assert_eq!(connect.click_handle(&b_out(), Point::default(), &ctx), ClickConnect::Cancelled);
}

#[test]
fn cancel_reports_whether_active() {
    let mut connect = ConnectController::default();
    assert!(!connect.cancel());
    connect.start_drag(&a_out(), Point::default());
    assert!(connect.cancel());
    assert!(connect.attempt().is_none());
}

// =============================================================
// Edge helpers
// =============================================================

#[test]
fn edge_id_is_derived_from_endpoints() {
    assert_eq!(edge_id(&Connection::new("1", "2")), "edge-1-2");
    assert_eq!(edge_id(&Connection::new("1", "2").with_handles(Some("a"), Some("b"))), "edge-1a-2b");
}

#[test]
fn add_edge_generates_id_and_ignores_duplicates() {
    let c = Connection::new("1", "2");
    let edges = add_edge(&c, None, &[]).unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].id, "edge-1-2");

    let again = add_edge(&c, None, &edges).unwrap();
    assert_eq!(again.len(), 1);
}

#[test]
fn explicit_ids_allow_parallel_edges() {
    let c = Connection::new("1", "2");
    let edges = add_edge(&c, Some("first"), &[]).unwrap();
    let edges = add_edge(&c, Some("second"), &edges).unwrap();
    assert_eq!(edges.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(), ["first", "second"]);

    let err = add_edge(&c, Some("first"), &edges).unwrap_err();
    assert!(matches!(err, GraphError::DuplicateId { .. }));
}

#[test]
fn add_edge_rejects_missing_endpoint() {
    let err = add_edge(&Connection::new("", "2"), None, &[]).unwrap_err();
    assert!(matches!(err, GraphError::MissingEndpoint { end: EdgeEnd::Source, .. }));
    let err = add_edge(&Connection::new("1", ""), None, &[]).unwrap_err();
    assert!(matches!(err, GraphError::MissingEndpoint { end: EdgeEnd::Target, .. }));
}

#[test]
fn update_edge_reconnects_and_keeps_fields() {
    let mut e = Edge::new("old", "1", "2");
    e.label = Some("keep me".into());
    let edges = vec![e, Edge::new("other", "2", "3")];
    let next = update_edge("old", &Connection::new("1", "3"), &edges).unwrap();
    assert_eq!(next.len(), 2);
    assert_eq!(next[0].id, "other");
    assert_eq!(next[1].id, "edge-1-3");
    assert_eq!(next[1].target, "3");
    assert_eq!(next[1].label.as_deref(), Some("keep me"));

    assert!(matches!(update_edge("ghost", &Connection::new("1", "3"), &edges), Err(GraphError::NotFound { .. })));
}

#[test]
fn connection_serde_is_camel_case() {
    let c = Connection::new("1", "2").with_handles(Some("h"), None);
    let value = serde_json::to_value(&c).unwrap();
    assert_eq!(value, serde_json::json!({"source": "1", "target": "2", "sourceHandle": "h"}));
}
