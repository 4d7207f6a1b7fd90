#![allow(clippy::float_cmp)]

use serde_json::json;

use super::*;
use crate::geometry::Point;

fn sample() -> FlowExport {
    let mut a = Node::new("a", Point::new(10.0, 20.0)).with_size(50.0, 40.0);
    a.selected = true;
    let b = Node::new("b", Point::new(5.0, 5.0)).with_parent("a");
    let mut e = Edge::new("e1", "a", "b");
    e.label = Some("flows".into());
    FlowExport { nodes: vec![a, b], edges: vec![e], viewport: Viewport::new(12.5, -4.0, 1.5) }
}

#[test]
fn json_round_trip_preserves_state() {
    let export = sample();
    let raw = export.to_json().unwrap();
    let back = FlowExport::from_json(&raw).unwrap();
    assert_eq!(back, export);
}

#[test]
fn capture_copies_store_and_viewport() {
    let export = sample();
    let mut store = GraphStore::new(true);
    store.replace(export.nodes.clone(), export.edges.clone()).unwrap();
    let captured = FlowExport::capture(&store, export.viewport);
    assert_eq!(captured.nodes.len(), 2);
    assert_eq!(captured.edges[0].label.as_deref(), Some("flows"));
    assert_eq!(captured.viewport, export.viewport);
    // Derived state rides along in memory but never reaches the wire.
    assert_eq!(captured.nodes[1].internals.position_absolute, Point::new(15.0, 25.0));
    let value = serde_json::to_value(&captured).unwrap();
    assert!(value["nodes"][1].get("internals").is_none());
}

#[test]
fn missing_sections_default() {
    let export = FlowExport::from_json("{}").unwrap();
    assert!(export.nodes.is_empty());
    assert!(export.edges.is_empty());
    assert_eq!(export.viewport, Viewport::default());
}

#[test]
fn wire_shape_is_nodes_edges_viewport() {
    let value = serde_json::to_value(sample()).unwrap();
    assert_eq!(value["viewport"], json!({"x": 12.5, "y": -4.0, "zoom": 1.5}));
    assert_eq!(value["nodes"][0]["id"], json!("a"));
    assert_eq!(value["edges"][0]["source"], json!("a"));
}

#[test]
fn dangling_edge_is_rejected_on_import() {
    let raw = json!({
        "nodes": [{"id": "a", "position": {"x": 0.0, "y": 0.0}}],
        "edges": [{"id": "e", "source": "a", "target": "missing"}]
    })
    .to_string();
    assert!(matches!(FlowExport::from_json(&raw), Err(SnapshotError::Graph(GraphError::DanglingReference { .. }))));
}

#[test]
fn malformed_json_is_a_parse_error() {
    assert!(matches!(FlowExport::from_json("{nodes: oops"), Err(SnapshotError::Parse(_))));
}
