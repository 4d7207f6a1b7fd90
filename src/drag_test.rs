#![allow(clippy::float_cmp)]

use super::*;

fn node(id: &str, x: f64, y: f64) -> Node {
    Node::new(id, Point::new(x, y)).with_size(50.0, 50.0)
}

fn selected(mut n: Node) -> Node {
    n.selected = true;
    n
}

fn store_with(nodes: Vec<Node>) -> GraphStore {
    let mut store = GraphStore::new(true);
    store.set_nodes(nodes).unwrap();
    store
}

fn positions(changes: &[NodeChange]) -> Vec<(String, Point)> {
    changes
        .iter()
        .filter_map(|c| match c {
            NodeChange::Position { id, position: Some(p), .. } => Some((id.clone(), *p)),
            _ => None,
        })
        .collect()
}

// =============================================================
// Drag items
// =============================================================

#[test]
fn unselected_grabbed_node_moves_alone() {
    let store = store_with(vec![node("a", 0.0, 0.0), selected(node("b", 100.0, 0.0))]);
    let items = drag_items(&store, Some("a"), Point::new(10.0, 10.0), &EngineConfig::default());
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, "a");
    assert_eq!(items[0].distance, Point::new(10.0, 10.0));
}

#[test]
fn selected_grabbed_node_brings_the_selection() {
    let store = store_with(vec![selected(node("a", 0.0, 0.0)), selected(node("b", 100.0, 0.0)), node("c", 0.0, 0.0)]);
    let items = drag_items(&store, Some("a"), Point::new(10.0, 10.0), &EngineConfig::default());
    let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, ["a", "b"]);
    assert_eq!(items[1].distance, Point::new(-90.0, 10.0));
}

#[test]
fn children_of_selected_parents_are_excluded() {
    let store = store_with(vec![
        selected(node("p", 0.0, 0.0).with_size(200.0, 200.0)),
        selected(node("k", 10.0, 10.0).with_parent("p")),
        selected(node("g", 5.0, 5.0).with_parent("k")),
    ]);
    let items = drag_items(&store, None, Point::default(), &EngineConfig::default());
    let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, ["p"]);
}

#[test]
fn non_draggable_nodes_are_excluded() {
    let mut locked = selected(node("locked", 0.0, 0.0));
    locked.draggable = Some(false);
    let store = store_with(vec![locked, selected(node("free", 0.0, 0.0))]);
    let items = drag_items(&store, None, Point::default(), &EngineConfig::default());
    assert_eq!(items.len(), 1);

    let config = EngineConfig { nodes_draggable: false, ..EngineConfig::default() };
    assert!(drag_items(&store, None, Point::default(), &config).is_empty());
}

#[test]
fn start_with_nothing_draggable_stays_idle() {
    let store = store_with(vec![node("a", 0.0, 0.0)]);
    let mut drag = DragController::default();
    assert!(!drag.start(&store, None, Point::default(), &EngineConfig::default()));
    assert!(drag.items().is_empty());
}

// =============================================================
// Movement
// =============================================================

#[test]
fn drag_moves_by_pointer_delta() {
    let store = store_with(vec![node("a", 20.0, 30.0)]);
    let config = EngineConfig::default();
    let mut drag = DragController::default();
    assert!(drag.start(&store, Some("a"), Point::new(25.0, 35.0), &config));

    let changes = drag.drag(Point::new(125.0, 85.0), &config);
    assert_eq!(positions(&changes), [("a".to_owned(), Point::new(120.0, 80.0))]);
    assert!(matches!(changes[0], NodeChange::Position { dragging: Some(true), .. }));
    assert!(drag.has_moved());
}

#[test]
fn unchanged_pointer_emits_nothing() {
    let store = store_with(vec![node("a", 0.0, 0.0)]);
    let config = EngineConfig::default();
    let mut drag = DragController::default();
    drag.start(&store, Some("a"), Point::new(5.0, 5.0), &config);
    assert_eq!(drag.drag(Point::new(15.0, 5.0), &config).len(), 1);
    assert!(drag.drag(Point::new(15.0, 5.0), &config).is_empty());
}

#[test]
fn drag_snaps_to_grid() {
    let store = store_with(vec![node("a", 0.0, 0.0)]);
    let config = EngineConfig { snap_to_grid: true, snap_grid: [10.0, 10.0], ..EngineConfig::default() };
    let mut drag = DragController::default();
    drag.start(&store, Some("a"), Point::new(0.0, 0.0), &config);
    let changes = drag.drag(Point::new(13.0, 27.0), &config);
    assert_eq!(positions(&changes)[0].1, Point::new(10.0, 30.0));
}

#[test]
fn child_position_is_reported_relative_to_parent() {
    let store = store_with(vec![node("p", 100.0, 100.0).with_size(300.0, 300.0), node("k", 10.0, 10.0).with_parent("p")]);
    let config = EngineConfig::default();
    let mut drag = DragController::default();
    drag.start(&store, Some("k"), Point::new(110.0, 110.0), &config);
    let changes = drag.drag(Point::new(150.0, 160.0), &config);
    assert_eq!(positions(&changes)[0].1, Point::new(50.0, 60.0));
    assert_eq!(drag.items()[0].position_absolute, Point::new(150.0, 160.0));
}

#[test]
fn parent_extent_keeps_child_inside() {
    let mut kid = node("k", 10.0, 10.0).with_parent("p");
    kid.extent = Some(NodeExtent::Parent);
    let store = store_with(vec![node("p", 100.0, 100.0).with_size(200.0, 150.0), kid]);
    let config = EngineConfig::default();
    let mut drag = DragController::default();
    drag.start(&store, Some("k"), Point::new(110.0, 110.0), &config);

    for pointer in [Point::new(-1000.0, -1000.0), Point::new(5000.0, 5000.0), Point::new(200.0, 2000.0)] {
        drag.drag(pointer, &config);
        let item = &drag.items()[0];
        let p = item.position_absolute;
        assert!(p.x >= 100.0 && p.x + 50.0 <= 300.0, "x out of parent: {p:?}");
        assert!(p.y >= 100.0 && p.y + 50.0 <= 250.0, "y out of parent: {p:?}");
    }
    assert_eq!(drag.items()[0].position, Point::new(100.0, 100.0));
}

#[test]
fn bounds_extent_is_relative_to_parent() {
    let mut kid = node("k", 0.0, 0.0).with_parent("p");
    kid.extent = Some(NodeExtent::Bounds(Extent::new(Point::new(0.0, 0.0), Point::new(20.0, 20.0))));
    let store = store_with(vec![node("p", 100.0, 100.0), kid]);
    let config = EngineConfig::default();
    let mut drag = DragController::default();
    drag.start(&store, Some("k"), Point::new(100.0, 100.0), &config);
    drag.drag(Point::new(500.0, 500.0), &config);
    assert_eq!(drag.items()[0].position_absolute, Point::new(120.0, 120.0));
    assert_eq!(drag.items()[0].position, Point::new(20.0, 20.0));
}

#[test]
fn unresolvable_parent_extent_falls_back_to_global() {
    // Parent has no measured size, so the parent box is unknown.
    let mut kid = node("k", 0.0, 0.0).with_parent("p");
    kid.extent = Some(NodeExtent::Parent);
    let store = store_with(vec![Node::new("p", Point::new(0.0, 0.0)), kid]);
    let config = EngineConfig {
        node_extent: Some(Extent::new(Point::new(-10.0, -10.0), Point::new(40.0, 40.0))),
        ..EngineConfig::default()
    };
    let items = drag_items(&store, Some("k"), Point::default(), &config);
    assert_eq!(items[0].extent, config.node_extent.unwrap());
}

#[test]
fn global_node_extent_clamps_top_level_nodes() {
    let store = store_with(vec![node("a", 0.0, 0.0)]);
    let config = EngineConfig {
        node_extent: Some(Extent::new(Point::new(0.0, 0.0), Point::new(100.0, 100.0))),
        ..EngineConfig::default()
    };
    let mut drag = DragController::default();
    drag.start(&store, Some("a"), Point::default(), &config);
    drag.drag(Point::new(-50.0, 500.0), &config);
    assert_eq!(drag.items()[0].position_absolute, Point::new(0.0, 100.0));
}

// =============================================================
// Stop
// =============================================================

#[test]
fn stop_without_movement_is_a_click() {
    let store = store_with(vec![node("a", 0.0, 0.0)]);
    let mut drag = DragController::default();
    drag.start(&store, Some("a"), Point::default(), &EngineConfig::default());
    assert_eq!(drag.stop(), Some(DragEnd::Click { node_id: Some("a".into()) }));
    assert!(drag.items().is_empty());
    assert!(drag.stop().is_none());
}

#[test]
fn stop_after_movement_clears_dragging() {
    let store = store_with(vec![selected(node("a", 0.0, 0.0)), selected(node("b", 60.0, 0.0))]);
    let config = EngineConfig::default();
    let mut drag = DragController::default();
    drag.start(&store, Some("a"), Point::default(), &config);
    drag.drag(Point::new(5.0, 5.0), &config);
    let Some(DragEnd::Moved { node_ids, changes }) = drag.stop() else {
        panic!("expected a moved drag");
    };
    assert_eq!(node_ids, ["a", "b"]);
    assert!(changes.iter().all(|c| matches!(c, NodeChange::Position { position: None, dragging: Some(false), .. })));
}

#[test]
fn movement_clamped_to_start_is_still_a_click() {
    let mut kid = node("k", 0.0, 0.0).with_parent("p");
    kid.extent = Some(NodeExtent::Parent);
    // Child exactly fills its parent: it cannot move at all.
    let store = store_with(vec![node("p", 0.0, 0.0), kid]);
    let config = EngineConfig::default();
    let mut drag = DragController::default();
    drag.start(&store, Some("k"), Point::default(), &config);
    assert!(drag.drag(Point::new(30.0, 30.0), &config).is_empty());
    assert!(matches!(drag.stop(), Some(DragEnd::Click { .. })));
}

#[test]
fn cancel_clears_dragging_only_after_movement() {
    let store = store_with(vec![node("a", 0.0, 0.0)]);
    let config = EngineConfig::default();
    let mut drag = DragController::default();

    drag.start(&store, Some("a"), Point::default(), &config);
    assert!(drag.cancel().is_empty());
    assert!(drag.items().is_empty());

    drag.start(&store, Some("a"), Point::default(), &config);
    drag.drag(Point::new(5.0, 5.0), &config);
    assert_eq!(
        drag.cancel(),
        vec![NodeChange::Position { id: "a".into(), position: None, dragging: Some(false) }]
    );
    assert!(drag.stop().is_none());
    assert!(drag.cancel().is_empty());
}

// =============================================================
// Keyboard nudge
// =============================================================

#[test]
fn nudge_moves_selected_nodes() {
    let store = store_with(vec![selected(node("a", 0.0, 0.0)), node("b", 0.0, 0.0)]);
    let config = EngineConfig::default();
    let changes = nudge_selection(&store, Point::new(1.0, 0.0), false, &config);
    assert_eq!(positions(&changes), [("a".to_owned(), Point::new(ARROW_KEY_STEP, 0.0))]);

    let changes = nudge_selection(&store, Point::new(0.0, -1.0), true, &config);
    assert_eq!(positions(&changes)[0].1, Point::new(0.0, -ARROW_KEY_STEP * ARROW_KEY_SHIFT_FACTOR));
}

#[test]
fn nudge_uses_snap_grid_when_snapping() {
    let store = store_with(vec![selected(node("a", 0.0, 0.0))]);
    let config = EngineConfig { snap_to_grid: true, snap_grid: [20.0, 10.0], ..EngineConfig::default() };
    let changes = nudge_selection(&store, Point::new(1.0, 1.0), false, &config);
    assert_eq!(positions(&changes)[0].1, Point::new(20.0, 10.0));
}

#[test]
fn nudge_at_extent_produces_nothing() {
    let store = store_with(vec![selected(node("a", 0.0, 0.0))]);
    let config = EngineConfig {
        node_extent: Some(Extent::new(Point::new(0.0, 0.0), Point::new(100.0, 100.0))),
        ..EngineConfig::default()
    };
    assert!(nudge_selection(&store, Point::new(-1.0, 0.0), false, &config).is_empty());
}
