//! Change records and the pure fold that applies them.
//!
//! Every mutation of node or edge data is described as a typed change record
//! ([`NodeChange`], [`EdgeChange`]). Applying a batch is a pure function from
//! the old collection to a new one: inputs are never mutated, entries no
//! change touches are carried over as the same `Rc`, and a change that turns
//! out to be a no-op also keeps the original allocation.
//!
//! The record types are serde-tagged on `type` and carry a catch-all
//! `Unknown` variant, so a batch from a newer host with change kinds this
//! engine does not know still applies (the unknown records are skipped).

#[cfg(test)]
#[path = "changes_test.rs"]
mod changes_test;

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::geometry::{Dimensions, Point};
use crate::graph::{Edge, Node};

/// A change to one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeChange {
    Select {
        id: String,
        selected: bool,
    },
    Position {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<Point>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dragging: Option<bool>,
    },
    Dimensions {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dimensions: Option<Dimensions>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<Point>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dragging: Option<bool>,
    },
    Remove {
        id: String,
    },
    Add {
        item: Node,
    },
    Reset {
        item: Node,
    },
    #[serde(other)]
    Unknown,
}

impl NodeChange {
    /// Id of the node this change targets; `add` / `reset` use the item's id.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Select { id, .. }
            | Self::Position { id, .. }
            | Self::Dimensions { id, .. }
            | Self::Remove { id } => Some(id),
            Self::Add { item } | Self::Reset { item } => Some(&item.id),
            Self::Unknown => None,
        }
    }
}

/// A change to one edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EdgeChange {
    Select { id: String, selected: bool },
    Remove { id: String },
    Add { item: Edge },
    Reset { item: Edge },
    #[serde(other)]
    Unknown,
}

impl EdgeChange {
    /// Id of the edge this change targets.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Select { id, .. } | Self::Remove { id } => Some(id),
            Self::Add { item } | Self::Reset { item } => Some(&item.id),
            Self::Unknown => None,
        }
    }
}

/// What a change record does to the collection as a whole.
enum Effect<'a, T> {
    Add(&'a T),
    Reset(&'a T),
    Remove,
    Update,
    Ignore,
}

/// Shared shape of node and edge change records.
trait ChangeRecord {
    type Item: Clone + PartialEq;

    fn target(&self) -> Option<&str>;
    fn effect(&self) -> Effect<'_, Self::Item>;
    fn update(&self, item: &mut Self::Item);
    fn item_id(item: &Self::Item) -> &str;
}

impl ChangeRecord for NodeChange {
    type Item = Node;

    fn target(&self) -> Option<&str> {
        self.id()
    }

    fn effect(&self) -> Effect<'_, Node> {
        match self {
            Self::Add { item } => Effect::Add(item),
            Self::Reset { item } => Effect::Reset(item),
            Self::Remove { .. } => Effect::Remove,
            Self::Select { .. } | Self::Position { .. } | Self::Dimensions { .. } => Effect::Update,
            Self::Unknown => Effect::Ignore,
        }
    }

    fn update(&self, node: &mut Node) {
        match self {
            Self::Select { selected, .. } => node.selected = *selected,
            Self::Position { position, dragging, .. } => {
                if let Some(position) = position {
                    node.position = *position;
                }
                if let Some(dragging) = dragging {
                    node.dragging = *dragging;
                }
            }
            Self::Dimensions { dimensions, position, dragging, .. } => {
                if let Some(dimensions) = dimensions {
                    node.width = Some(dimensions.width);
                    node.height = Some(dimensions.height);
                }
                if let Some(position) = position {
                    node.position = *position;
                }
                if let Some(dragging) = dragging {
                    node.dragging = *dragging;
                }
            }
            Self::Remove { .. } | Self::Add { .. } | Self::Reset { .. } | Self::Unknown => {}
        }
    }

    fn item_id(item: &Node) -> &str {
        &item.id
    }
}

impl ChangeRecord for EdgeChange {
    type Item = Edge;

    fn target(&self) -> Option<&str> {
        self.id()
    }

    fn effect(&self) -> Effect<'_, Edge> {
        match self {
            Self::Add { item } => Effect::Add(item),
            Self::Reset { item } => Effect::Reset(item),
            Self::Remove { .. } => Effect::Remove,
            Self::Select { .. } => Effect::Update,
            Self::Unknown => Effect::Ignore,
        }
    }

    fn update(&self, edge: &mut Edge) {
        if let Self::Select { selected, .. } = self {
            edge.selected = *selected;
        }
    }

    fn item_id(item: &Edge) -> &str {
        &item.id
    }
}

fn apply_changes<C: ChangeRecord>(changes: &[C], items: &[Rc<C::Item>]) -> Vec<Rc<C::Item>> {
    // A batch containing resets describes the whole collection.
    let resets: Vec<Rc<C::Item>> = changes
        .iter()
        .filter_map(|c| match c.effect() {
            Effect::Reset(item) => Some(Rc::new(item.clone())),
            _ => None,
        })
        .collect();
    if !resets.is_empty() {
        return resets;
    }

    let mut by_id: HashMap<&str, Vec<&C>> = HashMap::new();
    let mut added: Vec<Rc<C::Item>> = Vec::new();
    for change in changes {
        match change.effect() {
            Effect::Add(item) => added.push(Rc::new(item.clone())),
            Effect::Remove | Effect::Update => {
                if let Some(id) = change.target() {
                    by_id.entry(id).or_default().push(change);
                }
            }
            Effect::Reset(_) | Effect::Ignore => {}
        }
    }

    let mut out = Vec::with_capacity(items.len() + added.len());
    for item in items {
        let Some(item_changes) = by_id.get(C::item_id(item)) else {
            out.push(Rc::clone(item));
            continue;
        };
        if item_changes.iter().any(|c| matches!(c.effect(), Effect::Remove)) {
            continue;
        }
        let mut updated = (**item).clone();
        for change in item_changes {
            change.update(&mut updated);
        }
        if updated == **item {
            out.push(Rc::clone(item));
        } else {
            out.push(Rc::new(updated));
        }
    }
    out.extend(added);
    out
}

/// Fold node changes into a new node collection.
#[must_use]
pub fn apply_node_changes(changes: &[NodeChange], nodes: &[Rc<Node>]) -> Vec<Rc<Node>> {
    apply_changes(changes, nodes)
}

/// Fold edge changes into a new edge collection.
#[must_use]
pub fn apply_edge_changes(changes: &[EdgeChange], edges: &[Rc<Edge>]) -> Vec<Rc<Edge>> {
    apply_changes(changes, edges)
}

/// Minimal `select` changes that make exactly `selected_ids` selected among `nodes`.
///
/// Idempotent: once applied, calling again with the same ids yields nothing.
#[must_use]
pub fn node_selection_changes<'a>(
    nodes: impl IntoIterator<Item = &'a Node>,
    selected_ids: &HashSet<&str>,
) -> Vec<NodeChange> {
    nodes
        .into_iter()
        .filter_map(|n| {
            let will_be_selected = selected_ids.contains(n.id.as_str());
            (n.selected != will_be_selected).then(|| NodeChange::Select { id: n.id.clone(), selected: will_be_selected })
        })
        .collect()
}

/// Minimal `select` changes that make exactly `selected_ids` selected among `edges`.
#[must_use]
pub fn edge_selection_changes<'a>(
    edges: impl IntoIterator<Item = &'a Edge>,
    selected_ids: &HashSet<&str>,
) -> Vec<EdgeChange> {
    edges
        .into_iter()
        .filter_map(|e| {
            let will_be_selected = selected_ids.contains(e.id.as_str());
            (e.selected != will_be_selected).then(|| EdgeChange::Select { id: e.id.clone(), selected: will_be_selected })
        })
        .collect()
}
