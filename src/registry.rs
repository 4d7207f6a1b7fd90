//! Type-tag registry for host-side renderers.
//!
//! Nodes and edges carry an optional `type` tag. The host registers one
//! handle per tag (a renderer, a component id, anything) plus a mandatory
//! default. Lookups never fail: an unknown tag resolves to the default and
//! logs a warning, so a missing renderer degrades instead of breaking the
//! canvas.

#[cfg(test)]
#[path = "registry_test.rs"]
mod registry_test;

use std::collections::HashMap;

use tracing::warn;

use crate::graph::{Edge, Node};

/// Map from type tag to a host handle `R`, with a fallback.
#[derive(Debug, Clone)]
pub struct TypeRegistry<R> {
    default: R,
    entries: HashMap<String, R>,
}

impl<R> TypeRegistry<R> {
    /// A registry that resolves everything to `default`.
    #[must_use]
    pub fn new(default: R) -> Self {
        Self { default, entries: HashMap::new() }
    }

    /// Builder form of [`Self::register`].
    #[must_use]
    pub fn with(mut self, tag: impl Into<String>, handle: R) -> Self {
        self.register(tag, handle);
        self
    }

    /// Register `handle` for `tag`, returning the handle it replaced.
    pub fn register(&mut self, tag: impl Into<String>, handle: R) -> Option<R> {
        self.entries.insert(tag.into(), handle)
    }

    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    #[must_use]
    pub fn default_handle(&self) -> &R {
        &self.default
    }

    /// Number of registered tags, not counting the default.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a tag. No tag means the default; an unknown tag falls back
    /// to the default with a warning.
    #[must_use]
    pub fn resolve(&self, tag: Option<&str>) -> &R {
        let Some(tag) = tag else {
            return &self.default;
        };
        if let Some(handle) = self.entries.get(tag) {
            return handle;
        }
        warn!(%tag, "no handler registered for type; using default");
        &self.default
    }

    #[must_use]
    pub fn resolve_node(&self, node: &Node) -> &R {
        self.resolve(node.node_type.as_deref())
    }

    #[must_use]
    pub fn resolve_edge(&self, edge: &Edge) -> &R {
        self.resolve(edge.edge_type.as_deref())
    }
}
