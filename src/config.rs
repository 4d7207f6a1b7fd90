//! Engine configuration.
//!
//! Every field has a default so a host can supply a partial JSON object (or
//! nothing at all). [`EngineConfig::from_json`] parses and validates in one
//! step; hosts that build the struct in code should call
//! [`EngineConfig::validate`] themselves.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_CONNECTION_RADIUS_PX, DEFAULT_FIT_VIEW_PADDING, DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM, DEFAULT_SNAP_GRID,
};
use crate::error::ConfigError;
use crate::geometry::{Extent, SnapGrid};

/// Whether handle roles must be complementary to form a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    /// Source handles pair only with target handles.
    #[default]
    Strict,
    /// Any handle pairs with any other handle.
    Loose,
}

/// How box-selection decides whether a node is inside the rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Any overlap selects the node.
    #[default]
    Partial,
    /// The node box must be fully inside the rectangle.
    Full,
}

/// Who owns the node and edge collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ownership {
    /// The engine applies change records to its own store.
    #[default]
    Engine,
    /// Change records are only emitted; the host applies them and syncs back.
    Host,
}

/// Tunable behaviour of one canvas instance.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Area the viewport may pan over, in graph space. `None` is unbounded.
    pub translate_extent: Option<Extent>,
    /// Area nodes may be dragged within, in graph space. `None` is unbounded.
    pub node_extent: Option<Extent>,
    pub snap_to_grid: bool,
    pub snap_grid: [f64; 2],
    pub nodes_draggable: bool,
    pub nodes_connectable: bool,
    pub elements_selectable: bool,
    /// Select a node when a drag starts on it.
    pub select_nodes_on_drag: bool,
    /// Raise selected nodes above unselected ones.
    pub elevate_nodes_on_select: bool,
    pub connection_mode: ConnectionMode,
    /// Screen-space radius within which a handle attracts a dragged connection.
    pub connection_radius: f64,
    /// Allow the click-to-connect gesture.
    pub connect_on_click: bool,
    pub selection_mode: SelectionMode,
    /// Dragging empty canvas pans the viewport.
    pub pan_on_drag: bool,
    /// Dragging empty canvas draws a selection box without holding shift.
    pub selection_on_drag: bool,
    pub zoom_on_scroll: bool,
    /// Wheel events pan instead of zoom.
    pub pan_on_scroll: bool,
    pub fit_view_padding: f64,
    /// Keys that delete the current selection.
    pub delete_keys: Vec<String>,
    pub ownership: Ownership,
    /// Restrict `visible_nodes` / `visible_edges` to what is on screen.
    pub only_render_visible_elements: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            translate_extent: None,
            node_extent: None,
            snap_to_grid: false,
            snap_grid: [DEFAULT_SNAP_GRID, DEFAULT_SNAP_GRID],
            nodes_draggable: true,
            nodes_connectable: true,
            elements_selectable: true,
            select_nodes_on_drag: true,
            elevate_nodes_on_select: true,
            connection_mode: ConnectionMode::Strict,
            connection_radius: DEFAULT_CONNECTION_RADIUS_PX,
            connect_on_click: true,
            selection_mode: SelectionMode::Partial,
            pan_on_drag: true,
            selection_on_drag: false,
            zoom_on_scroll: true,
            pan_on_scroll: false,
            fit_view_padding: DEFAULT_FIT_VIEW_PADDING,
            delete_keys: vec!["Backspace".into(), "Delete".into()],
            ownership: Ownership::Engine,
            only_render_visible_elements: false,
        }
    }
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON config and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] for inconsistent values.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_zoom.is_finite() && self.min_zoom > 0.0) {
            return Err(ConfigError::Invalid(format!("min_zoom must be positive, got {}", self.min_zoom)));
        }
        if !self.max_zoom.is_finite() || self.min_zoom > self.max_zoom {
            return Err(ConfigError::Invalid(format!(
                "max_zoom ({}) must be finite and >= min_zoom ({})",
                self.max_zoom, self.min_zoom
            )));
        }
        if self.snap_grid.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(ConfigError::Invalid(format!("snap_grid cells must be positive, got {:?}", self.snap_grid)));
        }
        for (name, extent) in [("translate_extent", self.translate_extent), ("node_extent", self.node_extent)] {
            if let Some(extent) = extent {
                if !extent.is_finite() || extent.min.x > extent.max.x || extent.min.y > extent.max.y {
                    return Err(ConfigError::Invalid(format!("{name} must be a finite, ordered box")));
                }
            }
        }
        if !(self.connection_radius.is_finite() && self.connection_radius >= 0.0) {
            return Err(ConfigError::Invalid("connection_radius must be non-negative".into()));
        }
        if !(self.fit_view_padding.is_finite() && self.fit_view_padding >= 0.0) {
            return Err(ConfigError::Invalid("fit_view_padding must be non-negative".into()));
        }
        Ok(())
    }

    /// Snap grid to apply to pointer positions, if snapping is on.
    #[must_use]
    pub fn snap(&self) -> Option<SnapGrid> {
        self.snap_to_grid.then_some(SnapGrid {
            x: self.snap_grid[0],
            y: self.snap_grid[1],
        })
    }

    /// Node extent with the unbounded default filled in.
    #[must_use]
    pub fn node_extent_or_infinite(&self) -> Extent {
        self.node_extent.unwrap_or_else(Extent::infinite)
    }

    /// Whether `key` is one of the configured delete keys.
    #[must_use]
    pub fn is_delete_key(&self, key: &str) -> bool {
        self.delete_keys.iter().any(|k| k == key)
    }
}
