//! Shared numeric constants for the engine.

// ── Viewport ────────────────────────────────────────────────────

/// Lowest zoom factor allowed unless configured otherwise.
pub const DEFAULT_MIN_ZOOM: f64 = 0.5;

/// Highest zoom factor allowed unless configured otherwise.
pub const DEFAULT_MAX_ZOOM: f64 = 2.0;

/// Multiplier applied by a single zoom-in / zoom-out step.
pub const ZOOM_STEP: f64 = 1.2;

/// Fraction of the bounds size added as padding by `fit_view` by default.
pub const DEFAULT_FIT_VIEW_PADDING: f64 = 0.1;

/// Wheel delta (pixels) that corresponds to doubling or halving the zoom.
pub const WHEEL_ZOOM_DIVISOR: f64 = 500.0;

// ── Grid ────────────────────────────────────────────────────────

/// Default snap grid cell size in graph units.
pub const DEFAULT_SNAP_GRID: f64 = 15.0;

// ── Z-order ─────────────────────────────────────────────────────

/// Z boost given to selected nodes when elevation on select is enabled.
pub const SELECTED_Z_BOOST: i64 = 1000;

// ── Hit-testing ─────────────────────────────────────────────────

/// Screen-space hit slop in pixels around handles.
pub const HANDLE_RADIUS_PX: f64 = 8.0;

/// Screen-space snapping radius for connection targets.
pub const DEFAULT_CONNECTION_RADIUS_PX: f64 = 20.0;

// ── Keyboard ────────────────────────────────────────────────────

/// Arrow-key nudge multiplier while shift is held.
pub const ARROW_KEY_SHIFT_FACTOR: f64 = 4.0;

/// Arrow-key nudge distance in graph units when snapping is off.
pub const ARROW_KEY_STEP: f64 = 5.0;
