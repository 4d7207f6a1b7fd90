//! Interactive node-graph canvas engine.
//!
//! The crate holds the state behind a node editor: a graph of positioned,
//! optionally nested nodes joined by edges between named handles, a pan/zoom
//! viewport, and the gesture machinery that turns raw pointer, wheel, and key
//! events into graph changes. It does no drawing. A host feeds it input and
//! measured element sizes, then renders from [`engine::Engine`] queries and
//! reacts to the [`engine::Action`]s each call returns.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level [`engine::Engine`]: data inputs, queries, input handlers |
//! | [`graph`] | Node/edge types and the validated [`graph::GraphStore`] |
//! | [`changes`] | Change records and the functions that fold them into collections |
//! | [`viewport`] | Pan/zoom controller, fit-to-bounds, animated transitions |
//! | [`transition`] | Timed interpolation between two transforms |
//! | [`geometry`] | Points, rectangles, transforms, and coordinate conversions |
//! | [`spatial`] | Bounds, containment, visibility, and adjacency queries |
//! | [`hit`] | Hit-testing handles, nodes, and the selection box; edge anchor points |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`drag`] | Node dragging and keyboard nudging |
//! | [`connect`] | Connection gestures, validation, and edge helpers |
//! | [`selection`] | Click and box selection |
//! | [`registry`] | Type tag to renderer lookup with a default fallback |
//! | [`snapshot`] | Export/import of `{ nodes, edges, viewport }` |
//! | [`config`] | [`config::EngineConfig`] and its defaults |
//! | [`error`] | Error types |
//! | [`consts`] | Shared numeric constants (zoom limits, step sizes, radii) |

pub mod changes;
pub mod config;
pub mod connect;
pub mod consts;
pub mod drag;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod hit;
pub mod input;
pub mod registry;
pub mod selection;
pub mod snapshot;
pub mod spatial;
pub mod transition;
pub mod viewport;
