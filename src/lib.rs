//! scatter-rs: viewport-culled scatter rendering with polygon selection.
//!
//! Points are indexed in an R-tree, culled against the visible viewport and
//! painted onto a points layer; polygon selections live on a separate overlay
//! layer and report how many points of the full dataset they enclose.
//! Rendering goes through the [`render::CanvasSurface`] and
//! [`render::DrawContext`] traits, with a headless recording backend built in
//! and Cairo/GTK backends behind cargo features.

pub mod api;
pub mod core;
pub mod error;
pub mod interaction;
pub mod render;
pub mod telemetry;

#[cfg(feature = "gtk4-adapter")]
pub mod platform_gtk;

pub use api::{PolygonEdit, ScatterChart, ScatterChartConfig};
pub use error::{ScatterError, ScatterResult};
