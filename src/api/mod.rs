//! Host-facing chart API: configuration, the scatter chart facade and the
//! persisted polygon contract.

mod chart;
mod config;
mod polygon_contract;
mod scene;

pub use chart::{PolygonEdit, ScatterChart};
pub use config::ScatterChartConfig;
pub use polygon_contract::{POLYGON_SET_JSON_SCHEMA_V1, PolygonRecord, PolygonSetJsonContractV1};
pub use scene::ChartLayers;
