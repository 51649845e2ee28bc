pub mod geometry;
pub mod membership;
pub mod spatial_index;
pub mod transform;
pub mod types;

pub use geometry::{
    AUTO_CLOSE_THRESHOLD_PX, POLYGON_AREA_EPSILON, is_near_first_point, is_point_in_polygon,
    is_valid_polygon, polygon_area, polygon_bounds, polygon_centroid,
};
pub use membership::{PolygonStats, ProjectedDataset, compute_polygon_stats};
pub use spatial_index::SpatialIndex;
pub use transform::{
    CoordinateTransform, MAX_VIEW_SCALE, MIN_VIEW_SCALE, ViewState, calculate_viewport_bounds,
};
pub use types::{
    AxisField, AxisSelection, CanvasSize, DataCoord, DataDomain, DataPoint, DataX, DataY,
    ScreenPoint, ScreenX, ScreenY, Viewport,
};
