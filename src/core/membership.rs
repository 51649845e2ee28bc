//! Full-dataset polygon membership.
//!
//! Membership never consults the spatial index or the visible set: every
//! point is projected through the supplied transform and tested against the
//! polygon's fixed screen vertices.

use serde::{Deserialize, Serialize};

use crate::core::geometry::{is_point_in_polygon, polygon_bounds};
use crate::core::transform::CoordinateTransform;
use crate::core::types::{DataCoord, ScreenPoint};

#[cfg(feature = "parallel-membership")]
use rayon::prelude::*;

/// Per-polygon selection summary.
///
/// `percentage` is expressed in percent of all dataset points (unplottable
/// points included in the denominator).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PolygonStats {
    pub count: usize,
    pub percentage: f64,
}

impl PolygonStats {
    #[must_use]
    pub fn from_count(count: usize, total_points: usize) -> Self {
        let percentage = if total_points == 0 {
            0.0
        } else {
            count as f64 * 100.0 / total_points as f64
        };
        Self { count, percentage }
    }
}

/// Screen projection of every dataset coordinate, computed once per transform
/// and shared across all polygons.
#[derive(Debug, Clone, Default)]
pub struct ProjectedDataset {
    positions: Vec<Option<ScreenPoint>>,
}

impl ProjectedDataset {
    #[must_use]
    pub fn project(coords: &[Option<DataCoord>], transform: &CoordinateTransform) -> Self {
        #[cfg(feature = "parallel-membership")]
        let positions = coords
            .par_iter()
            .map(|coord| coord.map(|coord| transform.to_screen(coord)))
            .collect();
        #[cfg(not(feature = "parallel-membership"))]
        let positions = coords
            .iter()
            .map(|coord| coord.map(|coord| transform.to_screen(coord)))
            .collect();
        Self { positions }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Dataset indices whose projection lies inside `vertices`.
    #[must_use]
    pub fn members(&self, vertices: &[ScreenPoint]) -> Vec<usize> {
        let Some(bounds) = polygon_bounds(vertices) else {
            return Vec::new();
        };
        let test = |(index, position): (usize, &Option<ScreenPoint>)| {
            let position = (*position)?;
            (bounds.contains_point(position) && is_point_in_polygon(position, vertices))
                .then_some(index)
        };

        #[cfg(feature = "parallel-membership")]
        {
            self.positions
                .par_iter()
                .enumerate()
                .filter_map(test)
                .collect()
        }
        #[cfg(not(feature = "parallel-membership"))]
        {
            self.positions.iter().enumerate().filter_map(test).collect()
        }
    }

    #[must_use]
    pub fn stats(&self, vertices: &[ScreenPoint]) -> PolygonStats {
        PolygonStats::from_count(self.members(vertices).len(), self.positions.len())
    }
}

/// One-shot membership count for a single polygon.
#[must_use]
pub fn compute_polygon_stats(
    coords: &[Option<DataCoord>],
    transform: &CoordinateTransform,
    vertices: &[ScreenPoint],
) -> PolygonStats {
    ProjectedDataset::project(coords, transform).stats(vertices)
}

#[cfg(test)]
mod tests {
    use super::PolygonStats;

    #[test]
    fn empty_dataset_reports_zero_percentage() {
        assert_eq!(PolygonStats::from_count(0, 0).percentage, 0.0);
        assert_eq!(PolygonStats::from_count(120, 4_800).percentage, 2.5);
    }
}
