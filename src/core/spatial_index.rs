//! Static R-tree over dataset positions.
//!
//! Entries are zero-area boxes referencing points by their dataset index; the
//! tree never owns point data. A changed dataset or axis selection produces a
//! new index through [`SpatialIndex::build`], never an in-place patch.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::core::types::{DataCoord, Viewport};

#[derive(Debug, Clone, Copy, PartialEq)]
struct IndexedPoint {
    index: usize,
    position: [f64; 2],
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Read-only spatial snapshot used for viewport culling and hit-testing.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    tree: RTree<IndexedPoint>,
    source_len: usize,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self {
            tree: RTree::new(),
            source_len: 0,
        }
    }
}

impl SpatialIndex {
    /// Bulk-loads an index over `points`, reading positions through `coordinate`.
    ///
    /// Points whose coordinate is missing or non-finite are left out: they
    /// cannot lie inside any query rectangle.
    pub fn build<T, F>(points: &[T], coordinate: F) -> Self
    where
        F: Fn(&T) -> Option<DataCoord>,
    {
        let entries: Vec<IndexedPoint> = points
            .iter()
            .enumerate()
            .filter_map(|(index, point)| {
                let coord = coordinate(point).filter(|coord| coord.is_finite())?;
                Some(IndexedPoint {
                    index,
                    position: [coord.x.get(), coord.y.get()],
                })
            })
            .collect();

        Self {
            tree: RTree::bulk_load(entries),
            source_len: points.len(),
        }
    }

    /// Number of indexed (plottable) points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Length of the dataset the index was built from, plottable or not.
    #[must_use]
    pub fn source_len(&self) -> usize {
        self.source_len
    }

    /// Every index whose point lies inside the closed rectangle.
    ///
    /// Swapped bounds are normalized; non-finite bounds match nothing.
    #[must_use]
    pub fn query(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<usize> {
        if ![min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite()) {
            return Vec::new();
        }
        let envelope = AABB::from_corners(
            [min_x.min(max_x), min_y.min(max_y)],
            [min_x.max(max_x), min_y.max(max_y)],
        );
        self.tree
            .locate_in_envelope(&envelope)
            .map(|entry| entry.index)
            .collect()
    }

    #[must_use]
    pub fn query_viewport(&self, viewport: Viewport) -> Vec<usize> {
        self.query(
            viewport.min_x,
            viewport.min_y,
            viewport.max_x,
            viewport.max_y,
        )
    }

    /// Closest indexed point to `(x, y)` in data units.
    #[must_use]
    pub fn nearest(&self, x: f64, y: f64) -> Option<usize> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        self.tree.nearest_neighbor(&[x, y]).map(|entry| entry.index)
    }
}
