use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::geometry::{is_point_in_polygon, polygon_bounds};
use crate::core::transform::ViewState;
use crate::core::types::ScreenPoint;
use crate::render::{Color, ScreenRect};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolygonId(String);

impl PolygonId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PolygonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a completed polygon. Deletion removes it from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolygonState {
    Complete,
    Selected,
    Hovered,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolygonStyle {
    pub stroke_color: Color,
    pub fill_color: Color,
    pub stroke_width: f64,
}

impl Default for PolygonStyle {
    fn default() -> Self {
        Self {
            stroke_color: Color::rgb(0.13, 0.45, 0.85),
            fill_color: Color::rgba(0.13, 0.45, 0.85, 0.15),
            stroke_width: 2.0,
        }
    }
}

impl PolygonStyle {
    /// Stroke width used while the polygon is selected or hovered.
    #[must_use]
    pub fn stroke_width_for(self, state: PolygonState) -> f64 {
        match state {
            PolygonState::Complete => self.stroke_width,
            PolygonState::Hovered => self.stroke_width * 1.5,
            PolygonState::Selected => self.stroke_width * 2.0,
        }
    }
}

/// Completed selection polygon with vertices fixed in screen space.
///
/// `view` is the pan/zoom the vertices were drawn under; membership is always
/// evaluated through it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub id: PolygonId,
    pub vertices: Vec<ScreenPoint>,
    pub style: PolygonStyle,
    pub state: PolygonState,
    pub view: ViewState,
}

impl Polygon {
    #[must_use]
    pub fn bounds(&self) -> Option<ScreenRect> {
        polygon_bounds(&self.vertices)
    }

    /// Screen area touched when drawing this polygon, stroke included.
    #[must_use]
    pub fn paint_bounds(&self) -> Option<ScreenRect> {
        let half_stroke = self.style.stroke_width_for(PolygonState::Selected) * 0.5;
        self.bounds().map(|bounds| bounds.expanded(half_stroke))
    }

    #[must_use]
    pub fn contains(&self, point: ScreenPoint) -> bool {
        is_point_in_polygon(point, &self.vertices)
    }
}

/// Insertion-ordered polygon collection; later polygons draw on top.
#[derive(Debug, Clone, Default)]
pub struct PolygonStore {
    polygons: IndexMap<PolygonId, Polygon>,
    next_serial: u64,
}

impl PolygonStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &PolygonId) -> Option<&Polygon> {
        self.polygons.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Polygon> {
        self.polygons.values()
    }

    /// Adds a completed polygon under a freshly generated id.
    pub fn insert(
        &mut self,
        vertices: Vec<ScreenPoint>,
        style: PolygonStyle,
        view: ViewState,
    ) -> PolygonId {
        let id = self.next_free_id();
        self.store(id.clone(), vertices, style, view);
        id
    }

    /// Adds a polygon under `preferred` when that id is free. A taken id is
    /// never overwritten; the polygon is re-keyed instead.
    pub fn insert_preferring_id(
        &mut self,
        preferred: PolygonId,
        vertices: Vec<ScreenPoint>,
        style: PolygonStyle,
        view: ViewState,
    ) -> PolygonId {
        let id = if self.polygons.contains_key(&preferred) {
            let fresh = self.next_free_id();
            warn!(requested = %preferred, assigned = %fresh, "polygon id already in use, re-keyed");
            fresh
        } else {
            preferred
        };
        self.store(id.clone(), vertices, style, view);
        id
    }

    fn next_free_id(&mut self) -> PolygonId {
        loop {
            self.next_serial += 1;
            let candidate = PolygonId::new(format!("polygon-{}", self.next_serial));
            if !self.polygons.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    fn store(&mut self, id: PolygonId, vertices: Vec<ScreenPoint>, style: PolygonStyle, view: ViewState) {
        debug!(polygon = %id, vertex_count = vertices.len(), "polygon stored");
        self.polygons.insert(
            id.clone(),
            Polygon {
                id,
                vertices,
                style,
                state: PolygonState::Complete,
                view,
            },
        );
    }

    pub fn delete(&mut self, id: &PolygonId) -> Option<Polygon> {
        let removed = self.polygons.shift_remove(id);
        if removed.is_some() {
            debug!(polygon = %id, "polygon deleted");
        }
        removed
    }

    pub fn clear(&mut self) {
        self.polygons.clear();
    }

    /// Marks `id` selected (single selection). `None` clears the selection.
    /// Returns ids whose state changed.
    pub fn select(&mut self, id: Option<&PolygonId>) -> Vec<PolygonId> {
        self.set_exclusive_state(id, PolygonState::Selected)
    }

    /// Marks `id` hovered; selected polygons keep their selection.
    pub fn set_hovered(&mut self, id: Option<&PolygonId>) -> Vec<PolygonId> {
        self.set_exclusive_state(id, PolygonState::Hovered)
    }

    fn set_exclusive_state(&mut self, id: Option<&PolygonId>, state: PolygonState) -> Vec<PolygonId> {
        let mut changed = Vec::new();
        for polygon in self.polygons.values_mut() {
            let is_target = id == Some(&polygon.id);
            let next = if is_target {
                if state == PolygonState::Hovered && polygon.state == PolygonState::Selected {
                    PolygonState::Selected
                } else {
                    state
                }
            } else if polygon.state == state {
                PolygonState::Complete
            } else {
                polygon.state
            };
            if next != polygon.state {
                polygon.state = next;
                changed.push(polygon.id.clone());
            }
        }
        changed
    }

    /// Topmost polygon containing `point`.
    #[must_use]
    pub fn polygon_at(&self, point: ScreenPoint) -> Option<&PolygonId> {
        self.polygons
            .values()
            .rev()
            .find(|polygon| polygon.contains(point))
            .map(|polygon| &polygon.id)
    }
}

#[cfg(test)]
mod tests {
    use super::{PolygonId, PolygonState, PolygonStore, PolygonStyle};
    use crate::core::transform::ViewState;
    use crate::core::types::ScreenPoint;

    fn square(offset: f64) -> Vec<ScreenPoint> {
        vec![
            ScreenPoint::new(offset, offset),
            ScreenPoint::new(offset + 10.0, offset),
            ScreenPoint::new(offset + 10.0, offset + 10.0),
            ScreenPoint::new(offset, offset + 10.0),
        ]
    }

    #[test]
    fn hover_does_not_override_selection() {
        let mut store = PolygonStore::new();
        let a = store.insert(square(0.0), PolygonStyle::default(), ViewState::default());
        let b = store.insert(square(5.0), PolygonStyle::default(), ViewState::default());

        store.select(Some(&a));
        store.set_hovered(Some(&a));
        assert_eq!(store.get(&a).map(|p| p.state), Some(PolygonState::Selected));

        let changed = store.set_hovered(Some(&b));
        assert_eq!(changed, vec![b.clone()]);
        assert_eq!(store.polygon_at(ScreenPoint::new(7.0, 7.0)), Some(&b));
    }

    #[test]
    fn delete_keeps_remaining_order() {
        let mut store = PolygonStore::new();
        let a = store.insert(square(0.0), PolygonStyle::default(), ViewState::default());
        let b = store.insert(square(20.0), PolygonStyle::default(), ViewState::default());
        let c = store.insert(square(40.0), PolygonStyle::default(), ViewState::default());

        assert!(store.delete(&b).is_some());
        let ids: Vec<_> = store.iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, vec![a, c]);
    }

    #[test]
    fn taken_id_is_rekeyed_instead_of_replaced() {
        let mut store = PolygonStore::new();
        let drawn = store.insert(square(0.0), PolygonStyle::default(), ViewState::default());
        assert_eq!(drawn.as_str(), "polygon-1");

        let imported = store.insert_preferring_id(
            PolygonId::new("polygon-1"),
            square(30.0),
            PolygonStyle::default(),
            ViewState::default(),
        );
        assert_ne!(imported, drawn);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&drawn).map(|p| p.vertices.clone()), Some(square(0.0)));
        assert_eq!(store.get(&imported).map(|p| p.vertices.clone()), Some(square(30.0)));

        let kept = store.insert_preferring_id(
            PolygonId::new("saved-7"),
            square(60.0),
            PolygonStyle::default(),
            ViewState::default(),
        );
        assert_eq!(kept.as_str(), "saved-7");
    }
}
