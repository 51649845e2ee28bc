//! Polygon math over screen-space vertex lists.

use crate::core::types::ScreenPoint;
use crate::render::ScreenRect;

/// Minimum absolute area (px²) for a polygon to count as valid.
pub const POLYGON_AREA_EPSILON: f64 = 0.01;
/// Default distance (px) at which the pointer snaps the polygon closed.
pub const AUTO_CLOSE_THRESHOLD_PX: f64 = 10.0;

const BOUNDARY_EPSILON: f64 = 1e-9;

/// Even-odd ray casting; points on an edge or vertex count as inside.
#[must_use]
pub fn is_point_in_polygon(point: ScreenPoint, vertices: &[ScreenPoint]) -> bool {
    if vertices.len() < 3 || !point.is_finite() {
        return false;
    }
    let (px, py) = (point.x.get(), point.y.get());

    let mut inside = false;
    let mut previous = vertices[vertices.len() - 1];
    for &current in vertices {
        if is_on_segment(point, previous, current) {
            return true;
        }
        let (xi, yi) = (current.x.get(), current.y.get());
        let (xj, yj) = (previous.x.get(), previous.y.get());
        if (yi > py) != (yj > py) {
            let crossing_x = xi + (py - yi) * (xj - xi) / (yj - yi);
            if px < crossing_x {
                inside = !inside;
            }
        }
        previous = current;
    }
    inside
}

fn is_on_segment(point: ScreenPoint, start: ScreenPoint, end: ScreenPoint) -> bool {
    let (px, py) = (point.x.get(), point.y.get());
    let (ax, ay) = (start.x.get(), start.y.get());
    let (bx, by) = (end.x.get(), end.y.get());

    let cross = (bx - ax) * (py - ay) - (by - ay) * (px - ax);
    let length = (bx - ax).hypot(by - ay);
    if cross.abs() > BOUNDARY_EPSILON * length.max(1.0) {
        return false;
    }
    px >= ax.min(bx) - BOUNDARY_EPSILON
        && px <= ax.max(bx) + BOUNDARY_EPSILON
        && py >= ay.min(by) - BOUNDARY_EPSILON
        && py <= ay.max(by) + BOUNDARY_EPSILON
}

/// Signed shoelace area; positive for counter-clockwise winding.
#[must_use]
pub fn polygon_area(vertices: &[ScreenPoint]) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    let mut previous = vertices[vertices.len() - 1];
    for &current in vertices {
        twice_area +=
            previous.x.get() * current.y.get() - current.x.get() * previous.y.get();
        previous = current;
    }
    twice_area * 0.5
}

#[must_use]
pub fn is_valid_polygon(vertices: &[ScreenPoint]) -> bool {
    vertices.len() >= 3
        && vertices.iter().all(|vertex| vertex.is_finite())
        && polygon_area(vertices).abs() > POLYGON_AREA_EPSILON
}

/// Area-weighted centroid.
///
/// Degenerate (near zero area) inputs fall back to the vertex mean; an empty
/// list has no centroid.
#[must_use]
pub fn polygon_centroid(vertices: &[ScreenPoint]) -> Option<ScreenPoint> {
    if vertices.is_empty() {
        return None;
    }

    let area = polygon_area(vertices);
    if area.abs() <= POLYGON_AREA_EPSILON {
        let count = vertices.len() as f64;
        let (sum_x, sum_y) = vertices.iter().fold((0.0, 0.0), |(sx, sy), vertex| {
            (sx + vertex.x.get(), sy + vertex.y.get())
        });
        return Some(ScreenPoint::new(sum_x / count, sum_y / count));
    }

    let mut cx = 0.0;
    let mut cy = 0.0;
    let mut previous = vertices[vertices.len() - 1];
    for &current in vertices {
        let (x0, y0) = (previous.x.get(), previous.y.get());
        let (x1, y1) = (current.x.get(), current.y.get());
        let cross = x0 * y1 - x1 * y0;
        cx += (x0 + x1) * cross;
        cy += (y0 + y1) * cross;
        previous = current;
    }
    let factor = 1.0 / (6.0 * area);
    Some(ScreenPoint::new(cx * factor, cy * factor))
}

/// Auto-close proximity test; not used for membership.
#[must_use]
pub fn is_near_first_point(point: ScreenPoint, first: ScreenPoint, threshold: f64) -> bool {
    point.distance_to(first) <= threshold
}

/// Axis-aligned bounds of the vertex list.
#[must_use]
pub fn polygon_bounds(vertices: &[ScreenPoint]) -> Option<ScreenRect> {
    let first = vertices.first()?;
    let (mut min_x, mut min_y) = (first.x.get(), first.y.get());
    let (mut max_x, mut max_y) = (min_x, min_y);
    for vertex in &vertices[1..] {
        min_x = min_x.min(vertex.x.get());
        min_y = min_y.min(vertex.y.get());
        max_x = max_x.max(vertex.x.get());
        max_y = max_y.max(vertex.y.get());
    }
    Some(ScreenRect::new(min_x, min_y, max_x - min_x, max_y - min_y))
}
