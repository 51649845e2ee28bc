use ordered_float::OrderedFloat;

use crate::core::spatial_index::SpatialIndex;
use crate::core::transform::CoordinateTransform;
use crate::core::types::{DataCoord, ScreenPoint};

/// Nearest plotted point within `radius_px` of `pointer`, in screen distance.
///
/// The index query uses the data-space box around the pointer as a coarse
/// filter; every candidate is then checked against its exact projection, so
/// anisotropic axis scaling never produces a wrong answer.
#[must_use]
pub fn hit_test(
    index: &SpatialIndex,
    coords: &[Option<DataCoord>],
    transform: &CoordinateTransform,
    pointer: ScreenPoint,
    radius_px: f64,
) -> Option<usize> {
    if !pointer.is_finite() || !radius_px.is_finite() || radius_px < 0.0 {
        return None;
    }
    let center = transform.to_data(pointer);
    let (units_x, units_y) = transform.data_units_per_pixel();
    let half_width = radius_px * units_x;
    let half_height = radius_px * units_y;

    index
        .query(
            center.x.get() - half_width,
            center.y.get() - half_height,
            center.x.get() + half_width,
            center.y.get() + half_height,
        )
        .into_iter()
        .filter_map(|candidate| {
            let coord = (*coords.get(candidate)?)?;
            let distance = transform.to_screen(coord).distance_to(pointer);
            (distance <= radius_px).then_some((OrderedFloat(distance), candidate))
        })
        .min()
        .map(|(_, candidate)| candidate)
}

#[cfg(test)]
mod tests {
    use super::hit_test;
    use crate::core::spatial_index::SpatialIndex;
    use crate::core::transform::{CoordinateTransform, ViewState};
    use crate::core::types::{CanvasSize, DataCoord, DataDomain, ScreenPoint};

    #[test]
    fn picks_closest_candidate_within_radius() {
        let coords = vec![
            Some(DataCoord::new(0.0, 0.0)),
            Some(DataCoord::new(50.0, 50.0)),
            Some(DataCoord::new(52.0, 50.0)),
            Some(DataCoord::new(100.0, 100.0)),
        ];
        let domain = DataDomain::from_coords(coords.iter().flatten());
        let transform = CoordinateTransform::for_view(
            domain,
            ViewState::default(),
            CanvasSize::new(100.0, 100.0),
        )
        .expect("transform");
        let index = SpatialIndex::build(&coords, |coord| *coord);

        let pointer = ScreenPoint::new(51.5, 50.0);
        assert_eq!(hit_test(&index, &coords, &transform, pointer, 3.0), Some(2));
        assert_eq!(
            hit_test(&index, &coords, &transform, ScreenPoint::new(75.0, 20.0), 3.0),
            None
        );
    }
}
