use approx::assert_relative_eq;
use proptest::prelude::*;
use scatter_rs::core::{
    CanvasSize, CoordinateTransform, DataCoord, DataDomain, ScreenPoint, ViewState,
    calculate_viewport_bounds,
};

fn domain(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> DataDomain {
    DataDomain {
        min_x,
        max_x,
        min_y,
        max_y,
    }
}

#[test]
fn identity_view_maps_domain_corners_to_canvas_corners() {
    let canvas = CanvasSize::new(800.0, 600.0);
    let transform =
        CoordinateTransform::for_view(domain(-10.0, 10.0, 0.0, 100.0), ViewState::default(), canvas)
            .expect("valid transform");

    let bottom_left = transform.to_screen(DataCoord::new(-10.0, 0.0));
    let top_right = transform.to_screen(DataCoord::new(10.0, 100.0));

    assert_relative_eq!(bottom_left.x.get(), 0.0);
    assert_relative_eq!(bottom_left.y.get(), 600.0);
    assert_relative_eq!(top_right.x.get(), 800.0);
    assert_relative_eq!(top_right.y.get(), 0.0);
}

#[test]
fn positive_pan_moves_content_right_and_down() {
    let canvas = CanvasSize::new(1000.0, 1000.0);
    let base = domain(0.0, 1000.0, 0.0, 1000.0);
    let mut view = ViewState::default();
    view.pan_by(100.0, 50.0);

    let transform = CoordinateTransform::for_view(base, view, canvas).expect("valid transform");
    let moved = transform.to_screen(DataCoord::new(500.0, 500.0));

    assert_relative_eq!(moved.x.get(), 600.0, epsilon = 1e-9);
    assert_relative_eq!(moved.y.get(), 550.0, epsilon = 1e-9);
}

#[test]
fn zoom_shrinks_visible_span() {
    let canvas = CanvasSize::new(400.0, 400.0);
    let viewport = calculate_viewport_bounds(domain(0.0, 100.0, 0.0, 100.0), 4.0, 0.0, 0.0, canvas)
        .expect("valid viewport");

    assert_relative_eq!(viewport.max_x - viewport.min_x, 25.0);
    assert_relative_eq!(viewport.max_y - viewport.min_y, 25.0);
    assert_relative_eq!(viewport.min_x, 37.5);
}

#[test]
fn invalid_canvas_is_rejected() {
    let err = calculate_viewport_bounds(
        domain(0.0, 1.0, 0.0, 1.0),
        1.0,
        0.0,
        0.0,
        CanvasSize::new(0.0, 100.0),
    )
    .expect_err("zero width canvas must fail");
    assert!(err.to_string().contains("invalid canvas size"));
}

#[test]
fn non_finite_zoom_is_rejected() {
    let result = calculate_viewport_bounds(
        domain(0.0, 1.0, 0.0, 1.0),
        f64::NAN,
        0.0,
        0.0,
        CanvasSize::new(100.0, 100.0),
    );
    assert!(result.is_err());
}

proptest! {
    #[test]
    fn screen_round_trip_property(
        min_x in -10_000.0f64..10_000.0,
        span_x in 1.0f64..1_000_000.0,
        min_y in -10_000.0f64..10_000.0,
        span_y in 1.0f64..1_000_000.0,
        zoom in 0.05f64..50.0,
        pan_x in -2_000.0f64..2_000.0,
        pan_y in -2_000.0f64..2_000.0,
        fx in 0.0f64..1.0,
        fy in 0.0f64..1.0
    ) {
        let canvas = CanvasSize::new(1920.0, 1080.0);
        let view = ViewState { scale: zoom, translate_x: pan_x, translate_y: pan_y };
        let transform = CoordinateTransform::for_view(
            domain(min_x, min_x + span_x, min_y, min_y + span_y),
            view,
            canvas,
        ).expect("valid transform");

        let point = ScreenPoint::new(fx * canvas.width, fy * canvas.height);
        let recovered = transform.to_screen(transform.to_data(point));

        prop_assert!((recovered.x.get() - point.x.get()).abs() <= 1e-5);
        prop_assert!((recovered.y.get() - point.y.get()).abs() <= 1e-5);
    }

    #[test]
    fn zoom_keeps_anchor_fixed_property(
        factor in 0.1f64..10.0,
        ax in 0.0f64..800.0,
        ay in 0.0f64..600.0
    ) {
        let canvas = CanvasSize::new(800.0, 600.0);
        let base = domain(0.0, 50.0, -20.0, 20.0);
        let before = CoordinateTransform::for_view(base, ViewState::default(), canvas)
            .expect("valid transform");
        let anchor = ScreenPoint::new(ax, ay);
        let under_anchor = before.to_data(anchor);

        let mut view = ViewState::default();
        view.zoom_at(factor, anchor, canvas);
        let after = CoordinateTransform::for_view(base, view, canvas).expect("valid transform");
        let projected = after.to_screen(under_anchor);

        prop_assert!((projected.x.get() - ax).abs() <= 1e-6);
        prop_assert!((projected.y.get() - ay).abs() <= 1e-6);
    }
}
