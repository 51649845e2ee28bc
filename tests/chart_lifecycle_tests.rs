use std::time::{Duration, Instant};

use scatter_rs::core::{AxisSelection, CanvasSize, DataPoint, ScreenPoint};
use scatter_rs::render::{
    CanvasSurface, DevicePixelRatio, DrawCommand, LayerKind, ManualFrameClock, RecordingSurface,
};
use scatter_rs::{ScatterChart, ScatterChartConfig, ScatterError};

type TestChart = ScatterChart<RecordingSurface, ManualFrameClock>;

fn points() -> Vec<DataPoint> {
    vec![
        DataPoint::new(0.0, 0.0),
        DataPoint::new(10.0, 10.0),
        DataPoint::new(5.0, 5.0),
    ]
}

fn config() -> ScatterChartConfig {
    ScatterChartConfig::new(CanvasSize::new(100.0, 100.0))
}

fn chart() -> TestChart {
    ScatterChart::new(
        config(),
        points(),
        AxisSelection::default(),
        RecordingSurface::new(),
        RecordingSurface::new(),
        ManualFrameClock::new(),
    )
    .expect("chart init")
}

/// Fires every queued frame; returns how many draws ran.
fn run_frames(chart: &mut TestChart) -> usize {
    let due = chart.frame_requester_mut().drain_due();
    due.into_iter()
        .filter(|handle| chart.on_animation_frame(*handle).expect("frame"))
        .count()
}

fn points_commands(chart: &TestChart) -> &[DrawCommand] {
    chart
        .layers()
        .points
        .context()
        .expect("points context")
        .commands()
}

#[test]
fn first_frame_clears_and_draws_every_visible_point() {
    let mut chart = chart();
    assert_eq!(run_frames(&mut chart), 1);

    let commands = points_commands(&chart);
    assert!(matches!(commands.first(), Some(DrawCommand::Clear { .. })));
    let circles = commands
        .iter()
        .filter(|command| matches!(command, DrawCommand::Circle { .. }))
        .count();
    assert_eq!(circles, 3);
}

#[test]
fn rapid_updates_coalesce_into_one_frame() {
    let mut chart = chart();
    chart.pan_by(5.0, 0.0).expect("pan");
    chart.pan_by(5.0, 0.0).expect("pan");
    chart.zoom_at(2.0, ScreenPoint::new(50.0, 50.0)).expect("zoom");

    assert_eq!(chart.frame_requester_mut().queued_len(), 1);
    assert_eq!(run_frames(&mut chart), 1);
    assert_eq!(chart.scheduler().frames_executed(), 1);
}

#[test]
fn hover_repaints_only_a_dirty_rect() {
    let mut chart = chart();
    run_frames(&mut chart);
    let before = points_commands(&chart).len();

    chart.pointer_move(ScreenPoint::new(52.0, 50.0));
    assert_eq!(chart.hovered_point(), Some(2));
    assert_eq!(run_frames(&mut chart), 1);

    let fresh = &points_commands(&chart)[before..];
    match fresh.first() {
        Some(DrawCommand::Clear { rect }) => {
            assert!(rect.width < 100.0 && rect.height < 100.0);
        }
        other => panic!("expected partial clear, got {other:?}"),
    }
}

#[test]
fn pointer_far_from_points_clears_hover() {
    let mut chart = chart();
    chart.pointer_move(ScreenPoint::new(50.0, 50.0));
    assert_eq!(chart.hovered_point(), Some(2));
    chart.pointer_move(ScreenPoint::new(75.0, 25.0));
    assert_eq!(chart.hovered_point(), None);
}

#[test]
fn context_failure_is_reported_per_layer() {
    let result = ScatterChart::new(
        config(),
        points(),
        AxisSelection::default(),
        RecordingSurface::new(),
        RecordingSurface::unavailable("no 2d context"),
        ManualFrameClock::new(),
    );

    match result {
        Err(ScatterError::ContextAcquisition { layer, reason }) => {
            assert_eq!(layer, LayerKind::PolygonOverlay);
            assert!(reason.contains("no 2d context"));
        }
        other => panic!("expected context failure, got {other:?}"),
    }
}

#[test]
fn invalid_canvas_is_rejected_at_construction() {
    let result = ScatterChart::new(
        ScatterChartConfig::new(CanvasSize::new(0.0, 100.0)),
        points(),
        AxisSelection::default(),
        RecordingSurface::new(),
        RecordingSurface::new(),
        ManualFrameClock::new(),
    );
    assert!(matches!(result, Err(ScatterError::InvalidCanvasSize { .. })));
}

#[test]
fn teardown_turns_pending_frames_into_no_ops() {
    let mut chart = chart();
    let pending = chart.scheduler().pending_handle().expect("initial frame");

    chart.teardown();

    assert_eq!(chart.frame_requester_mut().queued_len(), 0);
    assert!(!chart.on_animation_frame(pending).expect("frame"));
    assert!(chart.layers().points.is_disposed());
    assert!(chart.layers().overlay.context().is_none());

    chart.pan_by(10.0, 0.0).expect("pan after teardown");
    assert_eq!(chart.frame_requester_mut().queued_len(), 0);
}

#[test]
fn resize_is_debounced() {
    let mut chart = chart();
    let start = Instant::now();

    chart.request_resize(CanvasSize::new(300.0, 200.0), start);
    chart.request_resize(CanvasSize::new(400.0, 300.0), start + Duration::from_millis(50));

    assert!(!chart.poll_resize(start + Duration::from_millis(150)).expect("poll"));
    assert_eq!(chart.canvas(), CanvasSize::new(100.0, 100.0));

    assert!(chart.poll_resize(start + Duration::from_millis(200)).expect("poll"));
    assert_eq!(chart.canvas(), CanvasSize::new(400.0, 300.0));
    assert_eq!(chart.layers().points.surface().backing_size(), (400, 300));
    assert_eq!(chart.layers().overlay.css_size(), CanvasSize::new(400.0, 300.0));
}

#[test]
fn ratio_change_reconfigures_both_layers() {
    let mut chart = chart();
    let ratio = DevicePixelRatio::new(2.0).expect("valid ratio");

    assert!(chart.set_device_pixel_ratio(ratio).expect("dpr"));
    assert!(!chart.set_device_pixel_ratio(ratio).expect("dpr"));

    for layer in [&chart.layers().points, &chart.layers().overlay] {
        assert_eq!(layer.surface().backing_size(), (200, 200));
        assert_eq!(layer.context().expect("context").scale(), 2.0);
        assert_eq!(layer.surface().contexts_created(), 2);
    }

    assert_eq!(run_frames(&mut chart), 1);
    let circle = points_commands(&chart)
        .iter()
        .find_map(|command| match command {
            DrawCommand::Circle { center, .. } => Some(*center),
            _ => None,
        })
        .expect("circle drawn");
    assert!(circle.0 >= 0.0 && circle.0 <= 200.0);
}

#[test]
fn dataset_replacement_rebuilds_index() {
    let mut chart = chart();
    chart
        .set_dataset(vec![DataPoint::new(1.0, 1.0), DataPoint::new(2.0, 2.0)])
        .expect("dataset");

    assert_eq!(chart.spatial_index().len(), 2);
    assert_eq!(chart.visible_indices().len(), 2);
    assert_eq!(chart.hovered_point(), None);
}
