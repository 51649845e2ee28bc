use scatter_rs::core::{AxisSelection, CanvasSize, DataPoint, ScreenPoint};
use scatter_rs::interaction::{DrawingPhase, PolygonState};
use scatter_rs::render::{DrawCommand, ManualFrameClock, RecordingSurface};
use scatter_rs::{PolygonEdit, ScatterChart, ScatterChartConfig};

type TestChart = ScatterChart<RecordingSurface, ManualFrameClock>;

fn chart() -> TestChart {
    let points: Vec<DataPoint> = (0..=10)
        .flat_map(|i| (0..=10).map(move |j| DataPoint::new(f64::from(i) * 10.0, f64::from(j) * 10.0)))
        .collect();
    ScatterChart::new(
        ScatterChartConfig::new(CanvasSize::new(400.0, 400.0)),
        points,
        AxisSelection::default(),
        RecordingSurface::new(),
        RecordingSurface::new(),
        ManualFrameClock::new(),
    )
    .expect("chart init")
}

fn run_frames(chart: &mut TestChart) -> usize {
    let due = chart.frame_requester_mut().drain_due();
    due.into_iter()
        .filter(|handle| chart.on_animation_frame(*handle).expect("frame"))
        .count()
}

fn triangle(chart: &mut TestChart) {
    chart.start_drawing();
    chart.add_vertex(ScreenPoint::new(20.0, 20.0));
    chart.add_vertex(ScreenPoint::new(200.0, 20.0));
    chart.add_vertex(ScreenPoint::new(200.0, 200.0));
}

#[test]
fn vertices_are_ignored_while_idle() {
    let mut chart = chart();
    assert_eq!(chart.add_vertex(ScreenPoint::new(5.0, 5.0)), PolygonEdit::Ignored);
    assert_eq!(chart.complete_polygon(), PolygonEdit::Ignored);
    assert!(!chart.cancel_drawing());
}

#[test]
fn click_near_first_vertex_completes_polygon() {
    let mut chart = chart();
    triangle(&mut chart);

    let edit = chart.add_vertex(ScreenPoint::new(24.0, 23.0));
    let PolygonEdit::Completed { id, stats } = edit else {
        panic!("expected completion, got {edit:?}");
    };

    assert_eq!(chart.drawing().phase(), DrawingPhase::Idle);
    assert_eq!(chart.polygons().len(), 1);
    assert_eq!(chart.polygons().get(&id).map(|p| p.vertices.len()), Some(3));
    assert!(stats.count > 0);
}

#[test]
fn near_first_click_with_two_vertices_adds_a_vertex() {
    let mut chart = chart();
    chart.start_drawing();
    chart.add_vertex(ScreenPoint::new(20.0, 20.0));
    chart.add_vertex(ScreenPoint::new(200.0, 20.0));

    assert_eq!(
        chart.add_vertex(ScreenPoint::new(22.0, 22.0)),
        PolygonEdit::VertexAdded { vertex_count: 3 }
    );
}

#[test]
fn degenerate_polygon_is_rejected_and_drawing_continues() {
    let mut chart = chart();
    chart.start_drawing();
    chart.add_vertex(ScreenPoint::new(0.0, 0.0));
    chart.add_vertex(ScreenPoint::new(50.0, 50.0));
    chart.add_vertex(ScreenPoint::new(100.0, 100.0));

    assert_eq!(
        chart.complete_polygon(),
        PolygonEdit::Rejected { vertex_count: 3 }
    );
    assert!(chart.drawing().is_drawing());
    assert!(chart.polygons().is_empty());

    assert!(chart.cancel_drawing());
    assert!(chart.drawing().vertices().is_empty());
}

#[test]
fn pointer_move_updates_preview_without_committing() {
    let mut chart = chart();
    chart.start_drawing();
    chart.add_vertex(ScreenPoint::new(20.0, 20.0));
    run_frames(&mut chart);

    chart.pointer_move(ScreenPoint::new(120.0, 80.0));
    assert_eq!(chart.drawing().vertices().len(), 1);
    assert_eq!(
        chart.drawing().preview_segment(),
        Some((ScreenPoint::new(20.0, 20.0), ScreenPoint::new(120.0, 80.0)))
    );

    assert_eq!(run_frames(&mut chart), 1);
    let overlay = chart
        .layers()
        .overlay
        .context()
        .expect("overlay context")
        .commands();
    let preview_drawn = overlay.iter().any(|command| {
        matches!(command, DrawCommand::Path { points, filled: false, .. }
            if points.as_slice() == [(20.0, 20.0), (120.0, 80.0)])
    });
    assert!(preview_drawn);
}

#[test]
fn completed_polygon_draws_fill_stroke_and_label() {
    let mut chart = chart();
    triangle(&mut chart);
    chart.complete_polygon();
    run_frames(&mut chart);

    let overlay = chart
        .layers()
        .overlay
        .context()
        .expect("overlay context")
        .commands();
    assert!(overlay.iter().any(|c| matches!(c, DrawCommand::Path { filled: true, .. })));
    assert!(overlay.iter().any(|c| matches!(c, DrawCommand::Path { closed: true, filled: false, .. })));
    assert!(overlay.iter().any(|c| matches!(c, DrawCommand::Text { text, .. } if text.ends_with("%)"))));
}

#[test]
fn hover_never_overrides_selection() {
    let mut chart = chart();
    triangle(&mut chart);
    let PolygonEdit::Completed { id, .. } = chart.complete_polygon() else {
        panic!("polygon should complete");
    };

    assert!(chart.select_polygon(Some(&id)));
    chart.pointer_move(ScreenPoint::new(150.0, 60.0));
    assert_eq!(chart.polygons().get(&id).map(|p| p.state), Some(PolygonState::Selected));

    chart.select_polygon(None);
    chart.pointer_move(ScreenPoint::new(151.0, 60.0));
    assert_eq!(chart.polygons().get(&id).map(|p| p.state), Some(PolygonState::Hovered));

    chart.pointer_move(ScreenPoint::new(390.0, 390.0));
    assert_eq!(chart.polygons().get(&id).map(|p| p.state), Some(PolygonState::Complete));
}

#[test]
fn deleting_a_polygon_drops_its_statistics() {
    let mut chart = chart();
    triangle(&mut chart);
    let PolygonEdit::Completed { id, .. } = chart.complete_polygon() else {
        panic!("polygon should complete");
    };

    assert!(chart.delete_polygon(&id));
    assert!(!chart.delete_polygon(&id));
    assert!(chart.polygons().is_empty());
    assert_eq!(chart.polygon_stats(&id), None);
    assert_eq!(chart.polygon_members(&id), None);
}
