//! Pointer-driven state: polygon drawing, completed polygons, hit-testing and
//! resize debouncing.

mod drawing;
mod hit_test;
mod polygon;
mod resize;

pub use drawing::{DrawingOutcome, DrawingPhase, DrawingSession};
pub use hit_test::hit_test;
pub use polygon::{Polygon, PolygonId, PolygonState, PolygonStore, PolygonStyle};
pub use resize::{DEFAULT_RESIZE_DEBOUNCE, ResizeDebouncer};

#[cfg(test)]
mod tests {
    use super::{DrawingOutcome, DrawingPhase, DrawingSession};
    use crate::core::types::ScreenPoint;

    #[test]
    fn click_near_first_vertex_closes_valid_polygon() {
        let mut session = DrawingSession::default();
        assert!(session.start());
        session.add_vertex(ScreenPoint::new(0.0, 0.0));
        session.add_vertex(ScreenPoint::new(100.0, 0.0));
        session.add_vertex(ScreenPoint::new(100.0, 100.0));

        let outcome = session.add_vertex(ScreenPoint::new(4.0, 3.0));
        let DrawingOutcome::Completed { vertices } = outcome else {
            panic!("expected completion, got {outcome:?}");
        };
        assert_eq!(vertices.len(), 3);
        assert_eq!(session.phase(), DrawingPhase::Idle);
    }

    #[test]
    fn degenerate_close_is_rejected_and_drawing_continues() {
        let mut session = DrawingSession::default();
        session.start();
        session.add_vertex(ScreenPoint::new(0.0, 0.0));
        session.add_vertex(ScreenPoint::new(50.0, 50.0));
        session.add_vertex(ScreenPoint::new(100.0, 100.0));

        assert_eq!(
            session.close(),
            DrawingOutcome::Rejected { vertex_count: 3 }
        );
        assert!(session.is_drawing());
        assert_eq!(session.vertices().len(), 3);
    }

    #[test]
    fn preview_follows_pointer_without_committing() {
        let mut session = DrawingSession::default();
        session.start();
        session.add_vertex(ScreenPoint::new(10.0, 10.0));
        session.update_pointer(ScreenPoint::new(40.0, 25.0));
        session.update_pointer(ScreenPoint::new(45.0, 30.0));

        assert_eq!(
            session.preview_segment(),
            Some((ScreenPoint::new(10.0, 10.0), ScreenPoint::new(45.0, 30.0)))
        );
        assert_eq!(session.vertices().len(), 1);

        assert!(session.cancel());
        assert!(session.vertices().is_empty());
        assert_eq!(session.preview_segment(), None);
    }
}
