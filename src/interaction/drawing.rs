use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::geometry::{AUTO_CLOSE_THRESHOLD_PX, is_near_first_point, is_valid_polygon};
use crate::core::types::ScreenPoint;

/// Phase of the polygon drawing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawingPhase {
    Idle,
    Drawing,
}

/// Result of feeding a vertex or close command into the session.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawingOutcome {
    /// No session is active.
    Ignored,
    VertexAdded { vertex_count: usize },
    /// Validation passed; the session is back to idle and owns no vertices.
    Completed { vertices: Vec<ScreenPoint> },
    /// Completion attempted but the polygon is invalid; drawing continues.
    Rejected { vertex_count: usize },
}

/// In-progress polygon: committed vertices plus the live pointer preview.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingSession {
    phase: DrawingPhase,
    vertices: Vec<ScreenPoint>,
    pointer: Option<ScreenPoint>,
    close_threshold_px: f64,
}

impl Default for DrawingSession {
    fn default() -> Self {
        Self::new(AUTO_CLOSE_THRESHOLD_PX)
    }
}

impl DrawingSession {
    #[must_use]
    pub fn new(close_threshold_px: f64) -> Self {
        Self {
            phase: DrawingPhase::Idle,
            vertices: Vec::new(),
            pointer: None,
            close_threshold_px,
        }
    }

    #[must_use]
    pub fn phase(&self) -> DrawingPhase {
        self.phase
    }

    #[must_use]
    pub fn is_drawing(&self) -> bool {
        self.phase == DrawingPhase::Drawing
    }

    #[must_use]
    pub fn vertices(&self) -> &[ScreenPoint] {
        &self.vertices
    }

    #[must_use]
    pub fn pointer(&self) -> Option<ScreenPoint> {
        self.pointer
    }

    /// Idle -> Drawing with an empty vertex list. Returns `false` if a session
    /// is already running.
    pub fn start(&mut self) -> bool {
        if self.is_drawing() {
            return false;
        }
        self.phase = DrawingPhase::Drawing;
        self.vertices.clear();
        self.pointer = None;
        debug!("polygon drawing started");
        true
    }

    /// Commits `point`, or attempts completion when it lands near the first
    /// vertex of a polygon that already has three or more vertices.
    pub fn add_vertex(&mut self, point: ScreenPoint) -> DrawingOutcome {
        if !self.is_drawing() || !point.is_finite() {
            return DrawingOutcome::Ignored;
        }
        if self.vertices.len() >= 3
            && is_near_first_point(point, self.vertices[0], self.close_threshold_px)
        {
            return self.close();
        }
        self.vertices.push(point);
        trace!(vertex_count = self.vertices.len(), "polygon vertex added");
        DrawingOutcome::VertexAdded {
            vertex_count: self.vertices.len(),
        }
    }

    /// Records the pointer for the preview segment; never commits a vertex.
    pub fn update_pointer(&mut self, point: ScreenPoint) {
        if self.is_drawing() && point.is_finite() {
            self.pointer = Some(point);
        }
    }

    /// Segment from the last committed vertex to the pointer.
    #[must_use]
    pub fn preview_segment(&self) -> Option<(ScreenPoint, ScreenPoint)> {
        if !self.is_drawing() {
            return None;
        }
        Some((*self.vertices.last()?, self.pointer?))
    }

    /// True when the pointer is close enough to the first vertex that the next
    /// click would close the polygon.
    #[must_use]
    pub fn pointer_near_first(&self) -> bool {
        match (self.vertices.first(), self.pointer) {
            (Some(first), Some(pointer)) if self.vertices.len() >= 3 => {
                is_near_first_point(pointer, *first, self.close_threshold_px)
            }
            _ => false,
        }
    }

    /// Explicit close. Invalid polygons stay in the drawing phase.
    pub fn close(&mut self) -> DrawingOutcome {
        if !self.is_drawing() {
            return DrawingOutcome::Ignored;
        }
        if !is_valid_polygon(&self.vertices) {
            debug!(
                vertex_count = self.vertices.len(),
                "polygon completion rejected"
            );
            return DrawingOutcome::Rejected {
                vertex_count: self.vertices.len(),
            };
        }
        let vertices = std::mem::take(&mut self.vertices);
        self.phase = DrawingPhase::Idle;
        self.pointer = None;
        debug!(vertex_count = vertices.len(), "polygon completed");
        DrawingOutcome::Completed { vertices }
    }

    /// Drawing -> Idle, discarding every committed vertex.
    pub fn cancel(&mut self) -> bool {
        if !self.is_drawing() {
            return false;
        }
        self.phase = DrawingPhase::Idle;
        self.vertices.clear();
        self.pointer = None;
        debug!("polygon drawing cancelled");
        true
    }
}
