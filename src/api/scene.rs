//! Frame snapshots and the draw passes that consume them.
//!
//! A snapshot is captured when a render is requested, so the frame that
//! eventually runs always paints the newest requested state.

use std::sync::Arc;

use tracing::trace;

use crate::core::geometry::polygon_centroid;
use crate::core::membership::PolygonStats;
use crate::core::spatial_index::SpatialIndex;
use crate::core::transform::CoordinateTransform;
use crate::core::types::{DataCoord, ScreenPoint};
use crate::error::ScatterResult;
use crate::interaction::{Polygon, PolygonStyle};
use crate::render::{
    CanvasLayer, CanvasSurface, Color, DirtyRegion, DrawContext, FrameTarget, ScreenRect,
    clear_region, render_with_clip,
};

const VERTEX_MARKER_RADIUS_PX: f64 = 3.0;
const CLOSE_HINT_RADIUS_PX: f64 = 6.0;
const HOVER_RADIUS_FACTOR: f64 = 1.6;

/// The two canvases a scatter chart renders into.
pub struct ChartLayers<S: CanvasSurface> {
    pub points: CanvasLayer<S>,
    pub overlay: CanvasLayer<S>,
}

impl<S: CanvasSurface> std::fmt::Debug for ChartLayers<S>
where
    CanvasLayer<S>: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartLayers")
            .field("points", &self.points)
            .field("overlay", &self.overlay)
            .finish()
    }
}

impl<S: CanvasSurface> ChartLayers<S> {
    /// Layers ordered bottom to top by z-index.
    pub fn ordered(&self) -> [&CanvasLayer<S>; 2] {
        if self.points.z_index() <= self.overlay.z_index() {
            [&self.points, &self.overlay]
        } else {
            [&self.overlay, &self.points]
        }
    }
}

impl<S: CanvasSurface> FrameTarget for ChartLayers<S> {
    fn is_disposed(&self) -> bool {
        self.points.is_disposed() && self.overlay.is_disposed()
    }

    fn clear_all(&mut self) -> ScatterResult<()> {
        for layer in [&mut self.points, &mut self.overlay] {
            if layer.is_enabled() {
                layer.clear()?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub(super) struct PointsScene {
    pub coords: Arc<[Option<DataCoord>]>,
    pub index: Arc<SpatialIndex>,
    pub transform: CoordinateTransform,
    pub radius_px: f64,
    pub color: Color,
    pub hovered: Option<usize>,
    pub hover_color: Color,
}

#[derive(Debug, Clone)]
pub(super) struct OverlayScene {
    pub polygons: Vec<(Polygon, Option<PolygonStats>)>,
    pub in_progress: Vec<ScreenPoint>,
    pub preview: Option<(ScreenPoint, ScreenPoint)>,
    pub close_hint: bool,
    pub drawing_style: PolygonStyle,
    pub label_color: Color,
    pub label_font_size_px: f64,
}

#[derive(Debug, Clone)]
pub(super) struct FrameScene {
    pub points: PointsScene,
    pub overlay: OverlayScene,
}

pub(super) fn draw_frame<S: CanvasSurface>(
    layers: &mut ChartLayers<S>,
    scene: &FrameScene,
) -> ScatterResult<()> {
    draw_layer(&mut layers.points, |context, area| {
        draw_points(context, &scene.points, area)
    })?;
    draw_layer(&mut layers.overlay, |context, area| {
        draw_overlay(context, &scene.overlay, area)
    })
}

/// Clears and repaints whatever the layer's dirty region covers.
fn draw_layer<S, F>(layer: &mut CanvasLayer<S>, mut paint: F) -> ScatterResult<()>
where
    S: CanvasSurface,
    F: FnMut(&mut S::Context, ScreenRect) -> ScatterResult<()>,
{
    if !layer.is_enabled() {
        trace!(layer = ?layer.kind(), "skipping disabled layer");
        return Ok(());
    }
    let kind = layer.kind();
    let bounds = layer.bounds();
    let clear_first = layer.clear_on_render();
    let region = layer.take_dirty_region();
    let context = layer.context_mut()?;
    if clear_first {
        clear_region(context, &region, bounds)?;
    }
    match region {
        DirtyRegion::Clean => Ok(()),
        DirtyRegion::Full => paint(context, bounds),
        DirtyRegion::Rects(rects) => {
            trace!(layer = ?kind, rects = rects.len(), "partial repaint");
            for rect in rects {
                render_with_clip(context, rect, |context| paint(context, rect))?;
            }
            Ok(())
        }
    }
}

fn draw_points<C: DrawContext + ?Sized>(
    context: &mut C,
    scene: &PointsScene,
    area: ScreenRect,
) -> ScatterResult<()> {
    let (min_x, min_y, max_x, max_y) = scene
        .transform
        .screen_rect_to_data(area.expanded(scene.radius_px));
    let mut indices = scene.index.query(min_x, min_y, max_x, max_y);
    indices.sort_unstable();

    for index in indices {
        if Some(index) == scene.hovered {
            continue;
        }
        let Some(coord) = scene.coords.get(index).copied().flatten() else {
            continue;
        };
        context.fill_circle(scene.transform.to_screen(coord), scene.radius_px, scene.color)?;
    }

    if let Some(coord) = scene
        .hovered
        .and_then(|index| scene.coords.get(index).copied().flatten())
    {
        let center = scene.transform.to_screen(coord);
        let radius = scene.radius_px * HOVER_RADIUS_FACTOR;
        if area.expanded(radius).contains_point(center) {
            context.fill_circle(center, radius, scene.hover_color)?;
        }
    }
    Ok(())
}

fn draw_overlay<C: DrawContext + ?Sized>(
    context: &mut C,
    scene: &OverlayScene,
    area: ScreenRect,
) -> ScatterResult<()> {
    for (polygon, stats) in &scene.polygons {
        let label = stats.map(format_stats_label);
        let label_area = label.as_deref().and_then(|text| {
            polygon_centroid(&polygon.vertices)
                .map(|anchor| label_bounds(anchor, text, scene.label_font_size_px))
        });
        let touches = polygon.paint_bounds().is_some_and(|b| b.touches(area))
            || label_area.is_some_and(|b| b.touches(area));
        if !touches {
            continue;
        }

        context.fill_path(&polygon.vertices, polygon.style.fill_color)?;
        context.stroke_path(
            &polygon.vertices,
            true,
            polygon.style.stroke_width_for(polygon.state),
            polygon.style.stroke_color,
        )?;
        if let (Some(text), Some(anchor)) = (label, polygon_centroid(&polygon.vertices)) {
            context.fill_text(&text, anchor, scene.label_font_size_px, scene.label_color)?;
        }
    }

    let style = scene.drawing_style;
    if scene.in_progress.len() >= 2 {
        context.stroke_path(&scene.in_progress, false, style.stroke_width, style.stroke_color)?;
    }
    for (position, vertex) in scene.in_progress.iter().enumerate() {
        let radius = if position == 0 && scene.close_hint {
            CLOSE_HINT_RADIUS_PX
        } else {
            VERTEX_MARKER_RADIUS_PX
        };
        context.fill_circle(*vertex, radius, style.stroke_color)?;
    }
    if let Some((from, to)) = scene.preview {
        context.stroke_path(&[from, to], false, style.stroke_width, style.stroke_color)?;
    }
    Ok(())
}

#[must_use]
pub(super) fn format_stats_label(stats: PolygonStats) -> String {
    format!("{} ({:.1}%)", stats.count, stats.percentage)
}

/// Approximate box covered by a centered label.
#[must_use]
pub(super) fn label_bounds(anchor: ScreenPoint, text: &str, font_size_px: f64) -> ScreenRect {
    let width = text.chars().count() as f64 * font_size_px * 0.6;
    let height = font_size_px * 1.4;
    ScreenRect::new(
        anchor.x.get() - width / 2.0,
        anchor.y.get() - height / 2.0,
        width,
        height,
    )
}
