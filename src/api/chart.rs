use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use tracing::{debug, trace, warn};

use crate::core::geometry::{polygon_bounds, polygon_centroid};
use crate::core::membership::{PolygonStats, ProjectedDataset};
use crate::core::spatial_index::SpatialIndex;
use crate::core::transform::{CoordinateTransform, ViewState};
use crate::core::types::{AxisSelection, CanvasSize, DataCoord, DataDomain, DataPoint, ScreenPoint};
use crate::error::ScatterResult;
use crate::interaction::{
    DrawingOutcome, DrawingSession, PolygonId, PolygonStore, ResizeDebouncer, hit_test,
};
use crate::render::{
    CanvasLayer, CanvasSurface, DevicePixelRatio, DprMonitor, FrameHandle, FrameRequester,
    LayerKind, RenderScheduler, ScreenRect,
};

use super::ScatterChartConfig;
use super::polygon_contract::PolygonSetJsonContractV1;
use super::scene::{
    ChartLayers, FrameScene, OverlayScene, PointsScene, draw_frame, format_stats_label,
    label_bounds,
};

/// Result of a polygon editing command issued through the chart.
#[derive(Debug, Clone, PartialEq)]
pub enum PolygonEdit {
    Ignored,
    VertexAdded { vertex_count: usize },
    Completed { id: PolygonId, stats: PolygonStats },
    Rejected { vertex_count: usize },
}

/// Scatter rendering pipeline for one chart instance.
///
/// Owns the dataset snapshot, its spatial index, the view and transforms,
/// both canvas layers with their contexts, the frame scheduler and the
/// polygon selection state. Nothing is shared with other chart instances.
pub struct ScatterChart<S: CanvasSurface, Q: FrameRequester> {
    config: ScatterChartConfig,
    dataset: Arc<[DataPoint]>,
    axes: AxisSelection,
    coords: Arc<[Option<DataCoord>]>,
    index: Arc<SpatialIndex>,
    domain: DataDomain,
    canvas: CanvasSize,
    view: ViewState,
    transform: CoordinateTransform,
    layers: ChartLayers<S>,
    scheduler: RenderScheduler<ChartLayers<S>, Q>,
    dpr: DprMonitor,
    resize: ResizeDebouncer,
    drawing: DrawingSession,
    polygons: PolygonStore,
    stats: IndexMap<PolygonId, PolygonStats>,
    hovered_point: Option<usize>,
}

impl<S, Q> std::fmt::Debug for ScatterChart<S, Q>
where
    S: CanvasSurface,
    Q: FrameRequester,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScatterChart")
            .field("points", &self.dataset.len())
            .field("indexed", &self.index.len())
            .field("axes", &self.axes)
            .field("canvas", &self.canvas)
            .field("view", &self.view)
            .field("polygons", &self.polygons.len())
            .finish_non_exhaustive()
    }
}

impl<S, Q> ScatterChart<S, Q>
where
    S: CanvasSurface + 'static,
    Q: FrameRequester + 'static,
{
    /// Builds the pipeline and schedules the first frame.
    ///
    /// Fails when either surface cannot provide a drawing context.
    pub fn new(
        config: ScatterChartConfig,
        dataset: impl Into<Arc<[DataPoint]>>,
        axes: AxisSelection,
        points_surface: S,
        overlay_surface: S,
        requester: Q,
    ) -> ScatterResult<Self> {
        config.validate()?;
        let dataset = dataset.into();
        let canvas = config.canvas;
        let dpr = config.device_pixel_ratio;

        let (coords, index, domain) = derive_data(&dataset, &axes);
        let view = ViewState::default();
        let transform = CoordinateTransform::for_view(domain, view, canvas)?;

        let layers = ChartLayers {
            points: CanvasLayer::new(
                LayerKind::Points,
                points_surface,
                canvas,
                dpr,
                config.dirty_margin_px,
            )?,
            overlay: CanvasLayer::new(
                LayerKind::PolygonOverlay,
                overlay_surface,
                canvas,
                dpr,
                config.dirty_margin_px,
            )?,
        };

        let mut chart = Self {
            config,
            dataset,
            axes,
            coords,
            index,
            domain,
            canvas,
            view,
            transform,
            layers,
            scheduler: RenderScheduler::new(requester),
            dpr: DprMonitor::new(dpr),
            resize: ResizeDebouncer::new(Duration::from_millis(config.resize_debounce_ms)),
            drawing: DrawingSession::new(config.auto_close_threshold_px),
            polygons: PolygonStore::new(),
            stats: IndexMap::new(),
            hovered_point: None,
        };
        chart.request_render();
        Ok(chart)
    }

    #[must_use]
    pub fn config(&self) -> &ScatterChartConfig {
        &self.config
    }

    #[must_use]
    pub fn dataset(&self) -> &Arc<[DataPoint]> {
        &self.dataset
    }

    #[must_use]
    pub fn axes(&self) -> &AxisSelection {
        &self.axes
    }

    #[must_use]
    pub fn domain(&self) -> DataDomain {
        self.domain
    }

    #[must_use]
    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    #[must_use]
    pub fn view(&self) -> ViewState {
        self.view
    }

    /// Transform for the current pan/zoom, used for culling and drawing.
    #[must_use]
    pub fn transform(&self) -> &CoordinateTransform {
        &self.transform
    }

    #[must_use]
    pub fn spatial_index(&self) -> &Arc<SpatialIndex> {
        &self.index
    }

    #[must_use]
    pub fn layers(&self) -> &ChartLayers<S> {
        &self.layers
    }

    #[must_use]
    pub fn scheduler(&self) -> &RenderScheduler<ChartLayers<S>, Q> {
        &self.scheduler
    }

    pub fn frame_requester_mut(&mut self) -> &mut Q {
        self.scheduler.requester_mut()
    }

    pub fn dpr_monitor_mut(&mut self) -> &mut DprMonitor {
        &mut self.dpr
    }

    #[must_use]
    pub fn drawing(&self) -> &DrawingSession {
        &self.drawing
    }

    #[must_use]
    pub fn polygons(&self) -> &PolygonStore {
        &self.polygons
    }

    #[must_use]
    pub fn hovered_point(&self) -> Option<usize> {
        self.hovered_point
    }

    // ---- dataset / axes ----------------------------------------------------

    /// Replaces the dataset and rebuilds domain, index and statistics.
    pub fn set_dataset(&mut self, dataset: impl Into<Arc<[DataPoint]>>) -> ScatterResult<()> {
        self.dataset = dataset.into();
        self.rebuild_data()
    }

    /// Switches the plotted columns. Unchanged selections are a no-op.
    pub fn set_axes(&mut self, axes: AxisSelection) -> ScatterResult<()> {
        if axes == self.axes {
            return Ok(());
        }
        self.axes = axes;
        self.rebuild_data()
    }

    fn rebuild_data(&mut self) -> ScatterResult<()> {
        let started = Instant::now();
        let (coords, index, domain) = derive_data(&self.dataset, &self.axes);
        let transform = CoordinateTransform::for_view(domain, self.view, self.canvas)?;
        debug!(
            points = self.dataset.len(),
            indexed = index.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "spatial index rebuilt"
        );

        self.coords = coords;
        self.index = index;
        self.domain = domain;
        self.transform = transform;
        self.hovered_point = None;
        self.recompute_stats();
        self.layers.points.invalidate_all();
        self.request_render();
        Ok(())
    }

    // ---- view ----------------------------------------------------------------

    pub fn pan_by(&mut self, dx_px: f64, dy_px: f64) -> ScatterResult<()> {
        let mut next = self.view;
        next.pan_by(dx_px, dy_px);
        self.apply_view(next)
    }

    pub fn zoom_at(&mut self, factor: f64, anchor: ScreenPoint) -> ScatterResult<()> {
        let mut next = self.view;
        next.zoom_at(factor, anchor, self.canvas);
        self.apply_view(next)
    }

    pub fn set_view(&mut self, view: ViewState) -> ScatterResult<()> {
        self.apply_view(view)
    }

    /// Returns to the fitted view and re-evaluates polygon membership.
    pub fn reset_view(&mut self) -> ScatterResult<()> {
        self.apply_view(ViewState::default())?;
        self.recompute_stats();
        self.request_render();
        Ok(())
    }

    fn apply_view(&mut self, view: ViewState) -> ScatterResult<()> {
        if view == self.view {
            return Ok(());
        }
        let transform = CoordinateTransform::for_view(self.domain, view, self.canvas)?;
        trace!(
            scale = view.scale,
            translate_x = view.translate_x,
            translate_y = view.translate_y,
            "view changed"
        );
        self.view = view;
        self.transform = transform;
        self.hovered_point = None;
        self.layers.points.invalidate_all();
        self.request_render();
        Ok(())
    }

    /// Indices of points inside the current viewport (rendering only).
    #[must_use]
    pub fn visible_indices(&self) -> Vec<usize> {
        self.index.query_viewport(self.transform.viewport())
    }

    // ---- resize / device pixel ratio ----------------------------------------

    /// Records a resize event; it takes effect in [`Self::poll_resize`] once the
    /// debounce window has passed without newer events.
    pub fn request_resize(&mut self, size: CanvasSize, now: Instant) {
        self.resize.push(size, now);
    }

    #[must_use]
    pub fn resize_deadline(&self) -> Option<Instant> {
        self.resize.deadline()
    }

    /// Applies a debounced resize if one is due. Returns whether it did.
    pub fn poll_resize(&mut self, now: Instant) -> ScatterResult<bool> {
        let Some(size) = self.resize.poll(now) else {
            return Ok(false);
        };
        self.apply_resize(size)?;
        Ok(true)
    }

    fn apply_resize(&mut self, size: CanvasSize) -> ScatterResult<()> {
        size.validate()?;
        if size == self.canvas {
            return Ok(());
        }
        let transform = CoordinateTransform::for_view(self.domain, self.view, size)?;
        debug!(width = size.width, height = size.height, "canvas resize committed");
        self.canvas = size;
        self.transform = transform;
        self.hovered_point = None;
        self.recompute_stats();
        let reconfigured = self.reconfigure_layers();
        self.request_render();
        reconfigured
    }

    /// Feeds the host's current device pixel ratio. Reconfigures and fully
    /// redraws both layers when it changed.
    pub fn set_device_pixel_ratio(&mut self, ratio: DevicePixelRatio) -> ScatterResult<bool> {
        if self.dpr.update(ratio).is_none() {
            return Ok(false);
        }
        let reconfigured = self.reconfigure_layers();
        self.request_render();
        reconfigured.map(|()| true)
    }

    /// Re-runs canvas setup on every layer, then clears immediately.
    ///
    /// A failing layer is left disabled; the other still reconfigures and the
    /// first error is returned.
    fn reconfigure_layers(&mut self) -> ScatterResult<()> {
        let dpr = self.dpr.current();
        let canvas = self.canvas;
        let mut first_error = None;
        for layer in [&mut self.layers.points, &mut self.layers.overlay] {
            if let Err(err) = layer.reconfigure(canvas, dpr) {
                warn!(layer = ?layer.kind(), error = %err, "layer reconfiguration failed");
                first_error.get_or_insert(err);
            }
        }
        self.scheduler.clear(&mut self.layers)?;
        self.layers.points.invalidate_all();
        self.layers.overlay.invalidate_all();
        first_error.map_or(Ok(()), Err)
    }

    // ---- polygon drawing -----------------------------------------------------

    pub fn start_drawing(&mut self) -> bool {
        self.drawing.start()
    }

    pub fn add_vertex(&mut self, point: ScreenPoint) -> PolygonEdit {
        let previous = self.drawing.vertices().last().copied();
        let preview = self.drawing.preview_segment();
        let outcome = self.drawing.add_vertex(point);
        let edit = match outcome {
            DrawingOutcome::Ignored => PolygonEdit::Ignored,
            DrawingOutcome::VertexAdded { vertex_count } => {
                let segment_end = previous.unwrap_or(point);
                self.invalidate_overlay(Some(ScreenRect::spanning(segment_end, point)));
                PolygonEdit::VertexAdded { vertex_count }
            }
            DrawingOutcome::Completed { vertices } => self.finish_polygon(vertices),
            DrawingOutcome::Rejected { vertex_count } => PolygonEdit::Rejected { vertex_count },
        };
        for (from, to) in [preview, self.drawing.preview_segment()].into_iter().flatten() {
            self.invalidate_overlay(Some(ScreenRect::spanning(from, to)));
        }
        if edit != PolygonEdit::Ignored {
            self.request_render();
        }
        edit
    }

    /// Explicit close of the in-progress polygon.
    pub fn complete_polygon(&mut self) -> PolygonEdit {
        match self.drawing.close() {
            DrawingOutcome::Completed { vertices } => {
                let edit = self.finish_polygon(vertices);
                self.request_render();
                edit
            }
            DrawingOutcome::Rejected { vertex_count } => PolygonEdit::Rejected { vertex_count },
            DrawingOutcome::Ignored | DrawingOutcome::VertexAdded { .. } => PolygonEdit::Ignored,
        }
    }

    pub fn cancel_drawing(&mut self) -> bool {
        let mut touched: Vec<ScreenPoint> = self.drawing.vertices().to_vec();
        touched.extend(self.drawing.pointer());
        if !self.drawing.cancel() {
            return false;
        }
        self.invalidate_overlay(polygon_bounds(&touched));
        self.request_render();
        true
    }

    fn finish_polygon(&mut self, vertices: Vec<ScreenPoint>) -> PolygonEdit {
        let stats = ProjectedDataset::project(&self.coords, &self.transform).stats(&vertices);
        let id = self
            .polygons
            .insert(vertices, self.config.polygon_style, self.view);
        self.stats.insert(id.clone(), stats);
        debug!(polygon = %id, count = stats.count, percentage = stats.percentage, "polygon membership computed");
        // Completion repaints the whole in-progress drawing plus the label.
        self.layers.overlay.invalidate_all();
        PolygonEdit::Completed { id, stats }
    }

    /// Pointer motion: drives the drawing preview or, when idle, hover state.
    pub fn pointer_move(&mut self, point: ScreenPoint) {
        if self.drawing.is_drawing() {
            let old_preview = self.drawing.preview_segment();
            let was_near = self.drawing.pointer_near_first();
            self.drawing.update_pointer(point);
            let new_preview = self.drawing.preview_segment();
            for (from, to) in [old_preview, new_preview].into_iter().flatten() {
                self.invalidate_overlay(Some(ScreenRect::spanning(from, to)));
            }
            if was_near != self.drawing.pointer_near_first() {
                if let Some(first) = self.drawing.vertices().first() {
                    self.invalidate_overlay(Some(ScreenRect::spanning(*first, *first)));
                }
            }
            self.request_render();
            return;
        }

        let mut changed = false;
        let hovered = hit_test(
            &self.index,
            &self.coords,
            &self.transform,
            point,
            self.config.hover_radius_px,
        );
        if hovered != self.hovered_point {
            for index in [self.hovered_point, hovered].into_iter().flatten() {
                self.invalidate_point(index);
            }
            self.hovered_point = hovered;
            changed = true;
        }

        let polygon = self.polygons.polygon_at(point).cloned();
        for id in self.polygons.set_hovered(polygon.as_ref()) {
            self.invalidate_polygon(&id);
            changed = true;
        }

        if changed {
            self.request_render();
        }
    }

    pub fn select_polygon(&mut self, id: Option<&PolygonId>) -> bool {
        let changed = self.polygons.select(id);
        for id in &changed {
            self.invalidate_polygon(id);
        }
        if !changed.is_empty() {
            self.request_render();
        }
        !changed.is_empty()
    }

    pub fn delete_polygon(&mut self, id: &PolygonId) -> bool {
        self.invalidate_polygon(id);
        if self.polygons.delete(id).is_none() {
            return false;
        }
        self.stats.shift_remove(id);
        self.request_render();
        true
    }

    #[must_use]
    pub fn polygon_stats(&self, id: &PolygonId) -> Option<PolygonStats> {
        self.stats.get(id).copied()
    }

    #[must_use]
    pub fn all_polygon_stats(&self) -> &IndexMap<PolygonId, PolygonStats> {
        &self.stats
    }

    /// Dataset indices selected by a polygon, over the full dataset, through
    /// the view the polygon was drawn under.
    #[must_use]
    pub fn polygon_members(&self, id: &PolygonId) -> Option<Vec<usize>> {
        let polygon = self.polygons.get(id)?;
        let transform = CoordinateTransform::for_view(self.domain, polygon.view, self.canvas).ok()?;
        Some(ProjectedDataset::project(&self.coords, &transform).members(&polygon.vertices))
    }

    /// Re-evaluates every polygon against the full dataset.
    ///
    /// Each polygon is tested through its own drawn view at the current
    /// domain and canvas size; polygons sharing a view share one projection.
    fn recompute_stats(&mut self) {
        let mut projections: Vec<(ViewState, ProjectedDataset)> = Vec::new();
        let mut stats = IndexMap::with_capacity(self.polygons.len());
        for polygon in self.polygons.iter() {
            let polygon_stats = match projection_for(
                &mut projections,
                &self.coords,
                self.domain,
                self.canvas,
                polygon.view,
            ) {
                Ok(projected) => projected.stats(&polygon.vertices),
                Err(err) => {
                    warn!(polygon = %polygon.id, error = %err, "drawn view unusable, polygon selects nothing");
                    PolygonStats::from_count(0, self.coords.len())
                }
            };
            stats.insert(polygon.id.clone(), polygon_stats);
        }
        self.stats = stats;
        debug!(
            polygons = self.stats.len(),
            projections = projections.len(),
            points = self.coords.len(),
            "polygon membership recomputed"
        );
        if !self.stats.is_empty() {
            self.layers.overlay.invalidate_all();
        }
    }

    // ---- persistence ---------------------------------------------------------

    pub fn export_polygons_json(&self) -> ScatterResult<String> {
        PolygonSetJsonContractV1::from_store(&self.polygons).to_json_pretty()
    }

    /// Loads persisted polygons, re-validating each one. Returns how many were kept.
    pub fn import_polygons_json(&mut self, input: &str) -> ScatterResult<usize> {
        let records = PolygonSetJsonContractV1::from_json_compat_str(input)?.into_valid_records();
        let imported = records.len();
        for record in records {
            self.polygons
                .insert_preferring_id(record.id, record.vertices, record.style, record.view);
        }
        self.recompute_stats();
        self.layers.overlay.invalidate_all();
        self.request_render();
        Ok(imported)
    }

    // ---- frames ----------------------------------------------------------------

    /// Host callback for a fired animation frame.
    pub fn on_animation_frame(&mut self, handle: FrameHandle) -> ScatterResult<bool> {
        self.scheduler.on_animation_frame(handle, &mut self.layers)
    }

    /// Cancels pending frames and releases both contexts.
    pub fn teardown(&mut self) {
        self.scheduler.teardown();
        self.layers.points.dispose();
        self.layers.overlay.dispose();
        debug!("scatter chart torn down");
    }

    fn request_render(&mut self) {
        let scene = self.snapshot_scene();
        self.scheduler
            .render(move |layers: &mut ChartLayers<S>| draw_frame(layers, &scene));
    }

    fn snapshot_scene(&self) -> FrameScene {
        FrameScene {
            points: PointsScene {
                coords: Arc::clone(&self.coords),
                index: Arc::clone(&self.index),
                transform: self.transform,
                radius_px: self.config.point_radius_px,
                color: self.config.point_color,
                hovered: self.hovered_point,
                hover_color: self.config.hover_color,
            },
            overlay: OverlayScene {
                polygons: self
                    .polygons
                    .iter()
                    .map(|polygon| (polygon.clone(), self.stats.get(&polygon.id).copied()))
                    .collect(),
                in_progress: self.drawing.vertices().to_vec(),
                preview: self.drawing.preview_segment(),
                close_hint: self.drawing.pointer_near_first(),
                drawing_style: self.config.polygon_style,
                label_color: self.config.label_color,
                label_font_size_px: self.config.label_font_size_px,
            },
        }
    }

    // ---- invalidation helpers ----------------------------------------------

    fn invalidate_overlay(&mut self, rect: Option<ScreenRect>) {
        let pad = self.config.polygon_style.stroke_width * 2.0 + 6.0;
        if let Some(rect) = rect {
            self.layers.overlay.invalidate(rect.expanded(pad));
        }
    }

    fn invalidate_point(&mut self, index: usize) {
        let Some(coord) = self.coords.get(index).copied().flatten() else {
            return;
        };
        let center = self.transform.to_screen(coord);
        let radius = self.config.point_radius_px * 2.0;
        self.layers
            .points
            .invalidate(ScreenRect::spanning(center, center).expanded(radius));
    }

    fn invalidate_polygon(&mut self, id: &PolygonId) {
        let Some(polygon) = self.polygons.get(id) else {
            return;
        };
        let mut area = polygon.paint_bounds();
        if let (Some(stats), Some(anchor)) =
            (self.stats.get(id), polygon_centroid(&polygon.vertices))
        {
            let label = label_bounds(
                anchor,
                &format_stats_label(*stats),
                self.config.label_font_size_px,
            );
            area = Some(area.map_or(label, |bounds| bounds.union(label)));
        }
        if let Some(area) = area {
            self.layers.overlay.invalidate(area);
        }
    }
}

/// Projection of `coords` through `view`, computed at most once per distinct view.
fn projection_for<'a>(
    cache: &'a mut Vec<(ViewState, ProjectedDataset)>,
    coords: &[Option<DataCoord>],
    domain: DataDomain,
    canvas: CanvasSize,
    view: ViewState,
) -> ScatterResult<&'a ProjectedDataset> {
    let slot = match cache.iter().position(|(cached, _)| *cached == view) {
        Some(slot) => slot,
        None => {
            let transform = CoordinateTransform::for_view(domain, view, canvas)?;
            cache.push((view, ProjectedDataset::project(coords, &transform)));
            cache.len() - 1
        }
    };
    Ok(&cache[slot].1)
}

fn derive_data(
    dataset: &[DataPoint],
    axes: &AxisSelection,
) -> (Arc<[Option<DataCoord>]>, Arc<SpatialIndex>, DataDomain) {
    let coords: Arc<[Option<DataCoord>]> = dataset.iter().map(|point| axes.coordinate(point)).collect();
    let index = SpatialIndex::build(&coords, |coord| *coord);
    let domain = DataDomain::from_coords(coords.iter().flatten());
    (coords, Arc::new(index), domain)
}
