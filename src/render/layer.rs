use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::types::CanvasSize;
use crate::error::{ScatterError, ScatterResult};
use crate::render::{
    CanvasSurface, DevicePixelRatio, DirtyRectTracker, DirtyRegion, ScreenRect, setup_canvas,
};

/// Rendering concern a layer is dedicated to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerKind {
    Points,
    PolygonOverlay,
}

impl LayerKind {
    /// Canonical stacking order, bottom first.
    #[must_use]
    pub const fn default_z_index(self) -> i32 {
        match self {
            Self::Points => 0,
            Self::PolygonOverlay => 10,
        }
    }
}

/// One surface plus its exclusively owned context and dirty bookkeeping.
///
/// A layer whose context could not be acquired stays disabled: drawing
/// through it reports [`ScatterError::LayerDisabled`] until a later
/// reconfiguration succeeds.
#[derive(Debug)]
pub struct CanvasLayer<S: CanvasSurface> {
    kind: LayerKind,
    z_index: i32,
    clear_on_render: bool,
    surface: S,
    context: Option<S::Context>,
    device_pixel_ratio: DevicePixelRatio,
    css_size: CanvasSize,
    dirty: DirtyRectTracker,
    disposed: bool,
}

impl<S: CanvasSurface> CanvasLayer<S> {
    pub fn new(
        kind: LayerKind,
        mut surface: S,
        css_size: CanvasSize,
        device_pixel_ratio: DevicePixelRatio,
        dirty_margin: f64,
    ) -> ScatterResult<Self> {
        let context = setup_canvas(&mut surface, css_size, device_pixel_ratio)
            .map_err(|err| context_error(kind, err))?;
        let mut dirty = DirtyRectTracker::new(dirty_margin);
        dirty.invalidate_all();
        Ok(Self {
            kind,
            z_index: kind.default_z_index(),
            clear_on_render: true,
            surface,
            context: Some(context),
            device_pixel_ratio,
            css_size,
            dirty,
            disposed: false,
        })
    }

    #[must_use]
    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    #[must_use]
    pub fn with_clear_on_render(mut self, clear_on_render: bool) -> Self {
        self.clear_on_render = clear_on_render;
        self
    }

    #[must_use]
    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    #[must_use]
    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    #[must_use]
    pub fn clear_on_render(&self) -> bool {
        self.clear_on_render
    }

    #[must_use]
    pub fn device_pixel_ratio(&self) -> DevicePixelRatio {
        self.device_pixel_ratio
    }

    #[must_use]
    pub fn css_size(&self) -> CanvasSize {
        self.css_size
    }

    /// Whole drawable area in CSS pixels.
    #[must_use]
    pub fn bounds(&self) -> ScreenRect {
        ScreenRect::new(0.0, 0.0, self.css_size.width, self.css_size.height)
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.disposed && self.context.is_some()
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    #[must_use]
    pub fn context(&self) -> Option<&S::Context> {
        self.context.as_ref()
    }

    pub fn context_mut(&mut self) -> ScatterResult<&mut S::Context> {
        if self.disposed {
            return Err(ScatterError::LayerDisabled { layer: self.kind });
        }
        self.context
            .as_mut()
            .ok_or(ScatterError::LayerDisabled { layer: self.kind })
    }

    #[must_use]
    pub fn dirty(&self) -> &DirtyRectTracker {
        &self.dirty
    }

    pub fn invalidate(&mut self, rect: ScreenRect) {
        self.dirty.invalidate(rect);
    }

    pub fn invalidate_all(&mut self) {
        self.dirty.invalidate_all();
    }

    /// Consumes the pending dirty region for this pass.
    pub fn take_dirty_region(&mut self) -> DirtyRegion {
        let bounds = self.bounds();
        self.dirty.take_region(bounds)
    }

    /// Re-runs canvas setup for a new size or ratio.
    ///
    /// The old context is dropped in every case; on failure the layer is
    /// disabled and the error is returned.
    pub fn reconfigure(
        &mut self,
        css_size: CanvasSize,
        device_pixel_ratio: DevicePixelRatio,
    ) -> ScatterResult<()> {
        if self.disposed {
            return Err(ScatterError::LayerDisabled { layer: self.kind });
        }
        self.context = None;
        self.dirty.reset();
        let context = setup_canvas(&mut self.surface, css_size, device_pixel_ratio).map_err(
            |err| {
                warn!(layer = ?self.kind, error = %err, "layer disabled after reconfigure failure");
                context_error(self.kind, err)
            },
        )?;
        self.context = Some(context);
        self.css_size = css_size;
        self.device_pixel_ratio = device_pixel_ratio;
        self.dirty.invalidate_all();
        debug!(layer = ?self.kind, dpr = device_pixel_ratio.get(), "layer reconfigured");
        Ok(())
    }

    /// Immediate whole-surface clear that also discards dirty bookkeeping.
    pub fn clear(&mut self) -> ScatterResult<()> {
        let bounds = self.bounds();
        self.dirty.reset();
        let context = self.context_mut()?;
        crate::render::DrawContext::clear_rect(context, bounds)
    }

    pub fn dispose(&mut self) {
        self.disposed = true;
        self.context = None;
        self.dirty.reset();
    }
}

fn context_error(layer: LayerKind, err: ScatterError) -> ScatterError {
    match err {
        ScatterError::InvalidCanvasSize { .. } => err,
        other => ScatterError::ContextAcquisition {
            layer,
            reason: other.to_string(),
        },
    }
}
