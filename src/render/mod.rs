mod dirty_rect;
mod dpr;
mod layer;
mod primitives;
mod recording;
mod scheduler;

pub use dirty_rect::{
    DEFAULT_DIRTY_MARGIN_PX, DirtyRectTracker, DirtyRegion, clear_region, expand_rect,
    merge_overlapping, render_with_clip,
};
pub use dpr::{DevicePixelRatio, DprListenerId, DprMonitor, setup_canvas};
pub use layer::{CanvasLayer, LayerKind};
pub use primitives::{Color, DirtyRect, ScreenRect};
pub use recording::{DrawCommand, RecordingContext, RecordingSurface};
pub use scheduler::{FrameHandle, FrameRequester, FrameTarget, ManualFrameClock, RenderScheduler};

use crate::core::types::{CanvasSize, ScreenPoint};
use crate::error::ScatterResult;

/// Drawing commands a backend context must support.
///
/// Coordinates are CSS pixels; the device-pixel-ratio scale installed by
/// [`setup_canvas`] maps them onto the backing buffer.
pub trait DrawContext {
    fn save(&mut self) -> ScatterResult<()>;

    fn restore(&mut self) -> ScatterResult<()>;

    /// Replaces the current transform with a uniform scale.
    fn set_scale(&mut self, scale: f64) -> ScatterResult<()>;

    /// Intersects the current clip with `rect` until the next `restore`.
    fn clip_rect(&mut self, rect: ScreenRect) -> ScatterResult<()>;

    fn clear_rect(&mut self, rect: ScreenRect) -> ScatterResult<()>;

    fn fill_circle(&mut self, center: ScreenPoint, radius: f64, color: Color)
    -> ScatterResult<()>;

    fn stroke_path(
        &mut self,
        points: &[ScreenPoint],
        closed: bool,
        stroke_width: f64,
        color: Color,
    ) -> ScatterResult<()>;

    fn fill_path(&mut self, points: &[ScreenPoint], color: Color) -> ScatterResult<()>;

    fn fill_text(
        &mut self,
        text: &str,
        anchor: ScreenPoint,
        font_size_px: f64,
        color: Color,
    ) -> ScatterResult<()>;
}

/// A drawable surface with a separately sized backing buffer.
pub trait CanvasSurface {
    type Context: DrawContext;

    /// Resizes the backing buffer and records the CSS display size.
    fn configure(
        &mut self,
        backing_width: u32,
        backing_height: u32,
        css_size: CanvasSize,
    ) -> ScatterResult<()>;

    fn backing_size(&self) -> (u32, u32);

    fn css_size(&self) -> CanvasSize;

    /// Creates a fresh context; previous draw state does not carry over.
    fn acquire_context(&mut self) -> ScatterResult<Self::Context>;
}

#[cfg(feature = "cairo-backend")]
mod cairo_backend;
#[cfg(feature = "cairo-backend")]
pub use cairo_backend::CairoSurface;
