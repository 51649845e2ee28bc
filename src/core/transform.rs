use serde::{Deserialize, Serialize};

use crate::core::types::{
    CanvasSize, DataCoord, DataDomain, DataX, DataY, ScreenPoint, ScreenX, ScreenY, Viewport,
};
use crate::error::{ScatterError, ScatterResult};
use crate::render::ScreenRect;

pub const MIN_VIEW_SCALE: f64 = 0.01;
pub const MAX_VIEW_SCALE: f64 = 1_000.0;

/// Pan/zoom parameters owned by the interaction layer.
///
/// `translate_*` are pixel offsets: positive `translate_x` moves content to
/// the right, positive `translate_y` moves content down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
        }
    }
}

impl ViewState {
    #[must_use]
    pub fn is_identity(self) -> bool {
        self == Self::default()
    }

    /// Finite offsets and a scale inside the zoom clamp.
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.translate_x.is_finite()
            && self.translate_y.is_finite()
            && (MIN_VIEW_SCALE..=MAX_VIEW_SCALE).contains(&self.scale)
    }

    pub fn pan_by(&mut self, dx_px: f64, dy_px: f64) {
        if dx_px.is_finite() && dy_px.is_finite() {
            self.translate_x += dx_px;
            self.translate_y += dy_px;
        }
    }

    /// Multiplies the zoom by `factor` while keeping the data coordinate under
    /// `anchor` at the same screen position.
    pub fn zoom_at(&mut self, factor: f64, anchor: ScreenPoint, canvas: CanvasSize) {
        if !factor.is_finite() || factor <= 0.0 || !anchor.is_finite() || !canvas.is_valid() {
            return;
        }
        let next_scale = (self.scale * factor).clamp(MIN_VIEW_SCALE, MAX_VIEW_SCALE);
        let applied = next_scale / self.scale;

        // Screen position of a data coordinate is linear in scale around the
        // canvas center shifted by the translation.
        let center_x = canvas.width * 0.5 + self.translate_x;
        let center_y = canvas.height * 0.5 + self.translate_y;
        let anchor_x = anchor.x.get();
        let anchor_y = anchor.y.get();
        self.translate_x += (anchor_x - center_x) * (1.0 - applied);
        self.translate_y += (anchor_y - center_y) * (1.0 - applied);
        self.scale = next_scale;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Derives the visible data rectangle for `domain` under the given zoom/pan.
///
/// The visible span is `domain_size / scale`; pixel pan offsets are converted
/// into data units with the post-zoom pixel size.
pub fn calculate_viewport_bounds(
    domain: DataDomain,
    scale: f64,
    translate_x: f64,
    translate_y: f64,
    canvas: CanvasSize,
) -> ScatterResult<Viewport> {
    canvas.validate()?;
    if !scale.is_finite() || scale <= 0.0 {
        return Err(ScatterError::InvalidViewport(format!(
            "zoom scale must be finite and > 0 (got {scale})"
        )));
    }
    if !translate_x.is_finite() || !translate_y.is_finite() {
        return Err(ScatterError::InvalidViewport(
            "pan offsets must be finite".to_owned(),
        ));
    }

    // `from_coords` already pads, but callers may hand in a raw domain.
    let domain = normalize_domain(domain);
    let width = domain.width() / scale;
    let height = domain.height() / scale;
    let pan_x = translate_x / canvas.width * width;
    let pan_y = translate_y / canvas.height * height;
    let center = domain.center();

    let min_x = center.x.get() - width * 0.5 - pan_x;
    let min_y = center.y.get() - height * 0.5 + pan_y;
    let viewport = Viewport {
        min_x,
        max_x: min_x + width,
        min_y,
        max_y: min_y + height,
        scale,
        translate_x,
        translate_y,
    };
    viewport.validate()?;
    Ok(viewport)
}

fn normalize_domain(domain: DataDomain) -> DataDomain {
    let mut normalized = domain;
    if !(normalized.width() > 0.0) {
        normalized.min_x -= 1.0;
        normalized.max_x += 1.0;
    }
    if !(normalized.height() > 0.0) {
        normalized.min_y -= 1.0;
        normalized.max_y += 1.0;
    }
    normalized
}

/// Bidirectional data <-> screen mapping for one viewport and canvas size.
///
/// Screen Y grows downward while data Y grows upward, so the vertical axis is
/// inverted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransform {
    viewport: Viewport,
    canvas: CanvasSize,
    px_per_unit_x: f64,
    px_per_unit_y: f64,
}

impl CoordinateTransform {
    pub fn new(viewport: Viewport, canvas: CanvasSize) -> ScatterResult<Self> {
        viewport.validate()?;
        canvas.validate()?;
        Ok(Self {
            viewport,
            canvas,
            px_per_unit_x: canvas.width / (viewport.max_x - viewport.min_x),
            px_per_unit_y: canvas.height / (viewport.max_y - viewport.min_y),
        })
    }

    /// Builds the transform for `domain` under `view` in one step.
    pub fn for_view(domain: DataDomain, view: ViewState, canvas: CanvasSize) -> ScatterResult<Self> {
        let viewport = calculate_viewport_bounds(
            domain,
            view.scale,
            view.translate_x,
            view.translate_y,
            canvas,
        )?;
        Self::new(viewport, canvas)
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    #[must_use]
    pub fn x_to_screen(&self, x: DataX) -> ScreenX {
        ScreenX::new((x.get() - self.viewport.min_x) * self.px_per_unit_x)
    }

    #[must_use]
    pub fn y_to_screen(&self, y: DataY) -> ScreenY {
        ScreenY::new((self.viewport.max_y - y.get()) * self.px_per_unit_y)
    }

    #[must_use]
    pub fn x_to_data(&self, x: ScreenX) -> DataX {
        DataX::new(self.viewport.min_x + x.get() / self.px_per_unit_x)
    }

    #[must_use]
    pub fn y_to_data(&self, y: ScreenY) -> DataY {
        DataY::new(self.viewport.max_y - y.get() / self.px_per_unit_y)
    }

    #[must_use]
    pub fn to_screen(&self, coord: DataCoord) -> ScreenPoint {
        ScreenPoint {
            x: self.x_to_screen(coord.x),
            y: self.y_to_screen(coord.y),
        }
    }

    #[must_use]
    pub fn to_data(&self, point: ScreenPoint) -> DataCoord {
        DataCoord {
            x: self.x_to_data(point.x),
            y: self.y_to_data(point.y),
        }
    }

    /// Data-space bounds `(min_x, min_y, max_x, max_y)` covered by a screen rectangle.
    #[must_use]
    pub fn screen_rect_to_data(&self, rect: ScreenRect) -> (f64, f64, f64, f64) {
        let top_left = self.to_data(ScreenPoint::new(rect.x, rect.y));
        let bottom_right = self.to_data(ScreenPoint::new(rect.right(), rect.bottom()));
        (
            top_left.x.get(),
            bottom_right.y.get(),
            bottom_right.x.get(),
            top_left.y.get(),
        )
    }

    /// Size of one CSS pixel in data units along each axis.
    #[must_use]
    pub fn data_units_per_pixel(&self) -> (f64, f64) {
        (1.0 / self.px_per_unit_x, 1.0 / self.px_per_unit_y)
    }
}
