use cairo::{Context, Format, ImageSurface, Operator};
use pango::FontDescription;
use std::f64::consts::TAU;

use crate::core::types::{CanvasSize, ScreenPoint};
use crate::error::{ScatterError, ScatterResult};
use crate::render::{CanvasSurface, Color, DrawContext, ScreenRect};

/// Offscreen Cairo image surface used as a layer backing buffer.
///
/// GTK hosts paint these surfaces onto the widget context scaled by
/// `1 / device_pixel_ratio`.
#[derive(Debug)]
pub struct CairoSurface {
    surface: Option<ImageSurface>,
    backing: (u32, u32),
    css: CanvasSize,
}

impl Default for CairoSurface {
    fn default() -> Self {
        Self {
            surface: None,
            backing: (0, 0),
            css: CanvasSize::new(0.0, 0.0),
        }
    }
}

impl CairoSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        "cairo+pango+pangocairo"
    }

    #[must_use]
    pub fn image_surface(&self) -> Option<&ImageSurface> {
        self.surface.as_ref()
    }
}

impl CanvasSurface for CairoSurface {
    type Context = Context;

    fn configure(
        &mut self,
        backing_width: u32,
        backing_height: u32,
        css_size: CanvasSize,
    ) -> ScatterResult<()> {
        let width = i32::try_from(backing_width)
            .map_err(|_| ScatterError::Backend("backing width exceeds i32".to_owned()))?;
        let height = i32::try_from(backing_height)
            .map_err(|_| ScatterError::Backend("backing height exceeds i32".to_owned()))?;
        let surface = ImageSurface::create(Format::ARgb32, width, height)
            .map_err(|err| map_backend_error("failed to create cairo surface", err))?;
        self.surface = Some(surface);
        self.backing = (backing_width, backing_height);
        self.css = css_size;
        Ok(())
    }

    fn backing_size(&self) -> (u32, u32) {
        self.backing
    }

    fn css_size(&self) -> CanvasSize {
        self.css
    }

    fn acquire_context(&mut self) -> ScatterResult<Self::Context> {
        let surface = self
            .surface
            .as_ref()
            .ok_or_else(|| ScatterError::Backend("surface is not configured".to_owned()))?;
        Context::new(surface).map_err(|err| map_backend_error("failed to create cairo context", err))
    }
}

impl DrawContext for Context {
    fn save(&mut self) -> ScatterResult<()> {
        Context::save(self).map_err(|err| map_backend_error("failed to save state", err))
    }

    fn restore(&mut self) -> ScatterResult<()> {
        Context::restore(self).map_err(|err| map_backend_error("failed to restore state", err))
    }

    fn set_scale(&mut self, scale: f64) -> ScatterResult<()> {
        self.identity_matrix();
        self.scale(scale, scale);
        Ok(())
    }

    fn clip_rect(&mut self, rect: ScreenRect) -> ScatterResult<()> {
        self.rectangle(rect.x, rect.y, rect.width, rect.height);
        self.clip();
        Ok(())
    }

    fn clear_rect(&mut self, rect: ScreenRect) -> ScatterResult<()> {
        Context::save(self).map_err(|err| map_backend_error("failed to save state", err))?;
        self.set_operator(Operator::Clear);
        self.rectangle(rect.x, rect.y, rect.width, rect.height);
        let filled = self
            .fill()
            .map_err(|err| map_backend_error("failed to clear rectangle", err));
        let restored = Context::restore(self)
            .map_err(|err| map_backend_error("failed to restore state", err));
        filled.and(restored)
    }

    fn fill_circle(
        &mut self,
        center: ScreenPoint,
        radius: f64,
        color: Color,
    ) -> ScatterResult<()> {
        apply_color(self, color);
        self.new_path();
        self.arc(center.x.get(), center.y.get(), radius, 0.0, TAU);
        self.fill()
            .map_err(|err| map_backend_error("failed to fill point", err))
    }

    fn stroke_path(
        &mut self,
        points: &[ScreenPoint],
        closed: bool,
        stroke_width: f64,
        color: Color,
    ) -> ScatterResult<()> {
        if !append_path(self, points, closed) {
            return Ok(());
        }
        apply_color(self, color);
        self.set_line_width(stroke_width);
        self.stroke()
            .map_err(|err| map_backend_error("failed to stroke path", err))
    }

    fn fill_path(&mut self, points: &[ScreenPoint], color: Color) -> ScatterResult<()> {
        if !append_path(self, points, true) {
            return Ok(());
        }
        apply_color(self, color);
        self.fill()
            .map_err(|err| map_backend_error("failed to fill path", err))
    }

    fn fill_text(
        &mut self,
        text: &str,
        anchor: ScreenPoint,
        font_size_px: f64,
        color: Color,
    ) -> ScatterResult<()> {
        let layout = pangocairo::functions::create_layout(self);
        let font_description = FontDescription::from_string(&format!("Sans {font_size_px}"));
        layout.set_font_description(Some(&font_description));
        layout.set_text(text);

        let (text_width, text_height) = layout.pixel_size();
        apply_color(self, color);
        self.move_to(
            anchor.x.get() - f64::from(text_width) / 2.0,
            anchor.y.get() - f64::from(text_height) / 2.0,
        );
        pangocairo::functions::show_layout(self, &layout);
        Ok(())
    }
}

fn append_path(context: &Context, points: &[ScreenPoint], closed: bool) -> bool {
    let Some((first, rest)) = points.split_first() else {
        return false;
    };
    context.new_path();
    context.move_to(first.x.get(), first.y.get());
    for point in rest {
        context.line_to(point.x.get(), point.y.get());
    }
    if closed {
        context.close_path();
    }
    true
}

fn apply_color(context: &Context, color: Color) {
    context.set_source_rgba(color.red, color.green, color.blue, color.alpha);
}

fn map_backend_error(prefix: &str, err: cairo::Error) -> ScatterError {
    ScatterError::Backend(format!("{prefix}: {err}"))
}
