use crate::core::types::{CanvasSize, ScreenPoint};
use crate::error::{ScatterError, ScatterResult};
use crate::render::{CanvasSurface, Color, DrawContext, ScreenRect};

/// One recorded draw call, in physical (backing-buffer) pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear {
        rect: ScreenRect,
    },
    Circle {
        center: (f64, f64),
        radius: f64,
        color: Color,
        clip: Option<ScreenRect>,
    },
    Path {
        points: Vec<(f64, f64)>,
        closed: bool,
        filled: bool,
        stroke_width: f64,
        color: Color,
        clip: Option<ScreenRect>,
    },
    Text {
        text: String,
        anchor: (f64, f64),
        font_size_px: f64,
        color: Color,
        clip: Option<ScreenRect>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ContextState {
    scale: f64,
    clip: Option<ScreenRect>,
}

/// Headless context used by tests and by hosts without a raster backend.
///
/// Every command is stored already mapped into physical pixels, with the
/// active clip, so assertions can check exactly what would touch the buffer.
/// Shapes lying entirely outside the clip are dropped.
#[derive(Debug)]
pub struct RecordingContext {
    backing: (u32, u32),
    state: ContextState,
    saved: Vec<ContextState>,
    commands: Vec<DrawCommand>,
}

impl RecordingContext {
    #[must_use]
    pub fn new(backing_width: u32, backing_height: u32) -> Self {
        Self {
            backing: (backing_width, backing_height),
            state: ContextState {
                scale: 1.0,
                clip: None,
            },
            saved: Vec::new(),
            commands: Vec::new(),
        }
    }

    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.state.scale
    }

    #[must_use]
    pub fn save_depth(&self) -> usize {
        self.saved.len()
    }

    #[must_use]
    pub fn backing_size(&self) -> (u32, u32) {
        self.backing
    }

    fn map_point(&self, point: ScreenPoint) -> (f64, f64) {
        (
            point.x.get() * self.state.scale,
            point.y.get() * self.state.scale,
        )
    }

    fn map_rect(&self, rect: ScreenRect) -> ScreenRect {
        let scale = self.state.scale;
        ScreenRect::new(
            rect.x * scale,
            rect.y * scale,
            rect.width * scale,
            rect.height * scale,
        )
    }

    fn visible(&self, bounds: ScreenRect) -> bool {
        self.state.clip.is_none_or(|clip| clip.touches(bounds))
    }
}

fn bounds_of(points: &[(f64, f64)]) -> Option<ScreenRect> {
    let (first, rest) = points.split_first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.0, first.1, first.0, first.1);
    for &(x, y) in rest {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    Some(ScreenRect::new(min_x, min_y, max_x - min_x, max_y - min_y))
}

impl DrawContext for RecordingContext {
    fn save(&mut self) -> ScatterResult<()> {
        self.saved.push(self.state);
        Ok(())
    }

    fn restore(&mut self) -> ScatterResult<()> {
        self.state = self.saved.pop().ok_or_else(|| {
            ScatterError::Backend("restore called without matching save".to_owned())
        })?;
        Ok(())
    }

    fn set_scale(&mut self, scale: f64) -> ScatterResult<()> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ScatterError::InvalidData(
                "context scale must be finite and > 0".to_owned(),
            ));
        }
        self.state.scale = scale;
        Ok(())
    }

    fn clip_rect(&mut self, rect: ScreenRect) -> ScatterResult<()> {
        let physical = self.map_rect(rect);
        self.state.clip = Some(match self.state.clip {
            None => physical,
            Some(current) => current
                .intersection(physical)
                .unwrap_or(ScreenRect::new(physical.x, physical.y, 0.0, 0.0)),
        });
        Ok(())
    }

    fn clear_rect(&mut self, rect: ScreenRect) -> ScatterResult<()> {
        let physical = self.map_rect(rect);
        let clipped = match self.state.clip {
            None => Some(physical),
            Some(clip) => clip.intersection(physical),
        };
        if let Some(rect) = clipped {
            self.commands.push(DrawCommand::Clear { rect });
        }
        Ok(())
    }

    fn fill_circle(
        &mut self,
        center: ScreenPoint,
        radius: f64,
        color: Color,
    ) -> ScatterResult<()> {
        let (cx, cy) = self.map_point(center);
        let radius = radius * self.state.scale;
        let bounds = ScreenRect::new(cx - radius, cy - radius, radius * 2.0, radius * 2.0);
        if self.visible(bounds) {
            self.commands.push(DrawCommand::Circle {
                center: (cx, cy),
                radius,
                color,
                clip: self.state.clip,
            });
        }
        Ok(())
    }

    fn stroke_path(
        &mut self,
        points: &[ScreenPoint],
        closed: bool,
        stroke_width: f64,
        color: Color,
    ) -> ScatterResult<()> {
        let mapped: Vec<(f64, f64)> = points.iter().map(|p| self.map_point(*p)).collect();
        let stroke_width = stroke_width * self.state.scale;
        let Some(bounds) = bounds_of(&mapped) else {
            return Ok(());
        };
        if self.visible(bounds.expanded(stroke_width * 0.5)) {
            self.commands.push(DrawCommand::Path {
                points: mapped,
                closed,
                filled: false,
                stroke_width,
                color,
                clip: self.state.clip,
            });
        }
        Ok(())
    }

    fn fill_path(&mut self, points: &[ScreenPoint], color: Color) -> ScatterResult<()> {
        let mapped: Vec<(f64, f64)> = points.iter().map(|p| self.map_point(*p)).collect();
        let Some(bounds) = bounds_of(&mapped) else {
            return Ok(());
        };
        if self.visible(bounds) {
            self.commands.push(DrawCommand::Path {
                points: mapped,
                closed: true,
                filled: true,
                stroke_width: 0.0,
                color,
                clip: self.state.clip,
            });
        }
        Ok(())
    }

    fn fill_text(
        &mut self,
        text: &str,
        anchor: ScreenPoint,
        font_size_px: f64,
        color: Color,
    ) -> ScatterResult<()> {
        let anchor = self.map_point(anchor);
        self.commands.push(DrawCommand::Text {
            text: text.to_owned(),
            anchor,
            font_size_px: font_size_px * self.state.scale,
            color,
            clip: self.state.clip,
        });
        Ok(())
    }
}

/// In-memory surface handing out [`RecordingContext`]s.
#[derive(Debug)]
pub struct RecordingSurface {
    backing: (u32, u32),
    css: CanvasSize,
    unavailable: Option<String>,
    contexts_created: usize,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self {
            backing: (0, 0),
            css: CanvasSize::new(0.0, 0.0),
            unavailable: None,
            contexts_created: 0,
        }
    }
}

impl RecordingSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface whose context can never be acquired.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            unavailable: Some(reason.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn contexts_created(&self) -> usize {
        self.contexts_created
    }
}

impl CanvasSurface for RecordingSurface {
    type Context = RecordingContext;

    fn configure(
        &mut self,
        backing_width: u32,
        backing_height: u32,
        css_size: CanvasSize,
    ) -> ScatterResult<()> {
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
        if let Some(reason) = &self.unavailable {
            return Err(ScatterError::Backend(reason.clone()));
        }
        self.contexts_created += 1;
        Ok(RecordingContext::new(self.backing.0, self.backing.1))
    }
}
