use serde::{Deserialize, Serialize};

use crate::core::AUTO_CLOSE_THRESHOLD_PX;
use crate::core::types::CanvasSize;
use crate::error::{ScatterError, ScatterResult};
use crate::interaction::PolygonStyle;
use crate::render::{Color, DEFAULT_DIRTY_MARGIN_PX, DevicePixelRatio};

/// Public chart bootstrap configuration.
///
/// This type is serializable so host applications can persist/load chart setup
/// without inventing their own ad-hoc format. Missing fields take defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScatterChartConfig {
    pub canvas: CanvasSize,
    #[serde(default)]
    pub device_pixel_ratio: DevicePixelRatio,
    #[serde(default = "default_point_radius_px")]
    pub point_radius_px: f64,
    #[serde(default = "default_point_color")]
    pub point_color: Color,
    #[serde(default = "default_hover_color")]
    pub hover_color: Color,
    #[serde(default = "default_label_color")]
    pub label_color: Color,
    #[serde(default = "default_label_font_size_px")]
    pub label_font_size_px: f64,
    #[serde(default = "default_dirty_margin_px")]
    pub dirty_margin_px: f64,
    #[serde(default = "default_auto_close_threshold_px")]
    pub auto_close_threshold_px: f64,
    #[serde(default = "default_hover_radius_px")]
    pub hover_radius_px: f64,
    #[serde(default = "default_resize_debounce_ms")]
    pub resize_debounce_ms: u64,
    #[serde(default)]
    pub polygon_style: PolygonStyle,
}

impl ScatterChartConfig {
    #[must_use]
    pub fn new(canvas: CanvasSize) -> Self {
        Self {
            canvas,
            device_pixel_ratio: DevicePixelRatio::default(),
            point_radius_px: default_point_radius_px(),
            point_color: default_point_color(),
            hover_color: default_hover_color(),
            label_color: default_label_color(),
            label_font_size_px: default_label_font_size_px(),
            dirty_margin_px: default_dirty_margin_px(),
            auto_close_threshold_px: default_auto_close_threshold_px(),
            hover_radius_px: default_hover_radius_px(),
            resize_debounce_ms: default_resize_debounce_ms(),
            polygon_style: PolygonStyle::default(),
        }
    }

    #[must_use]
    pub fn with_device_pixel_ratio(mut self, ratio: DevicePixelRatio) -> Self {
        self.device_pixel_ratio = ratio;
        self
    }

    #[must_use]
    pub fn with_point_radius_px(mut self, radius: f64) -> Self {
        self.point_radius_px = radius;
        self
    }

    #[must_use]
    pub fn with_hover_radius_px(mut self, radius: f64) -> Self {
        self.hover_radius_px = radius;
        self
    }

    pub fn validate(&self) -> ScatterResult<()> {
        self.canvas.validate()?;
        for (name, value) in [
            ("point_radius_px", self.point_radius_px),
            ("label_font_size_px", self.label_font_size_px),
            ("auto_close_threshold_px", self.auto_close_threshold_px),
            ("polygon_style.stroke_width", self.polygon_style.stroke_width),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ScatterError::InvalidData(format!(
                    "`{name}` must be finite and > 0"
                )));
            }
        }
        for (name, value) in [
            ("dirty_margin_px", self.dirty_margin_px),
            ("hover_radius_px", self.hover_radius_px),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ScatterError::InvalidData(format!(
                    "`{name}` must be finite and >= 0"
                )));
            }
        }
        for color in [
            self.point_color,
            self.hover_color,
            self.label_color,
            self.polygon_style.stroke_color,
            self.polygon_style.fill_color,
        ] {
            color.validate()?;
        }
        Ok(())
    }

    pub fn to_json_pretty(&self) -> ScatterResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ScatterError::Serialization(format!("failed to serialize config: {e}")))
    }

    pub fn from_json_str(input: &str) -> ScatterResult<Self> {
        let config: Self = serde_json::from_str(input)
            .map_err(|e| ScatterError::Serialization(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}

fn default_point_radius_px() -> f64 {
    2.5
}

fn default_point_color() -> Color {
    Color::rgba(0.2, 0.2, 0.25, 0.8)
}

fn default_hover_color() -> Color {
    Color::rgb(0.95, 0.45, 0.1)
}

fn default_label_color() -> Color {
    Color::rgb(0.1, 0.1, 0.1)
}

fn default_label_font_size_px() -> f64 {
    12.0
}

fn default_dirty_margin_px() -> f64 {
    DEFAULT_DIRTY_MARGIN_PX
}

fn default_auto_close_threshold_px() -> f64 {
    AUTO_CLOSE_THRESHOLD_PX
}

fn default_hover_radius_px() -> f64 {
    6.0
}

fn default_resize_debounce_ms() -> u64 {
    150
}
