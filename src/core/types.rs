use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ScatterError, ScatterResult};

macro_rules! coordinate_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(f64);

        impl $name {
            #[must_use]
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            #[must_use]
            pub const fn get(self) -> f64 {
                self.0
            }

            #[must_use]
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }
        }
    };
}

coordinate_newtype!(
    /// Horizontal coordinate in data space.
    DataX
);
coordinate_newtype!(
    /// Vertical coordinate in data space (grows upward).
    DataY
);
coordinate_newtype!(
    /// Horizontal coordinate in CSS pixels.
    ScreenX
);
coordinate_newtype!(
    /// Vertical coordinate in CSS pixels (grows downward).
    ScreenY
);

/// One sample as delivered by the data loader.
///
/// `x`/`y` are the default plotted pair; every other numeric column lives in
/// `attributes` and can be selected through [`AxisSelection`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub attributes: IndexMap<String, f64>,
}

impl DataPoint {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            attributes: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: f64) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<f64> {
        self.attributes.get(name).copied()
    }
}

/// Data-space coordinate pair read from a point through an axis selection.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DataCoord {
    pub x: DataX,
    pub y: DataY,
}

impl DataCoord {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self {
            x: DataX::new(x),
            y: DataY::new(y),
        }
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Position in device-independent (CSS) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: ScreenX,
    pub y: ScreenY,
}

impl ScreenPoint {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self {
            x: ScreenX::new(x),
            y: ScreenY::new(y),
        }
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        let dx = self.x.get() - other.x.get();
        let dy = self.y.get() - other.y.get();
        dx.hypot(dy)
    }
}

/// Canvas display size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl CanvasSize {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn validate(self) -> ScatterResult<()> {
        if !self.is_valid() {
            return Err(ScatterError::InvalidCanvasSize {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Which column feeds one plotted axis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisField {
    X,
    Y,
    Attribute(String),
}

impl AxisField {
    #[must_use]
    pub fn read(&self, point: &DataPoint) -> Option<f64> {
        let value = match self {
            Self::X => point.x,
            Self::Y => point.y,
            Self::Attribute(name) => point.attribute(name)?,
        };
        value.is_finite().then_some(value)
    }
}

/// Accessor mapping a [`DataPoint`] to the coordinate pair currently plotted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AxisSelection {
    pub x: AxisField,
    pub y: AxisField,
}

impl Default for AxisSelection {
    fn default() -> Self {
        Self {
            x: AxisField::X,
            y: AxisField::Y,
        }
    }
}

impl AxisSelection {
    #[must_use]
    pub fn new(x: AxisField, y: AxisField) -> Self {
        Self { x, y }
    }

    /// Returns `None` when either selected column is missing or non-finite.
    #[must_use]
    pub fn coordinate(&self, point: &DataPoint) -> Option<DataCoord> {
        Some(DataCoord::new(self.x.read(point)?, self.y.read(point)?))
    }
}

/// Full data extent used as the base of every viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataDomain {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Default for DataDomain {
    fn default() -> Self {
        Self {
            min_x: 0.0,
            max_x: 1.0,
            min_y: 0.0,
            max_y: 1.0,
        }
    }
}

impl DataDomain {
    /// Scans finite coordinates.
    ///
    /// An empty input yields the unit domain; a zero-width axis is padded by
    /// one unit on each side so no downstream scale divides by zero.
    #[must_use]
    pub fn from_coords<'a, I>(coords: I) -> Self
    where
        I: IntoIterator<Item = &'a DataCoord>,
    {
        let mut bounds: Option<(f64, f64, f64, f64)> = None;
        for coord in coords.into_iter().filter(|coord| coord.is_finite()) {
            let (x, y) = (coord.x.get(), coord.y.get());
            bounds = Some(match bounds {
                None => (x, x, y, y),
                Some((min_x, max_x, min_y, max_y)) => {
                    (min_x.min(x), max_x.max(x), min_y.min(y), max_y.max(y))
                }
            });
        }

        let Some((min_x, max_x, min_y, max_y)) = bounds else {
            return Self::default();
        };
        let (min_x, max_x) = pad_degenerate(min_x, max_x);
        let (min_y, max_y) = pad_degenerate(min_y, max_y);
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    #[must_use]
    pub fn width(self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(self) -> f64 {
        self.max_y - self.min_y
    }

    #[must_use]
    pub fn center(self) -> DataCoord {
        DataCoord::new(
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        )
    }
}

fn pad_degenerate(min: f64, max: f64) -> (f64, f64) {
    if max - min > 0.0 {
        (min, max)
    } else {
        (min - 1.0, max + 1.0)
    }
}

/// Visible data-space rectangle together with the pan/zoom that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Viewport {
    #[must_use]
    pub fn is_valid(self) -> bool {
        [
            self.min_x,
            self.max_x,
            self.min_y,
            self.max_y,
            self.translate_x,
            self.translate_y,
        ]
        .iter()
        .all(|value| value.is_finite())
            && self.min_x < self.max_x
            && self.min_y < self.max_y
            && self.scale.is_finite()
            && self.scale > 0.0
    }

    pub fn validate(self) -> ScatterResult<()> {
        if !self.is_valid() {
            return Err(ScatterError::InvalidViewport(format!(
                "bounds must be finite and ordered with scale > 0 (got x=[{}, {}], y=[{}, {}], scale={})",
                self.min_x, self.max_x, self.min_y, self.max_y, self.scale
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn contains(self, coord: DataCoord) -> bool {
        let (x, y) = (coord.x.get(), coord.y.get());
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

#[cfg(test)]
mod tests {
    use super::{AxisField, AxisSelection, DataCoord, DataDomain, DataPoint};

    #[test]
    fn empty_coords_yield_unit_domain() {
        let domain = DataDomain::from_coords(&[] as &[DataCoord]);
        assert_eq!(domain, DataDomain::default());
    }

    #[test]
    fn degenerate_axis_is_padded_symmetrically() {
        let coords = [DataCoord::new(5.0, 1.0), DataCoord::new(5.0, 3.0)];
        let domain = DataDomain::from_coords(&coords);
        assert_eq!((domain.min_x, domain.max_x), (4.0, 6.0));
        assert_eq!((domain.min_y, domain.max_y), (1.0, 3.0));
    }

    #[test]
    fn attribute_axis_skips_missing_values() {
        let selection = AxisSelection::new(AxisField::Attribute("mass".into()), AxisField::Y);
        let with = DataPoint::new(1.0, 2.0).with_attribute("mass", 7.5);
        let without = DataPoint::new(1.0, 2.0);

        assert_eq!(selection.coordinate(&with), Some(DataCoord::new(7.5, 2.0)));
        assert_eq!(selection.coordinate(&without), None);
    }
}
