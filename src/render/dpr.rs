//! Device-pixel-ratio handling for canvas backing buffers.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::types::CanvasSize;
use crate::error::{ScatterError, ScatterResult};
use crate::render::{CanvasSurface, DrawContext};

/// Ratio of physical to CSS pixels. Always finite and > 0.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct DevicePixelRatio(f64);

impl Default for DevicePixelRatio {
    fn default() -> Self {
        Self(1.0)
    }
}

impl DevicePixelRatio {
    pub fn new(ratio: f64) -> ScatterResult<Self> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(ScatterError::InvalidData(format!(
                "device pixel ratio must be finite and > 0 (got {ratio})"
            )));
        }
        Ok(Self(ratio))
    }

    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }

    /// Backing buffer dimensions for a CSS size, rounded to whole pixels.
    #[must_use]
    pub fn backing_size(self, css: CanvasSize) -> (u32, u32) {
        let scale = |value: f64| (value * self.0).round().clamp(1.0, f64::from(u32::MAX)) as u32;
        (scale(css.width), scale(css.height))
    }
}

impl TryFrom<f64> for DevicePixelRatio {
    type Error = ScatterError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DevicePixelRatio> for f64 {
    fn from(value: DevicePixelRatio) -> Self {
        value.0
    }
}

/// Sizes the backing buffer to `css * dpr` and returns a context whose draw
/// calls are issued in CSS pixels.
///
/// The returned context is new: anything drawn through an earlier context is
/// gone, so callers must redraw everything afterwards.
pub fn setup_canvas<S: CanvasSurface>(
    surface: &mut S,
    css: CanvasSize,
    dpr: DevicePixelRatio,
) -> ScatterResult<S::Context> {
    css.validate()?;
    let (backing_width, backing_height) = dpr.backing_size(css);
    surface.configure(backing_width, backing_height, css)?;
    let mut context = surface.acquire_context()?;
    context.set_scale(dpr.get())?;
    debug!(
        css_width = css.width,
        css_height = css.height,
        backing_width,
        backing_height,
        dpr = dpr.get(),
        "canvas configured"
    );
    Ok(context)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DprListenerId(u64);

type DprListener = Box<dyn FnMut(DevicePixelRatio)>;

/// Tracks the display ratio and notifies subscribers when it changes
/// (monitor switch, browser/desktop zoom).
pub struct DprMonitor {
    current: DevicePixelRatio,
    next_listener_id: u64,
    listeners: Vec<(DprListenerId, DprListener)>,
}

impl std::fmt::Debug for DprMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DprMonitor")
            .field("current", &self.current)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl DprMonitor {
    #[must_use]
    pub fn new(initial: DevicePixelRatio) -> Self {
        Self {
            current: initial,
            next_listener_id: 0,
            listeners: Vec::new(),
        }
    }

    #[must_use]
    pub fn current(&self) -> DevicePixelRatio {
        self.current
    }

    pub fn subscribe(&mut self, listener: impl FnMut(DevicePixelRatio) + 'static) -> DprListenerId {
        let id = DprListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: DprListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Reports the host's current ratio.
    ///
    /// Returns the new ratio (after notifying listeners) only when it differs
    /// from the previous one.
    pub fn update(&mut self, ratio: DevicePixelRatio) -> Option<DevicePixelRatio> {
        if ratio == self.current {
            trace!(dpr = ratio.get(), "device pixel ratio unchanged");
            return None;
        }
        debug!(
            from = self.current.get(),
            to = ratio.get(),
            "device pixel ratio changed"
        );
        self.current = ratio;
        for (_, listener) in &mut self.listeners {
            listener(ratio);
        }
        Some(ratio)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::{DevicePixelRatio, DprMonitor};
    use crate::core::types::CanvasSize;

    #[test]
    fn fractional_ratios_round_backing_size() {
        let dpr = DevicePixelRatio::new(1.25).expect("valid ratio");
        assert_eq!(dpr.backing_size(CanvasSize::new(801.0, 3.0)), (1001, 4));
        assert!(DevicePixelRatio::new(0.0).is_err());
    }

    #[test]
    fn monitor_notifies_only_on_change() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut monitor = DprMonitor::new(DevicePixelRatio::default());
        let sink = Rc::clone(&seen);
        let id = monitor.subscribe(move |ratio| sink.borrow_mut().push(ratio.get()));

        let two = DevicePixelRatio::new(2.0).expect("valid ratio");
        assert_eq!(monitor.update(two), Some(two));
        assert_eq!(monitor.update(two), None);
        assert!(monitor.unsubscribe(id));
        assert!(monitor.update(DevicePixelRatio::default()).is_some());

        assert_eq!(*seen.borrow(), vec![2.0]);
    }
}
