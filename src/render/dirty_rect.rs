//! Dirty-rectangle bookkeeping between render passes.

use ordered_float::OrderedFloat;
use smallvec::SmallVec;
use tracing::{trace, warn};

use crate::error::ScatterResult;
use crate::render::{DrawContext, ScreenRect};

/// Default growth applied to every dirty rect to cover anti-aliased edges.
pub const DEFAULT_DIRTY_MARGIN_PX: f64 = 2.0;

/// Rect count past which a pass falls back to a full redraw.
const MAX_TRACKED_RECTS: usize = 64;

/// What the next render pass has to repaint.
#[derive(Debug, Clone, PartialEq)]
pub enum DirtyRegion {
    Clean,
    Full,
    Rects(Vec<ScreenRect>),
}

impl DirtyRegion {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }
}

#[must_use]
pub fn expand_rect(rect: ScreenRect, margin: f64) -> ScreenRect {
    rect.expanded(margin)
}

/// Merges touching or overlapping rectangles into their bounding boxes.
///
/// Rectangles are swept in left-edge order; merging repeats until no pair in
/// the output touches, since a grown union can reach rects that were
/// already passed.
#[must_use]
pub fn merge_overlapping(rects: Vec<ScreenRect>) -> Vec<ScreenRect> {
    let mut merged = rects;
    loop {
        merged.sort_by_key(|rect| (OrderedFloat(rect.x), OrderedFloat(rect.y)));
        let mut changed = false;
        let mut out: Vec<ScreenRect> = Vec::with_capacity(merged.len());
        let mut consumed = vec![false; merged.len()];

        for i in 0..merged.len() {
            if consumed[i] {
                continue;
            }
            let mut current = merged[i];
            for j in (i + 1)..merged.len() {
                if merged[j].x > current.right() {
                    break;
                }
                if !consumed[j] && current.touches(merged[j]) {
                    current = current.union(merged[j]);
                    consumed[j] = true;
                    changed = true;
                }
            }
            out.push(current);
        }

        merged = out;
        if !changed {
            return merged;
        }
    }
}

/// Runs `draw` with every pixel outside `rect` protected by a clip.
pub fn render_with_clip<C, F>(context: &mut C, rect: ScreenRect, draw: F) -> ScatterResult<()>
where
    C: DrawContext + ?Sized,
    F: FnOnce(&mut C) -> ScatterResult<()>,
{
    context.save()?;
    let drawn = context.clip_rect(rect).and_then(|()| draw(&mut *context));
    let restored = context.restore();
    drawn.and(restored)
}

/// Clears what `region` covers; inconsistent rects escalate to a whole-surface clear.
pub fn clear_region<C>(context: &mut C, region: &DirtyRegion, surface: ScreenRect) -> ScatterResult<()>
where
    C: DrawContext + ?Sized,
{
    match region {
        DirtyRegion::Clean => Ok(()),
        DirtyRegion::Full => context.clear_rect(surface),
        DirtyRegion::Rects(rects) => {
            if rects.iter().any(|rect| !rect.is_well_formed()) {
                warn!("inconsistent dirty rect, clearing whole surface");
                return context.clear_rect(surface);
            }
            for rect in rects {
                if let Some(visible) = rect.intersection(surface) {
                    context.clear_rect(visible)?;
                }
            }
            Ok(())
        }
    }
}

/// Accumulates invalidated screen regions until the next pass consumes them.
#[derive(Debug, Clone)]
pub struct DirtyRectTracker {
    rects: SmallVec<[ScreenRect; 8]>,
    full: bool,
    margin: f64,
}

impl Default for DirtyRectTracker {
    fn default() -> Self {
        Self::new(DEFAULT_DIRTY_MARGIN_PX)
    }
}

impl DirtyRectTracker {
    #[must_use]
    pub fn new(margin: f64) -> Self {
        Self {
            rects: SmallVec::new(),
            full: false,
            margin: if margin.is_finite() && margin >= 0.0 {
                margin
            } else {
                DEFAULT_DIRTY_MARGIN_PX
            },
        }
    }

    #[must_use]
    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Queues `rect`; a malformed rect forces a full repaint instead of being dropped.
    pub fn invalidate(&mut self, rect: ScreenRect) {
        if self.full {
            return;
        }
        if !rect.is_well_formed() {
            warn!(?rect, "malformed dirty rect, escalating to full repaint");
            self.full = true;
            self.rects.clear();
            return;
        }
        self.rects.push(rect);
        if self.rects.len() > MAX_TRACKED_RECTS {
            trace!(count = self.rects.len(), "dirty rect overflow, escalating to full repaint");
            self.full = true;
            self.rects.clear();
        }
    }

    pub fn invalidate_all(&mut self) {
        self.full = true;
        self.rects.clear();
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.full || !self.rects.is_empty()
    }

    #[must_use]
    pub fn needs_full_repaint(&self) -> bool {
        self.full
    }

    /// Drops all bookkeeping without producing a pass.
    pub fn reset(&mut self) {
        self.full = false;
        self.rects.clear();
    }

    /// Consumes everything accumulated since the last pass.
    ///
    /// Rects are expanded by the margin, clipped to `surface` and merged. A
    /// merged set covering most of the surface becomes a full repaint.
    pub fn take_region(&mut self, surface: ScreenRect) -> DirtyRegion {
        if self.full {
            self.reset();
            return DirtyRegion::Full;
        }
        if self.rects.is_empty() {
            return DirtyRegion::Clean;
        }

        let expanded: Vec<ScreenRect> = self
            .rects
            .drain(..)
            .filter_map(|rect| expand_rect(rect, self.margin).intersection(surface))
            .collect();
        let merged = merge_overlapping(expanded);
        if merged.is_empty() {
            return DirtyRegion::Clean;
        }

        let dirty_area: f64 = merged.iter().map(|rect| rect.area()).sum();
        if dirty_area >= surface.area() * 0.75 {
            trace!(dirty_area, "dirty rects cover most of the surface, repainting fully");
            return DirtyRegion::Full;
        }
        DirtyRegion::Rects(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::{DirtyRectTracker, DirtyRegion};
    use crate::render::ScreenRect;

    const SURFACE: ScreenRect = ScreenRect::new(0.0, 0.0, 800.0, 600.0);

    #[test]
    fn take_region_expands_and_merges() {
        let mut tracker = DirtyRectTracker::default();
        tracker.invalidate(ScreenRect::new(10.0, 10.0, 10.0, 10.0));
        tracker.invalidate(ScreenRect::new(22.0, 10.0, 10.0, 10.0));

        // 2px margin makes the 2px gap vanish.
        assert_eq!(
            tracker.take_region(SURFACE),
            DirtyRegion::Rects(vec![ScreenRect::new(8.0, 8.0, 26.0, 14.0)])
        );
        assert_eq!(tracker.take_region(SURFACE), DirtyRegion::Clean);
    }

    #[test]
    fn malformed_rect_escalates_to_full() {
        let mut tracker = DirtyRectTracker::default();
        tracker.invalidate(ScreenRect::new(f64::NAN, 0.0, 1.0, 1.0));
        assert!(tracker.needs_full_repaint());
        assert_eq!(tracker.take_region(SURFACE), DirtyRegion::Full);
        assert!(!tracker.is_dirty());
    }

    #[test]
    fn offscreen_rects_are_discarded() {
        let mut tracker = DirtyRectTracker::new(0.0);
        tracker.invalidate(ScreenRect::new(900.0, 900.0, 10.0, 10.0));
        assert_eq!(tracker.take_region(SURFACE), DirtyRegion::Clean);
    }
}
