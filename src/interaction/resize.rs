use std::time::{Duration, Instant};

use tracing::trace;

use crate::core::types::CanvasSize;

pub const DEFAULT_RESIZE_DEBOUNCE: Duration = Duration::from_millis(150);

/// Trailing-edge debounce for canvas resize events.
///
/// Only the last size pushed inside the quiet window is ever reported; earlier
/// sizes are overwritten, not merged. Time is supplied by the caller so hosts
/// and tests control the clock.
#[derive(Debug, Clone)]
pub struct ResizeDebouncer {
    delay: Duration,
    pending: Option<(CanvasSize, Instant)>,
}

impl Default for ResizeDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_RESIZE_DEBOUNCE)
    }
}

impl ResizeDebouncer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Time at which the pending size becomes due.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|(_, at)| at + self.delay)
    }

    pub fn push(&mut self, size: CanvasSize, now: Instant) {
        if let Some((discarded, _)) = self.pending {
            trace!(
                width = discarded.width,
                height = discarded.height,
                "resize superseded inside debounce window"
            );
        }
        self.pending = Some((size, now));
    }

    /// Returns the latest size once `delay` has elapsed since it was pushed.
    pub fn poll(&mut self, now: Instant) -> Option<CanvasSize> {
        let (size, at) = self.pending?;
        if now.saturating_duration_since(at) < self.delay {
            return None;
        }
        self.pending = None;
        Some(size)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::ResizeDebouncer;
    use crate::core::types::CanvasSize;

    #[test]
    fn only_last_size_in_window_is_committed() {
        let start = Instant::now();
        let mut debouncer = ResizeDebouncer::default();

        debouncer.push(CanvasSize::new(640.0, 480.0), start);
        debouncer.push(
            CanvasSize::new(800.0, 600.0),
            start + Duration::from_millis(100),
        );
        assert_eq!(debouncer.poll(start + Duration::from_millis(200)), None);
        assert_eq!(
            debouncer.poll(start + Duration::from_millis(250)),
            Some(CanvasSize::new(800.0, 600.0))
        );
        assert_eq!(debouncer.poll(start + Duration::from_secs(5)), None);
    }
}
