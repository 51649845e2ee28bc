//! Animation-frame render coalescing.
//!
//! The host owns the frame clock. [`RenderScheduler::render`] asks it for one
//! frame through a [`FrameRequester`]; the host later calls
//! [`RenderScheduler::on_animation_frame`] with the handle it fired. Only the
//! newest request in a coalescing window survives.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::error::ScatterResult;

/// Opaque token identifying one requested animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(u64);

impl FrameHandle {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Host-side animation-frame queue (`requestAnimationFrame`, GTK tick
/// callbacks, a test clock).
pub trait FrameRequester {
    fn request_frame(&mut self) -> FrameHandle;

    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Something a scheduled draw can run against.
pub trait FrameTarget {
    /// A disposed target turns late callbacks into no-ops.
    fn is_disposed(&self) -> bool;

    /// Whole-surface clear that discards dirty bookkeeping.
    fn clear_all(&mut self) -> ScatterResult<()>;
}

type DrawFn<T> = Box<dyn FnOnce(&mut T) -> ScatterResult<()>>;

struct PendingFrame<T> {
    handle: FrameHandle,
    draw: DrawFn<T>,
}

/// Coalesces draw requests so at most one runs per animation frame.
pub struct RenderScheduler<T, Q: FrameRequester> {
    requester: Q,
    pending: Option<PendingFrame<T>>,
    torn_down: bool,
    frames_executed: u64,
}

impl<T, Q: FrameRequester + std::fmt::Debug> std::fmt::Debug for RenderScheduler<T, Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderScheduler")
            .field("requester", &self.requester)
            .field("pending", &self.pending.as_ref().map(|frame| frame.handle))
            .field("torn_down", &self.torn_down)
            .field("frames_executed", &self.frames_executed)
            .finish()
    }
}

impl<T: FrameTarget, Q: FrameRequester> RenderScheduler<T, Q> {
    #[must_use]
    pub fn new(requester: Q) -> Self {
        Self {
            requester,
            pending: None,
            torn_down: false,
            frames_executed: 0,
        }
    }

    #[must_use]
    pub fn requester(&self) -> &Q {
        &self.requester
    }

    pub fn requester_mut(&mut self) -> &mut Q {
        &mut self.requester
    }

    #[must_use]
    pub fn pending_handle(&self) -> Option<FrameHandle> {
        self.pending.as_ref().map(|frame| frame.handle)
    }

    #[must_use]
    pub fn has_pending_frame(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    #[must_use]
    pub fn frames_executed(&self) -> u64 {
        self.frames_executed
    }

    /// Schedules `draw` for the next frame, superseding any pending request.
    ///
    /// Returns the handle of the newly requested frame, or `None` after
    /// teardown.
    pub fn render<F>(&mut self, draw: F) -> Option<FrameHandle>
    where
        F: FnOnce(&mut T) -> ScatterResult<()> + 'static,
    {
        if self.torn_down {
            trace!("render request ignored after teardown");
            return None;
        }
        if let Some(previous) = self.pending.take() {
            trace!(handle = previous.handle.raw(), "superseding pending frame");
            self.requester.cancel_frame(previous.handle);
        }
        let handle = self.requester.request_frame();
        self.pending = Some(PendingFrame {
            handle,
            draw: Box::new(draw),
        });
        Some(handle)
    }

    /// Runs the pending draw if `handle` is the frame it is waiting for.
    ///
    /// Returns `Ok(false)` for stale handles and for disposed targets.
    pub fn on_animation_frame(&mut self, handle: FrameHandle, target: &mut T) -> ScatterResult<bool> {
        let is_current = self
            .pending
            .as_ref()
            .is_some_and(|frame| frame.handle == handle);
        if !is_current {
            trace!(handle = handle.raw(), "stale animation frame skipped");
            return Ok(false);
        }
        let Some(frame) = self.pending.take() else {
            return Ok(false);
        };
        if self.torn_down || target.is_disposed() {
            debug!(handle = handle.raw(), "frame fired after target disposal, skipped");
            return Ok(false);
        }
        (frame.draw)(target)?;
        self.frames_executed += 1;
        Ok(true)
    }

    /// Immediate, unscheduled whole-surface clear.
    pub fn clear(&mut self, target: &mut T) -> ScatterResult<()> {
        if target.is_disposed() {
            return Ok(());
        }
        target.clear_all()
    }

    /// Cancels any pending frame and refuses further requests.
    pub fn teardown(&mut self) {
        if let Some(frame) = self.pending.take() {
            self.requester.cancel_frame(frame.handle);
        }
        self.torn_down = true;
        debug!("render scheduler torn down");
    }
}

/// Deterministic frame clock for headless hosts and tests.
///
/// Requested handles queue up until [`ManualFrameClock::drain_due`] fires
/// them; cancelled handles never fire.
#[derive(Debug, Default)]
pub struct ManualFrameClock {
    next_handle: u64,
    queued: VecDeque<FrameHandle>,
    cancelled: u64,
}

impl ManualFrameClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles due on the next frame boundary, in request order.
    pub fn drain_due(&mut self) -> Vec<FrameHandle> {
        self.queued.drain(..).collect()
    }

    #[must_use]
    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    #[must_use]
    pub fn cancelled_count(&self) -> u64 {
        self.cancelled
    }
}

impl FrameRequester for ManualFrameClock {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_handle += 1;
        let handle = FrameHandle(self.next_handle);
        self.queued.push_back(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let before = self.queued.len();
        self.queued.retain(|queued| *queued != handle);
        if self.queued.len() != before {
            self.cancelled += 1;
        }
    }
}
