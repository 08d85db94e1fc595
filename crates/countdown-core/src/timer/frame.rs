//! One-shot frame scheduling.
//!
//! The engine never owns a repeating timer. While running it keeps exactly
//! one outstanding frame request; each delivered frame recomputes the
//! countdown and, if it is still running, asks for the next one.

/// Identifies one requested frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

impl FrameHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Host-side frame source (display refresh, event loop timer, ...).
pub trait Scheduler {
    /// Request one future invocation at the host's natural cadence.
    fn schedule_next_frame(&mut self) -> FrameHandle;

    /// Withdraw a request. Cancelling an unknown or already delivered
    /// handle is a no-op.
    fn cancel(&mut self, handle: FrameHandle);
}

/// Records frame requests for a host loop to deliver.
///
/// The host calls [`take_due`](Self::take_due) whenever its cadence elapses
/// and hands the handle to `TimerEngine::on_frame`.
#[derive(Debug, Default)]
pub struct FrameQueue {
    next_id: u64,
    pending: Option<FrameHandle>,
    cancelled: u64,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return the outstanding request, if any.
    pub fn take_due(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// How many live requests have been cancelled so far.
    pub fn cancelled_count(&self) -> u64 {
        self.cancelled
    }
}

impl Scheduler for FrameQueue {
    fn schedule_next_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.pending = Some(handle);
        handle
    }

    fn cancel(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
            self.cancelled += 1;
        }
    }
}
