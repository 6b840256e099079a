use std::cell::{Cell, RefCell};

/// Work scheduled for the next display refresh.
pub type FrameCallback = Box<dyn FnOnce()>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Handle returned by [`FrameScheduler::request_frame`], used to cancel the request.
pub struct FrameHandle(pub u64);

/// Host hook that runs a callback once on the next animation frame.
///
/// This is the `requestAnimationFrame` seam: browser hosts forward to the real API, native hosts
/// to their vsync source, tests to [`ManualFrameScheduler`].
pub trait FrameScheduler {
    /// Queue `callback` for the next frame.
    fn request_frame(&self, callback: FrameCallback) -> FrameHandle;

    /// Drop a queued callback. Unknown or already-fired handles are ignored.
    fn cancel_frame(&self, handle: FrameHandle);
}

/// Frame scheduler advanced explicitly with [`ManualFrameScheduler::tick`].
#[derive(Default)]
pub struct ManualFrameScheduler {
    next: Cell<u64>,
    queued: RefCell<Vec<(FrameHandle, FrameCallback)>>,
}

impl ManualFrameScheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire every callback queued before this call. Callbacks queued while ticking run on the
    /// next tick. Returns the number of callbacks run.
    pub fn tick(&self) -> usize {
        let due = std::mem::take(&mut *self.queued.borrow_mut());
        let n = due.len();
        for (_, callback) in due {
            callback();
        }
        n
    }

    /// Number of callbacks waiting for the next tick.
    pub fn pending(&self) -> usize {
        self.queued.borrow().len()
    }
}

impl FrameScheduler for ManualFrameScheduler {
    fn request_frame(&self, callback: FrameCallback) -> FrameHandle {
        let handle = FrameHandle(self.next.get());
        self.next.set(handle.0 + 1);
        self.queued.borrow_mut().push((handle, callback));
        handle
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        self.queued.borrow_mut().retain(|(h, _)| *h != handle);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/frame.rs"]
mod tests;
